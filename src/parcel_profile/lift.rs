use super::{buoyancy_areas, ParcelAscentAnalysis, ParcelProfile};
use crate::{
    error::{AnalysisError, Result},
    interpolation::{linear_interp, linear_interpolate},
    parcel::Parcel,
    profile::Environment,
};
use itertools::{izip, Itertools};
use metfor::{self, Celsius, CelsiusDiff, HectoPascal, JpKg, Meters, Quantity};
use optional::{none, some};
use std::cmp::Ordering;
use tracing::debug;

pub fn lift_parcel(parcel: Parcel, env: &Environment) -> Result<ParcelAscentAnalysis> {
    let env_p = env.pressure();
    let env_h = env.height_agl();
    let env_vt = env.virtual_temperature();

    // Find the LCL, a parcel that starts saturated has its LCL where it starts.
    let (lcl_pressure, lcl_temperature) = metfor::pressure_and_temperature_at_lcl(
        parcel.temperature,
        parcel.dew_point,
        parcel.pressure,
    )
    .map(|(p, t)| (p, Celsius::from(t)))
    .ok_or(AnalysisError::MetForError)?;
    let (lcl_pressure, lcl_temperature) = if lcl_pressure > parcel.pressure {
        (parcel.pressure, parcel.temperature)
    } else {
        (lcl_pressure, lcl_temperature)
    };
    let lcl_height_agl = linear_interpolate(env_p, env_h, lcl_pressure);

    // How to calculate a parcel temperature for a given pressure level
    let parcel_calc = create_parcel_calc(parcel, lcl_pressure)?;

    // The starting level, environment values interpolated to the parcel pressure.
    let start = AnalLevel {
        pressure: parcel.pressure,
        height: linear_interpolate(env_p, env_h, parcel.pressure)
            .into_option()
            .ok_or(AnalysisError::InterpolationError)?,
        pcl_virt_t: parcel.virtual_temperature().map(Celsius::from)?,
        env_virt_t: linear_interpolate(env_p, env_vt, parcel.pressure)
            .into_option()
            .ok_or(AnalysisError::InterpolationError)?,
        pcl_q: parcel.specific_humidity()?,
    };

    // The LCL, only inserted if it falls between levels of the environment.
    let lcl_level = match lcl_height_agl.into_option() {
        Some(height) => Some(AnalLevel {
            pressure: lcl_pressure,
            height,
            pcl_virt_t: metfor::virtual_temperature(lcl_temperature, lcl_temperature, lcl_pressure)
                .map(Celsius::from)
                .ok_or(AnalysisError::MetForError)?,
            env_virt_t: linear_interpolate(env_p, env_vt, lcl_pressure)
                .into_option()
                .ok_or(AnalysisError::InterpolationError)?,
            pcl_q: start.pcl_q,
        }),
        None => None,
    };
    let level_type_mapping = create_level_type_mapping(lcl_level);

    let levels: Vec<AnalLevel> = std::iter::once(start)
        .chain(
            izip!(env_p, env_h, env_vt)
                // Remove rows at or below the parcel level
                .filter(|(&p, _, _)| p < parcel.pressure)
                // Calculate the parcel values, skip this level if there is an error
                .filter_map(|(&pressure, &height, &env_virt_t)| {
                    parcel_calc(pressure).map(|(pcl_virt_t, pcl_q)| AnalLevel {
                        pressure,
                        height,
                        pcl_virt_t,
                        env_virt_t,
                        pcl_q,
                    })
                }),
        )
        .collect();

    let top = *levels.last().ok_or(AnalysisError::NotEnoughData)?;
    if levels.len() < 2 {
        return Err(AnalysisError::NotEnoughData);
    }

    let profile: ParcelProfile = levels
        .iter()
        // Look at them two levels at a time to check for crossing any special levels
        .tuple_windows::<(_, _)>()
        // Insert the special levels between each pair.
        .flat_map(|(&lvl0, &lvl1)| level_type_mapping(lvl0, lvl1))
        // The windows never yield the top level on their own.
        .chain(std::iter::once(top))
        .fold(ParcelProfile::default(), |mut profile, lvl| {
            profile.pressure.push(lvl.pressure);
            profile.height.push(lvl.height);
            profile.parcel_t.push(lvl.pcl_virt_t);
            profile.environment_t.push(lvl.env_virt_t);
            profile.specific_humidity.push(lvl.pcl_q);
            profile
        });

    let (lfc_idx, el_idx) = match find_lfc_el(&profile, lcl_pressure) {
        Some((lfc_idx, el_idx)) => (lfc_idx, el_idx),
        None => {
            debug!(
                lcl_pressure = lcl_pressure.unpack(),
                "no level of free convection"
            );
            return Ok(ParcelAscentAnalysis {
                parcel,
                profile,
                cape: JpKg(0.0),
                cin: none(),
                lcl_pressure,
                lcl_height_agl,
                lfc_pressure: none(),
                lfc_height_agl: none(),
                el_pressure: none(),
                el_height_agl: none(),
            });
        }
    };

    let (cape, _) = buoyancy_areas(&profile, lfc_idx, el_idx);
    let (_, cin) = buoyancy_areas(&profile, 0, lfc_idx);

    let lfc_pressure = profile.pressure[lfc_idx];
    let el_pressure = profile.pressure[el_idx];
    debug!(
        lcl = lcl_pressure.unpack(),
        lfc = lfc_pressure.unpack(),
        el = el_pressure.unpack(),
        cape = cape.unpack(),
        cin = cin.unpack(),
        "parcel ascent"
    );

    Ok(ParcelAscentAnalysis {
        parcel,
        lcl_pressure,
        lcl_height_agl,
        lfc_pressure: some(lfc_pressure),
        lfc_height_agl: some(profile.height[lfc_idx]),
        el_pressure: some(el_pressure),
        el_height_agl: some(profile.height[el_idx]),
        cape,
        cin: some(cin),
        profile,
    })
}

// A level in the analysis
#[derive(Clone, Copy, Debug)]
struct AnalLevel {
    pressure: HectoPascal,
    height: Meters,
    pcl_virt_t: Celsius,
    env_virt_t: Celsius,
    pcl_q: f64,
}

/// Find the indexes of the LFC and EL in the profile.
///
/// The LFC is the LCL if the parcel is buoyant there, otherwise the first level above the LCL
/// where the parcel becomes buoyant. The EL is the highest level that is still buoyant, which is
/// either the last crossing into negative buoyancy or the top of the profile. Crossing levels have
/// exactly zero buoyancy since they were inserted with equal parcel and environment temperatures.
fn find_lfc_el(profile: &ParcelProfile, lcl_pressure: HectoPascal) -> Option<(usize, usize)> {
    let buoyant = |i: usize| profile.parcel_t[i] >= profile.environment_t[i];

    let lfc_idx = profile
        .pressure
        .iter()
        .enumerate()
        .filter(|(_, &p)| p <= lcl_pressure)
        .map(|(i, _)| i)
        .find(|&i| buoyant(i))?;

    let el_idx = (lfc_idx..profile.pressure.len())
        .rev()
        .find(|&i| buoyant(i))?;

    // The parcel touches neutral buoyancy and goes negative again.
    if el_idx <= lfc_idx {
        return None;
    }

    Some((lfc_idx, el_idx))
}

fn create_parcel_calc(
    parcel: Parcel,
    lcl_pressure: HectoPascal,
) -> Result<impl Fn(HectoPascal) -> Option<(Celsius, f64)>> {
    let theta = parcel.theta();
    let theta_e = parcel.theta_e()?;
    let dry_mw = parcel.mixing_ratio()?;
    let dry_q = parcel.specific_humidity()?;

    Ok(move |tgt_pres| {
        if tgt_pres > lcl_pressure {
            // Dry adiabatic lifting
            let t_k = metfor::temperature_from_pot_temp(theta, tgt_pres);
            metfor::virtual_temperature(
                t_k,
                metfor::dew_point_from_p_and_mw(tgt_pres, dry_mw)?,
                tgt_pres,
            )
            .map(|vt| (Celsius::from(vt), dry_q))
        } else {
            // Moist adiabatic lifting
            let t_c = metfor::temperature_from_equiv_pot_temp_saturated_and_pressure(
                tgt_pres, theta_e,
            )?;
            let q = metfor::specific_humidity(t_c, tgt_pres)?;
            metfor::virtual_temperature(t_c, t_c, tgt_pres).map(|vt| (Celsius::from(vt), q))
        }
    })
}

fn create_level_type_mapping(
    lcl_info: Option<AnalLevel>,
) -> impl Fn(AnalLevel, AnalLevel) -> Vec<AnalLevel> {
    move |lvl0: AnalLevel, lvl1: AnalLevel| -> Vec<AnalLevel> {
        let mut vals = Vec::with_capacity(3);
        vals.push(lvl0);

        let AnalLevel {
            pcl_virt_t: pt0,
            env_virt_t: et0,
            pressure: p0,
            height: h0,
            pcl_q: q0,
        } = lvl0;

        let AnalLevel {
            pcl_virt_t: pt1,
            env_virt_t: et1,
            pressure: p1,
            height: h1,
            pcl_q: q1,
        } = lvl1;

        // Check to see if the parcel profile crossed over the environmental profile. Note that
        // this demarks a change in stability, either to stable or unstable.
        if (pt0 < et0 && pt1 > et1) || (pt0 > et0 && pt1 < et1) {
            let (b0, b1) = (pt0 - et0, pt1 - et1);
            let tgt_t = linear_interp(CelsiusDiff(0.0), b0, b1, pt0, pt1);

            vals.push(AnalLevel {
                pressure: linear_interp(CelsiusDiff(0.0), b0, b1, p0, p1),
                height: linear_interp(CelsiusDiff(0.0), b0, b1, h0, h1),
                pcl_virt_t: tgt_t,
                env_virt_t: tgt_t,
                pcl_q: q0 + (q1 - q0) * b0.unpack() / (b0 - b1).unpack(),
            });
        }

        // Check for the LCL, add it if it is strictly between the levels
        if let Some(lcl) = lcl_info {
            if p0 > lcl.pressure && p1 < lcl.pressure {
                vals.push(lcl);
            }
        }

        // Sort the vals in decreasing order by pressure
        vals.sort_by(|a, b| {
            b.pressure
                .partial_cmp(&a.pressure)
                .unwrap_or(Ordering::Equal)
        });

        vals
    }
}
