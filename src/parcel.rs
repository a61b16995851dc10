//! Functions for selecting the starting parcel for a convective parcel analysis.

use crate::{
    error::{AnalysisError, Result},
    interpolation::linear_interpolate,
    profile::Environment,
};
use itertools::{izip, Itertools};
use metfor::{Celsius, HectoPascal, Kelvin, Quantity};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;

/// Depth of the layer searched for the most unstable parcel.
const MOST_UNSTABLE_DEPTH: HectoPascal = HectoPascal(300.0);

/// Depth of the layer averaged for the mixed layer parcel.
const MIXED_LAYER_DEPTH: HectoPascal = HectoPascal(100.0);

/// Variables defining a parcel as used in parcel analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    /// Temperature in C
    pub temperature: Celsius,
    /// Pressure in hPa
    pub pressure: HectoPascal,
    /// Dew point in C
    pub dew_point: Celsius,
}

impl Parcel {
    /// Get the potential temperature of the parcel.
    pub fn theta(&self) -> Kelvin {
        metfor::potential_temperature(self.pressure, self.temperature)
    }

    /// Get the equivalent potential temperature of the parcel.
    pub fn theta_e(&self) -> Result<Kelvin> {
        metfor::equiv_pot_temperature(self.temperature, self.dew_point, self.pressure)
            .ok_or(AnalysisError::MetForError)
    }

    /// Get the mixing ratio of the parcel.
    pub fn mixing_ratio(&self) -> Result<f64> {
        metfor::mixing_ratio(self.dew_point, self.pressure).ok_or(AnalysisError::MetForError)
    }

    /// Get the specific humidity of the parcel.
    pub fn specific_humidity(&self) -> Result<f64> {
        metfor::specific_humidity(self.dew_point, self.pressure).ok_or(AnalysisError::MetForError)
    }

    /// Get the virtual temperature of the parcel.
    pub fn virtual_temperature(&self) -> Result<Kelvin> {
        metfor::virtual_temperature(self.temperature, self.dew_point, self.pressure)
            .ok_or(AnalysisError::MetForError)
    }
}

/// The strategy for choosing the parcel that is lifted.
///
/// Parses from and displays as `surface_based`, `most_unstable`, and `mixed_layer`.
///
/// ```rust
/// use ecape_analysis::ParcelType;
///
/// let pt: ParcelType = "mixed_layer".parse().unwrap();
/// assert_eq!(pt, ParcelType::MixedLayer);
/// assert_eq!(ParcelType::MostUnstable.to_string(), "most_unstable");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ParcelType {
    /// The lowest level in the sounding.
    SurfaceBased,
    /// The level with the highest equivalent potential temperature in the lowest 300 hPa.
    MostUnstable,
    /// The mean potential temperature and moisture of the lowest 100 hPa.
    MixedLayer,
}

impl Default for ParcelType {
    fn default() -> Self {
        ParcelType::MostUnstable
    }
}

/// Select the starting parcel according to the parcel type.
pub fn starting_parcel(env: &Environment, parcel_type: ParcelType) -> Result<Parcel> {
    let parcel = match parcel_type {
        ParcelType::SurfaceBased => surface_parcel(env),
        ParcelType::MostUnstable => most_unstable_parcel(env),
        ParcelType::MixedLayer => mixed_layer_parcel(env),
    }?;

    debug!(
        %parcel_type,
        pressure = parcel.pressure.unpack(),
        temperature = parcel.temperature.unpack(),
        dew_point = parcel.dew_point.unpack(),
        "selected parcel"
    );

    Ok(parcel)
}

/// Get a surface parcel, the lowest level of the sounding.
pub fn surface_parcel(env: &Environment) -> Result<Parcel> {
    level_parcel(env, 0)
}

/// Get the most unstable parcel.
///
/// This is defined as the parcel in the lowest 300 hPa of the sounding with the highest equivalent
/// potential temperature.
pub fn most_unstable_parcel(env: &Environment) -> Result<Parcel> {
    let bottom_p = *env.pressure().first().ok_or(AnalysisError::NotEnoughData)?;
    let top_p = bottom_p - MOST_UNSTABLE_DEPTH;

    let (idx, _) = izip!(0.., env.pressure(), env.theta_e())
        .take_while(|(_, &p, _)| p >= top_p)
        .fold(
            (0, Kelvin(std::f64::MIN)),
            |(max_idx, max_theta_e), (i, _, &theta_e)| {
                if theta_e > max_theta_e {
                    (i, theta_e)
                } else {
                    (max_idx, max_theta_e)
                }
            },
        );

    level_parcel(env, idx)
}

/// Create a mixed layer parcel.
///
/// The potential temperature and specific humidity are averaged over the lowest 100 hPa with the
/// trapezoid rule, weighted by pressure thickness. The parcel is placed at the bottom of the layer.
pub fn mixed_layer_parcel(env: &Environment) -> Result<Parcel> {
    let pressure = env.pressure();
    let bottom_p = *pressure.first().ok_or(AnalysisError::NotEnoughData)?;
    let top_p = bottom_p - MIXED_LAYER_DEPTH;

    let theta: Vec<Kelvin> = izip!(pressure, env.temperature())
        .map(|(&p, &t)| metfor::potential_temperature(p, t))
        .collect();
    let q = env.specific_humidity();

    let top_theta = linear_interpolate(pressure, &theta, top_p)
        .into_option()
        .ok_or(AnalysisError::NotEnoughData)?;
    let top_q = interpolate_f64(pressure, q, top_p).ok_or(AnalysisError::NotEnoughData)?;

    let (sum_theta, sum_q, sum_dp) = izip!(pressure, &theta, q)
        .map(|(&p, &th, &q)| (p, th, q))
        // Only levels inside the layer
        .take_while(|&(p, _, _)| p > top_p)
        // Finish with the interpolated top of the layer
        .chain(std::iter::once((top_p, top_theta, top_q)))
        // Look at two levels at a time for the trapezoid rule
        .tuple_windows::<(_, _)>()
        .fold(
            (0.0, 0.0, 0.0),
            |(sum_theta, sum_q, sum_dp), ((p0, th0, q0), (p1, th1, q1))| {
                let dp = (p0 - p1).unpack();
                (
                    sum_theta + (th0.unpack() + th1.unpack()) * dp,
                    sum_q + (q0 + q1) * dp,
                    sum_dp + dp,
                )
            },
        );

    if sum_dp <= 0.0 {
        return Err(AnalysisError::NotEnoughData);
    }

    // The 2 is for the trapezoid rule
    let avg_theta = Kelvin(sum_theta / sum_dp / 2.0);
    let avg_q = sum_q / sum_dp / 2.0;

    let temperature = Celsius::from(metfor::temperature_from_pot_temp(avg_theta, bottom_p));
    let dew_point = metfor::dew_point_from_p_and_specific_humidity(bottom_p, avg_q)
        .ok_or(AnalysisError::MetForError)?;

    Ok(Parcel {
        temperature,
        pressure: bottom_p,
        // Interpolation and averaging can leave it a hair above the temperature.
        dew_point: if dew_point > temperature {
            temperature
        } else {
            dew_point
        },
    })
}

fn level_parcel(env: &Environment, idx: usize) -> Result<Parcel> {
    let pressure = *env.pressure().get(idx).ok_or(AnalysisError::MissingValue)?;
    let temperature = *env.temperature().get(idx).ok_or(AnalysisError::MissingValue)?;
    let dew_point = *env.dew_point().get(idx).ok_or(AnalysisError::MissingValue)?;

    Ok(Parcel {
        temperature,
        pressure,
        dew_point,
    })
}

// Specific humidity is a bare f64, so it can't go through the Quantity based interpolation.
fn interpolate_f64(pressure: &[HectoPascal], vals: &[f64], target_p: HectoPascal) -> Option<f64> {
    izip!(pressure, vals)
        .tuple_windows::<(_, _)>()
        .find(|((&p0, _), (&p1, _))| p0 >= target_p && p1 <= target_p)
        .map(|((&p0, &v0), (&p1, &v1))| {
            let frac = (p0 - target_p).unpack() / (p0 - p1).unpack();
            v0 + frac * (v1 - v0)
        })
}
