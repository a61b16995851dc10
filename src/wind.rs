//! Kinematic analysis: mean winds, storm motion, and storm relative wind integrals.
//!
//! All of these functions take heights above ground level, parallel to the wind slice.
use crate::{
    error::{AnalysisError, Result},
    interpolation::linear_interpolate_wind,
};
use itertools::{izip, Itertools};
use metfor::{Meters, MetersPSec, Quantity, WindUV};
use std::iter::once;

/// Bunkers deviation from the mean wind, m/s.
const BUNKERS_DEVIATION: f64 = 7.5;

/// Depth of the layer for the mean wind in the Bunkers method.
const BUNKERS_DEPTH: Meters = Meters(6000.0);

/// Top of the inflow layer used for the mean storm relative wind.
const INFLOW_TOP: Meters = Meters(1000.0);

/// Calculate the mean wind in a layer.
///
/// This is NOT the pressure weighted mean.
pub fn mean_wind(
    height: &[Meters],
    wind: &[WindUV<MetersPSec>],
    bottom: Meters,
    top: Meters,
) -> Result<WindUV<MetersPSec>> {
    let bottom_wind =
        linear_interpolate_wind(height, wind, bottom).ok_or(AnalysisError::InterpolationError)?;
    let top_wind =
        linear_interpolate_wind(height, wind, top).ok_or(AnalysisError::InterpolationError)?;

    let intermediate_layers = izip!(height, wind)
        .map(|(&h, &w)| (h, w))
        // Skip values below the layer
        .skip_while(|&(hgt, _)| hgt <= bottom)
        // Only take values below the top of the layer
        .take_while(|&(hgt, _)| hgt < top);

    let (mut iu, mut iv, dz) =
        // Start at the bottom of the layer
        once((bottom, bottom_wind))
        // Add in any intermediate layers
        .chain(intermediate_layers)
        // Finish with the top layer
        .chain(once((top, top_wind)))
        // Make windows to see two points at a time for trapezoid rule integration
        .tuple_windows::<(_, _)>()
        // Integration with the trapezoid rule to find the mean value
        .fold(
            (
                MetersPSec(0.0), // integrated u component so far
                MetersPSec(0.0), // integrated v component so far
                Meters(0.0),     // the total distance integrated so far
            ),
            |acc, ((h0, w0), (h1, w1))| {
                let (mut iu, mut iv, mut acc_dz) = acc;

                let dz = h1 - h0;

                iu += (w0.u + w1.u) * dz.unpack();
                iv += (w0.v + w1.v) * dz.unpack();
                acc_dz += dz;

                (iu, iv, acc_dz)
            },
        );

    if dz <= Meters(0.0) {
        // nothing was done, the layer has no depth
        return Err(AnalysisError::NotEnoughData);
    }

    // we integrated, so divide by height and constant of 2 for trapezoid rule
    iu /= 2.0 * dz.unpack();
    iv /= 2.0 * dz.unpack();

    Ok(WindUV { u: iu, v: iv })
}

/// Calculate the super cell storm motion using the "id" method.
///
/// Returns the storm motions in m/s of the right and left mover cells.
/// (right mover, left mover)
///
/// The layer is the lowest 6 km, or the whole profile if it is shallower than that. Without bulk
/// shear there is no deviant motion, so both movers travel with the mean wind.
pub fn bunkers_storm_motion(
    height: &[Meters],
    wind: &[WindUV<MetersPSec>],
) -> Result<(WindUV<MetersPSec>, WindUV<MetersPSec>)> {
    let bottom = *height.first().ok_or(AnalysisError::NotEnoughData)?;
    let highest = *height.last().ok_or(AnalysisError::NotEnoughData)?;
    let top = if highest - bottom < BUNKERS_DEPTH {
        highest
    } else {
        bottom + BUNKERS_DEPTH
    };

    let WindUV {
        u: mean_u,
        v: mean_v,
    } = mean_wind(height, wind, bottom, top)?;

    // Too shallow to average the ends of the layer counts as no shear.
    let WindUV {
        u: shear_u,
        v: shear_v,
    } = match bulk_shear_half_km(height, wind, bottom, top) {
        Err(AnalysisError::NotEnoughData) => WindUV {
            u: MetersPSec(0.0),
            v: MetersPSec(0.0),
        },
        res => res?,
    };

    let shear_mag = shear_u.unpack().hypot(shear_v.unpack());
    let (delta_u, delta_v) = if shear_mag > 0.0 {
        let scale = BUNKERS_DEVIATION / shear_mag;
        (shear_v * scale, -shear_u * scale)
    } else {
        (MetersPSec(0.0), MetersPSec(0.0))
    };

    Ok((
        WindUV {
            u: mean_u + delta_u,
            v: mean_v + delta_v,
        },
        WindUV {
            u: mean_u - delta_u,
            v: mean_v - delta_v,
        },
    ))
}

/// Calculate the bulk shear of a layer using winds averaged over the bottom and top half km.
///
/// When using the id method for storm motion vectors, the bulk shear was calculated with top and
/// bottom wind vectors that were averaged over top/bottom half km of the layer.
pub(crate) fn bulk_shear_half_km(
    height: &[Meters],
    wind: &[WindUV<MetersPSec>],
    bottom: Meters,
    top: Meters,
) -> Result<WindUV<MetersPSec>> {
    // abort if not at least 250 meters of non-overlapping area.
    if top - bottom < Meters(750.0) {
        return Err(AnalysisError::NotEnoughData);
    }

    let WindUV {
        u: bottom_u,
        v: bottom_v,
    } = mean_wind(height, wind, bottom, bottom + Meters(500.0))?;

    let WindUV { u: top_u, v: top_v } = mean_wind(height, wind, top - Meters(500.0), top)?;

    Ok(WindUV {
        u: top_u - bottom_u,
        v: top_v - bottom_v,
    })
}

/// Subtract the storm motion from every level of the wind profile.
pub fn storm_relative_wind(
    wind: &[WindUV<MetersPSec>],
    storm_motion: WindUV<MetersPSec>,
) -> Vec<WindUV<MetersPSec>> {
    wind.iter()
        .map(|&WindUV { u, v }| WindUV {
            u: u - storm_motion.u,
            v: v - storm_motion.v,
        })
        .collect()
}

/// The arithmetic mean of the storm relative wind speed at every level in the lowest kilometer.
///
/// This is a plain average of the levels, so it is weighted toward wherever the data is densest.
pub fn mean_storm_relative_speed(
    height: &[Meters],
    sr_wind: &[WindUV<MetersPSec>],
) -> Result<MetersPSec> {
    let bottom = *height.first().ok_or(AnalysisError::NotEnoughData)?;

    let (sum, count) = izip!(height, sr_wind)
        .take_while(|(&h, _)| h - bottom <= INFLOW_TOP)
        .map(|(_, w)| speed(w))
        .fold((0.0, 0usize), |(sum, count), spd| (sum + spd, count + 1));

    if count == 0 {
        return Err(AnalysisError::NotEnoughData);
    }

    Ok(MetersPSec(sum / count as f64))
}

/// Integrate the storm relative wind speed over height between two levels, m^2/s.
///
/// The end points are interpolated and the actual level spacing is used.
pub fn storm_relative_speed_integral(
    height: &[Meters],
    sr_wind: &[WindUV<MetersPSec>],
    bottom: Meters,
    top: Meters,
) -> Result<f64> {
    if top <= bottom {
        return Err(AnalysisError::InvalidInput);
    }

    let bottom_wind = linear_interpolate_wind(height, sr_wind, bottom)
        .ok_or(AnalysisError::InterpolationError)?;
    let top_wind =
        linear_interpolate_wind(height, sr_wind, top).ok_or(AnalysisError::InterpolationError)?;

    let integral = once((bottom, bottom_wind))
        .chain(
            izip!(height, sr_wind)
                .map(|(&h, &w)| (h, w))
                .skip_while(|&(h, _)| h <= bottom)
                .take_while(|&(h, _)| h < top),
        )
        .chain(once((top, top_wind)))
        // Wind speed at each level
        .map(|(h, w)| (h.unpack(), speed(&w)))
        .tuple_windows::<(_, _)>()
        .map(|((h0, s0), (h1, s1))| (s0 + s1) * (h1 - h0))
        .sum::<f64>();

    Ok(integral / 2.0)
}

#[inline]
fn speed(wind: &WindUV<MetersPSec>) -> f64 {
    wind.u.unpack().hypot(wind.v.unpack())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn make_uniform_shear() -> (Vec<Meters>, Vec<WindUV<MetersPSec>>) {
        // u increases by 2 m/s per km, v is always 0
        (0..=12)
            .map(|i| {
                let h = 1000.0 * i as f64;
                (
                    Meters(h),
                    WindUV {
                        u: MetersPSec(2.0 * h / 1000.0),
                        v: MetersPSec(0.0),
                    },
                )
            })
            .unzip()
    }

    #[test]
    fn test_mean_wind() {
        let (hgt, wind) = make_uniform_shear();

        let WindUV { u, v } = mean_wind(&hgt, &wind, Meters(0.0), Meters(6000.0)).unwrap();
        assert_relative_eq!(u.unpack(), 6.0, max_relative = 1.0e-12);
        assert_relative_eq!(v.unpack(), 0.0);

        // End points in between levels are interpolated
        let WindUV { u, .. } = mean_wind(&hgt, &wind, Meters(500.0), Meters(2500.0)).unwrap();
        assert_relative_eq!(u.unpack(), 3.0, max_relative = 1.0e-12);

        assert!(mean_wind(&hgt, &wind, Meters(500.0), Meters(500.0)).is_err());
    }

    #[test]
    fn test_bunkers_right_mover_is_right_of_shear() {
        let (hgt, wind) = make_uniform_shear();

        let (right, left) = bunkers_storm_motion(&hgt, &wind).unwrap();

        // Mean wind is (6, 0), shear points east so right movers go south of the mean wind.
        assert_relative_eq!(right.u.unpack(), 6.0, max_relative = 1.0e-12);
        assert_relative_eq!(right.v.unpack(), -7.5, max_relative = 1.0e-12);
        assert_relative_eq!(left.u.unpack(), 6.0, max_relative = 1.0e-12);
        assert_relative_eq!(left.v.unpack(), 7.5, max_relative = 1.0e-12);
    }

    #[test]
    fn test_bunkers_shallow_profile() {
        let (hgt, wind) = make_uniform_shear();

        // Only 4 km deep, mean wind (4, 0) and the shear still points east.
        let (right, left) = bunkers_storm_motion(&hgt[..5], &wind[..5]).unwrap();
        assert_relative_eq!(right.u.unpack(), 4.0, max_relative = 1.0e-12);
        assert_relative_eq!(right.v.unpack(), -7.5, max_relative = 1.0e-12);
        assert_relative_eq!(left.v.unpack(), 7.5, max_relative = 1.0e-12);

        // Too shallow for the half km averages, so no deviation.
        let hgt = [Meters(0.0), Meters(500.0)];
        let wind = [
            WindUV {
                u: MetersPSec(2.0),
                v: MetersPSec(0.0),
            },
            WindUV {
                u: MetersPSec(4.0),
                v: MetersPSec(0.0),
            },
        ];
        let (right, left) = bunkers_storm_motion(&hgt, &wind).unwrap();
        assert_relative_eq!(right.u.unpack(), 3.0, max_relative = 1.0e-12);
        assert_eq!(right.u, left.u);
        assert_eq!(right.v, left.v);
    }

    #[test]
    fn test_bunkers_without_shear() {
        let hgt: Vec<Meters> = (0..=8).map(|i| Meters(1000.0 * i as f64)).collect();

        // Calm
        let calm = vec![
            WindUV {
                u: MetersPSec(0.0),
                v: MetersPSec(0.0),
            };
            hgt.len()
        ];
        let (right, left) = bunkers_storm_motion(&hgt, &calm).unwrap();
        assert_eq!(right.u, MetersPSec(0.0));
        assert_eq!(right.v, MetersPSec(0.0));
        assert_eq!(left.u, MetersPSec(0.0));
        assert_eq!(left.v, MetersPSec(0.0));

        // Uniform wind, storms move with it.
        let uniform = vec![
            WindUV {
                u: MetersPSec(10.0),
                v: MetersPSec(-3.0),
            };
            hgt.len()
        ];
        let (right, _) = bunkers_storm_motion(&hgt, &uniform).unwrap();
        assert_relative_eq!(right.u.unpack(), 10.0, max_relative = 1.0e-12);
        assert_relative_eq!(right.v.unpack(), -3.0, max_relative = 1.0e-12);
    }

    #[test]
    fn test_storm_relative_speeds() {
        let (hgt, wind) = make_uniform_shear();
        let storm = WindUV {
            u: MetersPSec(6.0),
            v: MetersPSec(0.0),
        };

        let sr = storm_relative_wind(&wind, storm);
        assert_relative_eq!(sr[0].u.unpack(), -6.0);
        assert_relative_eq!(sr[3].u.unpack(), 0.0);

        // Levels at 0 and 1000 m, speeds 6 and 4
        let mean = mean_storm_relative_speed(&hgt, &sr).unwrap();
        assert_relative_eq!(mean.unpack(), 5.0, max_relative = 1.0e-12);

        // |u| is 6 - 2z (km) below 3 km and 2z - 6 above, integral from 1 to 5 km is 8 km m/s
        let integral = storm_relative_speed_integral(&hgt, &sr, Meters(1000.0), Meters(5000.0))
            .unwrap();
        assert_relative_eq!(integral, 8000.0, max_relative = 1.0e-12);
    }
}
