//! Structural and physical checks on a sounding before it is analyzed.

use crate::{
    error::{AnalysisError, ProfileDefect, Result},
    sounding::Sounding,
};
use itertools::Itertools;
use metfor::{Quantity, WindUV};
use optional::{Noned, Optioned};

// Bounds on what can be a real value for each variable. A pressure given in Pa where hPa is
// expected, or a temperature in kelvin where celsius is expected, lands outside of these.
const PRESSURE_RANGE: (f64, f64) = (0.0, 1100.0); // hPa, lower bound is exclusive
const TEMPERATURE_RANGE: (f64, f64) = (-150.0, 80.0); // C
const SPECIFIC_HUMIDITY_RANGE: (f64, f64) = (0.0, 0.1); // kg/kg, upper bound is exclusive
const HEIGHT_RANGE: (f64, f64) = (-1000.0, 100_000.0); // m
const MAX_WIND_COMPONENT: f64 = 200.0; // m/s

/// Check a sounding for problems that would make the analysis meaningless.
///
/// All profiles must be the same length with at least two levels, contain no missing values, hold
/// values that are plausible for their units, and be ordered from the bottom to the top with
/// height strictly increasing and pressure strictly decreasing.
pub fn validate(snd: &Sounding) -> Result<()> {
    check_lengths(snd)?;

    check_values(snd.height_profile(), |h| {
        in_range(h.unpack(), HEIGHT_RANGE)
    })?;
    check_values(snd.pressure_profile(), |p| {
        let p = p.unpack();
        p > PRESSURE_RANGE.0 && p <= PRESSURE_RANGE.1
    })?;
    check_values(snd.temperature_profile(), |t| {
        in_range(t.unpack(), TEMPERATURE_RANGE)
    })?;
    check_values(snd.specific_humidity_profile(), |&q| {
        q >= SPECIFIC_HUMIDITY_RANGE.0 && q < SPECIFIC_HUMIDITY_RANGE.1
    })?;
    check_values(snd.wind_profile(), |WindUV { u, v }| {
        let (u, v) = (u.unpack(), v.unpack());
        u.is_finite()
            && v.is_finite()
            && u.abs() < MAX_WIND_COMPONENT
            && v.abs() < MAX_WIND_COMPONENT
    })?;

    check_monotonic(
        snd.height_profile(),
        |h0, h1| h1.unpack() > h0.unpack(),
        ProfileDefect::HeightNotIncreasing,
    )?;
    check_monotonic(
        snd.pressure_profile(),
        |p0, p1| p1.unpack() < p0.unpack(),
        ProfileDefect::PressureNotDecreasing,
    )?;

    Ok(())
}

fn check_lengths(snd: &Sounding) -> Result<()> {
    let len = snd.height_profile().len();

    let same_length = [
        snd.pressure_profile().len(),
        snd.temperature_profile().len(),
        snd.specific_humidity_profile().len(),
        snd.wind_profile().len(),
    ]
    .iter()
    .all(|&other| other == len);

    if !same_length {
        Err(AnalysisError::InvalidProfile(ProfileDefect::LengthMismatch))
    } else if len < 2 {
        Err(AnalysisError::InvalidProfile(ProfileDefect::TooFewLevels))
    } else {
        Ok(())
    }
}

fn check_values<T, F>(profile: &[Optioned<T>], is_physical: F) -> Result<()>
where
    T: Noned + Copy,
    F: Fn(&T) -> bool,
{
    profile
        .iter()
        // Missing values are a units problem at the boundary, the caller never gave a value
        .map(|val| val.into_option().ok_or(AnalysisError::UnitsError))
        .try_for_each(|val| {
            val.and_then(|val| {
                if is_physical(&val) {
                    Ok(())
                } else {
                    Err(AnalysisError::UnitsError)
                }
            })
        })
}

fn check_monotonic<T, F>(profile: &[Optioned<T>], in_order: F, defect: ProfileDefect) -> Result<()>
where
    T: Noned + Copy,
    F: Fn(T, T) -> bool,
{
    let ordered = profile
        .iter()
        .filter_map(|val| val.into_option())
        .tuple_windows::<(_, _)>()
        .all(|(v0, v1)| in_order(v0, v1));

    if ordered {
        Ok(())
    } else {
        Err(AnalysisError::InvalidProfile(defect))
    }
}

#[inline]
fn in_range(val: f64, (min, max): (f64, f64)) -> bool {
    val.is_finite() && val >= min && val <= max
}
