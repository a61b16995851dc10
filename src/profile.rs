//! Validate a sounding and derive the profiles the rest of the analysis works from.

use crate::{
    constants::{CP_D, G, LV},
    error::{AnalysisError, Result},
    sounding::Sounding,
    validate::validate,
    wind::{bunkers_storm_motion, storm_relative_wind},
};
use itertools::izip;
use metfor::{Celsius, HectoPascal, Kelvin, Meters, MetersPSec, Quantity, WindUV};
use tracing::{debug, trace};

// Dew point is undefined for completely dry air, so dry levels are treated as this moist.
const MIN_SPECIFIC_HUMIDITY: f64 = 1.0e-8;

/// A validated sounding with the derived profiles needed for parcel and entrainment analysis.
///
/// All profiles are parallel, bottom to top, and contain no missing values.
#[derive(Debug, Clone)]
pub struct Environment {
    height: Vec<Meters>,
    height_agl: Vec<Meters>,
    pressure: Vec<HectoPascal>,
    temperature: Vec<Celsius>,
    specific_humidity: Vec<f64>,
    dew_point: Vec<Celsius>,
    virtual_temperature: Vec<Celsius>,
    theta_e: Vec<Kelvin>,
    wind: Vec<WindUV<MetersPSec>>,
    storm_motion: WindUV<MetersPSec>,
    storm_relative_wind: Vec<WindUV<MetersPSec>>,
}

/// Validate the sounding and derive the dew point, virtual temperature, equivalent potential
/// temperature, storm motion, and storm relative wind profiles.
pub fn prepare(snd: &Sounding) -> Result<Environment> {
    validate(snd)?;

    // Validation guarantees there are no missing values from here on.
    let height: Vec<Meters> = snd.height_profile().iter().map(|h| h.unpack()).collect();
    let pressure: Vec<HectoPascal> = snd.pressure_profile().iter().map(|p| p.unpack()).collect();
    let temperature: Vec<Celsius> = snd
        .temperature_profile()
        .iter()
        .map(|t| t.unpack())
        .collect();
    let specific_humidity: Vec<f64> = snd
        .specific_humidity_profile()
        .iter()
        .map(|q| q.unpack())
        .collect();
    let wind: Vec<WindUV<MetersPSec>> = snd.wind_profile().iter().map(|w| w.unpack()).collect();

    let bottom = height[0];
    let height_agl: Vec<Meters> = height.iter().map(|&h| h - bottom).collect();

    let dew_point = izip!(&pressure, &specific_humidity)
        .map(|(&p, &q)| {
            metfor::dew_point_from_p_and_specific_humidity(p, q.max(MIN_SPECIFIC_HUMIDITY))
                .ok_or(AnalysisError::MetForError)
        })
        .collect::<Result<Vec<Celsius>>>()?;

    let virtual_temperature = izip!(&pressure, &temperature, &dew_point)
        .map(|(&p, &t, &dp)| {
            metfor::virtual_temperature(t, dp, p)
                .map(Celsius::from)
                .ok_or(AnalysisError::MetForError)
        })
        .collect::<Result<Vec<Celsius>>>()?;

    let theta_e = izip!(&pressure, &temperature, &dew_point)
        .map(|(&p, &t, &dp)| {
            metfor::equiv_pot_temperature(t, dp, p).ok_or(AnalysisError::MetForError)
        })
        .collect::<Result<Vec<Kelvin>>>()?;

    let (storm_motion, _left_mover) = bunkers_storm_motion(&height_agl, &wind)?;
    let storm_relative_wind = storm_relative_wind(&wind, storm_motion);
    debug!(
        u = storm_motion.u.unpack(),
        v = storm_motion.v.unpack(),
        "bunkers right mover storm motion"
    );
    trace!(levels = height.len(), "prepared environment");

    Ok(Environment {
        height,
        height_agl,
        pressure,
        temperature,
        specific_humidity,
        dew_point,
        virtual_temperature,
        theta_e,
        wind,
        storm_motion,
        storm_relative_wind,
    })
}

impl Environment {
    /// Height above mean sea level, or whatever datum the caller used.
    #[inline]
    pub fn height(&self) -> &[Meters] {
        &self.height
    }

    /// Height above the lowest level.
    #[inline]
    pub fn height_agl(&self) -> &[Meters] {
        &self.height_agl
    }

    /// Pressure profile.
    #[inline]
    pub fn pressure(&self) -> &[HectoPascal] {
        &self.pressure
    }

    /// Temperature profile.
    #[inline]
    pub fn temperature(&self) -> &[Celsius] {
        &self.temperature
    }

    /// Specific humidity profile, kg/kg.
    #[inline]
    pub fn specific_humidity(&self) -> &[f64] {
        &self.specific_humidity
    }

    /// Dew point profile derived from the specific humidity.
    #[inline]
    pub fn dew_point(&self) -> &[Celsius] {
        &self.dew_point
    }

    /// Virtual temperature profile.
    #[inline]
    pub fn virtual_temperature(&self) -> &[Celsius] {
        &self.virtual_temperature
    }

    /// Equivalent potential temperature profile.
    #[inline]
    pub fn theta_e(&self) -> &[Kelvin] {
        &self.theta_e
    }

    /// Wind profile.
    #[inline]
    pub fn wind(&self) -> &[WindUV<MetersPSec>] {
        &self.wind
    }

    /// The Bunkers right mover storm motion.
    #[inline]
    pub fn storm_motion(&self) -> WindUV<MetersPSec> {
        self.storm_motion
    }

    /// Wind relative to the storm motion.
    #[inline]
    pub fn storm_relative_wind(&self) -> &[WindUV<MetersPSec>] {
        &self.storm_relative_wind
    }

    /// Number of levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.height.len()
    }

    /// Always false for a prepared environment, there are at least two levels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height.is_empty()
    }

    /// Moist static energy, cp T + g z + Lv q, in J/kg.
    pub fn moist_static_energy(&self) -> Vec<f64> {
        izip!(&self.height, &self.temperature, &self.specific_humidity)
            .map(|(&z, &t, &q)| moist_static_energy(z, t, q))
            .collect()
    }

    /// Saturated moist static energy, the moist static energy if the air at each level held its
    /// saturation mixing ratio, in J/kg.
    pub fn saturated_moist_static_energy(&self) -> Result<Vec<f64>> {
        izip!(&self.height, &self.pressure, &self.temperature)
            .map(|(&z, &p, &t)| {
                metfor::mixing_ratio(t, p)
                    .map(|rs| moist_static_energy(z, t, rs))
                    .ok_or(AnalysisError::MetForError)
            })
            .collect()
    }

    /// The mean moist static energy of all the levels from the bottom up to each level, in J/kg.
    pub fn mean_moist_static_energy(&self) -> Vec<f64> {
        self.moist_static_energy()
            .into_iter()
            .scan((0.0, 0.0), |(sum, count), mse| {
                *sum += mse;
                *count += 1.0;
                Some(*sum / *count)
            })
            .collect()
    }
}

#[inline]
fn moist_static_energy(z: Meters, t: Celsius, q: f64) -> f64 {
    CP_D * Kelvin::from(t).unpack() + G * z.unpack() + LV * q
}
