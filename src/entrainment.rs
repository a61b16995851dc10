//! Entrainment parameters and the integrals that feed the entraining CAPE formula.
//!
//! # References
//!
//! Peters, J. M., D. R. Chavas, C.-Y. Su, H. Morrison, and B. E. Coffer, 2023: An analytic
//! formula for entraining CAPE in mid-latitude storm environments. J. Atmos. Sci., 80, 2165–2186,
//! https://doi.org/10.1175/JAS-D-22-0215.1

use crate::{
    constants::{CP_D, G},
    error::{AnalysisError, Result},
    parcel_profile::ParcelProfile,
    profile::Environment,
};
use itertools::{izip, Itertools};
use metfor::{HectoPascal, JpKg, Kelvin, Meters, Quantity};
use std::f64::consts::PI;
use tracing::trace;

/// Condensate above this specific humidity converts to rain, kg/kg.
const AUTOCONVERSION_THRESHOLD: f64 = 1.0e-3;

/// Constants of the entrainment closure.
///
/// The defaults are the values calibrated in Peters et al. (2023). Without an explicit radius the
/// updraft radius is the one implied by the closure for the depth of the updraft, so the result
/// matches the published formula for `psi`. Setting a radius overrides that, and a larger radius
/// means less entrainment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrainmentParameters {
    /// Ratio of the updraft radius to its depth scale, sigma.
    pub sigma: f64,
    /// Ratio of the updraft's vertical velocity at its edge to its center, alpha.
    pub alpha: f64,
    /// The turbulent mixing length.
    pub mixing_length: Meters,
    /// Turbulent Prandtl number.
    pub prandtl: f64,
    /// The square of the von Karman constant.
    pub von_karman_sq: f64,
    /// Updraft radius, if `None` it is derived from the equilibrium level height.
    pub radius: Option<Meters>,
}

impl Default for EntrainmentParameters {
    fn default() -> Self {
        EntrainmentParameters {
            sigma: 1.6,
            alpha: 0.8,
            mixing_length: Meters(120.0),
            prandtl: 1.0 / 3.0,
            von_karman_sq: 0.18,
            radius: None,
        }
    }
}

impl EntrainmentParameters {
    /// Builder method to fix the updraft radius.
    pub fn with_radius(self, radius: Meters) -> Self {
        EntrainmentParameters {
            radius: Some(radius),
            ..self
        }
    }

    /// The updraft radius implied by the closure for an updraft that reaches `el_height` above
    /// the ground.
    pub fn implied_radius(&self, el_height: Meters) -> Meters {
        Meters(2.0 * self.sigma * el_height.unpack() / (self.alpha * PI))
    }

    /// The fractional entrainment rate, 1/m.
    pub fn entrainment_rate(&self, el_height: Meters) -> Result<f64> {
        let radius = self
            .radius
            .unwrap_or_else(|| self.implied_radius(el_height))
            .unpack();

        if !(radius > 0.0) {
            return Err(AnalysisError::InvalidInput);
        }

        Ok(2.0 * self.von_karman_sq * self.mixing_length.unpack()
            / (self.prandtl * radius * radius))
    }

    /// The nondimensional entrainment parameter psi from equation 52.
    pub fn psi(&self, el_height: Meters) -> Result<f64> {
        let h = el_height.unpack();
        if !(h > 0.0) {
            return Err(AnalysisError::InvalidInput);
        }

        match self.radius {
            None => Ok(self.von_karman_sq
                * self.alpha.powi(2)
                * PI.powi(2)
                * self.mixing_length.unpack()
                / (4.0 * self.prandtl * self.sigma.powi(2) * h)),
            Some(_) => self.entrainment_rate(el_height).map(|rate| rate * h / 2.0),
        }
    }
}

/// The index of the last level in `pressure` with a pressure greater than `target`.
///
/// This is the environment level just below a special level like the LFC or EL.
pub fn last_level_below(pressure: &[HectoPascal], target: HectoPascal) -> Option<usize> {
    pressure.iter().rposition(|&p| p > target)
}

/// The buoyancy dilution potential, equation 54.
///
/// Integrated from the environment levels `lfc_idx` to `el_idx` with the trapezoid rule.
pub fn ncape(env: &Environment, lfc_idx: usize, el_idx: usize) -> Result<JpKg> {
    if el_idx <= lfc_idx {
        return Ok(JpKg(0.0));
    }
    if el_idx >= env.len() {
        return Err(AnalysisError::InvalidInput);
    }

    let mse_bar = env.mean_moist_static_energy();
    let mse_star = env.saturated_moist_static_energy()?;

    let ncape = izip!(env.height(), env.temperature(), &mse_bar, &mse_star)
        .skip(lfc_idx)
        .take(el_idx - lfc_idx + 1)
        .map(|(&z, &t, &bar, &star)| {
            let t = Kelvin::from(t).unpack();
            (z.unpack(), -(G / (CP_D * t)) * (bar - star))
        })
        .tuple_windows::<(_, _)>()
        .map(|((z0, arg0), (z1, arg1))| 0.5 * (arg0 + arg1) * (z1 - z0))
        .sum::<f64>();

    trace!(lfc_idx, el_idx, ncape, "buoyancy dilution potential");

    Ok(JpKg(ncape))
}

/// Vertically integrated water in the updraft between the LFC and EL.
///
/// Each integral is the specific humidity integrated over height, so the units are kg/kg m.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoistureIntegrals {
    /// Total water, the vapor the parcel started with.
    pub total_water: f64,
    /// Condensate that stays suspended in the cloud, up to the autoconversion threshold.
    pub cloud_water: f64,
    /// Condensate in excess of the autoconversion threshold.
    pub rain_water: f64,
}

/// Integrate the water content of the lifted parcel between two levels of its profile.
///
/// The parcel conserves its starting water, anything that is not vapor is condensate. Condensate
/// up to a Kessler type autoconversion threshold is cloud water, the rest is rain water.
pub fn moisture_integrals(
    profile: &ParcelProfile,
    lfc_idx: usize,
    el_idx: usize,
) -> Result<MoistureIntegrals> {
    let total_q = *profile
        .specific_humidity
        .first()
        .ok_or(AnalysisError::NotEnoughData)?;

    if el_idx <= lfc_idx {
        return Ok(MoistureIntegrals::default());
    }
    if el_idx >= profile.height.len() {
        return Err(AnalysisError::InvalidInput);
    }

    let (total_water, cloud_water, rain_water) =
        izip!(&profile.height, &profile.specific_humidity)
            .skip(lfc_idx)
            .take(el_idx - lfc_idx + 1)
            .map(|(&z, &q_v)| {
                let q_c = (total_q - q_v).max(0.0);
                (
                    z.unpack(),
                    q_c.min(AUTOCONVERSION_THRESHOLD),
                    (q_c - AUTOCONVERSION_THRESHOLD).max(0.0),
                )
            })
            .tuple_windows::<(_, _)>()
            .fold(
                (0.0, 0.0, 0.0),
                |(total, cloud, rain), ((z0, cloud0, rain0), (z1, cloud1, rain1))| {
                    let dz = z1 - z0;
                    (
                        total + total_q * dz,
                        cloud + 0.5 * (cloud0 + cloud1) * dz,
                        rain + 0.5 * (rain0 + rain1) * dz,
                    )
                },
            );

    Ok(MoistureIntegrals {
        total_water,
        cloud_water,
        rain_water,
    })
}
