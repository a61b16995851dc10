//! Entraining CAPE, the analytic combination of CAPE, storm relative wind, and the buoyancy
//! dilution potential.
//!
//! # References
//!
//! Peters, J. M., D. R. Chavas, C.-Y. Su, H. Morrison, and B. E. Coffer, 2023: An analytic
//! formula for entraining CAPE in mid-latitude storm environments. J. Atmos. Sci., 80, 2165–2186,
//! https://doi.org/10.1175/JAS-D-22-0215.1

use crate::{
    constants::G,
    entrainment::{
        last_level_below, moisture_integrals, ncape, EntrainmentParameters, MoistureIntegrals,
    },
    error::{AnalysisError, Result},
    parcel::{starting_parcel, ParcelType},
    parcel_profile::{lift_parcel, ParcelAscentAnalysis, ParcelProfile},
    profile::{prepare, Environment},
    sounding::Sounding,
    wind::{mean_storm_relative_speed, storm_relative_speed_integral},
};
use metfor::{HectoPascal, JpKg, Meters, MetersPSec, Quantity};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, trace};

/// The layer the storm relative wind speed in the formula is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StormRelativeLayer {
    /// Mean of the storm relative speed at the levels in the lowest kilometer.
    Inflow,
    /// Height weighted mean of the storm relative speed from the LFC to the EL.
    CloudLayer,
}

impl Default for StormRelativeLayer {
    fn default() -> Self {
        StormRelativeLayer::Inflow
    }
}

/// Options for an ECAPE analysis.
///
/// ```rust
/// use ecape_analysis::{EcapeOptions, EntrainmentParameters, ParcelType, StormRelativeLayer};
/// use metfor::{JpKg, Meters};
///
/// let opts = EcapeOptions::new()
///     .with_parcel_type(ParcelType::MixedLayer)
///     .with_cape_override(JpKg(2000.0))
///     .with_moisture(true)
///     .with_storm_relative_layer(StormRelativeLayer::CloudLayer)
///     .with_entrainment(EntrainmentParameters::default().with_radius(Meters(5_000.0)));
///
/// assert_eq!(opts.parcel_type(), ParcelType::MixedLayer);
/// assert_eq!(opts.cape_override(), Some(JpKg(2000.0)));
/// assert!(opts.include_moisture());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EcapeOptions {
    parcel_type: ParcelType,
    cape_override: Option<JpKg>,
    include_moisture: bool,
    storm_relative_layer: StormRelativeLayer,
    entrainment: EntrainmentParameters,
}

impl EcapeOptions {
    /// Most unstable parcel, no override, no moisture variant, inflow layer storm relative wind,
    /// and the default entrainment parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for the parcel type.
    pub fn with_parcel_type(self, parcel_type: ParcelType) -> Self {
        EcapeOptions {
            parcel_type,
            ..self
        }
    }

    /// Builder method to use this CAPE instead of the CAPE of the lifted parcel.
    pub fn with_cape_override(self, cape: JpKg) -> Self {
        EcapeOptions {
            cape_override: Some(cape),
            ..self
        }
    }

    /// Builder method to also compute ECAPE reduced by condensate loading.
    pub fn with_moisture(self, include_moisture: bool) -> Self {
        EcapeOptions {
            include_moisture,
            ..self
        }
    }

    /// Builder method for the storm relative wind layer.
    pub fn with_storm_relative_layer(self, storm_relative_layer: StormRelativeLayer) -> Self {
        EcapeOptions {
            storm_relative_layer,
            ..self
        }
    }

    /// Builder method for the entrainment parameters.
    pub fn with_entrainment(self, entrainment: EntrainmentParameters) -> Self {
        EcapeOptions {
            entrainment,
            ..self
        }
    }

    /// Get the parcel type.
    pub fn parcel_type(&self) -> ParcelType {
        self.parcel_type
    }

    /// Get the CAPE override, if any.
    pub fn cape_override(&self) -> Option<JpKg> {
        self.cape_override
    }

    /// Whether the condensate loaded variant is computed.
    pub fn include_moisture(&self) -> bool {
        self.include_moisture
    }

    /// Get the storm relative wind layer.
    pub fn storm_relative_layer(&self) -> StormRelativeLayer {
        self.storm_relative_layer
    }

    /// Get the entrainment parameters.
    pub fn entrainment(&self) -> &EntrainmentParameters {
        &self.entrainment
    }
}

/// The results of an ECAPE analysis and the intermediate values that went into it.
#[derive(Debug, Clone)]
pub struct EcapeAnalysis {
    parcel_analysis: ParcelAscentAnalysis,
    cape: JpKg,
    ecape: JpKg,
    ecape_a: Option<JpKg>,
    ncape: JpKg,
    psi: f64,
    entrainment_rate: f64,
    inflow_storm_relative_speed: MetersPSec,
    cloud_layer_storm_relative_speed: MetersPSec,
    storm_relative_speed: MetersPSec,
    moisture: MoistureIntegrals,
}

impl EcapeAnalysis {
    /// Entraining CAPE.
    pub fn ecape(&self) -> JpKg {
        self.ecape
    }

    /// Entraining CAPE reduced by the loading of the condensate retained in the cloud, only
    /// available if it was requested in the options.
    pub fn ecape_a(&self) -> Option<JpKg> {
        self.ecape_a
    }

    /// The CAPE used in the formula, this is the override if there was one.
    pub fn cape(&self) -> JpKg {
        self.cape
    }

    /// The buoyancy dilution potential.
    pub fn ncape(&self) -> JpKg {
        self.ncape
    }

    /// The nondimensional entrainment parameter.
    pub fn psi(&self) -> f64 {
        self.psi
    }

    /// The fractional entrainment rate, 1/m.
    pub fn entrainment_rate(&self) -> f64 {
        self.entrainment_rate
    }

    /// Mean storm relative wind speed in the lowest kilometer.
    pub fn inflow_storm_relative_speed(&self) -> MetersPSec {
        self.inflow_storm_relative_speed
    }

    /// Mean storm relative wind speed between the LFC and EL.
    pub fn cloud_layer_storm_relative_speed(&self) -> MetersPSec {
        self.cloud_layer_storm_relative_speed
    }

    /// The storm relative wind speed that went into the formula.
    pub fn storm_relative_speed(&self) -> MetersPSec {
        self.storm_relative_speed
    }

    /// Water integrated through the updraft.
    pub fn moisture(&self) -> &MoistureIntegrals {
        &self.moisture
    }

    /// The analysis of the lifted parcel.
    pub fn parcel_analysis(&self) -> &ParcelAscentAnalysis {
        &self.parcel_analysis
    }
}

/// Combine CAPE, storm relative wind speed, psi, and NCAPE into entraining CAPE with equation 55
/// of Peters et al. (2023).
///
/// The equation is rearranged so it never divides by psi or the wind speed. That leaves it finite
/// in the limit of no entrainment, where the result is CAPE plus the kinetic energy of the storm
/// relative wind, and with calm storm relative winds. The result is never negative, and no CAPE
/// means no entraining CAPE.
///
/// ```rust
/// use ecape_analysis::entraining_cape;
/// use metfor::{JpKg, MetersPSec, Quantity};
///
/// let ecape = entraining_cape(MetersPSec(10.0), 0.0, JpKg(500.0), JpKg(2000.0));
/// assert!((ecape.unpack() - 2050.0).abs() < 1.0e-9);
///
/// assert_eq!(entraining_cape(MetersPSec(10.0), 0.003, JpKg(500.0), JpKg(0.0)), JpKg(0.0));
/// ```
pub fn entraining_cape(sr_speed: MetersPSec, psi: f64, ncape: JpKg, cape: JpKg) -> JpKg {
    let cape = cape.unpack();
    if !(cape > 0.0) {
        return JpKg(0.0);
    }

    let s = sr_speed.unpack().powi(2);
    let ncape = ncape.unpack();

    let a = (1.0 + psi) * s + 2.0 * psi * ncape;
    let x = 8.0 * psi * s * (cape - psi * ncape);

    let radicand = a * a + x;
    let energy = if radicand < 0.0 {
        // Only reachable through rounding, x < 0 requires psi > 0.
        debug!(radicand, psi, ncape, "negative radicand clamped to zero");
        -a / (4.0 * psi)
    } else {
        let root = radicand.sqrt();

        if a < 0.0 {
            // No cancellation here, and a < 0 requires psi > 0.
            (root - a) / (4.0 * psi)
        } else if root + a > 0.0 {
            // Multiplied through by the conjugate, x / (4 psi) = 2 s (cape - psi ncape)
            2.0 * s * (cape - psi * ncape) / (root + a)
        } else if psi == 0.0 {
            cape
        } else {
            0.0
        }
    };

    JpKg((s / 2.0 + energy).max(0.0))
}

/// Calculate entraining CAPE for a sounding along with everything that went into it.
///
/// The sounding is validated and prepared, the parcel chosen by the options is lifted, and the
/// entrainment and storm relative wind integrals are evaluated between the LFC and EL. If the
/// parcel has no LFC the result is zero, even with a CAPE override.
pub fn ecape_analysis(snd: &Sounding, opts: &EcapeOptions) -> Result<EcapeAnalysis> {
    let env = prepare(snd)?;
    let parcel = starting_parcel(&env, opts.parcel_type)?;
    let parcel_analysis = lift_parcel(parcel, &env)?;

    let cape = opts.cape_override.unwrap_or_else(|| parcel_analysis.cape());
    let inflow_storm_relative_speed =
        mean_storm_relative_speed(env.height_agl(), env.storm_relative_wind())?;

    let (lfc_p, el_p, lfc_h, el_h) = match (
        parcel_analysis.lfc_pressure().into_option(),
        parcel_analysis.el_pressure().into_option(),
        parcel_analysis.lfc_height_agl().into_option(),
        parcel_analysis.el_height_agl().into_option(),
    ) {
        (Some(lfc_p), Some(el_p), Some(lfc_h), Some(el_h)) => (lfc_p, el_p, lfc_h, el_h),
        _ => {
            debug!(parcel_type = %opts.parcel_type, "no LFC, no entraining CAPE");
            return Ok(EcapeAnalysis {
                parcel_analysis,
                cape,
                ecape: JpKg(0.0),
                ecape_a: if opts.include_moisture {
                    Some(JpKg(0.0))
                } else {
                    None
                },
                ncape: JpKg(0.0),
                psi: 0.0,
                entrainment_rate: 0.0,
                inflow_storm_relative_speed,
                cloud_layer_storm_relative_speed: MetersPSec(0.0),
                storm_relative_speed: MetersPSec(0.0),
                moisture: MoistureIntegrals::default(),
            });
        }
    };

    let lfc_idx = last_level_below(env.pressure(), lfc_p).unwrap_or(0);
    let el_idx = last_level_below(env.pressure(), el_p).unwrap_or(0);
    let depth = updraft_depth(&env, el_idx, el_h);

    let psi = opts.entrainment.psi(depth)?;
    let entrainment_rate = opts.entrainment.entrainment_rate(depth)?;
    let ncape = ncape(&env, lfc_idx, el_idx)?;

    let cloud_layer_storm_relative_speed = MetersPSec(
        storm_relative_speed_integral(env.height_agl(), env.storm_relative_wind(), lfc_h, el_h)?
            / (el_h - lfc_h).unpack(),
    );

    let storm_relative_speed = match opts.storm_relative_layer {
        StormRelativeLayer::Inflow => inflow_storm_relative_speed,
        StormRelativeLayer::CloudLayer => cloud_layer_storm_relative_speed,
    };

    let ecape = entraining_cape(storm_relative_speed, psi, ncape, cape);

    let profile = parcel_analysis.profile();
    let moisture = moisture_integrals(
        profile,
        profile_index(profile, lfc_p)?,
        profile_index(profile, el_p)?,
    )?;

    let ecape_a = if opts.include_moisture {
        Some(JpKg((ecape.unpack() - G * moisture.cloud_water).max(0.0)))
    } else {
        None
    };

    trace!(lfc_idx, el_idx, depth = depth.unpack(), "entrainment layer");
    debug!(
        parcel_type = %opts.parcel_type,
        cape = cape.unpack(),
        ncape = ncape.unpack(),
        psi,
        storm_relative_speed = storm_relative_speed.unpack(),
        ecape = ecape.unpack(),
        "entraining CAPE"
    );

    Ok(EcapeAnalysis {
        parcel_analysis,
        cape,
        ecape,
        ecape_a,
        ncape,
        psi,
        entrainment_rate,
        inflow_storm_relative_speed,
        cloud_layer_storm_relative_speed,
        storm_relative_speed,
        moisture,
    })
}

/// Entraining CAPE of a sounding with the default options for everything but the parcel.
pub fn ecape(snd: &Sounding, parcel_type: ParcelType) -> Result<JpKg> {
    let opts = EcapeOptions::new().with_parcel_type(parcel_type);
    ecape_analysis(snd, &opts).map(|anal| anal.ecape())
}

/// Entraining CAPE and the condensate loaded entraining CAPE, in that order.
pub fn ecape_with_moisture(snd: &Sounding, parcel_type: ParcelType) -> Result<(JpKg, JpKg)> {
    let opts = EcapeOptions::new()
        .with_parcel_type(parcel_type)
        .with_moisture(true);
    let anal = ecape_analysis(snd, &opts)?;

    let ecape_a = anal.ecape_a().ok_or(AnalysisError::MissingValue)?;
    Ok((anal.ecape(), ecape_a))
}

// The depth of the updraft is the height of the environment level just below the EL. An EL
// below the second level has no such level, so fall back to the EL itself.
fn updraft_depth(env: &Environment, el_idx: usize, el_height: Meters) -> Meters {
    match env.height_agl().get(el_idx) {
        Some(&h) if h > Meters(0.0) => h,
        _ => el_height,
    }
}

// LFC and EL levels are inserted into the parcel profile, so this lands on them exactly.
fn profile_index(profile: &ParcelProfile, target_p: HectoPascal) -> Result<usize> {
    profile
        .pressure
        .iter()
        .position(|&p| p <= target_p)
        .ok_or(AnalysisError::InterpolationError)
}
