//! Create and analyze a profile from lifting a parcel.
use crate::{
    constants::G,
    error::Result,
    parcel::Parcel,
    profile::Environment,
};
use itertools::{izip, Itertools};
use metfor::{Celsius, HectoPascal, JpKg, Kelvin, Meters, Quantity};
use optional::Optioned;

/// Hold profiles for a parcel and its environment.
///
/// Heights are above the lowest level of the environment.
#[derive(Debug, Clone, Default)]
pub struct ParcelProfile {
    /// Pressure profile
    pub pressure: Vec<HectoPascal>,
    /// Height profile
    pub height: Vec<Meters>,
    /// Parcel virtual temperature profile
    pub parcel_t: Vec<Celsius>,
    /// Environment virtual temperature profile
    pub environment_t: Vec<Celsius>,
    /// Parcel water vapor specific humidity profile, kg/kg
    pub specific_humidity: Vec<f64>,
}

pub(crate) mod lift;

/// Parcel analysis, this is a way to package the analysis of a parcel.
///
/// These are done by converting the profiles to virtual temperature. It is assumed the reason for
/// lifting the parcel and doing the analysis is related to buoyancy and some kind of convection
/// or stability analysis.
#[derive(Debug, Clone)]
pub struct ParcelAscentAnalysis {
    // The orginal parcel and profile
    parcel: Parcel,
    profile: ParcelProfile,

    // Indicies from analysis
    cape: JpKg,
    cin: Optioned<JpKg>,
    lcl_pressure: HectoPascal,
    lcl_height_agl: Optioned<Meters>,
    lfc_pressure: Optioned<HectoPascal>,
    lfc_height_agl: Optioned<Meters>,
    el_pressure: Optioned<HectoPascal>,
    el_height_agl: Optioned<Meters>,
}

impl ParcelAscentAnalysis {
    /// Get the CAPE. This is zero when there is no level of free convection.
    pub fn cape(&self) -> JpKg {
        self.cape
    }

    /// Get the CIN, if there is a level of free convection.
    pub fn cin(&self) -> Optioned<JpKg> {
        self.cin
    }

    /// Get the LCL pressure level.
    pub fn lcl_pressure(&self) -> HectoPascal {
        self.lcl_pressure
    }

    /// Get the LCL height AGL.
    pub fn lcl_height_agl(&self) -> Optioned<Meters> {
        self.lcl_height_agl
    }

    /// Get the pressure at the LFC.
    pub fn lfc_pressure(&self) -> Optioned<HectoPascal> {
        self.lfc_pressure
    }

    /// Get the height AGL of the LFC.
    pub fn lfc_height_agl(&self) -> Optioned<Meters> {
        self.lfc_height_agl
    }

    /// Get the pressure at the equilibrium level.
    pub fn el_pressure(&self) -> Optioned<HectoPascal> {
        self.el_pressure
    }

    /// Get the height AGL of the equilibrium level.
    pub fn el_height_agl(&self) -> Optioned<Meters> {
        self.el_height_agl
    }

    /// Retrieve the parcel's profile
    #[inline]
    pub fn profile(&self) -> &ParcelProfile {
        &self.profile
    }

    /// Retrieve the original parcel.
    #[inline]
    pub fn parcel(&self) -> &Parcel {
        &self.parcel
    }

    /// True if the parcel reached a level of free convection.
    #[inline]
    pub fn has_lfc(&self) -> bool {
        self.lfc_pressure.is_some()
    }
}

/// Lift a parcel for a convective parcel analysis.
///
/// The parcel rises dry adiabatically to its LCL and moist adiabatically above that. The
/// resulting `ParcelProfile` and analysis are based off of virtual temperatures and the idea
/// that if there is no *moist* convection, or convective cloud, then there is no CAPE or CIN.
pub fn lift_parcel(parcel: Parcel, env: &Environment) -> Result<ParcelAscentAnalysis> {
    lift::lift_parcel(parcel, env)
}

/// Integrate the buoyancy of the profile between the bottom and top indexes with the trapezoid
/// rule. Returns (positive area, negative area) in J/kg.
fn buoyancy_areas(profile: &ParcelProfile, bottom: usize, top: usize) -> (JpKg, JpKg) {
    if top <= bottom {
        return (JpKg(0.0), JpKg(0.0));
    }

    let (pos, neg) = izip!(&profile.height, &profile.parcel_t, &profile.environment_t)
        .skip(bottom)
        .take(top - bottom + 1)
        .map(|(&h, &pt, &et)| {
            let (pt, et) = (Kelvin::from(pt), Kelvin::from(et));
            (h.unpack(), (pt - et).unpack() / et.unpack())
        })
        .tuple_windows::<(_, _)>()
        .map(|((h0, b0), (h1, b1))| (b0 + b1) * (h1 - h0))
        .fold((0.0, 0.0), |(pos, neg), area| {
            if area > 0.0 {
                (pos + area, neg)
            } else {
                (pos, neg + area)
            }
        });

    // 2 for the trapezoid rule
    (JpKg(pos * G / 2.0), JpKg(neg * G / 2.0))
}
