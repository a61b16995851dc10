//! Physical constants used in the moist static energy and buoyancy integrals.
//!
//! These match the values used by MetPy so results can be compared directly. The gravity
//! constant is positive here.

/// Acceleration due to gravity, m/s^2.
pub const G: f64 = 9.80665;

/// Specific heat of dry air at constant pressure, J/(kg K).
pub const CP_D: f64 = 1_004.666_218_420_146_2;

/// Latent heat of vaporization, J/kg.
pub const LV: f64 = 2.500_84e6;
