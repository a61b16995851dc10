#![warn(missing_docs)]
/*!
Entraining CAPE (ECAPE) for a single atmospheric sounding.

ECAPE is the convective available potential energy of a parcel that mixes with its environment
as it rises. This crate computes it with the analytic formula of Peters et al. (2023), which
combines the CAPE of an undiluted parcel, the storm relative wind speed, and the buoyancy dilution
potential (NCAPE) of the environment.

The pipeline runs in four stages.
 1. The [`Sounding`] is validated and [prepared](prepare) into an [`Environment`] with the dew
    point, virtual temperature, equivalent potential temperature, Bunkers storm motion, and storm
    relative wind at every level.
 2. A parcel is [selected](starting_parcel) and [lifted](lift_parcel) to find its CAPE, LFC, and
    EL.
 3. The entrainment parameter [psi](EntrainmentParameters::psi), [NCAPE](ncape), the storm
    relative wind, and the [water content](moisture_integrals) of the updraft are evaluated
    between the LFC and EL.
 4. Everything is combined with [`entraining_cape`].

[`ecape_analysis`] runs the whole thing and returns the intermediate values too.

```rust
use ecape_analysis::{ecape_analysis, EcapeOptions, ParcelType, Sounding};
use metfor::{JpKg, Quantity};

// Height (m), pressure (Pa), temperature (K), specific humidity (kg/kg), u and v (m/s)
let height: Vec<f64> = (0..=64).map(|i: i32| f64::from(i) * 250.0).collect();
let temperature: Vec<f64> = height
    .iter()
    .map(|&z| if z < 12_000.0 { 300.0 - 0.0065 * z } else { 222.0 })
    .collect();
let q: Vec<f64> = height.iter().map(|&z| 0.016 * (-z / 2_500.0).exp()).collect();
let u: Vec<f64> = height.iter().map(|&z| 2.5 * z.min(6_000.0) / 1_000.0).collect();
let v: Vec<f64> = height.iter().map(|&z| 5.0 * (z / 3_000.0).min(1.0)).collect();

let mut pressure = vec![100_000.0];
for w in height.windows(2).zip(temperature.windows(2)) {
    let (z, t) = w;
    let dz = z[1] - z[0];
    let p = pressure.last().unwrap() * (-9.81 * dz / (287.0 * 0.5 * (t[0] + t[1]))).exp();
    pressure.push(p);
}

let snd = Sounding::from_si_columns(&height, &pressure, &temperature, &q, &u, &v).unwrap();

let opts = EcapeOptions::new().with_parcel_type(ParcelType::SurfaceBased);
let anal = ecape_analysis(&snd, &opts).unwrap();

assert!(anal.cape() > JpKg(0.0));
assert!(anal.ecape() > JpKg(0.0));
```

# References

Peters, J. M., D. R. Chavas, C.-Y. Su, H. Morrison, and B. E. Coffer, 2023: An analytic formula
for entraining CAPE in mid-latitude storm environments. J. Atmos. Sci., 80, 2165–2186,
https://doi.org/10.1175/JAS-D-22-0215.1

Bunkers, M. J., B. A. Klimowski, J. W. Zeitler, R. L. Thompson, and M. L. Weisman, 2000:
Predicting supercell motion using a new hodograph technique. Wea. Forecasting, 15, 61–79.
*/

//
// API
//
pub use crate::ecape::{
    ecape, ecape_analysis, ecape_with_moisture, entraining_cape, EcapeAnalysis, EcapeOptions,
    StormRelativeLayer,
};
pub use crate::entrainment::{
    last_level_below, moisture_integrals, ncape, EntrainmentParameters, MoistureIntegrals,
};
pub use crate::error::{AnalysisError, ProfileDefect, Result};
pub use crate::interpolation::{linear_interpolate, linear_interpolate_wind};
pub use crate::parcel::{
    mixed_layer_parcel, most_unstable_parcel, starting_parcel, surface_parcel, Parcel, ParcelType,
};
pub use crate::parcel_profile::{lift_parcel, ParcelAscentAnalysis, ParcelProfile};
pub use crate::profile::{prepare, Environment};
pub use crate::sounding::Sounding;
pub use crate::validate::validate;
pub use crate::wind::{
    bunkers_storm_motion, mean_storm_relative_speed, mean_wind, storm_relative_speed_integral,
    storm_relative_wind,
};

//
// Internal use only
//

// Modules
mod constants;
mod ecape;
mod entrainment;
mod error;
mod interpolation;
mod parcel;
mod parcel_profile;
mod profile;
mod sounding;
#[cfg(test)]
mod test_data;
mod validate;
mod wind;
