//! Data type and methods to store an atmospheric sounding.

use crate::error::{AnalysisError, ProfileDefect, Result};
use metfor::{Celsius, HectoPascal, Kelvin, Meters, MetersPSec, Pascal, WindUV};
use optional::{none, some, Optioned};

/// All the variables needed to analyze a sounding for ECAPE.
///
/// The upper air profile variables are stored in parallel vectors ordered from the bottom of the
/// atmosphere to the top. Values are wrapped in the `Optioned` type so a caller can build a
/// sounding from data with gaps, but the analysis refuses to run on a sounding that still has
/// missing values in it. See [`validate`](crate::validate).
#[derive(Clone, Debug, Default)]
pub struct Sounding {
    height: Vec<Optioned<Meters>>,
    pressure: Vec<Optioned<HectoPascal>>,
    temperature: Vec<Optioned<Celsius>>,
    specific_humidity: Vec<Optioned<f64>>,
    wind: Vec<Optioned<WindUV<MetersPSec>>>,
}

macro_rules! make_profile_setter {
    ($(#[$attr:meta])* => $name:tt, $inner_type:ty, $p_var:ident) => {
        $(#[$attr])*
        pub fn $name(self, profile: Vec<Optioned<$inner_type>>) -> Self {
            Self {$p_var: profile, ..self}
        }
    };
}

macro_rules! make_profile_getter {
    ($(#[$attr:meta])* => $name:tt, $inner_type:ty, $p_var:ident) => {
        $(#[$attr])*
        pub fn $name(&self) -> &[Optioned<$inner_type>] {
            &self.$p_var
        }
    };
}

impl Sounding {
    /// Create a new sounding with default values. This is a proxy for default with a clearer name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ecape_analysis::Sounding;
    ///
    /// let snd = Sounding::new();
    /// assert!(snd.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Sounding::default()
    }

    /// Build a sounding from plain SI columns.
    ///
    /// Heights are in meters, pressure in pascals, temperature in kelvin, specific humidity in
    /// kg/kg and the wind components in m/s. The pressure and temperature are converted to the
    /// hectopascal and celsius types used everywhere else in the crate. Non-finite values are
    /// stored as missing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ecape_analysis::{AnalysisError, ProfileDefect, Sounding};
    ///
    /// let snd = Sounding::from_si_columns(
    ///     &[0.0, 1000.0],
    ///     &[100_000.0, 90_000.0],
    ///     &[300.0, 293.0],
    ///     &[0.012, 0.010],
    ///     &[0.0, 5.0],
    ///     &[0.0, 5.0],
    /// ).unwrap();
    /// assert_eq!(snd.len(), 2);
    ///
    /// let err = Sounding::from_si_columns(
    ///     &[0.0, 1000.0],
    ///     &[100_000.0],
    ///     &[300.0, 293.0],
    ///     &[0.012, 0.010],
    ///     &[0.0, 5.0],
    ///     &[0.0, 5.0],
    /// ).unwrap_err();
    /// assert_eq!(err, AnalysisError::InvalidProfile(ProfileDefect::LengthMismatch));
    /// ```
    pub fn from_si_columns(
        height: &[f64],
        pressure: &[f64],
        temperature: &[f64],
        specific_humidity: &[f64],
        u: &[f64],
        v: &[f64],
    ) -> Result<Self> {
        let len = height.len();
        if [
            pressure.len(),
            temperature.len(),
            specific_humidity.len(),
            u.len(),
            v.len(),
        ]
        .iter()
        .any(|&other| other != len)
        {
            return Err(AnalysisError::InvalidProfile(ProfileDefect::LengthMismatch));
        }

        let height = height
            .iter()
            .map(|&h| Optioned::from(finite(h).map(Meters)))
            .collect();
        let pressure = pressure
            .iter()
            .map(|&p| Optioned::from(finite(p).map(|p| HectoPascal::from(Pascal(p)))))
            .collect();
        let temperature = temperature
            .iter()
            .map(|&t| Optioned::from(finite(t).map(|t| Celsius::from(Kelvin(t)))))
            .collect();
        let specific_humidity = specific_humidity.iter().map(|&q| finite(q)).collect();
        let wind = u
            .iter()
            .zip(v)
            .map(|(&u, &v)| match (finite(u).into_option(), finite(v).into_option()) {
                (Some(u), Some(v)) => some(WindUV {
                    u: MetersPSec(u),
                    v: MetersPSec(v),
                }),
                _ => none(),
            })
            .collect();

        Ok(Sounding {
            height,
            pressure,
            temperature,
            specific_humidity,
            wind,
        })
    }

    make_profile_setter!(
        /// Builder method for the height profile.
        ///
        /// # Examples
        /// ```rust
        /// use ecape_analysis::Sounding;
        /// use metfor::Meters;
        /// use optional::{some, Optioned};
        ///
        /// let data = vec![0.0, 500.0, 1000.0, 3000.0, 6000.0, 9000.0, 12000.0];
        /// let height_data: Vec<Optioned<Meters>> = data.into_iter()
        ///     .map(Meters)
        ///     .map(some)
        ///     .collect();
        ///
        /// let snd = Sounding::new().with_height_profile(height_data);
        /// assert_eq!(snd.height_profile().len(), 7);
        /// ```
        #[inline]
        => with_height_profile, Meters, height
    );

    make_profile_getter!(
        /// Get the height profile.
        #[inline]
        => height_profile, Meters, height
    );

    make_profile_setter!(
        /// Builder method for the pressure profile.
        ///
        /// See `with_height_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_pressure_profile, HectoPascal, pressure
    );

    make_profile_getter!(
        /// Get the pressure profile.
        #[inline]
        => pressure_profile, HectoPascal, pressure
    );

    make_profile_setter!(
        /// Builder method for the temperature profile.
        ///
        /// See `with_height_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_temperature_profile, Celsius, temperature
    );

    make_profile_getter!(
        /// Get the temperature profile.
        #[inline]
        => temperature_profile, Celsius, temperature
    );

    make_profile_setter!(
        /// Builder method for the specific humidity profile, kg/kg.
        #[inline]
        => with_specific_humidity_profile, f64, specific_humidity
    );

    make_profile_getter!(
        /// Get the specific humidity profile.
        #[inline]
        => specific_humidity_profile, f64, specific_humidity
    );

    make_profile_setter!(
        /// Builder method for the wind profile.
        #[inline]
        => with_wind_profile, WindUV<MetersPSec>, wind
    );

    make_profile_getter!(
        /// Get the wind profile.
        #[inline]
        => wind_profile, WindUV<MetersPSec>, wind
    );

    /// Number of levels in the height profile.
    #[inline]
    pub fn len(&self) -> usize {
        self.height.len()
    }

    /// True if no height data has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height.is_empty()
    }
}

#[inline]
fn finite(val: f64) -> Optioned<f64> {
    if val.is_finite() {
        some(val)
    } else {
        none()
    }
}
