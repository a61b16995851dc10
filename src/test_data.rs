//! Data used in tests.

use crate::{constants::G, sounding::Sounding};

const RD: f64 = 287.04749097718457;

/// The supercell sounding in `test_data/supercell.csv`.
///
/// An analytic Weisman-Klemp style sounding with a cool, moist surface layer and a clockwise
/// curved hodograph.
pub(crate) fn make_supercell_sounding() -> Sounding {
    let text = include_str!("../test_data/supercell.csv");

    let mut cols: [Vec<f64>; 6] = Default::default();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let vals: Vec<f64> = line
            .split(',')
            .map(|tok| tok.trim().parse().expect("bad number in supercell.csv"))
            .collect();
        assert_eq!(vals.len(), 6);

        for (col, val) in cols.iter_mut().zip(vals) {
            col.push(val);
        }
    }

    let [height, pressure, temperature, q, u, v] = cols;
    Sounding::from_si_columns(&height, &pressure, &temperature, &q, &u, &v)
        .expect("supercell.csv is a valid sounding")
}

/// A dry sounding with a deep inversion, nothing lifted in it can reach an LFC.
pub(crate) fn make_stable_sounding() -> Sounding {
    let height: Vec<f64> = (0..=40).map(|i: i32| f64::from(i) * 250.0).collect();
    let temperature: Vec<f64> = height.iter().map(|z| 280.0 + 0.002 * z).collect();
    let q = vec![0.002; height.len()];
    let u: Vec<f64> = height.iter().map(|z| z / 1000.0).collect();
    let v: Vec<f64> = height.iter().map(|z| 2.0 + z / 2000.0).collect();

    // Hydrostatic, with the mean virtual temperature of each layer.
    let mut pressure = Vec::with_capacity(height.len());
    pressure.push(100_000.0);
    for i in 1..height.len() {
        let tv0 = temperature[i - 1] * (1.0 + 0.61 * q[i - 1]);
        let tv1 = temperature[i] * (1.0 + 0.61 * q[i]);
        let dz = height[i] - height[i - 1];
        let p = pressure[i - 1] * (-G * dz / (RD * 0.5 * (tv0 + tv1))).exp();
        pressure.push(p);
    }

    Sounding::from_si_columns(&height, &pressure, &temperature, &q, &u, &v)
        .expect("stable sounding is valid")
}

/// A conditionally unstable sounding with a moist boundary layer, tropopause at 12 km.
///
/// The profile stops at `top` meters and the wind at each height comes from `wind`, u and v in
/// m/s.
pub(crate) fn make_unstable_sounding<F>(top: f64, wind: F) -> Sounding
where
    F: Fn(f64) -> (f64, f64),
{
    let height: Vec<f64> = (0..)
        .map(|i: i32| f64::from(i) * 250.0)
        .take_while(|&z| z <= top)
        .collect();
    let temperature: Vec<f64> = height
        .iter()
        .map(|&z| if z < 12_000.0 { 300.0 - 0.0065 * z } else { 222.0 })
        .collect();
    let q: Vec<f64> = height
        .iter()
        .map(|&z| 0.016 * (-z / 2_500.0).exp())
        .collect();
    let (u, v): (Vec<f64>, Vec<f64>) = height.iter().map(|&z| wind(z)).unzip();

    let mut pressure = Vec::with_capacity(height.len());
    pressure.push(100_000.0);
    for i in 1..height.len() {
        let dz = height[i] - height[i - 1];
        let t = 0.5 * (temperature[i - 1] + temperature[i]);
        let p = pressure[i - 1] * (-G * dz / (RD * t)).exp();
        pressure.push(p);
    }

    Sounding::from_si_columns(&height, &pressure, &temperature, &q, &u, &v)
        .expect("unstable sounding is valid")
}

/// The sheared hodograph used with `make_unstable_sounding`.
pub(crate) fn veering_wind(z: f64) -> (f64, f64) {
    (2.5 * z.min(6_000.0) / 1_000.0, 5.0 * (z / 3_000.0).min(1.0))
}
