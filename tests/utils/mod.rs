use ecape_analysis::Sounding;
use std::{fs::File, io::Read, path::PathBuf, str::FromStr};

pub mod ecape_tests;

#[allow(unused_macros)] // False alarm
macro_rules! test_file {
    ($test_mod_name:ident, $fname:expr) => {
        mod $test_mod_name {
            use crate::utils;
            use ecape_analysis::{ParcelType, Sounding};

            fn load_data() -> Sounding {
                utils::init_tracing();
                utils::load_test_file($fname)
            }

            #[test]
            fn surface_based() {
                utils::ecape_tests::test_parcel_type(&load_data(), ParcelType::SurfaceBased);
            }

            #[test]
            fn most_unstable() {
                utils::ecape_tests::test_parcel_type(&load_data(), ParcelType::MostUnstable);
            }

            #[test]
            fn mixed_layer() {
                utils::ecape_tests::test_parcel_type(&load_data(), ParcelType::MixedLayer);
            }

            #[test]
            fn no_entrainment_limit() {
                utils::ecape_tests::test_no_entrainment_limit(&load_data());
            }

            #[test]
            fn cape_override() {
                utils::ecape_tests::test_cape_override(&load_data());
            }

            #[test]
            fn cloud_layer() {
                utils::ecape_tests::test_cloud_layer(&load_data());
            }

            #[test]
            fn moisture() {
                utils::ecape_tests::test_moisture(&load_data());
            }
        }
    };
}

/// Send log output to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn load_test_file(fname: &str) -> Sounding {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push(fname);
    load_test_csv_sounding(&test_path)
}

fn load_test_csv_sounding(location: &PathBuf) -> Sounding {
    let mut f = File::open(location).expect(&format!("Error opening file: {:#?}", location));

    let mut contents = String::new();
    f.read_to_string(&mut contents)
        .expect(&format!("Error reading file: {:#?}", location));

    let mut height: Vec<f64> = vec![];
    let mut pressure: Vec<f64> = vec![];
    let mut temperature: Vec<f64> = vec![];
    let mut specific_humidity: Vec<f64> = vec![];
    let mut u: Vec<f64> = vec![];
    let mut v: Vec<f64> = vec![];

    for line in contents.lines() {
        if line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split(',').collect();
        if tokens.len() < 6 {
            continue;
        }

        // Missing values are stored as NaN, which the sounding treats as missing.
        let parse = |tok: &str| f64::from_str(tok.trim()).unwrap_or(std::f64::NAN);

        height.push(parse(tokens[0]));
        pressure.push(parse(tokens[1]));
        temperature.push(parse(tokens[2]));
        specific_humidity.push(parse(tokens[3]));
        u.push(parse(tokens[4]));
        v.push(parse(tokens[5]));
    }

    Sounding::from_si_columns(&height, &pressure, &temperature, &specific_humidity, &u, &v)
        .expect("Error building sounding")
}
