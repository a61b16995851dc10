use ecape_analysis::Sounding;
use std::{fs::File, io::Read, path::PathBuf, str::FromStr};

pub fn load_all_test_files() -> [Sounding; 2] {
    let snd1 = load_test_file("supercell.csv");
    let snd2 = load_test_file("tropical.csv");

    [snd1, snd2]
}

fn load_test_file(fname: &str) -> Sounding {
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

    let mut cols: [Vec<f64>; 6] = Default::default();
    for line in contents.lines().filter(|line| !line.starts_with('#')) {
        let tokens: Vec<&str> = line.split(',').collect();
        if tokens.len() < 6 {
            continue;
        }

        for (col, tok) in cols.iter_mut().zip(tokens) {
            col.push(f64::from_str(tok.trim()).unwrap_or(std::f64::NAN));
        }
    }

    let [height, pressure, temperature, q, u, v] = cols;
    Sounding::from_si_columns(&height, &pressure, &temperature, &q, &u, &v)
        .expect("Error building sounding")
}
