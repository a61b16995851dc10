#[macro_use]
mod utils;

test_file!(supercell, "supercell.csv");
test_file!(tropical, "tropical.csv");
