//! Generates `write_*`/`read_*` routines for the fixture types in
//! `src/fixtures.rs` from `models/fixtures.json`.
use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let unit_path = manifest_dir.join("models").join("fixtures.json");
    println!("cargo:rerun-if-changed={}", unit_path.display());

    let source = std::fs::read(&unit_path)
        .unwrap_or_else(|error| panic!("failed to read {}: {error}", unit_path.display()));
    let unit = parcel_gen::UnitModel::from_json_slice(&source)
        .unwrap_or_else(|error| panic!("invalid unit {}: {error}", unit_path.display()));
    let rust_src = parcel_gen::generate(&unit).unwrap_or_else(|error| panic!("generation failed: {error}"));

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let out = out_dir.join("generated.rs");
    std::fs::write(&out, rust_src).unwrap_or_else(|error| panic!("failed to write {}: {error}", out.display()));
}
