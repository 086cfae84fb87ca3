//! Binary encode/decode routine generator for plain Rust data types.
//!
//! A unit description (classes, their field types, the enums and interfaces
//! those fields mention) goes in; Rust source for a `write_*`/`read_*` pair
//! per class comes out. The generated routines target the [`wire`] runtime.
pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod lower;
pub mod model;
pub mod path_de;
pub mod property;
pub mod registry;
pub mod resolve;
pub mod wire;

pub use error::SynthError;
pub use model::UnitModel;
pub use resolve::{resolve_unit, Plan, ResolvedUnit};

/// Resolve and emit a whole unit.
pub fn generate(unit: &UnitModel) -> Result<String, SynthError> {
    let resolved = resolve_unit(unit)?;
    let mut cg = codegen::Codegen::new(&resolved);
    cg.emit();
    Ok(cg.into_string())
}
