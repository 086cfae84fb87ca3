//! Runtime half of the binary encoding protocol.
//!
//! Generated read/write routines link against this module. Layout decisions
//! live in the generator; the runtime only puts fixed-width values on the wire
//! and takes them off again.
//!
//! Conventions shared by every generated routine:
//! - all scalars are little-endian; anything narrower than 32 bits (bool, char,
//!   `i8`/`u8`/`i16`/`u16`) occupies one `i32` slot
//! - a nullable slot is preceded by one `i32` sentinel: [`PRESENT`] or [`ABSENT`]
//! - containers are prefixed with their element count as an `i32`
//! - polymorphic values are prefixed with an `i32` type tag, [`FALLBACK_TAG`]
//!   meaning "generic [`Value`] follows"
pub mod error;
pub mod reader;
pub mod sparse;
pub mod value;
pub mod writer;

pub use error::WireError;
pub use reader::ParcelReader;
pub use sparse::SparseArray;
pub use value::Value;
pub use writer::ParcelWriter;

// ------------------------------- Protocol -------------------------------- //

/// Sentinel written before a nullable value that is present.
pub const PRESENT: i32 = 0;
/// Sentinel written in place of a nullable value that is absent.
pub const ABSENT: i32 = 1;
/// Polymorphic tag reserved for values outside the known implementer set.
pub const FALLBACK_TAG: i32 = 0;

/// Default nesting limit for [`Value`] decoding.
pub const DEFAULT_MAX_DEPTH: usize = 64;

// ------------------------------- Context --------------------------------- //

/// Ambient state handed to read routines that cannot decode structurally.
///
/// Only generic-fallback reads and adapter reads consume it; classes that need
/// neither get read routines without a context parameter.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub max_depth: usize,
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl DecodeContext {
    pub fn new() -> Self { Self::default() }
    pub fn with_max_depth(max_depth: usize) -> Self { Self { max_depth } }
}

// ------------------------------- Adapters -------------------------------- //

/// A pluggable codec for a type the generator cannot decompose.
///
/// Generated code keeps one instance per distinct adapter identity in a lazily
/// initialised `static`, hence the `Default + Send + Sync` requirement on
/// adapters referenced from generated code.
pub trait TypeAdapter<T> {
    fn write(&self, value: &T, dest: &mut ParcelWriter) -> Result<(), WireError>;
    fn read(&self, src: &mut ParcelReader<'_>, ctx: &DecodeContext) -> Result<T, WireError>;
}

// ------------------------------- Tests ------------------------------------ //
