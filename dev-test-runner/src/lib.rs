//! Fixture types plus the routines the generator emits for them.
//!
//! Nothing here is hand-written encoding logic: `generated` comes straight
//! out of `build.rs`, and the tests drive it against exact byte layouts.
pub mod fixtures;

pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/generated.rs"));
}
