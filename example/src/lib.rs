//! Sample models and the DTOs generated from them by `build.rs`.

pub mod models;

pub mod dto {
    include!(concat!(env!("OUT_DIR"), "/dtogen.rs"));
}

/// The generated file, for checking what was left out of it.
pub const GENERATED: &str = include_str!(concat!(env!("OUT_DIR"), "/dtogen.rs"));
