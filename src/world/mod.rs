//! World materials, persistence and generation

pub mod generation;
pub mod materials;
pub mod patterns;
pub mod snapshot;

pub use materials::{Material, MaterialPalette, EMPTY};
pub use patterns::Patterns;
