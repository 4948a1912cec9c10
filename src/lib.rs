//! FWorld - 2D grid-world environment for embodied agents

pub mod actions;
pub mod core;
pub mod simulation;
pub mod spatial;
pub mod world;
