//! Grid storage and ray geometry

pub mod grid;
pub mod ray;

pub use grid::WorldGrid;
pub use ray::{ang_mod, ang_vec, next_vec_point, rasterize_line, rasterize_rect};
