//! Angle and ray-stepping geometry on the grid
//!
//! Direction vectors are normalized so that their dominant component is
//! exactly 1 (not to unit length). Each step then advances one cell along
//! the dominant axis, so a ray never skips a cell on near-axis headings.

use glam::Vec2;

use crate::core::types::{GridPos, MatIdx};
use crate::spatial::grid::WorldGrid;

/// Reduce an angle in degrees into [0, 360)
#[inline]
pub fn ang_mod(deg: i32) -> i32 {
    deg.rem_euclid(360)
}

/// Direction for a heading in degrees, dominant component = 1
pub fn ang_vec(deg: i32) -> Vec2 {
    let a = (ang_mod(deg) as f32).to_radians();
    norm_vec_line(Vec2::new(a.cos(), a.sin()))
}

/// Scale `v` so its largest absolute component is 1
pub fn norm_vec_line(v: Vec2) -> Vec2 {
    let av = v.abs();
    let m = av.x.max(av.y);
    if m == 0.0 {
        return Vec2::ZERO;
    }
    v / m
}

#[inline]
pub fn round_pos(v: Vec2) -> GridPos {
    GridPos::new(v.x.round() as i32, v.y.round() as i32)
}

/// Advance one step along `dir`, returning the float point and its cell
#[inline]
pub fn next_vec_point(pos: Vec2, dir: Vec2) -> (Vec2, GridPos) {
    let next = pos + dir;
    (next, round_pos(next))
}

/// Write `mat` into every cell from `from` to `to`, both ends included
pub fn rasterize_line(grid: &mut WorldGrid, from: GridPos, to: GridPos, mat: MatIdx) {
    grid.set(from, mat);
    let delta = (to - from).as_vec2();
    let steps = delta.x.abs().max(delta.y.abs()) as i32;
    if steps == 0 {
        return;
    }
    let dir = delta / steps as f32;
    let mut pos = from.as_vec2();
    for _ in 0..steps {
        let (next, cell) = next_vec_point(pos, dir);
        grid.set(cell, mat);
        pos = next;
    }
}

/// Fill the rectangle spanned by two corners, row by row
pub fn rasterize_rect(grid: &mut WorldGrid, a: GridPos, b: GridPos, mat: MatIdx) {
    let min = a.min(b);
    let max = a.max(b);
    for y in min.y..=max.y {
        rasterize_line(grid, GridPos::new(min.x, y), GridPos::new(max.x, y), mat);
    }
}
