//! Seeded random world construction
//!
//! A world is a bounding wall, a handful of filled obstacle blocks, and
//! consumables of every drive scattered over empty cells.

use rand::Rng;

use crate::core::config::WorldConfig;
use crate::core::types::{GridPos, MatIdx};
use crate::spatial::grid::WorldGrid;
use crate::spatial::ray::{rasterize_line, rasterize_rect};
use crate::world::materials::{MaterialPalette, EMPTY};

/// Random draws before giving up on finding an empty cell
const MAX_PLACEMENT_TRIES: usize = 1000;

/// Wall off the outermost ring of cells
pub fn bounding_wall(grid: &mut WorldGrid, wall: MatIdx) {
    let (mx, my) = (grid.width - 1, grid.height - 1);
    rasterize_line(grid, GridPos::new(0, 0), GridPos::new(mx, 0), wall);
    rasterize_line(grid, GridPos::new(0, my), GridPos::new(mx, my), wall);
    rasterize_line(grid, GridPos::new(0, 0), GridPos::new(0, my), wall);
    rasterize_line(grid, GridPos::new(mx, 0), GridPos::new(mx, my), wall);
}

/// Uniformly random empty cell, if one turns up
pub fn random_empty_cell<R: Rng + ?Sized>(grid: &WorldGrid, rng: &mut R) -> Option<GridPos> {
    (0..MAX_PLACEMENT_TRIES).find_map(|_| {
        let pos = GridPos::new(rng.gen_range(0..grid.width), rng.gen_range(0..grid.height));
        (grid.get(pos) == Some(EMPTY)).then_some(pos)
    })
}

pub fn generate_world<R: Rng + ?Sized>(
    grid: &mut WorldGrid,
    palette: &MaterialPalette,
    config: &WorldConfig,
    rng: &mut R,
) {
    grid.zero();
    bounding_wall(grid, 1);

    // Blocks stay strictly inside the bounding wall
    let inner_w = grid.width - 2;
    let inner_h = grid.height - 2;
    let mut blocks = 0;
    for _ in 0..config.n_blocks {
        let bw = rng.gen_range(config.block_min..=config.block_max);
        let bh = rng.gen_range(config.block_min..=config.block_max);
        if bw > inner_w || bh > inner_h {
            continue;
        }
        let x = rng.gen_range(1..=inner_w - bw + 1);
        let y = rng.gen_range(1..=inner_h - bh + 1);
        let mat = rng.gen_range(1..=palette.barrier_idx());
        rasterize_rect(grid, GridPos::new(x, y), GridPos::new(x + bw - 1, y + bh - 1), mat);
        blocks += 1;
    }

    let mut placed = 0;
    for drive in 0..palette.n_drives() {
        let mat = palette.consumable(drive);
        for _ in 0..config.n_per_drive {
            match random_empty_cell(grid, rng) {
                Some(pos) => {
                    grid.set(pos, mat);
                    placed += 1;
                }
                None => {
                    tracing::warn!(drive = palette.drive_name(drive), "no empty cell left for resource");
                    break;
                }
            }
        }
    }

    tracing::info!(
        width = grid.width,
        height = grid.height,
        blocks,
        resources = placed,
        "generated world"
    );
}
