//! World snapshot persistence
//!
//! Text format: one line per grid row, one tab-terminated field per cell.
//! An empty field is Empty; anything else must be an exact material name.

use std::path::Path;

use crate::core::error::Result;
use crate::core::types::GridPos;
use crate::spatial::grid::WorldGrid;
use crate::world::materials::{MaterialPalette, EMPTY};

/// Render the grid as snapshot text
pub fn write_text(grid: &WorldGrid, palette: &MaterialPalette) -> String {
    let mut out = String::with_capacity((grid.width * grid.height * 6) as usize);
    for y in 0..grid.height {
        for &mat in grid.row(y) {
            if mat != EMPTY {
                out.push_str(palette.name(mat));
            }
            out.push('\t');
        }
        out.push('\n');
    }
    out
}

/// Fill a zeroed grid from snapshot text
///
/// Unknown names and fields outside the grid are logged and skipped.
/// Missing rows or columns stay Empty.
pub fn read_text(grid: &mut WorldGrid, palette: &MaterialPalette, content: &str) {
    grid.zero();
    let mut rows = 0;
    for (y, line) in content.lines().enumerate() {
        rows = y + 1;
        if y as i32 >= grid.height {
            if !line.trim().is_empty() {
                tracing::warn!(row = y, "snapshot has more rows than the grid, ignoring");
            }
            continue;
        }
        for (x, field) in line.split('\t').enumerate() {
            if field.is_empty() {
                continue;
            }
            if x as i32 >= grid.width {
                tracing::warn!(row = y, col = x, "snapshot field beyond grid width, ignoring");
                continue;
            }
            match palette.index_of(field) {
                Some(mat) => grid.set(GridPos::new(x as i32, y as i32), mat),
                None => {
                    tracing::warn!(row = y, col = x, name = field, "unknown material in snapshot");
                }
            }
        }
    }
    if (rows as i32) < grid.height {
        tracing::debug!(rows, expected = grid.height, "short snapshot, remaining rows left empty");
    }
}

pub fn save_text(grid: &WorldGrid, palette: &MaterialPalette, path: &Path) -> Result<()> {
    std::fs::write(path, write_text(grid, palette))?;
    Ok(())
}

pub fn load_text(grid: &mut WorldGrid, palette: &MaterialPalette, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    read_text(grid, palette, &content);
    Ok(())
}
