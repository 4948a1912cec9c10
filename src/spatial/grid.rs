//! Material grid for the world

use crate::core::types::{GridPos, MatIdx};

/// 2D grid of material indices, row-major, index 0 = Empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldGrid {
    pub width: i32,
    pub height: i32,
    cells: Vec<MatIdx>,
}

impl WorldGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![0; (width * height) as usize],
        }
    }

    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    #[inline]
    fn idx(&self, pos: GridPos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    #[inline]
    pub fn get(&self, pos: GridPos) -> Option<MatIdx> {
        if self.in_bounds(pos) {
            Some(self.cells[self.idx(pos)])
        } else {
            None
        }
    }

    /// Out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, pos: GridPos, mat: MatIdx) {
        if self.in_bounds(pos) {
            let i = self.idx(pos);
            self.cells[i] = mat;
        }
    }

    /// Reset every cell to Empty
    pub fn zero(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = 0);
    }

    pub fn row(&self, y: i32) -> &[MatIdx] {
        let start = (y * self.width) as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// Euclidean length of the grid diagonal
    pub fn diagonal(&self) -> f32 {
        ((self.width * self.width + self.height * self.height) as f32).sqrt()
    }

    pub fn count(&self, mat: MatIdx) -> usize {
        self.cells.iter().filter(|&&m| m == mat).count()
    }
}
