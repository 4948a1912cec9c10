//! Perception system - what the agent sees and touches
//!
//! Three passes run after every action: wide depth rays across the field of
//! view (only barriers stop them), foveal rays around the heading (any
//! non-empty material stops them), and one-cell proximal probes in four
//! directions.

use glam::Vec2;

use crate::core::config::VisionConfig;
use crate::core::types::{GridPos, MatIdx};
use crate::spatial::grid::WorldGrid;
use crate::spatial::ray::{ang_vec, next_vec_point};
use crate::world::materials::{MaterialPalette, EMPTY};

/// Proximal probe directions, in tensor order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxDir {
    Front = 0,
    Left = 1,
    Right = 2,
    Back = 3,
}

impl ProxDir {
    pub const ALL: [ProxDir; 4] = [ProxDir::Front, ProxDir::Left, ProxDir::Right, ProxDir::Back];

    /// Offset from the heading, in degrees
    pub fn rel_angle(self) -> i32 {
        match self {
            ProxDir::Front => 0,
            ProxDir::Left => 90,
            ProxDir::Right => -90,
            ProxDir::Back => 180,
        }
    }
}

/// Result of casting a single ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Offset from the heading, in degrees
    pub angle: i32,
    /// Euclidean distance to the hit, -1 when nothing was hit
    pub depth: f32,
    /// `ln(1 + depth) / ln(1 + diagonal)`, 1 when nothing was hit
    pub log_depth: f32,
    pub mat: MatIdx,
}

impl RayHit {
    pub fn miss(angle: i32) -> Self {
        Self {
            angle,
            depth: -1.0,
            log_depth: 1.0,
            mat: EMPTY,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.depth >= 0.0
    }
}

/// Everything sensed from one pose
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub depths: Vec<RayHit>,
    pub fovea: Vec<RayHit>,
    pub prox_mats: [MatIdx; 4],
    pub prox_pos: [GridPos; 4],
}

impl Scan {
    pub fn empty(n_fov_rays: usize, n_fovea_rays: usize) -> Self {
        Self {
            depths: vec![RayHit::miss(0); n_fov_rays],
            fovea: vec![RayHit::miss(0); n_fovea_rays],
            prox_mats: [EMPTY; 4],
            prox_pos: [GridPos::ZERO; 4],
        }
    }

    pub fn prox(&self, dir: ProxDir) -> MatIdx {
        self.prox_mats[dir as usize]
    }

    pub fn prox_pos(&self, dir: ProxDir) -> GridPos {
        self.prox_pos[dir as usize]
    }

    /// Foveal ray along the heading
    pub fn fovea_center(&self) -> Option<&RayHit> {
        self.fovea.iter().find(|r| r.angle == 0)
    }
}

/// Normalized log depth; misses read as maximally far
pub fn log_depth(depth: f32, diagonal: f32) -> f32 {
    if depth < 0.0 {
        1.0
    } else {
        (1.0 + depth).ln() / (1.0 + diagonal).ln()
    }
}

#[derive(Debug, Clone)]
pub struct Scanner {
    pub fov: i32,
    pub vis_ang_inc: i32,
    pub fovea_size: i32,
    pub fovea_ang_inc: i32,
}

impl Scanner {
    pub fn new(vision: &VisionConfig) -> Self {
        Self {
            fov: vision.fov,
            vis_ang_inc: vision.vis_ang_inc,
            fovea_size: vision.fovea_size,
            fovea_ang_inc: vision.fovea_ang_inc,
        }
    }

    /// Wide ray offsets from +fov/2 down to -fov/2
    pub fn wide_angles(&self) -> impl Iterator<Item = i32> {
        let half = self.fov / 2;
        let inc = self.vis_ang_inc;
        (0..=self.fov / inc).map(move |i| half - i * inc)
    }

    /// Foveal ray offsets from left to right
    pub fn fovea_angles(&self) -> impl Iterator<Item = i32> {
        let size = self.fovea_size;
        let inc = self.fovea_ang_inc;
        (0..=2 * size).map(move |i| (size - i) * inc)
    }

    /// Step from `origin` along `heading + angle` until `stops` accepts a cell
    ///
    /// Leaving the grid or exhausting the diagonal ends the ray as a miss.
    pub fn cast(
        grid: &WorldGrid,
        origin: Vec2,
        heading: i32,
        angle: i32,
        stops: impl Fn(MatIdx) -> bool,
    ) -> RayHit {
        let diagonal = grid.diagonal();
        let max_steps = diagonal.ceil() as usize + 1;
        let dir = ang_vec(heading + angle);
        let mut cur = origin;
        for _ in 0..max_steps {
            let (next, cell) = next_vec_point(cur, dir);
            let Some(mat) = grid.get(cell) else {
                break;
            };
            if stops(mat) {
                let depth = next.distance(origin);
                return RayHit {
                    angle,
                    depth,
                    log_depth: log_depth(depth, diagonal),
                    mat,
                };
            }
            cur = next;
        }
        RayHit::miss(angle)
    }

    pub fn scan_depth(&self, grid: &WorldGrid, palette: &MaterialPalette, pos: Vec2, heading: i32) -> Vec<RayHit> {
        self.wide_angles()
            .map(|a| Self::cast(grid, pos, heading, a, |m| palette.is_barrier(m)))
            .collect()
    }

    pub fn scan_fovea(&self, grid: &WorldGrid, pos: Vec2, heading: i32) -> Vec<RayHit> {
        self.fovea_angles()
            .map(|a| Self::cast(grid, pos, heading, a, |m| m != EMPTY))
            .collect()
    }

    /// One-cell probes; off-grid cells read as the last barrier material
    pub fn scan_proximal(
        grid: &WorldGrid,
        palette: &MaterialPalette,
        pos: Vec2,
        heading: i32,
    ) -> ([MatIdx; 4], [GridPos; 4]) {
        let mut mats = [EMPTY; 4];
        let mut cells = [GridPos::ZERO; 4];
        for dir in ProxDir::ALL {
            let (_, cell) = next_vec_point(pos, ang_vec(heading + dir.rel_angle()));
            mats[dir as usize] = grid.get(cell).unwrap_or(palette.barrier_idx());
            cells[dir as usize] = cell;
        }
        (mats, cells)
    }

    pub fn scan(&self, grid: &WorldGrid, palette: &MaterialPalette, pos: Vec2, heading: i32) -> Scan {
        let (prox_mats, prox_pos) = Self::scan_proximal(grid, palette, pos, heading);
        Scan {
            depths: self.scan_depth(grid, palette, pos, heading),
            fovea: self.scan_fovea(grid, pos, heading),
            prox_mats,
            prox_pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::WorldConfig;
    use crate::world::generation::bounding_wall;

    fn setup() -> (WorldGrid, MaterialPalette, Scanner) {
        let palette = MaterialPalette::from_config(&WorldConfig::default()).unwrap();
        let mut grid = WorldGrid::new(10, 10);
        bounding_wall(&mut grid, 1);
        (grid, palette, Scanner::new(&VisionConfig::default()))
    }

    #[test]
    fn test_angle_sets() {
        let (_, _, scanner) = setup();
        let wide: Vec<_> = scanner.wide_angles().collect();
        assert_eq!(wide.len(), 13);
        assert_eq!(wide.first(), Some(&90));
        assert_eq!(wide.last(), Some(&-90));
        let fovea: Vec<_> = scanner.fovea_angles().collect();
        assert_eq!(fovea, vec![5, 0, -5]);
    }

    #[test]
    fn test_depth_to_wall_ahead() {
        let (grid, palette, scanner) = setup();
        let depths = scanner.scan_depth(&grid, &palette, Vec2::new(2.0, 5.0), 0);
        let center = depths.iter().find(|r| r.angle == 0).unwrap();
        assert_eq!(center.mat, 1);
        assert!((center.depth - 7.0).abs() < 1e-4);
        assert!((center.log_depth - log_depth(7.0, grid.diagonal())).abs() < 1e-6);
    }

    #[test]
    fn test_wide_rays_pass_through_resources() {
        let (mut grid, palette, scanner) = setup();
        grid.set(GridPos::new(4, 5), 3);
        let depths = scanner.scan_depth(&grid, &palette, Vec2::new(2.0, 5.0), 0);
        let center = depths.iter().find(|r| r.angle == 0).unwrap();
        assert_eq!(center.mat, 1);
        let fovea = scanner.scan_fovea(&grid, Vec2::new(2.0, 5.0), 0);
        let center = fovea.iter().find(|r| r.angle == 0).unwrap();
        assert_eq!(center.mat, 3);
        assert!((center.depth - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_miss_without_walls() {
        let (_, palette, scanner) = setup();
        let grid = WorldGrid::new(10, 10);
        let depths = scanner.scan_depth(&grid, &palette, Vec2::new(5.0, 5.0), 0);
        assert!(depths.iter().all(|r| !r.is_hit() && r.log_depth == 1.0 && r.mat == EMPTY));
    }

    #[test]
    fn test_proximal_probes() {
        let (mut grid, palette, _) = setup();
        grid.set(GridPos::new(2, 1), 2);
        // at (1,1) facing north: front (1,2), left (0,1) wall, right (2,1) food, back (1,0) wall
        let (mats, cells) = Scanner::scan_proximal(&grid, &palette, Vec2::new(1.0, 1.0), 90);
        assert_eq!(cells[ProxDir::Front as usize], GridPos::new(1, 2));
        assert_eq!(mats[ProxDir::Front as usize], EMPTY);
        assert_eq!(mats[ProxDir::Left as usize], 1);
        assert_eq!(mats[ProxDir::Right as usize], 2);
        assert_eq!(mats[ProxDir::Back as usize], 1);
    }

    #[test]
    fn test_proximal_off_grid_reads_as_barrier() {
        let (_, palette, _) = setup();
        let grid = WorldGrid::new(3, 3);
        let (mats, _) = Scanner::scan_proximal(&grid, &palette, Vec2::new(0.0, 0.0), 180);
        assert!(palette.is_barrier(mats[ProxDir::Front as usize]));
    }
}
