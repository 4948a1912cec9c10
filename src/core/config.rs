//! Environment configuration with documented constants
//!
//! All tunable numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every section deserializes from
//! TOML with per-field defaults, so a config file only needs the values it
//! changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{FWorldError, Result};

/// Top-level configuration, supplied once at construction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FWorldConfig {
    pub world: WorldConfig,
    pub vision: VisionConfig,
    pub popcode: PopCodeConfig,
    pub instinct: InstinctConfig,
    pub effort: EffortConfig,
    pub counters: CountersConfig,
    pub patterns: PatternConfig,
}

/// Grid layout, materials and resource lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid columns
    pub width: i32,

    /// Grid rows
    pub height: i32,

    /// Impassable materials, in palette order after Empty
    pub barriers: Vec<String>,

    /// Fixed, passable materials that are neither barriers nor consumables
    pub others: Vec<String>,

    /// One consumable per drive; each gets a depleted `<Name>Was` twin
    pub drives: Vec<String>,

    /// Obstacle blocks placed by the generator
    pub n_blocks: usize,

    /// Smallest obstacle block side length
    pub block_min: i32,

    /// Largest obstacle block side length
    pub block_max: i32,

    /// Consumables of each drive placed by the generator
    pub n_per_drive: usize,

    /// Ticks before a consumed resource reappears
    pub env_refresh: u64,

    /// Base seed; `init(run)` reseeds with `seed + run`
    pub seed: u64,

    /// World snapshot restored at every `init`
    pub snapshot_path: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            barriers: vec!["Wall".into()],
            others: Vec::new(),
            drives: vec!["Food".into(), "Water".into()],
            n_blocks: 8,
            block_min: 2,
            block_max: 5,
            n_per_drive: 8,
            env_refresh: 100,
            seed: 42,
            snapshot_path: None,
        }
    }
}

/// Field of view and rotation geometry, all in degrees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Total wide field of view; must be a multiple of `vis_ang_inc`
    pub fov: i32,

    /// Angle between adjacent wide depth rays
    pub vis_ang_inc: i32,

    /// Foveal rays on each side of the center ray
    pub fovea_size: i32,

    /// Angle between adjacent foveal rays
    pub fovea_ang_inc: i32,

    /// Heading change for a single Left/Right action
    pub rot_inc: i32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            fov: 180,
            vis_ang_inc: 15,
            fovea_size: 1,
            fovea_ang_inc: 5,
            rot_inc: 15,
        }
    }
}

impl VisionConfig {
    /// Number of wide depth rays, both FOV edges included
    pub fn n_fov_rays(&self) -> usize {
        (self.fov / self.vis_ang_inc) as usize + 1
    }

    /// Number of foveal rays, center included
    pub fn n_fovea_rays(&self) -> usize {
        (2 * self.fovea_size + 1) as usize
    }
}

/// Population code parameters for depth and heading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopCodeConfig {
    /// Units per population code
    pub pop_size: usize,

    /// Preferred value of the first depth unit
    ///
    /// Below 0 so that log depth 0 (touching) is still a full bump.
    pub depth_min: f32,

    /// Preferred value of the last depth unit
    pub depth_max: f32,

    /// Tuning width as a fraction of the depth range
    pub depth_sigma: f32,

    /// Tuning width of the heading ring code, as a fraction of a full turn
    pub angle_sigma: f32,
}

impl Default for PopCodeConfig {
    fn default() -> Self {
        Self {
            pop_size: 12,
            depth_min: -0.2,
            depth_max: 1.2,
            depth_sigma: 0.1,
            angle_sigma: 0.1,
        }
    }
}

/// Instinct policy thresholds, probabilities and urgencies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstinctConfig {
    /// Urgency when facing a barrier
    pub wall_urgency: f32,

    /// Urgency when facing an active consumable
    pub eat_urgency: f32,

    /// Urgency when a resource or obstacle is close
    pub close_urgency: f32,

    /// Foveal distance (cells) beyond which a resource is "far"
    pub far_depth: f32,

    /// Central foveal distance (cells) below which an obstacle is "near"
    pub near_depth: f32,

    /// Chance to turn instead of advancing toward a far resource
    pub explore_turn_prob: f32,

    /// Default case: chance to repeat the last movement
    pub repeat_prob: f32,

    /// Default case: chance to make a random turn
    pub turn_prob: f32,

    /// Softmax gain for left/right turn choice
    pub turn_gain: f32,

    /// Side-closeness difference below which averages replace minima
    ///
    /// Tunable, no derivation behind 0.1.
    pub tie_threshold: f32,

    /// Forward must beat every rival correlation by this factor when
    /// decoding a network output into an action
    pub fwd_margin: f32,
}

impl Default for InstinctConfig {
    fn default() -> Self {
        Self {
            wall_urgency: 0.5,
            eat_urgency: 0.5,
            close_urgency: 0.2,
            far_depth: 8.0,
            near_depth: 2.5,
            explore_turn_prob: 0.2,
            repeat_prob: 0.6,
            turn_prob: 0.2,
            turn_gain: 5.0,
            tie_threshold: 0.1,
            fwd_margin: 2.0,
        }
    }
}

/// Effort costs and negative US magnitudes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffortConfig {
    pub rot_effort: f32,
    pub move_effort: f32,

    /// Negative US magnitude delivered on a bump
    pub bump_pain: f32,
}

impl Default for EffortConfig {
    fn default() -> Self {
        Self {
            rot_effort: 0.5,
            move_effort: 1.0,
            bump_pain: 0.5,
        }
    }
}

/// Counter wrap limits; 0 disables wrapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountersConfig {
    pub trials_per_epoch: usize,
    pub scenes_per_episode: usize,
}

impl Default for CountersConfig {
    fn default() -> Self {
        Self {
            trials_per_epoch: 100,
            scenes_per_episode: 0,
        }
    }
}

/// Bit-pattern table layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Rows, columns of every pattern
    pub size: [usize; 2],

    /// Active bits per generated pattern
    pub n_on: usize,

    /// Minimum differing bits between generated patterns
    pub min_diff: usize,

    /// JSON pattern file; generated from the seed when absent
    pub path: Option<PathBuf>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            size: [5, 5],
            n_on: 6,
            min_diff: 4,
            path: None,
        }
    }
}

impl FWorldConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FWorldConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let w = &self.world;
        if w.width < 3 || w.height < 3 {
            return Err(FWorldError::Config(format!(
                "grid must be at least 3x3 to hold a bounding wall, got {}x{}",
                w.width, w.height
            )));
        }
        if w.barriers.is_empty() {
            return Err(FWorldError::Config("at least one barrier material is required".into()));
        }
        if w.drives.is_empty() {
            return Err(FWorldError::Config("at least one drive is required".into()));
        }
        if w.block_min < 1 || w.block_max < w.block_min {
            return Err(FWorldError::Config(format!(
                "block size range [{}, {}] is invalid",
                w.block_min, w.block_max
            )));
        }

        let v = &self.vision;
        if v.vis_ang_inc <= 0 || v.fovea_ang_inc <= 0 || v.rot_inc <= 0 {
            return Err(FWorldError::Config("angle increments must be positive".into()));
        }
        if v.fov <= 0 || v.fov > 360 || v.fov % (2 * v.vis_ang_inc) != 0 {
            return Err(FWorldError::Config(format!(
                "fov ({}) must be in (0, 360] and an even multiple of vis_ang_inc ({})",
                v.fov, v.vis_ang_inc
            )));
        }
        if 360 % v.rot_inc != 0 {
            return Err(FWorldError::Config(format!(
                "rot_inc ({}) must divide 360",
                v.rot_inc
            )));
        }
        if v.fovea_size < 0 {
            return Err(FWorldError::Config("fovea_size must not be negative".into()));
        }

        let p = &self.popcode;
        if p.pop_size < 2 {
            return Err(FWorldError::Config("pop_size must be at least 2".into()));
        }
        if p.depth_max <= p.depth_min || p.depth_sigma <= 0.0 || p.angle_sigma <= 0.0 {
            return Err(FWorldError::Config("population code range and widths must be positive".into()));
        }

        let i = &self.instinct;
        let probs = [i.explore_turn_prob, i.repeat_prob, i.turn_prob];
        if probs.iter().any(|p| !(0.0..=1.0).contains(p)) || i.repeat_prob + i.turn_prob > 1.0 {
            return Err(FWorldError::Config("instinct probabilities must lie in [0, 1] and repeat + turn <= 1".into()));
        }
        if i.near_depth <= 0.0 || i.far_depth <= 0.0 {
            return Err(FWorldError::Config("instinct depth thresholds must be positive".into()));
        }

        let pt = &self.patterns;
        let cells = pt.size[0] * pt.size[1];
        if cells == 0 || pt.n_on == 0 || pt.n_on > cells {
            return Err(FWorldError::Config(format!(
                "pattern size {:?} cannot hold {} active bits",
                pt.size, pt.n_on
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FWorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ray_counts() {
        let v = VisionConfig::default();
        assert_eq!(v.n_fov_rays(), 13);
        assert_eq!(v.n_fovea_rays(), 3);
    }

    #[test]
    fn test_zero_sized_grid_rejected() {
        let mut config = FWorldConfig::default();
        config.world.width = 0;
        assert!(matches!(config.validate(), Err(FWorldError::Config(_))));
    }

    #[test]
    fn test_fov_must_split_evenly() {
        let mut config = FWorldConfig::default();
        config.vision.fov = 100;
        config.vision.vis_ang_inc = 15;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FWorldConfig::from_toml_str(
            r#"
            [world]
            width = 10
            height = 12
            env_refresh = 5

            [instinct]
            fwd_margin = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.world.width, 10);
        assert_eq!(config.world.height, 12);
        assert_eq!(config.world.env_refresh, 5);
        assert_eq!(config.world.drives, vec!["Food".to_string(), "Water".to_string()]);
        assert_eq!(config.instinct.fwd_margin, 1.5);
        assert_eq!(config.vision.fov, 180);
    }

    #[test]
    fn test_invalid_toml_reports_parse_error() {
        let result = FWorldConfig::from_toml_str("[world]\nwidth = \"wide\"");
        assert!(matches!(result, Err(FWorldError::Toml(_))));
    }
}
