//! Instinct policy - reflexive action choice used as a teaching signal
//!
//! Rules are checked in priority order and the first that applies wins:
//! 1. Facing a barrier: keep turning, or pick a side
//! 2. Facing an active consumable: consume
//! 3. Already gated this scene: go forward
//! 4. Resource in the fovea: explore toward it or approach it
//! 5. Barrier close ahead in the fovea: turn away
//! 6. Otherwise wander

use rand::Rng;

use crate::actions::catalog::Action;
use crate::core::config::InstinctConfig;
use crate::simulation::perception::{ProxDir, RayHit, Scan};
use crate::world::materials::MaterialPalette;

/// Which rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstinctReason {
    AtBarrier,
    AtConsumable,
    Gated,
    Explore,
    Approach,
    NearObstacle,
    Wander,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub urgency: f32,
    /// Set when the decision opens the gate (consumption)
    pub should_gate: bool,
    pub reason: InstinctReason,
}

impl Decision {
    fn new(action: Action, urgency: f32, reason: InstinctReason) -> Self {
        Self {
            action,
            urgency,
            should_gate: false,
            reason,
        }
    }
}

/// Everything the policy reads about the agent
pub struct InstinctContext<'a> {
    pub scan: &'a Scan,
    pub palette: &'a MaterialPalette,
    pub last_action: Action,
    pub has_gated: bool,
    pub fovea_ang_inc: i32,
}

#[derive(Debug, Clone)]
pub struct InstinctPolicy {
    pub config: InstinctConfig,
}

impl InstinctPolicy {
    pub fn new(config: InstinctConfig) -> Self {
        Self { config }
    }

    pub fn decide<R: Rng + ?Sized>(&self, ctx: &InstinctContext, rng: &mut R) -> Decision {
        let cfg = &self.config;
        let front = ctx.scan.prox(ProxDir::Front);

        if ctx.palette.is_barrier(front) {
            let action = self.keep_turning(ctx, rng);
            return Decision::new(action, cfg.wall_urgency, InstinctReason::AtBarrier);
        }

        if ctx.palette.is_consumable(front) {
            return Decision {
                should_gate: true,
                ..Decision::new(Action::Consume, cfg.eat_urgency, InstinctReason::AtConsumable)
            };
        }

        if ctx.has_gated {
            return Decision::new(Action::Forward, 0.0, InstinctReason::Gated);
        }

        if let Some(decision) = self.seek_resource(ctx, rng) {
            return decision;
        }

        if let Some(center) = ctx.scan.fovea_center() {
            if center.is_hit() && ctx.palette.is_barrier(center.mat) && center.depth < cfg.near_depth {
                let action = self.keep_turning(ctx, rng);
                return Decision::new(action, cfg.close_urgency, InstinctReason::NearObstacle);
            }
        }

        Decision::new(self.wander(ctx.last_action, rng), 0.0, InstinctReason::Wander)
    }

    fn keep_turning<R: Rng + ?Sized>(&self, ctx: &InstinctContext, rng: &mut R) -> Action {
        if ctx.last_action.is_turn() {
            ctx.last_action
        } else {
            self.choose_turn(&ctx.scan.depths, rng)
        }
    }

    /// Rule 4: the drive with the most foveal evidence decides
    fn seek_resource<R: Rng + ?Sized>(&self, ctx: &InstinctContext, rng: &mut R) -> Option<Decision> {
        let cfg = &self.config;
        let n_drives = ctx.palette.n_drives();
        let mut weights = vec![0.0f32; n_drives];
        for ray in &ctx.scan.fovea {
            if let Some(drive) = ctx.palette.drive_of(ray.mat) {
                weights[drive] += 1.0 - ray.log_depth;
            }
        }

        let mut best: Option<(usize, f32)> = None;
        for (drive, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            match best {
                Some((_, b)) if b >= w => {}
                _ => best = Some((drive, w)),
            }
        }
        let (drive, _) = best?;

        let rays: Vec<&RayHit> = ctx
            .scan
            .fovea
            .iter()
            .filter(|r| ctx.palette.drive_of(r.mat) == Some(drive))
            .collect();
        let nearest = rays.iter().map(|r| r.depth).fold(f32::INFINITY, f32::min);

        if nearest > cfg.far_depth {
            let action = if rng.gen::<f32>() < cfg.explore_turn_prob {
                random_turn(rng)
            } else {
                Action::Forward
            };
            return Some(Decision::new(action, 0.0, InstinctReason::Explore));
        }

        let centroid = rays.iter().map(|r| r.angle as f32).sum::<f32>() / rays.len() as f32;
        let half_step = ctx.fovea_ang_inc as f32 / 2.0;
        let action = if centroid.abs() <= half_step {
            Action::Forward
        } else if centroid > 0.0 {
            Action::Left
        } else {
            Action::Right
        };
        Some(Decision::new(action, cfg.close_urgency, InstinctReason::Approach))
    }

    fn wander<R: Rng + ?Sized>(&self, last_action: Action, rng: &mut R) -> Action {
        let cfg = &self.config;
        let r = rng.gen::<f32>();
        if r < cfg.repeat_prob {
            if last_action.is_move() {
                last_action
            } else {
                Action::Forward
            }
        } else if r < cfg.repeat_prob + cfg.turn_prob {
            random_turn(rng)
        } else {
            Action::Forward
        }
    }

    /// Softmax over the two sides of the wide scan; the more open side is
    /// exponentially more likely
    pub fn choose_turn<R: Rng + ?Sized>(&self, depths: &[RayHit], rng: &mut R) -> Action {
        let (left, right) = side_depths(depths, self.config.tie_threshold);
        let p_left = 1.0 / (1.0 + (self.config.turn_gain * (right - left)).exp());
        if rng.gen::<f32>() < p_left {
            Action::Left
        } else {
            Action::Right
        }
    }
}

fn random_turn<R: Rng + ?Sized>(rng: &mut R) -> Action {
    if rng.gen_bool(0.5) {
        Action::Left
    } else {
        Action::Right
    }
}

/// Log depth summarizing each side: the minimum, or the mean when the
/// minima are within `tie` of each other
fn side_depths(depths: &[RayHit], tie: f32) -> (f32, f32) {
    let left: Vec<f32> = depths.iter().filter(|r| r.angle > 0).map(|r| r.log_depth).collect();
    let right: Vec<f32> = depths.iter().filter(|r| r.angle < 0).map(|r| r.log_depth).collect();
    let min = |v: &[f32]| v.iter().copied().fold(1.0f32, f32::min);
    let mean = |v: &[f32]| {
        if v.is_empty() {
            1.0
        } else {
            v.iter().sum::<f32>() / v.len() as f32
        }
    };
    let (l, r) = (min(&left), min(&right));
    if (l - r).abs() < tie {
        (mean(&left), mean(&right))
    } else {
        (l, r)
    }
}
