//! Headless instinct runs and their serializable summary

use std::time::{Duration, Instant};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::simulation::env::{Environment, FWorld};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: u64,
    pub seed: u64,
    pub steps: u64,
    pub elapsed_ms: u64,
    pub statistics: RunStats,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub consumed: u64,
    /// Consumptions per drive name
    pub consumed_by_drive: AHashMap<String, u64>,
    pub bumps: u64,
    pub total_effort: f32,
    pub mean_urgency: f32,
    /// Times each action was chosen
    pub actions: AHashMap<String, u64>,
    pub final_x: i32,
    pub final_y: i32,
    pub final_angle: i32,
    pub epochs: u64,
    pub episodes: u64,
}

impl RunSummary {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        format!(
            "Run {} (seed {}): {} steps in {}ms\n{} consumed, {} bumps, effort {:.1}",
            self.run,
            self.seed,
            self.steps,
            self.elapsed_ms,
            self.statistics.consumed,
            self.statistics.bumps,
            self.statistics.total_effort,
        )
    }
}

/// Drive `world` with its own instinct policy for `steps` decision ticks
///
/// The step after a consumption is reported to the policy as just gated.
/// A consumption closes the scene, so the driver never reports a scene as
/// already gated.
pub fn run_instinct(world: &mut FWorld, run: u64, steps: u64) -> RunSummary {
    let start = Instant::now();
    world.init(run);

    let mut stats = RunStats::default();
    let mut urgency_sum = 0.0f32;
    let mut just_gated = false;

    for _ in 0..steps {
        world.step();
        let (action, urgency) = world.instinct_action(just_gated, false);
        just_gated = false;
        urgency_sum += urgency;

        let consumed_before = world.resources().total_consumed();
        stats.total_effort += world.take_action(action);
        *stats.actions.entry(action.name().to_string()).or_insert(0) += 1;

        if world.neg_us().iter().any(|v| *v > 0.0) {
            stats.bumps += 1;
        }
        if world.resources().total_consumed() > consumed_before {
            stats.consumed += 1;
            if let Some(drive) = world.pos_us().iter().position(|v| *v > 0.0) {
                let name = world.palette().drive_name(drive).to_string();
                *stats.consumed_by_drive.entry(name).or_insert(0) += 1;
            }
            just_gated = true;
        }
    }

    stats.mean_urgency = if steps > 0 { urgency_sum / steps as f32 } else { 0.0 };
    stats.final_x = world.pos().x;
    stats.final_y = world.pos().y;
    stats.final_angle = world.angle();
    stats.epochs = world.counters().epoch.cur;
    stats.episodes = world.counters().episode.cur;

    let elapsed: Duration = start.elapsed();
    tracing::info!(run, steps, consumed = stats.consumed, bumps = stats.bumps, "run finished");

    RunSummary {
        run,
        seed: world.config().world.seed.wrapping_add(run),
        steps,
        elapsed_ms: elapsed.as_millis() as u64,
        statistics: stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FWorldConfig;

    #[test]
    fn test_run_counts_every_step() {
        let mut config = FWorldConfig::default();
        config.world.width = 16;
        config.world.height = 16;
        config.world.n_blocks = 2;
        config.world.n_per_drive = 4;
        let mut world = FWorld::new(config).unwrap();
        let summary = run_instinct(&mut world, 0, 50);
        assert_eq!(summary.steps, 50);
        assert_eq!(summary.statistics.actions.values().sum::<u64>(), 50);
        assert_eq!(world.counters().tick.cur, 50);
        assert!(summary.to_json().contains("\"consumed\""));
        assert!(summary.summary().starts_with("Run 0"));
    }
}
