//! Core type definitions used throughout the codebase

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Environment tick counter (finest simulation time unit)
pub type Tick = u64;

/// Index into the material palette
pub type MatIdx = usize;

/// Integer grid cell position (x = column, y = row)
pub type GridPos = IVec2;

/// Timescales tracked by the environment counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeScale {
    Run,
    Epoch,
    Trial,
    Tick,
    Event,
    Scene,
    Episode,
}

impl TimeScale {
    pub const ALL: [TimeScale; 7] = [
        TimeScale::Run,
        TimeScale::Epoch,
        TimeScale::Trial,
        TimeScale::Tick,
        TimeScale::Event,
        TimeScale::Scene,
        TimeScale::Episode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TimeScale::Run => "Run",
            TimeScale::Epoch => "Epoch",
            TimeScale::Trial => "Trial",
            TimeScale::Tick => "Tick",
            TimeScale::Event => "Event",
            TimeScale::Scene => "Scene",
            TimeScale::Episode => "Episode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timescale_names_unique() {
        let mut names: Vec<_> = TimeScale::ALL.iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TimeScale::ALL.len());
    }
}
