//! Action definitions and catalog

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::EffortConfig;
use crate::core::error::FWorldError;

/// Discrete agent action
///
/// `Noop` is named "None" in pattern files and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Forward,
    Left,
    Right,
    Backward,
    Consume,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Rotation,
    Movement,
    Consumption,
    Idle,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Forward,
        Action::Left,
        Action::Right,
        Action::Backward,
        Action::Consume,
        Action::Noop,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Forward => "Forward",
            Action::Left => "Left",
            Action::Right => "Right",
            Action::Backward => "Backward",
            Action::Consume => "Consume",
            Action::Noop => "None",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    pub fn category(self) -> ActionCategory {
        match self {
            Action::Left | Action::Right => ActionCategory::Rotation,
            Action::Forward | Action::Backward => ActionCategory::Movement,
            Action::Consume => ActionCategory::Consumption,
            Action::Noop => ActionCategory::Idle,
        }
    }

    pub fn is_turn(self) -> bool {
        self.category() == ActionCategory::Rotation
    }

    pub fn is_move(self) -> bool {
        self.category() == ActionCategory::Movement
    }

    /// Effort spent performing the action, bump or not
    pub fn effort(self, costs: &EffortConfig) -> f32 {
        match self.category() {
            ActionCategory::Rotation => costs.rot_effort,
            ActionCategory::Movement => costs.move_effort,
            ActionCategory::Consumption | ActionCategory::Idle => 0.0,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = FWorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| FWorldError::UnknownAction(s.to_string()))
    }
}
