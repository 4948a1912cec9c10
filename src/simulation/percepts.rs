//! Double-buffered percept tensors
//!
//! The action executor renders into `next`; `publish` copies every tensor
//! into `current` in one go at the tick boundary. Readers only ever see
//! `current`, so they observe the settled percept of the previous decision
//! while the following one is being rendered.

use std::collections::BTreeMap;

use ndarray::{ArrayD, IxDyn};

pub const DEPTH: &str = "Depth";
pub const FOV_DEPTH: &str = "FovDepth";
pub const FOVEA: &str = "Fovea";
pub const PROX_SOMA: &str = "ProxSoma";
pub const ANGLE: &str = "Angle";
pub const ACTION: &str = "Action";
pub const POS_US: &str = "PosUS";
pub const NEG_US: &str = "NegUS";

/// Negative US channels, in tensor order
pub const NEG_US_NAMES: [&str; 1] = ["Bump"];
pub const BUMP: usize = 0;

#[derive(Debug, Clone)]
pub struct PerceptBundle {
    current: BTreeMap<&'static str, ArrayD<f32>>,
    next: BTreeMap<&'static str, ArrayD<f32>>,
}

impl PerceptBundle {
    pub fn new(shapes: &[(&'static str, Vec<usize>)]) -> Self {
        let current: BTreeMap<_, _> = shapes
            .iter()
            .map(|(name, shape)| (*name, ArrayD::zeros(IxDyn(shape))))
            .collect();
        Self {
            next: current.clone(),
            current,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.current.keys().copied()
    }

    pub fn current(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.current.get(name)
    }

    pub fn next(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.next.get(name)
    }

    pub fn next_mut(&mut self, name: &str) -> Option<&mut ArrayD<f32>> {
        self.next.get_mut(name)
    }

    /// Make the rendered `next` tensors current
    pub fn publish(&mut self) {
        for (name, tensor) in &self.next {
            if let Some(cur) = self.current.get_mut(name) {
                cur.assign(tensor);
            }
        }
    }
}
