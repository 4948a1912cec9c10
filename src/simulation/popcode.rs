//! Population codes: scalars as activity over Gaussian tuning curves
//!
//! Unit `i` prefers a value spread evenly across `[min, max]`; its activity
//! is `exp(-(d / (sigma * range))^2)` for distance `d` to the encoded value.
//! Nearby values yield overlapping patterns, which is what the downstream
//! network learns to predict.

use crate::core::config::PopCodeConfig;

/// Linear population code over `[min, max]`
#[derive(Debug, Clone, PartialEq)]
pub struct PopCode1D {
    pub min: f32,
    pub max: f32,
    /// Tuning width as a fraction of `max - min`
    pub sigma: f32,
    /// Clamp encoded values into range
    pub clip: bool,
    /// Activities below this are ignored when decoding
    pub thr: f32,
    /// Floor on the decode denominator
    pub min_sum: f32,
}

impl PopCode1D {
    pub fn new(min: f32, max: f32, sigma: f32) -> Self {
        Self {
            min,
            max,
            sigma,
            clip: true,
            thr: 0.1,
            min_sum: 0.2,
        }
    }

    pub fn depth(config: &PopCodeConfig) -> Self {
        Self::new(config.depth_min, config.depth_max, config.depth_sigma)
    }

    fn pref(&self, i: usize, n: usize) -> f32 {
        let incr = (self.max - self.min) / (n.max(2) - 1) as f32;
        self.min + incr * i as f32
    }

    /// Write the code for `val` into `out`, one unit per slot
    pub fn encode_into(&self, out: &mut [f32], val: f32) {
        let n = out.len();
        let val = if self.clip { val.clamp(self.min, self.max) } else { val };
        let sr = self.sigma * (self.max - self.min);
        for (i, slot) in out.iter_mut().enumerate() {
            let dist = (self.pref(i, n) - val) / sr;
            *slot = (-(dist * dist)).exp();
        }
    }

    pub fn encode(&self, val: f32, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n];
        self.encode_into(&mut out, val);
        out
    }

    /// Activity-weighted mean of preferred values
    pub fn decode(&self, pat: &[f32]) -> f32 {
        let n = pat.len();
        let mut avg = 0.0;
        let mut sum = 0.0;
        for (i, &act) in pat.iter().enumerate() {
            let act = if act < self.thr { 0.0 } else { act };
            avg += self.pref(i, n) * act;
            sum += act;
        }
        avg / sum.max(self.min_sum)
    }
}

/// Circular population code; `max` wraps around to `min`
#[derive(Debug, Clone, PartialEq)]
pub struct PopCodeRing {
    pub min: f32,
    pub max: f32,
    pub sigma: f32,
    pub thr: f32,
}

impl PopCodeRing {
    pub fn new(min: f32, max: f32, sigma: f32) -> Self {
        Self {
            min,
            max,
            sigma,
            thr: 0.1,
        }
    }

    /// Heading code over one full turn, fed `angle / 360`
    pub fn heading(config: &PopCodeConfig) -> Self {
        Self::new(0.0, 1.0, config.angle_sigma)
    }

    fn pref(&self, i: usize, n: usize) -> f32 {
        self.min + (self.max - self.min) * i as f32 / n.max(1) as f32
    }

    pub fn encode_into(&self, out: &mut [f32], val: f32) {
        let n = out.len();
        let range = self.max - self.min;
        let val = self.min + (val - self.min).rem_euclid(range);
        let sr = self.sigma * range;
        for (i, slot) in out.iter_mut().enumerate() {
            let raw = (self.pref(i, n) - val).abs();
            let dist = raw.min(range - raw) / sr;
            *slot = (-(dist * dist)).exp();
        }
    }

    pub fn encode(&self, val: f32, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n];
        self.encode_into(&mut out, val);
        out
    }

    /// Circular mean of preferred values
    pub fn decode(&self, pat: &[f32]) -> f32 {
        let n = pat.len();
        let range = self.max - self.min;
        let (mut sx, mut sy) = (0.0f32, 0.0f32);
        for (i, &act) in pat.iter().enumerate() {
            if act < self.thr {
                continue;
            }
            let theta = std::f32::consts::TAU * (self.pref(i, n) - self.min) / range;
            sx += act * theta.cos();
            sy += act * theta.sin();
        }
        let theta = sy.atan2(sx).rem_euclid(std::f32::consts::TAU);
        self.min + range * theta / std::f32::consts::TAU
    }
}
