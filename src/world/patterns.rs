//! Bit-pattern table for materials and actions
//!
//! Every material and action name maps to a fixed-size 2D pattern. The
//! patterns render the Fovea and Action percepts, and decoding a network
//! output back into an action correlates it against each action pattern.

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array2, ArrayView2};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::actions::catalog::Action;
use crate::core::error::{FWorldError, Result};

/// Attempts at finding a pattern far enough from the existing ones
const MAX_PATTERN_TRIES: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Patterns {
    size: [usize; 2],
    table: BTreeMap<String, Array2<f32>>,
}

impl Patterns {
    pub fn new(size: [usize; 2]) -> Self {
        Self {
            size,
            table: BTreeMap::new(),
        }
    }

    /// Random permuted-binary patterns with `n_on` active bits each
    ///
    /// Each new pattern is redrawn until it differs from all earlier ones in
    /// at least `min_diff` bits, giving up after a bounded number of tries.
    pub fn generate<R: Rng + ?Sized>(
        names: &[&str],
        size: [usize; 2],
        n_on: usize,
        min_diff: usize,
        rng: &mut R,
    ) -> Self {
        let n = size[0] * size[1];
        let n_on = n_on.min(n);
        let mut base = vec![0.0f32; n];
        base[..n_on].iter_mut().for_each(|v| *v = 1.0);

        let mut pats = Self::new(size);
        let mut made: Vec<Vec<f32>> = Vec::with_capacity(names.len());
        for &name in names {
            let mut candidate = base.clone();
            for attempt in 0..MAX_PATTERN_TRIES {
                candidate.shuffle(rng);
                let far_enough = made.iter().all(|p| bit_diff(p, &candidate) >= min_diff);
                if far_enough {
                    break;
                }
                if attempt + 1 == MAX_PATTERN_TRIES {
                    tracing::warn!(name, min_diff, "could not reach minimum pattern difference");
                }
            }
            made.push(candidate.clone());
            // Shape always matches since the vec holds exactly rows * cols values
            if let Ok(arr) = Array2::from_shape_vec((size[0], size[1]), candidate) {
                pats.table.insert(name.to_string(), arr);
            }
        }
        pats
    }

    pub fn size(&self) -> [usize; 2] {
        self.size
    }

    pub fn get(&self, name: &str) -> Option<&Array2<f32>> {
        self.table.get(name)
    }

    pub fn insert(&mut self, name: &str, pat: Array2<f32>) -> Result<()> {
        if pat.dim() != (self.size[0], self.size[1]) {
            return Err(FWorldError::Config(format!(
                "pattern {name} has shape {:?}, expected {:?}",
                pat.dim(),
                self.size
            )));
        }
        self.table.insert(name.to_string(), pat);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Fail on the first name with no pattern
    pub fn require<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.table.contains_key(name) {
                return Err(FWorldError::MissingPattern(name.to_string()));
            }
        }
        Ok(())
    }

    /// Parse a JSON object of name -> rows of values
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<Vec<f32>>> = serde_json::from_str(json)?;
        let mut size: Option<[usize; 2]> = None;
        let mut table = BTreeMap::new();
        for (name, rows) in raw {
            let ny = rows.len();
            let nx = rows.first().map(|r| r.len()).unwrap_or(0);
            if rows.iter().any(|r| r.len() != nx) {
                return Err(FWorldError::Config(format!("pattern {name} has ragged rows")));
            }
            match size {
                None => size = Some([ny, nx]),
                Some(s) if s != [ny, nx] => {
                    return Err(FWorldError::Config(format!(
                        "pattern {name} is {ny}x{nx}, others are {}x{}",
                        s[0], s[1]
                    )));
                }
                Some(_) => {}
            }
            let flat: Vec<f32> = rows.into_iter().flatten().collect();
            let arr = Array2::from_shape_vec((ny, nx), flat)
                .map_err(|e| FWorldError::Config(format!("pattern {name}: {e}")))?;
            table.insert(name, arr);
        }
        Ok(Self {
            size: size.unwrap_or([0, 0]),
            table,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        let raw: BTreeMap<&str, Vec<Vec<f32>>> = self
            .table
            .iter()
            .map(|(name, arr)| {
                let rows = arr.outer_iter().map(|r| r.to_vec()).collect();
                (name.as_str(), rows)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Nearest action pattern by correlation, with Forward suppressed
    ///
    /// Forward wins only when its correlation exceeds `fwd_margin` times
    /// every rival's; otherwise the best non-Forward action is returned.
    pub fn decode_action(&self, activation: ArrayView2<f32>, fwd_margin: f32) -> Action {
        let act: Vec<f32> = activation.iter().copied().collect();
        let mut fwd: Option<f32> = None;
        let mut others: Vec<(Action, f32)> = Vec::with_capacity(Action::ALL.len());
        for action in Action::ALL {
            let Some(pat) = self.get(action.name()) else {
                continue;
            };
            let pv: Vec<f32> = pat.iter().copied().collect();
            let corr = correlation(&act, &pv);
            if action == Action::Forward {
                fwd = Some(corr);
            } else {
                others.push((action, corr));
            }
        }

        if let Some(f) = fwd {
            if others.iter().all(|&(_, c)| f > fwd_margin * c) {
                return Action::Forward;
            }
        }

        let mut best: Option<(Action, f32)> = None;
        for (action, corr) in others {
            match best {
                Some((_, b)) if b >= corr => {}
                _ => best = Some((action, corr)),
            }
        }
        best.map(|(a, _)| a).unwrap_or(Action::Forward)
    }
}

fn bit_diff(a: &[f32], b: &[f32]) -> usize {
    a.iter().zip(b).filter(|(x, y)| (**x > 0.5) != (**y > 0.5)).count()
}

/// Pearson correlation; 0 when either side has no variance
pub fn correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let ma = a[..n].iter().sum::<f32>() / n as f32;
    let mb = b[..n].iter().sum::<f32>() / n as f32;
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for i in 0..n {
        let da = a[i] - ma;
        let db = b[i] - mb;
        cov += da * db;
        va += da * da;
        vb += db * db;
    }
    let denom = (va * vb).sqrt();
    if denom <= f32::EPSILON {
        0.0
    } else {
        cov / denom
    }
}
