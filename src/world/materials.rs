//! Material palette with fixed semantic zones
//!
//! Layout: `[0]` Empty, `[1..=barrier_idx]` barriers, then other fixed
//! materials, then one active consumable per drive starting at `us_start`,
//! then the depleted `<Drive>Was` twin of each consumable exactly `n_drives`
//! slots later.

use ahash::AHashMap;
use serde::Serialize;

use crate::core::config::WorldConfig;
use crate::core::error::{FWorldError, Result};
use crate::core::types::MatIdx;

pub const EMPTY: MatIdx = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Material {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct MaterialPalette {
    mats: Vec<Material>,
    index: AHashMap<String, MatIdx>,
    barrier_idx: MatIdx,
    us_start: MatIdx,
    n_drives: usize,
}

fn default_color(name: &str) -> &'static str {
    match name {
        "Empty" => "black",
        "Wall" => "darkgrey",
        "Food" => "orange",
        "Water" => "blue",
        n if n.ends_with("Was") => "brown",
        _ => "grey",
    }
}

impl MaterialPalette {
    pub fn new(barriers: &[String], others: &[String], drives: &[String]) -> Result<Self> {
        if barriers.is_empty() || drives.is_empty() {
            return Err(FWorldError::Config(
                "palette needs at least one barrier and one drive".into(),
            ));
        }

        let mut names = vec!["Empty".to_string()];
        names.extend(barriers.iter().cloned());
        names.extend(others.iter().cloned());
        names.extend(drives.iter().cloned());
        names.extend(drives.iter().map(|d| format!("{d}Was")));

        let mut index = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(FWorldError::Config("material names must not be empty".into()));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(FWorldError::Config(format!("duplicate material name: {name}")));
            }
        }

        let mats = names
            .into_iter()
            .map(|name| Material {
                color: default_color(&name).to_string(),
                name,
            })
            .collect();

        Ok(Self {
            mats,
            index,
            barrier_idx: barriers.len(),
            us_start: 1 + barriers.len() + others.len(),
            n_drives: drives.len(),
        })
    }

    pub fn from_config(config: &WorldConfig) -> Result<Self> {
        Self::new(&config.barriers, &config.others, &config.drives)
    }

    pub fn len(&self) -> usize {
        self.mats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mats.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mats.iter().map(|m| m.name.as_str())
    }

    pub fn materials(&self) -> &[Material] {
        &self.mats
    }

    pub fn name(&self, mat: MatIdx) -> &str {
        self.mats.get(mat).map(|m| m.name.as_str()).unwrap_or("")
    }

    pub fn color(&self, mat: MatIdx) -> &str {
        self.mats.get(mat).map(|m| m.color.as_str()).unwrap_or("")
    }

    pub fn index_of(&self, name: &str) -> Option<MatIdx> {
        self.index.get(name).copied()
    }

    pub fn barrier_idx(&self) -> MatIdx {
        self.barrier_idx
    }

    pub fn us_start(&self) -> MatIdx {
        self.us_start
    }

    pub fn n_drives(&self) -> usize {
        self.n_drives
    }

    /// Impassable material (Empty is not a barrier)
    #[inline]
    pub fn is_barrier(&self, mat: MatIdx) -> bool {
        mat > EMPTY && mat <= self.barrier_idx
    }

    /// Drive index of an active consumable
    #[inline]
    pub fn drive_of(&self, mat: MatIdx) -> Option<usize> {
        (mat >= self.us_start && mat < self.us_start + self.n_drives).then(|| mat - self.us_start)
    }

    #[inline]
    pub fn is_consumable(&self, mat: MatIdx) -> bool {
        self.drive_of(mat).is_some()
    }

    #[inline]
    pub fn is_depleted(&self, mat: MatIdx) -> bool {
        let start = self.us_start + self.n_drives;
        mat >= start && mat < start + self.n_drives
    }

    /// Active consumable material for a drive
    #[inline]
    pub fn consumable(&self, drive: usize) -> MatIdx {
        self.us_start + drive
    }

    #[inline]
    pub fn depleted_of(&self, active: MatIdx) -> MatIdx {
        active + self.n_drives
    }

    pub fn drive_name(&self, drive: usize) -> &str {
        self.name(self.consumable(drive))
    }
}
