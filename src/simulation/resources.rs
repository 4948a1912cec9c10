//! Consumed resources and their delayed reappearance

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::Serialize;

use crate::actions::catalog::Action;
use crate::core::types::{GridPos, MatIdx, Tick};
use crate::spatial::grid::WorldGrid;

/// One consumption, recorded when it happens
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceEvent {
    pub tick: Tick,
    /// Agent cell and heading at the time
    pub pos: GridPos,
    pub angle: i32,
    pub action: Action,
    /// Active material that was consumed
    pub mat: MatIdx,
    pub mat_pos: GridPos,
}

/// Pending restorations plus the full consumption history
///
/// Pending events are keyed by the consumed cell, which can only be
/// depleted once at a time. The sweep order over them is unspecified.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    pending: AHashMap<GridPos, ResourceEvent>,
    history: BTreeMap<Tick, Vec<ResourceEvent>>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: ResourceEvent) {
        self.history.entry(event.tick).or_default().push(event.clone());
        self.pending.insert(event.mat_pos, event);
    }

    /// Restore every pending cell consumed at least `delay` ticks before `now`
    pub fn refresh(&mut self, grid: &mut WorldGrid, now: Tick, delay: Tick) -> Vec<ResourceEvent> {
        let mut restored = Vec::new();
        self.pending.retain(|_, event| {
            if now.saturating_sub(event.tick) >= delay {
                grid.set(event.mat_pos, event.mat);
                restored.push(event.clone());
                false
            } else {
                true
            }
        });
        restored
    }

    pub fn pending(&self) -> impl Iterator<Item = &ResourceEvent> {
        self.pending.values()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, cell: GridPos) -> bool {
        self.pending.contains_key(&cell)
    }

    pub fn history(&self) -> &BTreeMap<Tick, Vec<ResourceEvent>> {
        &self.history
    }

    pub fn total_consumed(&self) -> usize {
        self.history.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tick: Tick, x: i32) -> ResourceEvent {
        ResourceEvent {
            tick,
            pos: GridPos::new(x - 1, 1),
            angle: 0,
            action: Action::Consume,
            mat: 2,
            mat_pos: GridPos::new(x, 1),
        }
    }

    #[test]
    fn test_refresh_respects_delay() {
        let mut grid = WorldGrid::new(6, 3);
        grid.set(GridPos::new(2, 1), 4);
        let mut ledger = ResourceLedger::new();
        ledger.record(event(10, 2));

        assert!(ledger.refresh(&mut grid, 14, 5).is_empty());
        assert_eq!(grid.get(GridPos::new(2, 1)), Some(4));

        let restored = ledger.refresh(&mut grid, 15, 5);
        assert_eq!(restored.len(), 1);
        assert_eq!(grid.get(GridPos::new(2, 1)), Some(2));
        assert_eq!(ledger.pending_count(), 0);
        assert_eq!(ledger.total_consumed(), 1);
    }

    #[test]
    fn test_independent_restores_in_one_sweep() {
        let mut grid = WorldGrid::new(6, 3);
        let mut ledger = ResourceLedger::new();
        ledger.record(event(1, 2));
        ledger.record(event(3, 4));
        ledger.record(event(9, 5));

        let restored = ledger.refresh(&mut grid, 8, 5);
        assert_eq!(restored.len(), 2);
        assert_eq!(grid.count(2), 2);
        assert!(ledger.is_pending(GridPos::new(5, 1)));
        assert_eq!(ledger.history().len(), 3);
    }

    #[test]
    fn test_same_tick_events_kept_in_history() {
        let mut ledger = ResourceLedger::new();
        ledger.record(event(4, 2));
        ledger.record(event(4, 3));
        assert_eq!(ledger.history()[&4].len(), 2);
        assert_eq!(ledger.pending_count(), 2);
    }
}
