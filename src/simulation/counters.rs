//! Hierarchical run/epoch/trial counters plus tick, event, scene, episode

use serde::Serialize;

use crate::core::config::CountersConfig;
use crate::core::types::{Tick, TimeScale};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub cur: Tick,
    pub prv: Tick,
    /// Changed on the last update
    pub chg: bool,
    /// Wraps back to 0 on reaching this; 0 never wraps
    pub max: Tick,
}

impl Counter {
    pub fn new(max: Tick) -> Self {
        Self {
            max,
            ..Self::default()
        }
    }

    pub fn init(&mut self) {
        self.cur = 0;
        self.prv = 0;
        self.chg = false;
    }

    /// Mark unchanged for this step
    pub fn same(&mut self) {
        self.chg = false;
    }

    /// Advance by one; true when the counter wrapped
    pub fn incr(&mut self) -> bool {
        self.prv = self.cur;
        self.cur += 1;
        self.chg = true;
        if self.max > 0 && self.cur >= self.max {
            self.cur = 0;
            return true;
        }
        false
    }

    /// Set to `val`; true when that is a change
    pub fn set(&mut self, val: Tick) -> bool {
        if self.cur == val {
            self.chg = false;
            return false;
        }
        self.prv = self.cur;
        self.cur = val;
        self.chg = true;
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Counters {
    pub run: Counter,
    pub epoch: Counter,
    pub trial: Counter,
    /// Monotonic within a run; drives resource refresh
    pub tick: Counter,
    /// Ticks since the last consumption
    pub event: Counter,
    pub scene: Counter,
    pub episode: Counter,
}

impl Counters {
    pub fn new(config: &CountersConfig) -> Self {
        Self {
            run: Counter::new(0),
            epoch: Counter::new(0),
            trial: Counter::new(config.trials_per_epoch as Tick),
            tick: Counter::new(0),
            event: Counter::new(0),
            scene: Counter::new(config.scenes_per_episode as Tick),
            episode: Counter::new(0),
        }
    }

    /// Everything back to zero except `run`
    pub fn reset(&mut self, run: Tick) {
        self.run.init();
        self.run.set(run);
        for c in [
            &mut self.epoch,
            &mut self.trial,
            &mut self.tick,
            &mut self.event,
            &mut self.scene,
            &mut self.episode,
        ] {
            c.init();
        }
    }

    /// Advance the fast timescales at the start of a step
    pub fn begin_step(&mut self) {
        self.epoch.same();
        self.tick.incr();
        self.event.incr();
    }

    /// Advance the trial; a wrap rolls the epoch over
    pub fn end_step(&mut self) {
        if self.trial.incr() {
            self.epoch.incr();
        }
    }

    /// A consumption closes the current scene; true when a new episode began
    pub fn new_scene(&mut self) -> bool {
        self.event.set(0);
        if self.scene.incr() {
            self.episode.incr();
            return true;
        }
        false
    }

    pub fn get(&self, scale: TimeScale) -> &Counter {
        match scale {
            TimeScale::Run => &self.run,
            TimeScale::Epoch => &self.epoch,
            TimeScale::Trial => &self.trial,
            TimeScale::Tick => &self.tick,
            TimeScale::Event => &self.event,
            TimeScale::Scene => &self.scene,
            TimeScale::Episode => &self.episode,
        }
    }
}
