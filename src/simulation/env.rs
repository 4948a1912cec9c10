//! The FWorld environment: grid, agent pose, percepts and counters
//!
//! A driver alternates `step` (advance time, restore resources, publish the
//! percepts rendered by the previous action) with `take_action` (mutate the
//! pose or world, rescan, render the next percepts).

use std::path::Path;

use glam::Vec2;
use ndarray::{ArrayD, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::actions::catalog::Action;
use crate::core::config::FWorldConfig;
use crate::core::error::{FWorldError, Result};
use crate::core::types::{GridPos, Tick, TimeScale};
use crate::simulation::counters::{Counter, Counters};
use crate::simulation::instinct::{Decision, InstinctContext, InstinctPolicy};
use crate::simulation::perception::{ProxDir, Scan, Scanner};
use crate::simulation::percepts::{self, PerceptBundle};
use crate::simulation::popcode::{PopCode1D, PopCodeRing};
use crate::simulation::resources::{ResourceEvent, ResourceLedger};
use crate::spatial::grid::WorldGrid;
use crate::spatial::ray::{ang_mod, ang_vec, next_vec_point};
use crate::world::generation::{generate_world, random_empty_cell};
use crate::world::materials::{MaterialPalette, EMPTY};
use crate::world::patterns::Patterns;
use crate::world::snapshot;

/// What a learning driver needs from an environment
pub trait Environment {
    /// Start run `run`: reseed, restore the world, place the agent
    fn init(&mut self, run: Tick);

    /// Advance one decision tick
    fn step(&mut self) -> bool;

    /// Perform an action by name; unknown names are ignored
    fn action(&mut self, name: &str);

    /// Current (published) percept tensor
    fn state(&self, name: &str) -> Option<&ArrayD<f32>>;

    fn counter(&self, scale: TimeScale) -> &Counter;
}

pub struct FWorld {
    config: FWorldConfig,
    palette: MaterialPalette,
    patterns: Patterns,
    scanner: Scanner,
    depth_code: PopCode1D,
    angle_code: PopCodeRing,
    policy: InstinctPolicy,

    grid: WorldGrid,
    /// Copy restored at `init` when there is no readable snapshot file
    pristine: WorldGrid,

    pos_f: Vec2,
    pos: GridPos,
    angle: i32,

    last_action: Action,
    last_effort: f32,
    should_gate: bool,

    scan: Scan,
    pos_us: Vec<f32>,
    neg_us: Vec<f32>,

    resources: ResourceLedger,
    counters: Counters,
    percepts: PerceptBundle,
    rng: ChaCha8Rng,
}

impl FWorld {
    /// Build from config, loading or generating patterns and the world
    pub fn new(mut config: FWorldConfig) -> Result<Self> {
        config.validate()?;
        let palette = MaterialPalette::from_config(&config.world)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.world.seed);

        let mut grid = WorldGrid::new(config.world.width, config.world.height);
        match config.world.snapshot_path.clone() {
            Some(path) if path.exists() => snapshot::load_text(&mut grid, &palette, &path)?,
            Some(path) => {
                generate_world(&mut grid, &palette, &config.world, &mut rng);
                match snapshot::save_text(&grid, &palette, &path) {
                    Ok(()) => tracing::info!(path = %path.display(), "saved generated world"),
                    Err(e) => {
                        // The generated grid stays the only copy
                        tracing::warn!(path = %path.display(), error = %e, "could not save generated world");
                        config.world.snapshot_path = None;
                    }
                }
            }
            None => generate_world(&mut grid, &palette, &config.world, &mut rng),
        }

        Self::assemble(config, palette, grid, rng)
    }

    /// Build around a ready-made grid; it becomes the pristine world
    pub fn with_grid(mut config: FWorldConfig, grid: WorldGrid) -> Result<Self> {
        config.world.width = grid.width;
        config.world.height = grid.height;
        config.world.snapshot_path = None;
        config.validate()?;
        let palette = MaterialPalette::from_config(&config.world)?;
        let rng = ChaCha8Rng::seed_from_u64(config.world.seed);
        Self::assemble(config, palette, grid, rng)
    }

    fn assemble(config: FWorldConfig, palette: MaterialPalette, grid: WorldGrid, mut rng: ChaCha8Rng) -> Result<Self> {
        let patterns = match &config.patterns.path {
            Some(path) if path.exists() => Patterns::load(path)?,
            _ => generate_patterns(&config, &palette, &mut rng),
        };
        require_patterns(&patterns, &palette)?;

        let vision = &config.vision;
        let pop = config.popcode.pop_size;
        let [py, px] = patterns.size();
        let n_fov = vision.n_fov_rays();
        let n_fovea = vision.n_fovea_rays();
        let n_drives = palette.n_drives();
        let bundle = PerceptBundle::new(&[
            (percepts::DEPTH, vec![n_fov, pop]),
            (percepts::FOV_DEPTH, vec![n_fovea, pop]),
            (percepts::FOVEA, vec![n_fovea, py, px]),
            (percepts::PROX_SOMA, vec![ProxDir::ALL.len(), 2]),
            (percepts::ANGLE, vec![pop]),
            (percepts::ACTION, vec![py, px]),
            (percepts::POS_US, vec![n_drives]),
            (percepts::NEG_US, vec![percepts::NEG_US_NAMES.len()]),
        ]);

        let mut world = Self {
            scanner: Scanner::new(vision),
            depth_code: PopCode1D::depth(&config.popcode),
            angle_code: PopCodeRing::heading(&config.popcode),
            policy: InstinctPolicy::new(config.instinct.clone()),
            pristine: grid.clone(),
            grid,
            pos_f: Vec2::ZERO,
            pos: GridPos::ZERO,
            angle: 0,
            last_action: Action::Noop,
            last_effort: 0.0,
            should_gate: false,
            scan: Scan::empty(n_fov, n_fovea),
            pos_us: vec![0.0; n_drives],
            neg_us: vec![0.0; percepts::NEG_US_NAMES.len()],
            resources: ResourceLedger::new(),
            counters: Counters::new(&config.counters),
            percepts: bundle,
            rng,
            palette,
            patterns,
            config,
        };
        world.init(0);
        Ok(world)
    }

    // ---- accessors ----

    pub fn config(&self) -> &FWorldConfig {
        &self.config
    }

    pub fn palette(&self) -> &MaterialPalette {
        &self.palette
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    pub fn pos_f(&self) -> Vec2 {
        self.pos_f
    }

    pub fn angle(&self) -> i32 {
        self.angle
    }

    pub fn last_action(&self) -> Action {
        self.last_action
    }

    pub fn last_effort(&self) -> f32 {
        self.last_effort
    }

    pub fn should_gate(&self) -> bool {
        self.should_gate
    }

    pub fn scan(&self) -> &Scan {
        &self.scan
    }

    pub fn pos_us(&self) -> &[f32] {
        &self.pos_us
    }

    pub fn neg_us(&self) -> &[f32] {
        &self.neg_us
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn resources(&self) -> &ResourceLedger {
        &self.resources
    }

    pub fn percepts(&self) -> &PerceptBundle {
        &self.percepts
    }

    /// Place the agent directly, then rescan and render
    pub fn set_pose(&mut self, pos: GridPos, angle: i32) {
        self.pos = pos;
        self.pos_f = pos.as_vec2();
        self.angle = ang_mod(angle);
        self.rescan();
        self.render();
    }

    // ---- actions ----

    /// Apply `action` and return the effort it cost
    pub fn take_action(&mut self, action: Action) -> f32 {
        self.pos_us.iter_mut().for_each(|v| *v = 0.0);
        self.neg_us.iter_mut().for_each(|v| *v = 0.0);

        let rot = self.config.vision.rot_inc;
        match action {
            Action::Left => self.angle = ang_mod(self.angle + rot),
            Action::Right => self.angle = ang_mod(self.angle - rot),
            Action::Forward => self.move_along(0),
            Action::Backward => self.move_along(180),
            Action::Consume => self.consume(),
            Action::Noop => {}
        }

        let effort = action.effort(&self.config.effort);
        self.last_action = action;
        self.last_effort = effort;
        self.rescan();
        self.render();
        effort
    }

    fn move_along(&mut self, rel_angle: i32) {
        let dir = ang_vec(self.angle + rel_angle);
        let (next, cell) = next_vec_point(self.pos_f, dir);
        let mat = self.grid.get(cell).unwrap_or(self.palette.barrier_idx());
        if self.palette.is_barrier(mat) {
            self.neg_us[percepts::BUMP] = self.config.effort.bump_pain;
            tracing::debug!(x = cell.x, y = cell.y, mat = self.palette.name(mat), "bump");
            return;
        }
        self.pos_f = next;
        self.pos = cell;
    }

    fn consume(&mut self) {
        // Read the grid, not the last scan: a refresh may have changed it
        let (_, cell) = next_vec_point(self.pos_f, ang_vec(self.angle));
        let Some(mat) = self.grid.get(cell) else {
            return;
        };
        let Some(drive) = self.palette.drive_of(mat) else {
            return;
        };

        self.pos_us[drive] = 1.0;
        self.grid.set(cell, self.palette.depleted_of(mat));
        let tick = self.counters.tick.cur;
        self.resources.record(ResourceEvent {
            tick,
            pos: self.pos,
            angle: self.angle,
            action: Action::Consume,
            mat,
            mat_pos: cell,
        });
        self.should_gate = false;
        if self.counters.new_scene() {
            tracing::debug!(episode = self.counters.episode.cur, "new episode");
        }
        tracing::debug!(tick, drive = self.palette.drive_name(drive), x = cell.x, y = cell.y, "consumed");
    }

    /// Put back every consumable whose refresh delay has elapsed
    pub fn refresh_world(&mut self) -> Vec<ResourceEvent> {
        let now = self.counters.tick.cur;
        let restored = self.resources.refresh(&mut self.grid, now, self.config.world.env_refresh);
        if !restored.is_empty() {
            tracing::debug!(tick = now, count = restored.len(), "resources restored");
            self.rescan();
            self.render();
        }
        restored
    }

    // ---- instinct ----

    /// Full instinct decision for the current scan
    pub fn instinct_decision(&mut self, just_gated: bool, has_gated: bool) -> Decision {
        if just_gated {
            self.should_gate = false;
        }
        let ctx = InstinctContext {
            scan: &self.scan,
            palette: &self.palette,
            last_action: self.last_action,
            has_gated,
            fovea_ang_inc: self.config.vision.fovea_ang_inc,
        };
        let decision = self.policy.decide(&ctx, &mut self.rng);
        if decision.should_gate {
            self.should_gate = true;
        }
        decision
    }

    /// Instinctive action and its urgency
    pub fn instinct_action(&mut self, just_gated: bool, has_gated: bool) -> (Action, f32) {
        let d = self.instinct_decision(just_gated, has_gated);
        (d.action, d.urgency)
    }

    /// Nearest action pattern to a network's activation
    pub fn decode_action(&self, activation: ArrayView2<f32>) -> Action {
        self.patterns.decode_action(activation, self.config.instinct.fwd_margin)
    }

    // ---- files ----

    /// Load a world snapshot; `init` restores this file from now on
    pub fn open_world(&mut self, path: &Path) -> Result<()> {
        snapshot::load_text(&mut self.grid, &self.palette, path)?;
        self.pristine = self.grid.clone();
        self.config.world.snapshot_path = Some(path.to_path_buf());
        self.rescan();
        self.render();
        Ok(())
    }

    pub fn save_world(&self, path: &Path) -> Result<()> {
        snapshot::save_text(&self.grid, &self.palette, path)
    }

    pub fn open_patterns(&mut self, path: &Path) -> Result<()> {
        let patterns = Patterns::load(path)?;
        require_patterns(&patterns, &self.palette)?;
        if patterns.size() != self.patterns.size() {
            return Err(FWorldError::Config(format!(
                "pattern size {:?} does not match {:?}",
                patterns.size(),
                self.patterns.size()
            )));
        }
        self.patterns = patterns;
        self.render();
        Ok(())
    }

    pub fn save_patterns(&self, path: &Path) -> Result<()> {
        self.patterns.save(path)
    }

    // ---- sensing ----

    fn rescan(&mut self) {
        self.scan = self.scanner.scan(&self.grid, &self.palette, self.pos_f, self.angle);
    }

    /// Encode the current scan, pose and US into the `next` buffers
    fn render(&mut self) {
        let Self {
            percepts: bundle,
            scan,
            patterns,
            palette,
            depth_code,
            angle_code,
            angle,
            last_action,
            pos_us,
            neg_us,
            ..
        } = self;

        if let Some(t) = bundle.next_mut(percepts::DEPTH) {
            encode_rows(t, scan.depths.iter().map(|r| r.log_depth), depth_code);
        }
        if let Some(t) = bundle.next_mut(percepts::FOV_DEPTH) {
            encode_rows(t, scan.fovea.iter().map(|r| r.log_depth), depth_code);
        }
        if let Some(t) = bundle.next_mut(percepts::FOVEA) {
            for (mut cell, ray) in t.outer_iter_mut().zip(&scan.fovea) {
                match patterns.get(palette.name(ray.mat)) {
                    Some(pat) => cell.assign(pat),
                    None => cell.fill(0.0),
                }
            }
        }
        if let Some(t) = bundle.next_mut(percepts::PROX_SOMA) {
            for dir in ProxDir::ALL {
                let contact = scan.prox(dir) != EMPTY;
                let d = dir as usize;
                t[[d, 0]] = if contact { 0.0 } else { 1.0 };
                t[[d, 1]] = if contact { 1.0 } else { 0.0 };
            }
        }
        if let Some(t) = bundle.next_mut(percepts::ANGLE) {
            let code = angle_code.encode(*angle as f32 / 360.0, t.len());
            for (dst, v) in t.iter_mut().zip(code) {
                *dst = v;
            }
        }
        if let Some(t) = bundle.next_mut(percepts::ACTION) {
            match patterns.get(last_action.name()) {
                Some(pat) => t.assign(pat),
                None => t.fill(0.0),
            }
        }
        if let Some(t) = bundle.next_mut(percepts::POS_US) {
            for (dst, v) in t.iter_mut().zip(pos_us.iter()) {
                *dst = *v;
            }
        }
        if let Some(t) = bundle.next_mut(percepts::NEG_US) {
            for (dst, v) in t.iter_mut().zip(neg_us.iter()) {
                *dst = *v;
            }
        }
    }

    fn restore_world(&mut self) {
        if let Some(path) = &self.config.world.snapshot_path {
            match snapshot::load_text(&mut self.grid, &self.palette, path) {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "snapshot reload failed, using in-memory copy");
                }
            }
        }
        self.grid = self.pristine.clone();
    }
}

impl Environment for FWorld {
    fn init(&mut self, run: Tick) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.world.seed.wrapping_add(run));
        self.counters.reset(run);
        self.restore_world();
        self.resources.clear();

        self.last_action = Action::Noop;
        self.last_effort = 0.0;
        self.should_gate = false;
        self.pos_us.iter_mut().for_each(|v| *v = 0.0);
        self.neg_us.iter_mut().for_each(|v| *v = 0.0);

        let pos = random_empty_cell(&self.grid, &mut self.rng).unwrap_or_else(|| {
            tracing::warn!("no empty cell for the agent, starting at the center");
            GridPos::new(self.grid.width / 2, self.grid.height / 2)
        });
        let rot = self.config.vision.rot_inc;
        let angle = self.rng.gen_range(0..360 / rot) * rot;
        self.set_pose(pos, angle);
        self.percepts.publish();

        tracing::info!(run, x = pos.x, y = pos.y, angle, "environment initialized");
    }

    fn step(&mut self) -> bool {
        self.counters.begin_step();
        self.refresh_world();
        self.counters.end_step();
        self.percepts.publish();
        true
    }

    fn action(&mut self, name: &str) {
        match Action::from_name(name) {
            Some(action) => {
                self.take_action(action);
            }
            None => tracing::warn!(name, "unknown action"),
        }
    }

    fn state(&self, name: &str) -> Option<&ArrayD<f32>> {
        self.percepts.current(name)
    }

    fn counter(&self, scale: TimeScale) -> &Counter {
        self.counters.get(scale)
    }
}

/// Fresh patterns for every material and action name
pub fn generate_patterns<R: Rng + ?Sized>(config: &FWorldConfig, palette: &MaterialPalette, rng: &mut R) -> Patterns {
    let names: Vec<&str> = palette
        .names()
        .chain(Action::ALL.iter().map(|a| a.name()))
        .collect();
    let pc = &config.patterns;
    Patterns::generate(&names, pc.size, pc.n_on, pc.min_diff, rng)
}

fn require_patterns(patterns: &Patterns, palette: &MaterialPalette) -> Result<()> {
    patterns.require(palette.names().chain(Action::ALL.iter().map(|a| a.name())))
}

fn encode_rows(tensor: &mut ArrayD<f32>, values: impl Iterator<Item = f32>, code: &PopCode1D) {
    for (mut row, v) in tensor.outer_iter_mut().zip(values) {
        let n = row.len();
        for (dst, a) in row.iter_mut().zip(code.encode(v, n)) {
            *dst = a;
        }
    }
}
