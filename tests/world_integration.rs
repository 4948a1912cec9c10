//! Integration tests for the FWorld environment
//!
//! These tests drive the environment the way a learning loop would:
//! - Consumption, depletion and delayed restoration
//! - Percept double buffering across step/take_action
//! - World and pattern files
//! - Seeded determinism of runs and instinct choices

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use fworld::actions::Action;
use fworld::core::config::FWorldConfig;
use fworld::core::error::FWorldError;
use fworld::core::types::{GridPos, TimeScale};
use fworld::simulation::env::{Environment, FWorld};
use fworld::simulation::output::run_instinct;
use fworld::simulation::percepts;
use fworld::spatial::grid::WorldGrid;
use fworld::world::generation::bounding_wall;
use fworld::world::patterns::Patterns;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn temp_dir(prefix: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("duration")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("fworld-tests-{prefix}-{unique}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// 10x10 walled room with one Water cell at (5,5)
fn water_room(refresh: u64) -> FWorld {
    let mut grid = WorldGrid::new(10, 10);
    bounding_wall(&mut grid, 1);
    grid.set(GridPos::new(5, 5), 3);
    let mut config = FWorldConfig::default();
    config.world.env_refresh = refresh;
    FWorld::with_grid(config, grid).expect("valid world")
}

fn small_config(seed: u64) -> FWorldConfig {
    let mut config = FWorldConfig::default();
    config.world.width = 20;
    config.world.height = 20;
    config.world.n_blocks = 3;
    config.world.seed = seed;
    config
}

// ============================================================================
// Consumption Lifecycle
// ============================================================================

#[test]
fn test_consume_water_end_to_end() {
    let mut world = water_room(5);
    let water = world.palette().index_of("Water").unwrap();
    let water_was = world.palette().index_of("WaterWas").unwrap();
    let drive = world.palette().drive_of(water).unwrap();

    world.set_pose(GridPos::new(4, 5), 0);
    world.step();
    let consumed_at = world.counter(TimeScale::Tick).cur;
    world.take_action(Action::Consume);

    assert_eq!(world.grid().get(GridPos::new(5, 5)), Some(water_was));
    assert_eq!(world.resources().pending_count(), 1);

    world.step();
    let pos_us = world.state(percepts::POS_US).unwrap();
    assert_eq!(pos_us[[drive]], 1.0);

    // Depleted for [T, T+R), back at T+R
    while world.counter(TimeScale::Tick).cur < consumed_at + 5 {
        assert_eq!(world.grid().get(GridPos::new(5, 5)), Some(water_was));
        world.step();
    }
    assert_eq!(world.counter(TimeScale::Tick).cur, consumed_at + 5);
    assert_eq!(world.grid().get(GridPos::new(5, 5)), Some(water));
    assert_eq!(world.resources().pending_count(), 0);
    assert_eq!(world.resources().total_consumed(), 1);
}

#[test]
fn test_restored_resource_is_seen_again() {
    let mut world = water_room(2);
    world.set_pose(GridPos::new(4, 5), 0);
    world.take_action(Action::Consume);
    let was = world.palette().index_of("WaterWas").unwrap();
    assert_eq!(world.scan().fovea_center().unwrap().mat, was);

    world.step();
    world.step();
    let water = world.palette().index_of("Water").unwrap();
    assert_eq!(world.scan().fovea_center().unwrap().mat, water);
}

#[test]
fn test_consume_facing_wall_does_nothing() {
    let mut world = water_room(5);
    world.set_pose(GridPos::new(1, 1), 180);
    let before = world.grid().clone();
    assert_eq!(world.take_action(Action::Consume), 0.0);
    assert_eq!(world.grid(), &before);
    assert_eq!(world.counter(TimeScale::Scene).cur, 0);
}

#[test]
fn test_depleted_cell_cannot_be_consumed_twice() {
    let mut world = water_room(50);
    world.set_pose(GridPos::new(4, 5), 0);
    world.take_action(Action::Consume);
    world.step();
    world.take_action(Action::Consume);
    assert!(world.pos_us().iter().all(|v| *v == 0.0));
    assert_eq!(world.resources().total_consumed(), 1);
}

// ============================================================================
// Percepts and Counters
// ============================================================================

#[test]
fn test_bump_shows_after_step() {
    let mut world = water_room(5);
    world.set_pose(GridPos::new(8, 2), 0);
    world.step();
    world.take_action(Action::Forward);
    assert_eq!(world.state(percepts::NEG_US).unwrap()[[percepts::BUMP]], 0.0);
    world.step();
    assert_eq!(world.state(percepts::NEG_US).unwrap()[[percepts::BUMP]], 0.5);
}

#[test]
fn test_action_percept_tracks_last_action() {
    let mut world = water_room(5);
    world.set_pose(GridPos::new(3, 3), 90);
    world.take_action(Action::Left);
    world.step();
    let rendered = world.state(percepts::ACTION).unwrap();
    let expected = world.patterns().get("Left").unwrap();
    assert_eq!(rendered.shape(), expected.shape());
    assert!(rendered.iter().zip(expected.iter()).all(|(a, b)| a == b));
}

#[test]
fn test_trials_roll_into_epochs() {
    let mut config = small_config(3);
    config.counters.trials_per_epoch = 10;
    let mut world = FWorld::new(config).unwrap();
    for _ in 0..25 {
        world.step();
    }
    assert_eq!(world.counter(TimeScale::Epoch).cur, 2);
    assert_eq!(world.counter(TimeScale::Trial).cur, 5);
    assert_eq!(world.counter(TimeScale::Tick).cur, 25);
}

#[test]
fn test_init_resets_counters_and_pose_per_run() {
    let mut world = FWorld::new(small_config(11)).unwrap();
    world.init(4);
    let first = (world.pos(), world.angle());
    for _ in 0..10 {
        world.step();
        world.action("Forward");
    }
    world.init(4);
    assert_eq!((world.pos(), world.angle()), first);
    assert_eq!(world.counter(TimeScale::Run).cur, 4);
    assert_eq!(world.counter(TimeScale::Tick).cur, 0);
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_world_snapshot_round_trip() {
    let dir = temp_dir("snapshot");
    let path = dir.join("world.tsv");

    let world = FWorld::new(small_config(5)).unwrap();
    world.save_world(&path).unwrap();

    let mut other = FWorld::new(small_config(6)).unwrap();
    assert_ne!(other.grid(), world.grid());
    other.open_world(&path).unwrap();
    assert_eq!(other.grid(), world.grid());

    // The loaded world is what init restores
    other.init(1);
    assert_eq!(other.grid(), world.grid());
}

#[test]
fn test_snapshot_path_is_written_then_reused() {
    let dir = temp_dir("snapshot-path");
    let mut config = small_config(8);
    config.world.snapshot_path = Some(dir.join("world.tsv"));

    let first = FWorld::new(config.clone()).unwrap();
    assert!(dir.join("world.tsv").exists());

    config.world.seed = 99;
    let second = FWorld::new(config).unwrap();
    assert_eq!(first.grid(), second.grid());
}

#[test]
fn test_unwritable_snapshot_path_keeps_generated_world() {
    let dir = temp_dir("unwritable");
    let mut config = small_config(8);
    config.world.snapshot_path = Some(dir.join("no-such-dir").join("world.tsv"));

    let mut world = FWorld::new(config).expect("generated world survives a failed save");
    assert!(!dir.join("no-such-dir").exists());
    assert_eq!(world.grid(), FWorld::new(small_config(8)).unwrap().grid());

    let generated = world.grid().clone();
    world.init(1);
    assert_eq!(world.grid(), &generated);
}

#[test]
fn test_opened_world_survives_init_over_configured_snapshot() {
    let dir = temp_dir("open-over-config");
    let mut config = small_config(8);
    config.world.snapshot_path = Some(dir.join("configured.tsv"));
    let mut world = FWorld::new(config).unwrap();

    let opened = FWorld::new(small_config(9)).unwrap();
    opened.save_world(&dir.join("opened.tsv")).unwrap();
    assert_ne!(world.grid(), opened.grid());

    world.open_world(&dir.join("opened.tsv")).unwrap();
    world.init(1);
    assert_eq!(world.grid(), opened.grid());
}

#[test]
fn test_init_falls_back_when_snapshot_disappears() {
    let dir = temp_dir("snapshot-gone");
    let path = dir.join("world.tsv");
    let mut config = small_config(8);
    config.world.snapshot_path = Some(path.clone());
    let mut world = FWorld::new(config).unwrap();
    let original = world.grid().clone();

    // Eat something so the live grid differs from the original
    let grid = world.grid().clone();
    let food = (1..grid.height - 1)
        .flat_map(|y| (2..grid.width - 1).map(move |x| GridPos::new(x, y)))
        .find(|&p| {
            grid.get(p).and_then(|m| world.palette().drive_of(m)).is_some()
                && grid.get(p - GridPos::X) == Some(0)
        })
        .expect("a consumable with open floor to its west");
    world.set_pose(food - GridPos::X, 0);
    world.take_action(Action::Consume);
    assert_ne!(world.grid(), &original);
    std::fs::remove_file(&path).unwrap();

    world.init(1);
    assert_eq!(world.grid(), &original);
    assert_eq!(world.grid().get(world.pos()), Some(0));
    assert_eq!(world.counter(TimeScale::Run).cur, 1);
    assert!(world.state(percepts::DEPTH).is_some());
}

#[test]
fn test_missing_snapshot_file_is_an_io_error() {
    let mut world = FWorld::new(small_config(2)).unwrap();
    let err = world.open_world(&temp_dir("missing").join("nope.tsv")).unwrap_err();
    assert!(matches!(err, FWorldError::Io(_)));
}

#[test]
fn test_patterns_file_round_trip() {
    let dir = temp_dir("patterns");
    let path = dir.join("patterns.json");
    let world = FWorld::new(small_config(1)).unwrap();
    world.save_patterns(&path).unwrap();

    let mut config = small_config(2);
    config.patterns.path = Some(path);
    let other = FWorld::new(config).unwrap();
    assert_eq!(other.patterns(), world.patterns());
}

#[test]
fn test_incomplete_patterns_rejected() {
    let dir = temp_dir("partial-patterns");
    let path = dir.join("patterns.json");
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    Patterns::generate(&["Empty", "Wall", "Food"], [5, 5], 6, 4, &mut rng)
        .save(&path)
        .unwrap();

    let mut config = small_config(2);
    config.patterns.path = Some(path);
    let err = FWorld::new(config).err().unwrap();
    assert!(matches!(err, FWorldError::MissingPattern(_)));
}

#[test]
fn test_decode_action_recovers_turns() {
    let world = FWorld::new(small_config(4)).unwrap();
    for action in [Action::Left, Action::Right, Action::Consume] {
        let pat = world.patterns().get(action.name()).unwrap().clone();
        assert_eq!(world.decode_action(pat.view()), action);
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_same_run() {
    let mut a = FWorld::new(small_config(21)).unwrap();
    let mut b = FWorld::new(small_config(21)).unwrap();
    let sa = run_instinct(&mut a, 2, 300);
    let sb = run_instinct(&mut b, 2, 300);

    assert_eq!(sa.statistics.consumed, sb.statistics.consumed);
    assert_eq!(sa.statistics.bumps, sb.statistics.bumps);
    assert_eq!(
        (sa.statistics.final_x, sa.statistics.final_y, sa.statistics.final_angle),
        (sb.statistics.final_x, sb.statistics.final_y, sb.statistics.final_angle)
    );
    assert_eq!(a.grid(), b.grid());
    assert_eq!(a.resources().history(), b.resources().history());
}

#[test]
fn test_instinct_sequence_is_reproducible() {
    let mut a = FWorld::new(small_config(33)).unwrap();
    let mut b = FWorld::new(small_config(33)).unwrap();
    for _ in 0..100 {
        a.step();
        b.step();
        let da = a.instinct_action(false, false);
        let db = b.instinct_action(false, false);
        assert_eq!(da, db);
        a.take_action(da.0);
        b.take_action(db.0);
    }
}

#[test]
fn test_instinct_never_walks_into_walls_knowingly() {
    let mut world = FWorld::new(small_config(17)).unwrap();
    for _ in 0..200 {
        world.step();
        let front = world.scan().prox_mats[0];
        let (action, _) = world.instinct_action(false, false);
        if world.palette().is_barrier(front) {
            assert!(action.is_turn(), "chose {action} facing a wall");
        }
        world.take_action(action);
    }
}
