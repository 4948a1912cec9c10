use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use fworld::actions::Action;
use fworld::core::config::FWorldConfig;
use fworld::simulation::env::{Environment, FWorld};
use fworld::simulation::perception::Scanner;
use glam::Vec2;

fn bench_config(size: i32) -> FWorldConfig {
    let mut config = FWorldConfig::default();
    config.world.width = size;
    config.world.height = size;
    config.world.seed = 0xBEEF;
    config
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    for size in [20, 40, 80] {
        let world = FWorld::new(bench_config(size)).expect("valid bench config");
        let scanner = Scanner::new(&world.config().vision);
        let pos = Vec2::new(size as f32 / 2.0, size as f32 / 2.0);
        group.bench_function(format!("full_scan_{size}"), |b| {
            b.iter(|| scanner.scan(world.grid(), world.palette(), pos, 45))
        });
    }
    group.finish();
}

fn bench_steps(c: &mut Criterion) {
    c.bench_function("instinct_step_40", |b| {
        b.iter_batched(
            || FWorld::new(bench_config(40)).expect("valid bench config"),
            |mut world| {
                for _ in 0..64 {
                    world.step();
                    let (action, _) = world.instinct_action(false, false);
                    world.take_action(action);
                }
                world.last_action() == Action::Consume
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_scan, bench_steps);
criterion_main!(benches);
