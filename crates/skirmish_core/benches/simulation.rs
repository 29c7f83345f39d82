//! Simulation benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use skirmish_core::prelude::*;

fn battle(per_side: usize) -> Simulation<TopDownCamera, FlatNavigation> {
    let mut sim = Simulation::new(
        SimConfig::default(),
        TopDownCamera::default(),
        FlatNavigation::square(200.0),
    );
    for i in 0..per_side {
        #[allow(clippy::cast_precision_loss)]
        let z = (i as f32 - per_side as f32 / 2.0) * 1.5;
        sim.spawn_entity(EntitySpawnParams::soldier(0, Vec3::new(-4.0, 0.0, z)));
        sim.spawn_entity(EntitySpawnParams::soldier(1, Vec3::new(4.0, 0.0, z)));
    }
    sim
}

/// Combat-heavy ticks: every unit has an enemy in range.
pub fn combat_tick_benchmark(c: &mut Criterion) {
    let input = PointerInput::default();
    for per_side in [50, 200] {
        c.bench_function(&format!("combat_tick_{per_side}v{per_side}"), |b| {
            b.iter_batched(
                || battle(per_side),
                |mut sim| {
                    for _ in 0..10 {
                        black_box(sim.tick(&input, 1.0 / 30.0));
                    }
                    sim
                },
                BatchSize::LargeInput,
            );
        });
    }
}

criterion_group!(benches, combat_tick_benchmark);
criterion_main!(benches);
