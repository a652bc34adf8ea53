//! Criterion benchmarks for the engine tick loop on the sample topology.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use depot_core::{Action, ControlAction, TickId, UnitId};
use depot_engine::{BusinessEngine, EngineConfig, Env, SteppingMode};
use depot_event::EventBuffer;

const TICKS: u64 = 1_000;

fn config(stepping: SteppingMode) -> EngineConfig {
    EngineConfig {
        durations: TICKS,
        snapshot_resolution: 10,
        stepping,
        ..Default::default()
    }
}

fn run_engine(engine: &mut BusinessEngine, events: &mut EventBuffer) {
    for t in 0..TICKS {
        let tick = TickId(t);
        engine.step(tick, events).unwrap();
        events.execute(tick, engine).unwrap();
        engine.post_step(tick).unwrap();
    }
}

fn bench_engine_by_facility(c: &mut Criterion) {
    let mut events = EventBuffer::new();
    let mut engine = BusinessEngine::new(config(SteppingMode::ByFacility), &mut events).unwrap();
    c.bench_function("engine_1k_ticks_by_facility", |b| {
        b.iter(|| {
            engine.reset();
            events.reset();
            run_engine(&mut engine, &mut events);
            black_box(engine.snapshots().len());
        });
    });
}

fn bench_engine_by_unit(c: &mut Criterion) {
    let mut events = EventBuffer::new();
    let mut engine =
        BusinessEngine::new(config(SteppingMode::ByUnit { seed: 42 }), &mut events).unwrap();
    c.bench_function("engine_1k_ticks_by_unit", |b| {
        b.iter(|| {
            engine.reset();
            events.reset();
            run_engine(&mut engine, &mut events);
            black_box(engine.snapshots().len());
        });
    });
}

fn bench_env_with_actions(c: &mut Criterion) {
    let mut env = Env::new(config(SteppingMode::ByFacility)).unwrap();
    let action = Action::new()
        .with(UnitId(1), ControlAction::Produce { rate: 3 })
        .with(UnitId(21), ControlAction::Buy { quantity: 2 });
    c.bench_function("env_1k_ticks_with_actions", |b| {
        b.iter(|| {
            env.reset();
            let mut step = env.step(None).unwrap();
            while !step.done {
                step = env.step(Some(action.clone())).unwrap();
            }
            black_box(step.tick);
        });
    });
}

criterion_group!(
    benches,
    bench_engine_by_facility,
    bench_engine_by_unit,
    bench_env_with_actions
);
criterion_main!(benches);
