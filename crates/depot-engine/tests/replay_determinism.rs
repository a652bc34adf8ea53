//! Integration test: identical inputs produce identical episode traces.
//!
//! Runs the bundled sample topology through `BusinessEngine` with a
//! scripted controller, records an `EpisodeTrace` per run, and compares
//! traces across a reset, across a fresh engine, and against a run with
//! a different script.

use depot_core::{Action, ControlAction, TickId, UnitId};
use depot_engine::{BusinessEngine, EngineConfig, SteppingMode};
use depot_event::EventBuffer;
use depot_replay::{snapshot_list_hash, EpisodeTrace, TickRecord};

const DURATIONS: u64 = 30;

fn config(stepping: SteppingMode) -> EngineConfig {
    EngineConfig {
        durations: DURATIONS,
        snapshot_resolution: 3,
        stepping,
        ..Default::default()
    }
}

/// Answers decision `n` with `script(n)`.
fn run(
    engine: &mut BusinessEngine,
    events: &mut EventBuffer,
    script: impl Fn(usize) -> Action,
) -> EpisodeTrace {
    let mut trace = EpisodeTrace::new();
    let mut answered = 0;
    for t in 0..DURATIONS {
        let tick = TickId(t);
        engine.step(tick, events).unwrap();
        let decisions = events.execute(tick, engine).unwrap();
        for _ in &decisions {
            let event = events.gen_action_event(tick, script(answered));
            events.insert_event(event).unwrap();
            answered += 1;
        }
        events.execute(tick, engine).unwrap();
        let done = engine.post_step(tick).unwrap();
        let frame = engine.frame();
        trace
            .record(TickRecord::capture(
                tick,
                !decisions.is_empty(),
                engine.last_metrics().snapshot_index,
                frame.layout(),
                frame.data(),
            ))
            .unwrap();
        assert_eq!(done, t + 1 == DURATIONS);
    }
    trace
}

fn ramp(n: usize) -> Action {
    Action::new()
        .with(UnitId(1), ControlAction::Produce { rate: n as u32 + 1 })
        .with(UnitId(21), ControlAction::Buy { quantity: 2 })
}

#[test]
fn reset_reproduces_the_trace() {
    let mut events = EventBuffer::new();
    let mut engine = BusinessEngine::new(config(SteppingMode::ByFacility), &mut events).unwrap();
    let first = run(&mut engine, &mut events, ramp);
    let first_snapshots = snapshot_list_hash(engine.snapshots());

    engine.reset();
    events.reset();
    let second = run(&mut engine, &mut events, ramp);

    assert_eq!(first.compare(&second), None);
    assert_eq!(first_snapshots, snapshot_list_hash(engine.snapshots()));
    assert_eq!(first.decision_ticks().len(), 6);
    assert_eq!(first.snapshot_indices(), (0..10).collect::<Vec<_>>());
}

#[test]
fn fresh_engines_agree() {
    let mut a_events = EventBuffer::new();
    let mut a = BusinessEngine::new(config(SteppingMode::ByFacility), &mut a_events).unwrap();
    let mut b_events = EventBuffer::new();
    let mut b = BusinessEngine::new(config(SteppingMode::ByFacility), &mut b_events).unwrap();
    let ta = run(&mut a, &mut a_events, ramp);
    let tb = run(&mut b, &mut b_events, ramp);
    assert!(ta.verify(&tb).is_ok());
}

#[test]
fn seeded_unit_stepping_is_reproducible() {
    let stepping = SteppingMode::ByUnit { seed: 7 };
    let mut events = EventBuffer::new();
    let mut engine = BusinessEngine::new(config(stepping), &mut events).unwrap();
    let first = run(&mut engine, &mut events, ramp);
    engine.reset();
    events.reset();
    assert_eq!(first.compare(&run(&mut engine, &mut events, ramp)), None);
}

#[test]
fn different_script_diverges_after_first_answer() {
    let mut events = EventBuffer::new();
    let mut engine = BusinessEngine::new(config(SteppingMode::ByFacility), &mut events).unwrap();
    let baseline = run(&mut engine, &mut events, ramp);
    engine.reset();
    events.reset();
    let other = run(&mut engine, &mut events, |_| {
        Action::new().with(UnitId(1), ControlAction::Produce { rate: 50 })
    });
    let divergence = baseline.compare(&other).unwrap();
    // Actions answering the tick-0 decision take effect on tick 1.
    assert_eq!(divergence.tick, TickId(1));
}
