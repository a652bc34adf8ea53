//! Integration test: the per-tick lifecycle against recording entities.
//!
//! Drives a `BusinessEngine` by hand (step, execute events, post_step)
//! over a world of recording facilities and checks call order, decision
//! and snapshot cadence, action dispatch, and strict tick ordering.

use depot_core::{
    Action, AttributeId, ControlAction, EntityError, FacilityId, NodeKindId, NodeSlot, StepError,
    TickId, UnitId,
};
use depot_engine::{BusinessEngine, EngineConfig, EngineState};
use depot_event::{DecisionEvent, EventBuffer};
use depot_test_utils::{
    recording_world, Call, CallLog, FailingFacility, RecordingUnit, PHASE_STEPPED,
};
use depot_world::WorldBuilder;

// ── Harness ──────────────────────────────────────────────────────────

fn config(durations: u64, resolution: u64) -> EngineConfig {
    EngineConfig {
        durations,
        snapshot_resolution: resolution,
        ..Default::default()
    }
}

fn engine(
    action_steps: u64,
    durations: u64,
    resolution: u64,
) -> (BusinessEngine, EventBuffer, CallLog) {
    let cfg = config(durations, resolution);
    let (world, log) = recording_world(
        action_steps,
        &[(1, &[10, 11]), (2, &[20]), (3, &[])],
        cfg.resolved_max_snapshots(),
    )
    .unwrap();
    let mut events = EventBuffer::new();
    let engine = BusinessEngine::from_world(world, cfg, &mut events).unwrap();
    (engine, events, log)
}

/// One full tick; returns the decisions raised and the done flag.
fn tick(
    engine: &mut BusinessEngine,
    events: &mut EventBuffer,
    t: u64,
) -> Result<(Vec<DecisionEvent>, bool), StepError> {
    let t = TickId(t);
    engine.step(t, events)?;
    let decisions = events.execute(t, engine)?;
    let done = engine.post_step(t)?;
    Ok((decisions, done))
}

// ── Cadence ──────────────────────────────────────────────────────────

#[test]
fn decisions_snapshots_and_done_follow_cadence() {
    let (mut engine, mut events, _log) = engine(10, 20, 5);
    let mut decision_ticks = Vec::new();
    let mut snapshot_ticks = Vec::new();
    let mut done_ticks = Vec::new();
    for t in 0..20 {
        let (decisions, done) = tick(&mut engine, &mut events, t).unwrap();
        decision_ticks.extend(decisions.iter().map(|d| d.tick));
        if let Some(index) = engine.last_metrics().snapshot_index {
            snapshot_ticks.push((t, index));
        }
        if done {
            done_ticks.push(t);
        }
    }
    assert_eq!(decision_ticks, vec![TickId(0), TickId(10)]);
    assert_eq!(snapshot_ticks, vec![(4, 0), (9, 1), (14, 2), (19, 3)]);
    assert_eq!(done_ticks, vec![19]);
    assert_eq!(engine.snapshots().indices(), vec![0, 1, 2, 3]);
    assert_eq!(engine.state(), EngineState::Terminated);
}

#[test]
fn snapshot_is_taken_before_facility_post_step() {
    let (mut engine, mut events, _log) = engine(10, 20, 5);
    for t in 0..5 {
        tick(&mut engine, &mut events, t).unwrap();
    }
    let snap = engine.snapshots().get(0).unwrap();
    for row in 0..3 {
        let slot = NodeSlot::new(NodeKindId(0), row);
        assert_eq!(snap.get(slot, AttributeId(0)), Some(PHASE_STEPPED));
    }
}

#[test]
fn facilities_step_then_post_step_in_declaration_order() {
    let (mut engine, mut events, log) = engine(10, 3, 1);
    for t in 0..3 {
        tick(&mut engine, &mut events, t).unwrap();
    }
    let order = vec![FacilityId(1), FacilityId(2), FacilityId(3)];
    for t in 0..3 {
        assert_eq!(log.facility_steps(TickId(t)), order);
        assert_eq!(log.facility_post_steps(TickId(t)), order);
        assert_eq!(
            log.unit_steps(TickId(t)),
            vec![UnitId(10), UnitId(11), UnitId(20)]
        );
    }
    let calls = log.calls();
    let last_step = calls
        .iter()
        .rposition(|c| matches!(c, Call::FacilityStep { tick, .. } if *tick == TickId(1)))
        .unwrap();
    let first_post = calls
        .iter()
        .position(|c| matches!(c, Call::FacilityPostStep { tick, .. } if *tick == TickId(1)))
        .unwrap();
    assert!(last_step < first_post);
}

// ── Action dispatch ──────────────────────────────────────────────────

#[test]
fn unknown_units_in_an_action_are_skipped() {
    let (mut engine, mut events, log) = engine(5, 10, 1);
    engine.step(TickId(0), &mut events).unwrap();
    let action = Action::new()
        .with(UnitId(10), ControlAction::Buy { quantity: 7 })
        .with(UnitId(99), ControlAction::Hold);
    let event = events.gen_action_event(TickId(0), action);
    events.insert_event(event).unwrap();

    let decisions = events.execute(TickId(0), &mut engine).unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(
        log.actions_for(UnitId(10)),
        vec![ControlAction::Buy { quantity: 7 }]
    );
    assert_eq!(log.set_action_count(), 1);
    assert_eq!(engine.last_metrics().actions_applied, 1);
    assert_eq!(engine.last_metrics().actions_skipped, 1);
    assert!(!engine.post_step(TickId(0)).unwrap());
}

#[test]
fn rejected_action_surfaces_as_action_failed() {
    let log = CallLog::new();
    let mut b = WorldBuilder::new(1);
    b.add_unit(Box::new(RecordingUnit::rejecting(UnitId(4), log.clone())), None)
        .unwrap();
    let cfg = config(3, 1);
    let world = b.build(cfg.resolved_max_snapshots()).unwrap();
    let mut events = EventBuffer::new();
    let mut engine = BusinessEngine::from_world(world, cfg, &mut events).unwrap();

    engine.step(TickId(0), &mut events).unwrap();
    let action = Action::new().with(UnitId(4), ControlAction::Hold);
    let event = events.gen_action_event(TickId(0), action);
    events.insert_event(event).unwrap();
    let err = events.execute(TickId(0), &mut engine).unwrap_err();
    assert!(matches!(
        err,
        StepError::ActionFailed {
            unit: UnitId(4),
            source: EntityError::UnsupportedAction { .. },
            ..
        }
    ));
}

// ── Failure and ordering ─────────────────────────────────────────────

#[test]
fn facility_failure_names_tick_and_facility() {
    let mut b = WorldBuilder::new(1);
    b.add_facility(Box::new(FailingFacility::new(FacilityId(8), TickId(2))), None)
        .unwrap();
    let cfg = config(5, 1);
    let world = b.build(cfg.resolved_max_snapshots()).unwrap();
    let mut events = EventBuffer::new();
    let mut engine = BusinessEngine::from_world(world, cfg, &mut events).unwrap();
    tick(&mut engine, &mut events, 0).unwrap();
    tick(&mut engine, &mut events, 1).unwrap();
    let err = tick(&mut engine, &mut events, 2).unwrap_err();
    assert!(matches!(
        err,
        StepError::FacilityFailed {
            tick: TickId(2),
            facility: FacilityId(8),
            ..
        }
    ));
}

#[test]
fn strict_order_rejects_skips_repeats_and_overruns() {
    let (mut engine, mut events, _log) = engine(5, 2, 1);
    assert_eq!(
        engine.step(TickId(1), &mut events),
        Err(StepError::TickOutOfOrder {
            expected: TickId(0),
            got: TickId(1)
        })
    );
    assert!(matches!(
        engine.post_step(TickId(0)),
        Err(StepError::PostStepMismatch { stepped: None, .. })
    ));
    tick(&mut engine, &mut events, 0).unwrap();
    assert!(matches!(
        engine.post_step(TickId(0)),
        Err(StepError::PostStepMismatch { .. })
    ));
    let (_, done) = tick(&mut engine, &mut events, 1).unwrap();
    assert!(done);
    assert_eq!(
        engine.step(TickId(2), &mut events),
        Err(StepError::EpisodeFinished { max_tick: 2 })
    );
}

#[test]
fn strict_order_rejects_step_before_post_step() {
    let (mut engine, mut events, log) = engine(5, 4, 1);
    engine.step(TickId(0), &mut events).unwrap();
    assert_eq!(
        engine.step(TickId(1), &mut events),
        Err(StepError::PostStepPending { tick: TickId(0) })
    );
    assert!(log.facility_steps(TickId(1)).is_empty());

    events.execute(TickId(0), &mut engine).unwrap();
    assert!(!engine.post_step(TickId(0)).unwrap());
    tick(&mut engine, &mut events, 1).unwrap();

    let order = vec![FacilityId(1), FacilityId(2), FacilityId(3)];
    assert_eq!(log.facility_post_steps(TickId(0)), order);
    assert_eq!(log.facility_post_steps(TickId(1)), order);
    assert_eq!(engine.snapshots().indices(), vec![0, 1]);
}

#[test]
fn reset_replays_the_same_call_sequence() {
    let (mut engine, mut events, log) = engine(2, 6, 2);
    for t in 0..6 {
        tick(&mut engine, &mut events, t).unwrap();
    }
    let first: Vec<Call> = log.calls();

    engine.reset();
    events.reset();
    let once = (
        engine.frame().data().to_vec(),
        engine.snapshots().indices(),
        engine.state(),
    );
    engine.reset();
    let twice = (
        engine.frame().data().to_vec(),
        engine.snapshots().indices(),
        engine.state(),
    );
    assert_eq!(once, twice);
    assert!(twice.0.iter().all(|&v| v == 0.0));
    assert!(twice.1.is_empty());
    assert_eq!(twice.2, EngineState::Built);

    log.clear();
    for t in 0..6 {
        tick(&mut engine, &mut events, t).unwrap();
    }
    let reset_calls = |c: &Call| matches!(c, Call::FacilityReset { .. } | Call::UnitReset { .. });
    let second: Vec<Call> = log.calls().into_iter().filter(|c| !reset_calls(c)).collect();
    let first: Vec<Call> = first.into_iter().filter(|c| !reset_calls(c)).collect();
    assert_eq!(first, second);
    assert_eq!(engine.snapshots().indices(), vec![0, 1, 2]);
}
