//! Environment driver: the tick loop around a [`BusinessEngine`].
//!
//! [`Env::step`] advances ticks until the engine asks for a decision or
//! the episode ends. A decision pauses the loop mid-tick (after `step`,
//! before `post_step`); the next `Env::step` call queues the supplied
//! action for that same tick, dispatches it, and resumes. An error
//! mid-tick leaves the tick in flight, so the next call resumes it too.
//!
//! ```text
//! Env::step(action)
//!   ├─ queue action as a TakeAction event at `tick`
//!   └─ loop
//!        engine.step(tick)            (skipped while a tick is in flight)
//!        queue inbox messages
//!        execute events ─→ decision? return EnvStep { decision }
//!        post_step(tick) ─→ done?    return EnvStep { done }
//!        tick += 1
//! ```

use std::time::Duration;

use tracing::{debug, info};

use depot_core::{Action, TickId};
use depot_event::{DecisionEvent, EventBuffer};
use depot_frame::SnapshotList;
use depot_world::{EntityRegistry, NodeMapping, WorldConfigs};

use crate::business_engine::{BusinessEngine, EngineState};
use crate::config::EngineConfig;
use crate::error::EnvError;
use crate::inbox::{ActionInbox, ActionMessage, ActionSender};
use crate::metrics::StepMetrics;

/// Default capacity of the action inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// Outcome of one [`Env::step`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvStep {
    /// Tick the loop stopped at.
    pub tick: TickId,
    /// The pending decision, if the loop stopped for one.
    pub decision: Option<DecisionEvent>,
    /// Whether the episode has ended.
    pub done: bool,
    /// Metrics of the tick the loop stopped at.
    pub metrics: StepMetrics,
}

/// Point-in-time overview of a running environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvSummary {
    /// Current tick.
    pub tick: TickId,
    /// Snapshot index of the current tick.
    pub frame_index: u64,
    /// Engine lifecycle state.
    pub state: EngineState,
    /// Episode length.
    pub max_tick: u64,
    /// Snapshots currently stored.
    pub snapshots: usize,
    /// Snapshot list capacity.
    pub snapshot_capacity: usize,
    /// Facilities in the world.
    pub facilities: usize,
    /// Units in the world.
    pub units: usize,
    /// Events dispatched since the last reset.
    pub events_dispatched: u64,
    /// Whether a decision is waiting for an action.
    pub awaiting_action: bool,
}

/// Owns an engine, its event buffer, and the action inbox.
#[derive(Debug)]
pub struct Env {
    engine: BusinessEngine,
    events: EventBuffer,
    inbox: ActionInbox,
    tick: TickId,
    pending: Option<DecisionEvent>,
    /// `tick` has been stepped but not yet post-stepped.
    in_tick: bool,
    done: bool,
}

impl Env {
    /// Build an environment for `config` with the reference entities.
    pub fn new(config: EngineConfig) -> Result<Self, EnvError> {
        Self::with_registry(config, &EntityRegistry::with_builtins())
    }

    /// Build an environment with a caller-supplied entity registry.
    pub fn with_registry(config: EngineConfig, registry: &EntityRegistry) -> Result<Self, EnvError> {
        let mut events = EventBuffer::new();
        let engine = BusinessEngine::with_registry(config, registry, &mut events)?;
        Ok(Self::from_parts(engine, events))
    }

    /// Wrap an engine and the buffer it registered its handler on.
    pub fn from_parts(engine: BusinessEngine, events: EventBuffer) -> Self {
        Self {
            engine,
            events,
            inbox: ActionInbox::bounded(DEFAULT_INBOX_CAPACITY),
            tick: TickId(0),
            pending: None,
            in_tick: false,
            done: false,
        }
    }

    /// Replace the action inbox with one of the given capacity.
    ///
    /// Senders handed out before the call stay bound to the old inbox.
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox = ActionInbox::bounded(capacity);
        self
    }

    /// Advance until the next decision or the end of the episode.
    ///
    /// `action`, if given, is queued for the current tick before anything
    /// else runs, followed by whatever is waiting in the inbox.
    pub fn step(&mut self, action: Option<Action>) -> Result<EnvStep, EnvError> {
        if self.done {
            return Err(depot_core::StepError::EpisodeFinished {
                max_tick: self.engine.max_tick(),
            }
            .into());
        }
        if let Some(action) = action {
            let event = self.events.gen_action_event(self.tick, action);
            self.events.insert_event(event)?;
        }

        loop {
            if !self.in_tick {
                self.engine.step(self.tick, &mut self.events)?;
                self.in_tick = true;
            }
            self.drain_inbox()?;
            let decisions = self.events.execute(self.tick, &mut self.engine)?;
            if let Some(decision) = decisions.last().copied() {
                self.pending = Some(decision);
                return Ok(self.outcome(Some(decision)));
            }
            if let Some(decision) = self.pending.take() {
                debug!(tick = %self.tick, decision = %decision.id, "resumed after decision");
            }
            if let Some(step) = self.finish_tick()? {
                return Ok(step);
            }
        }
    }

    /// `post_step` the current tick; advance, or report the episode end.
    fn finish_tick(&mut self) -> Result<Option<EnvStep>, EnvError> {
        let done = self.engine.post_step(self.tick)?;
        self.in_tick = false;
        if done {
            self.done = true;
            info!(tick = %self.tick, "environment episode done");
            return Ok(Some(self.outcome(None)));
        }
        self.tick = self.tick.next();
        Ok(None)
    }

    fn outcome(&self, decision: Option<DecisionEvent>) -> EnvStep {
        EnvStep {
            tick: self.tick,
            decision,
            done: self.done,
            metrics: self.engine.last_metrics().clone(),
        }
    }

    /// Queue every message waiting in the inbox for the current tick.
    ///
    /// Returns the number of actions queued.
    pub fn drain_inbox(&mut self) -> Result<usize, EnvError> {
        let messages = self.inbox.drain();
        let count = messages.len();
        for ActionMessage {
            decision_tick,
            action,
        } in messages
        {
            if decision_tick < self.tick {
                debug!(%decision_tick, tick = %self.tick, "late action applied at current tick");
            }
            let event = self.events.gen_action_event(self.tick, action);
            self.events.insert_event(event)?;
        }
        Ok(count)
    }

    /// Block up to `timeout` for the next inbox message.
    ///
    /// The returned action is not queued; pass it to [`step`](Self::step).
    pub fn wait_for_action(&self, timeout: Duration) -> Result<Option<Action>, EnvError> {
        Ok(self.inbox.recv_timeout(timeout)?.map(|m| m.action))
    }

    /// A sender for controllers answering decisions asynchronously.
    pub fn action_sender(&self) -> ActionSender {
        self.inbox.sender()
    }

    /// Reset engine, event buffer, tick counter, and inbox.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.events.reset();
        let dropped = self.inbox.drain().len();
        if dropped > 0 {
            debug!(dropped, "discarded undelivered actions on reset");
        }
        self.tick = TickId(0);
        self.pending = None;
        self.in_tick = false;
        self.done = false;
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// Current tick.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Snapshot index of the current tick.
    pub fn frame_index(&self) -> u64 {
        self.engine.frame_index(self.tick)
    }

    /// Snapshot list.
    pub fn snapshot_list(&self) -> &SnapshotList {
        self.engine.snapshots()
    }

    /// Entity id → class, owner, frame row.
    pub fn node_mapping(&self) -> &NodeMapping {
        self.engine.node_mapping()
    }

    /// Static world configuration.
    pub fn configs(&self) -> &WorldConfigs {
        self.engine.configs()
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &BusinessEngine {
        &self.engine
    }

    /// The decision waiting for an action, if any.
    pub fn pending_decision(&self) -> Option<DecisionEvent> {
        self.pending
    }

    /// Whether the episode has ended.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Point-in-time overview.
    pub fn summary(&self) -> EnvSummary {
        let snapshots = self.engine.snapshots();
        EnvSummary {
            tick: self.tick,
            frame_index: self.frame_index(),
            state: self.engine.state(),
            max_tick: self.engine.max_tick(),
            snapshots: snapshots.len(),
            snapshot_capacity: snapshots.capacity(),
            facilities: self.engine.world().facility_count(),
            units: self.engine.world().unit_count(),
            events_dispatched: self.events.dispatched(),
            awaiting_action: self.pending.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{ControlAction, FacilityId, StepError, UnitId};
    use depot_test_utils::{CallLog, RecordingUnit};
    use depot_world::{GenericFacility, WorldBuilder};

    fn env(durations: u64, action_steps: u64) -> Env {
        let mut b = WorldBuilder::new(action_steps);
        b.add_facility(Box::new(GenericFacility::new(FacilityId(1), "empty", &[])), None)
            .unwrap();
        let config = EngineConfig {
            durations,
            snapshot_resolution: 1,
            ..Default::default()
        };
        let world = b.build(config.resolved_max_snapshots()).unwrap();
        let mut events = EventBuffer::new();
        let engine = BusinessEngine::from_world(world, config, &mut events).unwrap();
        Env::from_parts(engine, events)
    }

    #[test]
    fn stops_at_each_decision_then_finishes() {
        let mut env = env(6, 3);
        let first = env.step(None).unwrap();
        assert_eq!(first.tick, TickId(0));
        assert!(first.decision.is_some());
        let second = env.step(None).unwrap();
        assert_eq!(second.tick, TickId(3));
        let last = env.step(None).unwrap();
        assert!(last.done);
        assert_eq!(last.tick, TickId(5));
        assert_eq!(env.snapshot_list().len(), 6);
        assert!(env.step(None).is_err());
    }

    #[test]
    fn inbox_actions_are_dispatched_at_current_tick() {
        let mut env = env(4, 2);
        env.step(None).unwrap();
        env.action_sender()
            .submit(
                TickId(0),
                Action::new().with(UnitId(9), ControlAction::Hold),
            )
            .unwrap();
        let next = env.step(None).unwrap();
        assert_eq!(next.tick, TickId(2));
        assert_eq!(env.summary().events_dispatched, 3);
    }

    #[test]
    fn wait_for_action_times_out_to_none() {
        let env = env(2, 1);
        assert_eq!(
            env.wait_for_action(Duration::from_millis(1)).unwrap(),
            None
        );
    }

    #[test]
    fn failed_action_leaves_the_tick_resumable() {
        let log = CallLog::new();
        let mut b = WorldBuilder::new(2);
        b.add_unit(Box::new(RecordingUnit::rejecting(UnitId(4), log.clone())), None)
            .unwrap();
        let config = EngineConfig {
            durations: 4,
            snapshot_resolution: 1,
            ..Default::default()
        };
        let world = b.build(config.resolved_max_snapshots()).unwrap();
        let mut events = EventBuffer::new();
        let engine = BusinessEngine::from_world(world, config, &mut events).unwrap();
        let mut env = Env::from_parts(engine, events);

        assert_eq!(env.step(None).unwrap().tick, TickId(0));
        let err = env
            .step(Some(Action::new().with(UnitId(4), ControlAction::Hold)))
            .unwrap_err();
        assert!(matches!(
            err,
            EnvError::Step(StepError::ActionFailed {
                unit: UnitId(4),
                ..
            })
        ));
        assert_eq!(env.tick(), TickId(0));
        assert!(env.pending_decision().is_some());
        assert_eq!(env.snapshot_list().len(), 0);

        let next = env.step(None).unwrap();
        assert_eq!(next.tick, TickId(2));
        assert!(next.decision.is_some());
        assert_eq!(env.snapshot_list().len(), 2);
        let last = env.step(None).unwrap();
        assert!(last.done);
        assert_eq!(log.set_action_count(), 1);
    }

    #[test]
    fn reset_rewinds_to_tick_zero() {
        let mut env = env(4, 2);
        env.step(None).unwrap();
        env.step(None).unwrap();
        env.reset();
        let summary = env.summary();
        assert_eq!(summary.tick, TickId(0));
        assert_eq!(summary.snapshots, 0);
        assert_eq!(summary.state, EngineState::Built);
        assert!(!summary.awaiting_action);
        assert_eq!(env.step(None).unwrap().tick, TickId(0));
    }
}
