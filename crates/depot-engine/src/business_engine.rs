//! The business engine: per-tick orchestration of the world.
//!
//! # Tick lifecycle
//!
//! ```text
//! step(t)       facilities step in insertion order (or units, shuffled)
//!               decision event inserted iff t % action_steps == 0
//! (dispatch)    EventBuffer::execute routes TakeAction events here
//! post_step(t)  snapshot frame_index(t) iff (t + 1) % resolution == 0
//!               facilities post_step in insertion order
//!               returns t + 1 == max_tick
//! ```
//!
//! The engine does not own the tick counter or the event buffer. The
//! driver supplies both on every call, which keeps the action handler a
//! plain `&mut self` method with no shared ownership.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use depot_core::{StepError, TickId, UnitId};
use depot_event::{Event, EventBuffer, EventHandler, EventKind};
use depot_frame::{Frame, SnapshotList};
use depot_world::{ConfigParser, EntityRegistry, NodeMapping, World, WorldConfigs};

use crate::cadence;
use crate::config::{EngineConfig, SteppingMode};
use crate::error::EngineError;
use crate::metrics::StepMetrics;

/// Handler name the engine registers for [`EventKind::TakeAction`].
pub const ACTION_HANDLER: &str = "business_engine";

/// Observable engine lifecycle state.
///
/// Construction either yields a `Built` engine or an error, and `reset()`
/// completes synchronously, so no other state is ever visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed or freshly reset; no tick stepped yet.
    Built,
    /// At least one tick stepped, episode not finished.
    Running,
    /// `post_step` reported the last tick. Only `reset()` leaves this state.
    Terminated,
}

/// Drives a [`World`] one tick at a time.
pub struct BusinessEngine {
    world: World,
    config: EngineConfig,
    state: EngineState,
    last_stepped: Option<TickId>,
    last_post_stepped: Option<TickId>,
    unit_order: Vec<UnitId>,
    metrics: StepMetrics,
}

impl BusinessEngine {
    /// Load the configured topology, build the world with the reference
    /// entities, and register the action handler on `events`.
    pub fn new(config: EngineConfig, events: &mut EventBuffer) -> Result<Self, EngineError> {
        Self::with_registry(config, &EntityRegistry::with_builtins(), events)
    }

    /// Like [`new`](Self::new) with a caller-supplied entity registry.
    pub fn with_registry(
        config: EngineConfig,
        registry: &EntityRegistry,
        events: &mut EventBuffer,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let parser = ConfigParser::for_topology(&config.config_root, &config.topology);
        let topology = parser.parse()?;
        let world = World::build_with(&topology, config.resolved_max_snapshots(), registry)?;
        Self::from_world(world, config, events)
    }

    /// Wrap an already built world.
    ///
    /// The world's snapshot capacity is used as is; `config.max_snapshots`
    /// and the topology fields are ignored.
    pub fn from_world(
        world: World,
        config: EngineConfig,
        events: &mut EventBuffer,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        events.register_event_handler(EventKind::TakeAction, ACTION_HANDLER)?;
        info!(
            topology = %config.topology,
            facilities = world.facility_count(),
            units = world.unit_count(),
            max_tick = config.durations,
            action_steps = world.configs().action_steps,
            snapshot_resolution = config.snapshot_resolution,
            "business engine built"
        );
        let unit_order = Vec::with_capacity(world.unit_count());
        Ok(Self {
            world,
            config,
            state: EngineState::Built,
            last_stepped: None,
            last_post_stepped: None,
            unit_order,
            metrics: StepMetrics::default(),
        })
    }

    // ── Tick lifecycle ─────────────────────────────────────────────

    /// Step every entity for `tick` and emit a decision event on cadence.
    pub fn step(&mut self, tick: TickId, events: &mut EventBuffer) -> Result<(), StepError> {
        self.check_step(tick)?;
        self.metrics = StepMetrics {
            tick,
            snapshot_evictions: self.metrics.snapshot_evictions,
            ..StepMetrics::default()
        };

        let started = Instant::now();
        match self.config.stepping {
            SteppingMode::ByFacility => self.world.step_facilities(tick)?,
            SteppingMode::ByUnit { seed } => self.step_units(tick, seed)?,
        }
        self.metrics.step_us = started.elapsed().as_micros() as u64;

        if cadence::is_decision_tick(tick, self.world.configs().action_steps) {
            let event = events.gen_decision_event(tick, None);
            debug!(%tick, event = %event.id, "decision event");
            events.insert_event(event)?;
            self.metrics.decision_events = 1;
        }

        self.last_stepped = Some(tick);
        self.state = EngineState::Running;
        Ok(())
    }

    /// Finish `tick`: snapshot on cadence, then facility `post_step`.
    ///
    /// Returns `true` iff `tick` is the last tick of the episode.
    pub fn post_step(&mut self, tick: TickId) -> Result<bool, StepError> {
        if self.config.strict_tick_order
            && (self.last_stepped != Some(tick) || self.last_post_stepped == Some(tick))
        {
            return Err(StepError::PostStepMismatch {
                got: tick,
                stepped: self.last_stepped,
            });
        }

        let started = Instant::now();
        let resolution = self.config.snapshot_resolution;
        if cadence::is_snapshot_tick(tick, resolution) {
            let index = cadence::frame_index(tick, resolution);
            debug!(%tick, index, "taking snapshot");
            self.world.frame_mut().take_snapshot(index);
            self.metrics.snapshot_index = Some(index);
        }
        self.world.post_step_facilities(tick)?;
        self.metrics.post_step_us = started.elapsed().as_micros() as u64;
        self.metrics.snapshot_evictions = self.world.frame().snapshots().evictions();
        self.last_post_stepped = Some(tick);

        let done = cadence::is_episode_done(tick, self.config.durations);
        if done {
            self.state = EngineState::Terminated;
            info!(%tick, snapshots = self.snapshots().len(), "episode finished");
        }
        Ok(done)
    }

    /// Restore construction-time state. Idempotent.
    pub fn reset(&mut self) {
        self.world.reset();
        self.state = EngineState::Built;
        self.last_stepped = None;
        self.last_post_stepped = None;
        self.metrics = StepMetrics::default();
        info!("business engine reset");
    }

    fn check_step(&self, tick: TickId) -> Result<(), StepError> {
        if self.state == EngineState::Terminated {
            return Err(StepError::EpisodeFinished {
                max_tick: self.config.durations,
            });
        }
        if !self.config.strict_tick_order {
            return Ok(());
        }
        if tick.0 >= self.config.durations {
            return Err(StepError::EpisodeFinished {
                max_tick: self.config.durations,
            });
        }
        if let Some(stepped) = self.last_stepped {
            if self.last_post_stepped != Some(stepped) {
                return Err(StepError::PostStepPending { tick: stepped });
            }
        }
        let expected = self.last_stepped.map_or(TickId(0), TickId::next);
        if tick != expected {
            return Err(StepError::TickOutOfOrder {
                expected,
                got: tick,
            });
        }
        Ok(())
    }

    fn step_units(&mut self, tick: TickId, seed: u64) -> Result<(), StepError> {
        let Self {
            world, unit_order, ..
        } = self;
        unit_order.clear();
        unit_order.extend(world.unit_ids());
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ tick.0);
        unit_order.shuffle(&mut rng);
        for &id in unit_order.iter() {
            world.step_unit(id, tick)?;
        }
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The live frame.
    pub fn frame(&self) -> &Frame {
        self.world.frame()
    }

    /// The snapshot list.
    pub fn snapshots(&self) -> &SnapshotList {
        self.world.frame().snapshots()
    }

    /// Static world configuration.
    pub fn configs(&self) -> &WorldConfigs {
        self.world.configs()
    }

    /// Entity id → class, owner, frame row.
    pub fn node_mapping(&self) -> &NodeMapping {
        self.world.node_mapping()
    }

    /// The world, read-only.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Metrics of the most recent tick.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.metrics
    }

    /// Snapshot index of `tick`.
    pub fn frame_index(&self, tick: TickId) -> u64 {
        cadence::frame_index(tick, self.config.snapshot_resolution)
    }

    /// Episode length in ticks.
    pub fn max_tick(&self) -> u64 {
        self.config.durations
    }
}

impl EventHandler for BusinessEngine {
    fn handler_name(&self) -> &str {
        ACTION_HANDLER
    }

    fn on_event(&mut self, event: &Event) -> Result<(), StepError> {
        let Some(action) = &event.payload else {
            return Ok(());
        };
        for (unit_id, control) in action.iter() {
            match self.world.unit_mut(unit_id) {
                Some(unit) => {
                    unit.set_action(control.clone())
                        .map_err(|source| StepError::ActionFailed {
                            tick: event.tick,
                            unit: unit_id,
                            source,
                        })?;
                    self.metrics.actions_applied += 1;
                }
                None => {
                    self.metrics.actions_skipped += 1;
                    warn!(tick = %event.tick, unit = %unit_id, "action for unknown unit skipped");
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for BusinessEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessEngine")
            .field("state", &self.state)
            .field("last_stepped", &self.last_stepped)
            .field("world", &self.world)
            .finish()
    }
}
