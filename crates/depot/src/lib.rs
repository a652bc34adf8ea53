//! Depot: a discrete-event supply-chain simulation orchestrator.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Depot sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use depot::prelude::*;
//!
//! // The bundled "sample" topology: three facilities, six units.
//! let mut env = Env::new(EngineConfig {
//!     durations: 12,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut step = env.step(None).unwrap();
//! while !step.done {
//!     let action = Action::new().with(UnitId(1), ControlAction::Produce { rate: 2 });
//!     step = env.step(Some(action)).unwrap();
//! }
//! assert_eq!(step.tick, TickId(11));
//! assert_eq!(env.snapshot_list().len(), 12);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `depot-core` | IDs, actions, errors, entity traits |
//! | [`frame`] | `depot-frame` | Frame table, layout, snapshot list |
//! | [`event`] | `depot-event` | Event buffer and handler routing |
//! | [`world`] | `depot-world` | Topology parsing, entity registry, world assembly |
//! | [`engine`] | `depot-engine` | Business engine, env loop, action inbox |
//! | [`replay`] | `depot-replay` | Frame hashing and trace comparison |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`depot-core`).
///
/// Implement [`types::Facility`] and [`types::Unit`] to add entity classes.
pub use depot_core as types;

/// Frame table and snapshot store (`depot-frame`).
pub use depot_frame as frame;

/// Event buffer (`depot-event`).
pub use depot_event as event;

/// Topology configuration and world assembly (`depot-world`).
///
/// Register custom classes on a [`world::EntityRegistry`] and pass it to
/// [`engine::Env::with_registry`].
pub use depot_world as world;

/// Tick sequencing (`depot-engine`).
pub use depot_engine as engine;

/// Replay verification (`depot-replay`).
pub use depot_replay as replay;

/// Common imports for typical Depot usage.
pub mod prelude {
    // Core types and traits
    pub use depot_core::{
        Action, ControlAction, Facility, FacilityContext, FacilityId, FrameWriter, TickId, Unit,
        UnitContext, UnitHandle, UnitId,
    };

    // Errors
    pub use depot_core::{EntityError, EventError, StepError};
    pub use depot_engine::{EngineError, EnvError};
    pub use depot_world::ConfigError;

    // Frame
    pub use depot_frame::{FrameSnapshot, SnapshotList};

    // Events
    pub use depot_event::{DecisionEvent, EventBuffer, EventKind};

    // World
    pub use depot_world::{EntityRegistry, NodeMapping, World, WorldBuilder, WorldConfigs};

    // Engine
    pub use depot_engine::{
        BusinessEngine, EngineConfig, EngineState, Env, EnvStep, StepMetrics, SteppingMode,
    };

    // Replay
    pub use depot_replay::{EpisodeTrace, TickRecord};
}
