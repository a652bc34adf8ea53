//! Tick-driven business engine for Depot supply-chain simulations.
//!
//! [`BusinessEngine`] owns a [`World`](depot_world::World) and advances it
//! one tick at a time under strict ordering: entity stepping, decision
//! events on the `action_steps` cadence, action dispatch through the
//! [`EventBuffer`](depot_event::EventBuffer), snapshots on the
//! `snapshot_resolution` cadence, and termination at `max_tick`.
//!
//! [`Env`] wraps the engine in the driver loop that stops at every
//! decision and resumes when an action arrives, either directly or through
//! the [`ActionInbox`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod business_engine;
pub mod cadence;
pub mod config;
pub mod env;
pub mod error;
pub mod inbox;
pub mod metrics;

pub use business_engine::{BusinessEngine, EngineState, ACTION_HANDLER};
pub use config::{EngineConfig, SteppingMode};
pub use env::{Env, EnvStep, EnvSummary, DEFAULT_INBOX_CAPACITY};
pub use error::{EngineError, EnvError};
pub use inbox::{ActionInbox, ActionMessage, ActionSender, InboxError};
pub use metrics::StepMetrics;
