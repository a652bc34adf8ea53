//! Engine and driver error types.

use depot_core::{EventError, StepError};
use depot_world::ConfigError;
use thiserror::Error;

use crate::inbox::InboxError;

/// Errors raised while constructing a [`BusinessEngine`](crate::BusinessEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// An [`EngineConfig`](crate::EngineConfig) field is out of range.
    #[error("invalid engine config: {reason}")]
    InvalidConfig {
        /// Which field and why.
        reason: String,
    },
    /// The topology could not be loaded or the world could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The action handler could not be registered.
    #[error("event registration: {0}")]
    Event(#[from] EventError),
}

/// Errors surfaced by [`Env`](crate::Env).
#[derive(Debug, Error)]
pub enum EnvError {
    /// Construction failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// A tick failed.
    #[error(transparent)]
    Step(#[from] StepError),
    /// An action could not be queued.
    #[error("event buffer: {0}")]
    Event(#[from] EventError),
    /// The action inbox failed.
    #[error(transparent)]
    Inbox(#[from] InboxError),
}
