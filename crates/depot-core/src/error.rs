//! Error types shared across the Depot workspace.
//!
//! Organized by who raises them: entities ([`EntityError`]), the tick
//! sequencer ([`StepError`]), and the event buffer ([`EventError`]).

use thiserror::Error;

use crate::id::{FacilityId, TickId, UnitHandle, UnitId};

/// Errors raised by a facility or unit from its own capability methods.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EntityError {
    /// The unit does not accept this control shape.
    #[error("unit {unit} does not accept '{action}' actions")]
    UnsupportedAction {
        /// The addressed unit.
        unit: UnitId,
        /// Name of the rejected control shape.
        action: &'static str,
    },
    /// A facility referenced a unit handle that is not in the arena.
    #[error("unit handle {handle} is not in the arena")]
    DanglingHandle {
        /// The stale handle.
        handle: UnitHandle,
    },
    /// The entity's internal state is inconsistent.
    #[error("invalid entity state: {reason}")]
    InvalidState {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the tick sequencer (`step`, `post_step`, action dispatch).
///
/// Entity failures carry the tick and the failing entity so a replay can
/// be pointed straight at them.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StepError {
    /// The driver supplied a tick that is not previous + 1.
    #[error("tick out of order: expected {expected}, got {got}")]
    TickOutOfOrder {
        /// The tick the engine expected next.
        expected: TickId,
        /// The tick the driver supplied.
        got: TickId,
    },
    /// `step` was called while the previous tick still awaits `post_step`.
    #[error("tick {tick} was stepped but not post-stepped")]
    PostStepPending {
        /// The tick still in flight.
        tick: TickId,
    },
    /// `post_step` was called for a tick that has not been stepped.
    #[error("post_step({got}) without matching step; last stepped tick is {stepped:?}")]
    PostStepMismatch {
        /// The tick passed to `post_step`.
        got: TickId,
        /// The last tick passed to `step`, if any.
        stepped: Option<TickId>,
    },
    /// The episode has terminated; `reset()` is required.
    #[error("episode finished at max_tick {max_tick}; reset required")]
    EpisodeFinished {
        /// The episode length.
        max_tick: u64,
    },
    /// A facility failed during `step` or `post_step`.
    #[error("facility {facility} failed at tick {tick}: {source}")]
    FacilityFailed {
        /// The tick being processed.
        tick: TickId,
        /// The failing facility.
        facility: FacilityId,
        /// The underlying entity error.
        source: EntityError,
    },
    /// A unit failed while being stepped directly.
    #[error("unit {unit} failed at tick {tick}: {source}")]
    UnitFailed {
        /// The tick being processed.
        tick: TickId,
        /// The failing unit.
        unit: UnitId,
        /// The underlying entity error.
        source: EntityError,
    },
    /// A unit rejected a dispatched control action.
    #[error("unit {unit} rejected action at tick {tick}: {source}")]
    ActionFailed {
        /// The tick the action event was dispatched at.
        tick: TickId,
        /// The addressed unit.
        unit: UnitId,
        /// The underlying entity error.
        source: EntityError,
    },
    /// The event buffer refused an operation.
    #[error("event buffer: {0}")]
    Event(#[from] EventError),
}

/// Errors from the event buffer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EventError {
    /// An event was scheduled before the buffer's current tick.
    #[error("event for tick {event_tick} is behind the buffer at tick {current}")]
    InThePast {
        /// Tick the event was addressed to.
        event_tick: TickId,
        /// The buffer's current tick.
        current: TickId,
    },
    /// A handler is already registered for this event kind.
    #[error("a handler named '{existing}' is already registered for {kind}")]
    DuplicateHandler {
        /// The event kind.
        kind: String,
        /// Name of the handler already holding the kind.
        existing: String,
    },
    /// The dispatching handler does not own this event kind.
    #[error("event kind {kind} is routed to '{expected}', not '{got}'")]
    HandlerMismatch {
        /// The event kind.
        kind: String,
        /// Registered handler name.
        expected: String,
        /// Handler that was passed to dispatch.
        got: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn facility_failure_names_tick_and_entity() {
        let err = StepError::FacilityFailed {
            tick: TickId(17),
            facility: FacilityId(3),
            source: EntityError::InvalidState {
                reason: "negative stock".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("f3"), "{msg}");
        assert!(msg.contains("17"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn event_error_converts_into_step_error() {
        let err: StepError = EventError::InThePast {
            event_tick: TickId(1),
            current: TickId(4),
        }
        .into();
        assert!(matches!(err, StepError::Event(_)));
    }
}
