//! Event, event kind, and decision marker types.

use std::fmt;

use depot_core::{Action, TickId};

/// Monotonic event identifier, unique within one buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// What an event means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// A request for an external decision. Carries no payload when generated.
    Decision,
    /// A control action arriving from the controller.
    TakeAction,
    /// Scenario-defined kinds.
    Custom(u16),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decision => write!(f, "decision"),
            Self::TakeAction => write!(f, "take_action"),
            Self::Custom(n) => write!(f, "custom({n})"),
        }
    }
}

/// A queued event.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Buffer-assigned identifier.
    pub id: EventId,
    /// Tick at which the event is due.
    pub tick: TickId,
    /// Routing key.
    pub kind: EventKind,
    /// Optional action payload. `None` means "nothing to apply".
    pub payload: Option<Action>,
}

/// A decision request handed back to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecisionEvent {
    /// Identifier of the originating event.
    pub id: EventId,
    /// Tick the decision was generated for.
    pub tick: TickId,
}
