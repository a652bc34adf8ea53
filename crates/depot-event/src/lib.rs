//! Tick-addressed event buffer for Depot simulations.
//!
//! The buffer queues [`Event`]s by tick and dispatches them at
//! [`EventBuffer::execute`]. Routing is an explicit table from
//! [`EventKind`] to a handler name, filled once when the orchestrator is
//! built. Decision events are never routed to a handler: they are handed
//! back to the driver, which owns the round trip to the controller.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod event;

pub use buffer::{EventBuffer, EventHandler};
pub use event::{DecisionEvent, Event, EventId, EventKind};
