//! Core types and traits for the Depot simulation orchestrator.
//!
//! This is the leaf crate of the workspace. It defines the identifiers,
//! the closed set of control actions, the error taxonomy, and the
//! capability traits ([`Facility`], [`Unit`]) that every simulated
//! entity implements.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod context;
pub mod error;
pub mod id;
pub mod traits;

pub use action::{Action, ControlAction};
pub use context::{FacilityContext, UnitContext};
pub use error::{EntityError, EventError, StepError};
pub use id::{AttributeId, FacilityId, NodeKindId, NodeSlot, TickId, UnitHandle, UnitId};
pub use traits::{Facility, FrameWriter, Unit, UnitStore};
