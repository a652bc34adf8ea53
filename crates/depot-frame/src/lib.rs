//! Frame state table and snapshot store for Depot simulations.
//!
//! The frame is a dense `f32` table with one block per node kind:
//!
//! ```text
//! Frame
//! ├── Arc<FrameLayout>   (node kind → attributes, row count, offset)
//! ├── data: Vec<f32>     (current tick, written by entities)
//! └── SnapshotList       (bounded, oldest index evicted first)
//!     └── FrameSnapshot[] (frozen copies keyed by snapshot index)
//! ```
//!
//! The orchestrator only calls [`Frame::reset`],
//! [`SnapshotList::reset`] and [`Frame::take_snapshot`]; everything else
//! is for entities (through [`FrameWriter`](depot_core::FrameWriter)) and
//! result extraction.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frame;
pub mod layout;
pub mod snapshot;

pub use error::FrameError;
pub use frame::Frame;
pub use layout::{FrameLayout, FrameLayoutBuilder, NodeKindDef};
pub use snapshot::{FrameSnapshot, SnapshotList};
