//! Replay verification for Depot simulations.
//!
//! Record an [`EpisodeTrace`] while driving an engine, replay the same
//! topology and actions, and [`EpisodeTrace::compare`] the two. Frame
//! contents are compared by FNV-1a hash ([`frame_hash`]), so a trace is a
//! few words per tick regardless of world size.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod hash;
pub mod trace;

pub use error::ReplayError;
pub use hash::{frame_hash, snapshot_hash, snapshot_list_hash};
pub use trace::{Divergence, EpisodeTrace, TickRecord};
