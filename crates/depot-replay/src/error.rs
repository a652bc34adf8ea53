//! Error types for trace recording and comparison.

use depot_core::TickId;
use thiserror::Error;

use crate::trace::Divergence;

/// Errors from [`EpisodeTrace`](crate::EpisodeTrace).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ReplayError {
    /// A record was appended with a tick not after the previous one.
    #[error("trace tick {got} recorded after tick {last}")]
    OutOfOrder {
        /// Tick of the last stored record.
        last: TickId,
        /// Tick of the rejected record.
        got: TickId,
    },
    /// Two traces differ.
    #[error("replay diverged at tick {}", .0.tick)]
    Diverged(Box<Divergence>),
}
