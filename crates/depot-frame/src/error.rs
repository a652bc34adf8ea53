//! Frame-specific error types.

use thiserror::Error;

/// Errors raised while building or addressing a frame layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Two node kinds share a name.
    #[error("node kind '{0}' is declared twice")]
    DuplicateNodeKind(String),
    /// A node kind declares the same attribute twice.
    #[error("node kind '{kind}' declares attribute '{attribute}' twice")]
    DuplicateAttribute {
        /// The node kind.
        kind: String,
        /// The repeated attribute.
        attribute: String,
    },
    /// A lookup named a node kind that is not in the layout.
    #[error("unknown node kind '{0}'")]
    UnknownNodeKind(String),
    /// A lookup named an attribute the node kind does not have.
    #[error("node kind '{kind}' has no attribute '{attribute}'")]
    UnknownAttribute {
        /// The node kind.
        kind: String,
        /// The missing attribute.
        attribute: String,
    },
    /// More node kinds or attributes than the id types can address.
    #[error("layout too large: {reason}")]
    LayoutOverflow {
        /// Which limit was exceeded.
        reason: String,
    },
    /// A snapshot list was requested with zero capacity.
    #[error("snapshot capacity must be at least 1")]
    ZeroSnapshotCapacity,
}
