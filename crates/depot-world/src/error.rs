//! Construction-time errors.

use std::path::PathBuf;

use depot_core::{FacilityId, UnitHandle, UnitId};
use depot_frame::FrameError;
use thiserror::Error;

/// Errors raised while loading a topology or building a world from it.
///
/// Every variant is fatal: a world that fails to build is never returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A configuration file is not valid TOML for its schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The file that failed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The parsed topology violates a structural rule.
    #[error("invalid topology: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
    /// A facility or unit names a class that was never declared, or that
    /// has no registered constructor.
    #[error("unknown {role} class '{class}'")]
    UnknownClass {
        /// `"facility"` or `"unit"`.
        role: &'static str,
        /// The class name.
        class: String,
    },
    /// Two facilities share an id.
    #[error("facility id {0} is used twice")]
    DuplicateFacility(FacilityId),
    /// Two units share an id.
    #[error("unit id {0} is used twice")]
    DuplicateUnit(UnitId),
    /// A facility was handed a unit handle the arena does not hold.
    #[error("facility {facility} owns unknown unit handle {handle}")]
    DanglingHandle {
        /// The facility.
        facility: FacilityId,
        /// The stale handle.
        handle: UnitHandle,
    },
    /// Frame layout or snapshot store construction failed.
    #[error("frame: {0}")]
    Frame(#[from] FrameError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn io_error_names_the_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("topologies/sample/config.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("topologies/sample/config.toml"));
        assert!(err.source().is_some());
    }

    #[test]
    fn frame_errors_convert() {
        let err: ConfigError = FrameError::ZeroSnapshotCapacity.into();
        assert!(matches!(err, ConfigError::Frame(_)));
    }
}
