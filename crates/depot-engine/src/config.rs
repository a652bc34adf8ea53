//! Engine configuration and validation.
//!
//! [`EngineConfig`] is an immutable value handed to
//! [`BusinessEngine::new`](crate::BusinessEngine::new). Nothing about an
//! engine is configured through globals.

use std::path::PathBuf;

use crate::cadence;
use crate::error::EngineError;

// ── SteppingMode ───────────────────────────────────────────────────

/// How entities are stepped each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SteppingMode {
    /// Step every facility in insertion order; facilities step their units.
    #[default]
    ByFacility,
    /// Step every unit directly in an order shuffled per tick.
    ///
    /// The shuffle is seeded with `seed ^ tick`, so the order is random
    /// across ticks but identical on replay.
    ByUnit {
        /// Base seed.
        seed: u64,
    },
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Construction-time engine settings.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Scenario directory name under `config_root`.
    pub topology: String,
    /// Directory holding `core.toml` and one subdirectory per topology.
    pub config_root: PathBuf,
    /// Episode length in ticks (`max_tick`). Must be at least 1.
    pub durations: u64,
    /// Take a snapshot every this many ticks. Must be at least 1.
    pub snapshot_resolution: u64,
    /// Snapshot list capacity. `None` = `ceil(durations / snapshot_resolution)`.
    pub max_snapshots: Option<usize>,
    /// Entity stepping order.
    pub stepping: SteppingMode,
    /// Reject out-of-order `step`/`post_step` calls. Default: `true`.
    pub strict_tick_order: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            topology: "sample".into(),
            config_root: Self::default_config_root(),
            durations: 100,
            snapshot_resolution: 1,
            max_snapshots: None,
            stepping: SteppingMode::default(),
            strict_tick_order: true,
        }
    }
}

impl EngineConfig {
    /// The `topologies/` directory shipped with this crate.
    pub fn default_config_root() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/topologies"))
    }

    /// Snapshot list capacity after applying the default.
    pub fn resolved_max_snapshots(&self) -> usize {
        self.max_snapshots
            .unwrap_or_else(|| cadence::calc_max_snapshots(self.durations, self.snapshot_resolution))
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.durations == 0 {
            return Err(invalid("durations must be at least 1"));
        }
        if self.snapshot_resolution == 0 {
            return Err(invalid("snapshot_resolution must be at least 1"));
        }
        if self.max_snapshots == Some(0) {
            return Err(invalid("max_snapshots must be at least 1 when set"));
        }
        if self.topology.is_empty() {
            return Err(invalid("topology name is empty"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> EngineError {
    EngineError::InvalidConfig {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EngineConfig::default();
        cfg.validate().unwrap();
        assert!(cfg.strict_tick_order);
        assert_eq!(cfg.stepping, SteppingMode::ByFacility);
        assert!(cfg.config_root.ends_with("topologies"));
    }

    #[test]
    fn zero_values_are_rejected() {
        for cfg in [
            EngineConfig {
                durations: 0,
                ..Default::default()
            },
            EngineConfig {
                snapshot_resolution: 0,
                ..Default::default()
            },
            EngineConfig {
                max_snapshots: Some(0),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                cfg.validate(),
                Err(EngineError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn max_snapshots_defaults_to_ceiling() {
        let cfg = EngineConfig {
            durations: 21,
            snapshot_resolution: 5,
            ..Default::default()
        };
        assert_eq!(cfg.resolved_max_snapshots(), 5);
        let cfg = EngineConfig {
            max_snapshots: Some(2),
            ..cfg
        };
        assert_eq!(cfg.resolved_max_snapshots(), 2);
    }
}
