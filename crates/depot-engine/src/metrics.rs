//! Per-tick engine metrics.
//!
//! [`StepMetrics`] is reset at the start of every `step()` and filled in
//! as the tick progresses through action dispatch and `post_step()`.

use depot_core::TickId;

/// Timing and counters for a single tick.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// The tick these metrics describe.
    pub tick: TickId,
    /// Wall-clock time of entity stepping in `step()`.
    pub step_us: u64,
    /// Wall-clock time of `post_step()`, snapshot included.
    pub post_step_us: u64,
    /// Decision events emitted (0 or 1).
    pub decision_events: u32,
    /// Snapshot index taken in `post_step()`, if any.
    pub snapshot_index: Option<u64>,
    /// Action entries applied to a unit.
    pub actions_applied: u32,
    /// Action entries addressed to unknown units.
    pub actions_skipped: u32,
    /// Cumulative snapshot evictions since the last reset.
    pub snapshot_evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.tick, TickId(0));
        assert_eq!(m.step_us, 0);
        assert_eq!(m.decision_events, 0);
        assert_eq!(m.snapshot_index, None);
        assert_eq!(m.actions_applied + m.actions_skipped, 0);
    }
}
