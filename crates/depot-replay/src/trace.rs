//! Per-tick episode traces and their comparison.
//!
//! A trace records, for every tick, whether a decision was raised, which
//! snapshot index (if any) was taken, and a hash of the frame after the
//! tick completed. Two runs of the same topology, seed, and action
//! sequence must produce identical traces.

use depot_core::TickId;
use depot_frame::FrameLayout;

use crate::error::ReplayError;
use crate::hash::frame_hash;

/// What one tick produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickRecord {
    /// The tick.
    pub tick: TickId,
    /// Whether a decision event was raised.
    pub decision: bool,
    /// Snapshot index written during the tick.
    pub snapshot: Option<u64>,
    /// [`frame_hash`] after `post_step`.
    pub frame_hash: u64,
}

impl TickRecord {
    /// Capture a record, hashing `data` under `layout`.
    pub fn capture(
        tick: TickId,
        decision: bool,
        snapshot: Option<u64>,
        layout: &FrameLayout,
        data: &[f32],
    ) -> Self {
        Self {
            tick,
            decision,
            snapshot,
            frame_hash: frame_hash(layout, data),
        }
    }
}

/// First point at which two traces disagree.
///
/// A `None` side means that trace ended before `position`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    /// Record position in the traces.
    pub position: usize,
    /// Tick of the first differing record.
    pub tick: TickId,
    /// Record from the reference trace.
    pub recorded: Option<TickRecord>,
    /// Record from the trace under test.
    pub replayed: Option<TickRecord>,
}

/// Ordered sequence of [`TickRecord`]s for one episode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpisodeTrace {
    records: Vec<TickRecord>,
}

impl EpisodeTrace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Ticks must be strictly increasing.
    pub fn record(&mut self, record: TickRecord) -> Result<(), ReplayError> {
        if let Some(last) = self.records.last() {
            if record.tick <= last.tick {
                return Err(ReplayError::OutOfOrder {
                    last: last.tick,
                    got: record.tick,
                });
            }
        }
        self.records.push(record);
        Ok(())
    }

    /// All records, in tick order.
    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ticks at which a decision was raised.
    pub fn decision_ticks(&self) -> Vec<TickId> {
        self.records
            .iter()
            .filter(|r| r.decision)
            .map(|r| r.tick)
            .collect()
    }

    /// Snapshot indices written, in tick order.
    pub fn snapshot_indices(&self) -> Vec<u64> {
        self.records.iter().filter_map(|r| r.snapshot).collect()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// First divergence between `self` (reference) and `replayed`.
    pub fn compare(&self, replayed: &EpisodeTrace) -> Option<Divergence> {
        let longest = self.records.len().max(replayed.records.len());
        (0..longest).find_map(|position| {
            let recorded = self.records.get(position).copied();
            let other = replayed.records.get(position).copied();
            if recorded == other {
                return None;
            }
            let tick = recorded.or(other).map(|r| r.tick).unwrap_or_default();
            Some(Divergence {
                position,
                tick,
                recorded,
                replayed: other,
            })
        })
    }

    /// Like [`compare`](Self::compare), as a `Result`.
    pub fn verify(&self, replayed: &EpisodeTrace) -> Result<(), ReplayError> {
        match self.compare(replayed) {
            Some(d) => Err(ReplayError::Diverged(Box::new(d))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(tick: u64, hash: u64) -> TickRecord {
        TickRecord {
            tick: TickId(tick),
            decision: tick % 5 == 0,
            snapshot: Some(tick),
            frame_hash: hash,
        }
    }

    #[test]
    fn record_rejects_non_increasing_ticks() {
        let mut t = EpisodeTrace::new();
        t.record(rec(0, 1)).unwrap();
        t.record(rec(3, 1)).unwrap();
        assert_eq!(
            t.record(rec(3, 1)),
            Err(ReplayError::OutOfOrder {
                last: TickId(3),
                got: TickId(3)
            })
        );
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn compare_reports_first_hash_difference() {
        let mut a = EpisodeTrace::new();
        let mut b = EpisodeTrace::new();
        for tick in 0..6 {
            a.record(rec(tick, tick)).unwrap();
            b.record(rec(tick, if tick >= 2 { 99 } else { tick })).unwrap();
        }
        let d = a.compare(&b).unwrap();
        assert_eq!(d.position, 2);
        assert_eq!(d.tick, TickId(2));
        assert_eq!(d.replayed.map(|r| r.frame_hash), Some(99));
        assert!(matches!(a.verify(&b), Err(ReplayError::Diverged(_))));
    }

    #[test]
    fn shorter_replay_diverges_at_its_end() {
        let mut a = EpisodeTrace::new();
        let mut b = EpisodeTrace::new();
        for tick in 0..4 {
            a.record(rec(tick, 0)).unwrap();
        }
        b.record(rec(0, 0)).unwrap();
        let d = a.compare(&b).unwrap();
        assert_eq!(d.position, 1);
        assert_eq!(d.tick, TickId(1));
        assert!(d.replayed.is_none());
    }

    #[test]
    fn filters_decisions_and_snapshots() {
        let mut t = EpisodeTrace::new();
        for tick in 0..11 {
            t.record(TickRecord {
                snapshot: (tick % 2 == 1).then_some(tick / 2),
                ..rec(tick, 0)
            })
            .unwrap();
        }
        assert_eq!(t.decision_ticks(), vec![TickId(0), TickId(5), TickId(10)]);
        assert_eq!(t.snapshot_indices(), vec![0, 1, 2, 3, 4]);
    }

    proptest! {
        #[test]
        fn identical_traces_never_diverge(hashes in proptest::collection::vec(any::<u64>(), 0..40)) {
            let mut a = EpisodeTrace::new();
            for (tick, h) in hashes.iter().enumerate() {
                a.record(rec(tick as u64, *h)).unwrap();
            }
            let b = a.clone();
            prop_assert!(a.compare(&b).is_none());
            prop_assert!(a.verify(&b).is_ok());
        }
    }
}
