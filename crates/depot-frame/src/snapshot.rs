//! Bounded store of frozen frame copies keyed by snapshot index.
//!
//! [`SnapshotList`] keeps at most `capacity` snapshots. Indices arrive in
//! increasing order during an episode; taking an index that is already
//! stored overwrites it in place, and pushing past capacity evicts the
//! oldest index.

use std::collections::VecDeque;
use std::sync::Arc;

use depot_core::{AttributeId, NodeKindId, NodeSlot};

use crate::error::FrameError;
use crate::layout::FrameLayout;

/// A frozen copy of the frame at one snapshot index.
#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    index: u64,
    layout: Arc<FrameLayout>,
    data: Vec<f32>,
}

impl FrameSnapshot {
    /// The snapshot index this copy was taken under.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Value at `(slot, attribute)`.
    pub fn get(&self, slot: NodeSlot, attribute: AttributeId) -> Option<f32> {
        self.layout
            .offset(slot, attribute)
            .and_then(|o| self.data.get(o).copied())
    }

    /// The raw table, laid out per [`FrameLayout`].
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Layout this snapshot was taken with.
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }
}

/// Fixed-capacity list of [`FrameSnapshot`]s.
#[derive(Clone, Debug)]
pub struct SnapshotList {
    layout: Arc<FrameLayout>,
    entries: VecDeque<FrameSnapshot>,
    capacity: usize,
    evictions: u64,
}

impl SnapshotList {
    /// Create an empty list holding at most `capacity` snapshots.
    pub fn new(layout: Arc<FrameLayout>, capacity: usize) -> Result<Self, FrameError> {
        if capacity == 0 {
            return Err(FrameError::ZeroSnapshotCapacity);
        }
        Ok(Self {
            layout,
            entries: VecDeque::with_capacity(capacity),
            capacity,
            evictions: 0,
        })
    }

    /// Store a copy of `data` under `index`.
    ///
    /// Returns the evicted snapshot index, if the push displaced one.
    pub(crate) fn push(&mut self, index: u64, data: &[f32]) -> Option<u64> {
        if let Some(existing) = self.entries.iter_mut().rev().find(|s| s.index == index) {
            existing.data.clear();
            existing.data.extend_from_slice(data);
            return None;
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.evictions += 1;
            self.entries.pop_front().map(|s| s.index)
        } else {
            None
        };
        self.entries.push_back(FrameSnapshot {
            index,
            layout: Arc::clone(&self.layout),
            data: data.to_vec(),
        });
        evicted
    }

    /// Drop every stored snapshot. Capacity is unchanged.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.evictions = 0;
    }

    /// Snapshot stored under `index`.
    pub fn get(&self, index: u64) -> Option<&FrameSnapshot> {
        self.entries.iter().find(|s| s.index == index)
    }

    /// Most recently taken snapshot.
    pub fn latest(&self) -> Option<&FrameSnapshot> {
        self.entries.back()
    }

    /// Stored indices, oldest first.
    pub fn indices(&self) -> Vec<u64> {
        self.entries.iter().map(|s| s.index).collect()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot has been taken since the last reset.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of snapshots retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshots evicted since the last reset.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Read one attribute of every row of `kind` across `indices`.
    ///
    /// The result is `indices.len() * rows` values, index-major. Indices
    /// with no stored snapshot contribute zeros so the output shape never
    /// depends on eviction.
    pub fn query(
        &self,
        indices: &[u64],
        kind: NodeKindId,
        attribute: AttributeId,
    ) -> Result<Vec<f32>, FrameError> {
        let def = self
            .layout
            .def(kind)
            .ok_or_else(|| FrameError::UnknownNodeKind(format!("#{}", kind.0)))?;
        if attribute.0 as usize >= def.attributes.len() {
            return Err(FrameError::UnknownAttribute {
                kind: def.name.clone(),
                attribute: format!("#{}", attribute.0),
            });
        }
        let rows = def.rows;
        let mut out = Vec::with_capacity(indices.len() * rows as usize);
        for &index in indices {
            match self.get(index) {
                Some(snap) => {
                    for row in 0..rows {
                        out.push(snap.get(NodeSlot::new(kind, row), attribute).unwrap_or(0.0));
                    }
                }
                None => out.extend(std::iter::repeat(0.0).take(rows as usize)),
            }
        }
        Ok(out)
    }
}
