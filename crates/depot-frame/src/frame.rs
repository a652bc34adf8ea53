//! The live frame: current entity state plus its snapshot list.

use std::sync::Arc;

use depot_core::{AttributeId, FrameWriter, NodeSlot};
use tracing::debug;

use crate::error::FrameError;
use crate::layout::FrameLayout;
use crate::snapshot::SnapshotList;

/// Dense state table for the current tick.
///
/// Entities write through [`FrameWriter`]. The orchestrator freezes the
/// table with [`take_snapshot`](Frame::take_snapshot) at the configured
/// cadence and clears it with [`reset`](Frame::reset).
#[derive(Clone, Debug)]
pub struct Frame {
    layout: Arc<FrameLayout>,
    data: Vec<f32>,
    snapshots: SnapshotList,
}

impl Frame {
    /// Allocate a zeroed frame for `layout` retaining up to `max_snapshots`.
    pub fn new(layout: FrameLayout, max_snapshots: usize) -> Result<Self, FrameError> {
        let layout = Arc::new(layout);
        let snapshots = SnapshotList::new(Arc::clone(&layout), max_snapshots)?;
        Ok(Self {
            data: vec![0.0; layout.total_len()],
            layout,
            snapshots,
        })
    }

    /// Zero the current table. Does not touch the snapshot list.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
    }

    /// Freeze the current table under `index`.
    pub fn take_snapshot(&mut self, index: u64) {
        if let Some(evicted) = self.snapshots.push(index, &self.data) {
            debug!(index, evicted, "snapshot list full, evicted oldest index");
        }
    }

    /// Snapshot store (read-only).
    pub fn snapshots(&self) -> &SnapshotList {
        &self.snapshots
    }

    /// Snapshot store (mutable, for `reset`).
    pub fn snapshots_mut(&mut self) -> &mut SnapshotList {
        &mut self.snapshots
    }

    /// Shared layout.
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Raw current table.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl FrameWriter for Frame {
    fn set(&mut self, slot: NodeSlot, attribute: AttributeId, value: f32) -> bool {
        match self.layout.offset(slot, attribute) {
            Some(o) => {
                self.data[o] = value;
                true
            }
            None => false,
        }
    }

    fn get(&self, slot: NodeSlot, attribute: AttributeId) -> Option<f32> {
        self.layout
            .offset(slot, attribute)
            .and_then(|o| self.data.get(o).copied())
    }
}
