//! Strongly-typed identifiers for ticks, entities, and frame slots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing tick counter.
///
/// The sole unit of simulated time. The driver supplies the tick on every
/// call; the engine never advances it on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickId(pub u64);

impl TickId {
    /// The tick that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a facility within a world.
///
/// Assigned by the scenario configuration; unique across facilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(pub u32);

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

impl From<u32> for FacilityId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an addressable unit. This is the key space of an [`Action`](crate::Action).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

impl From<u32> for UnitId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Index of a unit inside the world's unit arena.
///
/// Facilities and the id index hold handles, never references, so the
/// entity graph has a single owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitHandle(pub u32);

impl UnitHandle {
    /// The arena slot this handle points at.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies a node kind (a table) in the frame layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKindId(pub u16);

impl fmt::Display for NodeKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies an attribute (a column) within a node kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(pub u16);

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row in the frame: node kind plus the instance index within that kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeSlot {
    /// The node kind (table).
    pub kind: NodeKindId,
    /// Row within the node kind.
    pub index: u32,
}

impl NodeSlot {
    /// Construct a slot.
    pub fn new(kind: NodeKindId, index: u32) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for NodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.index)
    }
}
