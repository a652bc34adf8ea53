//! Control actions delivered from an external controller.
//!
//! An [`Action`] is an ordered mapping from [`UnitId`] to a
//! [`ControlAction`]. The set of control shapes is closed: each unit kind
//! accepts a subset and rejects the rest with
//! [`EntityError::UnsupportedAction`](crate::EntityError::UnsupportedAction).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::UnitId;

/// A per-unit control value.
///
/// # Examples
///
/// ```
/// use depot_core::ControlAction;
///
/// let hold = ControlAction::Hold;
/// let buy = ControlAction::Buy { quantity: 12 };
/// assert_eq!(hold.name(), "hold");
/// assert_eq!(buy.name(), "buy");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlAction {
    /// Keep the current behavior; no-op for every unit that accepts it.
    Hold,
    /// Place a purchase order for `quantity` items.
    Buy {
        /// Requested quantity.
        quantity: u32,
    },
    /// Set the production rate, in items per tick.
    Produce {
        /// Items produced per tick.
        rate: u32,
    },
    /// Ship `quantity` items to a downstream facility.
    Ship {
        /// Destination facility.
        destination: u32,
        /// Items to ship.
        quantity: u32,
    },
    /// Set a selling price.
    Price {
        /// New unit price.
        value: f32,
    },
}

impl ControlAction {
    /// Short name of the control shape, used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Buy { .. } => "buy",
            Self::Produce { .. } => "produce",
            Self::Ship { .. } => "ship",
            Self::Price { .. } => "price",
        }
    }
}

/// A batch of control actions keyed by unit.
///
/// Iteration order is insertion order, so dispatch is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action {
    entries: IndexMap<UnitId, ControlAction>,
}

impl Action {
    /// An empty action.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the control value for `unit`, replacing any previous entry.
    pub fn insert(&mut self, unit: UnitId, control: ControlAction) -> Option<ControlAction> {
        self.entries.insert(unit, control)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, unit: UnitId, control: ControlAction) -> Self {
        self.entries.insert(unit, control);
        self
    }

    /// Control value addressed to `unit`, if any.
    pub fn get(&self, unit: UnitId) -> Option<&ControlAction> {
        self.entries.get(&unit)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &ControlAction)> {
        self.entries.iter().map(|(id, a)| (*id, a))
    }

    /// Number of addressed units.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the action addresses no units.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(UnitId, ControlAction)> for Action {
    fn from_iter<I: IntoIterator<Item = (UnitId, ControlAction)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
