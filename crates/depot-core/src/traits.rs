//! Capability traits for simulated entities and their storage.
//!
//! The orchestrator only ever calls the methods declared here. What a
//! facility or unit computes inside them is its own business.

use crate::action::ControlAction;
use crate::context::{FacilityContext, UnitContext};
use crate::error::EntityError;
use crate::id::{AttributeId, FacilityId, NodeSlot, UnitHandle, UnitId};

/// Write access to the current frame.
///
/// Implemented by the frame crate; mocked in tests. Out-of-range writes
/// return `false` rather than panicking.
pub trait FrameWriter {
    /// Store `value` at `(slot, attribute)`.
    fn set(&mut self, slot: NodeSlot, attribute: AttributeId, value: f32) -> bool;

    /// Read the current value at `(slot, attribute)`.
    fn get(&self, slot: NodeSlot, attribute: AttributeId) -> Option<f32>;
}

/// Handle-based access to the unit arena.
pub trait UnitStore {
    /// Resolve a handle to the unit it points at.
    fn unit_mut(&mut self, handle: UnitHandle) -> Option<&mut dyn Unit>;
}

/// The smallest addressable, action-receiving entity.
///
/// # Contract
///
/// - `step()` must be deterministic given the same prior state and tick.
/// - `set_action()` may be called zero or more times between steps; the
///   last value wins unless the unit documents otherwise.
/// - `reset()` restores the state the unit had right after construction.
pub trait Unit: Send + 'static {
    /// Unique identifier, the key used in [`Action`](crate::Action)s.
    fn id(&self) -> UnitId;

    /// Class name from the topology (e.g. `"storage"`).
    fn class(&self) -> &str;

    /// Advance one tick.
    fn step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError>;

    /// End-of-tick bookkeeping. Default: nothing.
    fn post_step(&mut self, _ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        Ok(())
    }

    /// Apply an externally computed control value.
    fn set_action(&mut self, action: ControlAction) -> Result<(), EntityError>;

    /// Restore construction-time state.
    fn reset(&mut self);
}

/// A stepping container that owns zero or more units by handle.
///
/// Object-safe; the world stores facilities as `Box<dyn Facility>` in
/// insertion order.
pub trait Facility: Send + 'static {
    /// Unique identifier.
    fn id(&self) -> FacilityId;

    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Handles of the units this facility owns, in stepping order.
    fn units(&self) -> &[UnitHandle];

    /// Advance one tick.
    fn step(&mut self, ctx: &mut FacilityContext<'_>) -> Result<(), EntityError>;

    /// End-of-tick bookkeeping, called after the snapshot decision.
    fn post_step(&mut self, ctx: &mut FacilityContext<'_>) -> Result<(), EntityError>;

    /// Restore facility-owned state. Units are reset by the world.
    fn reset(&mut self);
}
