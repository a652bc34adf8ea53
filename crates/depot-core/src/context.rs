//! Execution contexts passed to entities during a tick.
//!
//! [`FacilityContext`] splits the world into the unit arena and the frame
//! so a facility can step the units it owns while they write state.

use crate::error::EntityError;
use crate::id::{TickId, UnitHandle};
use crate::traits::{FrameWriter, UnitStore};

/// Context handed to [`Unit::step`](crate::Unit::step) and
/// [`Unit::post_step`](crate::Unit::post_step).
pub struct UnitContext<'a> {
    tick: TickId,
    frame: &'a mut dyn FrameWriter,
}

impl<'a> UnitContext<'a> {
    /// Construct a unit context. Usually called by [`FacilityContext`]
    /// or the engine; tests build one over a mock frame.
    pub fn new(tick: TickId, frame: &'a mut dyn FrameWriter) -> Self {
        Self { tick, frame }
    }

    /// The tick being processed.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Mutable frame access.
    pub fn frame(&mut self) -> &mut dyn FrameWriter {
        self.frame
    }
}

/// Context handed to [`Facility::step`](crate::Facility::step) and
/// [`Facility::post_step`](crate::Facility::post_step).
pub struct FacilityContext<'a> {
    tick: TickId,
    units: &'a mut dyn UnitStore,
    frame: &'a mut dyn FrameWriter,
}

impl<'a> FacilityContext<'a> {
    /// Construct a facility context over the unit arena and the frame.
    pub fn new(tick: TickId, units: &'a mut dyn UnitStore, frame: &'a mut dyn FrameWriter) -> Self {
        Self { tick, units, frame }
    }

    /// The tick being processed.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Mutable frame access.
    pub fn frame(&mut self) -> &mut dyn FrameWriter {
        self.frame
    }

    /// Step one owned unit.
    pub fn step_unit(&mut self, handle: UnitHandle) -> Result<(), EntityError> {
        let unit = self
            .units
            .unit_mut(handle)
            .ok_or(EntityError::DanglingHandle { handle })?;
        let mut ctx = UnitContext::new(self.tick, &mut *self.frame);
        unit.step(&mut ctx)
    }

    /// Run end-of-tick bookkeeping on one owned unit.
    pub fn post_step_unit(&mut self, handle: UnitHandle) -> Result<(), EntityError> {
        let unit = self
            .units
            .unit_mut(handle)
            .ok_or(EntityError::DanglingHandle { handle })?;
        let mut ctx = UnitContext::new(self.tick, &mut *self.frame);
        unit.post_step(&mut ctx)
    }
}
