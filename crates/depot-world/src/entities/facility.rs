use smallvec::SmallVec;

use depot_core::{
    AttributeId, EntityError, Facility, FacilityContext, FacilityId, NodeSlot, UnitHandle,
};

use super::write;
use crate::registry::FacilitySpec;

/// Steps its units in declaration order and counts its own ticks.
///
/// If the facility class declares a `ticks` column, the count is written
/// there every step. `post_step` runs every unit's `post_step`, which is
/// where the reference units clear their per-tick flows.
#[derive(Clone, Debug)]
pub struct GenericFacility {
    id: FacilityId,
    name: String,
    units: SmallVec<[UnitHandle; 4]>,
    ticks_cell: Option<(NodeSlot, AttributeId)>,
    ticks: u64,
}

impl GenericFacility {
    /// Build from a topology entry.
    pub fn from_spec(spec: FacilitySpec<'_>) -> Self {
        Self {
            id: spec.id,
            name: spec.name.to_string(),
            ticks_cell: spec.attribute("ticks").map(|col| (spec.slot, col)),
            units: spec.units,
            ticks: 0,
        }
    }

    /// A facility with no frame row, for hand-built worlds.
    pub fn new(id: FacilityId, name: impl Into<String>, units: &[UnitHandle]) -> Self {
        Self {
            id,
            name: name.into(),
            units: SmallVec::from_slice(units),
            ticks_cell: None,
            ticks: 0,
        }
    }

    /// Steps taken since the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Facility for GenericFacility {
    fn id(&self) -> FacilityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> &[UnitHandle] {
        &self.units
    }

    fn step(&mut self, ctx: &mut FacilityContext<'_>) -> Result<(), EntityError> {
        self.ticks += 1;
        if let Some((slot, col)) = self.ticks_cell {
            write(ctx.frame(), slot, col, self.ticks as f32)?;
        }
        for &handle in &self.units {
            ctx.step_unit(handle)?;
        }
        Ok(())
    }

    fn post_step(&mut self, ctx: &mut FacilityContext<'_>) -> Result<(), EntityError> {
        for &handle in &self.units {
            ctx.post_step_unit(handle)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.ticks = 0;
    }
}
