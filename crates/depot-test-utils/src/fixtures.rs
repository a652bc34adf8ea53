//! Reusable entity fixtures.
//!
//! - [`RecordingFacility`]: logs every call, steps its units, and marks a
//!   frame cell with the phase it last ran.
//! - [`RecordingUnit`]: logs every call; can be told to reject actions.
//! - [`FailingFacility`]: fails `step` at a chosen tick.

use depot_core::{
    AttributeId, ControlAction, EntityError, Facility, FacilityContext, FacilityId, NodeSlot,
    TickId, Unit, UnitContext, UnitHandle, UnitId,
};
use depot_world::{ConfigError, World, WorldBuilder};

use crate::{Call, CallLog};

/// Node kind holding one phase row per recording facility.
pub const PHASE_KIND: &str = "phase";
/// The single attribute of [`PHASE_KIND`].
pub const PHASE_ATTR: &str = "phase";
/// Phase cell value after `step`.
pub const PHASE_STEPPED: f32 = 1.0;
/// Phase cell value after `post_step`.
pub const PHASE_POST_STEPPED: f32 = 2.0;

// ── RecordingFacility ──────────────────────────────────────────────

pub struct RecordingFacility {
    id: FacilityId,
    name: String,
    units: Vec<UnitHandle>,
    log: CallLog,
    phase_cell: Option<(NodeSlot, AttributeId)>,
}

impl RecordingFacility {
    pub fn new(id: FacilityId, units: Vec<UnitHandle>, log: CallLog) -> Self {
        Self {
            id,
            name: format!("recording-{}", id.0),
            units,
            log,
            phase_cell: None,
        }
    }

    /// Write [`PHASE_STEPPED`] / [`PHASE_POST_STEPPED`] to this cell.
    pub fn with_phase_cell(mut self, slot: NodeSlot, attribute: AttributeId) -> Self {
        self.phase_cell = Some((slot, attribute));
        self
    }

    fn mark(&self, ctx: &mut FacilityContext<'_>, phase: f32) {
        if let Some((slot, attr)) = self.phase_cell {
            ctx.frame().set(slot, attr, phase);
        }
    }
}

impl Facility for RecordingFacility {
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
        self.log.record(Call::FacilityStep {
            facility: self.id,
            tick: ctx.tick(),
        });
        self.mark(ctx, PHASE_STEPPED);
        for &h in &self.units {
            ctx.step_unit(h)?;
        }
        Ok(())
    }

    fn post_step(&mut self, ctx: &mut FacilityContext<'_>) -> Result<(), EntityError> {
        self.log.record(Call::FacilityPostStep {
            facility: self.id,
            tick: ctx.tick(),
        });
        self.mark(ctx, PHASE_POST_STEPPED);
        for &h in &self.units {
            ctx.post_step_unit(h)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.log.record(Call::FacilityReset { facility: self.id });
    }
}

// ── RecordingUnit ──────────────────────────────────────────────────

pub struct RecordingUnit {
    id: UnitId,
    log: CallLog,
    reject_actions: bool,
}

impl RecordingUnit {
    pub fn new(id: UnitId, log: CallLog) -> Self {
        Self {
            id,
            log,
            reject_actions: false,
        }
    }

    /// A unit whose `set_action` always fails with `UnsupportedAction`.
    /// The attempt is still logged.
    pub fn rejecting(id: UnitId, log: CallLog) -> Self {
        Self {
            reject_actions: true,
            ..Self::new(id, log)
        }
    }
}

impl Unit for RecordingUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn class(&self) -> &str {
        "recording"
    }

    fn step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        self.log.record(Call::UnitStep {
            unit: self.id,
            tick: ctx.tick(),
        });
        Ok(())
    }

    fn post_step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        self.log.record(Call::UnitPostStep {
            unit: self.id,
            tick: ctx.tick(),
        });
        Ok(())
    }

    fn set_action(&mut self, action: ControlAction) -> Result<(), EntityError> {
        let name = action.name();
        self.log.record(Call::SetAction {
            unit: self.id,
            action,
        });
        if self.reject_actions {
            return Err(EntityError::UnsupportedAction {
                unit: self.id,
                action: name,
            });
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.log.record(Call::UnitReset { unit: self.id });
    }
}

// ── FailingFacility ────────────────────────────────────────────────

/// Fails `step` at `fail_at` and succeeds otherwise.
pub struct FailingFacility {
    id: FacilityId,
    fail_at: TickId,
}

impl FailingFacility {
    pub fn new(id: FacilityId, fail_at: TickId) -> Self {
        Self { id, fail_at }
    }
}

impl Facility for FailingFacility {
    fn id(&self) -> FacilityId {
        self.id
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn units(&self) -> &[UnitHandle] {
        &[]
    }

    fn step(&mut self, ctx: &mut FacilityContext<'_>) -> Result<(), EntityError> {
        if ctx.tick() == self.fail_at {
            return Err(EntityError::InvalidState {
                reason: format!("scripted failure at tick {}", self.fail_at),
            });
        }
        Ok(())
    }

    fn post_step(&mut self, _ctx: &mut FacilityContext<'_>) -> Result<(), EntityError> {
        Ok(())
    }

    fn reset(&mut self) {}
}

// ── World scaffold ─────────────────────────────────────────────────

/// Build a world of recording facilities and units.
///
/// `facilities` lists `(facility_id, unit_ids)` in stepping order. Each
/// facility gets one row of [`PHASE_KIND`] (row index = position in the
/// list) and writes its phase there.
pub fn recording_world(
    action_steps: u64,
    facilities: &[(u32, &[u32])],
    max_snapshots: usize,
) -> Result<(World, CallLog), ConfigError> {
    let log = CallLog::new();
    let mut b = WorldBuilder::new(action_steps);
    let kind = b.layout_mut().declare(PHASE_KIND, &[PHASE_ATTR])?;
    for &(fid, units) in facilities {
        let mut handles = Vec::with_capacity(units.len());
        for &uid in units {
            let unit = RecordingUnit::new(UnitId(uid), log.clone());
            handles.push(b.add_unit(Box::new(unit), None)?);
        }
        let slot = b.layout_mut().allocate_row(kind)?;
        let facility = RecordingFacility::new(FacilityId(fid), handles, log.clone())
            .with_phase_cell(slot, AttributeId(0));
        b.add_facility(Box::new(facility), Some(slot))?;
    }
    Ok((b.build(max_snapshots)?, log))
}
