//! Test utilities and mock entities for Depot development.
//!
//! Every mock writes to a shared [`CallLog`], so a test can assert on the
//! exact sequence of `step`/`post_step`/`set_action`/`reset` calls the
//! engine made across all entities.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    recording_world, FailingFacility, RecordingFacility, RecordingUnit, PHASE_ATTR, PHASE_KIND,
    PHASE_POST_STEPPED, PHASE_STEPPED,
};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use depot_core::{ControlAction, FacilityId, TickId, UnitId};

/// One observed entity call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    FacilityStep { facility: FacilityId, tick: TickId },
    FacilityPostStep { facility: FacilityId, tick: TickId },
    FacilityReset { facility: FacilityId },
    UnitStep { unit: UnitId, tick: TickId },
    UnitPostStep { unit: UnitId, tick: TickId },
    SetAction { unit: UnitId, action: ControlAction },
    UnitReset { unit: UnitId },
}

/// Shared, append-only record of entity calls.
///
/// Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, call: Call) {
        self.lock().push(call);
    }

    /// Copy of every call so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().iter().filter(|c| pred(c)).count()
    }

    /// Facilities stepped at `tick`, in call order.
    pub fn facility_steps(&self, tick: TickId) -> Vec<FacilityId> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                Call::FacilityStep { facility, tick: t } if *t == tick => Some(*facility),
                _ => None,
            })
            .collect()
    }

    /// Facilities post-stepped at `tick`, in call order.
    pub fn facility_post_steps(&self, tick: TickId) -> Vec<FacilityId> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                Call::FacilityPostStep { facility, tick: t } if *t == tick => Some(*facility),
                _ => None,
            })
            .collect()
    }

    /// Units stepped at `tick`, in call order.
    pub fn unit_steps(&self, tick: TickId) -> Vec<UnitId> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                Call::UnitStep { unit, tick: t } if *t == tick => Some(*unit),
                _ => None,
            })
            .collect()
    }

    /// Actions delivered to `unit`, in call order.
    pub fn actions_for(&self, unit: UnitId) -> Vec<ControlAction> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                Call::SetAction { unit: u, action } if *u == unit => Some(action.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `set_action` calls on any unit.
    pub fn set_action_count(&self) -> usize {
        self.count(|c| matches!(c, Call::SetAction { .. }))
    }
}
