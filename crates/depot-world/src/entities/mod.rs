//! Reference entity kinds.
//!
//! Small, deterministic stand-ins for real business logic: enough for a
//! config-built world to run, write the frame, and react to actions.

mod facility;
mod units;

pub use facility::GenericFacility;
pub use units::{ConsumerUnit, ManufactureUnit, StorageUnit};

use depot_core::{AttributeId, EntityError, FrameWriter, NodeSlot};

fn write(
    frame: &mut dyn FrameWriter,
    slot: NodeSlot,
    attribute: AttributeId,
    value: f32,
) -> Result<(), EntityError> {
    if frame.set(slot, attribute, value) {
        Ok(())
    } else {
        Err(EntityError::InvalidState {
            reason: format!("frame cell {slot}/{attribute} is out of range"),
        })
    }
}
