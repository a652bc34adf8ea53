use depot_core::{AttributeId, ControlAction, EntityError, NodeSlot, Unit, UnitContext, UnitId};

use super::write;
use crate::error::ConfigError;
use crate::registry::UnitSpec;

// ── StorageUnit ────────────────────────────────────────────────────

/// Holds stock up to a capacity. Accepts only [`ControlAction::Hold`].
#[derive(Clone, Debug)]
pub struct StorageUnit {
    id: UnitId,
    slot: NodeSlot,
    stock_col: AttributeId,
    capacity_col: AttributeId,
    initial_stock: f32,
    capacity: f32,
    stock: f32,
}

impl StorageUnit {
    /// Build from a topology entry. Needs `stock` and `capacity` columns.
    pub fn from_spec(spec: &UnitSpec<'_>) -> Result<Self, ConfigError> {
        let capacity = spec.param("capacity");
        let initial_stock = spec.param("stock").min(capacity);
        Ok(Self {
            id: spec.id,
            slot: spec.slot,
            stock_col: spec.attribute("stock")?,
            capacity_col: spec.attribute("capacity")?,
            initial_stock,
            capacity,
            stock: initial_stock,
        })
    }

    /// Current stock level.
    pub fn stock(&self) -> f32 {
        self.stock
    }
}

impl Unit for StorageUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn class(&self) -> &str {
        "storage"
    }

    fn step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        write(ctx.frame(), self.slot, self.stock_col, self.stock)?;
        write(ctx.frame(), self.slot, self.capacity_col, self.capacity)
    }

    fn set_action(&mut self, action: ControlAction) -> Result<(), EntityError> {
        match action {
            ControlAction::Hold => Ok(()),
            other => Err(EntityError::UnsupportedAction {
                unit: self.id,
                action: other.name(),
            }),
        }
    }

    fn reset(&mut self) {
        self.stock = self.initial_stock;
    }
}

// ── ManufactureUnit ────────────────────────────────────────────────

/// Produces `rate` units per tick into its output stock.
///
/// [`ControlAction::Produce`] changes the rate; `Hold` keeps it.
#[derive(Clone, Debug)]
pub struct ManufactureUnit {
    id: UnitId,
    slot: NodeSlot,
    rate_col: AttributeId,
    produced_col: AttributeId,
    output_col: AttributeId,
    initial_rate: f32,
    initial_output: f32,
    rate: f32,
    produced: f32,
    output: f32,
}

impl ManufactureUnit {
    /// Build from a topology entry. Needs `rate`, `produced` and `output`
    /// columns.
    pub fn from_spec(spec: &UnitSpec<'_>) -> Result<Self, ConfigError> {
        let initial_rate = spec.param("rate");
        let initial_output = spec.param("output");
        Ok(Self {
            id: spec.id,
            slot: spec.slot,
            rate_col: spec.attribute("rate")?,
            produced_col: spec.attribute("produced")?,
            output_col: spec.attribute("output")?,
            initial_rate,
            initial_output,
            rate: initial_rate,
            produced: 0.0,
            output: initial_output,
        })
    }

    /// Current production rate.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Accumulated output stock.
    pub fn output(&self) -> f32 {
        self.output
    }
}

impl Unit for ManufactureUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn class(&self) -> &str {
        "manufacture"
    }

    fn step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        self.produced = self.rate;
        self.output += self.produced;
        write(ctx.frame(), self.slot, self.rate_col, self.rate)?;
        write(ctx.frame(), self.slot, self.produced_col, self.produced)?;
        write(ctx.frame(), self.slot, self.output_col, self.output)
    }

    fn post_step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        self.produced = 0.0;
        write(ctx.frame(), self.slot, self.produced_col, 0.0)
    }

    fn set_action(&mut self, action: ControlAction) -> Result<(), EntityError> {
        match action {
            ControlAction::Produce { rate } => {
                self.rate = rate as f32;
                Ok(())
            }
            ControlAction::Hold => Ok(()),
            other => Err(EntityError::UnsupportedAction {
                unit: self.id,
                action: other.name(),
            }),
        }
    }

    fn reset(&mut self) {
        self.rate = self.initial_rate;
        self.produced = 0.0;
        self.output = self.initial_output;
    }
}

// ── ConsumerUnit ───────────────────────────────────────────────────

/// Buys what it is told to on the next step.
///
/// [`ControlAction::Buy`] places an order; `Hold` cancels a pending one.
#[derive(Clone, Debug)]
pub struct ConsumerUnit {
    id: UnitId,
    slot: NodeSlot,
    demand_col: AttributeId,
    purchased_col: AttributeId,
    total_col: AttributeId,
    demand: f32,
    pending: u32,
    purchased: f32,
    total: f32,
}

impl ConsumerUnit {
    /// Build from a topology entry. Needs `demand`, `purchased` and
    /// `total_purchased` columns.
    pub fn from_spec(spec: &UnitSpec<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            id: spec.id,
            slot: spec.slot,
            demand_col: spec.attribute("demand")?,
            purchased_col: spec.attribute("purchased")?,
            total_col: spec.attribute("total_purchased")?,
            demand: spec.param("demand"),
            pending: 0,
            purchased: 0.0,
            total: 0.0,
        })
    }

    /// Quantity ordered but not yet bought.
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Everything bought since the last reset.
    pub fn total_purchased(&self) -> f32 {
        self.total
    }
}

impl Unit for ConsumerUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn class(&self) -> &str {
        "consumer"
    }

    fn step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        self.purchased = std::mem::take(&mut self.pending) as f32;
        self.total += self.purchased;
        write(ctx.frame(), self.slot, self.demand_col, self.demand)?;
        write(ctx.frame(), self.slot, self.purchased_col, self.purchased)?;
        write(ctx.frame(), self.slot, self.total_col, self.total)
    }

    fn post_step(&mut self, ctx: &mut UnitContext<'_>) -> Result<(), EntityError> {
        self.purchased = 0.0;
        write(ctx.frame(), self.slot, self.purchased_col, 0.0)
    }

    fn set_action(&mut self, action: ControlAction) -> Result<(), EntityError> {
        match action {
            ControlAction::Buy { quantity } => {
                self.pending = quantity;
                Ok(())
            }
            ControlAction::Hold => {
                self.pending = 0;
                Ok(())
            }
            other => Err(EntityError::UnsupportedAction {
                unit: self.id,
                action: other.name(),
            }),
        }
    }

    fn reset(&mut self) {
        self.pending = 0;
        self.purchased = 0.0;
        self.total = 0.0;
    }
}
