//! The entity graph: facilities, the unit arena, and the frame.
//!
//! [`World`] is the single owner of every entity. Facilities are stored in
//! insertion order (the stepping order); units live in a flat arena and
//! are addressed either by [`UnitHandle`] (from their facility) or by
//! [`UnitId`] (from an action) through a flattened id index.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{info, trace};

use depot_core::{
    Facility, FacilityContext, FacilityId, NodeSlot, StepError, TickId, Unit, UnitContext,
    UnitHandle, UnitId, UnitStore,
};
use depot_frame::{Frame, FrameLayoutBuilder};

use crate::error::ConfigError;
use crate::registry::{EntityRegistry, FacilitySpec, UnitSpec};
use crate::topology::{ClassDef, TopologyDescription};

// ── UnitArena ──────────────────────────────────────────────────────

/// Flat storage for every unit in the world.
#[derive(Default)]
pub struct UnitArena {
    units: Vec<Box<dyn Unit>>,
}

impl UnitArena {
    fn push(&mut self, unit: Box<dyn Unit>) -> UnitHandle {
        let handle = UnitHandle(self.units.len() as u32);
        self.units.push(unit);
        handle
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the arena holds no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Resolve a handle.
    pub fn get(&self, handle: UnitHandle) -> Option<&dyn Unit> {
        self.units.get(handle.index()).map(|u| u.as_ref())
    }
}

impl UnitStore for UnitArena {
    fn unit_mut(&mut self, handle: UnitHandle) -> Option<&mut dyn Unit> {
        self.units.get_mut(handle.index()).map(|u| u.as_mut())
    }
}

// ── NodeMapping ────────────────────────────────────────────────────

/// Where a facility sits in the graph and the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacilityNode {
    /// Display name.
    pub name: String,
    /// Frame row, if the facility has one.
    pub slot: Option<NodeSlot>,
    /// Owned units in stepping order.
    pub units: Vec<UnitId>,
}

/// Where a unit sits in the graph and the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitNode {
    /// Class name.
    pub class: String,
    /// Owning facility, if any.
    pub facility: Option<FacilityId>,
    /// Frame row, if the unit has one.
    pub slot: Option<NodeSlot>,
}

/// Static map from entity ids to their class, owner and frame row.
///
/// Computed once at build time. Controllers use it to turn frame rows
/// back into entity ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeMapping {
    /// Facilities in stepping order.
    pub facilities: IndexMap<FacilityId, FacilityNode>,
    /// Units in arena order.
    pub units: IndexMap<UnitId, UnitNode>,
}

// ── WorldConfigs ───────────────────────────────────────────────────

/// Static values read from the scenario settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldConfigs {
    /// Decision cadence in ticks. Always at least 1.
    pub action_steps: u64,
    /// Scenario seed, if the scenario sets one.
    pub seed: Option<u64>,
    /// Capacity of the frame's snapshot list.
    pub max_snapshots: usize,
}

// ── World ──────────────────────────────────────────────────────────

/// Owns the facility table, the unit arena, and the frame.
///
/// Built once. [`reset`](World::reset) restores construction-time state
/// without reallocating anything.
pub struct World {
    facilities: IndexMap<FacilityId, Box<dyn Facility>>,
    units: UnitArena,
    unit_index: IndexMap<UnitId, UnitHandle>,
    frame: Frame,
    configs: WorldConfigs,
    node_mapping: NodeMapping,
}

impl World {
    /// Build a world from a parsed topology using the reference entities.
    pub fn build(topology: &TopologyDescription, max_snapshots: usize) -> Result<Self, ConfigError> {
        Self::build_with(topology, max_snapshots, &EntityRegistry::with_builtins())
    }

    /// Build a world from a parsed topology with a custom registry.
    pub fn build_with(
        topology: &TopologyDescription,
        max_snapshots: usize,
        registry: &EntityRegistry,
    ) -> Result<Self, ConfigError> {
        let mut builder = WorldBuilder::new(topology.settings.action_steps);
        builder.seed(topology.settings.seed);
        for class in topology.classes.values() {
            let attrs: Vec<&str> = class.attributes.iter().map(String::as_str).collect();
            builder.layout_mut().declare(&class.name, &attrs)?;
        }
        for facility in &topology.facilities {
            let mut handles = SmallVec::<[UnitHandle; 4]>::new();
            for unit in &facility.units {
                let class = class_of(topology, &unit.class, "unit")?;
                let slot = builder.allocate_row(&class.name)?;
                let spec = UnitSpec {
                    id: unit.id,
                    class,
                    slot,
                    params: &unit.params,
                };
                let built = registry.build_unit(&spec)?;
                handles.push(builder.add_unit(built, Some(slot))?);
            }
            let class = class_of(topology, &facility.class, "facility")?;
            let slot = builder.allocate_row(&class.name)?;
            let spec = FacilitySpec {
                id: facility.id,
                name: &facility.name,
                class,
                slot,
                params: &facility.params,
                units: handles,
            };
            let built = registry.build_facility(spec)?;
            builder.add_facility(built, Some(slot))?;
        }
        builder.build(max_snapshots)
    }

    /// Facilities in stepping order.
    pub fn facilities(&self) -> impl Iterator<Item = (FacilityId, &dyn Facility)> {
        self.facilities.iter().map(|(id, f)| (*id, f.as_ref()))
    }

    /// Number of facilities.
    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    /// Look up a facility.
    pub fn facility(&self, id: FacilityId) -> Option<&dyn Facility> {
        self.facilities.get(&id).map(|f| f.as_ref())
    }

    /// Look up a unit by id.
    pub fn unit(&self, id: UnitId) -> Option<&dyn Unit> {
        self.unit_index.get(&id).and_then(|h| self.units.get(*h))
    }

    /// Look up a unit by id, mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut dyn Unit> {
        let handle = *self.unit_index.get(&id)?;
        self.units.unit_mut(handle)
    }

    /// Unit ids in arena order.
    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.unit_index.keys().copied()
    }

    /// Number of units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// The frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The frame, mutably.
    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    /// Static configuration.
    pub fn configs(&self) -> &WorldConfigs {
        &self.configs
    }

    /// Entity id → class, owner, frame row.
    pub fn node_mapping(&self) -> &NodeMapping {
        &self.node_mapping
    }

    /// Run `step` on every facility in insertion order.
    pub fn step_facilities(&mut self, tick: TickId) -> Result<(), StepError> {
        let Self {
            facilities,
            units,
            frame,
            ..
        } = self;
        for (id, facility) in facilities.iter_mut() {
            trace!(%tick, facility = %id, "facility step");
            let mut ctx = FacilityContext::new(tick, &mut *units, &mut *frame);
            facility
                .step(&mut ctx)
                .map_err(|source| StepError::FacilityFailed {
                    tick,
                    facility: *id,
                    source,
                })?;
        }
        Ok(())
    }

    /// Run `post_step` on every facility in insertion order.
    pub fn post_step_facilities(&mut self, tick: TickId) -> Result<(), StepError> {
        let Self {
            facilities,
            units,
            frame,
            ..
        } = self;
        for (id, facility) in facilities.iter_mut() {
            trace!(%tick, facility = %id, "facility post_step");
            let mut ctx = FacilityContext::new(tick, &mut *units, &mut *frame);
            facility
                .post_step(&mut ctx)
                .map_err(|source| StepError::FacilityFailed {
                    tick,
                    facility: *id,
                    source,
                })?;
        }
        Ok(())
    }

    /// Step one unit directly, bypassing its facility.
    ///
    /// Unknown ids are a no-op returning `Ok(false)`.
    pub fn step_unit(&mut self, id: UnitId, tick: TickId) -> Result<bool, StepError> {
        let Some(&handle) = self.unit_index.get(&id) else {
            return Ok(false);
        };
        let Some(unit) = self.units.unit_mut(handle) else {
            return Ok(false);
        };
        let mut ctx = UnitContext::new(tick, &mut self.frame);
        unit.step(&mut ctx)
            .map_err(|source| StepError::UnitFailed { tick, unit: id, source })?;
        Ok(true)
    }

    /// Restore construction-time state: frame, then snapshot list, then
    /// every facility, then every unit.
    pub fn reset(&mut self) {
        self.frame.reset();
        self.frame.snapshots_mut().reset();
        for facility in self.facilities.values_mut() {
            facility.reset();
        }
        for unit in self.units.units.iter_mut() {
            unit.reset();
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("facilities", &self.facilities.keys().collect::<Vec<_>>())
            .field("units", &self.unit_index.len())
            .field("configs", &self.configs)
            .finish()
    }
}

fn class_of<'t>(
    topology: &'t TopologyDescription,
    name: &str,
    role: &'static str,
) -> Result<&'t ClassDef, ConfigError> {
    topology
        .classes
        .get(name)
        .ok_or_else(|| ConfigError::UnknownClass {
            role,
            class: name.to_string(),
        })
}

// ── WorldBuilder ───────────────────────────────────────────────────

/// Assembles a [`World`] from hand-constructed entities.
///
/// [`World::build`] drives this from a topology; tests use it directly
/// with mock entities. Units must be added before the facility that owns
/// them, so the facility can be constructed with their handles.
pub struct WorldBuilder {
    layout: FrameLayoutBuilder,
    facilities: IndexMap<FacilityId, Box<dyn Facility>>,
    units: UnitArena,
    unit_index: IndexMap<UnitId, UnitHandle>,
    mapping: NodeMapping,
    action_steps: u64,
    seed: Option<u64>,
}

impl WorldBuilder {
    /// Start a world with the given decision cadence.
    pub fn new(action_steps: u64) -> Self {
        Self {
            layout: FrameLayoutBuilder::default(),
            facilities: IndexMap::new(),
            units: UnitArena::default(),
            unit_index: IndexMap::new(),
            mapping: NodeMapping::default(),
            action_steps,
            seed: None,
        }
    }

    /// Set the scenario seed.
    pub fn seed(&mut self, seed: Option<u64>) -> &mut Self {
        self.seed = seed;
        self
    }

    /// The frame layout under construction.
    pub fn layout_mut(&mut self) -> &mut FrameLayoutBuilder {
        &mut self.layout
    }

    /// Allocate the next frame row of a declared node kind.
    pub fn allocate_row(&mut self, kind: &str) -> Result<NodeSlot, ConfigError> {
        let id = self
            .layout
            .kind(kind)
            .ok_or_else(|| depot_frame::FrameError::UnknownNodeKind(kind.to_string()))?;
        Ok(self.layout.allocate_row(id)?)
    }

    /// Add a unit, returning its handle.
    pub fn add_unit(&mut self, unit: Box<dyn Unit>, slot: Option<NodeSlot>) -> Result<UnitHandle, ConfigError> {
        let id = unit.id();
        if self.unit_index.contains_key(&id) {
            return Err(ConfigError::DuplicateUnit(id));
        }
        self.mapping.units.insert(
            id,
            UnitNode {
                class: unit.class().to_string(),
                facility: None,
                slot,
            },
        );
        let handle = self.units.push(unit);
        self.unit_index.insert(id, handle);
        Ok(handle)
    }

    /// Add a facility. Its unit handles must already be in the arena.
    pub fn add_facility(&mut self, facility: Box<dyn Facility>, slot: Option<NodeSlot>) -> Result<(), ConfigError> {
        let id = facility.id();
        if self.facilities.contains_key(&id) {
            return Err(ConfigError::DuplicateFacility(id));
        }
        let mut owned = Vec::with_capacity(facility.units().len());
        for &handle in facility.units() {
            let unit_id = self
                .units
                .get(handle)
                .map(|u| u.id())
                .ok_or(ConfigError::DanglingHandle { facility: id, handle })?;
            if let Some(node) = self.mapping.units.get_mut(&unit_id) {
                node.facility = Some(id);
            }
            owned.push(unit_id);
        }
        self.mapping.facilities.insert(
            id,
            FacilityNode {
                name: facility.name().to_string(),
                slot,
                units: owned,
            },
        );
        self.facilities.insert(id, facility);
        Ok(())
    }

    /// Freeze the layout, allocate the frame, and return the world.
    pub fn build(self, max_snapshots: usize) -> Result<World, ConfigError> {
        if self.action_steps == 0 {
            return Err(ConfigError::Invalid {
                reason: "action_steps must be at least 1".into(),
            });
        }
        let frame = Frame::new(self.layout.build(), max_snapshots)?;
        info!(
            facilities = self.facilities.len(),
            units = self.units.len(),
            frame_cells = frame.data().len(),
            max_snapshots,
            "world built"
        );
        Ok(World {
            facilities: self.facilities,
            units: self.units,
            unit_index: self.unit_index,
            frame,
            configs: WorldConfigs {
                action_steps: self.action_steps,
                seed: self.seed,
                max_snapshots,
            },
            node_mapping: self.mapping,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::GenericFacility;
    use crate::topology::ConfigParser;
    use depot_core::{AttributeId, ControlAction, EntityError, FrameWriter};

    const CORE: &str = r#"
        [[classes]]
        name = "generic"
        role = "facility"
        attributes = ["ticks"]

        [[classes]]
        name = "storage"
        role = "unit"
        attributes = ["stock", "capacity"]
        defaults = { capacity = 50.0 }

        [[classes]]
        name = "consumer"
        role = "unit"
        attributes = ["demand", "purchased", "total_purchased"]
    "#;

    const SCENARIO: &str = r#"
        [settings]
        action_steps = 2
        seed = 11

        [[facilities]]
        id = 1
        name = "warehouse"
        class = "generic"
        units = [{ id = 10, class = "storage", params = { stock = 20.0 } }]

        [[facilities]]
        id = 2
        name = "retailer"
        class = "generic"
        units = [{ id = 20, class = "consumer", params = { demand = 3.0 } }]
    "#;

    fn world() -> World {
        let topo = ConfigParser::parse_str(CORE, SCENARIO).unwrap();
        World::build(&topo, 4).unwrap()
    }

    #[test]
    fn build_preserves_facility_order_and_mapping() {
        let w = world();
        let ids: Vec<_> = w.facilities().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![FacilityId(1), FacilityId(2)]);
        assert_eq!(w.configs().action_steps, 2);
        assert_eq!(w.configs().seed, Some(11));
        let node = &w.node_mapping().units[&UnitId(20)];
        assert_eq!(node.class, "consumer");
        assert_eq!(node.facility, Some(FacilityId(2)));
        assert_eq!(w.node_mapping().facilities[&FacilityId(1)].units, vec![UnitId(10)]);
    }

    #[test]
    fn stepping_writes_frame_and_actions_reach_units() {
        let mut w = world();
        w.unit_mut(UnitId(20))
            .unwrap()
            .set_action(ControlAction::Buy { quantity: 5 })
            .unwrap();
        w.step_facilities(TickId(0)).unwrap();
        let consumer = w.node_mapping().units[&UnitId(20)].slot.unwrap();
        assert_eq!(w.frame().get(consumer, AttributeId(1)), Some(5.0));
        w.post_step_facilities(TickId(0)).unwrap();
        assert_eq!(w.frame().get(consumer, AttributeId(1)), Some(0.0));
        assert_eq!(w.frame().get(consumer, AttributeId(2)), Some(5.0));
    }

    #[test]
    fn reset_restores_entities_and_clears_frame() {
        let mut w = world();
        w.unit_mut(UnitId(20))
            .unwrap()
            .set_action(ControlAction::Buy { quantity: 5 })
            .unwrap();
        w.step_facilities(TickId(0)).unwrap();
        w.frame_mut().take_snapshot(0);
        w.reset();
        assert!(w.frame().data().iter().all(|v| *v == 0.0));
        assert!(w.frame().snapshots().is_empty());
        w.step_facilities(TickId(0)).unwrap();
        let consumer = w.node_mapping().units[&UnitId(20)].slot.unwrap();
        assert_eq!(w.frame().get(consumer, AttributeId(2)), Some(0.0));
    }

    #[test]
    fn unsupported_actions_and_dangling_handles_are_rejected() {
        let mut w = world();
        w.unit_mut(UnitId(10))
            .unwrap()
            .set_action(ControlAction::Hold)
            .unwrap();
        let err = w
            .unit_mut(UnitId(10))
            .unwrap()
            .set_action(ControlAction::Buy { quantity: 1 })
            .unwrap_err();
        assert!(matches!(err, EntityError::UnsupportedAction { .. }));

        let mut b = WorldBuilder::new(1);
        b.add_facility(Box::new(GenericFacility::new(FacilityId(7), "ghost", &[UnitHandle(0)])), None)
            .unwrap_err();
    }

    #[test]
    fn step_unit_ignores_unknown_ids() {
        let mut w = world();
        assert!(!w.step_unit(UnitId(99), TickId(0)).unwrap());
        assert!(w.step_unit(UnitId(10), TickId(0)).unwrap());
        let storage = w.node_mapping().units[&UnitId(10)].slot.unwrap();
        assert_eq!(w.frame().get(storage, AttributeId(0)), Some(20.0));
    }

    #[test]
    fn zero_action_steps_fails_build() {
        assert!(matches!(
            WorldBuilder::new(0).build(1),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
