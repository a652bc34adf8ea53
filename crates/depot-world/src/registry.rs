//! Class name → constructor table used when building a world from a topology.

use std::fmt;

use indexmap::IndexMap;
use smallvec::SmallVec;

use depot_core::{AttributeId, Facility, FacilityId, NodeSlot, Unit, UnitHandle, UnitId};

use crate::entities::{ConsumerUnit, GenericFacility, ManufactureUnit, StorageUnit};
use crate::error::ConfigError;
use crate::topology::ClassDef;

/// Everything a unit constructor gets to see.
#[derive(Clone, Copy, Debug)]
pub struct UnitSpec<'a> {
    /// Unit id from the topology.
    pub id: UnitId,
    /// The unit's class declaration.
    pub class: &'a ClassDef,
    /// Frame row allocated for this unit.
    pub slot: NodeSlot,
    /// Parameters with class defaults merged in.
    pub params: &'a IndexMap<String, f32>,
}

/// Everything a facility constructor gets to see.
#[derive(Clone, Debug)]
pub struct FacilitySpec<'a> {
    /// Facility id from the topology.
    pub id: FacilityId,
    /// Display name.
    pub name: &'a str,
    /// The facility's class declaration.
    pub class: &'a ClassDef,
    /// Frame row allocated for this facility.
    pub slot: NodeSlot,
    /// Parameters with class defaults merged in.
    pub params: &'a IndexMap<String, f32>,
    /// Handles of the facility's units, in declaration order.
    pub units: SmallVec<[UnitHandle; 4]>,
}

fn column(class: &ClassDef, name: &str) -> Result<AttributeId, ConfigError> {
    class
        .attributes
        .iter()
        .position(|a| a == name)
        .map(|i| AttributeId(i as u16))
        .ok_or_else(|| ConfigError::Invalid {
            reason: format!("class '{}' must declare attribute '{name}'", class.name),
        })
}

impl UnitSpec<'_> {
    /// Column of a required attribute.
    pub fn attribute(&self, name: &str) -> Result<AttributeId, ConfigError> {
        column(self.class, name)
    }

    /// Parameter value, `0.0` if unset.
    pub fn param(&self, name: &str) -> f32 {
        self.params.get(name).copied().unwrap_or(0.0)
    }
}

impl FacilitySpec<'_> {
    /// Column of an attribute, if the class declares it.
    pub fn attribute(&self, name: &str) -> Option<AttributeId> {
        column(self.class, name).ok()
    }

    /// Parameter value, `0.0` if unset.
    pub fn param(&self, name: &str) -> f32 {
        self.params.get(name).copied().unwrap_or(0.0)
    }
}

type UnitFactory = Box<dyn Fn(&UnitSpec<'_>) -> Result<Box<dyn Unit>, ConfigError> + Send + Sync>;
type FacilityFactory =
    Box<dyn Fn(FacilitySpec<'_>) -> Result<Box<dyn Facility>, ConfigError> + Send + Sync>;

/// Constructors for facility and unit classes, keyed by class name.
///
/// [`EntityRegistry::with_builtins`] knows the reference classes
/// `storage`, `manufacture`, `consumer` and `generic`; scenarios with
/// their own entity kinds register more.
#[derive(Default)]
pub struct EntityRegistry {
    units: IndexMap<String, UnitFactory>,
    facilities: IndexMap<String, FacilityFactory>,
}

impl EntityRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the reference entity classes.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register_unit("storage", |spec| Ok(Box::new(StorageUnit::from_spec(spec)?)));
        reg.register_unit("manufacture", |spec| Ok(Box::new(ManufactureUnit::from_spec(spec)?)));
        reg.register_unit("consumer", |spec| Ok(Box::new(ConsumerUnit::from_spec(spec)?)));
        reg.register_facility("generic", |spec| Ok(Box::new(GenericFacility::from_spec(spec))));
        reg
    }

    /// Register a unit constructor. Returns `true` if it replaced one.
    pub fn register_unit<F>(&mut self, class: impl Into<String>, factory: F) -> bool
    where
        F: Fn(&UnitSpec<'_>) -> Result<Box<dyn Unit>, ConfigError> + Send + Sync + 'static,
    {
        self.units.insert(class.into(), Box::new(factory)).is_some()
    }

    /// Register a facility constructor. Returns `true` if it replaced one.
    pub fn register_facility<F>(&mut self, class: impl Into<String>, factory: F) -> bool
    where
        F: Fn(FacilitySpec<'_>) -> Result<Box<dyn Facility>, ConfigError> + Send + Sync + 'static,
    {
        self.facilities.insert(class.into(), Box::new(factory)).is_some()
    }

    /// Construct a unit of `spec.class`.
    pub fn build_unit(&self, spec: &UnitSpec<'_>) -> Result<Box<dyn Unit>, ConfigError> {
        let factory = self
            .units
            .get(&spec.class.name)
            .ok_or_else(|| ConfigError::UnknownClass {
                role: "unit",
                class: spec.class.name.clone(),
            })?;
        factory(spec)
    }

    /// Construct a facility of `spec.class`.
    pub fn build_facility(&self, spec: FacilitySpec<'_>) -> Result<Box<dyn Facility>, ConfigError> {
        let factory = self
            .facilities
            .get(&spec.class.name)
            .ok_or_else(|| ConfigError::UnknownClass {
                role: "facility",
                class: spec.class.name.clone(),
            })?;
        factory(spec)
    }

    /// Registered unit class names.
    pub fn unit_classes(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Registered facility class names.
    pub fn facility_classes(&self) -> impl Iterator<Item = &str> {
        self.facilities.keys().map(String::as_str)
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .field("facilities", &self.facilities.keys().collect::<Vec<_>>())
            .finish()
    }
}
