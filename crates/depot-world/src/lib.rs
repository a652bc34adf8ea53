//! Entity graph and topology loading for Depot simulations.
//!
//! A scenario is described by two TOML files (see [`topology`]), parsed by
//! [`ConfigParser`] into a [`TopologyDescription`], and turned into a
//! [`World`] by instantiating each declared entity through an
//! [`EntityRegistry`].
//!
//! ```text
//! core.toml + config.toml
//!     └─ ConfigParser::parse() ─→ TopologyDescription
//!            └─ World::build(topology, max_snapshots)
//!                 ├── facilities: IndexMap<FacilityId, Box<dyn Facility>>
//!                 ├── units:      UnitArena (Vec<Box<dyn Unit>>)
//!                 ├── unit_index: UnitId → UnitHandle
//!                 └── frame:      Frame + SnapshotList
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entities;
pub mod error;
pub mod registry;
pub mod topology;
pub mod world;

pub use entities::{ConsumerUnit, GenericFacility, ManufactureUnit, StorageUnit};
pub use error::ConfigError;
pub use registry::{EntityRegistry, FacilitySpec, UnitSpec};
pub use topology::{ClassDef, ClassRole, ConfigParser, FacilityDef, Settings, TopologyDescription, UnitDef};
pub use world::{FacilityNode, NodeMapping, UnitArena, UnitNode, World, WorldBuilder, WorldConfigs};
