//! Parsed topology: entity classes, settings, and the facility tree.
//!
//! Two TOML files describe a scenario. `core.toml` sits one directory
//! above the scenario and declares classes shared by every scenario:
//!
//! ```toml
//! [[classes]]
//! name = "storage"
//! role = "unit"
//! attributes = ["stock", "capacity"]
//! defaults = { capacity = 100.0 }
//! ```
//!
//! `config.toml` lives in the scenario directory and instantiates them:
//!
//! ```toml
//! [settings]
//! action_steps = 5
//!
//! [[facilities]]
//! id = 1
//! name = "warehouse"
//! class = "generic"
//!
//! [[facilities.units]]
//! id = 10
//! class = "storage"
//! params = { stock = 40.0 }
//! ```
//!
//! Unit and facility `params` override the class `defaults`.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use depot_core::{FacilityId, UnitId};

use crate::error::ConfigError;

/// Whether a class describes facilities or units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassRole {
    /// A stepping container.
    Facility,
    /// An addressable, action-receiving entity.
    Unit,
}

impl ClassRole {
    fn as_str(self) -> &'static str {
        match self {
            Self::Facility => "facility",
            Self::Unit => "unit",
        }
    }
}

/// One class declared in `core.toml`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDef {
    /// Class name, also the frame node kind name.
    pub name: String,
    /// Facility or unit.
    pub role: ClassRole,
    /// Frame attributes, in column order.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Default parameter values.
    #[serde(default)]
    pub defaults: IndexMap<String, f32>,
}

/// `[settings]` from `config.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Decision cadence in ticks.
    pub action_steps: u64,
    /// Scenario seed, for entities that draw randomness.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// One unit instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitDef {
    /// Unique unit id.
    pub id: UnitId,
    /// Unit class name.
    pub class: String,
    /// Parameters; after parsing, class defaults are merged in.
    #[serde(default)]
    pub params: IndexMap<String, f32>,
}

/// One facility instance and the units it owns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilityDef {
    /// Unique facility id.
    pub id: FacilityId,
    /// Display name.
    pub name: String,
    /// Facility class name.
    pub class: String,
    /// Parameters; after parsing, class defaults are merged in.
    #[serde(default)]
    pub params: IndexMap<String, f32>,
    /// Owned units, in stepping order.
    #[serde(default)]
    pub units: Vec<UnitDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CoreFile {
    #[serde(default)]
    classes: Vec<ClassDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    settings: Settings,
    #[serde(default)]
    facilities: Vec<FacilityDef>,
}

/// A validated, defaults-merged scenario ready for
/// [`World::build`](crate::World::build).
#[derive(Clone, Debug, PartialEq)]
pub struct TopologyDescription {
    /// Scenario settings.
    pub settings: Settings,
    /// Declared classes by name, in declaration order.
    pub classes: IndexMap<String, ClassDef>,
    /// Facilities in declaration order. This is the stepping order.
    pub facilities: Vec<FacilityDef>,
}

impl TopologyDescription {
    /// Number of unit instances across all facilities.
    pub fn unit_count(&self) -> usize {
        self.facilities.iter().map(|f| f.units.len()).sum()
    }

    fn class(&self, name: &str, role: ClassRole) -> Result<&ClassDef, ConfigError> {
        self.classes
            .get(name)
            .filter(|c| c.role == role)
            .ok_or_else(|| ConfigError::UnknownClass {
                role: role.as_str(),
                class: name.to_string(),
            })
    }

    fn assemble(core: CoreFile, scenario: ScenarioFile) -> Result<Self, ConfigError> {
        let mut classes = IndexMap::with_capacity(core.classes.len());
        for class in core.classes {
            if classes.contains_key(&class.name) {
                return Err(ConfigError::Invalid {
                    reason: format!("class '{}' is declared twice", class.name),
                });
            }
            classes.insert(class.name.clone(), class);
        }
        let mut topology = Self {
            settings: scenario.settings,
            classes,
            facilities: scenario.facilities,
        };
        topology.validate()?;
        topology.merge_defaults();
        Ok(topology)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.action_steps == 0 {
            return Err(ConfigError::Invalid {
                reason: "settings.action_steps must be at least 1".into(),
            });
        }
        for class in self.classes.values() {
            if let Some(key) = class.defaults.keys().find(|k| !class.attributes.contains(k)) {
                return Err(ConfigError::Invalid {
                    reason: format!("class '{}' has a default for unknown attribute '{key}'", class.name),
                });
            }
        }
        let mut facility_ids = Vec::with_capacity(self.facilities.len());
        let mut unit_ids = Vec::with_capacity(self.unit_count());
        for facility in &self.facilities {
            if facility_ids.contains(&facility.id) {
                return Err(ConfigError::DuplicateFacility(facility.id));
            }
            facility_ids.push(facility.id);
            let class = self.class(&facility.class, ClassRole::Facility)?;
            check_params(&facility.params, class, &facility.name)?;
            for unit in &facility.units {
                if unit_ids.contains(&unit.id) {
                    return Err(ConfigError::DuplicateUnit(unit.id));
                }
                unit_ids.push(unit.id);
                let class = self.class(&unit.class, ClassRole::Unit)?;
                check_params(&unit.params, class, &unit.id.to_string())?;
            }
        }
        Ok(())
    }

    fn merge_defaults(&mut self) {
        let classes = &self.classes;
        let merge = |params: &mut IndexMap<String, f32>, class: &str| {
            if let Some(def) = classes.get(class) {
                for (key, value) in &def.defaults {
                    params.entry(key.clone()).or_insert(*value);
                }
            }
        };
        for facility in &mut self.facilities {
            merge(&mut facility.params, &facility.class);
            for unit in &mut facility.units {
                merge(&mut unit.params, &unit.class);
            }
        }
    }
}

fn check_params(params: &IndexMap<String, f32>, class: &ClassDef, owner: &str) -> Result<(), ConfigError> {
    match params.keys().find(|k| !class.attributes.contains(k)) {
        Some(key) => Err(ConfigError::Invalid {
            reason: format!("{owner} sets '{key}', which class '{}' does not declare", class.name),
        }),
        None => Ok(()),
    }
}

/// Loads `core.toml` and a scenario `config.toml` into a
/// [`TopologyDescription`].
#[derive(Clone, Debug)]
pub struct ConfigParser {
    core_path: PathBuf,
    scenario_path: PathBuf,
}

impl ConfigParser {
    /// Parser over explicit file paths.
    pub fn new(core_path: impl Into<PathBuf>, scenario_path: impl Into<PathBuf>) -> Self {
        Self {
            core_path: core_path.into(),
            scenario_path: scenario_path.into(),
        }
    }

    /// Parser for `<root>/<topology>/config.toml` with `<root>/core.toml`.
    pub fn for_topology(root: &Path, topology: &str) -> Self {
        Self::new(root.join("core.toml"), root.join(topology).join("config.toml"))
    }

    /// Path of the shared class declarations.
    pub fn core_path(&self) -> &Path {
        &self.core_path
    }

    /// Path of the scenario file.
    pub fn scenario_path(&self) -> &Path {
        &self.scenario_path
    }

    /// Read, parse and validate both files.
    pub fn parse(&self) -> Result<TopologyDescription, ConfigError> {
        let core: CoreFile = read_toml(&self.core_path)?;
        let scenario: ScenarioFile = read_toml(&self.scenario_path)?;
        let topology = TopologyDescription::assemble(core, scenario)?;
        debug!(
            scenario = %self.scenario_path.display(),
            classes = topology.classes.len(),
            facilities = topology.facilities.len(),
            units = topology.unit_count(),
            "topology parsed"
        );
        Ok(topology)
    }

    /// Parse in-memory sources. Errors report the paths `core.toml` and
    /// `config.toml`.
    pub fn parse_str(core: &str, scenario: &str) -> Result<TopologyDescription, ConfigError> {
        let core: CoreFile = from_toml_str(core, Path::new("core.toml"))?;
        let scenario: ScenarioFile = from_toml_str(scenario, Path::new("config.toml"))?;
        TopologyDescription::assemble(core, scenario)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_toml_str(&text, path)
}

fn from_toml_str<T: serde::de::DeserializeOwned>(text: &str, path: &Path) -> Result<T, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
