//! Resolved design state.
//!
//! This is the strongly typed in-memory model a successful load produces. Every
//! catalog reference in it is a resolved, owned snapshot of the definition it
//! pointed at during the load; there are no raw ids left to chase.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CatalogEntry, Category, HullDefinition};

/// Warship or static station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignType {
    #[default]
    Warship,
    Station,
}

impl DesignType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warship" => Some(Self::Warship),
            "station" => Some(Self::Station),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warship => "warship",
            Self::Station => "station",
        }
    }
}

/// One layer of armor plating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorLayer {
    /// Weight class, as written by the editor (`light`, `medium`, ...).
    pub weight: String,
    pub armor: CatalogEntry,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

/// An installed subsystem instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSystem {
    /// Stable id, unique across the whole design.
    pub instance_id: String,
    pub entry: CatalogEntry,
    pub quantity: u32,
    /// Per-instance settings the engine carries without interpreting.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl InstalledSystem {
    pub fn new(instance_id: impl Into<String>, entry: CatalogEntry, quantity: u32) -> Self {
        Self {
            instance_id: instance_id.into(),
            entry,
            quantity,
            options: BTreeMap::new(),
        }
    }
}

/// A defensive system. Countermeasure-capable systems carry a set count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledDefense {
    #[serde(flatten)]
    pub system: InstalledSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countermeasure_sets: Option<u32>,
}

/// One loadout slot: a quantity of a resolved ordnance definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadoutSlot {
    pub ordnance: CatalogEntry,
    pub quantity: u32,
}

/// A launch system and its ordnance loadout, ordered by ordnance id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledLauncher {
    #[serde(flatten)]
    pub system: InstalledSystem,
    #[serde(default)]
    pub loadout: Vec<LoadoutSlot>,
}

impl InstalledLauncher {
    pub fn rounds(&self) -> u32 {
        self.loadout.iter().map(|s| s.quantity).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Weapon,
    Sensor,
}

impl LinkKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weapon" => Some(Self::Weapon),
            "sensor" => Some(Self::Sensor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Sensor => "sensor",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Weapon => Category::Weapon,
            Self::Sensor => Category::Sensor,
        }
    }
}

/// Reference from a control system to the instance it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlLink {
    pub kind: LinkKind,
    pub instance_id: String,
}

/// A command/control system, optionally linked to a weapon or sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledControl {
    #[serde(flatten)]
    pub system: InstalledSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<ControlLink>,
    /// Derived at load time. Never read from or written to a document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_cost: Option<f64>,
}

/// One hit-location zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageZone {
    pub code: String,
    /// Instance ids of the systems located in this zone.
    #[serde(default)]
    pub systems: Vec<String>,
}

/// Default chart for a hull: `Z1..Zn` with no systems assigned.
pub fn default_damage_zones(hull: &HullDefinition) -> Vec<DamageZone> {
    (1..=hull.size_class.zone_count())
        .map(|n| DamageZone {
            code: format!("Z{n}"),
            systems: Vec::new(),
        })
        .collect()
}

/// A fully resolved design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignState {
    pub design_type: DesignType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_sub_type: Option<String>,
    /// Top-level document fields this engine does not own (name, notes, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub hull: HullDefinition,
    pub armor_layers: Vec<ArmorLayer>,
    pub power_plants: Vec<InstalledSystem>,
    pub engines: Vec<InstalledSystem>,
    pub ftl_drives: Vec<InstalledSystem>,
    pub life_support: Vec<InstalledSystem>,
    pub accommodations: Vec<InstalledSystem>,
    pub store_systems: Vec<InstalledSystem>,
    pub gravity_systems: Vec<InstalledSystem>,
    pub defenses: Vec<InstalledDefense>,
    pub command_control: Vec<InstalledControl>,
    pub sensors: Vec<InstalledSystem>,
    pub hangar_misc: Vec<InstalledSystem>,
    pub weapons: Vec<InstalledSystem>,
    pub launch_systems: Vec<InstalledLauncher>,
    pub ordnance: Vec<InstalledSystem>,
    pub damage_zones: Vec<DamageZone>,
}

impl DesignState {
    /// An empty design on `hull` with the default damage-zone chart.
    pub fn new(hull: HullDefinition) -> Self {
        let damage_zones = default_damage_zones(&hull);
        Self {
            design_type: DesignType::default(),
            design_sub_type: None,
            metadata: BTreeMap::new(),
            hull,
            armor_layers: Vec::new(),
            power_plants: Vec::new(),
            engines: Vec::new(),
            ftl_drives: Vec::new(),
            life_support: Vec::new(),
            accommodations: Vec::new(),
            store_systems: Vec::new(),
            gravity_systems: Vec::new(),
            defenses: Vec::new(),
            command_control: Vec::new(),
            sensors: Vec::new(),
            hangar_misc: Vec::new(),
            weapons: Vec::new(),
            launch_systems: Vec::new(),
            ordnance: Vec::new(),
            damage_zones,
        }
    }

    /// Installed instances of one category. Empty for [`Category::Armor`].
    pub fn installed(&self, category: Category) -> Vec<&InstalledSystem> {
        match category {
            Category::Armor => Vec::new(),
            Category::PowerPlant => self.power_plants.iter().collect(),
            Category::Engine => self.engines.iter().collect(),
            Category::FtlDrive => self.ftl_drives.iter().collect(),
            Category::LifeSupport => self.life_support.iter().collect(),
            Category::Accommodation => self.accommodations.iter().collect(),
            Category::StoreSystem => self.store_systems.iter().collect(),
            Category::GravitySystem => self.gravity_systems.iter().collect(),
            Category::Defense => self.defenses.iter().map(|d| &d.system).collect(),
            Category::CommandControl => self.command_control.iter().map(|c| &c.system).collect(),
            Category::Sensor => self.sensors.iter().collect(),
            Category::HangarMisc => self.hangar_misc.iter().collect(),
            Category::Weapon => self.weapons.iter().collect(),
            Category::LaunchSystem => self.launch_systems.iter().map(|l| &l.system).collect(),
            Category::Ordnance => self.ordnance.iter().collect(),
        }
    }

    /// Every installed instance id, across all categories.
    pub fn instance_ids(&self) -> BTreeSet<&str> {
        Category::installed()
            .flat_map(|c| self.installed(c))
            .map(|s| s.instance_id.as_str())
            .collect()
    }

    pub fn find_instance(&self, instance_id: &str) -> Option<(Category, &InstalledSystem)> {
        Category::installed().find_map(|c| {
            self.installed(c)
                .into_iter()
                .find(|s| s.instance_id == instance_id)
                .map(|s| (c, s))
        })
    }

    /// Number of installed instances across all categories.
    pub fn system_count(&self) -> usize {
        Category::installed().map(|c| self.installed(c).len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HullSizeClass;

    fn hull() -> HullDefinition {
        HullDefinition::new("frigate", "Frigate", HullSizeClass::Medium)
    }

    #[test]
    fn default_chart_follows_size_class() {
        let zones = default_damage_zones(&hull());
        assert_eq!(zones.len(), 6);
        assert_eq!(zones[0].code, "Z1");
        assert_eq!(zones[5].code, "Z6");
        assert!(zones.iter().all(|z| z.systems.is_empty()));
    }

    #[test]
    fn design_type_parse_is_case_insensitive() {
        assert_eq!(DesignType::parse("Station"), Some(DesignType::Station));
        assert_eq!(DesignType::parse(" warship "), Some(DesignType::Warship));
        assert_eq!(DesignType::parse("dreadnought"), None);
    }

    #[test]
    fn instance_lookup_spans_categories() {
        let mut d = DesignState::new(hull());
        d.weapons.push(InstalledSystem::new("weapons-1", CatalogEntry::new("laser", "Laser"), 2));
        d.command_control.push(InstalledControl {
            system: InstalledSystem::new("cc-1", CatalogEntry::new("fire-control", "FC"), 1),
            link: None,
            linked_cost: None,
        });

        let (cat, sys) = d.find_instance("cc-1").unwrap();
        assert_eq!(cat, Category::CommandControl);
        assert_eq!(sys.entry.id, "fire-control");
        assert_eq!(d.system_count(), 2);
        assert!(d.instance_ids().contains("weapons-1"));
        assert!(d.find_instance("nope").is_none());
    }
}
