//! Game-data catalog interface.
//!
//! The engine treats the catalog as a read-only lookup service: one flat list
//! of definitions per subsystem category plus the hull table. Resolution copies
//! the matching definition into the design (an owned snapshot), so later
//! catalog changes never reach an already loaded design.
//!
//! [`StaticCatalog`] is the in-memory implementation hosts usually use. It
//! deserializes from JSON and merges content-pack overlays by id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DrydockError, DrydockResult};

/// Catalog-backed subsystem categories.
///
/// Serialized names double as catalog file keys and rename-table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "armor")]
    Armor,
    #[serde(rename = "powerPlants")]
    PowerPlant,
    #[serde(rename = "engines")]
    Engine,
    #[serde(rename = "ftlDrives")]
    FtlDrive,
    #[serde(rename = "lifeSupport")]
    LifeSupport,
    #[serde(rename = "accommodations")]
    Accommodation,
    #[serde(rename = "storeSystems")]
    StoreSystem,
    #[serde(rename = "gravitySystems")]
    GravitySystem,
    #[serde(rename = "defenses")]
    Defense,
    #[serde(rename = "commandControl")]
    CommandControl,
    #[serde(rename = "sensors")]
    Sensor,
    #[serde(rename = "hangarMisc")]
    HangarMisc,
    #[serde(rename = "weapons")]
    Weapon,
    #[serde(rename = "launchSystems")]
    LaunchSystem,
    #[serde(rename = "ordnance")]
    Ordnance,
}

impl Category {
    /// All categories in resolution order.
    pub const ALL: [Category; 15] = [
        Category::Armor,
        Category::PowerPlant,
        Category::Engine,
        Category::FtlDrive,
        Category::LifeSupport,
        Category::Accommodation,
        Category::StoreSystem,
        Category::GravitySystem,
        Category::Defense,
        Category::CommandControl,
        Category::Sensor,
        Category::HangarMisc,
        Category::Weapon,
        Category::LaunchSystem,
        Category::Ordnance,
    ];

    /// Key of this category's list inside a design document.
    pub fn section_key(&self) -> &'static str {
        match self {
            Self::Armor => "armorLayers",
            Self::PowerPlant => "powerPlants",
            Self::Engine => "engines",
            Self::FtlDrive => "ftlDrives",
            Self::LifeSupport => "lifeSupport",
            Self::Accommodation => "accommodations",
            Self::StoreSystem => "storeSystems",
            Self::GravitySystem => "gravitySystems",
            Self::Defense => "defenses",
            Self::CommandControl => "commandControl",
            Self::Sensor => "sensors",
            Self::HangarMisc => "hangarMisc",
            Self::Weapon => "weapons",
            Self::LaunchSystem => "launchSystems",
            Self::Ordnance => "ordnance",
        }
    }

    /// Human-readable label used in warnings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Armor => "armor",
            Self::PowerPlant => "power plant",
            Self::Engine => "engine",
            Self::FtlDrive => "ftl drive",
            Self::LifeSupport => "life support",
            Self::Accommodation => "accommodation",
            Self::StoreSystem => "store system",
            Self::GravitySystem => "gravity system",
            Self::Defense => "defense",
            Self::CommandControl => "command/control",
            Self::Sensor => "sensor",
            Self::HangarMisc => "hangar/misc",
            Self::Weapon => "weapon",
            Self::LaunchSystem => "launch system",
            Self::Ordnance => "ordnance",
        }
    }

    /// Categories stored in the document as lists of installed instances
    /// (everything except armor, which is stored as layers).
    pub fn installed() -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(|c| *c != Category::Armor)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hull size class. Determines the default damage-zone layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HullSizeClass {
    Small,
    Light,
    Medium,
    Heavy,
    SuperHeavy,
    Colossal,
}

impl HullSizeClass {
    /// Number of hit-location zones in the default chart for this class.
    pub fn zone_count(&self) -> usize {
        match self {
            Self::Small => 2,
            Self::Light => 4,
            Self::Medium => 6,
            Self::Heavy => 8,
            Self::SuperHeavy => 12,
            Self::Colossal => 20,
        }
    }
}

/// A subsystem definition. Stored by value inside resolved designs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Hull points consumed per installed unit.
    #[serde(default)]
    pub hull_points: f64,
    /// Power drawn (negative) or produced (positive) per unit.
    #[serde(default)]
    pub power: f64,
    /// Base cost per unit.
    #[serde(default)]
    pub cost: f64,
    /// Extra cost per hull point of a linked target (command/control only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_cost_per_hull_point: Option<f64>,
    /// Category-specific data the engine does not interpret.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hull_points: 0.0,
            power: 0.0,
            cost: 0.0,
            linked_cost_per_hull_point: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_hull_points(mut self, hp: f64) -> Self {
        self.hull_points = hp;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_linked_cost(mut self, per_hull_point: f64) -> Self {
        self.linked_cost_per_hull_point = Some(per_hull_point);
        self
    }
}

/// A hull definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HullDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub size_class: HullSizeClass,
    #[serde(default)]
    pub hull_points: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl HullDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, size_class: HullSizeClass) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size_class,
            hull_points: 0.0,
            cost: 0.0,
            attributes: BTreeMap::new(),
        }
    }
}

/// Read-only lookup service consumed by the resolver.
///
/// Implementations must not change while a load borrows them.
pub trait Catalog {
    fn hulls(&self) -> &[HullDefinition];

    /// Every definition for a category (already merged with any overlays).
    fn entries(&self, category: Category) -> &[CatalogEntry];

    fn find_hull(&self, id: &str) -> Option<&HullDefinition> {
        self.hulls().iter().find(|h| h.id == id)
    }

    fn find(&self, category: Category, id: &str) -> Option<&CatalogEntry> {
        self.entries(category).iter().find(|e| e.id == id)
    }
}

/// In-memory catalog, deserializable from a JSON object keyed by category.
///
/// ```
/// use drydock_core::catalog::{Catalog, Category, StaticCatalog};
///
/// let catalog = StaticCatalog::from_json_str(r#"{
///     "hulls": [{"id": "frigate", "sizeClass": "light"}],
///     "weapons": [{"id": "light-laser", "hullPoints": 2}]
/// }"#).unwrap();
/// assert!(catalog.find(Category::Weapon, "light-laser").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    hulls: Vec<HullDefinition>,
    #[serde(flatten)]
    categories: BTreeMap<Category, Vec<CatalogEntry>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> DrydockResult<Self> {
        let catalog: Self = serde_json::from_str(raw)
            .map_err(|e| DrydockError::serialization(format!("failed to parse catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn with_hull(mut self, hull: HullDefinition) -> Self {
        self.insert_hull(hull);
        self
    }

    pub fn with_entry(mut self, category: Category, entry: CatalogEntry) -> Self {
        self.insert_entry(category, entry);
        self
    }

    /// Insert a hull, replacing any hull with the same id in place.
    pub fn insert_hull(&mut self, hull: HullDefinition) {
        match self.hulls.iter_mut().find(|h| h.id == hull.id) {
            Some(slot) => *slot = hull,
            None => self.hulls.push(hull),
        }
    }

    /// Insert an entry, replacing any entry with the same id in place.
    pub fn insert_entry(&mut self, category: Category, entry: CatalogEntry) {
        let list = self.categories.entry(category).or_default();
        match list.iter_mut().find(|e| e.id == entry.id) {
            Some(slot) => *slot = entry,
            None => list.push(entry),
        }
    }

    /// Merge a content-pack overlay on top of this catalog.
    ///
    /// Definitions are matched by id: an overlay definition replaces the
    /// existing one at its position, new ids are appended. Apply overlays in
    /// ascending priority order.
    pub fn merge_overlay(&mut self, overlay: StaticCatalog) {
        for hull in overlay.hulls {
            self.insert_hull(hull);
        }
        for (category, entries) in overlay.categories {
            for entry in entries {
                self.insert_entry(category, entry);
            }
        }
    }

    /// Reject duplicate ids within a table.
    pub fn validate(&self) -> DrydockResult<()> {
        use std::collections::HashSet;

        let mut seen = HashSet::new();
        for h in &self.hulls {
            if !seen.insert(h.id.as_str()) {
                return Err(DrydockError::invalid_argument(format!(
                    "duplicate hull id in catalog: {}",
                    h.id
                )));
            }
        }

        for (category, entries) in &self.categories {
            let mut seen = HashSet::new();
            for e in entries {
                if !seen.insert(e.id.as_str()) {
                    return Err(DrydockError::invalid_argument(format!(
                        "duplicate {category} id in catalog: {}",
                        e.id
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Catalog for StaticCatalog {
    fn hulls(&self) -> &[HullDefinition] {
        &self.hulls
    }

    fn entries(&self, category: Category) -> &[CatalogEntry] {
        self.categories
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
