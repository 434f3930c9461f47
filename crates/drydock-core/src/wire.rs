//! Current-version document shapes.
//!
//! After migration every section of a document has exactly these shapes. The
//! resolver reads entries through them one at a time so a single malformed
//! entry is dropped with a warning instead of failing the whole load. The
//! serializer writes them back out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Category;
use crate::migrate::steps::LEGACY_FIELD_RENAMES;

/// Top-level keys owned by the engine. Everything else is metadata.
pub const DOCUMENT_KEYS: &[&str] = &[
    "schemaVersion",
    "designType",
    "designSubType",
    "hull",
    "damageZones",
];

/// Keys every installed instance owns, whatever its category.
pub const INSTANCE_KEYS: &[&str] = &["instanceId", "id", "quantity", "linkedCost"];

/// The extra field an instance of `category` owns, if any.
pub fn category_field(category: Category) -> Option<&'static str> {
    match category {
        Category::Defense => Some("countermeasureSets"),
        Category::CommandControl => Some("link"),
        Category::LaunchSystem => Some("loadout"),
        _ => None,
    }
}

/// Whether `key` is owned by an instance of `category` rather than being an option.
pub fn is_instance_key(category: Category, key: &str) -> bool {
    INSTANCE_KEYS.contains(&key) || category_field(category) == Some(key)
}

/// Keys owned by an armor layer.
pub const ARMOR_LAYER_KEYS: &[&str] = &["weight", "type"];

/// Whether a top-level key belongs to the engine rather than the host.
pub fn is_document_key(key: &str) -> bool {
    DOCUMENT_KEYS.contains(&key) || Category::ALL.iter().any(|c| c.section_key() == key)
}

/// Whether a top-level key would be consumed by migration on the next load.
pub fn is_legacy_key(key: &str) -> bool {
    key == "armor" || LEGACY_FIELD_RENAMES.iter().any(|(old, _)| *old == key)
}

fn one() -> u32 {
    1
}

fn is_one(q: &u32) -> bool {
    *q == 1
}

/// One entry of an installed-system section.
///
/// The category fields stay loosely typed: a broken value is reported on its
/// own without discarding the system that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    pub id: String,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countermeasure_sets: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadout: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Value>,
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl WireInstance {
    /// Move category fields that `category` does not own into `options`, so
    /// they travel with the instance like any other option.
    pub fn release_foreign_fields(&mut self, category: Category) {
        let owned = category_field(category);
        let fields = [
            ("countermeasureSets", &mut self.countermeasure_sets),
            ("link", &mut self.link),
            ("loadout", &mut self.loadout),
        ];
        for (key, slot) in fields {
            if owned == Some(key) {
                continue;
            }
            if let Some(value) = slot.take() {
                self.options.insert(key.to_string(), value);
            }
        }
    }
}

/// One armor layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireArmorLayer {
    #[serde(default)]
    pub weight: String,
    #[serde(rename = "type")]
    pub armor_type: String,
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

/// One hit-location zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDamageZone {
    pub code: String,
    #[serde(default)]
    pub systems: Vec<String>,
}

/// Keep only options that will not collide with an owned key when flattened.
pub fn free_options<'a>(
    options: &'a BTreeMap<String, Value>,
    owned: &'a [&'a str],
) -> impl Iterator<Item = (&'a String, &'a Value)> + 'a {
    options.iter().filter(move |(k, _)| !owned.contains(&k.as_str()))
}
