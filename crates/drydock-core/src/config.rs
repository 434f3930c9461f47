//! Configuration structures for drydock-core.
//!
//! The engine never reads files or environment variables. Hosts build an
//! [`EngineConfig`] (usually `Default`, or deserialized from JSON shipped next to
//! the game-data catalog) and hand it to the loader.
//!
//! Rename tables and the countermeasure packaging ratio are data, not logic:
//! they live here so content updates do not require code changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::errors::{DrydockError, DrydockResult};
use crate::version::SUPPORTED_MAJOR;

/// Global configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub limits: LimitsConfig,
    pub migration: MigrationConfig,
    /// Highest document major version accepted by the version gate.
    pub supported_major: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: LimitsConfig::default(),
            migration: MigrationConfig::default(),
            supported_major: SUPPORTED_MAJOR,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> DrydockResult<Self> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| DrydockError::serialization(format!("failed to parse engine config: {e}")))?;
        validate_config(&cfg)?;
        Ok(cfg)
    }
}

/// Input size limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitsConfig {
    /// Largest raw document accepted by the parser. Embedded portrait images
    /// make real documents much larger than their structural content.
    pub max_document_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Data consumed by the migration chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MigrationConfig {
    /// Raw countermeasure units per packaged set.
    pub countermeasure_units_per_set: u32,
    /// Retired id → current id, per category.
    pub renames: BTreeMap<Category, BTreeMap<String, String>>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            countermeasure_units_per_set: 4,
            renames: default_renames(),
        }
    }
}

fn default_renames() -> BTreeMap<Category, BTreeMap<String, String>> {
    let table = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(old, new)| (old.to_string(), new.to_string()))
            .collect()
    };

    let mut out = BTreeMap::new();
    out.insert(
        Category::Weapon,
        table(&[
            ("laser-light", "light-laser"),
            ("laser-heavy", "heavy-laser"),
            ("mass-driver-mk1", "mass-driver"),
            ("pd-gatling", "point-defense-gatling"),
        ]),
    );
    out.insert(
        Category::Ordnance,
        table(&[("missile-std", "standard-missile"), ("torpedo-std", "standard-torpedo")]),
    );
    out.insert(
        Category::Sensor,
        table(&[("radar-basic", "active-sensor-array")]),
    );
    out.insert(
        Category::PowerPlant,
        table(&[("fusion-reactor-std", "fusion-reactor")]),
    );
    out.insert(
        Category::CommandControl,
        table(&[("fire-control-basic", "fire-control")]),
    );
    out
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &EngineConfig) -> DrydockResult<()> {
    if cfg.limits.max_document_bytes == 0 {
        return Err(DrydockError::invalid_argument(
            "max_document_bytes must be greater than zero",
        ));
    }

    if cfg.migration.countermeasure_units_per_set == 0 {
        return Err(DrydockError::invalid_argument(
            "countermeasure_units_per_set must be greater than zero",
        ));
    }

    for (category, table) in &cfg.migration.renames {
        for (old, new) in table {
            if old.is_empty() || new.is_empty() {
                return Err(DrydockError::invalid_argument(format!(
                    "{category} rename table contains an empty id"
                )));
            }
        }
        crate::migrate::renames::close_table(table).map_err(|e| match e {
            DrydockError::InvalidArgument(msg) => {
                DrydockError::invalid_argument(format!("{category} rename table: {msg}"))
            }
            other => other,
        })?;
    }

    Ok(())
}
