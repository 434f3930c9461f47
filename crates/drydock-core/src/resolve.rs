//! Catalog resolution.
//!
//! Turns a migrated document into a [`PartialDesign`]: every id is looked up in
//! the catalog and replaced by an owned snapshot of its definition. The only
//! fatal outcome is a missing or unknown hull. Everything else that fails to
//! resolve is dropped and reported, so a successful load never carries a
//! dangling reference.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::catalog::{Catalog, Category, HullDefinition};
use crate::design::{
    default_damage_zones, ArmorLayer, ControlLink, DamageZone, DesignState, DesignType,
    InstalledControl, InstalledDefense, InstalledLauncher, InstalledSystem, LinkKind, LoadoutSlot,
};
use crate::errors::{DrydockError, DrydockResult};
use crate::pipeline::parse::SaveDocument;
use crate::report::{MigrationReport, ReportScope};
use crate::wire::{is_document_key, WireArmorLayer, WireDamageZone, WireInstance};

/// A resolved design whose derived values have not been computed yet.
///
/// Only [`crate::recompute::recompute`] turns it into a [`DesignState`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartialDesign {
    state: DesignState,
}

impl PartialDesign {
    pub fn state(&self) -> &DesignState {
        &self.state
    }

    pub(crate) fn into_state(self) -> DesignState {
        self.state
    }
}

/// Resolves migrated documents against a catalog.
pub struct CatalogResolver<'c> {
    catalog: &'c dyn Catalog,
}

impl<'c> CatalogResolver<'c> {
    pub fn new(catalog: &'c dyn Catalog) -> Self {
        Self { catalog }
    }

    pub fn resolve(
        &self,
        doc: &SaveDocument,
        report: &mut MigrationReport,
    ) -> DrydockResult<PartialDesign> {
        let empty = Map::new();
        let fields = doc.fields().unwrap_or(&empty);

        let hull = self.resolve_hull(fields)?;
        debug!(hull = %hull.id, "hull resolved");

        let mut state = DesignState::new(hull);
        state.design_type = resolve_design_type(fields, report);
        state.design_sub_type = resolve_sub_type(fields, report);
        state.metadata = fields
            .iter()
            .filter(|(k, _)| !is_document_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        state.armor_layers = self.resolve_armor(fields, report);

        state.power_plants = self.resolve_plain(fields, Category::PowerPlant, report);
        state.engines = self.resolve_plain(fields, Category::Engine, report);
        state.ftl_drives = self.resolve_plain(fields, Category::FtlDrive, report);
        state.life_support = self.resolve_plain(fields, Category::LifeSupport, report);
        state.accommodations = self.resolve_plain(fields, Category::Accommodation, report);
        state.store_systems = self.resolve_plain(fields, Category::StoreSystem, report);
        state.gravity_systems = self.resolve_plain(fields, Category::GravitySystem, report);
        state.defenses = self
            .resolve_section(fields, Category::Defense, report)
            .into_iter()
            .map(|(wire, system)| InstalledDefense {
                countermeasure_sets: resolve_countermeasure_sets(
                    wire.countermeasure_sets.as_ref(),
                    &system.instance_id,
                    report,
                ),
                system,
            })
            .collect();
        state.command_control = self
            .resolve_section(fields, Category::CommandControl, report)
            .into_iter()
            .map(|(wire, system)| InstalledControl {
                link: resolve_link(wire.link.as_ref(), &system.instance_id, report),
                system,
                linked_cost: None,
            })
            .collect();
        state.sensors = self.resolve_plain(fields, Category::Sensor, report);
        state.hangar_misc = self.resolve_plain(fields, Category::HangarMisc, report);
        state.weapons = self.resolve_plain(fields, Category::Weapon, report);
        state.launch_systems = self
            .resolve_section(fields, Category::LaunchSystem, report)
            .into_iter()
            .map(|(wire, system)| InstalledLauncher {
                loadout: self.resolve_loadout(wire.loadout.as_ref(), &system.instance_id, report),
                system,
            })
            .collect();
        state.ordnance = self.resolve_plain(fields, Category::Ordnance, report);

        state.damage_zones = resolve_damage_zones(fields, &state, report);

        Ok(PartialDesign { state })
    }

    fn resolve_hull(&self, fields: &Map<String, Value>) -> DrydockResult<HullDefinition> {
        match fields.get("hull") {
            Some(Value::String(id)) if !id.trim().is_empty() => self
                .catalog
                .find_hull(id)
                .cloned()
                .ok_or_else(|| DrydockError::missing_hull(format!("hull '{id}' not found in catalog"))),
            None | Some(Value::Null) | Some(Value::String(_)) => {
                Err(DrydockError::missing_hull("document has no hull reference"))
            }
            Some(other) => Err(DrydockError::missing_hull(format!(
                "hull reference must be an id, got {other}"
            ))),
        }
    }

    fn resolve_armor(
        &self,
        fields: &Map<String, Value>,
        report: &mut MigrationReport,
    ) -> Vec<ArmorLayer> {
        let mut layers = Vec::new();
        for (pos, item) in section_items(fields, Category::Armor, report) {
            let wire: WireArmorLayer = match serde_json::from_value(item.clone()) {
                Ok(w) => w,
                Err(e) => {
                    report.warn(
                        Category::Armor,
                        format!("malformed layer at position {pos} ({e}), layer removed"),
                    );
                    continue;
                }
            };
            match self.catalog.find(Category::Armor, &wire.armor_type) {
                Some(entry) => layers.push(ArmorLayer {
                    weight: wire.weight,
                    armor: entry.clone(),
                    options: wire.options,
                }),
                None => report.warn(
                    Category::Armor,
                    format!("could not find type '{}', layer removed", wire.armor_type),
                ),
            }
        }

        if layers.is_empty() {
            report.warn(Category::Armor, "no layers configured");
        }
        layers
    }

    fn resolve_plain(
        &self,
        fields: &Map<String, Value>,
        category: Category,
        report: &mut MigrationReport,
    ) -> Vec<InstalledSystem> {
        self.resolve_section(fields, category, report)
            .into_iter()
            .map(|(_, system)| system)
            .collect()
    }

    /// Resolve one installed-system section. Entries that are malformed or
    /// name an id the catalog does not have are dropped with a warning.
    fn resolve_section(
        &self,
        fields: &Map<String, Value>,
        category: Category,
        report: &mut MigrationReport,
    ) -> Vec<(WireInstance, InstalledSystem)> {
        let mut out = Vec::new();
        for (pos, item) in section_items(fields, category, report) {
            let mut wire: WireInstance = match serde_json::from_value(item.clone()) {
                Ok(w) => w,
                Err(e) => {
                    report.warn(
                        category,
                        format!("malformed entry at position {pos} ({e}), entry removed"),
                    );
                    continue;
                }
            };
            wire.release_foreign_fields(category);

            let Some(entry) = self.catalog.find(category, &wire.id) else {
                report.warn(
                    category,
                    format!("could not find type '{}', entry removed", wire.id),
                );
                continue;
            };

            let instance_id = wire
                .instance_id
                .clone()
                .unwrap_or_else(|| format!("{}-{}", category.section_key(), pos + 1));
            // Derived values are recomputed, never trusted from storage.
            wire.options.remove("linkedCost");

            let system = InstalledSystem {
                instance_id,
                entry: entry.clone(),
                quantity: wire.quantity,
                options: std::mem::take(&mut wire.options),
            };
            out.push((wire, system));
        }
        out
    }

    fn resolve_loadout(
        &self,
        loadout: Option<&Value>,
        instance_id: &str,
        report: &mut MigrationReport,
    ) -> Vec<LoadoutSlot> {
        let scope = Category::LaunchSystem;
        let map = match loadout {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                report.warn(
                    scope,
                    format!("unreadable loadout on '{instance_id}', loadout cleared"),
                );
                return Vec::new();
            }
        };

        let mut slots = Vec::new();
        for (ordnance_id, qty) in map {
            let Some(quantity) = qty.as_u64().and_then(|q| u32::try_from(q).ok()) else {
                report.warn(
                    scope,
                    format!(
                        "malformed quantity for '{ordnance_id}' in loadout of '{instance_id}', slot removed"
                    ),
                );
                continue;
            };
            match self.catalog.find(Category::Ordnance, ordnance_id) {
                Some(entry) => slots.push(LoadoutSlot {
                    ordnance: entry.clone(),
                    quantity,
                }),
                None => report.warn(
                    scope,
                    format!(
                        "could not find ordnance '{ordnance_id}' in loadout of '{instance_id}', slot removed"
                    ),
                ),
            }
        }
        slots
    }
}

/// Resolve `doc` against `catalog`.
pub fn resolve(
    doc: &SaveDocument,
    catalog: &dyn Catalog,
    report: &mut MigrationReport,
) -> DrydockResult<PartialDesign> {
    CatalogResolver::new(catalog).resolve(doc, report)
}

/// Items of a section list, with their positions. A section that is present
/// but not a list is reported and treated as empty.
fn section_items<'a>(
    fields: &'a Map<String, Value>,
    category: Category,
    report: &mut MigrationReport,
) -> Vec<(usize, &'a Value)> {
    match fields.get(category.section_key()) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().enumerate().collect(),
        Some(_) => {
            report.warn(category, "section is not a list, ignored");
            Vec::new()
        }
    }
}

fn resolve_countermeasure_sets(
    value: Option<&Value>,
    instance_id: &str,
    report: &mut MigrationReport,
) -> Option<u32> {
    let value = value?;
    if value.is_null() {
        return None;
    }
    let sets = value.as_u64().and_then(|n| u32::try_from(n).ok());
    if sets.is_none() {
        report.warn(
            Category::Defense,
            format!("malformed countermeasure sets on '{instance_id}' ({value}), value removed"),
        );
    }
    sets
}

fn resolve_design_type(fields: &Map<String, Value>, report: &mut MigrationReport) -> DesignType {
    match fields.get("designType") {
        None | Some(Value::Null) => DesignType::default(),
        Some(Value::String(s)) => DesignType::parse(s).unwrap_or_else(|| {
            report.warn(
                ReportScope::Document,
                format!("unrecognized design type '{s}', treated as warship"),
            );
            DesignType::default()
        }),
        Some(other) => {
            report.warn(
                ReportScope::Document,
                format!("unrecognized design type {other}, treated as warship"),
            );
            DesignType::default()
        }
    }
}

fn resolve_sub_type(fields: &Map<String, Value>, report: &mut MigrationReport) -> Option<String> {
    match fields.get("designSubType") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            report.warn(
                ReportScope::Document,
                format!("design sub-type must be text, got {other}, ignored"),
            );
            None
        }
    }
}

fn resolve_link(
    link: Option<&Value>,
    instance_id: &str,
    report: &mut MigrationReport,
) -> Option<ControlLink> {
    let value = match link {
        None | Some(Value::Null) => return None,
        Some(v) => v,
    };

    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .and_then(LinkKind::parse);
    let target = value.get("instanceId").and_then(Value::as_str);

    match (kind, target) {
        (Some(kind), Some(target)) => Some(ControlLink {
            kind,
            instance_id: target.to_string(),
        }),
        _ => {
            report.warn(
                Category::CommandControl,
                format!("unrecognized link on '{instance_id}' ignored"),
            );
            None
        }
    }
}

/// Use the stored chart with dangling references removed, or synthesize the
/// default chart when the document has none.
fn resolve_damage_zones(
    fields: &Map<String, Value>,
    state: &DesignState,
    report: &mut MigrationReport,
) -> Vec<DamageZone> {
    let items = match fields.get("damageZones") {
        None | Some(Value::Null) => return default_damage_zones(&state.hull),
        Some(Value::Array(items)) => items,
        Some(_) => {
            report.warn(
                ReportScope::DamageZones,
                "chart is not a list, default chart used",
            );
            return default_damage_zones(&state.hull);
        }
    };

    let installed = state.instance_ids();
    let mut seen_codes = BTreeSet::new();
    let mut zones = Vec::with_capacity(items.len());

    for (pos, item) in items.iter().enumerate() {
        let wire: WireDamageZone = match serde_json::from_value(item.clone()) {
            Ok(z) => z,
            Err(e) => {
                report.warn(
                    ReportScope::DamageZones,
                    format!("malformed zone at position {pos} ({e}), zone removed"),
                );
                continue;
            }
        };
        if !seen_codes.insert(wire.code.clone()) {
            report.warn(
                ReportScope::DamageZones,
                format!("duplicate zone '{}' removed", wire.code),
            );
            continue;
        }

        let mut systems = Vec::with_capacity(wire.systems.len());
        for system in wire.systems {
            if installed.contains(system.as_str()) {
                systems.push(system);
            } else {
                report.warn(
                    ReportScope::DamageZones,
                    format!(
                        "system '{system}' in zone '{}' is no longer installed, reference removed",
                        wire.code
                    ),
                );
            }
        }
        zones.push(DamageZone {
            code: wire.code,
            systems,
        });
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, HullSizeClass, StaticCatalog};
    use assert_matches::assert_matches;
    use serde_json::json;

    fn catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with_hull(HullDefinition::new("frigate", "Frigate", HullSizeClass::Light))
            .with_entry(Category::Armor, CatalogEntry::new("ablative", "Ablative"))
            .with_entry(Category::Weapon, CatalogEntry::new("light-laser", "Light Laser"))
            .with_entry(Category::Sensor, CatalogEntry::new("active-sensor-array", "ASA"))
            .with_entry(Category::CommandControl, CatalogEntry::new("fire-control", "FC"))
            .with_entry(Category::LaunchSystem, CatalogEntry::new("vls", "VLS"))
            .with_entry(Category::Ordnance, CatalogEntry::new("standard-missile", "Missile"))
            .with_entry(Category::Defense, CatalogEntry::new("chaff-dispenser", "Chaff"))
    }

    fn doc(v: Value) -> SaveDocument {
        SaveDocument::from_value(v).unwrap()
    }

    fn base() -> Value {
        json!({
            "hull": "frigate",
            "armorLayers": [{"weight": "light", "type": "ablative"}]
        })
    }

    fn resolve(v: Value) -> (DrydockResult<PartialDesign>, MigrationReport) {
        let cat = catalog();
        let mut report = MigrationReport::new();
        let r = super::resolve(&doc(v), &cat, &mut report);
        (r, report)
    }

    #[test]
    fn missing_hull_is_fatal() {
        let (r, _) = resolve(json!({"weapons": []}));
        assert_matches!(r, Err(DrydockError::MissingHull(_)));

        let (r, _) = resolve(json!({"hull": "dreadnought"}));
        assert_matches!(r, Err(DrydockError::MissingHull(m)) if m.contains("dreadnought"));

        let (r, _) = resolve(json!({"hull": ""}));
        assert_matches!(r, Err(DrydockError::MissingHull(_)));
    }

    #[test]
    fn clean_document_resolves_without_warnings() {
        let mut v = base();
        v["name"] = json!("Vigilant");
        v["weapons"] = json!([{"instanceId": "weapons-1", "id": "light-laser", "quantity": 2}]);
        let (r, report) = resolve(v);
        let state = r.unwrap().into_state();
        assert!(report.is_empty(), "{:?}", report.messages());
        assert_eq!(state.weapons[0].quantity, 2);
        assert_eq!(state.metadata["name"], "Vigilant");
        assert_eq!(state.damage_zones.len(), 4);
    }

    #[test]
    fn unknown_ids_are_dropped_with_labelled_warning() {
        let mut v = base();
        v["sensors"] = json!([
            {"instanceId": "sensors-1", "id": "old-radar-mk1"},
            {"instanceId": "sensors-2", "id": "active-sensor-array"}
        ]);
        let (r, report) = resolve(v);
        let state = r.unwrap().into_state();
        assert_eq!(state.sensors.len(), 1);
        assert_eq!(
            report.messages(),
            vec!["sensor: could not find type 'old-radar-mk1', entry removed"]
        );
    }

    #[test]
    fn missing_armor_warns() {
        let (r, report) = resolve(json!({"hull": "frigate"}));
        assert!(r.unwrap().state().armor_layers.is_empty());
        assert_eq!(report.messages(), vec!["armor: no layers configured"]);
    }

    #[test]
    fn malformed_entry_is_dropped() {
        let mut v = base();
        v["weapons"] = json!([{"quantity": 3}, "laser"]);
        let (r, report) = resolve(v);
        assert!(r.unwrap().state().weapons.is_empty());
        assert_eq!(report.len(), 2);
        assert!(report.messages()[0].starts_with("weapon: malformed entry at position 0"));
    }

    #[test]
    fn loadout_slots_checked_against_ordnance() {
        let mut v = base();
        v["launchSystems"] = json!([{
            "instanceId": "launchSystems-1",
            "id": "vls",
            "loadout": {"standard-missile": 6, "nuke": 1}
        }]);
        let (r, report) = resolve(v);
        let state = r.unwrap().into_state();
        let launcher = &state.launch_systems[0];
        assert_eq!(launcher.rounds(), 6);
        assert_eq!(launcher.loadout[0].ordnance.id, "standard-missile");
        assert_eq!(report.len(), 1);
        assert!(report.messages()[0].contains("could not find ordnance 'nuke'"));
    }

    #[test]
    fn links_and_stored_linked_cost() {
        let mut v = base();
        v["commandControl"] = json!([
            {"instanceId": "cc-1", "id": "fire-control", "linkedCost": 999,
             "link": {"kind": "weapon", "instanceId": "weapons-1"}},
            {"instanceId": "cc-2", "id": "fire-control", "link": {"kind": "hangar"}}
        ]);
        let (r, report) = resolve(v);
        let state = r.unwrap().into_state();
        let cc = &state.command_control;
        assert_eq!(cc[0].link.as_ref().unwrap().kind, LinkKind::Weapon);
        assert!(cc[0].system.options.is_empty());
        assert!(cc[0].linked_cost.is_none());
        assert!(cc[1].link.is_none());
        assert_eq!(
            report.messages(),
            vec!["command/control: unrecognized link on 'cc-2' ignored"]
        );
    }

    #[test]
    fn design_type_defaults() {
        let (r, report) = resolve(base());
        assert_eq!(r.unwrap().state().design_type, DesignType::Warship);
        assert!(report.is_empty());

        let mut v = base();
        v["designType"] = json!("station");
        v["designSubType"] = json!("orbital-fort");
        let (r, _) = resolve(v);
        let partial = r.unwrap();
        assert_eq!(partial.state().design_type, DesignType::Station);
        assert_eq!(partial.state().design_sub_type.as_deref(), Some("orbital-fort"));

        let mut v = base();
        v["designType"] = json!("dreadnought");
        let (r, report) = resolve(v);
        assert_eq!(r.unwrap().state().design_type, DesignType::Warship);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn damage_zone_references_cleaned() {
        let mut v = base();
        v["weapons"] = json!([{"instanceId": "weapons-1", "id": "light-laser"}]);
        v["damageZones"] = json!([
            {"code": "Z1", "systems": ["weapons-1", "weapons-9"]},
            {"code": "Z2"}
        ]);
        let (r, report) = resolve(v);
        let state = r.unwrap().into_state();
        assert_eq!(state.damage_zones.len(), 2);
        assert_eq!(state.damage_zones[0].systems, vec!["weapons-1"]);
        assert_eq!(report.len(), 1);
        assert!(report.messages()[0].starts_with("damage zones: system 'weapons-9'"));
    }

    #[test]
    fn fields_of_other_categories_are_kept_as_options() {
        let mut v = base();
        v["weapons"] = json!([{
            "instanceId": "weapons-1",
            "id": "light-laser",
            "loadout": {"standard-missile": 4},
            "link": {"kind": "sensor", "instanceId": "sensors-1"},
            "countermeasureSets": 2
        }]);
        let (r, report) = resolve(v);
        let state = r.unwrap().into_state();
        assert!(report.is_empty(), "{:?}", report.messages());
        let opts = &state.weapons[0].options;
        assert_eq!(opts["loadout"], json!({"standard-missile": 4}));
        assert_eq!(opts["link"]["kind"], "sensor");
        assert_eq!(opts["countermeasureSets"], 2);
    }

    #[test]
    fn malformed_countermeasure_sets_are_reported() {
        let mut v = base();
        v["defenses"] = json!([
            {"instanceId": "defenses-1", "id": "chaff-dispenser", "countermeasureSets": "lots"},
            {"instanceId": "defenses-2", "id": "chaff-dispenser", "countermeasureSets": 4}
        ]);
        let (r, report) = resolve(v);
        let state = r.unwrap().into_state();
        assert_eq!(state.defenses[0].countermeasure_sets, None);
        assert_eq!(state.defenses[1].countermeasure_sets, Some(4));
        assert_eq!(
            report.messages(),
            vec!["defense: malformed countermeasure sets on 'defenses-1' (\"lots\"), value removed"]
        );
    }
}
