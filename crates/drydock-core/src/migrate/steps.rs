//! Standard migration steps.
//!
//! Each step owns exactly one structural concern and works on a copy of the
//! document. Targets that are absent, `null`, or already in current shape are
//! left alone, which is what makes every step idempotent.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use crate::catalog::Category;
use crate::migrate::renames::RenameTables;
use crate::migrate::MigrationStep;

/// Top-level keys renamed over the document format's history (old → new).
pub const LEGACY_FIELD_RENAMES: &[(&str, &str)] = &[
    ("shipType", "designType"),
    ("shipSubType", "designSubType"),
    ("hullId", "hull"),
    ("fireControl", "commandControl"),
    ("miscSystems", "hangarMisc"),
];

fn rewrite_object(doc: &Value, f: impl FnOnce(&mut Map<String, Value>)) -> Value {
    let mut out = doc.clone();
    if let Some(map) = out.as_object_mut() {
        f(map);
    }
    out
}

fn for_each_entry(map: &mut Map<String, Value>, key: &str, mut f: impl FnMut(&mut Map<String, Value>)) {
    if let Some(Value::Array(items)) = map.get_mut(key) {
        for item in items.iter_mut() {
            if let Some(obj) = item.as_object_mut() {
                f(obj);
            }
        }
    }
}

fn is_absent(v: Option<&Value>) -> bool {
    v.map_or(true, Value::is_null)
}

/// Step: move legacy top-level keys to their current names.
///
/// When both the legacy and the current key are present, the current key wins.
pub struct RenameLegacyFields;

impl MigrationStep for RenameLegacyFields {
    fn id(&self) -> &str {
        "doc.rename_legacy_fields"
    }

    fn description(&self) -> &str {
        "Rename legacy top-level fields to their current names"
    }

    fn apply(&self, doc: &Value) -> Value {
        rewrite_object(doc, |map| {
            for (old, new) in LEGACY_FIELD_RENAMES {
                if let Some(v) = map.remove(*old) {
                    if is_absent(map.get(*new)) {
                        map.insert(new.to_string(), v);
                    }
                }
            }
        })
    }
}

/// Step: `hull: {"id": "..."}` → `hull: "..."`.
pub struct FlattenHullReference;

impl MigrationStep for FlattenHullReference {
    fn id(&self) -> &str {
        "hull.flatten_reference"
    }

    fn description(&self) -> &str {
        "Store the hull reference as a plain id string"
    }

    fn apply(&self, doc: &Value) -> Value {
        rewrite_object(doc, |map| {
            let id = map
                .get("hull")
                .and_then(|h| h.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(id) = id {
                map.insert("hull".to_string(), Value::String(id));
            }
        })
    }
}

/// Step: a single legacy `armor` selection becomes a one-element `armorLayers`
/// list. Documents that already carry `armorLayers` keep them and lose only the
/// stale legacy field.
pub struct ArmorLayersFromSingle;

impl MigrationStep for ArmorLayersFromSingle {
    fn id(&self) -> &str {
        "armor.layers_from_single"
    }

    fn description(&self) -> &str {
        "Convert the legacy single armor field into a layered armor list"
    }

    fn apply(&self, doc: &Value) -> Value {
        rewrite_object(doc, |map| {
            let Some(legacy) = map.remove("armor") else {
                return;
            };
            if !is_absent(map.get("armorLayers")) || legacy.is_null() {
                return;
            }
            map.insert("armorLayers".to_string(), Value::Array(vec![legacy]));
        })
    }
}

/// Step: raw countermeasure unit counts on defenses become packaged set counts.
///
/// `sets = floor(units / units_per_set)`; fractional sets are never invented.
pub struct CountermeasureSets {
    units_per_set: u64,
}

impl CountermeasureSets {
    pub fn new(units_per_set: u32) -> Self {
        Self {
            units_per_set: u64::from(units_per_set.max(1)),
        }
    }
}

fn as_unit_count(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    if v.as_i64().is_some() {
        return Some(0);
    }
    v.as_f64().map(|f| if f > 0.0 { f.floor() as u64 } else { 0 })
}

impl MigrationStep for CountermeasureSets {
    fn id(&self) -> &str {
        "defense.countermeasure_sets"
    }

    fn description(&self) -> &str {
        "Normalize raw countermeasure units into packaged set counts"
    }

    fn apply(&self, doc: &Value) -> Value {
        rewrite_object(doc, |map| {
            for_each_entry(map, Category::Defense.section_key(), |entry| {
                let Some(units) = entry.get("countermeasureUnits").and_then(as_unit_count) else {
                    return;
                };
                entry.remove("countermeasureUnits");
                if is_absent(entry.get("countermeasureSets")) {
                    entry.insert(
                        "countermeasureSets".to_string(),
                        Value::from(units / self.units_per_set),
                    );
                }
            });
        })
    }
}

/// Step: launch-system loadouts stored as `[{ordnanceId, quantity}]` become a
/// map of ordnance id → quantity. Duplicate ids are summed. A list containing
/// anything unrecognisable is left as-is for the resolver to report.
pub struct LoadoutListToMap;

fn loadout_list_to_map(list: &[Value]) -> Option<Map<String, Value>> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    for item in list {
        let obj = item.as_object()?;
        let id = obj
            .get("ordnanceId")
            .or_else(|| obj.get("id"))
            .and_then(Value::as_str)?;
        let qty = match obj.get("quantity") {
            None | Some(Value::Null) => 1,
            Some(q) => q.as_u64()?,
        };
        *totals.entry(id.to_string()).or_default() += qty;
    }
    Some(totals.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
}

impl MigrationStep for LoadoutListToMap {
    fn id(&self) -> &str {
        "launch.loadout_list_to_map"
    }

    fn description(&self) -> &str {
        "Convert launch-system loadout lists into ordnance-id maps"
    }

    fn apply(&self, doc: &Value) -> Value {
        rewrite_object(doc, |map| {
            for_each_entry(map, Category::LaunchSystem.section_key(), |entry| {
                let converted = match entry.get("loadout") {
                    Some(Value::Array(list)) => loadout_list_to_map(list),
                    _ => None,
                };
                if let Some(m) = converted {
                    entry.insert("loadout".to_string(), Value::Object(m));
                }
            });
        })
    }
}

/// Step: give every installed instance a unique `instanceId`.
///
/// Ids are unique across the whole design. Missing, empty and duplicate ids
/// are replaced with `<section>-<n>`, choosing the smallest `n` not already
/// taken. Numeric ids are kept as strings.
pub struct AssignInstanceIds;

fn existing_instance_id(v: Option<&Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

impl MigrationStep for AssignInstanceIds {
    fn id(&self) -> &str {
        "instances.assign_ids"
    }

    fn description(&self) -> &str {
        "Assign stable instance ids to installed systems"
    }

    fn apply(&self, doc: &Value) -> Value {
        rewrite_object(doc, |map| {
            let all: HashSet<String> = Category::installed()
                .filter_map(|c| map.get(c.section_key()).and_then(Value::as_array))
                .flatten()
                .filter_map(|i| existing_instance_id(i.get("instanceId")))
                .collect();
            let mut used: HashSet<String> = HashSet::new();

            for category in Category::installed() {
                let key = category.section_key();
                let Some(Value::Array(items)) = map.get_mut(key) else {
                    continue;
                };
                let mut next = 1usize;

                for item in items.iter_mut() {
                    let Some(obj) = item.as_object_mut() else {
                        continue;
                    };
                    let id = match existing_instance_id(obj.get("instanceId")) {
                        Some(id) if !used.contains(&id) => id,
                        _ => loop {
                            let candidate = format!("{key}-{next}");
                            next += 1;
                            if !all.contains(&candidate) && !used.contains(&candidate) {
                                break candidate;
                            }
                        },
                    };
                    used.insert(id.clone());
                    obj.insert("instanceId".to_string(), Value::String(id));
                }
            }
        })
    }
}

/// Step: legacy positional links on command/control systems
/// (`linkedWeaponIndex`, `linkedSensorIndex`) become
/// `link: {kind, instanceId}` objects.
///
/// Must run after [`AssignInstanceIds`]. An index past the end of the target
/// list still produces a link (to `"<section>[<index>]"`) so the orphan is
/// reported when derived stats are recomputed. Negative indices meant
/// "unlinked".
pub struct IndexLinksToInstanceLinks;

fn instance_ids(map: &Map<String, Value>, key: &str) -> Vec<Option<String>> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|i| i.get("instanceId").and_then(Value::as_str).map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn take_index(entry: &mut Map<String, Value>, key: &str) -> Option<Option<usize>> {
    let idx = entry.get(key).and_then(Value::as_i64)?;
    entry.remove(key);
    Some(usize::try_from(idx).ok())
}

fn link_value(kind: &str, section: &str, ids: &[Option<String>], idx: usize) -> Value {
    let instance = ids
        .get(idx)
        .cloned()
        .flatten()
        .unwrap_or_else(|| format!("{section}[{idx}]"));
    serde_json::json!({ "kind": kind, "instanceId": instance })
}

impl MigrationStep for IndexLinksToInstanceLinks {
    fn id(&self) -> &str {
        "control.index_links"
    }

    fn description(&self) -> &str {
        "Replace positional control-system links with instance-id links"
    }

    fn apply(&self, doc: &Value) -> Value {
        rewrite_object(doc, |map| {
            let weapons_key = Category::Weapon.section_key();
            let sensors_key = Category::Sensor.section_key();
            let weapons = instance_ids(map, weapons_key);
            let sensors = instance_ids(map, sensors_key);

            for_each_entry(map, Category::CommandControl.section_key(), |entry| {
                let weapon_idx = take_index(entry, "linkedWeaponIndex");
                let sensor_idx = take_index(entry, "linkedSensorIndex");
                if !is_absent(entry.get("link")) {
                    return;
                }
                let link = match (weapon_idx.flatten(), sensor_idx.flatten()) {
                    (Some(i), _) => Some(link_value("weapon", weapons_key, &weapons, i)),
                    (None, Some(i)) => Some(link_value("sensor", sensors_key, &sensors, i)),
                    (None, None) => None,
                };
                if let Some(link) = link {
                    entry.insert("link".to_string(), link);
                }
            });
        })
    }
}

/// Step: rewrite retired catalog ids to their current ids.
///
/// Applies to instance `id`s, armor layer `type`s and, for ordnance, to
/// launch-system loadout keys. Unknown ids pass through untouched.
pub struct RenameIds {
    tables: RenameTables,
}

impl RenameIds {
    pub fn new(tables: RenameTables) -> Self {
        Self { tables }
    }

    fn rename_field(&self, category: Category, entry: &mut Map<String, Value>, field: &str) {
        let renamed = entry
            .get(field)
            .and_then(Value::as_str)
            .and_then(|id| self.tables.lookup(category, id))
            .map(str::to_string);
        if let Some(new_id) = renamed {
            entry.insert(field.to_string(), Value::String(new_id));
        }
    }

    fn rename_loadout(&self, loadout: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (id, qty) in loadout {
            let key = self
                .tables
                .lookup(Category::Ordnance, id)
                .unwrap_or(id.as_str())
                .to_string();
            let merged = match (out.get(&key).and_then(Value::as_u64), qty.as_u64()) {
                (Some(a), Some(b)) => Value::from(a + b),
                (Some(_), None) => continue,
                _ => qty.clone(),
            };
            out.insert(key, merged);
        }
        out
    }
}

impl MigrationStep for RenameIds {
    fn id(&self) -> &str {
        "ids.rename"
    }

    fn description(&self) -> &str {
        "Rewrite retired catalog ids to their current ids"
    }

    fn apply(&self, doc: &Value) -> Value {
        if self.tables.is_empty() {
            return doc.clone();
        }
        rewrite_object(doc, |map| {
            for category in self.tables.categories() {
                let field = if category == Category::Armor { "type" } else { "id" };
                for_each_entry(map, category.section_key(), |entry| {
                    self.rename_field(category, entry, field);
                });
            }

            if self.tables.categories().any(|c| c == Category::Ordnance) {
                for_each_entry(map, Category::LaunchSystem.section_key(), |entry| {
                    let renamed = match entry.get("loadout") {
                        Some(Value::Object(loadout)) => Some(self.rename_loadout(loadout)),
                        _ => None,
                    };
                    if let Some(l) = renamed {
                        entry.insert("loadout".to_string(), Value::Object(l));
                    }
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrationConfig;
    use proptest::prelude::*;
    use serde_json::json;

    fn idempotent(step: &dyn MigrationStep, doc: &Value) {
        let once = step.apply(doc);
        let twice = step.apply(&once);
        assert_eq!(once, twice, "step {} is not idempotent", step.id());
    }

    fn standard_renames() -> RenameIds {
        RenameIds::new(RenameTables::new(&MigrationConfig::default().renames).unwrap())
    }

    #[test]
    fn legacy_fields_move_and_current_wins() {
        let out = RenameLegacyFields.apply(&json!({
            "shipType": "station",
            "hullId": "old",
            "hull": "new",
            "miscSystems": [{"id": "cargo"}]
        }));
        assert_eq!(out, json!({
            "designType": "station",
            "hull": "new",
            "hangarMisc": [{"id": "cargo"}]
        }));
    }

    #[test]
    fn hull_object_is_flattened() {
        let out = FlattenHullReference.apply(&json!({"hull": {"id": "destroyer", "name": "x"}}));
        assert_eq!(out["hull"], "destroyer");
        let untouched = json!({"hull": {"name": "no id"}});
        assert_eq!(FlattenHullReference.apply(&untouched), untouched);
    }

    #[test]
    fn single_armor_becomes_one_layer() {
        let out = ArmorLayersFromSingle.apply(&json!({
            "armor": {"weight": "medium", "type": "ablative"}
        }));
        assert_eq!(out, json!({"armorLayers": [{"weight": "medium", "type": "ablative"}]}));
    }

    #[test]
    fn existing_layers_win_over_legacy_armor() {
        let out = ArmorLayersFromSingle.apply(&json!({
            "armor": {"weight": "light", "type": "polymer"},
            "armorLayers": [{"weight": "heavy", "type": "neutronite"}]
        }));
        assert_eq!(out, json!({"armorLayers": [{"weight": "heavy", "type": "neutronite"}]}));
    }

    #[test]
    fn null_armor_is_dropped_without_layers() {
        let out = ArmorLayersFromSingle.apply(&json!({"armor": null}));
        assert_eq!(out, json!({}));
    }

    #[test]
    fn countermeasures_round_down() {
        let step = CountermeasureSets::new(4);
        let out = step.apply(&json!({"defenses": [
            {"id": "chaff", "countermeasureUnits": 12},
            {"id": "flares", "countermeasureUnits": 10},
            {"id": "decoys", "countermeasureSets": 5},
            {"id": "odd", "countermeasureUnits": 7.9}
        ]}));
        assert_eq!(out["defenses"][0]["countermeasureSets"], 3);
        assert_eq!(out["defenses"][1]["countermeasureSets"], 2);
        assert_eq!(out["defenses"][2]["countermeasureSets"], 5);
        assert_eq!(out["defenses"][3]["countermeasureSets"], 1);
        assert!(out["defenses"][0].get("countermeasureUnits").is_none());
    }

    #[test]
    fn set_count_wins_over_units() {
        let out = CountermeasureSets::new(4).apply(&json!({"defenses": [
            {"id": "chaff", "countermeasureUnits": 40, "countermeasureSets": 2}
        ]}));
        assert_eq!(out["defenses"][0], json!({"id": "chaff", "countermeasureSets": 2}));
    }

    #[test]
    fn loadout_list_sums_duplicates() {
        let out = LoadoutListToMap.apply(&json!({"launchSystems": [{"id": "vls", "loadout": [
            {"ordnanceId": "a", "quantity": 2},
            {"ordnanceId": "b"},
            {"ordnanceId": "a", "quantity": 3}
        ]}]}));
        assert_eq!(out["launchSystems"][0]["loadout"], json!({"a": 5, "b": 1}));
    }

    #[test]
    fn malformed_loadout_left_for_resolver() {
        let doc = json!({"launchSystems": [{"id": "vls", "loadout": [{"quantity": 2}]}]});
        assert_eq!(LoadoutListToMap.apply(&doc), doc);
    }

    #[test]
    fn instance_ids_fill_gaps_and_duplicates() {
        let out = AssignInstanceIds.apply(&json!({"weapons": [
            {"id": "a"},
            {"id": "b", "instanceId": "weapons-1"},
            {"id": "c", "instanceId": "main-gun"},
            {"id": "d", "instanceId": "main-gun"},
            {"id": "e", "instanceId": 7}
        ]}));
        let ids: Vec<&str> = out["weapons"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["instanceId"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["weapons-2", "weapons-1", "main-gun", "weapons-3", "7"]);
    }

    #[test]
    fn instance_ids_are_unique_across_sections() {
        let out = AssignInstanceIds.apply(&json!({
            "sensors": [{"id": "radar", "instanceId": "aux"}],
            "weapons": [{"id": "laser", "instanceId": "aux"}]
        }));
        assert_eq!(out["sensors"][0]["instanceId"], "aux");
        assert_eq!(out["weapons"][0]["instanceId"], "weapons-1");
    }

    #[test]
    fn index_links_resolve_to_instance_ids() {
        let doc = AssignInstanceIds.apply(&json!({
            "weapons": [{"id": "laser"}, {"id": "railgun"}],
            "sensors": [{"id": "radar", "instanceId": "main-radar"}],
            "commandControl": [
                {"id": "fc", "linkedWeaponIndex": 1},
                {"id": "sc", "linkedSensorIndex": 0},
                {"id": "fc", "linkedWeaponIndex": 9},
                {"id": "fc", "linkedWeaponIndex": -1}
            ]
        }));
        let out = IndexLinksToInstanceLinks.apply(&doc);
        let cc = &out["commandControl"];
        assert_eq!(cc[0]["link"], json!({"kind": "weapon", "instanceId": "weapons-2"}));
        assert_eq!(cc[1]["link"], json!({"kind": "sensor", "instanceId": "main-radar"}));
        assert_eq!(cc[2]["link"], json!({"kind": "weapon", "instanceId": "weapons[9]"}));
        assert!(cc[3].get("link").is_none());
        assert!(cc[3].get("linkedWeaponIndex").is_none());
    }

    #[test]
    fn rename_ids_touches_instances_layers_and_loadouts() {
        let mut raw = MigrationConfig::default().renames;
        raw.entry(Category::Armor)
            .or_default()
            .insert("ablative-old".to_string(), "ablative".to_string());
        let step = RenameIds::new(RenameTables::new(&raw).unwrap());

        let out = step.apply(&json!({
            "weapons": [{"id": "laser-light"}, {"id": "unknown-gun"}],
            "armorLayers": [{"weight": "light", "type": "ablative-old"}],
            "launchSystems": [{"id": "vls", "loadout": {"missile-std": 2, "standard-missile": 1}}]
        }));
        assert_eq!(out["weapons"][0]["id"], "light-laser");
        assert_eq!(out["weapons"][1]["id"], "unknown-gun");
        assert_eq!(out["armorLayers"][0]["type"], "ablative");
        assert_eq!(out["launchSystems"][0]["loadout"], json!({"standard-missile": 3}));
    }

    #[test]
    fn steps_tolerate_absent_targets() {
        let empty = json!({});
        let renames = standard_renames();
        let steps: Vec<&dyn MigrationStep> = vec![
            &RenameLegacyFields,
            &FlattenHullReference,
            &ArmorLayersFromSingle,
            &LoadoutListToMap,
            &AssignInstanceIds,
            &IndexLinksToInstanceLinks,
            &renames,
        ];
        for step in steps {
            assert_eq!(step.apply(&empty), empty, "{}", step.id());
        }
        assert_eq!(CountermeasureSets::new(4).apply(&empty), empty);
    }

    fn arb_id() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(json!("laser-light")),
            Just(json!("light-laser")),
            Just(json!("missile-std")),
            Just(json!("railgun")),
            Just(Value::Null),
        ]
    }

    fn arb_entry() -> impl Strategy<Value = Value> {
        (
            arb_id(),
            prop::option::of(0u64..40),
            prop::option::of(0u64..5),
            prop::option::of(-2i64..4),
            prop::option::of(prop_oneof![Just(json!("weapons-1")), Just(json!("x")), Just(json!(""))]),
        )
            .prop_map(|(id, units, sets, link_idx, instance)| {
                let mut m = Map::new();
                m.insert("id".to_string(), id);
                if let Some(u) = units {
                    m.insert("countermeasureUnits".to_string(), json!(u));
                }
                if let Some(s) = sets {
                    m.insert("countermeasureSets".to_string(), json!(s));
                }
                if let Some(i) = link_idx {
                    m.insert("linkedWeaponIndex".to_string(), json!(i));
                }
                if let Some(inst) = instance {
                    m.insert("instanceId".to_string(), inst);
                }
                Value::Object(m)
            })
    }

    fn arb_document() -> impl Strategy<Value = Value> {
        (
            prop::collection::vec(arb_entry(), 0..4),
            prop::collection::vec(arb_entry(), 0..4),
            prop::collection::vec(arb_entry(), 0..3),
            prop::option::of(Just(json!({"weight": "medium", "type": "ablative"}))),
            prop::option::of(Just(json!([{"weight": "light", "type": "polymer"}]))),
            prop::option::of(prop_oneof![Just(json!("frigate")), Just(json!({"id": "frigate"}))]),
            prop::collection::vec((prop_oneof![Just("missile-std"), Just("standard-missile")], 0u64..5), 0..3),
        )
            .prop_map(|(weapons, defenses, controls, armor, layers, hull, loadout)| {
                let mut m = Map::new();
                m.insert("weapons".to_string(), Value::Array(weapons));
                m.insert("defenses".to_string(), Value::Array(defenses));
                m.insert("fireControl".to_string(), Value::Array(controls));
                if let Some(a) = armor {
                    m.insert("armor".to_string(), a);
                }
                if let Some(l) = layers {
                    m.insert("armorLayers".to_string(), l);
                }
                if let Some(h) = hull {
                    m.insert("hullId".to_string(), h);
                }
                let list: Vec<Value> = loadout
                    .into_iter()
                    .map(|(id, q)| json!({"ordnanceId": id, "quantity": q}))
                    .collect();
                m.insert(
                    "launchSystems".to_string(),
                    json!([{"id": "vls", "loadout": list}]),
                );
                Value::Object(m)
            })
    }

    proptest! {
        #[test]
        fn every_step_is_idempotent(doc in arb_document()) {
            let renames = standard_renames();
            let cm = CountermeasureSets::new(4);
            let steps: Vec<&dyn MigrationStep> = vec![
                &RenameLegacyFields,
                &FlattenHullReference,
                &ArmorLayersFromSingle,
                &cm,
                &LoadoutListToMap,
                &AssignInstanceIds,
                &IndexLinksToInstanceLinks,
                &renames,
            ];
            for step in steps {
                idempotent(step, &doc);
            }
        }
    }
}
