//! load_outcomes.rs
//!
//! Every load ends in exactly one of: a design (possibly with warnings) or one
//! of the three fatal error kinds. Fatal loads never carry a design, and every
//! dropped element of a successful load is named by a warning.

use assert_matches::assert_matches;
use drydock_core::prelude::*;

const CATALOG: &str = include_str!("fixtures/catalog.json");
const BROKEN_REFS: &str = include_str!("fixtures/broken_refs.json");

fn catalog() -> StaticCatalog {
    StaticCatalog::from_json_str(CATALOG).unwrap()
}

fn kind_of(raw: &str) -> Option<ErrorKind> {
    load(raw, &catalog()).err().map(|e| e.kind)
}

#[test]
fn malformed_text_is_a_parse_error() {
    assert_eq!(kind_of(""), Some(ErrorKind::Parse));
    assert_eq!(kind_of("{\"hull\": \"frigate\""), Some(ErrorKind::Parse));
    assert_eq!(kind_of("\"frigate\""), Some(ErrorKind::Parse));
}

#[test]
fn newer_major_is_a_version_error() {
    let err = load(r#"{"schemaVersion": 99, "hull": "frigate"}"#, &catalog()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Version);
    assert!(err.message.contains("newer version"));

    assert_eq!(kind_of(r#"{"schemaVersion": "2.0.0", "hull": "frigate"}"#), Some(ErrorKind::Version));
    assert_eq!(kind_of(r#"{"schemaVersion": "banana", "hull": "frigate"}"#), Some(ErrorKind::Version));
}

#[test]
fn newer_minor_still_loads() {
    let loaded = load(
        r#"{"schemaVersion": "1.99.3", "hull": "frigate",
            "armorLayers": [{"weight": "light", "type": "ablative"}]}"#,
        &catalog(),
    )
    .unwrap();
    assert_eq!(loaded.source_version, SchemaVersion::new(1, 99, 3));
}

#[test]
fn absent_or_unknown_hull_is_missing_hull() {
    assert_eq!(kind_of("{}"), Some(ErrorKind::MissingHull));
    assert_eq!(kind_of(r#"{"hull": null}"#), Some(ErrorKind::MissingHull));
    assert_eq!(kind_of(r#"{"hull": "battlestar"}"#), Some(ErrorKind::MissingHull));
    assert_eq!(kind_of(r#"{"hull": {"id": "battlestar"}}"#), Some(ErrorKind::MissingHull));
    assert_eq!(kind_of(r#"{"hull": 7}"#), Some(ErrorKind::MissingHull));
}

#[test]
fn version_is_checked_before_hull() {
    // Newer documents are never migrated or resolved.
    assert_eq!(kind_of(r#"{"schemaVersion": 3}"#), Some(ErrorKind::Version));
}

#[test]
fn outcomes_are_exhaustive() {
    let inputs = [
        "",
        "[]",
        "{}",
        r#"{"schemaVersion": 9}"#,
        r#"{"hull": "frigate"}"#,
        BROKEN_REFS,
    ];
    for raw in inputs {
        let outcome = LoadOutcome::from(load(raw, &catalog()));
        if outcome.success {
            assert!(outcome.state.is_some());
            assert!(outcome.warnings.is_some());
            assert!(outcome.error_kind.is_none());
        } else {
            assert!(outcome.state.is_none());
            assert!(outcome.error_kind.is_some());
            assert!(outcome.warnings.is_none());
        }
    }
}

#[test]
fn broken_references_are_all_reported() {
    let loaded = load(BROKEN_REFS, &catalog()).unwrap();
    assert_eq!(
        loaded.warnings(),
        vec![
            "armor: no layers configured",
            "sensor: could not find type 'old-radar-mk1', entry removed",
            "weapon: could not find type 'plasma-lance', entry removed",
            "launch system: could not find ordnance 'antimatter-torpedo' in loadout of 'launchSystems-1', slot removed",
            "damage zones: system 'weapons-1' in zone 'Z1' is no longer installed, reference removed",
            "command/control: orphaned link dropped ('commandControl-1' has no weapon 'weapons-1')",
        ]
    );

    let s = &loaded.state;
    assert_eq!(s.hull.id, "destroyer");
    assert!(s.sensors.is_empty());
    assert_eq!(s.weapons.len(), 1);
    assert_eq!(s.weapons[0].instance_id, "weapons-2");
    assert!(s.launch_systems[0].loadout.is_empty());
    assert_eq!(s.damage_zones[0].systems, vec!["weapons-2"]);
    assert!(s.command_control[0].link.is_none());
}

#[test]
fn no_dangling_references_after_load() {
    let loaded = load(BROKEN_REFS, &catalog()).unwrap();
    let s = &loaded.state;
    let cat = catalog();

    for c in Category::installed() {
        for sys in s.installed(c) {
            assert!(cat.find(c, &sys.entry.id).is_some(), "{c}: {}", sys.entry.id);
        }
    }
    let ids = s.instance_ids();
    for zone in &s.damage_zones {
        for sys in &zone.systems {
            assert!(ids.contains(sys.as_str()));
        }
    }
    for control in &s.command_control {
        if let Some(link) = &control.link {
            assert_matches!(s.find_instance(&link.instance_id), Some((c, _)) if c == link.kind.category());
        }
    }
}

#[test]
fn legacy_out_of_range_index_becomes_orphan_warning() {
    let raw = r#"{
        "hull": "frigate",
        "armorLayers": [{"weight": "light", "type": "ablative"}],
        "weapons": [{"id": "light-laser"}],
        "fireControl": [{"id": "fire-control", "linkedWeaponIndex": 4}]
    }"#;
    let loaded = load(raw, &catalog()).unwrap();
    assert_eq!(
        loaded.warnings(),
        vec!["command/control: orphaned link dropped ('commandControl-1' has no weapon 'weapons[4]')"]
    );
    assert!(loaded.state.command_control[0].link.is_none());
}

#[test]
fn unknown_design_type_warns_and_defaults() {
    let raw = r#"{
        "designType": "dreadnought",
        "hull": "frigate",
        "armorLayers": [{"weight": "light", "type": "ablative"}]
    }"#;
    let loaded = load(raw, &catalog()).unwrap();
    assert_eq!(loaded.state.design_type, DesignType::Warship);
    assert_eq!(
        loaded.warnings(),
        vec!["document: unrecognized design type 'dreadnought', treated as warship"]
    );
}

#[test]
fn missing_armor_is_a_warning_not_a_failure() {
    let loaded = load(r#"{"hull": "destroyer"}"#, &catalog()).unwrap();
    assert!(loaded.state.armor_layers.is_empty());
    assert_eq!(loaded.state.damage_zones.len(), 8);
    assert_eq!(loaded.warnings(), vec!["armor: no layers configured"]);
    let grouped = loaded.report.by_scope();
    assert_eq!(grouped.len(), 1);
    assert!(grouped.contains_key(&ReportScope::Category(Category::Armor)));
}

#[test]
fn prerelease_and_numeric_versions_load() {
    let raw = r#"{
        "schemaVersion": "1.2.0-beta.1",
        "hull": "frigate",
        "armorLayers": [{"weight": "light", "type": "ablative"}]
    }"#;
    let loaded = load(raw, &catalog()).unwrap();
    assert_eq!(loaded.source_version, SchemaVersion::new(1, 2, 0));

    let raw = r#"{
        "schemaVersion": 1.0,
        "hull": "frigate",
        "armorLayers": [{"weight": "light", "type": "ablative"}]
    }"#;
    let loaded = load(raw, &catalog()).unwrap();
    assert_eq!(loaded.source_version, SchemaVersion::new(1, 0, 0));

    assert_eq!(
        kind_of(r#"{"schemaVersion": "2.0.0-rc.1", "hull": "frigate"}"#),
        Some(ErrorKind::Version)
    );
}

#[test]
fn unowned_instance_fields_survive_load_and_save() {
    let raw = r#"{
        "schemaVersion": "1.4.0",
        "hull": "frigate",
        "armorLayers": [{"weight": "light", "type": "ablative"}],
        "weapons": [{
            "instanceId": "weapons-1",
            "id": "light-laser",
            "loadout": {"standard-missile": 4},
            "link": {"kind": "weapon", "instanceId": "weapons-2"},
            "countermeasureSets": 2
        }]
    }"#;
    let loaded = load(raw, &catalog()).unwrap();
    assert!(loaded.warnings().is_empty(), "{:?}", loaded.warnings());

    let saved: serde_json::Value = serde_json::from_str(&save(&loaded.state).unwrap()).unwrap();
    let weapon = &saved["weapons"][0];
    assert_eq!(weapon["loadout"], serde_json::json!({"standard-missile": 4}));
    assert_eq!(weapon["link"]["instanceId"], "weapons-2");
    assert_eq!(weapon["countermeasureSets"], 2);
}
