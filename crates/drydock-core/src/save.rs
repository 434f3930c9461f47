//! Design serialization.
//!
//! Writes a [`DesignState`] back out in the current document shape. The output
//! always carries [`CURRENT_SCHEMA_VERSION`], lists every section (empty ones
//! included), and never contains derived values.

use serde_json::{Map, Value};

use crate::catalog::Category;
use crate::design::{DesignState, InstalledSystem};
use crate::errors::{DrydockError, DrydockResult};
use crate::version::{CURRENT_SCHEMA_VERSION, VERSION_KEY};
use crate::wire::{
    free_options, is_document_key, is_instance_key, is_legacy_key, WireArmorLayer,
    WireDamageZone, WireInstance, ARMOR_LAYER_KEYS,
};

fn wire_instance(category: Category, system: &InstalledSystem) -> WireInstance {
    WireInstance {
        instance_id: Some(system.instance_id.clone()),
        id: system.entry.id.clone(),
        quantity: system.quantity,
        countermeasure_sets: None,
        loadout: None,
        link: None,
        options: system
            .options
            .iter()
            .filter(|(k, _)| !is_instance_key(category, k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn to_value<T: serde::Serialize>(v: &T) -> DrydockResult<Value> {
    serde_json::to_value(v).map_err(|e| DrydockError::serialization(format!("failed to encode design: {e}")))
}

fn section(state: &DesignState, category: Category) -> DrydockResult<Value> {
    let items = match category {
        Category::Armor => state
            .armor_layers
            .iter()
            .map(|l| {
                to_value(&WireArmorLayer {
                    weight: l.weight.clone(),
                    armor_type: l.armor.id.clone(),
                    options: free_options(&l.options, ARMOR_LAYER_KEYS)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                })
            })
            .collect::<DrydockResult<Vec<_>>>()?,
        Category::Defense => state
            .defenses
            .iter()
            .map(|d| {
                let mut w = wire_instance(category, &d.system);
                w.countermeasure_sets = d.countermeasure_sets.map(Value::from);
                to_value(&w)
            })
            .collect::<DrydockResult<Vec<_>>>()?,
        Category::CommandControl => state
            .command_control
            .iter()
            .map(|c| {
                let mut w = wire_instance(category, &c.system);
                w.link = c.link.as_ref().map(to_value).transpose()?;
                to_value(&w)
            })
            .collect::<DrydockResult<Vec<_>>>()?,
        Category::LaunchSystem => state
            .launch_systems
            .iter()
            .map(|l| {
                let mut w = wire_instance(category, &l.system);
                let loadout: Map<String, Value> = l
                    .loadout
                    .iter()
                    .map(|slot| (slot.ordnance.id.clone(), Value::from(slot.quantity)))
                    .collect();
                w.loadout = Some(Value::Object(loadout));
                to_value(&w)
            })
            .collect::<DrydockResult<Vec<_>>>()?,
        other => state
            .installed(other)
            .into_iter()
            .map(|s| to_value(&wire_instance(other, s)))
            .collect::<DrydockResult<Vec<_>>>()?,
    };
    Ok(Value::Array(items))
}

/// Encode a design as a current-version document value.
pub fn to_document(state: &DesignState) -> DrydockResult<Value> {
    let mut map = Map::new();
    map.insert(
        VERSION_KEY.to_string(),
        Value::String(CURRENT_SCHEMA_VERSION.to_string()),
    );
    map.insert(
        "designType".to_string(),
        Value::String(state.design_type.as_str().to_string()),
    );
    if let Some(sub) = &state.design_sub_type {
        map.insert("designSubType".to_string(), Value::String(sub.clone()));
    }
    map.insert("hull".to_string(), Value::String(state.hull.id.clone()));

    for category in Category::ALL {
        map.insert(category.section_key().to_string(), section(state, category)?);
    }

    let zones = state
        .damage_zones
        .iter()
        .map(|z| {
            to_value(&WireDamageZone {
                code: z.code.clone(),
                systems: z.systems.clone(),
            })
        })
        .collect::<DrydockResult<Vec<_>>>()?;
    map.insert("damageZones".to_string(), Value::Array(zones));

    // Host metadata never shadows an owned key or a key migration would consume.
    for (k, v) in &state.metadata {
        if !is_document_key(k) && !is_legacy_key(k) {
            map.insert(k.clone(), v.clone());
        }
    }

    Ok(Value::Object(map))
}

/// Encode a design as pretty-printed JSON text.
pub fn save(state: &DesignState) -> DrydockResult<String> {
    let doc = to_document(state)?;
    serde_json::to_string_pretty(&doc)
        .map_err(|e| DrydockError::serialization(format!("failed to encode design: {e}")))
}
