//! Versioned migrations for stored player records.
//!
//! Records are JSON objects carrying a `data_version` field. Each entry of the
//! migration table is a pure transform from the previous version's JSON to
//! the next; on load every step above the record's version runs in order.
//!
//! # Adding New Migrations
//!
//! 1. Increment [`CURRENT_PLAYER_DATA_VERSION`]
//! 2. Write a `fn(Value) -> Result<Value>` for the new version
//! 3. Append it to `PLAYER_MIGRATIONS`
//! 4. Add tests for the migration

use log::info;
use serde_json::{Map, Value};

use super::errors::{EngineError, Result};

/// Version written by this build.
pub const CURRENT_PLAYER_DATA_VERSION: u32 = 2;

/// Field holding the schema version inside a stored record.
pub const DATA_VERSION_FIELD: &str = "data_version";

type Step = fn(Value) -> Result<Value>;

/// Ordered `(target_version, step)` pairs.
const PLAYER_MIGRATIONS: &[(u32, Step)] = &[(1, backfill_v1), (2, tag_inventory_v2)];

fn object_mut(value: &mut Value, version: u32) -> Result<&mut Map<String, Value>> {
    value.as_object_mut().ok_or_else(|| EngineError::Migration {
        version,
        reason: "player record is not a JSON object".to_string(),
    })
}

/// Version stamped on `value`; records from before versioning count as 0.
pub fn data_version(value: &Value) -> Result<u32> {
    match value.get(DATA_VERSION_FIELD) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| EngineError::Migration {
                version: 0,
                reason: format!("unreadable {}: {}", DATA_VERSION_FIELD, v),
            }),
    }
}

/// v0 -> v1: unversioned rows gain explicit equipment slots and an inventory.
fn backfill_v1(mut value: Value) -> Result<Value> {
    let obj = object_mut(&mut value, 1)?;
    obj.entry("equipped_weapon").or_insert(Value::Null);
    obj.entry("equipped_armor").or_insert(Value::Null);
    obj.entry("inventory").or_insert_with(|| Value::Array(Vec::new()));
    Ok(value)
}

/// v1 -> v2: plain `{name, power}` inventory entries become tagged items.
fn tag_inventory_v2(mut value: Value) -> Result<Value> {
    let obj = object_mut(&mut value, 2)?;
    if let Some(inventory) = obj.get_mut("inventory") {
        let entries = inventory.as_array_mut().ok_or_else(|| EngineError::Migration {
            version: 2,
            reason: "inventory is not a list".to_string(),
        })?;
        for entry in entries.iter_mut() {
            if !entry.is_object() {
                return Err(EngineError::Migration {
                    version: 2,
                    reason: format!("inventory entry is not an object: {}", entry),
                });
            }
            if let Some(fields) = entry.as_object_mut() {
                if !fields.contains_key("kind") {
                    fields.insert("kind".to_string(), Value::String("item".to_string()));
                    fields.entry("power").or_insert(Value::from(0));
                }
            }
        }
    }
    Ok(value)
}

/// Bring a stored player record up to [`CURRENT_PLAYER_DATA_VERSION`].
///
/// Returns the migrated value and the version it started at. A record newer
/// than this build is refused rather than downgraded.
pub fn migrate_player_value(mut value: Value) -> Result<(Value, u32)> {
    let from = data_version(&value)?;
    if from > CURRENT_PLAYER_DATA_VERSION {
        return Err(EngineError::SchemaMismatch {
            entity: "player",
            expected: CURRENT_PLAYER_DATA_VERSION,
            found: from,
        });
    }
    if from == CURRENT_PLAYER_DATA_VERSION {
        return Ok((value, from));
    }

    let id = value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();
    info!(
        "Migrating player '{}' from data v{} to v{}",
        id, from, CURRENT_PLAYER_DATA_VERSION
    );
    for (target, step) in PLAYER_MIGRATIONS {
        if *target <= from {
            continue;
        }
        value = step(value)?;
        object_mut(&mut value, *target)?
            .insert(DATA_VERSION_FIELD.to_string(), Value::from(*target));
    }
    Ok((value, from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{InventoryEntry, Item, Player};
    use serde_json::json;

    fn legacy_row() -> Value {
        json!({
            "id": "pidX",
            "name": "Hero",
            "hp": 7,
            "max_hp": 11,
            "attack": 3,
            "defense": 2,
            "gold": 42,
            "inventory": [{"name": "Scrap", "power": 2}, {"name": "Curio"}]
        })
    }

    #[test]
    fn table_is_ordered_and_ends_at_current() {
        let versions: Vec<u32> = PLAYER_MIGRATIONS.iter().map(|(v, _)| *v).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.last().copied(), Some(CURRENT_PLAYER_DATA_VERSION));
    }

    #[test]
    fn unversioned_row_migrates_to_current() {
        let (value, from) = migrate_player_value(legacy_row()).unwrap();
        assert_eq!(from, 0);
        assert_eq!(value[DATA_VERSION_FIELD], 2);
        assert!(value["equipped_weapon"].is_null());
        assert_eq!(value["inventory"][0]["kind"], "item");
        assert_eq!(value["inventory"][1]["power"], 0);

        let player: Player = serde_json::from_value(value).unwrap();
        assert_eq!(
            player.inventory,
            vec![
                InventoryEntry::Item(Item::new("Scrap", 2)),
                InventoryEntry::Item(Item::new("Curio", 0)),
            ]
        );
        assert_eq!(player.gold, 42);
    }

    #[test]
    fn v1_row_only_runs_later_steps() {
        let mut row = legacy_row();
        row[DATA_VERSION_FIELD] = json!(1);
        row["equipped_armor"] = json!({"name": "Coat", "power": 1});
        let (value, from) = migrate_player_value(row).unwrap();
        assert_eq!(from, 1);
        assert_eq!(value["equipped_armor"]["name"], "Coat");
        assert_eq!(value["inventory"][0]["kind"], "item");
    }

    #[test]
    fn boxes_keep_their_tag() {
        let mut row = legacy_row();
        row[DATA_VERSION_FIELD] = json!(1);
        row["inventory"] = json!([{"kind": "box", "code": "tin", "name": "Tin Trove", "tier": 1}]);
        let (value, _) = migrate_player_value(row).unwrap();
        assert_eq!(value["inventory"][0]["kind"], "box");
        assert!(value["inventory"][0].get("power").is_none());
    }

    #[test]
    fn current_row_is_untouched() {
        let mut row = legacy_row();
        row[DATA_VERSION_FIELD] = json!(CURRENT_PLAYER_DATA_VERSION);
        let (value, from) = migrate_player_value(row.clone()).unwrap();
        assert_eq!(from, CURRENT_PLAYER_DATA_VERSION);
        assert_eq!(value, row);
    }

    #[test]
    fn newer_row_is_refused() {
        let mut row = legacy_row();
        row[DATA_VERSION_FIELD] = json!(CURRENT_PLAYER_DATA_VERSION + 1);
        let err = migrate_player_value(row).unwrap_err();
        assert!(matches!(
            err,
            EngineError::SchemaMismatch { entity: "player", found: 3, .. }
        ));
    }

    #[test]
    fn malformed_inventory_fails_the_step() {
        let mut row = legacy_row();
        row["inventory"] = json!(["Scrap"]);
        let err = migrate_player_value(row).unwrap_err();
        assert!(matches!(err, EngineError::Migration { version: 2, .. }));
    }
}
