//! Player persistence: the sled store, record migrations and sessions on top.

mod common;

use std::sync::Arc;

use abysm::engine::migration::{CURRENT_PLAYER_DATA_VERSION, DATA_VERSION_FIELD};
use abysm::engine::types::{EquipSlot, Item};
use abysm::engine::{
    EngineError, InventoryEntry, NoFlavor, Player, PlayerRepository, PlayerStore,
    PlayerStoreBuilder, Session, SessionOptions, SessionRegistry,
};
use common::temp_store;
use serde_json::json;

fn open_session(store: &Arc<PlayerStore>, id: &str) -> Session {
    let repo: Arc<dyn PlayerRepository> = store.clone();
    Session::open(
        Some(repo),
        id,
        "Tester",
        SessionOptions::default(),
        Arc::new(NoFlavor),
    )
}

#[test]
fn player_round_trips_with_version_stamp() {
    let (_tmp, store) = temp_store();
    let mut player = Player::new("alice", "Alice");
    player.gold = 42;
    player.inventory.push(InventoryEntry::Item(Item::new("Shard", 6)));
    player.equip(EquipSlot::Weapon, Item::new("Blade", 3));
    store.put_player(&player).unwrap();

    assert_eq!(store.get_player("alice").unwrap(), Some(player));
    let raw = store.get_raw("alice").unwrap().unwrap();
    assert_eq!(
        raw[DATA_VERSION_FIELD].as_u64(),
        Some(u64::from(CURRENT_PLAYER_DATA_VERSION))
    );
    assert_eq!(store.get_player("bob").unwrap(), None);
}

#[test]
fn builder_trees_are_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let a = PlayerStoreBuilder::new(tmp.path().join("a")).tree("one").open().unwrap();
    let b = PlayerStoreBuilder::new(tmp.path().join("b")).tree("two").open().unwrap();
    a.put_player(&Player::new("alice", "Alice")).unwrap();
    assert_eq!(a.list_player_ids().unwrap(), vec!["alice".to_string()]);
    assert!(b.list_player_ids().unwrap().is_empty());
}

#[test]
fn legacy_records_migrate_on_read_and_in_bulk() {
    let (_tmp, store) = temp_store();
    store
        .put_raw(
            "old",
            &json!({
                "id": "old", "name": "Old", "hp": 7, "max_hp": 10,
                "attack": 2, "defense": 1, "gold": 5,
                "inventory": [{"name": "Scrap", "power": 2}]
            }),
        )
        .unwrap();
    store.put_player(&Player::new("new", "New")).unwrap();

    let old = store.get_player("old").unwrap().unwrap();
    assert_eq!(old.hp, 7);
    assert_eq!(old.items().cloned().collect::<Vec<_>>(), vec![Item::new("Scrap", 2)]);
    assert!(old.equipped(EquipSlot::Weapon).is_none());
    // Reading does not rewrite
    assert!(store.get_raw("old").unwrap().unwrap().get(DATA_VERSION_FIELD).is_none());

    let dry = store.migrate_all(true).unwrap();
    assert_eq!((dry.scanned, dry.migrated, dry.up_to_date), (2, 1, 1));
    assert!(dry.summary().starts_with("[dry run] "));
    assert!(store.get_raw("old").unwrap().unwrap().get(DATA_VERSION_FIELD).is_none());

    let report = store.migrate_all(false).unwrap();
    assert_eq!((report.migrated, report.up_to_date), (1, 1));
    assert!(report.failures.is_empty());
    let raw = store.get_raw("old").unwrap().unwrap();
    assert_eq!(
        raw[DATA_VERSION_FIELD].as_u64(),
        Some(u64::from(CURRENT_PLAYER_DATA_VERSION))
    );

    let again = store.migrate_all(false).unwrap();
    assert_eq!((again.migrated, again.up_to_date), (0, 2));
}

#[test]
fn records_from_a_newer_build_are_refused() {
    let (_tmp, store) = temp_store();
    let mut raw = serde_json::to_value(Player::new("future", "F")).unwrap();
    raw[DATA_VERSION_FIELD] = json!(CURRENT_PLAYER_DATA_VERSION + 1);
    store.put_raw("future", &raw).unwrap();

    assert!(matches!(
        store.get_player("future"),
        Err(EngineError::SchemaMismatch { .. })
    ));
    let report = store.migrate_all(false).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "future");
    assert_eq!(store.get_raw("future").unwrap(), Some(raw));
}

#[test]
fn sessions_create_then_resume_players() {
    let (_tmp, store) = temp_store();
    let store = Arc::new(store);

    let mut first = open_session(&store, "carol");
    assert!(first.is_persistent());
    assert_eq!(store.get_player("carol").unwrap().map(|p| p.gold), Some(0));
    first.state_mut().player.gold = 77;
    first.handle_line("stats");
    let (out, ended) = first.handle_line("quit");
    assert!(ended);
    assert_eq!(out, "Farewell, wanderer.");

    let second = open_session(&store, "carol");
    assert_eq!(second.player().gold, 77);
    assert_eq!(second.player().name, "Tester");
}

#[test]
fn unreadable_record_is_never_overwritten() {
    let (_tmp, store) = temp_store();
    let mut raw = serde_json::to_value(Player::new("dave", "Dave")).unwrap();
    raw[DATA_VERSION_FIELD] = json!(CURRENT_PLAYER_DATA_VERSION + 5);
    store.put_raw("dave", &raw).unwrap();
    let store = Arc::new(store);

    let mut session = open_session(&store, "dave");
    assert!(!session.is_persistent());
    session.state_mut().player.gold = 1_000;
    session.handle_line("stats");
    session.handle_line("quit");
    assert_eq!(store.get_raw("dave").unwrap(), Some(raw));
}

#[test]
fn registry_keeps_players_apart() {
    let (_tmp, store) = temp_store();
    let store = Arc::new(store);
    let repo: Arc<dyn PlayerRepository> = store.clone();
    let registry = SessionRegistry::new(Some(repo), Arc::new(NoFlavor), SessionOptions::default())
        .with_cycle_provider(Arc::new(|| "2025-09-10".to_string()));

    let (a, _) = registry.handle("erin", "Erin", "stats");
    let (b, _) = registry.handle("finn", "Finn", "stats");
    assert!(a.starts_with("Erin: "));
    assert!(b.starts_with("Finn: "));
    assert_eq!(registry.active_count(), 2);

    let (_, ended) = registry.handle("erin", "Erin", "quit");
    assert!(ended);
    assert!(!registry.is_active("erin"));
    assert!(registry.end("finn"));
    assert!(!registry.end("finn"));
    assert_eq!(registry.active_count(), 0);

    let mut ids = store.list_player_ids().unwrap();
    ids.sort();
    assert_eq!(ids, vec!["erin".to_string(), "finn".to_string()]);
}
