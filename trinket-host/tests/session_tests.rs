mod common;

use common::{ruby, start, Player};
use pretty_assertions::assert_eq;
use std::fs;
use trinket_capability::EquipOutcome;
use trinket_host::SessionError;
use trinket_model::SlotLayoutDefinition;
use trinket_storage::{DurableStore, StoreConfig};
use trinket_types::{CapabilityRecord, ItemStack};

#[tokio::test]
async fn fresh_owner_connects_empty_and_gets_full_sync() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, transport) = start(dir.path());
    let mut player = Player::new();

    let shared = sessions.connect(&mut player).await.unwrap();

    {
        let capability = shared.lock();
        assert!(capability.is_active());
        assert_eq!(capability.slots("earrings").map(<[ItemStack]>::len), Some(1));
        assert!(!capability.is_dirty());
    }
    assert!(sessions.cache().contains(player.id));
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_full());
    sessions.shutdown().await;
}

#[tokio::test]
async fn equip_pushes_partial_and_autosave_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, transport) = start(dir.path());
    let mut player = Player::new();
    sessions.connect(&mut player).await.unwrap();

    let outcome = sessions.equip(&mut player, "earrings", 0, ruby()).unwrap();

    assert!(outcome.is_equipped());
    assert_eq!(player.armor(), 2.0);
    assert_eq!(transport.sent()[1].group_key.as_deref(), Some("earrings"));

    assert_eq!(sessions.autosave(), 1);
    sessions.persistence().flush().await.unwrap();
    assert_eq!(sessions.autosave(), 0);

    let stored = sessions.persistence().store().load(player.id).unwrap();
    assert_eq!(stored.record.map(|r| r.item_count()), Some(1));
    sessions.shutdown().await;
}

#[tokio::test]
async fn denied_equip_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, transport) = start(dir.path());
    let mut player = Player::new();
    sessions.connect(&mut player).await.unwrap();

    let outcome = sessions.equip(&mut player, "wings", 0, ruby()).unwrap();

    assert!(matches!(outcome, EquipOutcome::Denied { .. }));
    assert_eq!(transport.sent_count(), 1);
    assert_eq!(sessions.autosave(), 0);
    sessions.shutdown().await;
}

#[tokio::test]
async fn reconnect_restores_equipment() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, _transport) = start(dir.path());
    let mut player = Player::new();
    sessions.connect(&mut player).await.unwrap();
    sessions.equip(&mut player, "earrings", 0, ruby()).unwrap();

    sessions.disconnect(player.id).await.unwrap();
    assert!(!sessions.cache().contains(player.id));
    assert_eq!(sessions.sync().tracked_owners(), 0);
    sessions.persistence().flush().await.unwrap();
    assert_eq!(sessions.persistence().saved_revision(player.id), None);
    assert!(sessions.persistence().store().paths(player.id).main.exists());

    let mut returning = Player::with_id(player.id);
    let shared = sessions.connect(&mut returning).await.unwrap();

    assert_eq!(shared.lock().get_item("earrings", 0), &ruby());
    assert_eq!(returning.armor(), 2.0);
    sessions.shutdown().await;
}

#[tokio::test]
async fn second_connect_keeps_unsaved_state() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, transport) = start(dir.path());
    let mut player = Player::new();
    sessions.connect(&mut player).await.unwrap();
    sessions.equip(&mut player, "earrings", 0, ruby()).unwrap();
    assert_eq!(sessions.autosave(), 1);
    sessions.persistence().flush().await.unwrap();
    sessions
        .equip(&mut player, "earrings", 0, ItemStack::empty())
        .unwrap();

    let shared = sessions.connect(&mut player).await.unwrap();

    {
        let capability = shared.lock();
        assert!(capability.get_item("earrings", 0).is_empty());
        assert!(capability.is_dirty());
    }
    assert_eq!(player.armor(), 0.0);
    assert!(transport.sent().last().unwrap().is_full());
    assert_eq!(sessions.autosave(), 1);
    sessions.shutdown().await;
}

#[tokio::test]
async fn operations_on_unknown_owner_fail() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, _transport) = start(dir.path());
    let mut stranger = Player::new();

    assert!(matches!(
        sessions.equip(&mut stranger, "earrings", 0, ruby()),
        Err(SessionError::NotConnected(_))
    ));
    assert!(matches!(
        sessions.tick(&mut stranger),
        Err(SessionError::NotConnected(_))
    ));
    assert!(matches!(
        sessions.disconnect(stranger.id).await,
        Err(SessionError::NotConnected(_))
    ));
    sessions.shutdown().await;
}

#[tokio::test]
async fn layout_reload_applies_on_next_tick() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, transport) = start(dir.path());
    let mut player = Player::new();
    let shared = sessions.connect(&mut player).await.unwrap();
    sessions.equip(&mut player, "earrings", 0, ruby()).unwrap();
    let pushed = transport.sent_count();

    sessions.reload_layouts([
        SlotLayoutDefinition::parse(r#"{"key": "earrings", "slots": 2}"#).unwrap(),
    ]);
    sessions.tick(&mut player).unwrap();

    let capability = shared.lock();
    assert_eq!(capability.slots("earrings").unwrap(), &[ruby(), ItemStack::empty()]);
    assert!(player.inventory.is_empty());
    assert!(transport.sent_count() > pushed);
    drop(capability);
    sessions.shutdown().await;
}

#[tokio::test]
async fn shutdown_writes_dirty_capabilities() {
    let dir = tempfile::tempdir().unwrap();
    let (mut sessions, _transport) = start(dir.path());
    let mut player = Player::new();
    sessions.connect(&mut player).await.unwrap();
    sessions.equip(&mut player, "earrings", 0, ruby()).unwrap();

    sessions.shutdown().await;

    let store = DurableStore::new(StoreConfig::new(dir.path(), "equipment"));
    let record = store.load(player.id).unwrap().record.unwrap();
    assert_eq!(record.groups["earrings"], vec![ruby()]);
}

#[tokio::test]
async fn connect_falls_back_to_backup() {
    let dir = tempfile::tempdir().unwrap();
    let store = DurableStore::new(StoreConfig::new(dir.path(), "equipment"));
    let player_id = trinket_types::OwnerId::new();
    store
        .save(player_id, &CapabilityRecord::new().with_group("earrings", vec![ruby()]))
        .unwrap();
    store
        .save(
            player_id,
            &CapabilityRecord::new().with_group("earrings", vec![ItemStack::empty()]),
        )
        .unwrap();
    fs::write(store.paths(player_id).main, b"torn").unwrap();

    let (mut sessions, _transport) = start(dir.path());
    let mut player = Player::with_id(player_id);
    let shared = sessions.connect(&mut player).await.unwrap();

    assert_eq!(shared.lock().get_item("earrings", 0), &ruby());
    assert_eq!(player.armor(), 2.0);
    sessions.shutdown().await;
}
