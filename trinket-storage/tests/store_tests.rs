mod common;

use common::{age, record, store};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use trinket_storage::{codec, FileStatus, LoadSource, SaveOutcome};
use trinket_types::{CapabilityRecord, Digest, OwnerId};

fn read(path: &Path) -> CapabilityRecord {
    codec::decode(path, &fs::read(path).unwrap()).unwrap()
}

// ── Save path ────────────────────────────────────────────────────

#[test]
fn save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();

    let outcome = store.save(owner, &record(0)).unwrap();
    assert!(matches!(outcome, SaveOutcome::Written { .. }));

    let loaded = store.load(owner).unwrap();
    assert_eq!(loaded.source, LoadSource::Main);
    assert_eq!(loaded.record, Some(record(0)));
}

#[test]
fn written_digest_matches_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();

    let SaveOutcome::Written { digest } = store.save(owner, &record(0)).unwrap() else {
        panic!("expected a write");
    };

    let bytes = fs::read(store.paths(owner).main).unwrap();
    assert_eq!(Digest::of(&bytes), digest);
}

#[test]
fn trivial_record_is_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();

    let outcome = store.save(owner, &CapabilityRecord::new()).unwrap();

    assert_eq!(outcome, SaveOutcome::SkippedEmpty);
    assert!(!store.paths(owner).main.exists());
}

#[test]
fn unchanged_record_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();

    store.save(owner, &record(0)).unwrap();
    let outcome = store.save(owner, &record(0)).unwrap();

    assert!(matches!(outcome, SaveOutcome::SkippedUnchanged { .. }));
    assert!(!store.paths(owner).backups[0].exists());
}

#[test]
fn encoding_is_deterministic() {
    assert_eq!(
        codec::encode(&record(3)).unwrap(),
        codec::encode(&record(3)).unwrap()
    );
}

#[test]
fn rotation_keeps_at_most_five_backups() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();

    for n in 0..8 {
        store.save(owner, &record(n)).unwrap();
    }

    let paths = store.paths(owner);
    assert!(paths.backups.iter().all(|p| p.exists()));
    let files = fs::read_dir(store.dir()).unwrap().count();
    assert_eq!(files, 6);

    assert_eq!(read(&paths.main), record(7));
    assert_eq!(read(&paths.backups[0]), record(6));
    assert_eq!(read(&paths.backups[4]), record(2));
}

#[test]
fn pruning_removes_expired_backups_but_keeps_one() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();
    let paths = store.paths(owner);

    for n in 0..4 {
        store.save(owner, &record(n)).unwrap();
    }
    for backup in paths.backups.iter().filter(|p| p.exists()) {
        age(backup, 40);
    }
    age(&paths.main, 40);

    store.save(owner, &record(4)).unwrap();

    assert!(paths.backups[0].exists());
    assert!(paths.backups[1..].iter().all(|p| !p.exists()));
}

#[test]
fn fresh_backups_are_not_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();

    for n in 0..4 {
        store.save(owner, &record(n)).unwrap();
    }

    let paths = store.paths(owner);
    assert_eq!(paths.backups.iter().filter(|p| p.exists()).count(), 3);
}

// ── Load path ────────────────────────────────────────────────────

#[test]
fn missing_files_load_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = store(dir.path()).load(OwnerId::new()).unwrap();
    assert_eq!(loaded.source, LoadSource::Fresh);
    assert!(loaded.record.is_none());
}

#[test]
fn crash_after_staging_recovers_temp_as_main() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();
    store.save(owner, &record(0)).unwrap();

    // Killed after the temp write, before rotation and rename.
    store
        .stage(owner, &codec::encode(&record(1)).unwrap())
        .unwrap();

    let loaded = store.load(owner).unwrap();
    let paths = store.paths(owner);

    assert_eq!(loaded.source, LoadSource::RecoveredTemp);
    assert_eq!(loaded.record, Some(record(1)));
    assert!(!paths.tmp.exists());
    assert!(!paths.recovered.exists());
    assert_eq!(read(&paths.backups[0]), record(0));
    assert_eq!(store.load(owner).unwrap().source, LoadSource::Main);
}

#[test]
fn interrupted_recovery_is_completed() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();
    let paths = store.paths(owner);
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(&paths.recovered, codec::encode(&record(5)).unwrap()).unwrap();

    let loaded = store.load(owner).unwrap();

    assert_eq!(loaded.source, LoadSource::RecoveredTemp);
    assert_eq!(loaded.record, Some(record(5)));
    assert!(!paths.recovered.exists());
}

#[test]
fn garbage_temp_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();
    store.save(owner, &record(0)).unwrap();
    store.stage(owner, b"half a write").unwrap();

    let loaded = store.load(owner).unwrap();

    assert_eq!(loaded.source, LoadSource::Main);
    assert_eq!(loaded.record, Some(record(0)));
    assert!(!store.paths(owner).tmp.exists());
}

#[test]
fn corrupt_main_falls_back_to_newest_backup() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();
    let paths = store.paths(owner);
    store.save(owner, &record(0)).unwrap();
    store.save(owner, &record(1)).unwrap();
    store.save(owner, &record(2)).unwrap();
    fs::write(&paths.main, b"not gzip").unwrap();
    fs::write(&paths.backups[0], b"also broken").unwrap();

    let loaded = store.load(owner).unwrap();

    assert_eq!(loaded.source, LoadSource::Backup(2));
    assert_eq!(loaded.record, Some(record(0)));
    assert_eq!(read(&paths.main), record(0));
}

#[test]
fn everything_corrupt_loads_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();
    let paths = store.paths(owner);
    store.save(owner, &record(0)).unwrap();
    store.save(owner, &record(1)).unwrap();
    fs::write(&paths.main, b"x").unwrap();
    fs::write(&paths.backups[0], b"y").unwrap();

    let loaded = store.load(owner).unwrap();

    assert_eq!(loaded.source, LoadSource::Fresh);
    assert!(loaded.record.is_none());
}

#[test]
fn inspect_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let owner = OwnerId::new();
    store.save(owner, &record(0)).unwrap();
    store.save(owner, &record(1)).unwrap();
    fs::write(&store.paths(owner).backups[0], b"junk").unwrap();

    let reports = store.inspect(owner).unwrap();

    assert_eq!(reports.len(), 8);
    assert!(matches!(
        reports[0].status,
        FileStatus::Valid { groups: 2, items: 1, .. }
    ));
    assert_eq!(reports[1].status, FileStatus::Missing);
    assert!(matches!(reports[3].status, FileStatus::Corrupt { .. }));
}

#[test]
fn partial_config_falls_back_to_defaults() {
    let config: trinket_storage::StoreConfig =
        serde_json::from_str(r#"{"root": "/srv/data", "backup_retention": 3}"#).unwrap();

    assert_eq!(config.kind_dir(), std::path::PathBuf::from("/srv/data/equipment"));
    assert_eq!(config.backup_retention, 3);
    assert_eq!(config.queue_capacity, 256);
}
