//! Persistence Round-Trip Tests
//!
//! Data committed through one persistent store must be visible to a fresh
//! store opened on the same root, and the on-disk layout must match what
//! other tools expect:
//! - `<root>/journal/<sanitized name>`: one record per line
//! - `<root>/content/<key>`: the raw value

use std::fs;

use feedstore::content::PersistentContentStorage;
use feedstore::journal::{sanitize, PersistentJournalStorage};
use feedstore::{
    BackendKind, CommitResult, ContentMutation, ContentStorage, JournalMutation, JournalStorage,
    StoreConfig, ThreadChecker,
};
use tempfile::TempDir;

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[test]
fn test_journal_survives_reopen() {
    let temp_dir = create_temp_data_dir();

    {
        let storage = PersistentJournalStorage::new(temp_dir.path(), ThreadChecker::new()).unwrap();
        let mutation = JournalMutation::builder("session*1")
            .append("a")
            .append("b")
            .build();
        assert_eq!(storage.commit(mutation).wait(), CommitResult::Success);
    }

    let storage = PersistentJournalStorage::new(temp_dir.path(), ThreadChecker::new()).unwrap();
    assert_eq!(
        storage.read("session*1").wait().unwrap(),
        vec![b"a".to_vec(), b"b".to_vec()]
    );
    assert_eq!(
        storage.get_all_journals().wait().unwrap(),
        vec!["session*1".to_string()]
    );
}

#[test]
fn test_content_survives_reopen() {
    let temp_dir = create_temp_data_dir();

    {
        let storage = PersistentContentStorage::new(temp_dir.path(), ThreadChecker::new()).unwrap();
        let mutation = ContentMutation::builder()
            .upsert("k1", "v1")
            .upsert("k2", vec![0u8, 159, 146, 150])
            .build();
        assert_eq!(storage.commit(mutation).wait(), CommitResult::Success);
    }

    let storage = PersistentContentStorage::new(temp_dir.path(), ThreadChecker::new()).unwrap();
    let found = storage.get_all("").wait().unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found["k1"], b"v1".to_vec());
    assert_eq!(found["k2"], vec![0u8, 159, 146, 150]);
}

#[test]
fn test_on_disk_layout() {
    let temp_dir = create_temp_data_dir();
    let root = temp_dir.path();

    let journals = PersistentJournalStorage::new(root, ThreadChecker::new()).unwrap();
    let content = PersistentContentStorage::new(root, ThreadChecker::new()).unwrap();

    // Nothing exists until the first operation runs.
    assert!(!root.join("journal").exists());
    assert!(!root.join("content").exists());

    journals
        .commit(JournalMutation::builder("a b*c").append("r1").append("r2").build())
        .wait();
    content
        .commit(ContentMutation::builder().upsert("key", "value").build())
        .wait();

    let journal_file = root.join("journal").join(sanitize("a b*c"));
    assert_eq!(fs::read_to_string(journal_file).unwrap(), "r1\nr2\n");
    assert_eq!(fs::read(root.join("content").join("key")).unwrap(), b"value");
}

#[cfg(unix)]
#[test]
fn test_directories_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = create_temp_data_dir();
    let content = PersistentContentStorage::new(temp_dir.path(), ThreadChecker::new()).unwrap();
    content
        .commit(ContentMutation::builder().upsert("k", "v").build())
        .wait();

    let mode = fs::metadata(temp_dir.path().join("content"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[test]
fn test_externally_written_files_are_read() {
    let temp_dir = create_temp_data_dir();
    let journal_dir = temp_dir.path().join("journal");
    fs::create_dir_all(&journal_dir).unwrap();
    fs::write(journal_dir.join(sanitize("external")), "x\ny\n").unwrap();

    let storage = PersistentJournalStorage::new(temp_dir.path(), ThreadChecker::new()).unwrap();
    assert_eq!(
        storage.read("external").wait().unwrap(),
        vec![b"x".to_vec(), b"y".to_vec()]
    );
}

#[test]
fn test_config_opens_persistent_backend() {
    let temp_dir = create_temp_data_dir();
    let config = StoreConfig::new(temp_dir.path());
    assert_eq!(config.backend, BackendKind::Persistent);

    {
        let storage = config.open_journal_storage().unwrap();
        storage
            .commit(JournalMutation::builder("j").append("r").build())
            .wait();
    }

    let storage = config.open_journal_storage().unwrap();
    assert!(storage.exists("j").wait().unwrap());
}
