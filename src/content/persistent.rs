//! File-backed content storage
//!
//! One file per key inside `<root>/content/`. The key is the file name and
//! the file holds the raw value, replaced wholesale on upsert. Every call
//! asserts the main thread, then runs on the store's worker thread.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use super::{ContentMap, ContentMutation, ContentOperation, ContentStorage};
use crate::commit::{apply_in_order, CommitResult};
use crate::directory::{LazyDirectory, CONTENT_DIR};
use crate::errors::{StorageError, StorageResult};
use crate::observability::{log_event_with_fields, Event, Logger, StorageMetrics};
use crate::threading::{Consumer, SerialWorker, ThreadChecker};

const STORE_NAME: &str = "persistent-content";

/// State owned by the worker thread
struct ContentFiles {
    dir: LazyDirectory,
    checker: ThreadChecker,
    metrics: Arc<StorageMetrics>,
}

impl ContentFiles {
    fn dir(&mut self, operation: &str) -> StorageResult<PathBuf> {
        self.checker.check_not_main_thread(operation);
        Ok(self.dir.get()?.to_path_buf())
    }

    fn get(&mut self, keys: &[String]) -> StorageResult<ContentMap> {
        let dir = self.dir("ContentStorage::get")?;
        let mut found = HashMap::new();
        for key in keys {
            // A key that is not a plain file name can never have been stored.
            let Some(path) = key_path(&dir, key) else {
                continue;
            };
            if let Some(value) = read_value(&path)? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    fn get_all(&mut self, prefix: &str) -> StorageResult<ContentMap> {
        let dir = self.dir("ContentStorage::get_all")?;
        let mut found = HashMap::new();
        for key in list_keys(&dir)? {
            if !key.starts_with(prefix) {
                continue;
            }
            if let Some(value) = read_value(&dir.join(&key))? {
                found.insert(key, value);
            }
        }
        Ok(found)
    }

    fn get_all_keys(&mut self) -> StorageResult<Vec<String>> {
        let dir = self.dir("ContentStorage::get_all_keys")?;
        let mut keys = list_keys(&dir)?;
        keys.sort();
        Ok(keys)
    }

    fn commit(&mut self, mutation: &ContentMutation) -> CommitResult {
        let dir = match self.dir("ContentStorage::commit") {
            Ok(dir) => dir,
            Err(e) => {
                Logger::error(
                    Event::CommitFailed.as_str(),
                    &[("store", STORE_NAME), ("code", e.code()), ("message", &e.to_string())],
                );
                return CommitResult::Failure;
            }
        };
        let metrics = &self.metrics;
        apply_in_order(STORE_NAME, "content", mutation.operations(), |operation| {
            apply(&dir, metrics, operation)
        })
    }
}

fn apply(dir: &Path, metrics: &StorageMetrics, operation: &ContentOperation) -> StorageResult<()> {
    operation.validate()?;
    match operation {
        ContentOperation::Upsert { key, value } => {
            let path = key_path(dir, key).ok_or_else(|| StorageError::InvalidKey(key.clone()))?;
            let existed = path.is_file();
            fs::write(&path, value).map_err(|e| StorageError::io("write value", &path, e))?;
            if existed {
                metrics.increment_content_updates();
            } else {
                metrics.increment_content_inserts();
            }
        }
        ContentOperation::Delete { key } => {
            metrics.increment_content_deletes();
            if let Some(path) = key_path(dir, key) {
                remove_if_present(&path)?;
            }
        }
        ContentOperation::DeleteByPrefix { prefix } => {
            metrics.increment_content_prefix_deletes();
            for key in list_keys(dir)? {
                if key.starts_with(prefix.as_str()) {
                    remove_if_present(&dir.join(&key))?;
                }
            }
        }
    }
    Ok(())
}

/// `<dir>/<key>`, or `None` when the key cannot be a file name inside `dir`
fn key_path(dir: &Path, key: &str) -> Option<PathBuf> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return None;
    }
    Some(dir.join(key))
}

/// `None` when the file is missing or empty
fn read_value(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io("read value", path, e)),
    }
}

fn remove_if_present(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io("delete value", path, e)),
    }
}

/// Names of the regular files in `dir` that are valid UTF-8
fn list_keys(dir: &Path) -> StorageResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::io("list keys", dir, e))?;
    let mut keys = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io("list keys", dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| StorageError::io("list keys", entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Ok(key) = entry.file_name().into_string() {
            keys.push(key);
        }
    }
    Ok(keys)
}

/// Content storage persisted as one file per key
pub struct PersistentContentStorage {
    checker: ThreadChecker,
    path: PathBuf,
    metrics: Arc<StorageMetrics>,
    worker: SerialWorker<ContentFiles>,
}

impl PersistentContentStorage {
    /// Creates the store rooted at `root`. Nothing is touched on disk until
    /// the first operation runs.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WorkerSpawn` if the worker thread cannot start.
    pub fn new(root: &Path, checker: ThreadChecker) -> StorageResult<Self> {
        let dir = LazyDirectory::new(root, CONTENT_DIR);
        let path = dir.path().to_path_buf();
        let metrics = Arc::new(StorageMetrics::new());
        let files = ContentFiles {
            dir,
            checker: checker.clone(),
            metrics: metrics.clone(),
        };
        let worker = SerialWorker::spawn("feedstore-content", files)?;

        log_event_with_fields(
            Event::StorageOpen,
            &[("backend", STORE_NAME), ("path", &path.display().to_string())],
        );
        Ok(Self {
            checker,
            path,
            metrics,
            worker,
        })
    }

    /// Directory holding the value files
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }
}

impl ContentStorage for PersistentContentStorage {
    fn get_with(&self, keys: &[String], consumer: Consumer<StorageResult<ContentMap>>) {
        self.checker.check_main_thread("ContentStorage::get");
        self.metrics.increment_content_gets();

        let keys = keys.to_vec();
        self.worker.execute(move |files| consumer.accept(report(files.get(&keys))));
    }

    fn get_all_with(&self, prefix: &str, consumer: Consumer<StorageResult<ContentMap>>) {
        self.checker.check_main_thread("ContentStorage::get_all");
        self.metrics.increment_content_gets();

        let prefix = prefix.to_string();
        self.worker
            .execute(move |files| consumer.accept(report(files.get_all(&prefix))));
    }

    fn get_all_keys_with(&self, consumer: Consumer<StorageResult<Vec<String>>>) {
        self.checker.check_main_thread("ContentStorage::get_all_keys");

        self.worker
            .execute(move |files| consumer.accept(report(files.get_all_keys())));
    }

    fn commit_with(&self, mutation: ContentMutation, consumer: Consumer<CommitResult>) {
        self.checker.check_main_thread("ContentStorage::commit");

        self.worker.execute(move |files| {
            let result = files.commit(&mutation);
            files.metrics.record_commit(result.is_success());
            consumer.accept(result);
        });
    }

    fn dump(&self) -> serde_json::Value {
        json!({
            "backend": STORE_NAME,
            "path": self.path.display().to_string(),
            "metrics": self.metrics.to_json(),
        })
    }
}

fn report<T>(result: StorageResult<T>) -> StorageResult<T> {
    if let Err(e) = &result {
        Logger::error(
            Event::ReadFailed.as_str(),
            &[("store", STORE_NAME), ("code", e.code()), ("message", &e.to_string())],
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> PersistentContentStorage {
        PersistentContentStorage::new(temp.path(), ThreadChecker::new()).unwrap()
    }

    #[test]
    fn test_directory_is_lazy() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        assert!(!storage.path().exists());

        storage.get_all_keys().wait().unwrap();
        assert!(storage.path().is_dir());
    }

    #[test]
    fn test_value_is_the_whole_file() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        let result = storage
            .commit(ContentMutation::builder().upsert("k", "first").upsert("k", "v2").build())
            .wait();
        assert_eq!(result, CommitResult::Success);

        assert_eq!(fs::read(temp.path().join("content").join("k")).unwrap(), b"v2");
        let snapshot = storage.metrics().snapshot();
        assert_eq!(snapshot.content_inserts, 1);
        assert_eq!(snapshot.content_updates, 1);
    }

    #[test]
    fn test_key_with_separator_fails_commit() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        let result = storage
            .commit(
                ContentMutation::builder()
                    .upsert("ok", "v")
                    .upsert("no/such/dir", "v")
                    .build(),
            )
            .wait();
        assert_eq!(result, CommitResult::Failure);

        let keys = storage.get_all_keys().wait().unwrap();
        assert_eq!(keys, vec!["ok".to_string()]);
    }

    #[test]
    fn test_key_cannot_leave_content_directory() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);

        for key in ["../x", ".", ".."] {
            let result = storage
                .commit(ContentMutation::builder().upsert(key, "v").build())
                .wait();
            assert_eq!(result, CommitResult::Failure, "key {:?}", key);
        }
        assert!(!temp.path().join("x").exists());

        // Deleting such a key touches nothing.
        fs::write(temp.path().join("x"), b"outside").unwrap();
        let result = storage
            .commit(ContentMutation::builder().delete("../x").build())
            .wait();
        assert_eq!(result, CommitResult::Success);
        assert!(temp.path().join("x").exists());
    }

    #[test]
    fn test_empty_file_is_treated_as_missing() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        storage.get_all_keys().wait().unwrap();
        fs::write(storage.path().join("blank"), b"").unwrap();

        let found = storage.get(&["blank".to_string()]).wait().unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_callback_runs_on_worker() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        let (tx, rx) = std::sync::mpsc::channel();
        storage.get_all_keys_with(Consumer::new(move |result: StorageResult<Vec<String>>| {
            let on_worker = std::thread::current().name() == Some("feedstore-content");
            tx.send((result.is_ok(), on_worker)).unwrap();
        }));
        assert_eq!(rx.recv().unwrap(), (true, true));
    }
}
