//! File-backed journal storage
//!
//! One file per journal inside `<root>/journal/`, named by [`sanitize`].
//! Records are UTF-8 text, one per line, each followed by `\n`. A record
//! that is not UTF-8 or contains a newline cannot be stored and fails its
//! commit.
//!
//! Every call asserts the main thread, then runs on the store's worker
//! thread, which also owns the lazily created directory.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use super::sanitize::{desanitize, sanitize};
use super::{JournalMutation, JournalOperation, JournalStorage};
use crate::commit::{apply_in_order, CommitResult};
use crate::directory::{LazyDirectory, JOURNAL_DIR};
use crate::errors::{StorageError, StorageResult};
use crate::observability::{log_event_with_fields, Event, Logger, StorageMetrics};
use crate::threading::{Consumer, SerialWorker, ThreadChecker};

const STORE_NAME: &str = "persistent-journal";

/// State owned by the worker thread
struct JournalFiles {
    dir: LazyDirectory,
    checker: ThreadChecker,
    metrics: Arc<StorageMetrics>,
}

impl JournalFiles {
    fn dir(&mut self, operation: &str) -> StorageResult<PathBuf> {
        self.checker.check_not_main_thread(operation);
        Ok(self.dir.get()?.to_path_buf())
    }

    fn read(&mut self, journal_name: &str) -> StorageResult<Vec<Vec<u8>>> {
        let dir = self.dir("JournalStorage::read")?;
        // A name that cannot be a file name cannot have been written.
        let Ok(path) = journal_path(&dir, journal_name) else {
            return Ok(Vec::new());
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io("read journal", &path, e)),
        };
        Ok(text
            .split_terminator('\n')
            .map(|line| line.as_bytes().to_vec())
            .collect())
    }

    fn exists(&mut self, journal_name: &str) -> StorageResult<bool> {
        let dir = self.dir("JournalStorage::exists")?;
        Ok(journal_path(&dir, journal_name)
            .map(|path| path.is_file())
            .unwrap_or(false))
    }

    fn get_all_journals(&mut self) -> StorageResult<Vec<String>> {
        let dir = self.dir("JournalStorage::get_all_journals")?;
        let mut names = Vec::new();
        for file_name in list_files(&dir)? {
            match desanitize(&file_name) {
                Ok(name) => names.push(name),
                Err(e) => Logger::warn(
                    Event::JournalFileSkipped.as_str(),
                    &[("file", &file_name), ("reason", &e.to_string())],
                ),
            }
        }
        names.sort();
        Ok(names)
    }

    fn commit(&mut self, mutation: &JournalMutation) -> CommitResult {
        let dir = match self.dir("JournalStorage::commit") {
            Ok(dir) => dir,
            Err(e) => return directory_failure(mutation.journal_name(), &e),
        };
        let metrics = &self.metrics;
        let journal_name = mutation.journal_name();
        apply_in_order(STORE_NAME, journal_name, mutation.operations(), |operation| {
            apply(&dir, metrics, journal_name, operation)
        })
    }

    fn delete_all(&mut self) -> CommitResult {
        let dir = match self.dir("JournalStorage::delete_all") {
            Ok(dir) => dir,
            Err(e) => return directory_failure("*", &e),
        };
        let files = match list_files(&dir) {
            Ok(files) => files,
            Err(e) => return directory_failure("*", &e),
        };
        let metrics = &self.metrics;
        apply_in_order(STORE_NAME, "*", &files, |file_name| {
            metrics.increment_journal_deletes();
            remove_if_present(&dir.join(file_name))
        })
    }
}

fn apply(
    dir: &Path,
    metrics: &StorageMetrics,
    journal_name: &str,
    operation: &JournalOperation,
) -> StorageResult<()> {
    // A name without a usable file name has no file, so it reads as absent.
    let path = journal_path(dir, journal_name);
    match operation {
        JournalOperation::Append(record) => {
            metrics.increment_journal_appends();
            append_record(&path?, journal_name, record)
        }
        JournalOperation::Copy { to_journal_name } => {
            metrics.increment_journal_copies();
            let target = journal_path(dir, to_journal_name)?;
            if target.exists() {
                return Err(StorageError::JournalExists(to_journal_name.clone()));
            }
            let source = match path {
                Ok(source) if source.is_file() => source,
                _ => return Ok(()),
            };
            fs::copy(&source, &target)
                .map_err(|e| StorageError::io("copy journal", &target, e))?;
            Logger::trace(
                Event::JournalCopied.as_str(),
                &[("from", journal_name), ("to", to_journal_name)],
            );
            Ok(())
        }
        JournalOperation::Delete => {
            metrics.increment_journal_deletes();
            if let Ok(path) = path {
                remove_if_present(&path)?;
                Logger::trace(Event::JournalDeleted.as_str(), &[("journal", journal_name)]);
            }
            Ok(())
        }
    }
}

fn journal_path(dir: &Path, journal_name: &str) -> StorageResult<PathBuf> {
    let file_name = sanitize(journal_name);
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(StorageError::InvalidJournalName(journal_name.to_string()));
    }
    Ok(dir.join(file_name))
}

fn append_record(path: &Path, journal_name: &str, record: &[u8]) -> StorageResult<()> {
    let text = std::str::from_utf8(record).map_err(|e| StorageError::InvalidRecord {
        journal: journal_name.to_string(),
        reason: format!("not UTF-8: {}", e),
    })?;
    if text.contains('\n') {
        return Err(StorageError::InvalidRecord {
            journal: journal_name.to_string(),
            reason: "contains a newline".to_string(),
        });
    }

    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StorageError::io("open journal", path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| StorageError::io("append journal", path, e))
}

fn remove_if_present(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io("delete journal", path, e)),
    }
}

/// Regular files in `dir`; names that are not UTF-8 are skipped
fn list_files(dir: &Path) -> StorageResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::io("list journals", dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io("list journals", dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| StorageError::io("list journals", entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => files.push(name),
            Err(raw) => Logger::warn(
                Event::JournalFileSkipped.as_str(),
                &[("file", &raw.to_string_lossy()), ("reason", "file name is not UTF-8")],
            ),
        }
    }
    Ok(files)
}

fn directory_failure(target: &str, e: &StorageError) -> CommitResult {
    Logger::error(
        Event::CommitFailed.as_str(),
        &[
            ("store", STORE_NAME),
            ("target", target),
            ("code", e.code()),
            ("message", &e.to_string()),
        ],
    );
    CommitResult::Failure
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

/// Journal storage persisted as one text file per journal
pub struct PersistentJournalStorage {
    checker: ThreadChecker,
    path: PathBuf,
    metrics: Arc<StorageMetrics>,
    worker: SerialWorker<JournalFiles>,
}

impl PersistentJournalStorage {
    /// Creates the store rooted at `root`. Nothing is touched on disk until
    /// the first operation runs.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WorkerSpawn` if the worker thread cannot start.
    pub fn new(root: &Path, checker: ThreadChecker) -> StorageResult<Self> {
        let dir = LazyDirectory::new(root, JOURNAL_DIR);
        let path = dir.path().to_path_buf();
        let metrics = Arc::new(StorageMetrics::new());
        let files = JournalFiles {
            dir,
            checker: checker.clone(),
            metrics: metrics.clone(),
        };
        let worker = SerialWorker::spawn("feedstore-journal", files)?;

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

    /// Directory holding the journal files
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }
}

impl JournalStorage for PersistentJournalStorage {
    fn read_with(&self, journal_name: &str, consumer: Consumer<StorageResult<Vec<Vec<u8>>>>) {
        self.checker.check_main_thread("JournalStorage::read");
        self.metrics.increment_journal_reads();

        let journal_name = journal_name.to_string();
        self.worker
            .execute(move |files| consumer.accept(report(files.read(&journal_name))));
    }

    fn exists_with(&self, journal_name: &str, consumer: Consumer<StorageResult<bool>>) {
        self.checker.check_main_thread("JournalStorage::exists");

        let journal_name = journal_name.to_string();
        self.worker
            .execute(move |files| consumer.accept(report(files.exists(&journal_name))));
    }

    fn get_all_journals_with(&self, consumer: Consumer<StorageResult<Vec<String>>>) {
        self.checker.check_main_thread("JournalStorage::get_all_journals");

        self.worker
            .execute(move |files| consumer.accept(report(files.get_all_journals())));
    }

    fn commit_with(&self, mutation: JournalMutation, consumer: Consumer<CommitResult>) {
        self.checker.check_main_thread("JournalStorage::commit");

        self.worker.execute(move |files| {
            let result = files.commit(&mutation);
            files.metrics.record_commit(result.is_success());
            consumer.accept(result);
        });
    }

    fn delete_all_with(&self, consumer: Consumer<CommitResult>) {
        self.checker.check_main_thread("JournalStorage::delete_all");

        self.worker.execute(move |files| {
            let result = files.delete_all();
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> PersistentJournalStorage {
        PersistentJournalStorage::new(temp.path(), ThreadChecker::new()).unwrap()
    }

    #[test]
    fn test_file_format_is_one_record_per_line() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        let result = storage
            .commit(JournalMutation::builder("j").append("a").append("").append("c").build())
            .wait();
        assert_eq!(result, CommitResult::Success);

        let text = fs::read_to_string(temp.path().join("journal").join("j")).unwrap();
        assert_eq!(text, "a\n\nc\n");
        assert_eq!(
            storage.read("j").wait().unwrap(),
            vec![b"a".to_vec(), Vec::new(), b"c".to_vec()]
        );
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        storage
            .commit(JournalMutation::builder("a b/c*").append("x").build())
            .wait();

        assert!(temp.path().join("journal").join("a+b%2Fc_ATK_").is_file());
        assert_eq!(storage.get_all_journals().wait().unwrap(), vec!["a b/c*".to_string()]);
    }

    #[test]
    fn test_newline_and_non_utf8_records_are_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);

        let newline = storage
            .commit(JournalMutation::builder("j").append("ok").append("two\nlines").build())
            .wait();
        assert_eq!(newline, CommitResult::Failure);

        let binary = storage
            .commit(JournalMutation::builder("j").append(vec![0xff, 0xfe]).build())
            .wait();
        assert_eq!(binary, CommitResult::Failure);

        assert_eq!(storage.read("j").wait().unwrap(), vec![b"ok".to_vec()]);
    }

    #[test]
    fn test_unusable_names() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);

        for name in ["", ".", ".."] {
            let result = storage
                .commit(JournalMutation::builder(name).append("x").build())
                .wait();
            assert_eq!(result, CommitResult::Failure, "name {:?}", name);
            assert!(!storage.exists(name).wait().unwrap());
            assert!(storage.read(name).wait().unwrap().is_empty());

            // Absent like any unwritten journal: delete and copy-from are no-ops.
            let delete = storage.commit(JournalMutation::builder(name).delete().build()).wait();
            assert_eq!(delete, CommitResult::Success, "name {:?}", name);
            let copy = storage.commit(JournalMutation::builder(name).copy("t").build()).wait();
            assert_eq!(copy, CommitResult::Success, "name {:?}", name);
            assert!(!storage.exists("t").wait().unwrap());
        }
    }

    #[test]
    fn test_unreadable_file_names_are_skipped_when_listing() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        storage.commit(JournalMutation::builder("good").append("x").build()).wait();
        fs::write(temp.path().join("journal").join("%FF"), b"junk\n").unwrap();
        fs::create_dir(temp.path().join("journal").join("subdir")).unwrap();

        assert_eq!(storage.get_all_journals().wait().unwrap(), vec!["good".to_string()]);
    }

    #[test]
    fn test_delete_all_removes_files() {
        let temp = TempDir::new().unwrap();
        let storage = open(&temp);
        storage.commit(JournalMutation::builder("a").append("1").build()).wait();
        storage.commit(JournalMutation::builder("b").append("2").build()).wait();

        assert_eq!(storage.delete_all().wait(), CommitResult::Success);
        assert!(storage.get_all_journals().wait().unwrap().is_empty());
        assert_eq!(fs::read_dir(storage.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directory_failure_fails_commit_and_reads() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();
        let storage = PersistentJournalStorage::new(&blocker, ThreadChecker::new()).unwrap();

        let result = storage.commit(JournalMutation::builder("j").append("x").build()).wait();
        assert_eq!(result, CommitResult::Failure);
        assert!(matches!(storage.read("j").wait(), Err(StorageError::Io { .. })));
    }
}
