//! In-memory journal storage
//!
//! Work runs inline on the calling thread; consumers are called before the
//! method returns. State is discarded with the value.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::json;

use super::{JournalMutation, JournalOperation, JournalStorage};
use crate::commit::{apply_in_order, CommitResult};
use crate::errors::{StorageError, StorageResult};
use crate::observability::{log_event_with_fields, Event, Logger, StorageMetrics};
use crate::threading::{Consumer, ThreadChecker};

const STORE_NAME: &str = "memory-journal";

type Journals = HashMap<String, Vec<Vec<u8>>>;

#[derive(Debug)]
pub struct InMemoryJournalStorage {
    checker: ThreadChecker,
    journals: Mutex<Journals>,
    metrics: StorageMetrics,
}

impl InMemoryJournalStorage {
    pub fn new(checker: ThreadChecker) -> Self {
        log_event_with_fields(Event::StorageOpen, &[("backend", STORE_NAME)]);
        Self {
            checker,
            journals: Mutex::new(HashMap::new()),
            metrics: StorageMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }

    fn lock(&self) -> MutexGuard<'_, Journals> {
        self.journals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(
        &self,
        journals: &mut Journals,
        journal_name: &str,
        operation: &JournalOperation,
    ) -> StorageResult<()> {
        match operation {
            JournalOperation::Append(record) => {
                self.metrics.increment_journal_appends();
                journals
                    .entry(journal_name.to_string())
                    .or_default()
                    .push(record.clone());
            }
            JournalOperation::Copy { to_journal_name } => {
                self.metrics.increment_journal_copies();
                if journals.contains_key(to_journal_name) {
                    return Err(StorageError::JournalExists(to_journal_name.clone()));
                }
                if let Some(records) = journals.get(journal_name).cloned() {
                    journals.insert(to_journal_name.clone(), records);
                    Logger::trace(
                        Event::JournalCopied.as_str(),
                        &[("from", journal_name), ("to", to_journal_name)],
                    );
                }
            }
            JournalOperation::Delete => {
                self.metrics.increment_journal_deletes();
                if journals.remove(journal_name).is_some() {
                    Logger::trace(Event::JournalDeleted.as_str(), &[("journal", journal_name)]);
                }
            }
        }
        Ok(())
    }
}

impl Default for InMemoryJournalStorage {
    fn default() -> Self {
        Self::new(ThreadChecker::new())
    }
}

impl JournalStorage for InMemoryJournalStorage {
    fn read_with(&self, journal_name: &str, consumer: Consumer<StorageResult<Vec<Vec<u8>>>>) {
        self.checker.check_main_thread("JournalStorage::read");
        self.metrics.increment_journal_reads();

        let records = self.lock().get(journal_name).cloned().unwrap_or_default();
        consumer.accept(Ok(records));
    }

    fn exists_with(&self, journal_name: &str, consumer: Consumer<StorageResult<bool>>) {
        self.checker.check_main_thread("JournalStorage::exists");

        let exists = self.lock().contains_key(journal_name);
        consumer.accept(Ok(exists));
    }

    fn get_all_journals_with(&self, consumer: Consumer<StorageResult<Vec<String>>>) {
        self.checker.check_main_thread("JournalStorage::get_all_journals");

        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        consumer.accept(Ok(names));
    }

    fn commit_with(&self, mutation: JournalMutation, consumer: Consumer<CommitResult>) {
        self.checker.check_main_thread("JournalStorage::commit");

        let result = {
            let mut journals = self.lock();
            let journal_name = mutation.journal_name();
            apply_in_order(STORE_NAME, journal_name, mutation.operations(), |operation| {
                self.apply(&mut journals, journal_name, operation)
            })
        };
        self.metrics.record_commit(result.is_success());
        consumer.accept(result);
    }

    fn delete_all_with(&self, consumer: Consumer<CommitResult>) {
        self.checker.check_main_thread("JournalStorage::delete_all");

        for (name, _) in self.lock().drain() {
            self.metrics.increment_journal_deletes();
            Logger::trace(Event::JournalDeleted.as_str(), &[("journal", &name)]);
        }
        consumer.accept(CommitResult::Success);
    }

    fn dump(&self) -> serde_json::Value {
        let journals = self.lock();
        let records: usize = journals.values().map(Vec::len).sum();
        json!({
            "backend": STORE_NAME,
            "journals": journals.len(),
            "records": records,
            "metrics": self.metrics.to_json(),
        })
    }
}
