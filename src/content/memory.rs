//! In-memory content storage
//!
//! Work runs inline on the calling thread; consumers are called before the
//! method returns. State is discarded with the value.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::json;

use super::{ContentMap, ContentMutation, ContentOperation, ContentStorage};
use crate::commit::{apply_in_order, CommitResult};
use crate::errors::StorageResult;
use crate::observability::{log_event_with_fields, Event, StorageMetrics};
use crate::threading::{Consumer, ThreadChecker};

const STORE_NAME: &str = "memory-content";

#[derive(Debug)]
pub struct InMemoryContentStorage {
    checker: ThreadChecker,
    store: Mutex<HashMap<String, Vec<u8>>>,
    metrics: StorageMetrics,
}

impl InMemoryContentStorage {
    pub fn new(checker: ThreadChecker) -> Self {
        log_event_with_fields(Event::StorageOpen, &[("backend", STORE_NAME)]);
        Self {
            checker,
            store: Mutex::new(HashMap::new()),
            metrics: StorageMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(
        &self,
        store: &mut HashMap<String, Vec<u8>>,
        operation: &ContentOperation,
    ) -> StorageResult<()> {
        operation.validate()?;
        match operation {
            ContentOperation::Upsert { key, value } => {
                if store.insert(key.clone(), value.clone()).is_some() {
                    self.metrics.increment_content_updates();
                } else {
                    self.metrics.increment_content_inserts();
                }
            }
            ContentOperation::Delete { key } => {
                self.metrics.increment_content_deletes();
                store.remove(key);
            }
            ContentOperation::DeleteByPrefix { prefix } => {
                self.metrics.increment_content_prefix_deletes();
                store.retain(|key, _| !key.starts_with(prefix.as_str()));
            }
        }
        Ok(())
    }
}

impl Default for InMemoryContentStorage {
    fn default() -> Self {
        Self::new(ThreadChecker::new())
    }
}

impl ContentStorage for InMemoryContentStorage {
    fn get_with(&self, keys: &[String], consumer: Consumer<StorageResult<ContentMap>>) {
        self.checker.check_main_thread("ContentStorage::get");
        self.metrics.increment_content_gets();

        let store = self.lock();
        let found = keys
            .iter()
            .filter_map(|key| {
                store
                    .get(key)
                    .filter(|value| !value.is_empty())
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect();
        drop(store);
        consumer.accept(Ok(found));
    }

    fn get_all_with(&self, prefix: &str, consumer: Consumer<StorageResult<ContentMap>>) {
        self.checker.check_main_thread("ContentStorage::get_all");
        self.metrics.increment_content_gets();

        let found = self
            .lock()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        consumer.accept(Ok(found));
    }

    fn get_all_keys_with(&self, consumer: Consumer<StorageResult<Vec<String>>>) {
        self.checker.check_main_thread("ContentStorage::get_all_keys");

        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        consumer.accept(Ok(keys));
    }

    fn commit_with(&self, mutation: ContentMutation, consumer: Consumer<CommitResult>) {
        self.checker.check_main_thread("ContentStorage::commit");

        let result = {
            let mut store = self.lock();
            apply_in_order(STORE_NAME, "content", mutation.operations(), |operation| {
                self.apply(&mut store, operation)
            })
        };
        self.metrics.record_commit(result.is_success());
        consumer.accept(result);
    }

    fn dump(&self) -> serde_json::Value {
        json!({
            "backend": STORE_NAME,
            "entries": self.len(),
            "metrics": self.metrics.to_json(),
        })
    }
}
