//! Store configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! { "data_dir": "/var/lib/feed", "backend": "persistent", "enforce_thread_affinity": true }
//! ```
//!
//! Backends are handed out as trait objects so owners receive them by
//! injection rather than reaching for a global.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{ContentStorage, InMemoryContentStorage, PersistentContentStorage};
use crate::errors::StorageResult;
use crate::journal::{InMemoryJournalStorage, JournalStorage, PersistentJournalStorage};
use crate::observability::{log_event_with_fields, Event};
use crate::threading::ThreadChecker;

/// Which storage implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-lifetime maps
    Memory,
    /// One file per journal / key under `data_dir`
    #[default]
    Persistent,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Persistent => "persistent",
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory holding `content/` and `journal/` (required)
    pub data_dir: PathBuf,

    /// Storage backend (optional, default "persistent")
    #[serde(default)]
    pub backend: BackendKind,

    /// Whether calls are checked against the thread that opened the store
    /// (optional, default true)
    #[serde(default = "default_enforce_thread_affinity")]
    pub enforce_thread_affinity: bool,
}

fn default_enforce_thread_affinity() -> bool {
    true
}

impl StoreConfig {
    /// A persistent configuration rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backend: BackendKind::default(),
            enforce_thread_affinity: default_enforce_thread_affinity(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("backend", config.backend.as_str()),
                ("data_dir", &config.data_dir.display().to_string()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Thread checker bound to the calling thread, or unchecked
    pub fn thread_checker(&self) -> ThreadChecker {
        if self.enforce_thread_affinity {
            ThreadChecker::new()
        } else {
            ThreadChecker::unchecked()
        }
    }

    /// Opens the configured content store. The calling thread becomes the
    /// store's main thread.
    pub fn open_content_storage(&self) -> StorageResult<Box<dyn ContentStorage>> {
        let checker = self.thread_checker();
        Ok(match self.backend {
            BackendKind::Memory => Box::new(InMemoryContentStorage::new(checker)),
            BackendKind::Persistent => {
                Box::new(PersistentContentStorage::new(&self.data_dir, checker)?)
            }
        })
    }

    /// Opens the configured journal store. The calling thread becomes the
    /// store's main thread.
    pub fn open_journal_storage(&self) -> StorageResult<Box<dyn JournalStorage>> {
        let checker = self.thread_checker();
        Ok(match self.backend {
            BackendKind::Memory => Box::new(InMemoryJournalStorage::new(checker)),
            BackendKind::Persistent => {
                Box::new(PersistentJournalStorage::new(&self.data_dir, checker)?)
            }
        })
    }
}
