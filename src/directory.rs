//! Lazily created backing directories for the persistent backends
//!
//! The directory is created on first use, not at construction, and is
//! private to the owning user (0o700 on unix). It lives inside the state of
//! a `SerialWorker`, so only one thread ever runs the create-if-missing check.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::{StorageError, StorageResult};
use crate::observability::{log_event_with_fields, Event};

/// Directory name used by the content store
pub const CONTENT_DIR: &str = "content";
/// Directory name used by the journal store
pub const JOURNAL_DIR: &str = "journal";

#[derive(Debug)]
pub struct LazyDirectory {
    path: PathBuf,
    created: bool,
}

impl LazyDirectory {
    /// `<root>/<name>`, not yet touched on disk
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            path: root.join(name),
            created: false,
        }
    }

    /// Path of the directory, whether or not it exists yet
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory, creating it on first call.
    pub fn get(&mut self) -> StorageResult<&Path> {
        if !self.created {
            if !self.path.is_dir() {
                create_private_dir(&self.path)
                    .map_err(|e| StorageError::io("create directory", &self.path, e))?;
                log_event_with_fields(
                    Event::DirectoryCreated,
                    &[("path", &self.path.display().to_string())],
                );
            }
            self.created = true;
        }
        Ok(&self.path)
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}
