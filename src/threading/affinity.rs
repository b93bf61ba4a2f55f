//! Thread affinity checks
//!
//! Public storage calls are made from one designated "main" thread. File I/O
//! happens off that thread, on a storage worker. A call on the wrong thread
//! is a programming error: it is logged at FATAL and the process panics.

use std::thread::{self, ThreadId};

use crate::observability::{log_event_with_fields, Event};

/// Asserts which thread an operation runs on
#[derive(Debug, Clone)]
pub struct ThreadChecker {
    /// `None` disables every check
    main: Option<ThreadId>,
}

impl ThreadChecker {
    /// Binds the checker to the calling thread, which becomes the main thread.
    pub fn new() -> Self {
        Self {
            main: Some(thread::current().id()),
        }
    }

    /// A checker that accepts every thread.
    pub fn unchecked() -> Self {
        Self { main: None }
    }

    /// Returns whether checks are enforced
    pub fn is_enforced(&self) -> bool {
        self.main.is_some()
    }

    /// True when called from the main thread. Always false when unchecked.
    pub fn is_main_thread(&self) -> bool {
        self.main == Some(thread::current().id())
    }

    /// Panics unless called from the main thread.
    pub fn check_main_thread(&self, operation: &str) {
        if let Some(main) = self.main {
            if thread::current().id() != main {
                violation(operation, "main thread", main);
            }
        }
    }

    /// Panics when called from the main thread.
    pub fn check_not_main_thread(&self, operation: &str) {
        if let Some(main) = self.main {
            if thread::current().id() == main {
                violation(operation, "background thread", main);
            }
        }
    }
}

impl Default for ThreadChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn violation(operation: &str, expected: &str, main: ThreadId) -> ! {
    let current = thread::current();
    let current_name = current.name().unwrap_or("<unnamed>");
    let current_id = format!("{:?}", current.id());
    let main_id = format!("{:?}", main);
    log_event_with_fields(
        Event::ThreadViolation,
        &[
            ("operation", operation),
            ("expected", expected),
            ("current_thread", current_name),
            ("current_id", &current_id),
            ("main_id", &main_id),
        ],
    );
    panic!(
        "{} must run on the {} (current: {} {}, main: {})",
        operation, expected, current_name, current_id, main_id
    );
}
