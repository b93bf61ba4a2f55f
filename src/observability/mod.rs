//! Observability for feedstore
//!
//! This module provides:
//! - Structured logging (JSON lines through `tracing`)
//! - Typed lifecycle events
//! - Per-backend operation counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on storage behavior
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use feedstore::observability::{Event, Logger, StorageMetrics};
//!
//! Logger::info(Event::StorageOpen.as_str(), &[("backend", "memory")]);
//!
//! let metrics = StorageMetrics::new();
//! metrics.increment_journal_appends();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{render_line, Logger, Severity, LOG_TARGET};
pub use metrics::{MetricsSnapshot, StorageMetrics};

use tracing_subscriber::{fmt, EnvFilter};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// Respects `RUST_LOG`; falls back to `info`. Does nothing if a subscriber
/// is already installed.
pub fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
