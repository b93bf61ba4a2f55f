//! Structured logger for feedstore
//!
//! - One log line = one event, rendered as a JSON object
//! - `event` first, then `severity`, then fields sorted by key
//! - Emitted through `tracing` at the matching level; the subscriber
//!   installed by the host decides where lines go

use std::fmt;

/// Target used for every event emitted by this crate
pub const LOG_TARGET: &str = "feedstore";

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Programming errors; the caller panics right after logging
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured event logger
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = render_line(severity, event, fields);
        match severity {
            Severity::Trace => tracing::trace!(target: LOG_TARGET, "{}", line),
            Severity::Info => tracing::info!(target: LOG_TARGET, "{}", line),
            Severity::Warn => tracing::warn!(target: LOG_TARGET, "{}", line),
            Severity::Error => tracing::error!(target: LOG_TARGET, "{}", line),
            Severity::Fatal => tracing::error!(target: LOG_TARGET, fatal = true, "{}", line),
        }
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    /// Log at FATAL level
    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}

/// Render one event as a single JSON object (no trailing newline).
///
/// Fields are sorted by key so the same event always renders the same way.
pub fn render_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(256);

    output.push('{');
    push_pair(&mut output, "event", event);
    output.push(',');
    push_pair(&mut output, "severity", severity.as_str());

    let mut sorted_fields: Vec<_> = fields.iter().collect();
    sorted_fields.sort_by_key(|(k, _)| *k);

    for (key, value) in sorted_fields {
        output.push(',');
        push_pair(&mut output, key, value);
    }

    output.push('}');
    output
}

fn push_pair(output: &mut String, key: &str, value: &str) {
    output.push_str(&serde_json::Value::from(key).to_string());
    output.push(':');
    output.push_str(&serde_json::Value::from(value).to_string());
}
