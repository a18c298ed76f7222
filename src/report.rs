//! User-facing message sinks.
//!
//! The pipeline talks to its caller through a [`Reporter`]: step progress is
//! reported with [`Reporter::info`], recoverable oddities with
//! [`Reporter::warning`] and the reason for an aborted run with
//! [`Reporter::fatal`]. How messages are shown (console, CI annotations, a
//! log file) is up to the implementation.
//!
//! # Example
//!
//! ```rust
//! use iconpack::report::{MemoryReporter, Reporter, Severity};
//!
//! let reporter = MemoryReporter::new();
//! reporter.warning("Found existing icon file, overwriting...");
//! assert_eq!(reporter.count(Severity::Warning), 1);
//! ```

use std::fmt;
use std::sync::Mutex;

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Step progress and non-fatal notices.
    Info,
    /// Something unexpected that did not stop the run.
    Warning,
    /// The run is being aborted.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Fatal => write!(f, "error"),
        }
    }
}

/// Sink for messages emitted while a package is being processed.
///
/// All methods take `&self` so a reporter can be shared by reference across
/// the pipeline steps. Implementations that buffer must use interior
/// mutability.
pub trait Reporter {
    /// Records a message with the given severity.
    fn report(&self, severity: Severity, message: &str);

    /// Records step progress or a non-fatal notice.
    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    /// Records a warning.
    fn warning(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    /// Records the reason a run is being aborted.
    fn fatal(&self, message: &str) {
        self.report(Severity::Fatal, message);
    }
}

impl<T: Reporter + ?Sized> Reporter for &T {
    fn report(&self, severity: Severity, message: &str) {
        (**self).report(severity, message);
    }
}

/// Reporter that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReport;

impl Reporter for NoReport {
    fn report(&self, _severity: Severity, _message: &str) {}
}

/// Reporter that forwards messages to the [`log`] facade.
///
/// Info maps to `log::info!`, warnings to `log::warn!` and fatal messages to
/// `log::error!`, all under the `iconpack` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => log::info!(target: "iconpack", "{}", message),
            Severity::Warning => log::warn!(target: "iconpack", "{}", message),
            Severity::Fatal => log::error!(target: "iconpack", "{}", message),
        }
    }
}

/// Reporter that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded messages, oldest first.
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.lock().clone()
    }

    /// Returns the messages recorded with the given severity.
    pub fn messages_with(&self, severity: Severity) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Returns the number of messages recorded with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.lock().iter().filter(|(s, _)| *s == severity).count()
    }

    /// Returns `true` if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|(_, m)| m.contains(needle))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Severity, String)>> {
        // A poisoned buffer still holds valid messages.
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, severity: Severity, message: &str) {
        self.lock().push((severity, message.to_string()));
    }
}
