//! Output formatting and message reporting for CLI operations.

use std::path::Path;

use chrono::DateTime;
use console::style;
use iconpack::{Outcome, Reporter, Severity, TarEntry};
use serde_json::json;

use crate::OutputFormat;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of package entries
    fn format_list(&self, package: &Path, entries: &[TarEntry]) -> String;

    /// Formats the outcome of a set-icon run
    fn format_outcome(&self, package: &Path, outcome: &Outcome) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, _package: &Path, entries: &[TarEntry]) -> String {
        let mut output = String::new();

        output.push_str(&format!("{:>12} {:>19} {}\n", "Size", "Modified", "Name"));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        for entry in entries {
            total_size += entry.size;
            output.push_str(&format!(
                "{:>12} {:>19} {}\n",
                humanize_bytes(entry.size),
                format_timestamp(entry.mtime),
                entry.name
            ));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} entries, {} total\n",
            entries.len(),
            humanize_bytes(total_size)
        ));

        output
    }

    fn format_outcome(&self, package: &Path, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Updated(result) => {
                let mut output = format!("Updated {}\n", package.display());
                output.push_str(&format!("  Entries:     {}\n", result.total_entries()));
                if result.entries_deleted > 0 {
                    output.push_str(&format!("  Replaced:    {}\n", result.entries_deleted));
                }
                for appended in &result.appended {
                    output.push_str(&format!(
                        "  Icon:        {} ({}, CRC {:08X})\n",
                        appended.name,
                        humanize_bytes(appended.size),
                        appended.crc32
                    ));
                }
                output.push_str(&format!(
                    "  Size:        {} ({} uncompressed)\n",
                    humanize_bytes(result.packed_bytes),
                    humanize_bytes(result.total_bytes)
                ));
                output
            }
            Outcome::Skipped(reason) => format!("Skipped: {}\n", reason),
        }
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, package: &Path, entries: &[TarEntry]) -> String {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "size": e.size,
                    "mode": e.mode,
                    "modified": e.mtime,
                    "offset": e.offset,
                })
            })
            .collect();
        let obj = json!({
            "package": package.display().to_string(),
            "entries": items,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_outcome(&self, package: &Path, outcome: &Outcome) -> String {
        let obj = match outcome {
            Outcome::Updated(result) => json!({
                "package": package.display().to_string(),
                "status": "updated",
                "entries_kept": result.entries_kept,
                "entries_deleted": result.entries_deleted,
                "entries_added": result.entries_added,
                "total_bytes": result.total_bytes,
                "packed_bytes": result.packed_bytes,
                "appended": result.appended.iter().map(|a| json!({
                    "name": a.name,
                    "size": a.size,
                    "crc32": a.crc32,
                })).collect::<Vec<_>>(),
            }),
            Outcome::Skipped(reason) => json!({
                "package": package.display().to_string(),
                "status": "skipped",
                "missing": reason.input.noun(),
                "path": reason.path.display().to_string(),
                "policy": reason.policy.as_str(),
            }),
        };

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Human | OutputFormat::Github => Box::new(HumanFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Prints pipeline messages for the selected output format.
///
/// Human output styles warnings and errors on stderr. GitHub output writes
/// workflow commands on stdout so warnings and errors become annotations.
/// JSON output keeps stdout parseable and sends everything to stderr.
pub struct ConsoleReporter {
    format: OutputFormat,
    quiet: bool,
}

impl ConsoleReporter {
    /// Creates a reporter for the given format
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, severity: Severity, message: &str) {
        if self.quiet && severity == Severity::Info {
            return;
        }
        match (self.format, severity) {
            (OutputFormat::Github, Severity::Info) => println!("{}", message),
            (OutputFormat::Github, _) => println!("::{}::{}", severity, escape_workflow(message)),
            (_, Severity::Info) => eprintln!("{}", message),
            (_, Severity::Warning) => {
                eprintln!("{} {}", style("warning:").yellow().bold(), message)
            }
            (_, Severity::Fatal) => eprintln!("{} {}", style("error:").red().bold(), message),
        }
    }
}

/// Escapes a message for use in a workflow command.
pub fn escape_workflow(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Formats seconds since the epoch as a UTC datetime string.
///
/// Values chrono cannot represent are printed as raw seconds.
pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}
