//! Error types for package icon operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when validating inputs and editing a package archive, along
//! with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Missing
//! input files are the only condition that a [`MissingFilePolicy`] can
//! downgrade; everything else is fatal to the run that produced it.
//!
//! ```rust,no_run
//! use iconpack::{Error, Outcome, PipelineOptions};
//!
//! fn set_icon(package: &str, icon: &str) -> iconpack::Result<()> {
//!     match iconpack::run(&PipelineOptions::new(package, icon)) {
//!         Ok(Outcome::Updated(result)) => {
//!             println!("kept {} entries", result.entries_kept);
//!             Ok(())
//!         }
//!         Ok(Outcome::Skipped(reason)) => {
//!             println!("nothing to do: {}", reason);
//!             Ok(())
//!         }
//!         Err(e @ Error::CorruptArchive { .. }) => {
//!             eprintln!("The package is damaged: {}", e);
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! [`MissingFilePolicy`]: crate::policy::MissingFilePolicy

use std::io;
use std::path::PathBuf;

use crate::locate::InputKind;

/// The main error type for package icon operations.
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Validation | [`InvalidPolicy`][Self::InvalidPolicy], [`InvalidExtension`][Self::InvalidExtension] | Caller misconfiguration |
/// | Inputs | [`FileNotFound`][Self::FileNotFound] | Missing icon or package under the `fail` policy |
/// | Format | [`CorruptArchive`][Self::CorruptArchive] | Invalid gzip or tar data |
/// | Limits | [`EntryTooLarge`][Self::EntryTooLarge], [`InvalidEntryName`][Self::InvalidEntryName] | Entry cannot be encoded |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    ///
    /// Read, write, copy and rename failures all land here, including a full
    /// disk while the rebuilt package is being written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A missing-file policy value is not one of `fail`, `warn` or `ignore`.
    #[error("Invalid {} not found behavior: {value}", .input.noun())]
    InvalidPolicy {
        /// The input the policy applies to.
        input: InputKind,
        /// The rejected value, verbatim.
        value: String,
    },

    /// An input path does not carry the required extension.
    ///
    /// The check is case-sensitive: `icon.PNG` is rejected.
    #[error("{input} path must end with {expected}: {}", .path.display())]
    InvalidExtension {
        /// The input that failed validation.
        input: InputKind,
        /// The offending path.
        path: PathBuf,
        /// The literal suffix that was required.
        expected: &'static str,
    },

    /// An input file does not exist and its policy is `fail`.
    #[error("{input} not found at path: {}", .path.display())]
    FileNotFound {
        /// The missing input.
        input: InputKind,
        /// The path that was checked.
        path: PathBuf,
    },

    /// The package is not valid gzip, or the tar stream inside it is damaged.
    ///
    /// The offset is relative to the decompressed tar stream for tar errors
    /// and to the compressed file for gzip errors.
    #[error("Corrupt archive at offset {offset:#x}: {reason}")]
    CorruptArchive {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// Entry content is too large for a ustar size field.
    #[error("Entry '{name}' is too large: {size} bytes (maximum {max})")]
    EntryTooLarge {
        /// The entry name.
        name: String,
        /// The content length that was requested.
        size: u64,
        /// The largest representable size.
        max: u64,
    },

    /// An entry name cannot be stored in a ustar header.
    #[error("Invalid entry name '{name}': {reason}")]
    InvalidEntryName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl Error {
    /// Returns `true` for errors caused by caller misconfiguration.
    ///
    /// These are reported immediately and never retried.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPolicy { .. } | Error::InvalidExtension { .. }
        )
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptArchive { .. })
    }

    /// Returns the input this error refers to, if any.
    pub fn input_kind(&self) -> Option<InputKind> {
        match self {
            Error::InvalidPolicy { input, .. }
            | Error::InvalidExtension { input, .. }
            | Error::FileNotFound { input, .. } => Some(*input),
            _ => None,
        }
    }

    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptArchive {
            offset,
            reason: reason.into(),
        }
    }
}

/// A specialized [`Result`] type for package icon operations.
pub type Result<T> = std::result::Result<T, Error>;
