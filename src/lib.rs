//! # iconpack
//!
//! Set the thumbnail of a `.unitypackage`.
//!
//! A Unity package is a gzip-compressed tar archive. Unity shows the entry
//! named `.icon.png` at the archive root as the package thumbnail. This crate
//! replaces that entry with a PNG of your choosing, rewriting the package in
//! place while every other entry keeps its exact bytes and position.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iconpack::{Outcome, PipelineOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let options = PipelineOptions::new("Tool.unitypackage", "icon.png");
//!     match iconpack::run(&options)? {
//!         Outcome::Updated(result) => {
//!             println!("{} entries, icon CRC {:08x}",
//!                 result.total_entries(),
//!                 result.appended[0].crc32);
//!         }
//!         Outcome::Skipped(reason) => println!("skipped: {}", reason),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Missing Inputs
//!
//! Each input has a [`MissingFilePolicy`]. `fail` (the default) aborts with
//! [`Error::FileNotFound`]; `warn` and `ignore` end the run successfully with
//! [`Outcome::Skipped`] and leave everything untouched:
//!
//! ```rust,no_run
//! use iconpack::{MissingFilePolicy, PipelineOptions};
//!
//! let options = PipelineOptions::new("Tool.unitypackage", "icon.png")
//!     .icon_missing(MissingFilePolicy::Warn);
//! let outcome = iconpack::run(&options)?;
//! # Ok::<(), iconpack::Error>(())
//! ```
//!
//! ## Reporting
//!
//! [`run`] reports step progress through the [`log`] facade. Use
//! [`run_with`] to route messages to your own [`Reporter`] or to swap the
//! [`ArchiveCodec`]:
//!
//! ```rust,no_run
//! use iconpack::{GzipCodec, MemoryReporter, PipelineOptions, Severity};
//!
//! let reporter = MemoryReporter::new();
//! let options = PipelineOptions::new("Tool.unitypackage", "icon.png");
//! let _ = iconpack::run_with(&options, &reporter, &GzipCodec::new());
//! for message in reporter.messages_with(Severity::Warning) {
//!     eprintln!("warning: {}", message);
//! }
//! ```
//!
//! ## Editing Tar Streams Directly
//!
//! The [`tar`] module works on plain tar streams and can be used on its own:
//!
//! ```rust,no_run
//! use iconpack::tar::{NewEntry, TarEditor};
//!
//! let mut editor = TarEditor::open_path("archive.tar")?;
//! editor.delete_first("old.txt");
//! editor.append(NewEntry::from_bytes("new.txt", b"hello".to_vec()))?;
//! let result = editor.apply(std::fs::File::create("edited.tar")?)?;
//! # Ok::<(), iconpack::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Command-line interface tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod codec;
pub mod error;
pub mod locate;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod tar;
pub mod workspace;

pub use crate::codec::{ArchiveCodec, GzipCodec, GzipOptions};
pub use crate::error::{Error, Result};
pub use crate::locate::{InputKind, Located, SkipReason, ValidatedPath};
pub use crate::pipeline::{Outcome, PipelineOptions, list_package, run, run_with};
pub use crate::policy::MissingFilePolicy;
pub use crate::report::{LogReporter, MemoryReporter, NoReport, Reporter, Severity};
pub use crate::tar::{EditResult, EntryTime, ICON_ENTRY_NAME, NewEntry, TarEditor, TarEntry};
pub use crate::workspace::Workspace;
