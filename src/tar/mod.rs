//! Tar stream listing and editing.
//!
//! A package is a tar stream whose members are addressed by their exact
//! stored names. This module lists those names, deletes members and appends
//! regular files while leaving every other byte of the stream alone.
//! Headers are decoded and encoded by the `tar` crate; the editor itself
//! only moves byte ranges.
//!
//! - [`header`]: ustar headers for appended entries
//! - [`index`]: member listing
//! - [`operation`]: queued modifications
//! - [`editor`]: applying modifications to produce a new stream

pub mod editor;
pub mod header;
pub mod index;
pub mod operation;

pub use editor::{AppendedEntry, EditResult, TarEditor};
pub use ::tar::EntryType;
pub use header::MAX_ENTRY_SIZE;
pub use index::{TarEntry, TarIndex, list_names};
pub use operation::{EntrySource, EntryTime, NewEntry};

/// Size of a tar block in bytes.
pub const BLOCK_SIZE: usize = 512;

/// Reserved root-level name of a package's thumbnail.
pub const ICON_ENTRY_NAME: &str = ".icon.png";
