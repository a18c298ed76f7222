//! Entries queued for appending to a tar stream.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use filetime::FileTime;

use crate::Result;

/// Permission bits given to appended entries unless overridden.
pub const DEFAULT_MODE: u32 = 0o644;

/// Where the modification time of an appended entry comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryTime {
    /// The time the entry is queued.
    #[default]
    Now,
    /// The modification time of the source file (falls back to now for
    /// in-memory sources).
    Source,
    /// A fixed number of seconds since the epoch, for reproducible output.
    Fixed(u64),
}

impl EntryTime {
    /// Resolves to seconds since the epoch.
    pub fn resolve(&self, source: &EntrySource) -> Result<u64> {
        match (self, source) {
            (Self::Fixed(secs), _) => Ok(*secs),
            (Self::Source, EntrySource::File(path)) => file_mtime(path),
            (Self::Now, _) | (Self::Source, EntrySource::Bytes(_)) => Ok(now()),
        }
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn file_mtime(path: &Path) -> Result<u64> {
    let meta = std::fs::metadata(path)?;
    let secs = FileTime::from_last_modification_time(&meta).unix_seconds();
    Ok(u64::try_from(secs).unwrap_or(0))
}

/// Content of an appended entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    /// Streamed from a file when the edit is applied.
    File(PathBuf),
    /// Held in memory.
    Bytes(Vec<u8>),
}

impl EntrySource {
    /// Returns the content length.
    pub fn content_len(&self) -> Result<u64> {
        match self {
            Self::File(path) => Ok(std::fs::metadata(path)?.len()),
            Self::Bytes(data) => Ok(data.len() as u64),
        }
    }
}

/// A regular file to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub(crate) name: String,
    pub(crate) source: EntrySource,
    pub(crate) mode: u32,
    pub(crate) mtime: EntryTime,
}

impl NewEntry {
    /// An entry whose content is read from `path`.
    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name.into(), EntrySource::File(path.into()))
    }

    /// An entry with in-memory content.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(name.into(), EntrySource::Bytes(data.into()))
    }

    fn new(name: String, source: EntrySource) -> Self {
        Self {
            name,
            source,
            mode: DEFAULT_MODE,
            mtime: EntryTime::default(),
        }
    }

    /// Sets the permission bits.
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the modification time.
    pub fn mtime(mut self, mtime: EntryTime) -> Self {
        self.mtime = mtime;
        self
    }

    /// Returns the entry name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A regular file waiting to be written, with its header fields fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedAppend {
    pub(crate) name: String,
    pub(crate) source: EntrySource,
    /// Content length, fixed when the entry is queued.
    pub(crate) size: u64,
    pub(crate) mode: u32,
    /// Seconds since the epoch.
    pub(crate) mtime: u64,
}
