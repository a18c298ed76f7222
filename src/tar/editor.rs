//! Tar editor for modifying existing tar streams.
//!
//! The source stream is never parsed twice or rewritten entry by entry.
//! Kept members are copied as raw byte ranges, so their headers, content
//! and padding come out exactly as they went in.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::BLOCK_SIZE;
use super::header::{padded_size, regular_file};
use super::index::{TarEntry, TarIndex};
use super::operation::{EntrySource, NewEntry, QueuedAppend};
use crate::{Error, Result};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Two zero blocks close a tar stream.
const END_MARKER_LEN: u64 = 2 * BLOCK_SIZE as u64;

/// A regular file written by [`TarEditor::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedEntry {
    /// Entry name.
    pub name: String,
    /// Content size in bytes.
    pub size: u64,
    /// CRC-32 of the content.
    pub crc32: u32,
}

/// Result of an edit operation.
#[must_use = "edit result should be checked to verify operation completed as expected"]
#[derive(Debug, Clone, Default)]
pub struct EditResult {
    /// Number of members that were copied unchanged.
    pub entries_kept: usize,
    /// Number of members that were deleted.
    pub entries_deleted: usize,
    /// Number of new entries appended.
    pub entries_added: usize,
    /// The appended entries, in write order.
    pub appended: Vec<AppendedEntry>,
    /// Total bytes in the new tar stream.
    pub total_bytes: u64,
    /// Size of the compressed package, when the stream was repacked.
    pub packed_bytes: u64,
}

impl EditResult {
    /// Returns the total number of members in the resulting stream.
    pub fn total_entries(&self) -> usize {
        self.entries_kept + self.entries_added
    }

    /// Returns the compression ratio (packed / total).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.packed_bytes as f64 / self.total_bytes as f64
        }
    }
}

/// An editor for tar streams.
///
/// Members are indexed when the editor is opened. Deletions mark members of
/// that index and appends are queued; both only take effect when
/// [`apply`](Self::apply) writes the new stream. The source is never
/// modified.
///
/// # Example
///
/// ```rust,no_run
/// use iconpack::tar::{NewEntry, TarEditor};
///
/// let mut editor = TarEditor::open_path("archtemp.tar")?;
/// while editor.delete_first(".icon.png").is_some() {}
/// editor.append(NewEntry::from_file(".icon.png", "staged/.icon.png"))?;
///
/// let output = std::fs::File::create("archtemp.edited.tar")?;
/// let result = editor.apply(output)?;
/// println!("kept {} entries, added {}", result.entries_kept, result.entries_added);
/// # Ok::<(), iconpack::Error>(())
/// ```
pub struct TarEditor<R: Read + Seek> {
    reader: R,
    index: TarIndex,
    deleted: Vec<bool>,
    appends: Vec<QueuedAppend>,
}

impl<R: Read + Seek> std::fmt::Debug for TarEditor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarEditor")
            .field("entries", &self.index.entries().len())
            .field("deleted", &self.deleted.iter().filter(|gone| **gone).count())
            .field("appends", &self.appends)
            .finish_non_exhaustive()
    }
}

impl TarEditor<BufReader<File>> {
    /// Opens and indexes the tar file at `path`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::with_capacity(COPY_BUFFER_SIZE, file))
    }
}

impl<R: Read + Seek> TarEditor<R> {
    /// Indexes the tar stream in `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptArchive`] if the stream cannot be walked.
    pub fn open(mut reader: R) -> Result<Self> {
        let index = TarIndex::scan(&mut reader)?;
        let deleted = vec![false; index.entries().len()];
        Ok(Self {
            reader,
            index,
            deleted,
            appends: Vec::new(),
        })
    }

    /// Returns the index of the source stream.
    pub fn index(&self) -> &TarIndex {
        &self.index
    }

    /// Returns the members that will be kept, in stream order.
    pub fn entries(&self) -> impl Iterator<Item = &TarEntry> {
        self.index
            .entries()
            .iter()
            .zip(&self.deleted)
            .filter(|(_, gone)| !**gone)
            .map(|(entry, _)| entry)
    }

    /// Returns the names of the members that will be kept.
    pub fn names(&self) -> Vec<&str> {
        self.entries().map(|e| e.name.as_str()).collect()
    }

    /// Returns how many kept members have exactly this name.
    pub fn count(&self, name: &str) -> usize {
        self.entries().filter(|e| e.name == name).count()
    }

    /// Returns `true` if a kept member has exactly this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries().any(|e| e.name == name)
    }

    /// Returns whether any deletion or append is queued.
    pub fn has_pending_operations(&self) -> bool {
        !self.appends.is_empty() || self.deleted.contains(&true)
    }

    /// Queues deletion of the first kept member named `name`.
    ///
    /// Only one member is removed per call; later members with the same
    /// name stay. Returns the removed member, or `None` if there was none.
    pub fn delete_first(&mut self, name: &str) -> Option<&TarEntry> {
        let position = self
            .index
            .entries()
            .iter()
            .zip(&self.deleted)
            .position(|(entry, gone)| !*gone && entry.name == name)?;
        self.deleted[position] = true;

        let entry = &self.index.entries()[position];
        log::debug!("queued delete of {:?} at {:#x}", entry.name, entry.offset);
        Some(entry)
    }

    /// Queues a new regular file to be written after the kept members.
    ///
    /// The header is validated now: the content length and modification time
    /// are fixed when the entry is queued.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryTooLarge`] if the content does not fit a ustar header
    /// - [`Error::InvalidEntryName`] if the name cannot be encoded
    /// - [`Error::Io`] if a file source cannot be read
    pub fn append(&mut self, entry: NewEntry) -> Result<()> {
        let size = entry.source.content_len()?;
        let mtime = entry.mtime.resolve(&entry.source)?;
        regular_file(&entry.name, size, entry.mode, mtime)?;

        log::debug!("queued append of {:?} ({} bytes)", entry.name, size);
        self.appends.push(QueuedAppend {
            name: entry.name,
            source: entry.source,
            size,
            mode: entry.mode,
            mtime,
        });
        Ok(())
    }

    /// Writes the edited stream to `output`.
    ///
    /// The output is, in order: every byte of the source before its end
    /// marker except the deleted members, the appended entries, and then the
    /// source's end marker and trailing padding unchanged. A source without an
    /// end marker, or whose marker is shorter than two blocks, gets two fresh
    /// zero blocks instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptArchive`] if the source changed since it was
    /// indexed, or [`Error::Io`] for read and write failures.
    pub fn apply<W: Write>(self, mut output: W) -> Result<EditResult> {
        let Self {
            mut reader,
            index,
            deleted,
            appends,
        } = self;

        let mut result = EditResult::default();
        let mut cursor = 0u64;
        for (entry, gone) in index.entries().iter().zip(&deleted) {
            if *gone {
                result.total_bytes +=
                    copy_range(&mut reader, &mut output, cursor, entry.offset - cursor)?;
                cursor = entry.end();
                result.entries_deleted += 1;
            } else {
                result.entries_kept += 1;
            }
        }
        result.total_bytes += copy_range(
            &mut reader,
            &mut output,
            cursor,
            index.end_offset() - cursor,
        )?;

        for QueuedAppend {
            name,
            source,
            size,
            mode,
            mtime,
        } in appends
        {
            let header = regular_file(&name, size, mode, mtime)?;
            output.write_all(header.as_bytes())?;
            let crc32 = write_content(&source, size, &mut output)?;
            let padded = padded_size(size).unwrap_or(size);
            write_zeros(&mut output, padded - size)?;

            result.total_bytes += BLOCK_SIZE as u64 + padded;
            result.appended.push(AppendedEntry { name, size, crc32 });
        }
        result.entries_added = result.appended.len();

        if index.has_end_marker() && index.trailer_len() >= END_MARKER_LEN {
            result.total_bytes += copy_range(
                &mut reader,
                &mut output,
                index.end_offset(),
                index.trailer_len(),
            )?;
        } else {
            write_zeros(&mut output, END_MARKER_LEN)?;
            result.total_bytes += END_MARKER_LEN;
        }
        output.flush()?;

        log::debug!(
            "rewrote tar stream: {} kept, {} deleted, {} added, {} bytes",
            result.entries_kept,
            result.entries_deleted,
            result.entries_added,
            result.total_bytes
        );
        Ok(result)
    }
}

/// Copies `len` bytes starting at `start` from the source stream.
fn copy_range<R: Read + Seek, W: Write>(
    reader: &mut R,
    output: &mut W,
    start: u64,
    len: u64,
) -> Result<u64> {
    if len == 0 {
        return Ok(0);
    }
    reader.seek(SeekFrom::Start(start))?;
    let copied = io::copy(&mut reader.by_ref().take(len), output)?;
    if copied < len {
        return Err(Error::corrupt(
            start + copied,
            "tar stream shrank while it was being rewritten",
        ));
    }
    Ok(copied)
}

/// Writes exactly `size` content bytes and returns their CRC-32.
fn write_content<W: Write>(source: &EntrySource, size: u64, output: &mut W) -> Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    match source {
        EntrySource::Bytes(data) => {
            hasher.update(data);
            output.write_all(data)?;
        }
        EntrySource::File(path) => {
            let mut input = File::open(path)?.take(size);
            let mut buf = vec![0u8; COPY_BUFFER_SIZE];
            let mut written = 0u64;
            loop {
                let n = match input.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(Error::Io(e)),
                };
                hasher.update(&buf[..n]);
                output.write_all(&buf[..n])?;
                written += n as u64;
            }
            if written != size {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "{} shrank from {} to {} bytes while being archived",
                        path.display(),
                        size,
                        written
                    ),
                )));
            }
        }
    }
    Ok(hasher.finalize())
}

fn write_zeros<W: Write>(output: &mut W, len: u64) -> io::Result<()> {
    io::copy(&mut io::repeat(0).take(len), output).map(|_| ())
}
