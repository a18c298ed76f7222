//! Listing the members of a tar stream.
//!
//! A member is the unit the editor deletes: any GNU long-name/long-link or
//! PAX extended headers, the header they describe, its content and padding.
//! PAX global headers belong to no member; they are skipped when listing and
//! copied untouched when rewriting.

use std::io::{self, Read, Seek, SeekFrom};

use super::BLOCK_SIZE;
use super::header::padded_size;
use crate::{Error, Result};

/// One member of a tar stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    /// Full stored name, after applying long-name and PAX overrides.
    pub name: String,
    /// Entry type of the main header.
    pub entry_type: ::tar::EntryType,
    /// Content size in bytes.
    pub size: u64,
    /// Permission bits.
    pub mode: u32,
    /// Modification time in seconds since the epoch.
    pub mtime: u64,
    /// Offset of the first block of the member (its first extension header,
    /// or the main header).
    pub offset: u64,
    /// Offset of the main header block.
    pub header_offset: u64,
    /// Offset of the first content byte.
    pub data_offset: u64,
    /// Length of the whole member in bytes, padding included.
    pub len: u64,
}

impl TarEntry {
    /// Offset one past the last block of the member.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Member list and layout of a tar stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TarIndex {
    entries: Vec<TarEntry>,
    end_offset: u64,
    stream_len: u64,
    has_end_marker: bool,
}

impl TarIndex {
    /// Walks the headers of a tar stream.
    ///
    /// Scanning stops at the first all-zero block; nothing past it is
    /// parsed. A stream that ends cleanly on a header boundary without an
    /// end marker is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptArchive`] for truncated headers or content,
    /// checksum mismatches, malformed numeric fields and malformed extension
    /// headers.
    pub fn scan<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let (spans, failure) = read_spans(&mut *reader)?;

        let mut entries = Vec::new();
        let mut cursor = 0u64;
        for span in spans {
            let mut data_offset = span.data_offset;
            if span.extended_sparse {
                data_offset += sparse_extension_len(reader, data_offset)?;
            }
            let end = padded_size(span.stored_size)
                .and_then(|padded| data_offset.checked_add(padded))
                .filter(|&end| end <= stream_len)
                .ok_or_else(|| {
                    Error::corrupt(
                        cursor,
                        format!(
                            "{} bytes of content run past the end of the archive",
                            span.stored_size
                        ),
                    )
                })?;

            if let Some(listing) = span.listing {
                entries.push(TarEntry {
                    name: listing.name,
                    entry_type: listing.entry_type,
                    size: listing.size,
                    mode: listing.mode,
                    mtime: listing.mtime,
                    offset: cursor,
                    header_offset: span.header_offset,
                    data_offset,
                    len: end - cursor,
                });
            }
            cursor = end;
        }

        if let Some(err) = failure {
            return Err(scan_error(cursor, err));
        }
        Ok(Self::finish(entries, cursor, stream_len, cursor < stream_len))
    }

    fn finish(entries: Vec<TarEntry>, end_offset: u64, stream_len: u64, marker: bool) -> Self {
        log::debug!(
            "indexed {} tar entries, end of entries at {:#x}, stream length {}",
            entries.len(),
            end_offset,
            stream_len
        );
        Self {
            entries,
            end_offset,
            stream_len,
            has_end_marker: marker,
        }
    }

    /// Returns every member in stream order.
    pub fn entries(&self) -> &[TarEntry] {
        &self.entries
    }

    /// Returns member names in stream order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Returns the number of members with exactly this name.
    pub fn count(&self, name: &str) -> usize {
        self.entries.iter().filter(|e| e.name == name).count()
    }

    /// Returns the first member with exactly this name.
    pub fn find(&self, name: &str) -> Option<&TarEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Offset of the end-of-archive marker, or of EOF when there is none.
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// Total length of the stream.
    pub fn stream_len(&self) -> u64 {
        self.stream_len
    }

    /// Returns `true` if the stream has an end-of-archive marker.
    pub fn has_end_marker(&self) -> bool {
        self.has_end_marker
    }

    /// Length of everything from the end marker to EOF.
    pub fn trailer_len(&self) -> u64 {
        self.stream_len - self.end_offset
    }
}

/// Returns the member names of a tar stream in order.
pub fn list_names<R: Read + Seek>(reader: &mut R) -> Result<Vec<String>> {
    Ok(TarIndex::scan(reader)?
        .entries
        .into_iter()
        .map(|e| e.name)
        .collect())
}

/// Where one header and its content sit, before member boundaries are
/// known.
struct Span {
    /// `None` for PAX global headers, which belong to no member.
    listing: Option<Listing>,
    header_offset: u64,
    data_offset: u64,
    stored_size: u64,
    extended_sparse: bool,
}

struct Listing {
    name: String,
    entry_type: ::tar::EntryType,
    size: u64,
    mode: u32,
    mtime: u64,
}

/// Collects the spans the `tar` crate reports, up to its first error.
///
/// Long-name and PAX extension headers are folded into the entry they
/// describe, so each span starts at the end of the previous one.
fn read_spans<R: Read + Seek>(reader: R) -> Result<(Vec<Span>, Option<io::Error>)> {
    let mut archive = ::tar::Archive::new(reader);
    let mut spans = Vec::new();
    for item in archive.entries_with_seek()? {
        match item.and_then(|mut entry| span_of(&mut entry)) {
            Ok(span) => spans.push(span),
            Err(e) => return Ok((spans, Some(e))),
        }
    }
    Ok((spans, None))
}

fn span_of<R: Read>(entry: &mut ::tar::Entry<'_, R>) -> io::Result<Span> {
    let entry_type = entry.header().entry_type();
    let sparse = entry_type.is_gnu_sparse();
    // Sparse entries report their expanded size; the archive holds less.
    let stored_size = if sparse {
        entry.header().entry_size()?
    } else {
        entry.size()
    };
    let extended_sparse = sparse && entry.header().as_gnu().is_some_and(|gnu| gnu.is_extended());

    let listing = if entry_type.is_pax_global_extensions() {
        None
    } else {
        let name = match pax_path(entry)? {
            Some(path) => path,
            None => String::from_utf8_lossy(&entry.path_bytes()).into_owned(),
        };
        let header = entry.header();
        Some(Listing {
            name,
            entry_type,
            size: entry.size(),
            mode: header.mode().unwrap_or(0),
            mtime: header.mtime().unwrap_or(0),
        })
    };

    Ok(Span {
        listing,
        header_offset: entry.raw_header_position(),
        data_offset: entry.raw_file_position(),
        stored_size,
        extended_sparse,
    })
}

/// Returns the last `path` record of the PAX header describing `entry`.
///
/// A PAX path outranks a GNU long name describing the same entry.
fn pax_path<R: Read>(entry: &mut ::tar::Entry<'_, R>) -> io::Result<Option<String>> {
    let Some(extensions) = entry.pax_extensions()? else {
        return Ok(None);
    };
    let mut path = None;
    for extension in extensions {
        let extension = extension?;
        if extension.key_bytes() == b"path" {
            path = Some(String::from_utf8_lossy(extension.value_bytes()).into_owned());
        }
    }
    Ok(path)
}

/// Length of the sparse continuation blocks that start at `start`.
fn sparse_extension_len<R: Read + Seek>(reader: &mut R, start: u64) -> Result<u64> {
    reader.seek(SeekFrom::Start(start))?;
    let mut block = ::tar::GnuExtSparseHeader::new();
    let mut len = 0u64;
    loop {
        reader
            .read_exact(block.as_mut_bytes())
            .map_err(|e| scan_error(start + len, e))?;
        len += BLOCK_SIZE as u64;
        if !block.is_extended() {
            return Ok(len);
        }
    }
}

/// Malformed input surfaces from the `tar` crate as these error kinds.
fn scan_error(offset: u64, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::Other | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            Error::corrupt(offset, err.to_string())
        }
        _ => Error::Io(err),
    }
}
