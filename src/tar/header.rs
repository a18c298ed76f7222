//! Headers for appended entries.
//!
//! Appended entries always get a plain ustar header, so any reader that
//! understands ustar sees the full name without extension records.

use std::path::Path;

use super::BLOCK_SIZE;
use crate::{Error, Result};

/// Largest content size an 11-digit octal size field can hold (8 GiB - 1).
pub const MAX_ENTRY_SIZE: u64 = 0o777_7777_7777;

/// Builds the ustar header of a regular file.
///
/// # Errors
///
/// - [`Error::EntryTooLarge`] if `size` does not fit the octal size field
/// - [`Error::InvalidEntryName`] if `name` cannot be stored in the `prefix`
///   and `name` fields exactly as given
pub fn regular_file(name: &str, size: u64, mode: u32, mtime: u64) -> Result<::tar::Header> {
    if size > MAX_ENTRY_SIZE {
        return Err(Error::EntryTooLarge {
            name: name.to_string(),
            size,
            max: MAX_ENTRY_SIZE,
        });
    }

    let mut header = ::tar::Header::new_ustar();
    header
        .set_path(Path::new(name))
        .map_err(|e| Error::InvalidEntryName {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    // The setter normalizes separators and `.` components.
    if header.path_bytes().as_ref() != name.as_bytes() {
        return Err(Error::InvalidEntryName {
            name: name.to_string(),
            reason: "name would not be stored verbatim".to_string(),
        });
    }
    header.set_size(size);
    header.set_mode(mode & 0o7777);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(mtime.min(MAX_ENTRY_SIZE));
    header.set_entry_type(::tar::EntryType::Regular);
    header.set_cksum();
    Ok(header)
}

/// Rounds `size` up to a whole number of blocks.
pub fn padded_size(size: u64) -> Option<u64> {
    let block = BLOCK_SIZE as u64;
    size.checked_add(block - 1).map(|s| s / block * block)
}
