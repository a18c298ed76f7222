//! Package compression codec.
//!
//! A package is a tar stream wrapped in gzip. This module moves data between
//! the compressed package on disk and an uncompressed tar file in a
//! workspace. Every function takes explicit paths; nothing depends on the
//! process working directory.
//!
//! [`recompress`] never writes the destination in place. The compressed
//! stream goes to a temporary file next to the destination, is flushed to
//! stable storage, and is then renamed over the destination. A failure at any
//! point before the rename leaves the destination untouched.

pub mod gzip;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::{Error, Result};

pub use gzip::{GzipDecoder, GzipEncoder, GzipOptions};

/// Buffer size for streaming copies (64 KiB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Moves a package between its compressed and uncompressed forms.
///
/// The pipeline only talks to the codec through this trait, which keeps the
/// compression format replaceable and lets tests inject failures.
pub trait ArchiveCodec {
    /// Decompresses `archive` into a new file at `dest_tar`.
    ///
    /// Returns the number of uncompressed bytes written.
    fn decompress(&self, archive: &Path, dest_tar: &Path) -> Result<u64>;

    /// Compresses `src_tar` and atomically replaces `dest_archive` with it.
    ///
    /// Returns the size of the compressed file.
    fn recompress(&self, src_tar: &Path, dest_archive: &Path) -> Result<u64>;
}

impl<T: ArchiveCodec + ?Sized> ArchiveCodec for &T {
    fn decompress(&self, archive: &Path, dest_tar: &Path) -> Result<u64> {
        (**self).decompress(archive, dest_tar)
    }

    fn recompress(&self, src_tar: &Path, dest_archive: &Path) -> Result<u64> {
        (**self).recompress(src_tar, dest_archive)
    }
}

/// The gzip codec used by `.unitypackage` files.
#[derive(Debug, Clone, Default)]
pub struct GzipCodec {
    options: GzipOptions,
}

impl GzipCodec {
    /// Creates a codec with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encoder options used by [`ArchiveCodec::recompress`].
    pub fn with_options(mut self, options: GzipOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the encoder options.
    pub fn options(&self) -> &GzipOptions {
        &self.options
    }
}

impl ArchiveCodec for GzipCodec {
    fn decompress(&self, archive: &Path, dest_tar: &Path) -> Result<u64> {
        decompress(archive, dest_tar)
    }

    fn recompress(&self, src_tar: &Path, dest_archive: &Path) -> Result<u64> {
        recompress(src_tar, dest_archive, &self.options)
    }
}

/// Streams the gzip-decompressed content of `archive_path` into `dest_tar_path`.
///
/// # Errors
///
/// Returns [`Error::CorruptArchive`] if the input is empty, not gzip, or
/// truncated. The offset is the number of decompressed bytes produced before
/// the failure.
pub fn decompress(archive_path: &Path, dest_tar_path: &Path) -> Result<u64> {
    let file = File::open(archive_path)?;
    if file.metadata()?.len() == 0 {
        return Err(Error::corrupt(0, "empty file is not a gzip stream"));
    }

    let mut decoder = GzipDecoder::new(BufReader::new(file));
    let mut output = BufWriter::new(File::create(dest_tar_path)?);
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];

    loop {
        let n = match decoder.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if gzip::is_format_error(&e) => {
                return Err(Error::corrupt(
                    decoder.produced(),
                    format!("invalid gzip stream: {}", e),
                ));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        output.write_all(&buf[..n])?;
    }
    output.flush()?;

    log::debug!(
        "decompressed {} into {} ({} bytes)",
        archive_path.display(),
        dest_tar_path.display(),
        decoder.produced()
    );
    Ok(decoder.produced())
}

/// Streams the gzip-compressed content of `src_tar_path` over `dest_archive_path`.
///
/// The compressed stream is written to a temporary file in the destination's
/// directory, synced, given the destination's permissions (when it already
/// exists) and renamed into place.
pub fn recompress(
    src_tar_path: &Path,
    dest_archive_path: &Path,
    options: &GzipOptions,
) -> Result<u64> {
    let parent = match dest_archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".iconpack-")
        .suffix(".tmp")
        .tempfile_in(parent)?;

    {
        let mut input = BufReader::with_capacity(COPY_BUFFER_SIZE, File::open(src_tar_path)?);
        let writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, temp.as_file_mut());
        let mut encoder = GzipEncoder::new(writer, options);
        io::copy(&mut input, &mut encoder)?;
        let mut writer = encoder.try_finish()?;
        writer.flush()?;
    }

    let file = temp.as_file();
    if let Ok(meta) = std::fs::metadata(dest_archive_path) {
        file.set_permissions(meta.permissions())?;
    }
    file.sync_all()?;
    let compressed_size = file.metadata()?.len();

    temp.persist(dest_archive_path)
        .map_err(|e| Error::Io(e.error))?;
    sync_dir(parent);

    log::debug!(
        "recompressed {} into {} ({} bytes)",
        src_tar_path.display(),
        dest_archive_path.display(),
        compressed_size
    );
    Ok(compressed_size)
}

/// Flushes a directory entry after a rename. Best effort: not every platform
/// can open a directory for syncing.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Ok(handle) = File::open(dir) {
        if let Err(e) = handle.sync_all() {
            log::debug!("could not sync directory {}: {}", dir.display(), e);
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}
