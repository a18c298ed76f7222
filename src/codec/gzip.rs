//! Gzip codec implementation.

use std::io::{self, BufRead, Read, Write};

use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};

/// Gzip decoder.
///
/// Concatenated gzip members are decoded back to back, the same way
/// `gzip -d` treats them.
pub struct GzipDecoder<R> {
    inner: MultiGzDecoder<R>,
    produced: u64,
}

impl<R> std::fmt::Debug for GzipDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipDecoder")
            .field("produced", &self.produced)
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> GzipDecoder<R> {
    /// Creates a new Gzip decoder.
    ///
    /// # Arguments
    ///
    /// * `input` - The compressed data source (must implement BufRead)
    pub fn new(input: R) -> Self {
        Self {
            inner: MultiGzDecoder::new(input),
            produced: 0,
        }
    }

    /// Returns the number of decompressed bytes produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl<R: BufRead> Read for GzipDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.produced += n as u64;
        Ok(n)
    }
}

/// Gzip encoder options.
#[derive(Debug, Clone)]
pub struct GzipOptions {
    /// Compression level (0-9, default 6).
    pub level: u32,
    /// Modification time stored in the gzip header (default 0).
    pub mtime: u32,
}

impl Default for GzipOptions {
    fn default() -> Self {
        Self { level: 6, mtime: 0 }
    }
}

impl GzipOptions {
    /// Creates options with the given compression level.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
            ..Self::default()
        }
    }
}

/// Gzip encoder.
pub struct GzipEncoder<W: Write> {
    inner: GzEncoder<W>,
}

impl<W: Write> std::fmt::Debug for GzipEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> GzipEncoder<W> {
    /// Creates a new Gzip encoder.
    ///
    /// # Arguments
    ///
    /// * `output` - The destination for compressed data
    /// * `options` - Encoder options
    pub fn new(output: W, options: &GzipOptions) -> Self {
        Self {
            inner: GzBuilder::new()
                .mtime(options.mtime)
                .write(output, Compression::new(options.level.min(9))),
        }
    }

    /// Finishes encoding, writes the gzip trailer and returns the writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for GzipEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Returns `true` if a decoder error means the compressed data is bad
/// rather than the underlying reader failing.
pub fn is_format_error(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
    )
}
