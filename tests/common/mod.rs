//! Shared test utilities for integration tests.
//!
//! Packages are built with the `tar` crate and read back with it too, so
//! the library under test is always checked against an independent tar
//! implementation.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use iconpack::{ArchiveCodec, Error, GzipCodec};

/// A minimal PNG: signature, IHDR and IEND chunks of a 1x1 image.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// A second, different PNG payload.
pub fn other_png() -> Vec<u8> {
    let mut png = PNG_BYTES.to_vec();
    png.extend_from_slice(&[0xAB; 600]);
    png
}

/// Entries laid out the way Unity exports an asset: one directory per GUID.
pub fn unity_entries() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("0a1b2c3d4e5f60718293a4b5c6d7e8f9/asset", b"%YAML 1.1\nMonoBehaviour: {}\n".to_vec()),
        ("0a1b2c3d4e5f60718293a4b5c6d7e8f9/asset.meta", b"fileFormatVersion: 2\n".to_vec()),
        ("0a1b2c3d4e5f60718293a4b5c6d7e8f9/pathname", b"Assets/Tool/Tool.asset".to_vec()),
        ("ffeeddccbbaa99887766554433221100/asset", vec![0x5a; 1500]),
        ("ffeeddccbbaa99887766554433221100/pathname", b"Assets/Tool/Big.bytes".to_vec()),
    ]
}

/// Builds an uncompressed tar stream with the `tar` crate.
///
/// Duplicate names are written as given.
pub fn create_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_ustar();
        header.set_path(name).expect("valid tar path");
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_600_000_000);
        header.set_cksum();
        builder.append(&header, *data).expect("append to tar");
    }
    builder.into_inner().expect("finish tar")
}

/// Gzip-compresses `data`.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Decompresses a gzip byte stream.
pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .expect("gunzip");
    out
}

/// Writes a `.unitypackage` with the given entries into `dir`.
pub fn create_package(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, gzip(&create_tar(entries))).expect("write package");
    path
}

/// Writes a `.unitypackage` made of [`unity_entries`].
pub fn create_unity_package(dir: &Path) -> PathBuf {
    let entries = unity_entries();
    let refs: Vec<(&str, &[u8])> = entries.iter().map(|(n, d)| (*n, d.as_slice())).collect();
    create_package(dir, "Tool.unitypackage", &refs)
}

/// Writes an icon file into `dir`.
pub fn create_icon(dir: &Path, file_name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, data).expect("write icon");
    path
}

/// Reads every entry of a package with the `tar` crate, in stream order.
pub fn read_package(path: &Path) -> Vec<(String, Vec<u8>)> {
    let compressed = std::fs::read(path).expect("read package");
    read_tar(&gunzip(&compressed))
}

/// Reads every entry of an uncompressed tar stream with the `tar` crate.
pub fn read_tar(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = tar::Archive::new(data);
    let mut entries = Vec::new();
    for entry in archive.entries().expect("tar entries") {
        let mut entry = entry.expect("tar entry");
        let name = entry
            .path()
            .expect("tar entry path")
            .to_string_lossy()
            .into_owned();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).expect("tar entry content");
        entries.push((name, content));
    }
    entries
}

/// Returns the entry names of a package, in stream order.
pub fn package_names(path: &Path) -> Vec<String> {
    read_package(path).into_iter().map(|(name, _)| name).collect()
}

/// Lists the scratch directories left in `dir`.
pub fn leftover_workspaces(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("read workspace root")
        .map(|e| e.expect("dir entry").path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(iconpack::workspace::WORKSPACE_PREFIX))
        })
        .collect()
}

/// Where [`FailingCodec`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Decompress,
    Recompress,
}

/// A gzip codec that fails at a chosen step, simulating a full disk.
#[derive(Debug)]
pub struct FailingCodec {
    pub at: FailAt,
    inner: GzipCodec,
}

impl FailingCodec {
    pub fn new(at: FailAt) -> Self {
        Self {
            at,
            inner: GzipCodec::new(),
        }
    }

    fn disk_full() -> Error {
        Error::Io(std::io::Error::other("No space left on device"))
    }
}

impl ArchiveCodec for FailingCodec {
    fn decompress(&self, archive: &Path, dest_tar: &Path) -> iconpack::Result<u64> {
        if self.at == FailAt::Decompress {
            return Err(Self::disk_full());
        }
        self.inner.decompress(archive, dest_tar)
    }

    fn recompress(&self, src_tar: &Path, dest_archive: &Path) -> iconpack::Result<u64> {
        if self.at == FailAt::Recompress {
            return Err(Self::disk_full());
        }
        self.inner.recompress(src_tar, dest_archive)
    }
}
