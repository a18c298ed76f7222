//! Scratch directories for a single run.
//!
//! A [`Workspace`] is a uniquely named directory that holds the decompressed
//! tar stream and the staged icon while a package is being edited. It is
//! removed when [`Workspace::release`] is called or, on every other exit
//! path, when the handle is dropped.
//!
//! # Example
//!
//! ```rust,no_run
//! use iconpack::workspace::Workspace;
//!
//! let workspace = Workspace::acquire()?;
//! let tar_path = workspace.path().join("archtemp.tar");
//! // ... stage files ...
//! workspace.release()?;
//! # Ok::<(), iconpack::Error>(())
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::Result;

/// Prefix shared by every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "tmp_unitypackage-icon_";

/// File name of the decompressed tar stream inside a workspace.
pub const TAR_FILE_NAME: &str = "archtemp.tar";

/// File name of the rebuilt tar stream inside a workspace.
pub const EDITED_TAR_FILE_NAME: &str = "archtemp.edited.tar";

/// An exclusively owned scratch directory.
///
/// The directory name is `tmp_unitypackage-icon_` followed by a random
/// suffix, created atomically so concurrent runs never share a workspace.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a workspace in the system temporary directory.
    pub fn acquire() -> Result<Self> {
        Self::acquire_in(std::env::temp_dir())
    }

    /// Creates a workspace inside `parent`.
    ///
    /// `parent` must already exist.
    pub fn acquire_in(parent: impl AsRef<Path>) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent.as_ref())?;
        log::debug!("acquired workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Returns the workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of the decompressed tar stream.
    pub fn tar_path(&self) -> PathBuf {
        self.path().join(TAR_FILE_NAME)
    }

    /// Returns the path of the rebuilt tar stream.
    pub fn edited_tar_path(&self) -> PathBuf {
        self.path().join(EDITED_TAR_FILE_NAME)
    }

    /// Returns the path a staged file with the given name would have.
    pub fn staged_path(&self, file_name: &str) -> PathBuf {
        self.path().join(file_name)
    }

    /// Copies `source` into the workspace under `file_name`.
    ///
    /// Returns the staged path and the number of bytes copied.
    pub fn stage(&self, source: impl AsRef<Path>, file_name: &str) -> Result<(PathBuf, u64)> {
        let target = self.staged_path(file_name);
        let copied = std::fs::copy(source.as_ref(), &target)?;
        log::debug!(
            "staged {} as {} ({} bytes)",
            source.as_ref().display(),
            target.display(),
            copied
        );
        Ok((target, copied))
    }

    /// Deletes the workspace and everything in it.
    ///
    /// Consuming the handle makes a second release impossible; dropping an
    /// unreleased handle performs the same cleanup but swallows errors.
    pub fn release(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        log::debug!("released workspace {}", path.display());
        Ok(())
    }
}
