//! The set-icon pipeline.
//!
//! [`run`] validates both inputs, unpacks the package into a private
//! workspace, replaces the `.icon.png` entry with the given icon and repacks
//! the package in place. Steps run strictly in sequence:
//!
//! 1. "Validating inputs..." (icon first, then package)
//! 2. "Extracting Unity Package..."
//! 3. "Preparing icon..."
//! 4. "Modifying Unity Package..."
//! 5. "Building Unity Package..."
//! 6. "Cleaning up..."
//!
//! The package on disk is only ever replaced by a rename at the end of
//! step 5, so a run that fails anywhere leaves it byte-for-byte unchanged.
//! The workspace is removed on every exit path.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::codec::{ArchiveCodec, GzipCodec, GzipOptions};
use crate::locate::{self, InputKind, Located, SkipReason, ValidatedPath};
use crate::policy::MissingFilePolicy;
use crate::report::{LogReporter, NoReport, Reporter};
use crate::tar::operation::DEFAULT_MODE;
use crate::tar::{EditResult, EntryTime, ICON_ENTRY_NAME, NewEntry, TarEditor, TarEntry};
use crate::workspace::Workspace;
use crate::Result;

/// Inputs and settings for one run.
///
/// # Example
///
/// ```rust
/// use iconpack::{EntryTime, MissingFilePolicy, PipelineOptions};
///
/// let options = PipelineOptions::new("Tool.unitypackage", "icon.png")
///     .icon_missing(MissingFilePolicy::Warn)
///     .compression_level(9)
///     .mtime(EntryTime::Fixed(0));
/// assert_eq!(options.gzip_options().level, 9);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    package: PathBuf,
    icon: PathBuf,
    icon_missing: MissingFilePolicy,
    package_missing: MissingFilePolicy,
    workspace_root: Option<PathBuf>,
    gzip: GzipOptions,
    mtime: EntryTime,
    mode: u32,
}

impl PipelineOptions {
    /// Creates options for setting `icon` on `package`.
    ///
    /// Both missing-file policies default to [`MissingFilePolicy::Fail`].
    pub fn new(package: impl Into<PathBuf>, icon: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            icon: icon.into(),
            icon_missing: MissingFilePolicy::default(),
            package_missing: MissingFilePolicy::default(),
            workspace_root: None,
            gzip: GzipOptions::default(),
            mtime: EntryTime::default(),
            mode: DEFAULT_MODE,
        }
    }

    /// Sets the policy for a missing icon.
    pub fn icon_missing(mut self, policy: MissingFilePolicy) -> Self {
        self.icon_missing = policy;
        self
    }

    /// Sets the policy for a missing package.
    pub fn package_missing(mut self, policy: MissingFilePolicy) -> Self {
        self.package_missing = policy;
        self
    }

    /// Sets both policies from their textual form, icon first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPolicy`](crate::Error::InvalidPolicy) for the
    /// first value that is not `fail`, `warn` or `ignore`.
    pub fn policies_from_strs(self, icon: &str, package: &str) -> Result<Self> {
        let icon = MissingFilePolicy::resolve(InputKind::Icon, icon)?;
        let package = MissingFilePolicy::resolve(InputKind::Package, package)?;
        Ok(self.icon_missing(icon).package_missing(package))
    }

    /// Creates workspaces inside `dir` instead of the system temp directory.
    pub fn workspace_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(dir.into());
        self
    }

    /// Sets the gzip compression level (0-9, clamped).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.gzip.level = level.min(9);
        self
    }

    /// Sets how the modification time of the icon entry is chosen.
    pub fn mtime(mut self, mtime: EntryTime) -> Self {
        self.mtime = mtime;
        self
    }

    /// Sets the permission bits of the icon entry.
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the package path.
    pub fn package(&self) -> &Path {
        &self.package
    }

    /// Returns the icon path.
    pub fn icon(&self) -> &Path {
        &self.icon
    }

    /// Returns the policy for a missing icon.
    pub fn icon_policy(&self) -> MissingFilePolicy {
        self.icon_missing
    }

    /// Returns the policy for a missing package.
    pub fn package_policy(&self) -> MissingFilePolicy {
        self.package_missing
    }

    /// Returns the gzip options [`run`] uses.
    pub fn gzip_options(&self) -> &GzipOptions {
        &self.gzip
    }
}

/// How a run that did not fail ended.
#[must_use]
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The package was rewritten with the new icon.
    Updated(EditResult),
    /// An input was missing and its policy allowed a no-op.
    Skipped(SkipReason),
}

impl Outcome {
    /// Returns `true` if the package was rewritten.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// Returns the edit statistics of an updated package.
    pub fn edit_result(&self) -> Option<&EditResult> {
        match self {
            Self::Updated(result) => Some(result),
            Self::Skipped(_) => None,
        }
    }
}

/// Sets the icon of a package, reporting through the `log` facade.
///
/// Uses the gzip codec configured by [`PipelineOptions::compression_level`].
pub fn run(options: &PipelineOptions) -> Result<Outcome> {
    let codec = GzipCodec::new().with_options(options.gzip.clone());
    run_with(options, &LogReporter, &codec)
}

/// Sets the icon of a package with an explicit reporter and codec.
///
/// A failing run reports its error once through [`Reporter::fatal`] before
/// returning it.
pub fn run_with(
    options: &PipelineOptions,
    reporter: &dyn Reporter,
    codec: &dyn ArchiveCodec,
) -> Result<Outcome> {
    let outcome = execute(options, reporter, codec);
    if let Err(e) = &outcome {
        reporter.fatal(&e.to_string());
    }
    outcome
}

fn execute(
    options: &PipelineOptions,
    reporter: &dyn Reporter,
    codec: &dyn ArchiveCodec,
) -> Result<Outcome> {
    reporter.info("Validating inputs...");
    let icon = match locate::locate_icon(&options.icon, options.icon_missing, reporter)? {
        Located::Found(path) => path,
        Located::Skipped(reason) => return Ok(Outcome::Skipped(reason)),
    };
    let package = match locate::locate_package(
        &options.package,
        options.package_missing,
        reporter,
    )? {
        Located::Found(path) => path,
        Located::Skipped(reason) => return Ok(Outcome::Skipped(reason)),
    };

    let workspace = acquire_workspace(options.workspace_root.as_deref())?;
    let result = edit_package(options, &icon, &package, &workspace, reporter, codec)?;

    reporter.info("Cleaning up...");
    let workspace_path = workspace.path().to_path_buf();
    if let Err(e) = workspace.release() {
        // The package is already replaced; a leftover directory is not a failure.
        reporter.warning(&format!(
            "Could not remove workspace {}: {}",
            workspace_path.display(),
            e
        ));
    }

    Ok(Outcome::Updated(result))
}

fn edit_package(
    options: &PipelineOptions,
    icon: &ValidatedPath,
    package: &ValidatedPath,
    workspace: &Workspace,
    reporter: &dyn Reporter,
    codec: &dyn ArchiveCodec,
) -> Result<EditResult> {
    reporter.info("Extracting Unity Package...");
    let tar_path = workspace.tar_path();
    codec.decompress(package.path(), &tar_path)?;

    reporter.info("Preparing icon...");
    let (staged, _) = workspace.stage(icon.path(), ICON_ENTRY_NAME)?;

    reporter.info("Modifying Unity Package...");
    let mut editor = TarEditor::open_path(&tar_path)?;
    let existing = editor.count(ICON_ENTRY_NAME);
    if existing > 0 {
        reporter.warning("Found existing icon file, overwriting...");
    }
    if existing > 1 {
        reporter.warning(&format!(
            "Found {} {} entries, removing all of them...",
            existing, ICON_ENTRY_NAME
        ));
    }
    while editor.delete_first(ICON_ENTRY_NAME).is_some() {}
    editor.append(
        NewEntry::from_file(ICON_ENTRY_NAME, staged)
            .mode(options.mode)
            .mtime(options.mtime),
    )?;

    reporter.info("Building Unity Package...");
    let edited_path = workspace.edited_tar_path();
    let mut output = BufWriter::new(File::create(&edited_path)?);
    let mut result = editor.apply(&mut output)?;
    output.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    result.packed_bytes = codec.recompress(&edited_path, package.path())?;
    log::debug!(
        "{}: {} entries, {} tar bytes, {} packed bytes",
        package.path().display(),
        result.total_entries(),
        result.total_bytes,
        result.packed_bytes
    );
    Ok(result)
}

fn acquire_workspace(root: Option<&Path>) -> Result<Workspace> {
    match root {
        Some(root) => Workspace::acquire_in(root),
        None => Workspace::acquire(),
    }
}

/// Lists the member names of a package without modifying it.
///
/// The package is unpacked into a temporary workspace that is removed
/// before returning.
pub fn list_package(
    package: impl AsRef<Path>,
    codec: &dyn ArchiveCodec,
) -> Result<Vec<TarEntry>> {
    list_package_in(package, codec, None)
}

/// Like [`list_package`], with the workspace created inside `workspace_root`.
pub fn list_package_in(
    package: impl AsRef<Path>,
    codec: &dyn ArchiveCodec,
    workspace_root: Option<&Path>,
) -> Result<Vec<TarEntry>> {
    let package = match locate::locate_package(package, MissingFilePolicy::Fail, &NoReport)? {
        Located::Found(path) => path,
        Located::Skipped(reason) => {
            return Err(crate::Error::FileNotFound {
                input: reason.input,
                path: reason.path,
            });
        }
    };

    let workspace = acquire_workspace(workspace_root)?;
    let tar_path = workspace.tar_path();
    codec.decompress(package.path(), &tar_path)?;
    let entries = TarEditor::open_path(&tar_path)?.entries().cloned().collect();
    workspace.release()?;
    Ok(entries)
}
