//! Input validation.
//!
//! Both inputs go through the same two checks, in order:
//!
//! 1. The path must end with the input's literal extension (case-sensitive).
//!    A wrong extension is always fatal.
//! 2. The path must exist. A missing file is handled by the input's
//!    [`MissingFilePolicy`]: `fail` aborts the run, `warn` and `ignore`
//!    end it successfully without touching anything.
//!
//! Errors are returned, not reported; the caller decides how to surface them.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::policy::MissingFilePolicy;
use crate::report::Reporter;
use crate::{Error, Result};

/// Extension required for the icon file.
pub const ICON_EXTENSION: &str = ".png";

/// Extension required for the package file.
pub const PACKAGE_EXTENSION: &str = ".unitypackage";

/// The two files a run consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// The PNG thumbnail.
    Icon,
    /// The gzip-compressed tar package.
    Package,
}

impl InputKind {
    /// Returns the literal extension this input must carry.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Icon => ICON_EXTENSION,
            Self::Package => PACKAGE_EXTENSION,
        }
    }

    /// Returns the lowercase noun used mid-sentence.
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::Package => "Unity Package",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Icon => write!(f, "Icon"),
            Self::Package => write!(f, "Unity Package"),
        }
    }
}

/// A path that passed extension and existence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    kind: InputKind,
    path: PathBuf,
}

impl ValidatedPath {
    /// Returns the input this path was validated for.
    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// Returns the validated path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consumes the wrapper and returns the path.
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Why a run finished without modifying the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReason {
    /// The input that was missing.
    pub input: InputKind,
    /// The path that was checked.
    pub path: PathBuf,
    /// The policy that downgraded the missing file.
    pub policy: MissingFilePolicy,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not found at path: {}", self.input, self.path.display())
    }
}

/// Result of locating one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// The file exists and has the right extension.
    Found(ValidatedPath),
    /// The file is missing and the policy allows carrying on without it.
    Skipped(SkipReason),
}

/// Locates the icon file.
pub fn locate_icon(
    path: impl AsRef<Path>,
    policy: MissingFilePolicy,
    reporter: &dyn Reporter,
) -> Result<Located> {
    locate(InputKind::Icon, path.as_ref(), policy, reporter)
}

/// Locates the package file.
pub fn locate_package(
    path: impl AsRef<Path>,
    policy: MissingFilePolicy,
    reporter: &dyn Reporter,
) -> Result<Located> {
    locate(InputKind::Package, path.as_ref(), policy, reporter)
}

/// Validates one input path against its extension and policy.
pub fn locate(
    kind: InputKind,
    path: &Path,
    policy: MissingFilePolicy,
    reporter: &dyn Reporter,
) -> Result<Located> {
    let expected = kind.extension();
    if !has_extension(path, expected) {
        return Err(Error::InvalidExtension {
            input: kind,
            path: path.to_path_buf(),
            expected,
        });
    }

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} path is a directory: {}", kind, path.display()),
        ))),
        Ok(_) => Ok(Located::Found(ValidatedPath {
            kind,
            path: path.to_path_buf(),
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => missing(kind, path, policy, reporter),
        Err(e) => Err(Error::Io(e)),
    }
}

fn missing(
    kind: InputKind,
    path: &Path,
    policy: MissingFilePolicy,
    reporter: &dyn Reporter,
) -> Result<Located> {
    let reason = SkipReason {
        input: kind,
        path: path.to_path_buf(),
        policy,
    };
    match policy {
        MissingFilePolicy::Fail => Err(Error::FileNotFound {
            input: kind,
            path: reason.path,
        }),
        MissingFilePolicy::Warn => {
            reporter.warning(&reason.to_string());
            Ok(Located::Skipped(reason))
        }
        MissingFilePolicy::Ignore => {
            reporter.info(&reason.to_string());
            Ok(Located::Skipped(reason))
        }
    }
}

/// Literal, case-sensitive suffix check on the raw path bytes.
fn has_extension(path: &Path, extension: &str) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .ends_with(extension.as_bytes())
}
