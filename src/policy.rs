//! Missing-file policies.
//!
//! A [`MissingFilePolicy`] decides what happens when the icon or the package
//! does not exist on disk. Policy strings come from the outside world (CI
//! inputs, flags) and are resolved with [`MissingFilePolicy::resolve`].

use std::fmt;
use std::str::FromStr;

use crate::locate::InputKind;
use crate::{Error, Result};

/// What to do when an input file is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MissingFilePolicy {
    /// Abort the run with [`Error::FileNotFound`].
    #[default]
    Fail,
    /// Emit a warning and finish successfully without touching the package.
    Warn,
    /// Emit an informational message and finish successfully without
    /// touching the package.
    Ignore,
}

impl MissingFilePolicy {
    /// All accepted policy spellings, in canonical order.
    pub const VALUES: [&'static str; 3] = ["fail", "warn", "ignore"];

    /// Resolves a policy value for the given input.
    ///
    /// Matching is exact: `"Warn"` or `" warn"` are rejected, like any other
    /// value outside [`Self::VALUES`].
    pub fn resolve(input: InputKind, value: &str) -> Result<Self> {
        match value {
            "fail" => Ok(Self::Fail),
            "warn" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            _ => Err(Error::InvalidPolicy {
                input,
                value: value.to_string(),
            }),
        }
    }

    /// Returns the canonical spelling of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Warn => "warn",
            Self::Ignore => "ignore",
        }
    }

    /// Returns `true` if a missing file is fatal under this policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

impl fmt::Display for MissingFilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a policy without input context.
///
/// The error reports the value against the icon input; use
/// [`MissingFilePolicy::resolve`] when the input is known.
impl FromStr for MissingFilePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(InputKind::Icon, s)
    }
}
