//! Package identity and catalog-entry types.

use serde::{Deserialize, Serialize};

use crate::deps::parse::split_full;

/// A catalog entry for one binary package, local or remote.
///
/// `full` is always `<name>-<version>` and splits back into the `name` and
/// `version` fields. Sizes are signed because `-1` marks an archive that must
/// not be fetched or installed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Full package name, e.g. `mysql-5.1.25`.
    pub full: String,
    /// Package name without the version, e.g. `mysql`.
    pub name: String,
    /// Version part, e.g. `5.1.25`.
    pub version: String,
    /// One-line package description.
    pub comment: String,
    /// Archive size in bytes; `-1` marks an unavailable archive.
    pub file_size: i64,
    /// Installed size in bytes.
    pub size_pkg: i64,
}

impl Package {
    /// What: Build a catalog entry from a full package name.
    ///
    /// Inputs:
    /// - `full`: Full name in `<name>-<version>` form.
    /// - `comment`: One-line description.
    /// - `file_size`: Archive size in bytes.
    /// - `size_pkg`: Installed size in bytes.
    ///
    /// Output:
    /// - Returns `Some(Package)` with `name` and `version` split out.
    /// - Returns `None` when `full` has no version suffix.
    #[must_use]
    pub fn new(full: &str, comment: &str, file_size: i64, size_pkg: i64) -> Option<Self> {
        let (name, version) = split_full(full)?;
        Some(Self {
            full: full.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            comment: comment.to_string(),
            file_size,
            size_pkg,
        })
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full)
    }
}

/// One line of `list`, `avail` or `search` output: a package plus its
/// installed-status marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgStatusEntry {
    /// Full package name.
    pub full: String,
    /// One-line package description.
    pub comment: String,
    /// `=` same version installed, `>` installed is newer, `<` installed is
    /// older, `None` when not installed.
    pub status: Option<char>,
}

impl std::fmt::Display for PkgStatusEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(c) => write!(f, "{} {} {}", self.full, c, self.comment),
            None => write!(f, "{} {}", self.full, self.comment),
        }
    }
}
