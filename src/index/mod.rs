//! In-memory package lists.
//!
//! Two lists are loaded per session: the installed set and the remote set
//! from all configured repositories. The remote list is kept sorted by name
//! ascending and version descending, so any first-hit scan returns the
//! greatest version of a stem.

pub mod query;

use serde::{Deserialize, Serialize};

use crate::deps::parse::{exact_pkgfmt, pkg_match};
use crate::deps::version::dewey_cmp;
use crate::types::Package;

pub use query::{ListFilter, list_local, list_remote, search};

/// A sorted, immutable package list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgList {
    pkgs: Vec<Package>,
}

impl PkgList {
    /// What: Build a list from catalog rows.
    ///
    /// Inputs:
    /// - `pkgs`: Unordered package rows.
    ///
    /// Output:
    /// - A list sorted by name ascending, then Dewey version descending, so
    ///   the first entry per stem is the greatest available version.
    #[must_use]
    pub fn new(mut pkgs: Vec<Package>) -> Self {
        pkgs.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| dewey_cmp(&b.version, &a.version))
        });
        Self { pkgs }
    }

    /// Empty list.
    #[must_use]
    pub fn empty() -> Self {
        Self { pkgs: Vec::new() }
    }

    /// Iterate entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.pkgs.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pkgs.len()
    }

    /// True when the list holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pkgs.is_empty()
    }

    /// What: Find the greatest-versioned entry for a package name.
    ///
    /// Inputs:
    /// - `name`: Package name without version.
    ///
    /// Output:
    /// - The first (greatest) entry whose name matches exactly, or `None`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Package> {
        self.pkgs.iter().find(|p| p.name == name)
    }

    /// What: Find an entry by exact argument.
    ///
    /// Inputs:
    /// - `arg`: Either a full `name-version` form or a bare name.
    ///
    /// Output:
    /// - For a versioned argument, the entry whose full name matches
    ///   exactly; otherwise the greatest entry whose name matches.
    #[must_use]
    pub fn find_exact(&self, arg: &str) -> Option<&Package> {
        if exact_pkgfmt(arg) {
            self.pkgs.iter().find(|p| p.full == arg)
        } else {
            self.find_by_name(arg)
        }
    }

    /// What: Resolve an argument to a unique full package name.
    ///
    /// Inputs:
    /// - `arg`: Bare name or full `name-version` form.
    ///
    /// Output:
    /// - The exact full name when the argument is versioned, else the
    ///   greatest full name for the stem; `None` when nothing matches.
    #[must_use]
    pub fn unique_pkg(&self, arg: &str) -> Option<String> {
        self.find_exact(arg).map(|p| p.full.clone())
    }

    /// What: Find the first entry satisfying a dependency pattern.
    ///
    /// Inputs:
    /// - `pattern`: Raw dependency expression.
    ///
    /// Output:
    /// - The first match in sort order, which is the greatest version of the
    ///   first matching stem.
    #[must_use]
    pub fn map_to_dep(&self, pattern: &str) -> Option<&Package> {
        self.pkgs.iter().find(|p| pkg_match(pattern, &p.full))
    }

}

impl<'a> IntoIterator for &'a PkgList {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.pkgs.iter()
    }
}
