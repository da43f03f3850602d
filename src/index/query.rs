//! List and search queries over the in-memory package lists.

use regex::RegexBuilder;

use crate::deps::version::version_check;
use crate::error::{PkgToolkitError, Result};
use crate::index::PkgList;
use crate::types::{Package, PkgStatusEntry};

/// Status filter for the installed-package listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListFilter {
    /// Remote version equals the installed one.
    Equal,
    /// Installed version is newer than the remote one.
    Greater,
    /// Installed version is older than the remote one.
    Lesser,
}

impl ListFilter {
    /// Map the `-l` flag characters `=`, `>`, `<` to a filter.
    #[must_use]
    pub fn from_flag(c: char) -> Option<Self> {
        match c {
            '=' => Some(Self::Equal),
            '>' => Some(Self::Greater),
            '<' => Some(Self::Lesser),
            _ => None,
        }
    }

    /// The status character this filter selects.
    #[must_use]
    const fn status_char(self) -> char {
        match self {
            Self::Equal => '=',
            Self::Greater => '>',
            Self::Lesser => '<',
        }
    }
}

/// What: Compute the installed-status marker for a remote package.
///
/// Inputs:
/// - `local`: Installed package list.
/// - `pkg`: Remote package to compare.
///
/// Output:
/// - `Some('=')` when the same version is installed, `Some('>')` when the
///   installed version is greater, `Some('<')` when older, `None` when the
///   package is not installed.
fn installed_status(local: &PkgList, pkg: &Package) -> Option<char> {
    let installed = local.find_by_name(&pkg.name)?;
    if installed.version == pkg.version {
        return Some('=');
    }
    match version_check(&installed.full, &pkg.full) {
        1 => Some('>'),
        _ => Some('<'),
    }
}

/// What: List installed packages, optionally filtered by remote status.
///
/// Inputs:
/// - `local`: Installed package list.
/// - `remote`: Remote package list (consulted only when filtering).
/// - `filter`: Optional status filter from the `-l` flag.
///
/// Output:
/// - Without a filter, one entry per installed package. With a filter, one
///   entry per remote package whose installed status matches.
#[must_use]
pub fn list_local(
    local: &PkgList,
    remote: &PkgList,
    filter: Option<ListFilter>,
) -> Vec<PkgStatusEntry> {
    match filter {
        None => local
            .iter()
            .map(|p| PkgStatusEntry {
                full: p.full.clone(),
                comment: p.comment.clone(),
                status: None,
            })
            .collect(),
        Some(filter) => {
            let wanted = filter.status_char();
            remote
                .iter()
                .filter_map(|p| {
                    let status = installed_status(local, p)?;
                    (status == wanted).then(|| PkgStatusEntry {
                        full: p.full.clone(),
                        comment: p.comment.clone(),
                        status: Some(status),
                    })
                })
                .collect()
        }
    }
}

/// List every remotely available package.
#[must_use]
pub fn list_remote(remote: &PkgList) -> Vec<PkgStatusEntry> {
    remote
        .iter()
        .map(|p| PkgStatusEntry {
            full: p.full.clone(),
            comment: p.comment.clone(),
            status: None,
        })
        .collect()
}

/// What: Search the remote list by case-insensitive regex.
///
/// Inputs:
/// - `remote`: Remote package list.
/// - `local`: Installed package list, for the status markers.
/// - `pattern`: Extended regex matched against names and comments.
///
/// Output:
/// - Matching entries annotated with their installed status, or `Parse`
///   when the regex does not compile.
pub fn search(remote: &PkgList, local: &PkgList, pattern: &str) -> Result<Vec<PkgStatusEntry>> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| PkgToolkitError::Parse(format!("bad search pattern {pattern}: {e}")))?;

    Ok(remote
        .iter()
        .filter(|p| re.is_match(&p.name) || re.is_match(&p.comment))
        .map(|p| PkgStatusEntry {
            full: p.full.clone(),
            comment: p.comment.clone(),
            status: installed_status(local, p),
        })
        .collect())
}
