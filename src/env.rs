//! Environment variable configuration for pkgsrc-toolkit.
//!
//! This module provides utilities for reading configuration from environment
//! variables, allowing zero-code configuration for scripts, chrooted builds
//! and CI pipelines. Every helper returns `None` for unset or invalid
//! values; the builder falls back to its defaults.

use std::path::PathBuf;

/// What: Read the repository list from the `PKG_REPOS` environment variable.
///
/// Inputs: None
///
/// Output:
/// - `Option<Vec<String>>` with one URL per whitespace-separated entry, or
///   `None` when the variable is unset or contains no entries.
#[must_use]
pub fn env_repositories() -> Option<Vec<String>> {
    let raw = std::env::var("PKG_REPOS").ok()?;
    let repos: Vec<String> = raw.split_whitespace().map(ToString::to_string).collect();
    if repos.is_empty() { None } else { Some(repos) }
}

/// What: Read the catalog path from `PKGSRC_TOOLKIT_DB`.
///
/// Inputs: None
///
/// Output:
/// - `Option<PathBuf>` when set and non-empty, `None` otherwise.
#[must_use]
pub fn env_db_path() -> Option<PathBuf> {
    std::env::var("PKGSRC_TOOLKIT_DB")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// What: Read the archive cache directory from `PKGSRC_TOOLKIT_CACHE`.
///
/// Inputs: None
///
/// Output:
/// - `Option<PathBuf>` when set and non-empty, `None` otherwise.
#[must_use]
pub fn env_cache_dir() -> Option<PathBuf> {
    std::env::var("PKGSRC_TOOLKIT_CACHE")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// What: Read the install root from `PKGSRC_TOOLKIT_PREFIX`.
///
/// Inputs: None
///
/// Output:
/// - `Option<PathBuf>` when set and non-empty, `None` otherwise.
///
/// Details:
/// - The install root is only used for the free-space pre-check; the
///   low-level pkg tool decides where files actually land.
#[must_use]
pub fn env_install_root() -> Option<PathBuf> {
    std::env::var("PKGSRC_TOOLKIT_PREFIX")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
