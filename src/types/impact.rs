//! Impact classification, dependency-tree and ordered-step types.
//!
//! Each list kind gets its own type sharing only the package-identity
//! fields: [`DepNode`] for dependency trees, [`ImpactEntry`] for classified
//! impact sets, and [`PkgStep`] for ordered install/remove schedules.

use humansize::{DECIMAL, format_size};
use serde::{Deserialize, Serialize};

/// Classification of a package inside an impact set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkgAction {
    /// Nothing to do: same or newer version already installed.
    DoNothing,
    /// Not installed, needs to be installed.
    ToInstall,
    /// Installed but older, needs upgrade.
    ToUpgrade,
    /// Installed and scheduled for removal.
    ToRemove,
    /// A requirement could not be satisfied by any available package.
    UnmetReq,
}

impl PkgAction {
    /// True for the actions the install orderer emits.
    #[must_use]
    pub const fn needs_install(self) -> bool {
        matches!(self, Self::ToInstall | Self::ToUpgrade)
    }
}

impl std::fmt::Display for PkgAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::DoNothing => "keep as is",
            Self::ToInstall => "install",
            Self::ToUpgrade => "upgrade",
            Self::ToRemove => "remove",
            Self::UnmetReq => "unmet requirement",
        };
        write!(f, "{label}")
    }
}

/// Step kind stamped onto ordered schedule entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Computed {
    /// Not scheduled yet.
    None,
    /// Scheduled for installation.
    ToInstall,
    /// Old version scheduled for removal ahead of its upgrade.
    ToUpgrade,
    /// Scheduled for plain removal.
    ToRemove,
}

/// One node of a dependency expansion.
///
/// `depend` carries the raw dependency pattern in forward trees and the full
/// name of the reverse-dependent in reverse trees. `level` is the depth in
/// the expansion; `-1` is reserved for the root of a remove operation so it
/// sorts after everything else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepNode {
    /// Raw dependency pattern, or full name for reverse trees.
    pub depend: String,
    /// Package name without version.
    pub name: String,
    /// Depth in the expansion; deeper dependencies have larger levels.
    pub level: i32,
    /// Whether the package carries the keep flag.
    pub keep: bool,
}

/// One classified node of an impact set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactEntry {
    /// Full name of the remote package the action applies to.
    pub full: String,
    /// Package name without version.
    pub name: String,
    /// Version of the remote package.
    pub version: String,
    /// Dependency pattern that pulled this package in.
    pub depend: String,
    /// Classified action.
    pub action: PkgAction,
    /// Full name of the installed version being replaced.
    pub old: Option<String>,
    /// Installed size of the version being replaced; `-1` if none.
    pub old_size_pkg: i64,
    /// Archive size in bytes; `-1` marks an unavailable archive.
    pub file_size: i64,
    /// Installed size in bytes.
    pub size_pkg: i64,
    /// Depth in the dependency expansion that produced this entry.
    pub level: i32,
    /// Whether the package was explicitly requested rather than pulled in.
    pub keep: bool,
}

/// One entry of an ordered install or remove schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgStep {
    /// Full name of the package to act on.
    pub full: String,
    /// Level inherited from the impact or dependency node.
    pub level: i32,
    /// What the step does.
    pub computed: Computed,
    /// Archive size; `-1` means the step must be skipped.
    pub file_size: i64,
}

/// Outcome of an install, upgrade or import operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSummary {
    /// Full names scheduled for installation, in execution order.
    pub to_install: Vec<String>,
    /// Full names of the installed versions being replaced.
    pub to_upgrade: Vec<String>,
    /// Full names scheduled for plain removal.
    pub to_remove: Vec<String>,
    /// Full names with unmet requirements.
    pub unmet: Vec<String>,
    /// Arguments that matched nothing in the remote catalog.
    pub not_found: Vec<String>,
    /// Bytes that had to be fetched into the cache.
    pub download_size: i64,
    /// Net bytes the installation adds to the install root.
    pub install_size: i64,
    /// Archives fetched over the wire.
    pub downloaded: u32,
    /// Archives satisfied by a `file://` symlink.
    pub symlinked: u32,
    /// Warning lines counted in the pkg tool output.
    pub warnings: u32,
    /// Error balance counted in the pkg tool output.
    pub errors: i32,
    /// False when nothing was done or the user declined.
    pub performed: bool,
}

impl InstallSummary {
    /// Human-readable download size, e.g. `12.5 MB`.
    #[must_use]
    pub fn human_download_size(&self) -> String {
        format_size(self.download_size.max(0) as u64, DECIMAL)
    }

    /// Human-readable net installed size.
    #[must_use]
    pub fn human_install_size(&self) -> String {
        format_size(self.install_size.max(0) as u64, DECIMAL)
    }

    /// True when the operation found nothing to install or upgrade.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_upgrade.is_empty()
    }
}

/// Outcome of a remove or autoremove operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSummary {
    /// Full names removed, in execution order.
    pub removed: Vec<String>,
    /// Arguments that were not installed to begin with.
    pub not_installed: Vec<String>,
    /// Warning lines counted in the pkg tool output.
    pub warnings: u32,
    /// Error balance counted in the pkg tool output.
    pub errors: i32,
    /// False when nothing was done or the user declined.
    pub performed: bool,
}
