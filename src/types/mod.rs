//! Core data types shared across pkgsrc-toolkit modules.

pub mod impact;
pub mod package;

pub use impact::{Computed, DepNode, ImpactEntry, InstallSummary, PkgAction, PkgStep, RemoveSummary};
pub use package::{Package, PkgStatusEntry};
