//! Convenience re-exports.
//!
//! # Example
//!
//! ```no_run
//! use pkgsrc_toolkit::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let mut client = PkgClient::builder().assume_yes(true).build()?;
//! let summary: InstallSummary = client.install(&["vim".to_string()])?;
//! # let _ = summary;
//! # Ok(())
//! # }
//! ```

pub use crate::client::{PkgClient, PkgClientBuilder};
pub use crate::deps::{
    DependPattern, dewey_cmp, exact_pkgfmt, pkg_match, pkgname_from_depend, split_full,
    version_check, version_satisfies,
};
pub use crate::error::{PkgToolkitError, Result};
pub use crate::index::{ListFilter, PkgList};
pub use crate::tools::{AutoConfirm, Confirm, Fetcher, PkgTool, ProcessPkgTool};
pub use crate::types::{
    Computed, DepNode, ImpactEntry, InstallSummary, Package, PkgAction, PkgStatusEntry, PkgStep,
    RemoveSummary,
};
