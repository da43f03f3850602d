//! Dependency resolution: version ordering, pattern matching, tree
//! expansion, impact classification and action ordering.
//!
//! The modules compose into the install pipeline: user arguments resolve
//! against the remote list ([`resolve::resolve_pkgargs`]), expand into a
//! dependency tree ([`query::full_dep_tree`]), classify into an impact set
//! ([`resolve::pkg_impact`]), pass the conflict and requirement gates, and
//! come out as ordered schedules ([`order`]).

pub mod order;
pub mod parse;
pub mod query;
pub mod resolve;
pub mod version;

pub use order::{order_install, order_remove, order_upgrade_remove};
pub use parse::{DependPattern, DeweyOp, exact_pkgfmt, pkg_match, pkgname_from_depend, split_full};
pub use query::{DepDirection, direct_deps, full_dep_tree};
pub use resolve::{
    narrow_match, pkg_conflicts, pkg_impact, pkg_met_reqs, record_upgrades, resolve_pkgargs,
};
pub use version::{dewey_cmp, version_check, version_satisfies};
