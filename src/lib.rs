//! Rust toolkit for pkgsrc binary package management.
//!
//! This crate implements the impact-and-ordering engine of a binary package
//! client: it resolves user-supplied package patterns against a
//! SQLite-backed catalog, computes the minimal set of downloads, removals
//! and installations a request implies, fetches archives into a cache, and
//! drives an injected low-level package tool in dependency-safe order.
//!
//! # Modules
//!
//! - `deps`: version ordering, dependency patterns, tree expansion, impact
//!   classification, action ordering
//! - `db`: the SQLite catalog store
//! - `index`: in-memory package lists plus list/search queries
//! - `cache`: the archive cache and download driver
//! - `tools`: seams for the transport, the pkg tool and prompts
//! - `client`: the operation facade
//!
//! # Examples
//!
//! ## Install a package
//!
//! ```no_run
//! use pkgsrc_toolkit::PkgClient;
//!
//! # fn example() -> pkgsrc_toolkit::Result<()> {
//! let mut client = PkgClient::builder()
//!     .repositories(vec!["http://cdn.example.org/packages".to_string()])
//!     .assume_yes(true)
//!     .build()?;
//! let summary = client.install(&["vim".to_string()])?;
//! for full in &summary.to_install {
//!     println!("installed {full}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Search the remote catalog
//!
//! ```no_run
//! use pkgsrc_toolkit::PkgClient;
//!
//! # fn example() -> pkgsrc_toolkit::Result<()> {
//! let client = PkgClient::builder().build()?;
//! for entry in client.search("^mysql")? {
//!     println!("{entry}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Upgrade kept packages
//!
//! ```no_run
//! use pkgsrc_toolkit::PkgClient;
//!
//! # fn example() -> pkgsrc_toolkit::Result<()> {
//! let mut client = PkgClient::builder().assume_yes(true).build()?;
//! let summary = client.upgrade()?;
//! println!(
//!     "{} upgraded, {} warnings, {} errors",
//!     summary.to_upgrade.len(),
//!     summary.warnings,
//!     summary.errors
//! );
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod db;
pub mod deps;
pub mod env;
pub mod error;
pub mod index;
pub mod tools;
pub mod types;

/// Prelude module for convenient imports.
///
/// Re-exports the commonly used types, traits and functions so a single
/// `use pkgsrc_toolkit::prelude::*;` covers typical usage.
pub mod prelude;

/// Crate version plus the SQLite library backing the catalog.
#[must_use]
pub fn version() -> String {
    format!(
        "{} (using SQLite {})",
        env!("CARGO_PKG_VERSION"),
        rusqlite::version()
    )
}

// Re-export commonly used types
pub use client::{PkgClient, PkgClientBuilder};
pub use error::{PkgToolkitError as Error, Result};
pub use index::{ListFilter, PkgList};
pub use types::{
    Computed, DepNode, ImpactEntry, InstallSummary, Package, PkgAction, PkgStatusEntry, PkgStep,
    RemoveSummary,
};
