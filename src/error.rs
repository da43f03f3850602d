//! Unified error type for pkgsrc-toolkit.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all pkgsrc-toolkit operations.
///
/// This error type covers all possible failure modes across different modules,
/// providing clear, actionable error messages.
#[derive(Error, Debug)]
pub enum PkgToolkitError {
    /// Catalog database error.
    #[error("Catalog database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// Filesystem or subprocess I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Custom parsing error with message.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input parameter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Package not found in the consulted list.
    #[error("Package not found")]
    NotFound,

    /// The catalog database was created by an incompatible version.
    #[error("Catalog database schema is incompatible")]
    SchemaMismatch,

    /// A package download failed and the user chose not to continue.
    #[error("Download failed for {url}: {reason}")]
    Fetch {
        /// URL that could not be retrieved.
        url: String,
        /// Transport-level failure description.
        reason: String,
    },

    /// Not enough free space on the target filesystem.
    #[error("Not enough free space on {}", .path.display())]
    NoDiskSpace {
        /// Filesystem path that failed the space check.
        path: PathBuf,
    },

    /// No configured repository carries the package.
    #[error("Package {0} has no repository")]
    MissingRepository(String),

    /// The user declined to proceed.
    #[error("Operation aborted")]
    Aborted,
}

/// Result type alias for pkgsrc-toolkit operations.
pub type Result<T> = std::result::Result<T, PkgToolkitError>;
