//! Binary archive cache.
//!
//! Downloaded archives land in one flat directory, one file per package
//! (`<full><ext>`). The cache is the sole property of the running operation;
//! nothing else writes to it while an install is in flight.

pub mod download;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PkgToolkitError, Result};

pub use download::{DownloadOutcome, download_pkgs};

/// Archive suffix appended to full package names.
pub const PKG_EXT: &str = ".tgz";

/// Handle on the archive cache directory.
#[derive(Clone, Debug)]
pub struct PkgCache {
    dir: PathBuf,
}

impl PkgCache {
    /// What: Open (and if necessary create) a cache directory.
    ///
    /// Inputs:
    /// - `dir`: Cache directory path.
    ///
    /// Output:
    /// - The handle, or `Io` when the directory cannot be created.
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Default cache location under the user cache directory.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("pkgsrc-toolkit")
            .join("cache")
    }

    /// Directory the cache lives in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache path of a package archive.
    #[must_use]
    pub fn archive_path(&self, full: &str) -> PathBuf {
        self.dir.join(format!("{full}{PKG_EXT}"))
    }

    /// What: Check whether an archive is already fully present.
    ///
    /// Inputs:
    /// - `full`: Full package name.
    /// - `file_size`: Expected byte size.
    ///
    /// Output:
    /// - `true` when the cached file exists with exactly the expected size
    ///   and the size is positive.
    #[must_use]
    pub fn has_exact(&self, full: &str, file_size: i64) -> bool {
        file_size > 0
            && fs::metadata(self.archive_path(full))
                .map(|m| m.len() as i64 == file_size)
                .unwrap_or(false)
    }

    /// What: Delete every cached archive.
    ///
    /// Output:
    /// - Bytes freed.
    pub fn clean(&self) -> Result<u64> {
        let mut freed = 0u64;
        for dirent in fs::read_dir(&self.dir)? {
            let dirent = dirent?;
            let path = dirent.path();
            if path.is_dir() {
                continue;
            }
            // symlink_metadata so file:// symlinks count as themselves
            if let Ok(meta) = fs::symlink_metadata(&path) {
                freed += meta.len();
            }
            fs::remove_file(&path)?;
        }
        tracing::debug!("cache cleaned, {} bytes freed", freed);
        Ok(freed)
    }
}

/// What: Verify a filesystem has room for a number of bytes.
///
/// Inputs:
/// - `path`: Any path on the filesystem to check.
/// - `bytes`: Bytes about to be written; non-positive always fits.
///
/// Output:
/// - `Ok(())` when the space is available, `NoDiskSpace` otherwise.
pub fn fs_has_room(path: &Path, bytes: i64) -> Result<()> {
    if bytes <= 0 {
        return Ok(());
    }
    let available = fs4::available_space(path)?;
    if available < bytes as u64 {
        tracing::error!(
            "{} has {available} bytes free, {bytes} needed",
            path.display()
        );
        return Err(PkgToolkitError::NoDiskSpace {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
