//! Download driver: make every scheduled archive present in the cache.
//!
//! Per package the driver either skips (already present with the right
//! size), symlinks (`file://` repository), or fetches through the injected
//! transport. A failed fetch is recoverable: with the user's consent the
//! package is poisoned (`file_size = -1`) and every later stage skips it.

use std::fs;

use crate::cache::{PKG_EXT, PkgCache};
use crate::db::CatalogDb;
use crate::error::{PkgToolkitError, Result};
use crate::tools::{Confirm, Fetcher};
use crate::types::PkgStep;

/// URL scheme served by a plain symlink instead of a fetch.
const SCHEME_FILE: &str = "file://";

/// Tally of one download pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Archives fetched over the transport.
    pub downloaded: u32,
    /// Archives satisfied by a `file://` symlink.
    pub symlinked: u32,
    /// Archives already present with the right size.
    pub skipped: u32,
    /// Full names poisoned after a tolerated fetch failure.
    pub failed: Vec<String>,
}

/// What: Ensure every install step has its archive in the cache.
///
/// Inputs:
/// - `db`: Catalog handle, for the owning repository of each package.
/// - `cache`: Archive cache.
/// - `steps`: Ordered install steps; poisoned in place on tolerated
///   failures.
/// - `fetcher`: Transport seam.
/// - `confirm`: Prompt seam consulted on fetch failure (default no).
///
/// Output:
/// - The pass tally. Fatal errors: a package without a repository, a failed
///   symlink for a `file://` repository, or a fetch failure the user
///   declined to tolerate.
///
/// Details:
/// - An archive already present with the exact expected size is not fetched
///   again, so re-running an install performs zero fetches.
/// - A declared size of zero is suspicious (some catalog producers omit it)
///   but fetched anyway, with a warning.
pub fn download_pkgs(
    db: &CatalogDb,
    cache: &PkgCache,
    steps: &mut [PkgStep],
    fetcher: &dyn Fetcher,
    confirm: &dyn Confirm,
) -> Result<DownloadOutcome> {
    let mut outcome = DownloadOutcome::default();

    for step in steps.iter_mut() {
        if step.file_size == -1 {
            continue;
        }
        if step.file_size == 0 {
            tracing::warn!("{} has an empty declared size", step.full);
        }

        if cache.has_exact(&step.full, step.file_size) {
            outcome.skipped += 1;
            continue;
        }

        let repo = db
            .repository_for(&step.full)?
            .ok_or_else(|| PkgToolkitError::MissingRepository(step.full.clone()))?;
        let url = format!("{repo}/{}{PKG_EXT}", step.full);
        let archive = cache.archive_path(&step.full);

        if let Some(source) = url.strip_prefix(SCHEME_FILE) {
            tracing::info!("symlinking {url}");
            std::os::unix::fs::symlink(source, &archive)?;
            outcome.symlinked += 1;
            continue;
        }

        tracing::info!("downloading {url}");
        match fetcher.fetch(&url) {
            Ok(bytes) => {
                fs::write(&archive, &bytes)?;
                outcome.downloaded += 1;
            }
            Err(reason) => {
                tracing::error!("{} is not available ({reason})", step.full);
                if !confirm.ask(
                    &format!("{} could not be downloaded, continue anyway?", step.full),
                    false,
                ) {
                    return Err(PkgToolkitError::Fetch { url, reason });
                }
                step.file_size = -1;
                outcome.failed.push(step.full.clone());
            }
        }
    }

    Ok(outcome)
}
