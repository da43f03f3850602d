//! Client facade for all package operations.
//!
//! [`PkgClient`] owns the catalog handle, the two in-memory package lists,
//! the external seams and the option flags, and exposes one method per
//! command: install, remove, upgrade, full-upgrade, autoremove, keep
//! bookkeeping, list/avail/search, and cache cleaning. Construction goes
//! through [`PkgClientBuilder`].

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cache::{PkgCache, download_pkgs, fs_has_room};
use crate::db::CatalogDb;
use crate::deps::order::{order_install, order_remove, order_upgrade_remove};
use crate::deps::query::{DepDirection, direct_deps, full_dep_tree};
use crate::deps::resolve::{
    pkg_conflicts, pkg_impact, pkg_met_reqs, record_upgrades, resolve_pkgargs,
};
use crate::deps::{exact_pkgfmt, split_full};
use crate::env;
use crate::error::{PkgToolkitError, Result};
use crate::index::{ListFilter, PkgList, list_local, list_remote, query};
use crate::tools::{
    Confirm, Fetcher, LogAnalysis, PkgTool, ProcessPkgTool, StdinConfirm, analyse_tool_log,
};
use crate::types::{
    Computed, DepNode, InstallSummary, Package, PkgAction, PkgStatusEntry, PkgStep, RemoveSummary,
};

/// Fallback [`Fetcher`] used until a real transport is injected.
struct NoTransport;

impl Fetcher for NoTransport {
    fn fetch(&self, _url: &str) -> std::result::Result<Vec<u8>, String> {
        Err("no transport configured".to_string())
    }
}

/// Client for pkgsrc binary package operations.
///
/// # Example
///
/// ```no_run
/// use pkgsrc_toolkit::PkgClient;
///
/// # fn example() -> pkgsrc_toolkit::Result<()> {
/// let mut client = PkgClient::builder()
///     .repositories(vec!["http://cdn.example.org/packages".to_string()])
///     .assume_yes(true)
///     .build()?;
/// let summary = client.install(&["vim".to_string()])?;
/// println!("installed {} packages", summary.to_install.len());
/// # Ok(())
/// # }
/// ```
pub struct PkgClient {
    db: CatalogDb,
    cache: PkgCache,
    local: PkgList,
    remote: PkgList,
    install_root: PathBuf,
    error_log: Option<PathBuf>,
    fetcher: Box<dyn Fetcher>,
    tool: Box<dyn PkgTool>,
    confirm: Box<dyn Confirm>,
    assume_yes: bool,
    assume_no: bool,
    force_reinstall: bool,
    download_only: bool,
    verbose: bool,
}

/// Builder for [`PkgClient`].
pub struct PkgClientBuilder {
    db_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    install_root: Option<PathBuf>,
    error_log: Option<PathBuf>,
    repositories: Option<Vec<String>>,
    fetcher: Box<dyn Fetcher>,
    tool: Box<dyn PkgTool>,
    confirm: Box<dyn Confirm>,
    assume_yes: bool,
    assume_no: bool,
    force_reinstall: bool,
    download_only: bool,
    verbose: bool,
}

impl Default for PkgClientBuilder {
    fn default() -> Self {
        Self {
            db_path: None,
            cache_dir: None,
            install_root: None,
            error_log: None,
            repositories: None,
            fetcher: Box::new(NoTransport),
            tool: Box::new(ProcessPkgTool::new()),
            confirm: Box::new(StdinConfirm),
            assume_yes: false,
            assume_no: false,
            force_reinstall: false,
            download_only: false,
            verbose: false,
        }
    }
}

impl PkgClientBuilder {
    /// Catalog database file (default: env override or the user data dir).
    #[must_use]
    pub fn db_path(mut self, path: PathBuf) -> Self {
        self.db_path = Some(path);
        self
    }

    /// Archive cache directory (default: env override or the user cache dir).
    #[must_use]
    pub fn cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    /// Install root used for the free-space pre-check (default `/usr/pkg`).
    #[must_use]
    pub fn install_root(mut self, root: PathBuf) -> Self {
        self.install_root = Some(root);
        self
    }

    /// Append pkg tool stderr to this file, one tagged block per step.
    #[must_use]
    pub fn error_log(mut self, path: PathBuf) -> Self {
        self.error_log = Some(path);
        self
    }

    /// Repository URLs (default: the `PKG_REPOS` environment variable).
    #[must_use]
    pub fn repositories(mut self, urls: Vec<String>) -> Self {
        self.repositories = Some(urls);
        self
    }

    /// Inject the download transport.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Inject the low-level package tool.
    #[must_use]
    pub fn pkg_tool(mut self, tool: Box<dyn PkgTool>) -> Self {
        self.tool = tool;
        self
    }

    /// Inject the confirmation prompt.
    #[must_use]
    pub fn confirm(mut self, confirm: Box<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Answer yes to every prompt.
    #[must_use]
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Answer no to every prompt.
    #[must_use]
    pub fn assume_no(mut self, no: bool) -> Self {
        self.assume_no = no;
        self
    }

    /// Reinstall packages already at the requested version.
    #[must_use]
    pub fn force_reinstall(mut self, force: bool) -> Self {
        self.force_reinstall = force;
        self
    }

    /// Download archives without installing anything.
    #[must_use]
    pub fn download_only(mut self, download_only: bool) -> Self {
        self.download_only = download_only;
        self
    }

    /// Pass verbosity down to the pkg tool.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// What: Open the catalog, record repositories, and load the lists.
    ///
    /// Output:
    /// - A ready client, or `SchemaMismatch` when the catalog is
    ///   incompatible and the user declined the destructive reset.
    pub fn build(self) -> Result<PkgClient> {
        let db_path = self
            .db_path
            .or_else(env::env_db_path)
            .unwrap_or_else(default_db_path);
        let cache_dir = self
            .cache_dir
            .or_else(env::env_cache_dir)
            .unwrap_or_else(PkgCache::default_dir);
        let install_root = self
            .install_root
            .or_else(env::env_install_root)
            .unwrap_or_else(|| PathBuf::from("/usr/pkg"));

        let db = match CatalogDb::open_at(&db_path) {
            Ok(db) => db,
            Err(PkgToolkitError::SchemaMismatch) => {
                let allowed = self.assume_yes
                    || (!self.assume_no
                        && self.confirm.ask(
                            "catalog database schema is incompatible, destroy and recreate?",
                            true,
                        ));
                if !allowed {
                    return Err(PkgToolkitError::SchemaMismatch);
                }
                fs::remove_file(&db_path)?;
                tracing::warn!("catalog {} destroyed for schema reset", db_path.display());
                CatalogDb::open_at(&db_path)?
            }
            Err(e) => return Err(e),
        };

        let repositories = self
            .repositories
            .or_else(env::env_repositories)
            .unwrap_or_default();
        db.record_repositories(&repositories)?;

        let cache = PkgCache::open(cache_dir)?;

        let mut client = PkgClient {
            db,
            cache,
            local: PkgList::empty(),
            remote: PkgList::empty(),
            install_root,
            error_log: self.error_log,
            fetcher: self.fetcher,
            tool: self.tool,
            confirm: self.confirm,
            assume_yes: self.assume_yes,
            assume_no: self.assume_no,
            force_reinstall: self.force_reinstall,
            download_only: self.download_only,
            verbose: self.verbose,
        };
        client.refresh_lists()?;
        Ok(client)
    }
}

/// Catalog location when neither the builder nor the environment says.
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pkgsrc-toolkit")
        .join("catalog.db")
}

impl PkgClient {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> PkgClientBuilder {
        PkgClientBuilder::default()
    }

    /// Reload both in-memory lists from the catalog, e.g. after an external
    /// summary ingestion run.
    pub fn refresh_lists(&mut self) -> Result<()> {
        self.local = PkgList::new(self.db.local_packages()?);
        self.remote = PkgList::new(self.db.remote_packages()?);
        tracing::debug!(
            "{} local, {} remote packages loaded",
            self.local.len(),
            self.remote.len()
        );
        Ok(())
    }

    /// Direct access to the catalog, e.g. for ingestion or keep inspection.
    #[must_use]
    pub fn catalog(&self) -> &CatalogDb {
        &self.db
    }

    /// The archive cache in use.
    #[must_use]
    pub fn cache(&self) -> &PkgCache {
        &self.cache
    }

    /// Answer a prompt, honoring the assume-yes / assume-no flags.
    fn confirmed(&self, prompt: &str, default_yes: bool) -> bool {
        if self.assume_yes {
            return true;
        }
        if self.assume_no {
            return false;
        }
        self.confirm.ask(prompt, default_yes)
    }

    // --- install pipeline ---

    /// What: Install packages and their dependencies.
    ///
    /// Inputs:
    /// - `args`: Package names, full names, or glob patterns.
    ///
    /// Output:
    /// - The operation summary. `performed` is false when nothing matched,
    ///   nothing needed doing, or the user declined.
    ///
    /// Details:
    /// - Successfully requested packages are flagged keep, marking them as
    ///   user-requested rather than pulled in by dependency.
    pub fn install(&mut self, args: &[String]) -> Result<InstallSummary> {
        self.install_inner(args, true)
    }

    /// Shared pipeline behind install, upgrade and import.
    fn install_inner(&mut self, args: &[String], mark_keep: bool) -> Result<InstallSummary> {
        let (resolved, not_found) = resolve_pkgargs(&self.remote, args);
        let mut summary = InstallSummary {
            not_found,
            ..InstallSummary::default()
        };
        if resolved.is_empty() {
            tracing::info!("nothing to do");
            return Ok(summary);
        }

        let mut impact = pkg_impact(
            &self.db,
            &self.local,
            &self.remote,
            &resolved,
            self.force_reinstall,
        )?;
        if impact.is_empty() {
            tracing::info!("nothing to do");
            return Ok(summary);
        }

        pkg_met_reqs(&self.db, &self.local, &mut impact)?;
        summary.unmet = impact
            .iter()
            .filter(|e| e.action == PkgAction::UnmetReq)
            .map(|e| e.full.clone())
            .collect();

        for entry in impact.iter().filter(|e| e.action.needs_install()) {
            let conflicts = pkg_conflicts(&self.db, &self.local, &entry.full)?;
            if !conflicts.is_empty()
                && !self.confirmed(
                    &format!(
                        "{} conflicts with installed {}, proceed anyway?",
                        entry.full,
                        conflicts.join(" ")
                    ),
                    false,
                )
            {
                return Err(PkgToolkitError::Aborted);
            }
        }

        self.account_sizes(&impact, &mut summary)?;

        let mut remove_steps = order_upgrade_remove(&impact);
        let mut install_steps = order_install(&impact);
        summary.to_install = install_steps.iter().map(|s| s.full.clone()).collect();
        summary.to_upgrade = remove_steps
            .iter()
            .filter(|s| s.computed == Computed::ToUpgrade)
            .map(|s| s.full.clone())
            .collect();
        summary.to_remove = remove_steps
            .iter()
            .filter(|s| s.computed == Computed::ToRemove)
            .map(|s| s.full.clone())
            .collect();

        if install_steps.is_empty() {
            tracing::info!("nothing to install");
            return Ok(summary);
        }
        if !summary.unmet.is_empty()
            && !self.confirmed(
                &format!(
                    "requirements are not satisfiable for {}, proceed anyway?",
                    summary.unmet.join(" ")
                ),
                false,
            )
        {
            return Err(PkgToolkitError::Aborted);
        }
        if !self.confirmed(
            &format!(
                "{} package(s) to install ({} to download, {} to use), proceed?",
                install_steps.len(),
                summary.human_download_size(),
                summary.human_install_size()
            ),
            true,
        ) {
            return Ok(summary);
        }

        // before erasing anything, download packages
        let outcome = download_pkgs(
            &self.db,
            &self.cache,
            &mut install_steps,
            self.fetcher.as_ref(),
            &FlaggedConfirm {
                assume_yes: self.assume_yes,
                assume_no: self.assume_no,
                inner: self.confirm.as_ref(),
            },
        )?;
        summary.downloaded = outcome.downloaded;
        summary.symlinked = outcome.symlinked;

        // a failed new archive must not strand its old version: poison the
        // matching removal step too
        for failed in &outcome.failed {
            if let Some(old) = impact
                .iter()
                .find(|e| &e.full == failed)
                .and_then(|e| e.old.as_ref())
                && let Some(step) = remove_steps.iter_mut().find(|s| &s.full == old)
            {
                step.file_size = -1;
            }
        }

        if self.download_only {
            summary.performed = true;
            return Ok(summary);
        }

        let mut analysis = LogAnalysis::default();
        if !remove_steps.is_empty() {
            tracing::info!("removing obsolete versions before the upgrade");
            self.run_removals(&remove_steps, &mut analysis)?;
        }
        self.run_installs(&install_steps, &mut analysis)?;

        summary.warnings = analysis.warnings;
        summary.errors = analysis.errors;
        summary.performed = true;
        tracing::info!("{} warnings, {} errors", analysis.warnings, analysis.errors);

        if mark_keep {
            let installed: HashSet<&str> =
                install_steps.iter().map(|s| s.full.as_str()).collect();
            for full in &resolved {
                if installed.contains(full.as_str())
                    && let Some((stem, _)) = split_full(full)
                {
                    self.db.set_keep(stem)?;
                }
            }
        }

        Ok(summary)
    }

    /// Disk-space accounting and pre-checks over the impact set.
    fn account_sizes(
        &self,
        impact: &[crate::types::ImpactEntry],
        summary: &mut InstallSummary,
    ) -> Result<()> {
        let mut download_size = 0i64;
        let mut install_size = 0i64;

        for entry in impact.iter().filter(|e| e.action.needs_install()) {
            if !self.cache.has_exact(&entry.full, entry.file_size) {
                let from_file_repo = self
                    .db
                    .repository_for(&entry.full)?
                    .is_some_and(|url| url.starts_with("file://"));
                if !from_file_repo {
                    download_size += entry.file_size.max(0);
                }
            }
            install_size += (entry.size_pkg - entry.old_size_pkg.max(0)).max(0);
        }

        summary.download_size = download_size;
        summary.install_size = install_size;

        fs_has_room(self.cache.dir(), download_size)?;
        if self.install_root.exists() {
            fs_has_room(&self.install_root, install_size)?;
        } else {
            tracing::debug!(
                "install root {} does not exist, skipping space check",
                self.install_root.display()
            );
        }
        Ok(())
    }

    /// Run ordered removal steps through the pkg tool.
    fn run_removals(&self, steps: &[PkgStep], analysis: &mut LogAnalysis) -> Result<()> {
        for step in steps {
            if step.file_size == -1 {
                continue;
            }
            tracing::info!("removing {}", step.full);
            let output = self.tool.delete(&step.full, true, self.verbose)?;
            self.log_step("removing", &step.full, &output.stderr)?;
            if !output.success {
                analysis.errors += 1;
            }
            analysis.absorb(analyse_tool_log(&output.stderr));
        }
        Ok(())
    }

    /// Run ordered install steps through the pkg tool.
    fn run_installs(&self, steps: &[PkgStep], analysis: &mut LogAnalysis) -> Result<()> {
        for step in steps {
            if step.file_size == -1 {
                continue;
            }
            tracing::info!("installing {}", step.full);
            let archive = self.cache.archive_path(&step.full);
            let output = self.tool.add(&archive, true, self.verbose)?;
            self.log_step("installing", &step.full, &output.stderr)?;
            let scanned = analyse_tool_log(&output.stderr);
            if !output.success && scanned.errors == 0 {
                analysis.errors += 1;
            }
            analysis.absorb(scanned);
        }
        Ok(())
    }

    /// Append one tagged stderr block to the install-error log.
    fn log_step(&self, verb: &str, full: &str, stderr: &str) -> Result<()> {
        let Some(path) = &self.error_log else {
            return Ok(());
        };
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "---{verb} {full}")?;
        if !stderr.is_empty() {
            file.write_all(stderr.as_bytes())?;
            if !stderr.ends_with('\n') {
                writeln!(file)?;
            }
        }
        Ok(())
    }

    // --- removal pipeline ---

    /// What: Remove packages together with their reverse dependencies.
    ///
    /// Inputs:
    /// - `args`: Installed package names or full names.
    ///
    /// Output:
    /// - The removal summary; reverse-dependents are removed first, the
    ///   requested packages last.
    pub fn remove(&mut self, args: &[String]) -> Result<RemoveSummary> {
        if self.local.is_empty() {
            return Err(PkgToolkitError::InvalidInput(
                "local package list is empty".to_string(),
            ));
        }

        let mut summary = RemoveSummary::default();
        let mut tree: Vec<DepNode> = Vec::new();

        for arg in args {
            let Some(pkg) = self.local.find_exact(arg) else {
                tracing::warn!("{arg} is not installed");
                summary.not_installed.push(arg.clone());
                continue;
            };
            let (full, stem) = (pkg.full.clone(), pkg.name.clone());

            for node in full_dep_tree(
                &self.db,
                &self.local,
                &self.remote,
                &stem,
                DepDirection::LocalReverse,
            )? {
                if !tree.iter().any(|n| n.name == node.name) {
                    tree.push(node);
                }
            }

            // already pulled in as someone else's reverse dependency
            if tree.iter().any(|n| n.name == stem) {
                continue;
            }
            let level = if tree.is_empty() { -1 } else { 0 };
            tree.push(DepNode {
                depend: full,
                name: stem,
                level,
                keep: false,
            });
        }

        if tree.is_empty() {
            tracing::info!("no packages to delete");
            return Ok(summary);
        }

        let steps = order_remove(&tree);
        let listed: Vec<&str> = steps.iter().map(|s| s.full.as_str()).collect();
        if !self.confirmed(
            &format!("{} package(s) to delete: {}", steps.len(), listed.join(" ")),
            true,
        ) {
            return Ok(summary);
        }

        let mut analysis = LogAnalysis::default();
        self.run_removals(&steps, &mut analysis)?;

        for step in &steps {
            if let Some((stem, _)) = split_full(&step.full) {
                self.db.unset_keep(stem)?;
            }
            summary.removed.push(step.full.clone());
        }
        summary.warnings = analysis.warnings;
        summary.errors = analysis.errors;
        summary.performed = true;
        Ok(summary)
    }

    /// What: Remove orphans: installed packages no keep package needs.
    ///
    /// Output:
    /// - The removal summary; orphans depending on each other are removed
    ///   reverse-dependents-first.
    pub fn autoremove(&mut self) -> Result<RemoveSummary> {
        let kept = self.db.kept_packages()?;
        if kept.is_empty() {
            return Err(PkgToolkitError::InvalidInput(
                "keep list is empty, refusing to autoremove everything".to_string(),
            ));
        }

        let mut needed: HashSet<String> = kept.iter().cloned().collect();
        for name in &kept {
            for node in full_dep_tree(
                &self.db,
                &self.local,
                &self.remote,
                name,
                DepDirection::LocalForward,
            )? {
                needed.insert(node.name);
            }
        }

        let orphans: Vec<Package> = self
            .local
            .iter()
            .filter(|p| !needed.contains(&p.name))
            .cloned()
            .collect();
        let mut summary = RemoveSummary::default();
        if orphans.is_empty() {
            tracing::info!("no orphan packages");
            return Ok(summary);
        }

        let steps = self.order_orphans(&orphans)?;
        let listed: Vec<&str> = steps.iter().map(|s| s.full.as_str()).collect();
        if !self.confirmed(
            &format!(
                "{} orphan package(s) to delete: {}",
                steps.len(),
                listed.join(" ")
            ),
            true,
        ) {
            return Ok(summary);
        }

        let mut analysis = LogAnalysis::default();
        self.run_removals(&steps, &mut analysis)?;
        summary.removed = steps.iter().map(|s| s.full.clone()).collect();
        summary.warnings = analysis.warnings;
        summary.errors = analysis.errors;
        summary.performed = true;
        Ok(summary)
    }

    /// Peel orphans so that nothing is removed before its orphan
    /// reverse-dependents.
    fn order_orphans(&self, orphans: &[Package]) -> Result<Vec<PkgStep>> {
        let mut remaining: Vec<&Package> = orphans.iter().collect();
        let mut steps = Vec::new();

        while !remaining.is_empty() {
            let names: HashSet<&str> = remaining.iter().map(|p| p.name.as_str()).collect();
            let mut ready = Vec::new();
            let mut blocked = Vec::new();

            for pkg in remaining {
                let has_pending_dependent = self
                    .db
                    .local_reverse_deps(&pkg.name)?
                    .iter()
                    .filter_map(|full| split_full(full))
                    .any(|(name, _)| names.contains(name));
                if has_pending_dependent {
                    blocked.push(pkg);
                } else {
                    ready.push(pkg);
                }
            }

            if ready.is_empty() {
                // dependency cycle among orphans: take them as they come
                ready = blocked;
                blocked = Vec::new();
            }
            for pkg in ready {
                steps.push(PkgStep {
                    full: pkg.full.clone(),
                    level: 0,
                    computed: Computed::ToRemove,
                    file_size: 0,
                });
            }
            remaining = blocked;
        }

        Ok(steps)
    }

    // --- upgrades ---

    /// Upgrade the kept packages to their closest newer versions.
    pub fn upgrade(&mut self) -> Result<InstallSummary> {
        self.upgrade_inner(false)
    }

    /// Upgrade every installed package to its closest newer version.
    pub fn full_upgrade(&mut self) -> Result<InstallSummary> {
        self.upgrade_inner(true)
    }

    /// Shared upgrade seeding: narrow-match every seed package.
    fn upgrade_inner(&mut self, all: bool) -> Result<InstallSummary> {
        let kept = self.db.kept_packages()?;
        if kept.is_empty() {
            return Err(PkgToolkitError::InvalidInput(
                "keep list is empty, nothing to upgrade".to_string(),
            ));
        }

        let seed: Vec<Package> = if all {
            if self.local.is_empty() {
                return Err(PkgToolkitError::InvalidInput(
                    "local package list is empty".to_string(),
                ));
            }
            self.local.iter().cloned().collect()
        } else {
            kept.iter()
                .filter_map(|name| self.local.find_by_name(name))
                .cloned()
                .collect()
        };

        let args = record_upgrades(&self.remote, seed.iter());
        if args.is_empty() {
            tracing::info!("nothing to upgrade");
            return Ok(InstallSummary::default());
        }
        self.install_inner(&args, false)
    }

    // --- keep bookkeeping ---

    /// What: Flag installed packages as user-requested.
    ///
    /// Output:
    /// - The names actually flagged; arguments that are not installed are
    ///   skipped with a warning.
    pub fn keep(&mut self, args: &[String]) -> Result<Vec<String>> {
        let mut flagged = Vec::new();
        for arg in args {
            match self.local.find_exact(arg) {
                Some(pkg) => {
                    self.db.set_keep(&pkg.name)?;
                    flagged.push(pkg.name.clone());
                }
                None => tracing::warn!("{arg} is not installed"),
            }
        }
        Ok(flagged)
    }

    /// Drop the keep flag from installed packages; the inverse of
    /// [`keep`](Self::keep).
    pub fn unkeep(&mut self, args: &[String]) -> Result<Vec<String>> {
        let mut unflagged = Vec::new();
        for arg in args {
            match self.local.find_exact(arg) {
                Some(pkg) => {
                    self.db.unset_keep(&pkg.name)?;
                    unflagged.push(pkg.name.clone());
                }
                None => tracing::warn!("{arg} is not installed"),
            }
        }
        Ok(unflagged)
    }

    /// Names of all kept packages.
    pub fn show_keep(&self) -> Result<Vec<String>> {
        self.db.kept_packages()
    }

    /// Keep list in its exchange format, one name per line.
    pub fn export_keep(&self) -> Result<Vec<String>> {
        self.db.kept_packages()
    }

    /// What: Install and keep-flag every package named in a file.
    ///
    /// Inputs:
    /// - `path`: File with one package name per line; blank lines and `#`
    ///   comments are skipped.
    pub fn import_keep(&mut self, path: &Path) -> Result<InstallSummary> {
        let content = fs::read_to_string(path)?;
        let args: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(ToString::to_string)
            .collect();
        if args.is_empty() {
            tracing::info!("nothing to import from {}", path.display());
            return Ok(InstallSummary::default());
        }
        self.install(&args)
    }

    // --- queries ---

    /// Installed packages, optionally filtered by remote status.
    #[must_use]
    pub fn list(&self, filter: Option<ListFilter>) -> Vec<PkgStatusEntry> {
        list_local(&self.local, &self.remote, filter)
    }

    /// Every remotely available package.
    #[must_use]
    pub fn avail(&self) -> Vec<PkgStatusEntry> {
        list_remote(&self.remote)
    }

    /// Remote packages matching a case-insensitive regex.
    pub fn search(&self, pattern: &str) -> Result<Vec<PkgStatusEntry>> {
        query::search(&self.remote, &self.local, pattern)
    }

    /// Direct dependency patterns of a remote package.
    pub fn show_direct_depends(&self, name: &str) -> Result<Vec<String>> {
        direct_deps(&self.db, &self.remote, name)
    }

    /// Full forward dependency tree of a remote package.
    pub fn show_full_dep_tree(&self, name: &str) -> Result<Vec<DepNode>> {
        full_dep_tree(
            &self.db,
            &self.local,
            &self.remote,
            &stem_of(name),
            DepDirection::RemoteForward,
        )
    }

    /// Full reverse dependency tree of an installed package.
    pub fn show_rev_dep_tree(&self, name: &str) -> Result<Vec<DepNode>> {
        full_dep_tree(
            &self.db,
            &self.local,
            &self.remote,
            &stem_of(name),
            DepDirection::LocalReverse,
        )
    }

    /// Delete every cached archive, returning the bytes freed.
    pub fn clean_cache(&self) -> Result<u64> {
        self.cache.clean()
    }
}

/// Reduce a user argument to a package name for tree display.
fn stem_of(arg: &str) -> String {
    if exact_pkgfmt(arg) {
        split_full(arg).map_or_else(|| arg.to_string(), |(name, _)| name.to_string())
    } else {
        arg.to_string()
    }
}

/// [`Confirm`] adapter honoring the assume-yes / assume-no flags before
/// delegating to the interactive seam.
struct FlaggedConfirm<'a> {
    assume_yes: bool,
    assume_no: bool,
    inner: &'a dyn Confirm,
}

impl Confirm for FlaggedConfirm<'_> {
    fn ask(&self, prompt: &str, default_yes: bool) -> bool {
        if self.assume_yes {
            return true;
        }
        if self.assume_no {
            return false;
        }
        self.inner.ask(prompt, default_yes)
    }
}
