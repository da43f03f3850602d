//! Impact construction: what a user request actually does to the system.
//!
//! Resolution turns user arguments into remote full names, expands their
//! dependency trees, and classifies every affected package as an install,
//! an upgrade, or nothing to do. Requirement and conflict checks run over
//! the finished impact set before anything is ordered or downloaded.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::db::CatalogDb;
use crate::deps::parse::{pkg_match, split_full};
use crate::deps::query::{DepDirection, full_dep_tree};
use crate::deps::version::dewey_cmp;
use crate::error::Result;
use crate::index::PkgList;
use crate::types::{DepNode, ImpactEntry, Package, PkgAction};

/// What: Resolve user arguments against the remote list.
///
/// Inputs:
/// - `remote`: Remote package list.
/// - `args`: User-supplied names, full names, or glob patterns.
///
/// Output:
/// - `(resolved, not_found)`: greatest-version full names for every argument
///   that matched, and the arguments that matched nothing.
#[must_use]
pub fn resolve_pkgargs(remote: &PkgList, args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut resolved = Vec::new();
    let mut not_found = Vec::new();

    for arg in args {
        let hit = if arg.contains(['{', '<', '>', '[', ']', '?', '*']) {
            remote.map_to_dep(arg).map(|p| p.full.clone())
        } else {
            remote.unique_pkg(arg)
        };
        match hit {
            Some(full) if !resolved.contains(&full) => resolved.push(full),
            Some(_) => {}
            None => {
                tracing::warn!("{arg} matches nothing in the remote catalog");
                not_found.push(arg.clone());
            }
        }
    }

    (resolved, not_found)
}

/// What: Build the impact set for a list of resolved full names.
///
/// Inputs:
/// - `db`: Catalog handle.
/// - `local`: Installed package list.
/// - `remote`: Remote package list.
/// - `pkgargs`: Remote full names to install, from [`resolve_pkgargs`].
/// - `force_reinstall`: Reinstall packages already at the requested version.
///
/// Output:
/// - One classified entry per affected package. Same-version and
///   newer-installed packages are classified as nothing-to-do and omitted;
///   dependencies that resolve to no remote package surface as
///   `UnmetReq` entries carrying the pattern.
///
/// Details:
/// - Requested packages sit at level 0, their dependency trees below them.
/// - Duplicates collapse into the earliest entry.
pub fn pkg_impact(
    db: &CatalogDb,
    local: &PkgList,
    remote: &PkgList,
    pkgargs: &[String],
    force_reinstall: bool,
) -> Result<Vec<ImpactEntry>> {
    let mut impact: Vec<ImpactEntry> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for full in pkgargs {
        let Some((stem, _)) = split_full(full) else {
            continue;
        };

        let mut nodes = vec![DepNode {
            depend: full.clone(),
            name: stem.to_string(),
            level: 0,
            keep: true,
        }];
        nodes.extend(full_dep_tree(db, local, remote, stem, DepDirection::RemoteForward)?);

        for node in nodes {
            let Some(pkg) = remote.map_to_dep(&node.depend) else {
                tracing::warn!("{} has no match in the remote catalog", node.depend);
                if seen.insert(node.depend.clone()) {
                    impact.push(unmet_entry(&node));
                }
                continue;
            };
            if seen.contains(&pkg.full) {
                continue;
            }
            if let Some(entry) = classify(local, pkg, &node, force_reinstall) {
                seen.insert(entry.full.clone());
                impact.push(entry);
            }
        }
    }

    Ok(impact)
}

/// Impact entry for a dependency pattern nothing satisfies.
fn unmet_entry(node: &DepNode) -> ImpactEntry {
    ImpactEntry {
        full: node.depend.clone(),
        name: node.name.clone(),
        version: String::new(),
        depend: node.depend.clone(),
        action: PkgAction::UnmetReq,
        old: None,
        old_size_pkg: -1,
        file_size: -1,
        size_pkg: 0,
        level: node.level,
        keep: node.keep,
    }
}

/// What: Classify one remote package against the installed set.
///
/// Output:
/// - `Some(entry)` for installs and upgrades; `None` when the installed
///   version is the same (unless force-reinstalling) or newer, since a
///   downgrade cannot be forced through this path.
fn classify(
    local: &PkgList,
    pkg: &Package,
    node: &DepNode,
    force_reinstall: bool,
) -> Option<ImpactEntry> {
    let (action, old, old_size_pkg) = match local.find_by_name(&pkg.name) {
        None => (PkgAction::ToInstall, None, -1),
        Some(installed) => match dewey_cmp(&pkg.version, &installed.version) {
            Ordering::Equal => {
                if force_reinstall {
                    (PkgAction::ToInstall, None, installed.size_pkg)
                } else {
                    return None;
                }
            }
            Ordering::Greater => (
                PkgAction::ToUpgrade,
                Some(installed.full.clone()),
                installed.size_pkg,
            ),
            Ordering::Less => return None,
        },
    };

    Some(ImpactEntry {
        full: pkg.full.clone(),
        name: pkg.name.clone(),
        version: pkg.version.clone(),
        depend: node.depend.clone(),
        action,
        old,
        old_size_pkg,
        file_size: pkg.file_size,
        size_pkg: pkg.size_pkg,
        level: node.level,
        keep: node.keep,
    })
}

/// What: Find the closest upgrade candidate for an installed package.
///
/// Inputs:
/// - `remote`: Remote package list.
/// - `name`: Package name without version.
/// - `installed_full`: Full name of the installed version.
///
/// Output:
/// - The remote full name sharing the longest byte-wise common prefix with
///   the installed full name among strictly newer candidates, or `None`
///   when the installed version is already greatest.
///
/// Details:
/// - Prefers `mysql-5.1.25` over `mysql-5.5.20` when `mysql-5.1.20` is
///   installed; ties keep the first candidate encountered.
#[must_use]
pub fn narrow_match(remote: &PkgList, name: &str, installed_full: &str) -> Option<String> {
    let (_, installed_version) = split_full(installed_full)?;
    let mut best: Option<&str> = None;
    let mut best_len = 0usize;

    for pkg in remote.iter().filter(|p| p.name == name) {
        if dewey_cmp(&pkg.version, installed_version) != Ordering::Greater {
            continue;
        }
        let shared = installed_full
            .bytes()
            .zip(pkg.full.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        if shared > best_len || best.is_none() {
            best_len = shared;
            best = Some(&pkg.full);
        }
    }

    best.map(ToString::to_string)
}

/// What: Seed an upgrade run with the closest candidate per package.
///
/// Inputs:
/// - `remote`: Remote package list.
/// - `seed`: Installed packages to consider (keep set or everything).
///
/// Output:
/// - Remote full names to feed into the install pipeline; packages already
///   at their greatest version contribute nothing.
#[must_use]
pub fn record_upgrades<'a>(
    remote: &PkgList,
    seed: impl IntoIterator<Item = &'a Package>,
) -> Vec<String> {
    seed.into_iter()
        .filter_map(|pkg| narrow_match(remote, &pkg.name, &pkg.full))
        .collect()
}

/// What: Installed packages matching a remote package's conflict patterns.
///
/// Output:
/// - The conflicting installed full names; empty means no conflicts.
pub fn pkg_conflicts(db: &CatalogDb, local: &PkgList, full: &str) -> Result<Vec<String>> {
    let mut conflicting = Vec::new();
    for pattern in db.remote_conflicts_of(full)? {
        for installed in local.iter() {
            if pkg_match(&pattern, &installed.full) {
                tracing::warn!("{full} conflicts with installed {}", installed.full);
                conflicting.push(installed.full.clone());
            }
        }
    }
    Ok(conflicting)
}

/// What: Check shared-object requirements across the whole impact set.
///
/// Inputs:
/// - `db`: Catalog handle.
/// - `local`: Installed package list.
/// - `impact`: Impact set; entries with unsatisfiable requirements are
///   reclassified as `UnmetReq` in place.
///
/// Output:
/// - `true` when every requirement is satisfiable.
///
/// Details:
/// - Providers are the installed packages that survive the operation (the
///   versions being replaced do not count) plus everything the operation
///   installs.
pub fn pkg_met_reqs(
    db: &CatalogDb,
    local: &PkgList,
    impact: &mut [ImpactEntry],
) -> Result<bool> {
    let replaced: HashSet<&str> = impact
        .iter()
        .filter_map(|e| e.old.as_deref())
        .collect();

    let mut provided: HashSet<String> = HashSet::new();
    for installed in local.iter() {
        if replaced.contains(installed.full.as_str()) {
            continue;
        }
        provided.extend(db.local_provides_of(&installed.full)?);
    }
    for entry in impact.iter() {
        if entry.action.needs_install() {
            provided.extend(db.remote_provides_of(&entry.full)?);
        }
    }

    let mut all_met = true;
    for entry in impact.iter_mut() {
        if !entry.action.needs_install() {
            continue;
        }
        for requirement in db.remote_requires_of(&entry.full)? {
            if !provided.contains(&requirement) {
                tracing::warn!("{} requires {requirement}, not satisfiable", entry.full);
                entry.action = PkgAction::UnmetReq;
                all_met = false;
                break;
            }
        }
    }

    Ok(all_met)
}
