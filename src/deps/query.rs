//! Transitive dependency expansion over the catalog.
//!
//! Expansion is breadth-first with one node per stem. Levels record the
//! depth at which a package was reached: in a forward tree, deeper
//! dependencies must be installed first; in a reverse tree, deeper
//! reverse-dependents must be removed first. When a stem is reached again
//! from a deeper parent its level is raised to `parent + 1` and re-relaxed,
//! so a dependency always sits at least one level below every dependent.

use std::collections::{HashMap, VecDeque};

use crate::db::CatalogDb;
use crate::deps::parse::{pkgname_from_depend, split_full};
use crate::error::Result;
use crate::index::PkgList;
use crate::types::DepNode;

/// Which catalog relation to walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepDirection {
    /// Dependencies of remote packages (install planning).
    RemoteForward,
    /// Dependencies of installed packages (orphan detection).
    LocalForward,
    /// Installed packages requiring the package (removal planning).
    LocalReverse,
}

/// Relaxation stops here; a well-formed catalog never gets close, so
/// reaching it means a dependency cycle.
const MAX_DEPTH: i32 = 512;

/// What: Expand the full dependency tree of a package name.
///
/// Inputs:
/// - `db`: Catalog handle.
/// - `local`: Installed list (resolves stems for the local directions).
/// - `remote`: Remote list (resolves stems for the forward direction).
/// - `root`: Package name without version.
/// - `direction`: Relation to walk.
///
/// Output:
/// - All transitive dependencies (or reverse-dependents) of `root`, levels
///   starting at 1. The root itself is not included.
///
/// Details:
/// - Forward nodes carry the raw dependency pattern in `depend`; reverse
///   nodes carry the full name of the reverse-dependent.
/// - Dedup is by stem; a node reached again from a deeper parent has its
///   level raised and its children re-relaxed.
pub fn full_dep_tree(
    db: &CatalogDb,
    local: &PkgList,
    remote: &PkgList,
    root: &str,
    direction: DepDirection,
) -> Result<Vec<DepNode>> {
    let mut nodes: Vec<DepNode> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut queue: VecDeque<(String, i32)> = VecDeque::new();
    queue.push_back((root.to_string(), 0));

    while let Some((stem, level)) = queue.pop_front() {
        let children = children_of(db, local, remote, &stem, direction)?;

        for (child_stem, depend) in children {
            if child_stem == root {
                continue;
            }
            let child_level = level + 1;
            match index.get(child_stem.as_str()) {
                Some(&i) => {
                    if nodes[i].level < child_level && child_level <= MAX_DEPTH {
                        nodes[i].level = child_level;
                        queue.push_back((child_stem, child_level));
                    } else if child_level > MAX_DEPTH {
                        tracing::warn!(
                            "dependency cycle around {child_stem}, keeping level {}",
                            nodes[i].level
                        );
                    }
                }
                None => {
                    index.insert(child_stem.clone(), nodes.len());
                    nodes.push(DepNode {
                        depend,
                        name: child_stem.clone(),
                        level: child_level,
                        keep: false,
                    });
                    queue.push_back((child_stem, child_level));
                }
            }
        }
    }

    tracing::debug!(
        "{root}: {} transitive {} found",
        nodes.len(),
        match direction {
            DepDirection::LocalReverse => "reverse dependencies",
            _ => "dependencies",
        }
    );
    Ok(nodes)
}

/// Immediate children of a stem as `(stem, depend)` pairs.
fn children_of(
    db: &CatalogDb,
    local: &PkgList,
    remote: &PkgList,
    stem: &str,
    direction: DepDirection,
) -> Result<Vec<(String, String)>> {
    match direction {
        DepDirection::RemoteForward | DepDirection::LocalForward => {
            let list = if direction == DepDirection::RemoteForward {
                remote
            } else {
                local
            };
            let Some(pkg) = list.find_by_name(stem) else {
                return Ok(Vec::new());
            };
            let patterns = if direction == DepDirection::RemoteForward {
                db.remote_deps_of(&pkg.full)?
            } else {
                db.local_deps_of(&pkg.full)?
            };
            Ok(patterns
                .into_iter()
                .filter_map(|pattern| {
                    pkgname_from_depend(&pattern).map(|child| (child, pattern))
                })
                .collect())
        }
        DepDirection::LocalReverse => Ok(db
            .local_reverse_deps(stem)?
            .into_iter()
            .filter_map(|full| {
                split_full(&full).map(|(name, _)| (name.to_string(), full.clone()))
            })
            .collect()),
    }
}

/// What: Direct dependency patterns of the greatest remote version.
///
/// Inputs:
/// - `db`: Catalog handle.
/// - `remote`: Remote list.
/// - `name`: Package name or full name.
///
/// Output:
/// - The raw dependency patterns, or `NotFound` when the remote list has no
///   match for the argument.
pub fn direct_deps(db: &CatalogDb, remote: &PkgList, name: &str) -> Result<Vec<String>> {
    let full = remote
        .unique_pkg(name)
        .ok_or(crate::error::PkgToolkitError::NotFound)?;
    db.remote_deps_of(&full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Package;
    use tempfile::tempdir;

    fn pkg(full: &str) -> Package {
        Package::new(full, "a package", 100, 200).unwrap()
    }

    /// foo-1.0 -> bar>=2.0 -> baz>=3.0, and foo also needs baz directly.
    fn forward_catalog(dir: &tempfile::TempDir) -> (CatalogDb, PkgList) {
        let db = CatalogDb::open_at(&dir.path().join("catalog.db")).unwrap();
        for full in ["foo-1.0", "bar-2.0", "baz-3.0"] {
            db.insert_remote_pkg(&pkg(full), "http://repo").unwrap();
        }
        db.add_remote_dep("foo-1.0", "bar>=2.0").unwrap();
        db.add_remote_dep("foo-1.0", "baz>=3.0").unwrap();
        db.add_remote_dep("bar-2.0", "baz>=3.0").unwrap();
        let remote = PkgList::new(vec![pkg("foo-1.0"), pkg("bar-2.0"), pkg("baz-3.0")]);
        (db, remote)
    }

    #[test]
    fn forward_tree_assigns_levels_below_dependents() {
        let dir = tempdir().unwrap();
        let (db, remote) = forward_catalog(&dir);
        let tree =
            full_dep_tree(&db, &PkgList::empty(), &remote, "foo", DepDirection::RemoteForward)
                .unwrap();

        assert_eq!(tree.len(), 2);
        let bar = tree.iter().find(|n| n.name == "bar").unwrap();
        let baz = tree.iter().find(|n| n.name == "baz").unwrap();
        assert_eq!(bar.level, 1);
        // baz is both a direct dep (level 1) and a dep of bar; the deeper
        // position wins so it installs before bar
        assert_eq!(baz.level, 2);
        assert_eq!(bar.depend, "bar>=2.0");
    }

    #[test]
    fn forward_tree_of_leaf_is_empty() {
        let dir = tempdir().unwrap();
        let (db, remote) = forward_catalog(&dir);
        let tree =
            full_dep_tree(&db, &PkgList::empty(), &remote, "baz", DepDirection::RemoteForward)
                .unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn reverse_tree_walks_requirers() {
        let dir = tempdir().unwrap();
        let db = CatalogDb::open_at(&dir.path().join("catalog.db")).unwrap();
        // app-b -> app-a -> libqux
        db.add_local_reverse_dep("libqux", "app-a-1.0").unwrap();
        db.add_local_reverse_dep("app-a", "app-b-1.0").unwrap();
        let local = PkgList::new(vec![pkg("libqux-1.0"), pkg("app-a-1.0"), pkg("app-b-1.0")]);

        let tree = full_dep_tree(
            &db,
            &local,
            &PkgList::empty(),
            "libqux",
            DepDirection::LocalReverse,
        )
        .unwrap();

        assert_eq!(tree.len(), 2);
        let app_a = tree.iter().find(|n| n.name == "app-a").unwrap();
        let app_b = tree.iter().find(|n| n.name == "app-b").unwrap();
        assert_eq!(app_a.level, 1);
        assert_eq!(app_b.level, 2);
        assert_eq!(app_a.depend, "app-a-1.0");
        assert_eq!(app_b.depend, "app-b-1.0");
    }

    #[test]
    fn cyclic_catalog_terminates() {
        let dir = tempdir().unwrap();
        let db = CatalogDb::open_at(&dir.path().join("catalog.db")).unwrap();
        db.insert_remote_pkg(&pkg("ping-1.0"), "http://repo").unwrap();
        db.insert_remote_pkg(&pkg("pong-1.0"), "http://repo").unwrap();
        db.add_remote_dep("ping-1.0", "pong>=1.0").unwrap();
        db.add_remote_dep("pong-1.0", "ping>=1.0").unwrap();
        let remote = PkgList::new(vec![pkg("ping-1.0"), pkg("pong-1.0")]);

        let tree =
            full_dep_tree(&db, &PkgList::empty(), &remote, "ping", DepDirection::RemoteForward)
                .unwrap();
        // the back-edge to the root is dropped and the walk terminates
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "pong");
    }

    #[test]
    fn direct_deps_resolves_the_argument() {
        let dir = tempdir().unwrap();
        let (db, remote) = forward_catalog(&dir);
        let deps = direct_deps(&db, &remote, "foo").unwrap();
        assert_eq!(deps, vec!["bar>=2.0", "baz>=3.0"]);
        assert!(direct_deps(&db, &remote, "nosuch").is_err());
    }
}
