//! Level-ordered scheduling of installs and removals.
//!
//! Ordering is a stable sort on the level recorded during dependency
//! expansion. Installs run deepest-first so every dependency is on disk
//! before its dependents; removals run shallowest-first (the users of a
//! library go before the library). Nodes whose archive is unavailable
//! (`file_size == -1`) are never emitted.

use crate::types::{Computed, DepNode, ImpactEntry, PkgStep};

/// What: Order the impact set for installation.
///
/// Inputs:
/// - `impact`: Classified impact set.
///
/// Output:
/// - Steps for every install and upgrade entry with an available archive,
///   sorted by descending level; ties keep insertion order. All steps are
///   stamped `Computed::ToInstall`.
#[must_use]
pub fn order_install(impact: &[ImpactEntry]) -> Vec<PkgStep> {
    let mut steps: Vec<PkgStep> = impact
        .iter()
        .filter(|e| e.action.needs_install() && e.file_size != -1)
        .map(|e| PkgStep {
            full: e.full.clone(),
            level: e.level,
            computed: Computed::ToInstall,
            file_size: e.file_size,
        })
        .collect();
    steps.sort_by_key(|s| std::cmp::Reverse(s.level));
    steps
}

/// What: Order the removals that must precede an upgrade pass.
///
/// Inputs:
/// - `impact`: Classified impact set.
///
/// Output:
/// - One step per upgrade entry carrying the full name of the installed
///   version being replaced (`Computed::ToUpgrade`), plus one per removal
///   entry (`Computed::ToRemove`), sorted by ascending level so the
///   shallowest packages disappear first.
#[must_use]
pub fn order_upgrade_remove(impact: &[ImpactEntry]) -> Vec<PkgStep> {
    let mut steps: Vec<PkgStep> = impact
        .iter()
        .filter_map(|e| match e.action {
            crate::types::PkgAction::ToUpgrade => e.old.as_ref().map(|old| PkgStep {
                full: old.clone(),
                level: e.level,
                computed: Computed::ToUpgrade,
                file_size: e.file_size,
            }),
            crate::types::PkgAction::ToRemove => Some(PkgStep {
                full: e.full.clone(),
                level: e.level,
                computed: Computed::ToRemove,
                file_size: e.file_size,
            }),
            _ => None,
        })
        .collect();
    steps.sort_by_key(|s| s.level);
    steps
}

/// What: Order a reverse-dependency tree for the standalone remove command.
///
/// Inputs:
/// - `tree`: Reverse-dependency nodes plus the requested roots; roots carry
///   level `0`, or `-1` for the first root so it trails everything.
///
/// Output:
/// - Steps sorted by descending level: the furthest reverse-dependents come
///   first and the `-1` root comes last.
#[must_use]
pub fn order_remove(tree: &[DepNode]) -> Vec<PkgStep> {
    let mut steps: Vec<PkgStep> = tree
        .iter()
        .map(|n| PkgStep {
            full: n.depend.clone(),
            level: n.level,
            computed: Computed::ToRemove,
            file_size: 0,
        })
        .collect();
    steps.sort_by_key(|s| std::cmp::Reverse(s.level));
    steps
}
