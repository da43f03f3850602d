//! Dependency-pattern parsing and matching.
//!
//! Dependency expressions come in a handful of shapes: exact full names
//! (`foo-1.0`), inequalities (`foo>=1.0<2.0`), character-class globs
//! (`foo-[0-9]*`) and braced alternation (`{foo>=1.0,bar-[0-9]*}`, possibly
//! mid-stem). Patterns parse into a [`DependPattern`] that exposes the stem
//! and a `satisfies` check instead of being string-surgered at every use.

use glob::Pattern as GlobPattern;

use crate::deps::version::dewey_cmp;
use crate::error::{PkgToolkitError, Result};

/// Inequality operator inside a Dewey pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeweyOp {
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `<`
    Lt,
}

impl DeweyOp {
    /// True when `version` stands in this relation to `bound`.
    #[must_use]
    pub fn holds(self, version: &str, bound: &str) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        let ord = dewey_cmp(version, bound);
        match self {
            Self::Ge => matches!(ord, Equal | Greater),
            Self::Gt => ord == Greater,
            Self::Le => matches!(ord, Equal | Less),
            Self::Lt => ord == Less,
        }
    }
}

/// Parsed form of a dependency expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DependPattern {
    /// Exact full name, e.g. `foo-1.0`.
    Exact(String),
    /// Shell-style glob over the full name, e.g. `foo-[0-9]*`.
    Glob(String),
    /// Stem plus one or two version bounds, e.g. `foo>=1.0<2.0`.
    Dewey {
        /// Package name the bounds apply to.
        stem: String,
        /// Bounds, checked conjunctively.
        bounds: Vec<(DeweyOp, String)>,
    },
    /// Braced alternation, satisfied by any branch.
    Any(Vec<DependPattern>),
}

impl DependPattern {
    /// What: Parse a dependency expression.
    ///
    /// Inputs:
    /// - `pattern`: Raw dependency string.
    ///
    /// Output:
    /// - Returns the parsed pattern, or `Parse` on malformed input (empty
    ///   string, unbalanced braces, inequality without a version).
    ///
    /// Details:
    /// - Braces are expanded first, so `foo{-bar,-baz}>=1.0` becomes the
    ///   alternation of `foo-bar>=1.0` and `foo-baz>=1.0`.
    /// - A branch containing `<`/`>` parses as Dewey bounds; one containing
    ///   `*`, `?` or `[` parses as a glob; anything else is exact.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(PkgToolkitError::Parse(
                "empty dependency pattern".to_string(),
            ));
        }

        if pattern.contains('{') {
            let branches = expand_braces(pattern)?;
            if branches.len() == 1 && branches[0] == pattern {
                // no expansion happened; fall through to the plain parser
            } else {
                let parsed = branches
                    .iter()
                    .map(|b| Self::parse(b))
                    .collect::<Result<Vec<_>>>()?;
                return Ok(Self::Any(parsed));
            }
        }

        if let Some(pos) = pattern.find(['<', '>']) {
            let stem = pattern[..pos].to_string();
            if stem.is_empty() {
                return Err(PkgToolkitError::Parse(format!(
                    "dependency pattern {pattern} has no package name"
                )));
            }
            let bounds = parse_bounds(&pattern[pos..])?;
            return Ok(Self::Dewey { stem, bounds });
        }

        if pattern.contains(['*', '?', '[']) {
            return Ok(Self::Glob(pattern.to_string()));
        }

        Ok(Self::Exact(pattern.to_string()))
    }

    /// What: Reduce the pattern to the package name it constrains.
    ///
    /// Output:
    /// - The stem of the first branch for alternations; the lossy
    ///   metacharacter reduction for globs; the name part for exact names.
    #[must_use]
    pub fn stem(&self) -> String {
        match self {
            Self::Exact(full) => split_full(full)
                .map_or_else(|| full.clone(), |(name, _)| name.to_string()),
            Self::Glob(pattern) => {
                pkgname_from_depend(pattern).unwrap_or_else(|| pattern.clone())
            }
            Self::Dewey { stem, .. } => stem.clone(),
            Self::Any(branches) => branches
                .first()
                .map_or_else(String::new, DependPattern::stem),
        }
    }

    /// What: Check whether a full package name satisfies the pattern.
    ///
    /// Inputs:
    /// - `full`: Candidate full name, e.g. `foo-1.2nb1`.
    ///
    /// Output:
    /// - Returns `true` on a match. Dewey branches require the stem to match
    ///   exactly and every bound to hold.
    #[must_use]
    pub fn satisfies(&self, full: &str) -> bool {
        match self {
            Self::Exact(pattern) => pattern == full,
            Self::Glob(pattern) => GlobPattern::new(pattern)
                .map(|g| g.matches(full))
                .unwrap_or(false),
            Self::Dewey { stem, bounds } => match split_full(full) {
                Some((name, version)) => {
                    name == stem && bounds.iter().all(|(op, bound)| op.holds(version, bound))
                }
                None => false,
            },
            Self::Any(branches) => branches.iter().any(|b| b.satisfies(full)),
        }
    }
}

/// Parse a run of `>=`/`>`/`<=`/`<` bounds, e.g. `>=1.0<2.0`.
fn parse_bounds(mut rest: &str) -> Result<Vec<(DeweyOp, String)>> {
    let mut bounds = Vec::new();

    while !rest.is_empty() {
        let (op, after) = if let Some(r) = rest.strip_prefix(">=") {
            (DeweyOp::Ge, r)
        } else if let Some(r) = rest.strip_prefix("<=") {
            (DeweyOp::Le, r)
        } else if let Some(r) = rest.strip_prefix('>') {
            (DeweyOp::Gt, r)
        } else if let Some(r) = rest.strip_prefix('<') {
            (DeweyOp::Lt, r)
        } else {
            return Err(PkgToolkitError::Parse(format!(
                "expected version bound at {rest}"
            )));
        };

        let end = after.find(['<', '>']).unwrap_or(after.len());
        let version = &after[..end];
        if version.is_empty() {
            return Err(PkgToolkitError::Parse(
                "version bound without a version".to_string(),
            ));
        }
        bounds.push((op, version.to_string()));
        rest = &after[end..];
    }

    Ok(bounds)
}

/// What: Expand one level of brace alternation.
///
/// Inputs:
/// - `pattern`: String possibly containing `{a,b}` groups.
///
/// Output:
/// - Every combination with the first group substituted, recursively
///   expanded, or `Parse` on unbalanced braces.
fn expand_braces(pattern: &str) -> Result<Vec<String>> {
    let Some(open) = pattern.find('{') else {
        return Ok(vec![pattern.to_string()]);
    };

    let bytes = pattern.as_bytes();
    let mut depth = 0usize;
    let mut close = None;
    let mut commas = Vec::new();
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            b',' if depth == 1 => commas.push(i),
            _ => {}
        }
    }
    let close = close.ok_or_else(|| {
        PkgToolkitError::Parse(format!("unbalanced braces in pattern {pattern}"))
    })?;

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut starts = vec![open + 1];
    starts.extend(commas.iter().map(|&c| c + 1));
    let mut ends: Vec<usize> = commas.clone();
    ends.push(close);

    let mut expanded = Vec::new();
    for (&start, &end) in starts.iter().zip(ends.iter()) {
        let candidate = format!("{prefix}{}{suffix}", &pattern[start..end]);
        expanded.extend(expand_braces(&candidate)?);
    }
    Ok(expanded)
}

/// What: Check a dependency expression against a candidate full name.
///
/// Inputs:
/// - `pattern`: Raw dependency string.
/// - `full`: Candidate full name.
///
/// Output:
/// - Returns `true` on a match; malformed patterns never match.
///
/// # Example
///
/// ```
/// use pkgsrc_toolkit::deps::pkg_match;
///
/// assert!(pkg_match("foo>=1.0", "foo-1.2"));
/// assert!(pkg_match("foo-[0-9]*", "foo-2.0nb1"));
/// assert!(pkg_match("{foo>=1.0,bar>=2.0}", "bar-2.1"));
/// assert!(!pkg_match("foo<1.0", "foo-1.2"));
/// ```
#[must_use]
pub fn pkg_match(pattern: &str, full: &str) -> bool {
    DependPattern::parse(pattern)
        .map(|p| p.satisfies(full))
        .unwrap_or(false)
}

/// What: Detect whether an argument is a full `name-version` form.
///
/// Output:
/// - Returns `true` iff the character after the last `-` is a decimal digit.
///   `foo-100bar` is accepted; only a few packages need full specification.
#[must_use]
pub fn exact_pkgfmt(name: &str) -> bool {
    name.rfind('-')
        .and_then(|i| name[i + 1..].chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// What: Split a full package name into stem and version.
///
/// Output:
/// - Returns `Some((stem, version))` on the last `-` whose suffix starts
///   with a digit; `None` when no such split exists.
#[must_use]
pub fn split_full(full: &str) -> Option<(&str, &str)> {
    for (i, _) in full.match_indices('-').rev() {
        let suffix = &full[i + 1..];
        if suffix.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Some((&full[..i], suffix));
        }
    }
    None
}

/// What: Reduce a dependency expression to a bare package name.
///
/// Inputs:
/// - `depend`: Raw dependency string.
///
/// Output:
/// - Returns the stem, or `None` for an empty input.
///
/// Details:
/// - A leading braced alternation keeps its first branch.
/// - The string is cut at the first of `{<>[]?*`, a trailing `-` left by the
///   cut is dropped, and a trailing `-N.N…` version (detected by a `.` in
///   the suffix) is stripped.
/// - Idempotent: reducing a reduced name is a no-op.
///
/// # Example
///
/// ```
/// use pkgsrc_toolkit::deps::pkgname_from_depend;
///
/// assert_eq!(pkgname_from_depend("foo>=1.0"), Some("foo".to_string()));
/// assert_eq!(pkgname_from_depend("foo-[0-9]*"), Some("foo".to_string()));
/// assert_eq!(pkgname_from_depend("foo-1.0"), Some("foo".to_string()));
/// assert_eq!(pkgname_from_depend("foo"), Some("foo".to_string()));
/// ```
#[must_use]
pub fn pkgname_from_depend(depend: &str) -> Option<String> {
    if depend.is_empty() {
        return None;
    }

    // worst case, {foo>=1.0,bar-[0-9]*}: keep the first branch
    let mut name = if let Some(inner) = depend.strip_prefix('{') {
        let inner = inner.rfind('}').map_or(inner, |i| &inner[..i]);
        inner.split(',').next().unwrap_or(inner).to_string()
    } else {
        depend.to_string()
    };

    // classic case, foo-[<>{?*[]
    if let Some(cut) = name.find(['{', '<', '>', '[', ']', '?', '*']) {
        name.truncate(cut);
        if name.ends_with('-') {
            name.pop();
        }
    }

    // only foo-1.0 should remain
    if let Some(dash) = name.rfind('-')
        && name[dash..].contains('.')
    {
        name.truncate(dash);
    }

    Some(name)
}
