//! Dewey version comparison for package versions.
//!
//! Versions are dot-separated numeric tokens with alphabetic modifiers
//! ordered `alpha < beta < pre < rc < release` and a trailing `nbN`
//! re-release number that only breaks ties between otherwise equal versions.

use std::cmp::Ordering;

/// Modifier weights; anything below zero sorts before the bare release.
const ALPHA: i64 = -4;
const BETA: i64 = -3;
const PRE: i64 = -2;
const RC: i64 = -1;

/// What: Split a version string into comparable tokens plus the `nbN` field.
///
/// Inputs:
/// - `version`: Version string, e.g. `5.1.25nb2` or `1.0rc3`.
///
/// Output:
/// - Returns the numeric token list and the `nb` value (`0` when absent).
///
/// Details:
/// - Digit runs become numeric tokens.
/// - `alpha`/`beta`/`pre`/`rc` become negative tokens so they sort before
///   the release; `pl` counts as zero.
/// - Any other letter becomes its alphabet position, so `1.0a < 1.0b`.
/// - `.`, `_` and `-` are separators and produce no token.
fn components(version: &str) -> (Vec<i64>, i64) {
    let bytes = version.as_bytes();
    let mut tokens = Vec::new();
    let mut nb = 0i64;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            tokens.push(version[start..i].parse::<i64>().unwrap_or(0));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let word = &version[start..i];
            let lower = word.to_ascii_lowercase();
            // "nb42" lexes as the word "nb" followed by digits
            if lower == "nb" && i < bytes.len() && bytes[i].is_ascii_digit() {
                let nb_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                nb = version[nb_start..i].parse::<i64>().unwrap_or(0);
                continue;
            }
            match lower.as_str() {
                "alpha" => tokens.push(ALPHA),
                "beta" => tokens.push(BETA),
                "pre" => tokens.push(PRE),
                "rc" => tokens.push(RC),
                "pl" => tokens.push(0),
                _ => {
                    for b in lower.bytes() {
                        tokens.push(i64::from(b - b'a') + 1);
                    }
                }
            }
        } else {
            // separators: '.', '_', '-'
            i += 1;
        }
    }

    (tokens, nb)
}

/// What: Compare two version strings using Dewey ordering.
///
/// Inputs:
/// - `a`: Left-hand version string.
/// - `b`: Right-hand version string.
///
/// Output:
/// - Returns `Ordering::Less` if `a < b`, `Equal` if equivalent, `Greater`
///   if `a > b`.
///
/// Details:
/// - Tokens are compared pairwise; missing tokens count as `0`, so
///   `1.0 == 1.0.0` and `1.0 > 1.0rc1` (the modifier token is negative).
/// - The `nbN` field is compared only when all tokens are equal.
///
/// # Example
///
/// ```
/// use pkgsrc_toolkit::deps::dewey_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(dewey_cmp("5.1.20", "5.1.25"), Ordering::Less);
/// assert_eq!(dewey_cmp("1.0", "1.0.0"), Ordering::Equal);
/// assert_eq!(dewey_cmp("1.0rc2", "1.0"), Ordering::Less);
/// assert_eq!(dewey_cmp("1.0nb2", "1.0nb1"), Ordering::Greater);
/// ```
#[must_use]
pub fn dewey_cmp(a: &str, b: &str) -> Ordering {
    let (a_tokens, a_nb) = components(a);
    let (b_tokens, b_nb) = components(b);
    let len = a_tokens.len().max(b_tokens.len());

    for idx in 0..len {
        let a_tok = a_tokens.get(idx).copied().unwrap_or(0);
        let b_tok = b_tokens.get(idx).copied().unwrap_or(0);
        match a_tok.cmp(&b_tok) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }

    a_nb.cmp(&b_nb)
}

/// What: Check if a version satisfies an inequality requirement.
///
/// Inputs:
/// - `version`: Version string to check, e.g. `1.2.3`.
/// - `requirement`: Operator plus version, e.g. `>=1.2`, `<2.0`, `=1.5`.
///
/// Output:
/// - Returns `true` if the version satisfies the requirement.
/// - Returns `true` for an empty or operator-less requirement.
///
/// # Example
///
/// ```
/// use pkgsrc_toolkit::deps::version_satisfies;
///
/// assert!(version_satisfies("2.0", ">=1.5"));
/// assert!(!version_satisfies("1.0", ">=1.5"));
/// assert!(version_satisfies("1.9", "<2.0"));
/// assert!(version_satisfies("1.5nb3", ">1.5"));
/// ```
#[must_use]
pub fn version_satisfies(version: &str, requirement: &str) -> bool {
    if requirement.is_empty() {
        return true;
    }

    let (op, req_version) = if let Some(rest) = requirement.strip_prefix(">=") {
        (">=", rest)
    } else if let Some(rest) = requirement.strip_prefix("<=") {
        ("<=", rest)
    } else if let Some(rest) = requirement.strip_prefix('=') {
        ("=", rest)
    } else if let Some(rest) = requirement.strip_prefix('>') {
        (">", rest)
    } else if let Some(rest) = requirement.strip_prefix('<') {
        ("<", rest)
    } else {
        return true;
    };

    let comparison = dewey_cmp(version, req_version);

    match op {
        ">=" => matches!(comparison, Ordering::Equal | Ordering::Greater),
        "<=" => matches!(comparison, Ordering::Equal | Ordering::Less),
        "=" => comparison == Ordering::Equal,
        ">" => comparison == Ordering::Greater,
        "<" => comparison == Ordering::Less,
        _ => true,
    }
}

/// What: Report which of two full package names carries the greater version.
///
/// Inputs:
/// - `first`: Full package name, e.g. `foo-1.1`.
/// - `second`: Full package name, e.g. `foo-1.0`.
///
/// Output:
/// - Returns `1` when `first`'s version is Dewey-greater, `2` otherwise.
/// - A side without a `-` loses; both missing returns `2`.
#[must_use]
pub fn version_check(first: &str, second: &str) -> u8 {
    let first_ver = first.rfind('-').map(|i| &first[i + 1..]);
    let second_ver = second.rfind('-').map(|i| &second[i + 1..]);

    match (first_ver, second_ver) {
        (None, _) => 2,
        (_, None) => 1,
        (Some(a), Some(b)) => {
            if dewey_cmp(a, b) == Ordering::Greater {
                1
            } else {
                2
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dewey_cmp_basic() {
        assert_eq!(dewey_cmp("1.0.0", "1.0.1"), Ordering::Less);
        assert_eq!(dewey_cmp("1.0.1", "1.0.0"), Ordering::Greater);
        assert_eq!(dewey_cmp("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(dewey_cmp("2.0", "1.9.9"), Ordering::Greater);
        assert_eq!(dewey_cmp("5.1.25", "5.5.20"), Ordering::Less);
    }

    #[test]
    fn dewey_cmp_missing_tokens_are_zero() {
        assert_eq!(dewey_cmp("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(dewey_cmp("1", "1.0.0"), Ordering::Equal);
        assert_eq!(dewey_cmp("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn dewey_cmp_modifiers_sort_before_release() {
        assert_eq!(dewey_cmp("1.0alpha1", "1.0beta1"), Ordering::Less);
        assert_eq!(dewey_cmp("1.0beta2", "1.0pre1"), Ordering::Less);
        assert_eq!(dewey_cmp("1.0pre1", "1.0rc1"), Ordering::Less);
        assert_eq!(dewey_cmp("1.0rc3", "1.0"), Ordering::Less);
        assert_eq!(dewey_cmp("1.0", "1.0alpha1"), Ordering::Greater);
    }

    #[test]
    fn dewey_cmp_letter_suffixes() {
        assert_eq!(dewey_cmp("1.0a", "1.0b"), Ordering::Less);
        assert_eq!(dewey_cmp("1.0", "1.0a"), Ordering::Less);
        assert_eq!(dewey_cmp("9.8za", "9.8z"), Ordering::Greater);
    }

    #[test]
    fn dewey_cmp_nb_breaks_ties_only() {
        assert_eq!(dewey_cmp("1.0nb1", "1.0"), Ordering::Greater);
        assert_eq!(dewey_cmp("1.0nb2", "1.0nb10"), Ordering::Less);
        // a greater base version wins regardless of nb
        assert_eq!(dewey_cmp("1.1", "1.0nb9"), Ordering::Greater);
    }

    #[test]
    fn version_satisfies_operators() {
        assert!(version_satisfies("2.0", ">=1.5"));
        assert!(version_satisfies("1.5", ">=1.5"));
        assert!(!version_satisfies("1.0", ">=1.5"));
        assert!(version_satisfies("1.4", "<1.5"));
        assert!(!version_satisfies("1.5", "<1.5"));
        assert!(version_satisfies("1.5", "<=1.5"));
        assert!(version_satisfies("1.6", ">1.5"));
        assert!(version_satisfies("1.5.0", "=1.5"));
        assert!(version_satisfies("1.5", ""));
        assert!(version_satisfies("1.5", "whatever"));
    }

    #[test]
    fn version_check_prefers_greater_dewey() {
        assert_eq!(version_check("foo-1.1", "foo-1.0"), 1);
        assert_eq!(version_check("foo-1.0", "foo-1.1"), 2);
        assert_eq!(version_check("foo-1.0", "foo-1.0"), 2);
        assert_eq!(version_check("foo", "foo-1.0"), 2);
        assert_eq!(version_check("foo-1.0", "foo"), 1);
        assert_eq!(version_check("foo", "bar"), 2);
    }
}
