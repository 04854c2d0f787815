//! npm range expressions.
//!
//! Grammar, per the node-semver tooling the registry ecosystem standardized
//! on:
//!
//! ```text
//! range-set  := range ( "||" range )*
//! range      := hyphen | simple ( " " simple )* | ""
//! hyphen     := partial " - " partial
//! simple     := [ ">" | ">=" | "<" | "<=" | "=" | "~" | "^" ] partial
//! partial    := xr ( "." xr ( "." xr [ "-" prerelease ] )? )?
//! xr         := "x" | "X" | "*" | number
//! ```
//!
//! Every `simple` desugars into at most two plain comparators over complete
//! versions, so matching is a conjunction of ordering checks per set and a
//! disjunction across sets.

use std::fmt;

use semver::{Prerelease, Version};

use super::version::cmp_precedence;

/// The range expression could not be parsed. Callers treat this as an
/// expected outcome and fall back to other interpretations of the
/// specifier, so it is a typed error rather than a fault.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid version range `{raw}`")]
pub struct InvalidRange {
    raw: String,
}

impl InvalidRange {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.trim().to_string(),
        }
    }
}

/// A parsed range: OR-composition of comparator sets.
#[derive(Debug, Clone)]
pub struct Range {
    sets: Vec<ComparatorSet>,
    raw: String,
}

impl Range {
    pub fn parse(input: &str) -> Result<Self, InvalidRange> {
        let mut sets = Vec::new();
        for alternative in input.split("||") {
            sets.push(ComparatorSet::parse(alternative).ok_or_else(|| InvalidRange::new(input))?);
        }
        Ok(Self {
            sets,
            raw: input.trim().to_string(),
        })
    }

    pub fn matches(&self, candidate: &Version) -> bool {
        self.sets.iter().any(|set| set.matches(candidate))
    }

    /// Convenience over `matches` for raw registry version strings; a
    /// string that is not a version matches nothing.
    pub fn matches_str(&self, candidate: &str) -> bool {
        super::version::parse_loose(candidate)
            .map(|version| self.matches(&version))
            .unwrap_or(false)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone)]
struct ComparatorSet {
    comparators: Vec<Comparator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    fn matches(&self, candidate: &Version) -> bool {
        let ord = cmp_precedence(candidate, &self.version);
        match self.op {
            Op::Eq => ord.is_eq(),
            Op::Gt => ord.is_gt(),
            Op::Ge => ord.is_ge(),
            Op::Lt => ord.is_lt(),
            Op::Le => ord.is_le(),
        }
    }
}

impl ComparatorSet {
    fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();

        // Hyphen ranges claim the whole set: `1.2.3 - 2`.
        if let Some((left, right)) = trimmed.split_once(" - ") {
            if right.contains(" - ") {
                return None;
            }
            return Self::parse_hyphen(left.trim(), right.trim());
        }

        let mut comparators = Vec::new();
        let raw_tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let mut tokens = Vec::new();
        let mut iter = raw_tokens.iter().peekable();
        while let Some(token) = iter.next() {
            // Loose form: operator separated from its version by whitespace.
            if matches!(*token, ">" | ">=" | "<" | "<=" | "=" | "~" | "^" | "~>") {
                tokens.push(format!("{}{}", token, iter.next()?));
            } else {
                tokens.push((*token).to_string());
            }
        }

        for token in &tokens {
            parse_simple(token, &mut comparators)?;
        }
        if comparators.is_empty() {
            // `*`, `x`, or an empty range: anything released qualifies.
            comparators.push(Comparator::new(Op::Ge, Version::new(0, 0, 0)));
        }
        Some(Self { comparators })
    }

    fn parse_hyphen(left: &str, right: &str) -> Option<Self> {
        let lo = parse_partial(left)?;
        let hi = parse_partial(right)?;
        let mut comparators = Vec::new();

        match (lo.major, lo.minor, lo.patch) {
            (None, _, _) => {}
            (Some(ma), None, _) => comparators.push(Comparator::new(Op::Ge, release(ma, 0, 0))),
            (Some(ma), Some(mi), None) => {
                comparators.push(Comparator::new(Op::Ge, release(ma, mi, 0)));
            }
            (Some(ma), Some(mi), Some(pa)) => {
                comparators.push(Comparator::new(Op::Ge, with_pre(ma, mi, pa, lo.pre)));
            }
        }
        match (hi.major, hi.minor, hi.patch) {
            (None, _, _) => {}
            (Some(ma), None, _) => {
                comparators.push(Comparator::new(Op::Lt, floor(bump(ma)?, 0, 0)));
            }
            (Some(ma), Some(mi), None) => {
                comparators.push(Comparator::new(Op::Lt, floor(ma, bump(mi)?, 0)));
            }
            (Some(ma), Some(mi), Some(pa)) => {
                comparators.push(Comparator::new(Op::Le, with_pre(ma, mi, pa, hi.pre)));
            }
        }
        if comparators.is_empty() {
            comparators.push(Comparator::new(Op::Ge, Version::new(0, 0, 0)));
        }
        Some(Self { comparators })
    }

    fn matches(&self, candidate: &Version) -> bool {
        if !self.comparators.iter().all(|c| c.matches(candidate)) {
            return false;
        }
        // Prerelease gating: a prerelease candidate only qualifies when some
        // comparator names a prerelease on the same [major, minor, patch]
        // tuple. `^1.2.3` must not drag in `1.9.0-beta`.
        if !candidate.pre.is_empty() {
            return self.comparators.iter().any(|c| {
                !c.version.pre.is_empty()
                    && c.version.major == candidate.major
                    && c.version.minor == candidate.minor
                    && c.version.patch == candidate.patch
            });
        }
        true
    }
}

/// A version with possibly-missing components, as written in a range.
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Option<Prerelease>,
}

fn parse_partial(token: &str) -> Option<Partial> {
    let mut s = token.trim();
    if let Some(rest) = s.strip_prefix('=') {
        s = rest;
    }
    if let Some(rest) = s.strip_prefix('v').or_else(|| s.strip_prefix('V')) {
        s = rest;
    }
    if s.is_empty() {
        return Some(Partial {
            major: None,
            minor: None,
            patch: None,
            pre: None,
        });
    }
    // Build metadata never affects matching.
    let s = match s.find('+') {
        Some(idx) => &s[..idx],
        None => s,
    };
    let (core, pre) = match s.find('-') {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };
    if core.is_empty() {
        return None;
    }

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return None;
    }
    let mut numbers = [None, None, None];
    for (idx, part) in parts.iter().enumerate() {
        if matches!(*part, "x" | "X" | "*") {
            // A wildcard truncates everything after it.
            break;
        }
        numbers[idx] = Some(part.parse::<u64>().ok()?);
    }

    let pre = match pre {
        Some(tag) if !tag.is_empty() => {
            // A prerelease only makes sense on a complete triple.
            if numbers[2].is_none() {
                return None;
            }
            Some(Prerelease::new(tag).ok()?)
        }
        Some(_) => return None,
        None => None,
    };

    Some(Partial {
        major: numbers[0],
        minor: numbers[1],
        patch: numbers[2],
        pre,
    })
}

/// Expand one `simple` into comparators.
fn parse_simple(token: &str, out: &mut Vec<Comparator>) -> Option<()> {
    let (op, rest) = if let Some(rest) = token.strip_prefix(">=") {
        (">=", rest)
    } else if let Some(rest) = token.strip_prefix("<=") {
        ("<=", rest)
    } else if let Some(rest) = token.strip_prefix("~>") {
        ("~", rest)
    } else if let Some(rest) = token.strip_prefix('>') {
        (">", rest)
    } else if let Some(rest) = token.strip_prefix('<') {
        ("<", rest)
    } else if let Some(rest) = token.strip_prefix('~') {
        ("~", rest)
    } else if let Some(rest) = token.strip_prefix('^') {
        ("^", rest)
    } else if let Some(rest) = token.strip_prefix('=') {
        ("=", rest)
    } else {
        ("", token)
    };

    let p = parse_partial(rest)?;
    let (ma, mi, pa) = (p.major, p.minor, p.patch);

    match op {
        "" | "=" => match (ma, mi, pa) {
            (None, _, _) => out.push(Comparator::new(Op::Ge, Version::new(0, 0, 0))),
            (Some(ma), None, _) => {
                out.push(Comparator::new(Op::Ge, release(ma, 0, 0)));
                out.push(Comparator::new(Op::Lt, floor(bump(ma)?, 0, 0)));
            }
            (Some(ma), Some(mi), None) => {
                out.push(Comparator::new(Op::Ge, release(ma, mi, 0)));
                out.push(Comparator::new(Op::Lt, floor(ma, bump(mi)?, 0)));
            }
            (Some(ma), Some(mi), Some(pa)) => {
                out.push(Comparator::new(Op::Eq, with_pre(ma, mi, pa, p.pre)));
            }
        },
        "~" => match (ma, mi, pa) {
            (None, _, _) => out.push(Comparator::new(Op::Ge, Version::new(0, 0, 0))),
            (Some(ma), None, _) => {
                out.push(Comparator::new(Op::Ge, release(ma, 0, 0)));
                out.push(Comparator::new(Op::Lt, floor(bump(ma)?, 0, 0)));
            }
            (Some(ma), Some(mi), None) => {
                out.push(Comparator::new(Op::Ge, release(ma, mi, 0)));
                out.push(Comparator::new(Op::Lt, floor(ma, bump(mi)?, 0)));
            }
            (Some(ma), Some(mi), Some(pa)) => {
                out.push(Comparator::new(Op::Ge, with_pre(ma, mi, pa, p.pre)));
                out.push(Comparator::new(Op::Lt, floor(ma, bump(mi)?, 0)));
            }
        },
        "^" => match (ma, mi, pa) {
            (None, _, _) => out.push(Comparator::new(Op::Ge, Version::new(0, 0, 0))),
            (Some(ma), None, _) => {
                out.push(Comparator::new(Op::Ge, release(ma, 0, 0)));
                out.push(Comparator::new(Op::Lt, floor(bump(ma)?, 0, 0)));
            }
            (Some(ma), Some(mi), None) => {
                out.push(Comparator::new(Op::Ge, release(ma, mi, 0)));
                if ma == 0 {
                    out.push(Comparator::new(Op::Lt, floor(0, bump(mi)?, 0)));
                } else {
                    out.push(Comparator::new(Op::Lt, floor(bump(ma)?, 0, 0)));
                }
            }
            (Some(ma), Some(mi), Some(pa)) => {
                out.push(Comparator::new(Op::Ge, with_pre(ma, mi, pa, p.pre)));
                if ma > 0 {
                    out.push(Comparator::new(Op::Lt, floor(bump(ma)?, 0, 0)));
                } else if mi > 0 {
                    out.push(Comparator::new(Op::Lt, floor(0, bump(mi)?, 0)));
                } else {
                    out.push(Comparator::new(Op::Lt, floor(0, 0, bump(pa)?)));
                }
            }
        },
        ">" => match (ma, mi, pa) {
            // `>*` can match nothing.
            (None, _, _) => out.push(Comparator::new(Op::Lt, floor(0, 0, 0))),
            // A release bound, not a `-0` floor: `>1` must not admit
            // `2.0.0-alpha` through the prerelease gate.
            (Some(ma), None, _) => out.push(Comparator::new(Op::Ge, release(bump(ma)?, 0, 0))),
            (Some(ma), Some(mi), None) => {
                out.push(Comparator::new(Op::Ge, release(ma, bump(mi)?, 0)));
            }
            (Some(ma), Some(mi), Some(pa)) => {
                out.push(Comparator::new(Op::Gt, with_pre(ma, mi, pa, p.pre)));
            }
        },
        ">=" => match (ma, mi, pa) {
            (None, _, _) => out.push(Comparator::new(Op::Ge, Version::new(0, 0, 0))),
            (Some(ma), None, _) => out.push(Comparator::new(Op::Ge, release(ma, 0, 0))),
            (Some(ma), Some(mi), None) => out.push(Comparator::new(Op::Ge, release(ma, mi, 0))),
            (Some(ma), Some(mi), Some(pa)) => {
                out.push(Comparator::new(Op::Ge, with_pre(ma, mi, pa, p.pre)));
            }
        },
        "<" => match (ma, mi, pa) {
            // `<*` can match nothing.
            (None, _, _) => out.push(Comparator::new(Op::Lt, floor(0, 0, 0))),
            (Some(ma), None, _) => out.push(Comparator::new(Op::Lt, floor(ma, 0, 0))),
            (Some(ma), Some(mi), None) => out.push(Comparator::new(Op::Lt, floor(ma, mi, 0))),
            (Some(ma), Some(mi), Some(pa)) => {
                out.push(Comparator::new(Op::Lt, with_pre(ma, mi, pa, p.pre)));
            }
        },
        "<=" => match (ma, mi, pa) {
            (None, _, _) => out.push(Comparator::new(Op::Ge, Version::new(0, 0, 0))),
            (Some(ma), None, _) => out.push(Comparator::new(Op::Lt, floor(bump(ma)?, 0, 0))),
            (Some(ma), Some(mi), None) => {
                out.push(Comparator::new(Op::Lt, floor(ma, bump(mi)?, 0)));
            }
            (Some(ma), Some(mi), Some(pa)) => {
                out.push(Comparator::new(Op::Le, with_pre(ma, mi, pa, p.pre)));
            }
        },
        _ => return None,
    }
    Some(())
}

fn release(major: u64, minor: u64, patch: u64) -> Version {
    Version::new(major, minor, patch)
}

/// Checked increment for range-supplied components. `^18446744073709551615`
/// has no representable upper bound, so it fails parsing instead of
/// overflowing.
fn bump(component: u64) -> Option<u64> {
    component.checked_add(1)
}

/// `X.Y.Z-0`: the smallest version on a triple, used for exclusive bounds
/// so that e.g. `<2.0.0-0` rejects `2.0.0-alpha`.
fn floor(major: u64, minor: u64, patch: u64) -> Version {
    let mut version = Version::new(major, minor, patch);
    version.pre = Prerelease::new("0").expect("`0` is a valid prerelease tag");
    version
}

fn with_pre(major: u64, minor: u64, patch: u64, pre: Option<Prerelease>) -> Version {
    let mut version = Version::new(major, minor, patch);
    if let Some(pre) = pre {
        version.pre = pre;
    }
    version
}
