//! Loose version parsing and precedence comparison.

use std::cmp::Ordering;

use semver::Version;

/// Parse a version string the way npm tooling does: surrounding whitespace,
/// a leading `=` and/or `v`, and partial versions (`1`, `1.2`) are all
/// tolerated. Returns `None` when the string is not a version at all.
pub fn parse_loose(input: &str) -> Option<Version> {
    let mut s = input.trim();
    while let Some(rest) = s.strip_prefix('=') {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_prefix('v').or_else(|| s.strip_prefix('V')) {
        s = rest;
    }
    if s.is_empty() {
        return None;
    }
    if let Ok(version) = Version::parse(s) {
        return Some(version);
    }

    // Partial versions are missing minor or patch components. Split off any
    // prerelease/build suffix first so `1.2-beta` normalizes to `1.2.0-beta`.
    let (core, suffix) = match s.find(['-', '+']) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    };
    let parts: Vec<&str> = core.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0{}", parts[0], suffix),
        2 => format!("{}.{}.0{}", parts[0], parts[1], suffix),
        _ => return None,
    };
    Version::parse(&normalized).ok()
}

/// True iff `input` is an exact (non-range) semantic version.
pub fn is_valid(input: &str) -> bool {
    let mut s = input.trim();
    if let Some(rest) = s.strip_prefix('=') {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_prefix('v') {
        s = rest;
    }
    Version::parse(s).is_ok()
}

/// Semver precedence: major, minor, patch, then prerelease. Build metadata
/// never participates, which is why this exists instead of `Version::cmp`.
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| match (a.pre.is_empty(), b.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            // A release outranks any of its prereleases.
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.pre.cmp(&b.pre),
        })
}

/// Total-order comparison over version strings, for sorting display lists.
/// Unparseable strings sort below every real version, ordered lexically
/// among themselves so the order stays stable.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_loose(a), parse_loose(b)) {
        (Some(va), Some(vb)) => cmp_precedence(&va, &vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}
