use std::cmp::Ordering;

use super::*;

// === loose parsing ===

#[test]
fn parses_exact_versions() {
    assert_eq!(parse_loose("1.2.3").unwrap().to_string(), "1.2.3");
    assert_eq!(parse_loose("1.2.3-beta.1").unwrap().to_string(), "1.2.3-beta.1");
}

#[test]
fn parses_prefixed_versions() {
    assert_eq!(parse_loose("v1.2.3").unwrap().to_string(), "1.2.3");
    assert_eq!(parse_loose("=1.2.3").unwrap().to_string(), "1.2.3");
    assert_eq!(parse_loose(" = v1.2.3 ").unwrap().to_string(), "1.2.3");
}

#[test]
fn parses_partial_versions() {
    assert_eq!(parse_loose("1").unwrap().to_string(), "1.0.0");
    assert_eq!(parse_loose("1.2").unwrap().to_string(), "1.2.0");
    assert_eq!(parse_loose("1.2-beta").unwrap().to_string(), "1.2.0-beta");
}

#[test]
fn rejects_garbage() {
    assert!(parse_loose("").is_none());
    assert!(parse_loose("not-a-version").is_none());
    assert!(parse_loose("1.2.3.4").is_none());
}

#[test]
fn is_valid_accepts_exact_only() {
    assert!(is_valid("1.0.0"));
    assert!(is_valid("v1.0.0"));
    assert!(is_valid("1.0.0-rc.1"));
    assert!(!is_valid("1.0"));
    assert!(!is_valid(">=1.0.0"));
    assert!(!is_valid("latest"));
    assert!(!is_valid("1.x"));
}

// === comparison ===

#[test]
fn compare_orders_by_precedence() {
    assert_eq!(compare("1.0.0", "2.0.0"), Ordering::Less);
    assert_eq!(compare("1.10.0", "1.9.0"), Ordering::Greater);
    assert_eq!(compare("1.0.0", "1.0.0"), Ordering::Equal);
}

#[test]
fn compare_is_antisymmetric() {
    let versions = ["0.9.9", "1.0.0-alpha", "1.0.0-alpha.1", "1.0.0-beta", "1.0.0", "2.0.0"];
    for a in versions {
        for b in versions {
            assert_eq!(compare(a, b), compare(b, a).reverse(), "{a} vs {b}");
        }
    }
}

#[test]
fn compare_prerelease_precedence() {
    // Ordering chain from the semver spec.
    let chain = [
        "1.0.0-alpha",
        "1.0.0-alpha.1",
        "1.0.0-alpha.beta",
        "1.0.0-beta",
        "1.0.0-beta.2",
        "1.0.0-beta.11",
        "1.0.0-rc.1",
        "1.0.0",
    ];
    for pair in chain.windows(2) {
        assert_eq!(compare(pair[0], pair[1]), Ordering::Less, "{} < {}", pair[0], pair[1]);
    }
}

#[test]
fn compare_ignores_build_metadata() {
    assert_eq!(compare("1.0.0+build.1", "1.0.0+build.2"), Ordering::Equal);
}

// === range matching ===

fn satisfies(version: &str, range: &str) -> bool {
    Range::parse(range).unwrap().matches_str(version)
}

#[test]
fn comparator_sets_are_conjunctions() {
    assert!(satisfies("1.0.0", ">=1.0.0 <2.0.0"));
    assert!(satisfies("1.5.0", ">=1.0.0 <2.0.0"));
    assert!(!satisfies("0.9.0", ">=1.0.0 <2.0.0"));
    assert!(!satisfies("2.0.0", ">=1.0.0 <2.0.0"));
}

#[test]
fn or_composition() {
    assert!(satisfies("0.14.3", ">=5.0.0 <18.0.0 || 0.14.3"));
    assert!(satisfies("5.0.0", ">=5.0.0 <18.0.0 || 0.14.3"));
    assert!(!satisfies("18.0.0", ">=5.0.0 <18.0.0 || 0.14.3"));
}

#[test]
fn hyphen_ranges() {
    assert!(satisfies("1.2.3", "1.2.3 - 2.3.4"));
    assert!(satisfies("2.3.4", "1.2.3 - 2.3.4"));
    assert!(!satisfies("2.3.5", "1.2.3 - 2.3.4"));
    // Partial right side widens the upper bound.
    assert!(satisfies("2.9.9", "1.2.3 - 2"));
    assert!(!satisfies("3.0.0", "1.2.3 - 2"));
    assert!(satisfies("2.3.9", "1.2.3 - 2.3"));
    assert!(!satisfies("2.4.0", "1.2.3 - 2.3"));
}

#[test]
fn x_ranges() {
    assert!(satisfies("1.9.9", "1.x"));
    assert!(!satisfies("2.0.0", "1.x"));
    assert!(satisfies("1.2.9", "1.2.*"));
    assert!(!satisfies("1.3.0", "1.2.*"));
    assert!(satisfies("0.0.1", "*"));
    assert!(satisfies("99.99.99", ""));
}

#[test]
fn bare_partial_is_an_x_range() {
    assert!(satisfies("1.2.9", "1.2"));
    assert!(!satisfies("1.3.0", "1.2"));
    assert!(satisfies("1.9.0", "1"));
}

#[test]
fn tilde_ranges() {
    assert!(satisfies("1.2.3", "~1.2.3"));
    assert!(satisfies("1.2.9", "~1.2.3"));
    assert!(!satisfies("1.3.0", "~1.2.3"));
    assert!(satisfies("1.9.0", "~1"));
    assert!(!satisfies("2.0.0", "~1"));
}

#[test]
fn caret_ranges() {
    assert!(satisfies("1.9.9", "^1.2.3"));
    assert!(!satisfies("2.0.0", "^1.2.3"));
    assert!(!satisfies("1.2.2", "^1.2.3"));
    // The zero-major cases pin progressively tighter.
    assert!(satisfies("0.2.9", "^0.2.3"));
    assert!(!satisfies("0.3.0", "^0.2.3"));
    assert!(satisfies("0.0.3", "^0.0.3"));
    assert!(!satisfies("0.0.4", "^0.0.3"));
}

#[test]
fn operator_with_space_before_version() {
    assert!(satisfies("1.5.0", ">= 1.0.0"));
    assert!(satisfies("1.5.0", ">= 1.0.0 < 2.0.0"));
}

#[test]
fn partial_versions_in_primitives() {
    // `>1.2` excludes the whole 1.2.x line.
    assert!(!satisfies("1.2.9", ">1.2"));
    assert!(satisfies("1.3.0", ">1.2"));
    // `<=1.2` includes it.
    assert!(satisfies("1.2.9", "<=1.2"));
    assert!(!satisfies("1.3.0", "<=1.2"));
    assert!(!satisfies("1.2.0", "<1.2"));
}

#[test]
fn gt_partial_lower_bound_is_a_release() {
    // `>1` means `>=2.0.0`; a `-0` floor here would let prereleases on the
    // bound triple slip through the gate.
    assert!(satisfies("2.0.0", ">1"));
    assert!(!satisfies("2.0.0-alpha", ">1"));
    assert!(!satisfies("1.3.0-beta", ">1.2"));
}

#[test]
fn component_overflow_fails_parsing() {
    // u64::MAX has no representable successor for the upper bound.
    let max = "18446744073709551615";
    assert!(Range::parse(&format!("^{max}")).is_err());
    assert!(Range::parse(&format!("~{max}")).is_err());
    assert!(Range::parse(&format!(">{max}")).is_err());
    assert!(Range::parse(&format!("<={max}")).is_err());
    assert!(Range::parse(&format!("{max}")).is_err());
    assert!(Range::parse(&format!("1.0.0 - {max}")).is_err());
    assert!(Range::parse(&format!("^0.0.{max}")).is_err());
    // A complete triple needs no increment and stays valid.
    assert!(satisfies(&format!("{max}.0.0"), &format!(">={max}.0.0")));
}

#[test]
fn prerelease_gating() {
    // A prerelease is only eligible when the range names a prerelease on
    // the same triple.
    assert!(!satisfies("1.9.0-beta", "^1.2.3"));
    assert!(satisfies("1.2.4-beta", ">=1.2.4-alpha"));
    assert!(!satisfies("1.2.5-beta", ">=1.2.4-alpha"));
    assert!(!satisfies("1.0.0-beta", "*"));
}

#[test]
fn invalid_ranges_are_typed_errors() {
    assert!(Range::parse("latest").is_err());
    assert!(Range::parse("next").is_err());
    assert!(Range::parse("1.2.3.4").is_err());
    assert!(Range::parse(">=").is_err());
    assert!(Range::parse("not a range at all!").is_err());
}

#[test]
fn range_display_round_trips_raw_text() {
    let range = Range::parse(" >=1.0.0 <2.0.0 ").unwrap();
    assert_eq!(range.to_string(), ">=1.0.0 <2.0.0");
}
