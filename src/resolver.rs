//! Version resolution: interpret a user-supplied version specifier against
//! a registry document.
//!
//! The specifier grammars overlap (a dist-tag could be literally named
//! `all`), so the first matching rule wins, in this order: the `dist-tags`
//! and `all` literals, an exact version, a range, then a dist-tag lookup.
//! The ordering is a deliberate disambiguation policy, not an accident.

use crate::node_semver::{self, Range};
use crate::registry::RegistryDocument;

/// The versions a specifier selects. `designated` is true only when the
/// specifier unambiguously names one version: an exact version hit or a
/// dist-tag hit. A range that happens to match exactly one version is
/// still a listing, not a designation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    pub versions: Vec<String>,
    pub designated: bool,
}

impl ResolvedVersions {
    fn listing(versions: Vec<String>) -> Self {
        Self {
            versions,
            designated: false,
        }
    }

    fn designated(version: String) -> Self {
        Self {
            versions: vec![version],
            designated: true,
        }
    }

    fn none() -> Self {
        Self::listing(Vec::new())
    }
}

/// Resolve `spec` against `doc`. Never fails: version-specifier text is
/// adversarial user input, so unparseable specifiers degrade to "no match"
/// (an empty set) instead of an error.
pub fn resolve(spec: &str, doc: &RegistryDocument) -> ResolvedVersions {
    if spec == "dist-tags" {
        // Every version some tag points at, not the tag names. Several
        // tags may share a version; display dedups later.
        return ResolvedVersions::listing(doc.dist_tags.values().cloned().collect());
    }

    if spec == "all" {
        return ResolvedVersions::listing(doc.versions.keys().cloned().collect());
    }

    if node_semver::is_valid(spec) {
        if doc.versions.contains_key(spec) {
            return ResolvedVersions::designated(spec.to_string());
        }
        return ResolvedVersions::none();
    }

    if let Ok(range) = Range::parse(spec) {
        return ResolvedVersions::listing(
            doc.versions
                .keys()
                .filter(|version| range.matches_str(version))
                .cloned()
                .collect(),
        );
    }

    // Not a range either; the last interpretation is a dist-tag name.
    match doc.dist_tags.get(spec) {
        Some(version) => ResolvedVersions::designated(version.clone()),
        None => ResolvedVersions::none(),
    }
}
