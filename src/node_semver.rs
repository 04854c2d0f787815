//! Node-flavored semantic versioning.
//!
//! The npm world is looser than strict semver: bare `v` prefixes, partial
//! versions like `1.2`, and a range grammar with `||`, hyphen ranges,
//! x-ranges, tilde and caret operators. This module layers that behavior on
//! top of the `semver` crate: specifiers are normalized to strict versions
//! and comparator sets before any matching happens.

pub mod range;
pub mod version;

#[cfg(test)]
mod tests;

pub use range::{InvalidRange, Range};
pub use version::{compare, is_valid, parse_loose};
