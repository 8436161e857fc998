// crates/registry-core/src/validate.rs
// ============================================================================
// Module: Registry Validation
// Description: Field- and list-level validation rules for request bodies.
// Purpose: Reject malformed input before it reaches storage.
// Dependencies: semver, std::sync::OnceLock
// ============================================================================

//! ## Overview
//! Regexes are hand-rolled (no external regex crate) since every pattern
//! here is a simple anchored character class; compiling a full NFA engine
//! for `^[a-z][a-z0-9-]*$` would be overkill. Each check is a small,
//! independently testable function rather than a generic schema validator.

use std::collections::HashSet;
use std::hash::Hash;

use crate::model::ChecksumAlgorithm;

/// Maximum byte length for username / namespace / role names.
pub const NAME_MAX_LEN: usize = 32;

/// Maximum byte length for a package, label, or tag name.
pub const PACKAGE_NAME_MAX_LEN: usize = 32;

/// Maximum byte length for a free-form dependency spec string.
pub const DEPENDENCY_SPEC_MAX_LEN: usize = 40;

/// Maximum byte length for a namespace description / package version description.
pub const LONG_TEXT_MAX_LEN: usize = 131_072;

/// Maximum byte length for a homepage / repository / tarball URL field.
pub const URL_MAX_LEN: usize = 2048;

fn is_ascii_alpha(byte: u8) -> bool {
    byte.is_ascii_alphabetic()
}

fn is_ascii_alnum_or_dash(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-'
}

fn is_ascii_lower_alpha(byte: u8) -> bool {
    byte.is_ascii_lowercase()
}

fn is_ascii_lower_alnum_or_dash(byte: u8) -> bool {
    (byte.is_ascii_lowercase() || byte.is_ascii_digit()) || byte == b'-'
}

/// Validates a username, namespace name, or namespace role name:
/// `^[A-Za-z][A-Za-z0-9-]*$`, 1..=32 bytes.
#[must_use]
pub fn is_valid_identity_name(value: &str) -> bool {
    matches_pattern(value, NAME_MAX_LEN, is_ascii_alpha, is_ascii_alnum_or_dash)
}

/// Validates a package, label, or tag name: `^[a-z][a-z0-9-]*$`, 1..=32 bytes.
#[must_use]
pub fn is_valid_package_name(value: &str) -> bool {
    matches_pattern(
        value,
        PACKAGE_NAME_MAX_LEN,
        is_ascii_lower_alpha,
        is_ascii_lower_alnum_or_dash,
    )
}

fn matches_pattern(
    value: &str,
    max_len: usize,
    first: impl Fn(u8) -> bool,
    rest: impl Fn(u8) -> bool,
) -> bool {
    let bytes = value.as_bytes();

    if bytes.is_empty() || bytes.len() > max_len {
        return false;
    }

    if !first(bytes[0]) {
        return false;
    }

    bytes[1..].iter().all(|byte| rest(*byte))
}

/// Validates that a checksum hex string decodes to the algorithm's
/// required byte length.
#[must_use]
pub fn decode_checksum(algorithm: ChecksumAlgorithm, hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);

    for chunk in hex.as_bytes().chunks_exact(2) {
        let high = (chunk[0] as char).to_digit(16)?;
        let low = (chunk[1] as char).to_digit(16)?;
        bytes.push(((high << 4) | low) as u8);
    }

    if bytes.len() == algorithm.required_len() {
        Some(bytes)
    } else {
        None
    }
}

/// Parses a semantic version string, rejecting malformed or partial versions.
#[must_use]
pub fn parse_version(value: &str) -> Option<semver::Version> {
    semver::Version::parse(value).ok()
}

/// Finds the first value that appears twice in `items`, for "must not
/// repeat" validators (versions, tags, checksum algorithms, dependencies).
pub fn first_duplicate<'a, T, K>(items: impl IntoIterator<Item = &'a T>, key: impl Fn(&'a T) -> K) -> Option<K>
where
    K: Eq + Hash + Clone,
{
    let mut seen = HashSet::new();

    for item in items {
        let k = key(item);

        if !seen.insert(k.clone()) {
            return Some(k);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_name_accepts_leading_letter() {
        assert!(is_valid_identity_name("alex"));
        assert!(is_valid_identity_name("a-2"));
        assert!(!is_valid_identity_name("2alex"));
        assert!(!is_valid_identity_name(""));
        assert!(!is_valid_identity_name(&"a".repeat(33)));
    }

    #[test]
    fn package_name_rejects_uppercase() {
        assert!(is_valid_package_name("knot-cli"));
        assert!(!is_valid_package_name("Knot"));
        assert!(!is_valid_package_name("-knot"));
    }

    #[test]
    fn checksum_length_enforced_per_algorithm() {
        let good_sha256 = "a".repeat(64);
        assert!(decode_checksum(ChecksumAlgorithm::Sha256, &good_sha256).is_some());

        let wrong_len = "a".repeat(10);
        assert!(decode_checksum(ChecksumAlgorithm::Sha256, &wrong_len).is_none());
    }

    #[test]
    fn checksum_rejects_non_hex() {
        assert!(decode_checksum(ChecksumAlgorithm::Md5, "zz00000000000000000000000000000").is_none());
    }

    #[test]
    fn version_parses_semver() {
        assert!(parse_version("1.0.2").is_some());
        assert!(parse_version("2.15.3-alpha").is_some());
        assert!(parse_version("not-a-version").is_none());
    }

    #[test]
    fn first_duplicate_detects_repeats() {
        let versions = vec!["1.0.0".to_string(), "1.1.0".to_string(), "1.0.0".to_string()];
        let dup = first_duplicate(versions.iter(), |v| v.clone());
        assert_eq!(dup, Some("1.0.0".to_string()));
    }

    #[test]
    fn first_duplicate_none_when_unique() {
        let versions = vec!["1.0.0".to_string(), "1.1.0".to_string()];
        assert_eq!(first_duplicate(versions.iter(), |v| v.clone()), None);
    }
}
