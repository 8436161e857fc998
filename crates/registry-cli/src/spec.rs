// crates/registry-cli/src/spec.rs
// ============================================================================
// Module: Package Spec
// Description: Parses a `pkg`, `pkg:version`, or `pkg@tag` command-line argument.
// Purpose: Let `knot info`/`knot download`/`knot unpublish` accept one compact
//          string for "this package at this version".
// Dependencies: registry-core
// ============================================================================

use registry_core::validate;

/// What a package spec pins to, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// No version or tag given; the latest version.
    Latest,
    /// An exact semantic version, taken from `pkg:version`.
    Version(String),
    /// A tag name, taken from `pkg@tag`.
    Tag(String),
}

/// A parsed `pkg`, `pkg:version`, or `pkg@tag` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// The package name.
    pub package: String,
    /// What version of it was requested.
    pub selector: VersionSelector,
}

impl PackageSpec {
    /// Parses a spec string, preferring `:version` over `@tag` when both
    /// separators are present, and requiring the right-hand side of `:` to
    /// be a valid semantic version.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        if let Some((package, version)) = spec.rsplit_once(':') {
            if validate::parse_version(version).is_some() {
                return Self {
                    package: package.to_string(),
                    selector: VersionSelector::Version(version.to_string()),
                };
            }
        }

        if let Some((package, tag)) = spec.rsplit_once('@') {
            return Self {
                package: package.to_string(),
                selector: VersionSelector::Tag(tag.to_string()),
            };
        }

        Self {
            package: spec.to_string(),
            selector: VersionSelector::Latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_has_no_selector() {
        let spec = PackageSpec::parse("knot-cli");
        assert_eq!(spec.package, "knot-cli");
        assert_eq!(spec.selector, VersionSelector::Latest);
    }

    #[test]
    fn colon_suffix_parses_as_version() {
        let spec = PackageSpec::parse("knot-cli:1.2.3");
        assert_eq!(spec.package, "knot-cli");
        assert_eq!(spec.selector, VersionSelector::Version("1.2.3".to_string()));
    }

    #[test]
    fn at_suffix_parses_as_tag() {
        let spec = PackageSpec::parse("knot-cli@latest");
        assert_eq!(spec.package, "knot-cli");
        assert_eq!(spec.selector, VersionSelector::Tag("latest".to_string()));
    }

    #[test]
    fn colon_with_invalid_version_falls_back_to_bare_name() {
        let spec = PackageSpec::parse("knot-cli:not-a-version");
        assert_eq!(spec.package, "knot-cli:not-a-version");
        assert_eq!(spec.selector, VersionSelector::Latest);
    }
}
