// crates/registry-cli/src/manifest.rs
// ============================================================================
// Module: Package Manifest
// Description: The TOML file a publisher writes to describe one version.
// Purpose: Parse `knot.toml`-style manifests for `knot publish`.
// Dependencies: registry-core, serde, toml
// ============================================================================

use std::path::Path;

use registry_core::validate;
use serde::Deserialize;

use crate::error::CliError;
use crate::error::CliResult;

/// One checksum entry in a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestChecksum {
    /// Digest algorithm name, e.g. `"sha256"`.
    pub algorithm: String,
    /// Lowercase hex digest.
    pub value: String,
}

/// One dependency entry in a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDependency {
    /// The depended-on package's name.
    pub package: String,
    /// Dependency version-range spec, as written by the publisher.
    pub spec: String,
}

/// Version 1 of the package manifest format.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifestV1 {
    /// Always `1`; reserved for future format revisions.
    pub manifest_version: u32,
    /// Semantic version string for the version being published.
    pub version: String,
    /// Release notes.
    #[serde(default)]
    pub description: String,
    /// Optional source repository URL.
    #[serde(default)]
    pub repository: Option<String>,
    /// Optional tarball download URL.
    #[serde(default)]
    pub tarball: Option<String>,
    /// Checksums attached to this version.
    #[serde(default)]
    pub checksums: Vec<ManifestChecksum>,
    /// Dependencies declared by this version.
    #[serde(default)]
    pub dependencies: Vec<ManifestDependency>,
}

/// Reads and parses a manifest file, rejecting an unsupported
/// `manifest_version` or a malformed `version` string.
pub fn read_manifest(path: &Path) -> CliResult<PackageManifestV1> {
    let text = std::fs::read_to_string(path)?;

    let manifest: PackageManifestV1 = toml::from_str(&text).map_err(|error| CliError::Config {
        path: path.display().to_string(),
        source: Box::new(error),
    })?;

    if manifest.manifest_version != 1 {
        return Err(CliError::Invalid(format!(
            "{}: unsupported manifest_version {} (expected 1)",
            path.display(),
            manifest.manifest_version
        )));
    }

    if validate::parse_version(&manifest.version).is_none() {
        return Err(CliError::Invalid(format!("{}: {} is not a valid semantic version", path.display(), manifest.version)));
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_minimal_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("knot.toml");
        std::fs::write(&path, "manifest_version = 1\nversion = \"1.0.0\"\n").expect("write");

        let manifest = read_manifest(&path).expect("parse");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.description, "");
        assert!(manifest.checksums.is_empty());
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn reads_a_full_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("knot.toml");
        let digest = "a".repeat(64);
        let contents = format!(
            "manifest_version = 1\nversion = \"2.15.3-alpha\"\ndescription = \"a cool package\"\nrepository = \"https://example.com/repo\"\ntarball = \"https://example.com/pkg.tar.gz\"\n\n[[checksums]]\nalgorithm = \"sha256\"\nvalue = \"{digest}\"\n"
        );
        std::fs::write(&path, contents).expect("write");

        let manifest = read_manifest(&path).expect("parse");
        assert_eq!(manifest.version, "2.15.3-alpha");
        assert_eq!(manifest.checksums.len(), 1);
        assert_eq!(manifest.checksums[0].algorithm, "sha256");
    }

    #[test]
    fn rejects_unsupported_manifest_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("knot.toml");
        std::fs::write(&path, "manifest_version = 2\nversion = \"1.0.0\"\n").expect("write");

        assert!(read_manifest(&path).is_err());
    }

    #[test]
    fn rejects_malformed_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("knot.toml");
        std::fs::write(&path, "manifest_version = 1\nversion = \"not-a-version\"\n").expect("write");

        assert!(read_manifest(&path).is_err());
    }
}
