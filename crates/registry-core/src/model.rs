// crates/registry-core/src/model.rs
// ============================================================================
// Module: Registry Domain Model
// Description: Entities stored and exchanged by the registry.
// Purpose: Define the canonical shape of users, namespaces, and packages.
// Dependencies: serde, time, crate::core::identifiers
// ============================================================================

//! ## Overview
//! These types mirror the registry's persisted entities. They carry no
//! storage-layer concerns (no SQL, no transactions) — `registry-store-sqlite`
//! maps rows to and from these shapes.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::identifiers::NamespaceId;
use crate::core::identifiers::PackageId;
use crate::core::identifiers::RoleId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::VersionId;

/// Global role a user holds, independent of any namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// An ordinary, unprivileged account.
    Regular,
    /// Bypasses every namespace- and package-level permission check.
    Admin,
    /// Fails every permission check outright, including viewing others.
    Banned,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique contact address.
    pub email: String,
    /// Argon2id password hash; never serialized to API responses.
    #[serde(skip_serializing)]
    pub pwhash: String,
    /// Account creation timestamp.
    pub registered: OffsetDateTime,
    /// Global role.
    pub role: UserRole,
}

/// A namespace: a named grouping of packages with its own roles and members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    /// Primary key.
    pub id: NamespaceId,
    /// Unique namespace name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Optional homepage URL, stored as an opaque string.
    pub homepage: Option<String>,
    /// Creation timestamp.
    pub created_date: OffsetDateTime,
}

/// One atomic, grantable capability.
///
/// # Invariants
/// - Closed set; the implication hierarchy is total over this enum (see
///   [`implies`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCode {
    /// Full control over the namespace, including deleting it.
    NamespaceOwner,
    /// Manage namespace membership, roles, and settings.
    NamespaceAdmin,
    /// Edit namespace metadata.
    NamespaceEdit,
    /// Create packages within the namespace.
    PackageCreate,
    /// Edit packages within the namespace.
    PackageEdit,
}

/// Returns `true` if holding `held` also grants `target`.
#[must_use]
pub fn implies(held: PermissionCode, target: PermissionCode) -> bool {
    use PermissionCode::{NamespaceAdmin, NamespaceEdit, NamespaceOwner, PackageCreate, PackageEdit};

    if held == target {
        return true;
    }

    match held {
        NamespaceOwner => matches!(
            target,
            NamespaceAdmin | NamespaceEdit | PackageCreate | PackageEdit
        ),
        NamespaceAdmin => matches!(target, NamespaceEdit | PackageCreate | PackageEdit),
        NamespaceEdit | PackageCreate | PackageEdit => false,
    }
}

/// Returns `true` if `held` (expanded through [`implies`]) is a superset of `required`.
#[must_use]
pub fn implies_all(held: &BTreeSet<PermissionCode>, required: &BTreeSet<PermissionCode>) -> bool {
    required
        .iter()
        .all(|needed| held.iter().any(|have| implies(*have, *needed)))
}

/// A namespace-scoped role: a named, reusable set of permission codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceRole {
    /// Primary key.
    pub id: RoleId,
    /// Owning namespace.
    pub namespace_id: NamespaceId,
    /// Role name, unique within the namespace.
    pub name: String,
    /// Permissions granted by this role.
    pub permissions: BTreeSet<PermissionCode>,
    /// Creation timestamp.
    pub created_date: OffsetDateTime,
    /// Username that created the role.
    pub created_by: String,
    /// Last-update timestamp.
    pub updated_date: OffsetDateTime,
    /// Username that last updated the role.
    pub updated_by: String,
}

/// A user's membership in a namespace, via one role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceMember {
    /// Member's user id.
    pub user_id: UserId,
    /// Namespace the membership belongs to.
    pub namespace_id: NamespaceId,
    /// Held role.
    pub role_id: RoleId,
    /// Timestamp the membership was created.
    pub added_date: OffsetDateTime,
    /// Username that added the member.
    pub added_by: String,
    /// Timestamp the membership was last changed.
    pub updated_date: OffsetDateTime,
    /// Username that last changed the membership.
    pub updated_by: String,
}

/// A digest algorithm accepted for package version checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// 128-bit digest.
    Md5,
    /// 160-bit digest.
    Sha1,
    /// 256-bit digest.
    Sha256,
    /// 512-bit digest.
    Sha512,
}

impl ChecksumAlgorithm {
    /// Required decoded digest length, in bytes.
    #[must_use]
    pub const fn required_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

/// A package: a named, versioned unit of distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Primary key.
    pub id: PackageId,
    /// Unique package name.
    pub name: String,
    /// Owning namespace, if any.
    pub namespace_id: Option<NamespaceId>,
    /// One-line summary.
    pub summary: String,
    /// Total recorded downloads across all versions.
    pub downloads: u64,
    /// Creation timestamp.
    pub created_date: OffsetDateTime,
    /// Username that created the package.
    pub created_by: String,
    /// Last-update timestamp.
    pub updated_date: OffsetDateTime,
    /// Username that last updated the package.
    pub updated_by: String,
}

/// A concrete, published version of a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Primary key.
    pub id: VersionId,
    /// Owning package.
    pub package_id: PackageId,
    /// Semantic version string.
    pub version: String,
    /// Recorded downloads for this version alone.
    pub downloads: u64,
    /// Free-form release notes.
    pub description: String,
    /// Optional source repository URL, stored as an opaque string.
    pub repository: Option<String>,
    /// Optional tarball download URL, stored as an opaque string.
    pub tarball: Option<String>,
    /// Creation timestamp.
    pub created_date: OffsetDateTime,
    /// Username that published this version.
    pub created_by: String,
}

/// One checksum attached to a package version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageVersionChecksum {
    /// Owning version.
    pub version_id: VersionId,
    /// Digest algorithm.
    pub algorithm: ChecksumAlgorithm,
    /// Decoded digest bytes; length always matches `algorithm.required_len()`.
    pub value: Vec<u8>,
}

/// A version-range dependency on another package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageVersionDependency {
    /// Depending version.
    pub version_id: VersionId,
    /// Depended-on package id.
    pub dependency_package_id: PackageId,
    /// Free-form version-range spec (1..=40 bytes).
    pub spec: String,
}

/// A named, mutable pointer from a tag name to one concrete version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageTag {
    /// Owning package.
    pub package_id: PackageId,
    /// Tag name, unique within the package.
    pub name: String,
    /// Version the tag currently points at.
    pub version_id: VersionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_implies_full_hierarchy() {
        let held = PermissionCode::NamespaceOwner;
        for target in [
            PermissionCode::NamespaceOwner,
            PermissionCode::NamespaceAdmin,
            PermissionCode::NamespaceEdit,
            PermissionCode::PackageCreate,
            PermissionCode::PackageEdit,
        ] {
            assert!(implies(held, target), "owner should imply {target:?}");
        }
    }

    #[test]
    fn admin_does_not_imply_owner() {
        assert!(!implies(PermissionCode::NamespaceAdmin, PermissionCode::NamespaceOwner));
    }

    #[test]
    fn edit_implies_only_itself() {
        assert!(implies(PermissionCode::NamespaceEdit, PermissionCode::NamespaceEdit));
        assert!(!implies(PermissionCode::NamespaceEdit, PermissionCode::PackageEdit));
    }

    #[test]
    fn implies_all_expands_through_admin() {
        let held: BTreeSet<_> = [PermissionCode::NamespaceAdmin].into_iter().collect();
        let required: BTreeSet<_> = [PermissionCode::PackageCreate, PermissionCode::PackageEdit]
            .into_iter()
            .collect();
        assert!(implies_all(&held, &required));
    }

    #[test]
    fn checksum_lengths_match_python_reference() {
        assert_eq!(ChecksumAlgorithm::Md5.required_len(), 16);
        assert_eq!(ChecksumAlgorithm::Sha1.required_len(), 20);
        assert_eq!(ChecksumAlgorithm::Sha256.required_len(), 32);
        assert_eq!(ChecksumAlgorithm::Sha512.required_len(), 64);
    }
}
