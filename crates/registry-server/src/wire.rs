// crates/registry-server/src/wire.rs
// ============================================================================
// Module: Wire Types
// Description: Request/response JSON shapes for the HTTP API.
// Purpose: Keep the public contract separate from storage and domain types.
// Dependencies: registry-core, serde
// ============================================================================

//! ## Overview
//! Every type here is a plain serde struct with no behavior. Timestamps are
//! Unix seconds (`i64`) rather than formatted strings, matching how the
//! storage layer already represents them — one less conversion on the
//! request-handling hot path.

use std::collections::BTreeSet;

use registry_core::model::ChecksumAlgorithm;
use registry_core::model::PermissionCode;
use registry_core::model::UserRole;
use serde::Deserialize;
use serde::Serialize;

/// A user's public profile.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Registration time, Unix seconds.
    pub registered: i64,
    /// Namespaces the user belongs to.
    pub namespaces: Vec<String>,
}

/// A user's full profile, visible only to the user themselves or an admin.
#[derive(Debug, Serialize)]
pub struct FullUserInfo {
    /// Row id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Registration time, Unix seconds.
    pub registered: i64,
    /// Namespaces the user belongs to.
    pub namespaces: Vec<String>,
    /// Global role.
    pub role: UserRole,
}

/// A minted bearer token.
#[derive(Debug, Serialize)]
pub struct AuthToken {
    /// Always `"bearer"`.
    pub token_type: &'static str,
    /// The token itself.
    pub access_token: String,
}

/// Form-encoded login request body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct UserRegister {
    /// Desired login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Shared fields of a namespace create/edit request.
#[derive(Debug, Deserialize)]
pub struct NamespaceBody {
    /// Namespace name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Optional homepage URL.
    #[serde(default)]
    pub homepage: Option<String>,
}

/// A namespace with its members and roles.
#[derive(Debug, Serialize)]
pub struct NamespaceOut {
    /// Namespace name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Optional homepage URL.
    pub homepage: Option<String>,
    /// Creation time, Unix seconds.
    pub created_date: i64,
    /// Current members.
    pub users: Vec<NamespaceUserOut>,
    /// Current roles.
    pub roles: Vec<NamespaceRoleOut>,
}

/// One namespace member.
#[derive(Debug, Serialize)]
pub struct NamespaceUserOut {
    /// Member's username.
    pub username: String,
    /// Name of the role the member currently holds.
    pub role: String,
}

/// Request body to add a namespace member.
#[derive(Debug, Deserialize)]
pub struct NamespaceUserCreate {
    /// Username to add.
    pub username: String,
    /// Role name to grant.
    pub role: String,
}

/// Request body to change a namespace member's role.
#[derive(Debug, Deserialize)]
pub struct NamespaceUserEdit {
    /// New role name.
    pub role: String,
}

/// One namespace role.
#[derive(Debug, Serialize)]
pub struct NamespaceRoleOut {
    /// Role name.
    pub name: String,
    /// Permissions granted by this role.
    pub permissions: BTreeSet<PermissionCode>,
}

/// Request body to create or edit a namespace role.
#[derive(Debug, Deserialize)]
pub struct NamespaceRoleBody {
    /// Role name.
    pub name: String,
    /// Permissions granted by this role.
    pub permissions: BTreeSet<PermissionCode>,
}

/// A package without its owners, labels, versions, or tags.
#[derive(Debug, Serialize)]
pub struct PackageBriefOut {
    /// Package name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Owning namespace, if any.
    pub namespace: Option<String>,
    /// Cumulative download count.
    pub downloads: i64,
}

impl From<registry_store_sqlite::PackageBrief> for PackageBriefOut {
    fn from(brief: registry_store_sqlite::PackageBrief) -> Self {
        Self {
            name: brief.name,
            summary: brief.summary,
            namespace: brief.namespace,
            downloads: brief.downloads,
        }
    }
}

/// A package with its versions and tags.
#[derive(Debug, Serialize)]
pub struct PackageOut {
    /// Package name.
    pub name: String,
    /// One-line summary.
    pub summary: String,
    /// Free-text labels.
    pub labels: Vec<String>,
    /// Owning namespace, if any.
    pub namespace: Option<String>,
    /// Usernames with edit rights on this package directly.
    pub owners: Vec<String>,
    /// Cumulative download count.
    pub downloads: i64,
    /// Published versions.
    pub versions: Vec<PackageVersionOut>,
    /// Tags defined on the package.
    pub tags: Vec<PackageTagWire>,
}

/// Request body to create a package.
#[derive(Debug, Deserialize)]
pub struct PackageCreate {
    /// Package name.
    pub name: String,
    /// One-line summary.
    #[serde(default)]
    pub summary: String,
    /// Owning namespace, if any.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Free-text labels.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Usernames with edit rights on this package directly.
    pub owners: BTreeSet<String>,
    /// Versions to publish immediately.
    #[serde(default)]
    pub versions: Vec<PackageVersionBody>,
    /// Tags to create, each referring to one of `versions`.
    #[serde(default)]
    pub tags: Vec<PackageTagWire>,
}

/// Request body to edit a package's metadata.
#[derive(Debug, Deserialize)]
pub struct PackageEdit {
    /// Package name.
    pub name: String,
    /// One-line summary.
    #[serde(default)]
    pub summary: String,
    /// Owning namespace, if any.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Free-text labels.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Usernames with edit rights on this package directly.
    pub owners: BTreeSet<String>,
}

/// One published version of a package.
#[derive(Debug, Serialize)]
pub struct PackageVersionOut {
    /// Semantic version string.
    pub version: String,
    /// Release notes.
    pub description: String,
    /// Optional source repository URL.
    pub repository: Option<String>,
    /// Optional tarball URL.
    pub tarball: Option<String>,
    /// Checksums attached to this version.
    pub checksums: Vec<PackageChecksumWire>,
    /// Dependencies declared by this version.
    pub dependencies: Vec<PackageDependencyWire>,
    /// Publish time, Unix seconds.
    pub created_date: i64,
}

/// Request body for publishing or editing a single version.
#[derive(Debug, Deserialize)]
pub struct PackageVersionBody {
    /// Semantic version string.
    pub version: String,
    /// Release notes.
    #[serde(default)]
    pub description: String,
    /// Optional source repository URL.
    #[serde(default)]
    pub repository: Option<String>,
    /// Optional tarball URL.
    #[serde(default)]
    pub tarball: Option<String>,
    /// Checksums attached to this version.
    #[serde(default)]
    pub checksums: Vec<PackageChecksumWire>,
    /// Dependencies declared by this version.
    #[serde(default)]
    pub dependencies: Vec<PackageDependencyWire>,
}

/// One checksum on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageChecksumWire {
    /// Digest algorithm.
    pub algorithm: ChecksumAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

/// One dependency on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDependencyWire {
    /// The depended-on package's name.
    pub package: String,
    /// Dependency version spec, as written by the publisher.
    pub spec: String,
}

/// One tag on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageTagWire {
    /// Tag name.
    pub name: String,
    /// The version the tag refers to.
    pub version: String,
}

/// Request body to create or retarget a tag; the tag's name comes from the
/// path, not the body.
#[derive(Debug, Deserialize)]
pub struct PackageTagBody {
    /// The version the tag should refer to.
    pub version: String,
}

/// One entry of the `/permission` catalog.
#[derive(Debug, Serialize)]
pub struct PermissionOut {
    /// The permission code.
    pub code: PermissionCode,
    /// Human-readable description.
    pub description: &'static str,
}
