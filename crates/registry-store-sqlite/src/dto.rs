// crates/registry-store-sqlite/src/dto.rs
// ============================================================================
// Module: Store DTOs
// Description: Row-mapping helpers and aggregate loaders for the store.
// Purpose: Keep bounded-fan-out aggregate assembly out of the public API surface.
// ============================================================================

use std::collections::BTreeSet;

use registry_core::model::ChecksumAlgorithm;
use registry_core::model::PermissionCode;
use registry_core::model::UserRole;
use rusqlite::params;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;

use crate::store::algorithm_from_str;
use crate::store::algorithm_str;
use crate::store::permission_from_str;
use crate::store::role_from_str;
use crate::store::NewPackageVersion;
use crate::store::StoreError;

/// A stored user row.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Row id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Argon2id PHC string.
    pub pwhash: String,
    /// Registration time, Unix seconds.
    pub registered: i64,
    /// Global role.
    pub role: UserRole,
}

pub(crate) fn map_user_record(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let role: String = row.get(5)?;
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        pwhash: row.get(3)?,
        registered: row.get(4)?,
        role: role_from_str(&role),
    })
}

/// One member of a namespace.
#[derive(Debug, Clone)]
pub struct NamespaceMemberView {
    /// Member's username.
    pub username: String,
    /// Name of the role the member currently holds.
    pub role: String,
}

/// One role defined within a namespace.
#[derive(Debug, Clone)]
pub struct NamespaceRoleView {
    /// Role name.
    pub name: String,
    /// Permissions granted by this role.
    pub permissions: BTreeSet<PermissionCode>,
}

/// A namespace with its members and roles loaded.
#[derive(Debug, Clone)]
pub struct NamespaceAggregate {
    /// Row id.
    pub id: i64,
    /// Namespace name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Optional homepage URL.
    pub homepage: Option<String>,
    /// Creation time, Unix seconds.
    pub created_date: i64,
    /// Current members.
    pub members: Vec<NamespaceMemberView>,
    /// Current roles.
    pub roles: Vec<NamespaceRoleView>,
}

pub(crate) fn load_namespace_aggregate(connection: &Connection, name: &str) -> Result<Option<NamespaceAggregate>, StoreError> {
    let header = connection
        .query_row(
            "SELECT id, name, description, homepage, created_date FROM namespaces WHERE name = ?1",
            params![name],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, name, description, homepage, created_date)) = header else {
        return Ok(None);
    };

    let members = load_namespace_members(connection, &name)?;
    let roles = load_namespace_roles(connection, &name)?;

    Ok(Some(NamespaceAggregate {
        id,
        name,
        description,
        homepage,
        created_date,
        members,
        roles,
    }))
}

pub(crate) fn load_namespace_members(connection: &Connection, name: &str) -> Result<Vec<NamespaceMemberView>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT u.username, r.name FROM namespace_members m
         JOIN users u ON u.id = m.user_id
         JOIN namespaces n ON n.id = m.namespace_id
         JOIN namespace_roles r ON r.id = m.role_id
         WHERE n.name = ?1
         ORDER BY u.username",
    )?;

    let rows = statement
        .query_map(params![name], |row| {
            Ok(NamespaceMemberView {
                username: row.get(0)?,
                role: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn load_namespace_roles(connection: &Connection, name: &str) -> Result<Vec<NamespaceRoleView>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT r.id, r.name FROM namespace_roles r
         JOIN namespaces n ON n.id = r.namespace_id
         WHERE n.name = ?1
         ORDER BY r.name",
    )?;

    let roles = statement
        .query_map(params![name], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut permission_statement = connection.prepare("SELECT permission FROM namespace_role_permissions WHERE role_id = ?1")?;

    let mut result = Vec::with_capacity(roles.len());
    for (role_id, role_name) in roles {
        let permissions = permission_statement
            .query_map(params![role_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .iter()
            .filter_map(|value| permission_from_str(value))
            .collect();

        result.push(NamespaceRoleView { name: role_name, permissions });
    }

    Ok(result)
}

/// A package listed without its versions or tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBrief {
    /// Package name.
    pub name: String,
    /// Owning namespace, if any.
    pub namespace: Option<String>,
    /// One-line summary.
    pub summary: String,
    /// Cumulative download count.
    pub downloads: i64,
}

pub(crate) fn load_package_briefs(connection: &Connection, namespace: Option<&str>) -> Result<Vec<PackageBrief>, StoreError> {
    let mut statement = if namespace.is_some() {
        connection.prepare(
            "SELECT p.name, n.name, p.summary, p.downloads FROM packages p
             LEFT JOIN namespaces n ON n.id = p.namespace_id
             WHERE n.name = ?1
             ORDER BY p.name",
        )?
    } else {
        connection.prepare(
            "SELECT p.name, n.name, p.summary, p.downloads FROM packages p
             LEFT JOIN namespaces n ON n.id = p.namespace_id
             ORDER BY p.name",
        )?
    };

    let mapper = |row: &Row<'_>| {
        Ok(PackageBrief {
            name: row.get(0)?,
            namespace: row.get(1)?,
            summary: row.get(2)?,
            downloads: row.get(3)?,
        })
    };

    let rows = if let Some(name) = namespace {
        statement.query_map(params![name], mapper)?.collect::<Result<Vec<_>, _>>()?
    } else {
        statement.query_map(params![], mapper)?.collect::<Result<Vec<_>, _>>()?
    };

    Ok(rows)
}

/// One checksum attached to a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageChecksumView {
    /// Digest algorithm.
    pub algorithm: ChecksumAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

/// One dependency of a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependencyView {
    /// The depended-on package's name.
    pub package: String,
    /// Dependency version spec, as written by the publisher.
    pub spec: String,
}

/// One published version of a package.
#[derive(Debug, Clone)]
pub struct PackageVersionView {
    /// Semantic version string.
    pub version: String,
    /// Release notes.
    pub description: String,
    /// Optional source repository URL.
    pub repository: Option<String>,
    /// Optional tarball URL.
    pub tarball: Option<String>,
    /// Publish time, Unix seconds.
    pub created_date: i64,
    /// Checksums attached to this version.
    pub checksums: Vec<PackageChecksumView>,
    /// Dependencies declared by this version.
    pub dependencies: Vec<PackageDependencyView>,
}

/// One tag defined on a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTagView {
    /// Tag name.
    pub name: String,
    /// The version the tag currently points at.
    pub version: String,
}

/// A package with its owners, labels, versions, and tags loaded.
#[derive(Debug, Clone)]
pub struct PackageAggregate {
    /// Brief projection.
    pub brief: PackageBrief,
    /// Usernames with edit rights on this package directly.
    pub owners: Vec<String>,
    /// Free-text labels.
    pub labels: Vec<String>,
    /// Published versions, most recent publish last.
    pub versions: Vec<PackageVersionView>,
    /// Tags defined on the package.
    pub tags: Vec<PackageTagView>,
}

pub(crate) fn load_package_aggregate(connection: &Connection, name: &str) -> Result<Option<PackageAggregate>, StoreError> {
    let header = connection
        .query_row(
            "SELECT p.id, p.name, n.name, p.summary, p.downloads FROM packages p
             LEFT JOIN namespaces n ON n.id = p.namespace_id
             WHERE p.name = ?1",
            params![name],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((package_id, name, namespace, summary, downloads)) = header else {
        return Ok(None);
    };

    let mut owner_statement = connection.prepare("SELECT username FROM package_owners WHERE package_id = ?1 ORDER BY username")?;
    let owners = owner_statement
        .query_map(params![package_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut label_statement = connection.prepare(
        "SELECT l.name FROM package_labels pl JOIN labels l ON l.id = pl.label_id WHERE pl.package_id = ?1 ORDER BY l.name",
    )?;
    let labels = label_statement
        .query_map(params![package_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let versions = load_package_versions(connection, package_id)?;
    let tags = load_package_tags(connection, package_id)?;

    Ok(Some(PackageAggregate {
        brief: PackageBrief { name, namespace, summary, downloads },
        owners,
        labels,
        versions,
        tags,
    }))
}

pub(crate) fn load_package_versions(connection: &Connection, package_id: i64) -> Result<Vec<PackageVersionView>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT id, version, description, repository, tarball, created_date FROM package_versions
         WHERE package_id = ?1 ORDER BY created_date",
    )?;

    let rows = statement
        .query_map(params![package_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut checksum_statement = connection.prepare("SELECT algorithm, value FROM package_version_checksums WHERE version_id = ?1")?;
    let mut dependency_statement = connection.prepare(
        "SELECT p.name, d.spec FROM package_version_dependencies d
         JOIN packages p ON p.id = d.dependency_package_id
         WHERE d.version_id = ?1
         ORDER BY p.name",
    )?;

    let mut result = Vec::with_capacity(rows.len());
    for (version_id, version, description, repository, tarball, created_date) in rows {
        let checksums = checksum_statement
            .query_map(params![version_id], |row| {
                let algorithm: String = row.get(0)?;
                Ok((algorithm, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(algorithm, value)| algorithm_from_str(&algorithm).map(|algorithm| PackageChecksumView { algorithm, value }))
            .collect();

        let dependencies = dependency_statement
            .query_map(params![version_id], |row| {
                Ok(PackageDependencyView {
                    package: row.get(0)?,
                    spec: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        result.push(PackageVersionView {
            version,
            description,
            repository,
            tarball,
            created_date,
            checksums,
            dependencies,
        });
    }

    Ok(result)
}

pub(crate) fn load_package_tags(connection: &Connection, package_id: i64) -> Result<Vec<PackageTagView>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT t.name, v.version FROM package_tags t
         JOIN package_versions v ON v.id = t.version_id
         WHERE t.package_id = ?1
         ORDER BY t.name",
    )?;

    let rows = statement
        .query_map(params![package_id], |row| {
            Ok(PackageTagView {
                name: row.get(0)?,
                version: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub(crate) fn insert_version(
    tx: &rusqlite::Transaction<'_>,
    package_id: i64,
    version: &NewPackageVersion,
    created_by: &str,
    created_date: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO package_versions (package_id, version, description, repository, tarball, created_date, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![package_id, version.version, version.description, version.repository, version.tarball, created_date, created_by],
    )?;
    let version_id = tx.last_insert_rowid();

    for (algorithm, value) in &version.checksums {
        tx.execute(
            "INSERT INTO package_version_checksums (version_id, algorithm, value) VALUES (?1, ?2, ?3)",
            params![version_id, algorithm_str(*algorithm), hex::encode(value)],
        )?;
    }

    for (dependency_name, spec) in &version.dependencies {
        let dependency_package_id: i64 = tx.query_row(
            "SELECT id FROM packages WHERE name = ?1",
            params![dependency_name],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO package_version_dependencies (version_id, dependency_package_id, spec) VALUES (?1, ?2, ?3)",
            params![version_id, dependency_package_id, spec],
        )?;
    }

    Ok(())
}

pub(crate) fn garbage_collect_labels(tx: &rusqlite::Transaction<'_>) -> Result<(), StoreError> {
    tx.execute(
        "DELETE FROM labels WHERE id NOT IN (SELECT DISTINCT label_id FROM package_labels)",
        params![],
    )?;
    Ok(())
}

mod hex {
    pub(crate) fn encode(bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}
