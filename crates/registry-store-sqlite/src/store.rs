// crates/registry-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Registry Store
// Description: Durable package registry persistence backed by SQLite WAL.
// Purpose: Persist users, namespaces, packages, and their relations with
//          single-transaction-per-operation discipline and invariant guards.
// Dependencies: registry-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! Every multi-statement write in this module runs inside one
//! [`rusqlite::Transaction`] and commits atomically or not at all. Aggregate
//! reads (a full package or namespace) issue a small, fixed number of
//! queries regardless of how many child rows (owners, versions, checksums,
//! ...) exist — never one query per row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use registry_core::model::ChecksumAlgorithm;
use registry_core::model::PermissionCode;
use registry_core::model::UserRole;
use rusqlite::params;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use time::OffsetDateTime;

use crate::dto;
use crate::dto::NamespaceAggregate;
use crate::dto::NamespaceMemberView;
use crate::dto::NamespaceRoleView;
use crate::dto::PackageAggregate;
use crate::dto::PackageBrief;
use crate::dto::PackageTagView;
use crate::dto::PackageVersionView;
use crate::dto::UserRecord;
use crate::schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors surfaced by the storage layer.
///
/// The HTTP layer maps these onto the public error taxonomy without
/// re-deriving business rules: `NotFound`/`Conflict`/`Invariant` already
/// name exactly which rule fired.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A unique constraint would be violated.
    #[error("{0} already exists")]
    Conflict(&'static str),
    /// A business-rule invariant blocks the operation.
    #[error("{0}")]
    Invariant(&'static str),
    /// An unexpected `SQLite` failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite-backed registry persistence.
///
/// A single writer connection is held behind a mutex; WAL mode allows
/// concurrent readers to proceed without blocking on in-flight writes.
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if absent) the store at `path`, applying pragmas and
    /// initializing the schema if needed.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] if the file cannot be opened or the
    /// schema cannot be initialized.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let mut connection = Connection::open(path)?;
        apply_pragmas(&connection)?;
        schema::initialize(&mut connection, SCHEMA_VERSION)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Opens an in-memory store, for tests.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] if the schema cannot be initialized.
    pub fn open_in_memory() -> StoreResult<Self> {
        let mut connection = Connection::open_in_memory()?;
        apply_pragmas(&connection)?;
        schema::initialize(&mut connection, SCHEMA_VERSION)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        #[expect(clippy::unwrap_used, reason = "a poisoned store mutex means a prior writer panicked; there is no safe way to continue")]
        self.connection.lock().unwrap()
    }
}

fn apply_pragmas(connection: &Connection) -> StoreResult<()> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection.execute_batch("PRAGMA journal_mode = WAL;")?;
    connection.execute_batch("PRAGMA synchronous = NORMAL;")?;
    connection.busy_timeout(std::time::Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

pub(crate) fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub(crate) fn permission_str(code: PermissionCode) -> &'static str {
    match code {
        PermissionCode::NamespaceOwner => "namespace_owner",
        PermissionCode::NamespaceAdmin => "namespace_admin",
        PermissionCode::NamespaceEdit => "namespace_edit",
        PermissionCode::PackageCreate => "package_create",
        PermissionCode::PackageEdit => "package_edit",
    }
}

pub(crate) fn permission_from_str(value: &str) -> Option<PermissionCode> {
    match value {
        "namespace_owner" => Some(PermissionCode::NamespaceOwner),
        "namespace_admin" => Some(PermissionCode::NamespaceAdmin),
        "namespace_edit" => Some(PermissionCode::NamespaceEdit),
        "package_create" => Some(PermissionCode::PackageCreate),
        "package_edit" => Some(PermissionCode::PackageEdit),
        _ => None,
    }
}

pub(crate) fn role_from_str(value: &str) -> UserRole {
    match value {
        "admin" => UserRole::Admin,
        "banned" => UserRole::Banned,
        _ => UserRole::Regular,
    }
}

pub(crate) fn role_str(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "admin",
        UserRole::Banned => "banned",
        UserRole::Regular => "regular",
    }
}

pub(crate) fn algorithm_str(algorithm: ChecksumAlgorithm) -> &'static str {
    match algorithm {
        ChecksumAlgorithm::Md5 => "md5",
        ChecksumAlgorithm::Sha1 => "sha1",
        ChecksumAlgorithm::Sha256 => "sha256",
        ChecksumAlgorithm::Sha512 => "sha512",
    }
}

pub(crate) fn algorithm_from_str(value: &str) -> Option<ChecksumAlgorithm> {
    match value {
        "md5" => Some(ChecksumAlgorithm::Md5),
        "sha1" => Some(ChecksumAlgorithm::Sha1),
        "sha256" => Some(ChecksumAlgorithm::Sha256),
        "sha512" => Some(ChecksumAlgorithm::Sha512),
        _ => None,
    }
}

// ============================================================================
// SECTION: Users
// ============================================================================

impl SqliteStore {
    /// Looks up a user by username.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_user(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT id, username, email, pwhash, registered, role FROM users WHERE username = ?1",
                params![username],
                dto::map_user_record,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// Looks up a user by email.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT id, username, email, pwhash, registered, role FROM users WHERE email = ?1",
                params![email],
                dto::map_user_record,
            )
            .optional()
            .map_err(StoreError::from)
    }

    /// Creates a new user.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected insert failure.
    pub fn create_user(&self, username: &str, email: &str, pwhash: &str) -> StoreResult<UserRecord> {
        let connection = self.lock();
        let registered = now();

        connection.execute(
            "INSERT INTO users (username, email, pwhash, registered, role) VALUES (?1, ?2, ?3, ?4, 'regular')",
            params![username, email, pwhash, registered],
        )?;

        let id = connection.last_insert_rowid();

        Ok(UserRecord {
            id,
            username: username.to_string(),
            email: email.to_string(),
            pwhash: pwhash.to_string(),
            registered,
            role: UserRole::Regular,
        })
    }

    /// Sets a user's global role directly. There is no HTTP route for this;
    /// global role assignment (granting `admin`, issuing a `banned`) is an
    /// out-of-band operator action in the reference deployment, not a
    /// caller-facing API.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected update failure.
    pub fn set_user_role(&self, username: &str, role: UserRole) -> StoreResult<()> {
        let connection = self.lock();
        connection.execute("UPDATE users SET role = ?1 WHERE username = ?2", params![role_str(role), username])?;
        Ok(())
    }

    /// Returns the names of every namespace the user is a member of.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_user_namespaces(&self, username: &str) -> StoreResult<Vec<String>> {
        let connection = self.lock();
        let mut statement = connection.prepare(
            "SELECT n.name FROM namespaces n
             JOIN namespace_members m ON m.namespace_id = n.id
             JOIN users u ON u.id = m.user_id
             WHERE u.username = ?1
             ORDER BY n.name",
        )?;

        let rows = statement
            .query_map(params![username], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Returns every username that does not exist, from `candidates`.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_unknown_users(&self, candidates: &BTreeSet<String>) -> StoreResult<Vec<String>> {
        let connection = self.lock();
        let mut unknown = Vec::new();

        for username in candidates {
            let exists: bool = connection.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                params![username],
                |row| row.get(0),
            )?;

            if !exists {
                unknown.push(username.clone());
            }
        }

        unknown.sort();
        Ok(unknown)
    }
}

// ============================================================================
// SECTION: Namespaces
// ============================================================================

impl SqliteStore {
    /// Returns `true` if a namespace named `name` exists.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn namespace_exists(&self, name: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM namespaces WHERE name = ?1)",
                params![name],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
    }

    /// Returns the row id of a namespace, if it exists.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_id(&self, name: &str) -> StoreResult<Option<i64>> {
        let connection = self.lock();
        connection
            .query_row("SELECT id FROM namespaces WHERE name = ?1", params![name], |row| row.get(0))
            .optional()
            .map_err(StoreError::from)
    }

    /// Loads a namespace with its members and roles in a bounded number of
    /// queries.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace(&self, name: &str) -> StoreResult<Option<NamespaceAggregate>> {
        let connection = self.lock();
        dto::load_namespace_aggregate(&connection, name)
    }

    /// Creates a namespace together with its default owner role and the
    /// creator's membership in that role, as one transaction.
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] if the name is taken, otherwise
    /// [`StoreError::Sqlite`] on an unexpected failure.
    pub fn create_namespace(
        &self,
        name: &str,
        description: &str,
        homepage: Option<&str>,
        owner_username: &str,
        default_owner_role: &str,
    ) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;
        let created_date = now();

        tx.execute(
            "INSERT INTO namespaces (name, description, homepage, created_date) VALUES (?1, ?2, ?3, ?4)",
            params![name, description, homepage, created_date],
        )?;
        let namespace_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO namespace_roles (namespace_id, name, created_date, created_by, updated_date, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?3, ?4)",
            params![namespace_id, default_owner_role, created_date, owner_username],
        )?;
        let role_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO namespace_role_permissions (role_id, permission) VALUES (?1, 'namespace_owner')",
            params![role_id],
        )?;

        let owner_id: i64 = tx.query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![owner_username],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO namespace_members (user_id, namespace_id, role_id, added_date, added_by, updated_date, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?4, ?5)",
            params![owner_id, namespace_id, role_id, created_date, owner_username],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Renames/edits namespace metadata.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the namespace is absent.
    pub fn edit_namespace(&self, name: &str, new_name: &str, description: &str, homepage: Option<&str>) -> StoreResult<()> {
        let connection = self.lock();
        let updated = connection.execute(
            "UPDATE namespaces SET name = ?1, description = ?2, homepage = ?3 WHERE name = ?4",
            params![new_name, description, homepage, name],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound("Namespace"));
        }

        Ok(())
    }

    /// Deletes a namespace. Packages that belonged to it are detached
    /// (`namespace_id` set to `NULL`) by the foreign key's `ON DELETE SET
    /// NULL` action; members and roles cascade-delete.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn delete_namespace(&self, name: &str) -> StoreResult<()> {
        let connection = self.lock();
        connection.execute("DELETE FROM namespaces WHERE name = ?1", params![name])?;
        Ok(())
    }

    /// Returns the usernames holding `NamespaceOwner` (directly or via
    /// implication) in a namespace.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_owners(&self, namespace_id: i64) -> StoreResult<Vec<String>> {
        let connection = self.lock();
        let mut statement = connection.prepare(
            "SELECT u.username FROM namespace_members m
             JOIN users u ON u.id = m.user_id
             JOIN namespace_role_permissions p ON p.role_id = m.role_id
             WHERE m.namespace_id = ?1 AND p.permission = 'namespace_owner'
             ORDER BY u.username",
        )?;

        let rows = statement
            .query_map(params![namespace_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Lists every member of a namespace.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_users(&self, name: &str) -> StoreResult<Vec<NamespaceMemberView>> {
        let connection = self.lock();
        dto::load_namespace_members(&connection, name)
    }

    /// Looks up one namespace member.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_user(&self, name: &str, username: &str) -> StoreResult<Option<NamespaceMemberView>> {
        Ok(self
            .get_namespace_users(name)?
            .into_iter()
            .find(|member| member.username == username))
    }

    /// Returns `true` if `username` is already a member of the namespace.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn namespace_user_exists(&self, namespace_id: i64, username: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM namespace_members m
                    JOIN users u ON u.id = m.user_id
                    WHERE m.namespace_id = ?1 AND u.username = ?2
                 )",
                params![namespace_id, username],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
    }

    /// Returns the permissions a user holds in a namespace (empty set if
    /// they are not a member).
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_user_permissions(&self, name: &str, username: &str) -> StoreResult<BTreeSet<PermissionCode>> {
        let connection = self.lock();
        let mut statement = connection.prepare(
            "SELECT p.permission FROM namespace_members m
             JOIN users u ON u.id = m.user_id
             JOIN namespaces n ON n.id = m.namespace_id
             JOIN namespace_role_permissions p ON p.role_id = m.role_id
             WHERE n.name = ?1 AND u.username = ?2",
        )?;

        let rows = statement
            .query_map(params![name, username], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.iter().filter_map(|value| permission_from_str(value)).collect())
    }

    /// Adds `username` as a namespace member with `role`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the role does not exist.
    pub fn create_namespace_user(&self, namespace_id: i64, username: &str, role: &str, added_by: &str) -> StoreResult<()> {
        let connection = self.lock();
        let role_id: i64 = connection
            .query_row(
                "SELECT id FROM namespace_roles WHERE namespace_id = ?1 AND name = ?2",
                params![namespace_id, role],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound("Role"))?;

        let user_id: i64 = connection.query_row("SELECT id FROM users WHERE username = ?1", params![username], |row| row.get(0))?;
        let timestamp = now();

        connection.execute(
            "INSERT INTO namespace_members (user_id, namespace_id, role_id, added_date, added_by, updated_date, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?4, ?5)",
            params![user_id, namespace_id, role_id, timestamp, added_by],
        )?;

        Ok(())
    }

    /// Changes a namespace member's role.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the role does not exist.
    pub fn edit_namespace_user(&self, namespace_id: i64, username: &str, role: &str, updated_by: &str) -> StoreResult<()> {
        let connection = self.lock();
        let role_id: i64 = connection
            .query_row(
                "SELECT id FROM namespace_roles WHERE namespace_id = ?1 AND name = ?2",
                params![namespace_id, role],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound("Role"))?;

        let timestamp = now();

        connection.execute(
            "UPDATE namespace_members SET role_id = ?1, updated_date = ?2, updated_by = ?3
             WHERE namespace_id = ?4 AND user_id = (SELECT id FROM users WHERE username = ?5)",
            params![role_id, timestamp, updated_by, namespace_id, username],
        )?;

        Ok(())
    }

    /// Removes a namespace member.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn delete_namespace_user(&self, namespace_id: i64, username: &str) -> StoreResult<()> {
        let connection = self.lock();
        connection.execute(
            "DELETE FROM namespace_members WHERE namespace_id = ?1 AND user_id = (SELECT id FROM users WHERE username = ?2)",
            params![namespace_id, username],
        )?;
        Ok(())
    }

    /// Lists every role defined in a namespace.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_roles(&self, name: &str) -> StoreResult<Vec<NamespaceRoleView>> {
        let connection = self.lock();
        dto::load_namespace_roles(&connection, name)
    }

    /// Looks up one namespace role.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_role(&self, name: &str, role: &str) -> StoreResult<Option<NamespaceRoleView>> {
        Ok(self.get_namespace_roles(name)?.into_iter().find(|r| r.name == role))
    }

    /// Returns `true` if a role named `role` exists in the namespace.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn namespace_role_exists(&self, namespace_id: i64, role: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM namespace_roles WHERE namespace_id = ?1 AND name = ?2)",
                params![namespace_id, role],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
    }

    /// Returns the permission set of a namespace role.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_role_permissions(&self, name: &str, role: &str) -> StoreResult<Option<BTreeSet<PermissionCode>>> {
        Ok(self.get_namespace_role(name, role)?.map(|r| r.permissions))
    }

    /// Returns the usernames currently holding `role`.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_role_users(&self, namespace_id: i64, role: &str) -> StoreResult<Vec<String>> {
        let connection = self.lock();
        let mut statement = connection.prepare(
            "SELECT u.username FROM namespace_members m
             JOIN users u ON u.id = m.user_id
             JOIN namespace_roles r ON r.id = m.role_id
             WHERE m.namespace_id = ?1 AND r.name = ?2
             ORDER BY u.username",
        )?;

        let rows = statement
            .query_map(params![namespace_id, role], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Returns `true` if any member currently holds `role` — the delete
    /// path rejects removing a non-empty role.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn namespace_role_has_members(&self, namespace_id: i64, role: &str) -> StoreResult<bool> {
        Ok(!self.get_namespace_role_users(namespace_id, role)?.is_empty())
    }

    /// Creates a namespace role with the given permission set.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn create_namespace_role(
        &self,
        namespace_id: i64,
        name: &str,
        permissions: &BTreeSet<PermissionCode>,
        created_by: &str,
    ) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;
        let timestamp = now();

        tx.execute(
            "INSERT INTO namespace_roles (namespace_id, name, created_date, created_by, updated_date, updated_by)
             VALUES (?1, ?2, ?3, ?4, ?3, ?4)",
            params![namespace_id, name, timestamp, created_by],
        )?;
        let role_id = tx.last_insert_rowid();

        for permission in permissions {
            tx.execute(
                "INSERT INTO namespace_role_permissions (role_id, permission) VALUES (?1, ?2)",
                params![role_id, permission_str(*permission)],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Edits a namespace role's name and permission set.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the role does not exist.
    pub fn edit_namespace_role(
        &self,
        namespace_id: i64,
        role: &str,
        new_name: &str,
        permissions: &BTreeSet<PermissionCode>,
        updated_by: &str,
    ) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;
        let timestamp = now();

        let role_id: i64 = tx
            .query_row(
                "SELECT id FROM namespace_roles WHERE namespace_id = ?1 AND name = ?2",
                params![namespace_id, role],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound("Role"))?;

        tx.execute(
            "UPDATE namespace_roles SET name = ?1, updated_date = ?2, updated_by = ?3 WHERE id = ?4",
            params![new_name, timestamp, updated_by, role_id],
        )?;

        tx.execute("DELETE FROM namespace_role_permissions WHERE role_id = ?1", params![role_id])?;

        for permission in permissions {
            tx.execute(
                "INSERT INTO namespace_role_permissions (role_id, permission) VALUES (?1, ?2)",
                params![role_id, permission_str(*permission)],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Deletes a namespace role. Callers must check
    /// [`namespace_role_has_members`](Self::namespace_role_has_members)
    /// first.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn delete_namespace_role(&self, namespace_id: i64, role: &str) -> StoreResult<()> {
        let connection = self.lock();
        connection.execute(
            "DELETE FROM namespace_roles WHERE namespace_id = ?1 AND name = ?2",
            params![namespace_id, role],
        )?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Packages
// ============================================================================

impl SqliteStore {
    /// Lists every package, briefly.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_packages(&self) -> StoreResult<Vec<PackageBrief>> {
        let connection = self.lock();
        dto::load_package_briefs(&connection, None)
    }

    /// Lists the packages belonging to one namespace, briefly.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_namespace_packages(&self, name: &str) -> StoreResult<Vec<PackageBrief>> {
        let connection = self.lock();
        dto::load_package_briefs(&connection, Some(name))
    }

    /// Returns `true` if a package named `name` exists.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn package_exists(&self, name: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row("SELECT EXISTS(SELECT 1 FROM packages WHERE name = ?1)", params![name], |row| row.get(0))
            .map_err(StoreError::from)
    }

    /// Returns the row id of a package, if it exists.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_package_id(&self, name: &str) -> StoreResult<Option<i64>> {
        let connection = self.lock();
        connection
            .query_row("SELECT id FROM packages WHERE name = ?1", params![name], |row| row.get(0))
            .optional()
            .map_err(StoreError::from)
    }

    /// Loads a package's brief projection.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_package_brief(&self, name: &str) -> StoreResult<Option<PackageBrief>> {
        Ok(self.get_packages()?.into_iter().find(|p| p.name == name))
    }

    /// Loads a package with every owner, label, version, and tag, in a
    /// bounded number of queries.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_package(&self, name: &str) -> StoreResult<Option<PackageAggregate>> {
        let connection = self.lock();
        dto::load_package_aggregate(&connection, name)
    }

    /// Returns every package name that does not exist, from `candidates`.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_unknown_packages(&self, candidates: &BTreeSet<String>) -> StoreResult<Vec<String>> {
        let connection = self.lock();
        let mut unknown = Vec::new();

        for name in candidates {
            let exists: bool = connection.query_row("SELECT EXISTS(SELECT 1 FROM packages WHERE name = ?1)", params![name], |row| row.get(0))?;

            if !exists {
                unknown.push(name.clone());
            }
        }

        unknown.sort();
        Ok(unknown)
    }

    /// Creates a package together with its owners, labels, versions,
    /// checksums, dependencies, and tags, as one transaction.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    #[expect(clippy::too_many_arguments, reason = "mirrors the single wide create-package request body; splitting it would just move the argument list into a struct nobody else uses")]
    pub fn create_package(
        &self,
        name: &str,
        namespace_id: Option<i64>,
        summary: &str,
        owners: &BTreeSet<String>,
        labels: &BTreeSet<String>,
        versions: &[NewPackageVersion],
        tags: &[(String, String)],
        created_by: &str,
    ) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;
        let timestamp = now();

        tx.execute(
            "INSERT INTO packages (name, namespace_id, summary, downloads, created_date, created_by, updated_date, updated_by)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?4, ?5)",
            params![name, namespace_id, summary, timestamp, created_by],
        )?;
        let package_id = tx.last_insert_rowid();

        for owner in owners {
            tx.execute(
                "INSERT INTO package_owners (package_id, username) VALUES (?1, ?2)",
                params![package_id, owner],
            )?;
        }

        for label in labels {
            tx.execute("INSERT OR IGNORE INTO labels (name) VALUES (?1)", params![label])?;
            tx.execute(
                "INSERT INTO package_labels (package_id, label_id)
                 VALUES (?1, (SELECT id FROM labels WHERE name = ?2))",
                params![package_id, label],
            )?;
        }

        let mut version_ids = std::collections::HashMap::new();

        for version in versions {
            dto::insert_version(&tx, package_id, version, created_by, timestamp)?;
            let version_id = tx.last_insert_rowid();
            version_ids.insert(version.version.clone(), version_id);
        }

        for (tag_name, version) in tags {
            let version_id = version_ids
                .get(version)
                .copied()
                .ok_or(StoreError::Invariant("tag does not refer to a version in this request"))?;

            tx.execute(
                "INSERT INTO package_tags (package_id, name, version_id) VALUES (?1, ?2, ?3)",
                params![package_id, tag_name, version_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Edits a package's basic metadata, namespace, owners, and labels.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the package does not exist.
    pub fn edit_package(
        &self,
        name: &str,
        new_name: &str,
        namespace_id: Option<i64>,
        summary: &str,
        owners: &BTreeSet<String>,
        labels: &BTreeSet<String>,
        updated_by: &str,
    ) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;
        let timestamp = now();

        let package_id: i64 = tx
            .query_row("SELECT id FROM packages WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?
            .ok_or(StoreError::NotFound("Package"))?;

        tx.execute(
            "UPDATE packages SET name = ?1, namespace_id = ?2, summary = ?3, updated_date = ?4, updated_by = ?5 WHERE id = ?6",
            params![new_name, namespace_id, summary, timestamp, updated_by, package_id],
        )?;

        tx.execute("DELETE FROM package_owners WHERE package_id = ?1", params![package_id])?;
        for owner in owners {
            tx.execute("INSERT INTO package_owners (package_id, username) VALUES (?1, ?2)", params![package_id, owner])?;
        }

        tx.execute("DELETE FROM package_labels WHERE package_id = ?1", params![package_id])?;
        for label in labels {
            tx.execute("INSERT OR IGNORE INTO labels (name) VALUES (?1)", params![label])?;
            tx.execute(
                "INSERT INTO package_labels (package_id, label_id) VALUES (?1, (SELECT id FROM labels WHERE name = ?2))",
                params![package_id, label],
            )?;
        }

        dto::garbage_collect_labels(&tx)?;

        tx.commit()?;
        Ok(())
    }

    /// Returns `true` if any package version depends on `name`.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn package_has_dependents(&self, name: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM package_version_dependencies d
                    JOIN packages p ON p.id = d.dependency_package_id
                    WHERE p.name = ?1
                 )",
                params![name],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
    }

    /// Deletes a package and everything that cascades from it (versions,
    /// checksums, dependencies, tags, owners, labels).
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn delete_package(&self, name: &str) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;
        tx.execute("DELETE FROM packages WHERE name = ?1", params![name])?;
        dto::garbage_collect_labels(&tx)?;
        tx.commit()?;
        Ok(())
    }

    /// Lists the versions of a package.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_package_versions(&self, package_id: i64) -> StoreResult<Vec<PackageVersionView>> {
        let connection = self.lock();
        dto::load_package_versions(&connection, package_id)
    }

    /// Returns `true` if `version` exists for the package.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn package_version_exists(&self, package_id: i64, version: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM package_versions WHERE package_id = ?1 AND version = ?2)",
                params![package_id, version],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
    }

    /// Loads one package version with its checksums and dependencies.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_package_version(&self, package_id: i64, version: &str) -> StoreResult<Option<PackageVersionView>> {
        Ok(self.get_package_versions(package_id)?.into_iter().find(|v| v.version == version))
    }

    /// Adds a new version to an existing package.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn create_package_version(&self, package_id: i64, version: &NewPackageVersion, created_by: &str) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;
        dto::insert_version(&tx, package_id, version, created_by, now())?;
        tx.commit()?;
        Ok(())
    }

    /// Edits an existing package version in place, replacing its
    /// description, links, checksums, and dependencies.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the version does not exist.
    pub fn edit_package_version(&self, package_id: i64, version: &str, updated: &NewPackageVersion) -> StoreResult<()> {
        let mut connection = self.lock();
        let tx = connection.transaction()?;

        let version_id: i64 = tx
            .query_row(
                "SELECT id FROM package_versions WHERE package_id = ?1 AND version = ?2",
                params![package_id, version],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound("Version"))?;

        tx.execute(
            "UPDATE package_versions SET version = ?1, description = ?2, repository = ?3, tarball = ?4 WHERE id = ?5",
            params![updated.version, updated.description, updated.repository, updated.tarball, version_id],
        )?;

        tx.execute("DELETE FROM package_version_checksums WHERE version_id = ?1", params![version_id])?;
        for checksum in &updated.checksums {
            tx.execute(
                "INSERT INTO package_version_checksums (version_id, algorithm, value) VALUES (?1, ?2, ?3)",
                params![version_id, algorithm_str(checksum.0), checksum.1],
            )?;
        }

        tx.execute("DELETE FROM package_version_dependencies WHERE version_id = ?1", params![version_id])?;
        for dependency in &updated.dependencies {
            let dependency_package_id: i64 = tx.query_row(
                "SELECT id FROM packages WHERE name = ?1",
                params![dependency.0],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO package_version_dependencies (version_id, dependency_package_id, spec) VALUES (?1, ?2, ?3)",
                params![version_id, dependency_package_id, dependency.1],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Returns `true` if any tag currently points at `version`.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn package_version_is_tagged(&self, package_id: i64, version: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM package_tags t
                    JOIN package_versions v ON v.id = t.version_id
                    WHERE v.package_id = ?1 AND v.version = ?2
                 )",
                params![package_id, version],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
    }

    /// Deletes one package version. Callers must check
    /// [`package_version_is_tagged`](Self::package_version_is_tagged) and
    /// dependents first.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn delete_package_version(&self, package_id: i64, version: &str) -> StoreResult<()> {
        let connection = self.lock();
        connection.execute(
            "DELETE FROM package_versions WHERE package_id = ?1 AND version = ?2",
            params![package_id, version],
        )?;
        Ok(())
    }

    /// Lists the tags defined on a package.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_package_tags(&self, package_id: i64) -> StoreResult<Vec<PackageTagView>> {
        let connection = self.lock();
        dto::load_package_tags(&connection, package_id)
    }

    /// Returns `true` if a tag named `name` exists on the package.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn package_tag_exists(&self, package_id: i64, name: &str) -> StoreResult<bool> {
        let connection = self.lock();
        connection
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM package_tags WHERE package_id = ?1 AND name = ?2)",
                params![package_id, name],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
    }

    /// Looks up one package tag.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected query failure.
    pub fn get_package_tag(&self, package_id: i64, name: &str) -> StoreResult<Option<PackageTagView>> {
        Ok(self.get_package_tags(package_id)?.into_iter().find(|t| t.name == name))
    }

    /// Creates a tag pointing at an existing version.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the version does not exist.
    pub fn create_package_tag(&self, package_id: i64, name: &str, version: &str) -> StoreResult<()> {
        let connection = self.lock();
        let version_id: i64 = connection
            .query_row(
                "SELECT id FROM package_versions WHERE package_id = ?1 AND version = ?2",
                params![package_id, version],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound("Version"))?;

        connection.execute(
            "INSERT INTO package_tags (package_id, name, version_id) VALUES (?1, ?2, ?3)",
            params![package_id, name, version_id],
        )?;

        Ok(())
    }

    /// Retargets/renames an existing tag.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the target version does not exist.
    pub fn edit_package_tag(&self, package_id: i64, name: &str, new_name: &str, version: &str) -> StoreResult<()> {
        let connection = self.lock();
        let version_id: i64 = connection
            .query_row(
                "SELECT id FROM package_versions WHERE package_id = ?1 AND version = ?2",
                params![package_id, version],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::NotFound("Version"))?;

        connection.execute(
            "UPDATE package_tags SET name = ?1, version_id = ?2 WHERE package_id = ?3 AND name = ?4",
            params![new_name, version_id, package_id, name],
        )?;

        Ok(())
    }

    /// Deletes a tag.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] on an unexpected failure.
    pub fn delete_package_tag(&self, package_id: i64, name: &str) -> StoreResult<()> {
        let connection = self.lock();
        connection.execute("DELETE FROM package_tags WHERE package_id = ?1 AND name = ?2", params![package_id, name])?;
        Ok(())
    }
}

/// One version supplied on package create, or a full replacement on version
/// edit.
#[derive(Debug, Clone)]
pub struct NewPackageVersion {
    /// Semantic version string.
    pub version: String,
    /// Release notes.
    pub description: String,
    /// Optional source repository URL.
    pub repository: Option<String>,
    /// Optional tarball URL.
    pub tarball: Option<String>,
    /// `(algorithm, decoded digest bytes)` pairs.
    pub checksums: Vec<(ChecksumAlgorithm, Vec<u8>)>,
    /// `(dependency package name, version spec)` pairs.
    pub dependencies: Vec<(String, String)>,
}

#[cfg(test)]
#[expect(clippy::unwrap_used, clippy::expect_used, reason = "test assertions on a scratch in-memory store")]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("in-memory store always opens")
    }

    #[test]
    fn create_and_fetch_user() {
        let store = store();
        store.create_user("alex", "alex@example.com", "hash").unwrap();

        let found = store.get_user("alex").unwrap().expect("user exists");
        assert_eq!(found.username, "alex");
        assert_eq!(found.email, "alex@example.com");
        assert!(matches!(found.role, UserRole::Regular));
    }

    #[test]
    fn create_namespace_grants_owner_to_creator() {
        let store = store();
        store.create_user("alex", "alex@example.com", "hash").unwrap();
        store.create_namespace("widgets", "a namespace", None, "alex", "owner").unwrap();

        let namespace_id = store.get_namespace_id("widgets").unwrap().expect("namespace exists");
        let owners = store.get_namespace_owners(namespace_id).unwrap();
        assert_eq!(owners, vec!["alex".to_string()]);
    }

    #[test]
    fn namespace_delete_detaches_packages_instead_of_deleting_them() {
        let store = store();
        store.create_user("alex", "alex@example.com", "hash").unwrap();
        store.create_namespace("widgets", "", None, "alex", "owner").unwrap();
        let namespace_id = store.get_namespace_id("widgets").unwrap();

        store
            .create_package(
                "gadget",
                namespace_id,
                "a gadget",
                &["alex".to_string()].into_iter().collect(),
                &BTreeSet::new(),
                &[],
                &[],
                "alex",
            )
            .unwrap();

        store.delete_namespace("widgets").unwrap();

        let package = store.get_package_brief("gadget").unwrap().expect("package still exists");
        assert_eq!(package.namespace, None);
    }

    #[test]
    fn package_with_dependent_cannot_be_deleted_first() {
        let store = store();
        store.create_user("alex", "alex@example.com", "hash").unwrap();

        store
            .create_package("base", None, "base package", &["alex".to_string()].into_iter().collect(), &BTreeSet::new(), &[], &[], "alex")
            .unwrap();
        store
            .create_package(
                "top",
                None,
                "depends on base",
                &["alex".to_string()].into_iter().collect(),
                &BTreeSet::new(),
                &[NewPackageVersion {
                    version: "1.0.0".to_string(),
                    description: String::new(),
                    repository: None,
                    tarball: None,
                    checksums: vec![],
                    dependencies: vec![("base".to_string(), "^1.0".to_string())],
                }],
                &[],
                "alex",
            )
            .unwrap();

        assert!(store.package_has_dependents("base").unwrap());
        assert!(!store.package_has_dependents("top").unwrap());
    }

    #[test]
    fn unknown_owners_are_reported() {
        let store = store();
        store.create_user("alex", "alex@example.com", "hash").unwrap();
        let candidates: BTreeSet<String> = ["alex".to_string(), "ghost".to_string()].into_iter().collect();
        assert_eq!(store.get_unknown_users(&candidates).unwrap(), vec!["ghost".to_string()]);
    }
}
