// crates/registry-store-sqlite/src/schema.rs
// ============================================================================
// Module: Schema
// Description: Versioned schema creation for the registry store.
// Purpose: Bring a fresh or existing database file up to the current schema.
// ============================================================================

use rusqlite::params;
use rusqlite::Connection;
use rusqlite::OptionalExtension;

/// Creates the schema if absent, recording `target_version` in `store_meta`.
///
/// Existing databases are trusted to already be at `target_version`; this
/// store does not yet ship forward migrations between versions, matching
/// the single-version scope of the current on-disk format.
///
/// # Errors
/// Returns [`rusqlite::Error`] if any statement fails.
pub(crate) fn initialize(connection: &mut Connection, target_version: i64) -> rusqlite::Result<()> {
    let tx = connection.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS store_meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
         );",
    )?;

    let existing: Option<String> = tx
        .query_row("SELECT value FROM store_meta WHERE key = 'schema_version'", params![], |row| row.get(0))
        .optional()?;

    if existing.is_none() {
        tx.execute_batch(DDL)?;
        tx.execute(
            "INSERT INTO store_meta (key, value) VALUES ('schema_version', ?1)",
            params![target_version.to_string()],
        )?;
    }

    tx.commit()
}

const DDL: &str = "
CREATE TABLE users (
    id         INTEGER PRIMARY KEY,
    username   TEXT NOT NULL UNIQUE,
    email      TEXT NOT NULL UNIQUE,
    pwhash     TEXT NOT NULL,
    registered INTEGER NOT NULL,
    role       TEXT NOT NULL DEFAULT 'regular'
);

CREATE TABLE namespaces (
    id           INTEGER PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    description  TEXT NOT NULL DEFAULT '',
    homepage     TEXT,
    created_date INTEGER NOT NULL
);

CREATE TABLE namespace_roles (
    id           INTEGER PRIMARY KEY,
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    created_date INTEGER NOT NULL,
    created_by   TEXT NOT NULL,
    updated_date INTEGER NOT NULL,
    updated_by   TEXT NOT NULL,
    UNIQUE (namespace_id, name)
);

CREATE TABLE namespace_role_permissions (
    role_id    INTEGER NOT NULL REFERENCES namespace_roles(id) ON DELETE CASCADE,
    permission TEXT NOT NULL,
    PRIMARY KEY (role_id, permission)
);

CREATE TABLE namespace_members (
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id) ON DELETE CASCADE,
    role_id      INTEGER NOT NULL REFERENCES namespace_roles(id) ON DELETE RESTRICT,
    added_date   INTEGER NOT NULL,
    added_by     TEXT NOT NULL,
    updated_date INTEGER NOT NULL,
    updated_by   TEXT NOT NULL,
    PRIMARY KEY (user_id, namespace_id)
);

CREATE TABLE labels (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE packages (
    id           INTEGER PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    namespace_id INTEGER REFERENCES namespaces(id) ON DELETE SET NULL,
    summary      TEXT NOT NULL DEFAULT '',
    downloads    INTEGER NOT NULL DEFAULT 0,
    created_date INTEGER NOT NULL,
    created_by   TEXT NOT NULL,
    updated_date INTEGER NOT NULL,
    updated_by   TEXT NOT NULL
);

CREATE TABLE package_owners (
    package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    username   TEXT NOT NULL,
    PRIMARY KEY (package_id, username)
);

CREATE TABLE package_labels (
    package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    label_id   INTEGER NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
    PRIMARY KEY (package_id, label_id)
);

CREATE TABLE package_versions (
    id           INTEGER PRIMARY KEY,
    package_id   INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    version      TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    repository   TEXT,
    tarball      TEXT,
    created_date INTEGER NOT NULL,
    created_by   TEXT NOT NULL,
    UNIQUE (package_id, version)
);

CREATE TABLE package_version_checksums (
    version_id INTEGER NOT NULL REFERENCES package_versions(id) ON DELETE CASCADE,
    algorithm  TEXT NOT NULL,
    value      TEXT NOT NULL,
    PRIMARY KEY (version_id, algorithm)
);

CREATE TABLE package_version_dependencies (
    version_id            INTEGER NOT NULL REFERENCES package_versions(id) ON DELETE CASCADE,
    dependency_package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE RESTRICT,
    spec                  TEXT NOT NULL,
    PRIMARY KEY (version_id, dependency_package_id)
);

CREATE TABLE package_tags (
    package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    version_id INTEGER NOT NULL REFERENCES package_versions(id) ON DELETE RESTRICT,
    PRIMARY KEY (package_id, name)
);

CREATE INDEX idx_namespace_members_namespace ON namespace_members(namespace_id);
CREATE INDEX idx_package_versions_package ON package_versions(package_id);
CREATE INDEX idx_package_tags_package ON package_tags(package_id);
CREATE INDEX idx_package_version_dependencies_dependency ON package_version_dependencies(dependency_package_id);
";
