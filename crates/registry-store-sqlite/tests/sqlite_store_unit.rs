// crates/registry-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Integration tests: SQLite registry store
// ============================================================================

#![expect(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions over a scratch tempfile/in-memory store"
)]

use std::collections::BTreeSet;

use registry_core::model::PermissionCode;
use registry_store_sqlite::NewPackageVersion;
use registry_store_sqlite::SqliteStore;

fn tempfile_store_path() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.sqlite3");
    (dir, path)
}

#[test]
fn fresh_database_file_initializes_schema_once() {
    let (_dir, path) = tempfile_store_path();
    let store = SqliteStore::open(&path).expect("store opens");
    drop(store);

    // Reopening must not re-run CREATE TABLE against an existing schema.
    SqliteStore::open(&path).expect("reopen succeeds");
}

#[test]
fn reopening_an_existing_database_preserves_data() {
    let (dir, path) = tempfile_store_path();

    {
        let store = SqliteStore::open(&path).expect("store opens");
        store.create_user("alex", "alex@example.com", "hash").expect("create user");
    }

    let reopened = SqliteStore::open(&path).expect("reopen succeeds");
    let found = reopened.get_user("alex").expect("query succeeds");
    assert!(found.is_some());
    drop(dir);
}

#[test]
fn duplicate_username_is_rejected_by_unique_constraint() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_user("alex", "alex@example.com", "hash").unwrap();

    let result = store.create_user("alex", "other@example.com", "hash2");
    assert!(result.is_err());
}

#[test]
fn namespace_role_cannot_be_deleted_while_it_has_members() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_user("alex", "alex@example.com", "hash").unwrap();
    store.create_namespace("widgets", "", None, "alex", "owner").unwrap();
    let namespace_id = store.get_namespace_id("widgets").unwrap().unwrap();

    assert!(store.namespace_role_has_members(namespace_id, "owner").unwrap());
}

#[test]
fn namespace_role_permissions_round_trip() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_user("alex", "alex@example.com", "hash").unwrap();
    store.create_namespace("widgets", "", None, "alex", "owner").unwrap();
    let namespace_id = store.get_namespace_id("widgets").unwrap().unwrap();

    let mut permissions = BTreeSet::new();
    permissions.insert(PermissionCode::NamespaceEdit);
    permissions.insert(PermissionCode::PackageCreate);

    store.create_namespace_role(namespace_id, "contributor", &permissions, "alex").unwrap();

    let role = store.get_namespace_role("widgets", "contributor").unwrap().expect("role exists");
    assert_eq!(role.permissions, permissions);
}

#[test]
fn package_version_checksums_and_dependencies_round_trip() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_user("alex", "alex@example.com", "hash").unwrap();

    store
        .create_package(
            "base",
            None,
            "base package",
            &["alex".to_string()].into_iter().collect(),
            &BTreeSet::new(),
            &[NewPackageVersion {
                version: "1.0.0".to_string(),
                description: "first release".to_string(),
                repository: Some("https://example.com/base".to_string()),
                tarball: None,
                checksums: vec![(registry_core::model::ChecksumAlgorithm::Sha256, vec![0_u8; 32])],
                dependencies: vec![],
            }],
            &[],
            "alex",
        )
        .unwrap();

    store
        .create_package(
            "top",
            None,
            "depends on base",
            &["alex".to_string()].into_iter().collect(),
            &BTreeSet::new(),
            &[NewPackageVersion {
                version: "2.0.0".to_string(),
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

    let aggregate = store.get_package("top").unwrap().expect("package exists");
    let version = &aggregate.versions[0];
    assert_eq!(version.dependencies.len(), 1);
    assert_eq!(version.dependencies[0].package, "base");

    let base = store.get_package("base").unwrap().expect("package exists");
    assert_eq!(base.versions[0].checksums.len(), 1);
}

#[test]
fn package_tag_must_reference_an_existing_version() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_user("alex", "alex@example.com", "hash").unwrap();

    store
        .create_package(
            "gadget",
            None,
            "a gadget",
            &["alex".to_string()].into_iter().collect(),
            &BTreeSet::new(),
            &[NewPackageVersion {
                version: "1.0.0".to_string(),
                description: String::new(),
                repository: None,
                tarball: None,
                checksums: vec![],
                dependencies: vec![],
            }],
            &[],
            "alex",
        )
        .unwrap();

    let package_id = store.get_package_id("gadget").unwrap().unwrap();
    let result = store.create_package_tag(package_id, "latest", "9.9.9");
    assert!(result.is_err());

    store.create_package_tag(package_id, "latest", "1.0.0").unwrap();
    assert!(store.package_version_is_tagged(package_id, "1.0.0").unwrap());
}

#[test]
fn label_garbage_collection_lets_a_label_name_be_reused_after_delete() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_user("alex", "alex@example.com", "hash").unwrap();

    let labels: BTreeSet<String> = ["cli".to_string()].into_iter().collect();
    store
        .create_package("gadget", None, "a gadget", &["alex".to_string()].into_iter().collect(), &labels, &[], &[], "alex")
        .unwrap();

    store.delete_package("gadget").unwrap();

    store
        .create_package("widget", None, "a widget", &["alex".to_string()].into_iter().collect(), &labels, &[], &[], "alex")
        .unwrap();

    let aggregate = store.get_package("widget").unwrap().expect("package exists");
    assert_eq!(aggregate.labels, vec!["cli".to_string()]);
}

#[test]
fn concurrent_reads_do_not_block_on_wal_mode() {
    let (_dir, path) = tempfile_store_path();
    let store = SqliteStore::open(&path).expect("store opens");
    store.create_user("alex", "alex@example.com", "hash").unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let found = store.get_user("alex").unwrap();
                assert!(found.is_some());
            });
        }
    });
}
