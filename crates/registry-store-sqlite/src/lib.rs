// crates/registry-store-sqlite/src/lib.rs
// ============================================================================
// Module: Registry Store (SQLite)
// Description: Durable package registry persistence.
// Purpose: The only crate in the workspace that knows SQL.
// ============================================================================

//! ## Overview
//! [`SqliteStore`] is the sole gateway to the on-disk database. Every public
//! method either issues one statement or opens one transaction; nothing here
//! holds a transaction open across an `.await` point because nothing here
//! `.await`s at all — storage is synchronous, and `registry-server` offloads
//! calls to a blocking task.

mod dto;
mod store;

pub use dto::NamespaceAggregate;
pub use dto::NamespaceMemberView;
pub use dto::NamespaceRoleView;
pub use dto::PackageAggregate;
pub use dto::PackageBrief;
pub use dto::PackageChecksumView;
pub use dto::PackageDependencyView;
pub use dto::PackageTagView;
pub use dto::PackageVersionView;
pub use dto::UserRecord;
pub use store::NewPackageVersion;
pub use store::SqliteStore;
pub use store::StoreError;
