// crates/registry-server/src/routes/permission.rs
// ============================================================================
// Module: Permission Catalog Route
// Description: Static listing of every namespace permission code.
// Purpose: Let clients render a role editor without hardcoding the enum.
// Dependencies: axum, registry-core
// ============================================================================

use axum::Json;
use registry_core::model::PermissionCode;

use crate::wire::PermissionOut;

const CATALOG: &[(PermissionCode, &str)] = &[
    (PermissionCode::NamespaceOwner, "Full control of the namespace, including deleting it and managing its owners"),
    (PermissionCode::NamespaceAdmin, "Manage namespace members and roles"),
    (PermissionCode::NamespaceEdit, "Edit namespace metadata"),
    (PermissionCode::PackageCreate, "Create new packages within the namespace"),
    (PermissionCode::PackageEdit, "Edit and publish versions of packages within the namespace"),
];

/// `GET /permission` — no authentication required.
pub async fn get_permissions() -> Json<Vec<PermissionOut>> {
    Json(
        CATALOG
            .iter()
            .map(|(code, description)| PermissionOut {
                code: *code,
                description,
            })
            .collect(),
    )
}
