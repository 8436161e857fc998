// crates/registry-server/src/routes/namespace.rs
// ============================================================================
// Module: Namespace Routes
// Description: Namespace, namespace-membership, and namespace-role CRUD.
// Purpose: Mirror the reference implementation's exact handler sequencing,
//          including the no-owner-remains and role-not-empty guards.
// Dependencies: axum, registry-core, registry-store-sqlite
// ============================================================================

use std::collections::BTreeSet;

use axum::extract::Path;
use axum::extract::State;
use axum::Json;

use registry_core::acl;
use registry_core::model::PermissionCode;

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;
use crate::wire::NamespaceBody;
use crate::wire::NamespaceOut;
use crate::wire::NamespaceRoleBody;
use crate::wire::NamespaceRoleOut;
use crate::wire::NamespaceUserCreate;
use crate::wire::NamespaceUserEdit;
use crate::wire::NamespaceUserOut;
use crate::wire::PackageBriefOut;

fn to_namespace_out(aggregate: registry_store_sqlite::NamespaceAggregate) -> NamespaceOut {
    NamespaceOut {
        name: aggregate.name,
        description: aggregate.description,
        homepage: aggregate.homepage,
        created_date: aggregate.created_date,
        users: aggregate
            .members
            .into_iter()
            .map(|member| NamespaceUserOut {
                username: member.username,
                role: member.role,
            })
            .collect(),
        roles: aggregate
            .roles
            .into_iter()
            .map(|role| NamespaceRoleOut {
                name: role.name,
                permissions: role.permissions,
            })
            .collect(),
    }
}

/// `POST /namespace` — creates a namespace. Only a global admin may create
/// one directly.
///
/// # Errors
/// Returns [`ApiError::NoPermission`] if the caller is not an admin, or
/// [`ApiError::AlreadyExists`] if the name is taken.
pub async fn create_namespace(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(body): Json<NamespaceBody>,
) -> Result<Json<NamespaceOut>, ApiError> {
    if !acl::can_add_namespace(caller.role) {
        return Err(ApiError::NoPermission);
    }

    if !registry_core::validate::is_valid_identity_name(&body.name) {
        return Err(ApiError::Validation("invalid namespace name".to_string()));
    }

    if state.store.namespace_exists(&body.name)? {
        return Err(ApiError::AlreadyExists { what: "Namespace" });
    }

    state.store.create_namespace(
        &body.name,
        &body.description,
        body.homepage.as_deref(),
        &caller.username,
        &state.default_namespace_owner_role,
    )?;

    let aggregate = state.store.get_namespace(&body.name)?.ok_or(ApiError::Internal)?;
    Ok(Json(to_namespace_out(aggregate)))
}

/// `GET /namespace/{namespace}` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the namespace does not exist.
pub async fn get_namespace(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<NamespaceOut>, ApiError> {
    let aggregate = state.store.get_namespace(&name)?.ok_or(ApiError::NotFound { what: "Namespace" })?;
    Ok(Json(to_namespace_out(aggregate)))
}

/// `POST /namespace/{namespace}` — edits a namespace. Renaming additionally
/// requires admin-level access and checks the new name is free.
///
/// # Errors
/// Returns [`ApiError::NoPermission`] or [`ApiError::AlreadyExists`].
pub async fn edit_namespace(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(name): Path<String>,
    Json(body): Json<NamespaceBody>,
) -> Result<Json<NamespaceOut>, ApiError> {
    let permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;

    if !acl::require(acl::check_namespace_edit(caller.role, &permissions), false) {
        return Err(ApiError::NoPermission);
    }

    let renaming = body.name != name;

    if renaming {
        if !acl::require(acl::check_namespace_admin(caller.role, &permissions), false) {
            return Err(ApiError::NoPermission);
        }

        if state.store.namespace_exists(&body.name)? {
            return Err(ApiError::AlreadyExists { what: "Namespace" });
        }
    }

    state.store.edit_namespace(&name, &body.name, &body.description, body.homepage.as_deref())?;

    let aggregate = state.store.get_namespace(&body.name)?.ok_or(ApiError::Internal)?;
    Ok(Json(to_namespace_out(aggregate)))
}

/// `DELETE /namespace/{namespace}` — only a namespace owner (or global
/// admin) may delete it.
///
/// # Errors
/// Returns [`ApiError::NoPermission`] or [`ApiError::NotFound`].
pub async fn delete_namespace(State(state): State<AppState>, caller: AuthenticatedUser, Path(name): Path<String>) -> Result<(), ApiError> {
    let permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;

    if !acl::require(acl::check_namespace_owner(caller.role, &permissions), false) {
        return Err(ApiError::NoPermission);
    }

    if state.store.get_namespace_id(&name)?.is_none() {
        return Err(ApiError::NotFound { what: "Namespace" });
    }

    state.store.delete_namespace(&name)?;
    Ok(())
}

/// `GET /namespace/{namespace}/package` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::Internal`] on an unexpected storage failure.
pub async fn get_namespace_packages(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Vec<PackageBriefOut>>, ApiError> {
    Ok(Json(state.store.get_namespace_packages(&name)?.into_iter().map(PackageBriefOut::from).collect()))
}

/// `GET /namespace/{namespace}/user` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::Internal`] on an unexpected storage failure.
pub async fn get_namespace_users(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Vec<NamespaceUserOut>>, ApiError> {
    let members = state.store.get_namespace_users(&name)?;
    Ok(Json(
        members
            .into_iter()
            .map(|member| NamespaceUserOut {
                username: member.username,
                role: member.role,
            })
            .collect(),
    ))
}

/// `GET /namespace/{namespace}/user/{username}` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the user is not a member.
pub async fn get_namespace_user(
    State(state): State<AppState>,
    Path((name, username)): Path<(String, String)>,
) -> Result<Json<NamespaceUserOut>, ApiError> {
    let member = state
        .store
        .get_namespace_user(&name, &username)?
        .ok_or(ApiError::NotFound { what: "User" })?;

    Ok(Json(NamespaceUserOut {
        username: member.username,
        role: member.role,
    }))
}

/// `POST /namespace/{namespace}/user` — adds a member. Requires
/// namespace-admin access; the caller must also already hold every
/// permission the target role grants (an admin may not hand out a
/// permission they don't have themselves), unless the caller is a global
/// admin.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`], or
/// [`ApiError::AlreadyExists`].
pub async fn create_namespace_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(name): Path<String>,
    Json(body): Json<NamespaceUserCreate>,
) -> Result<Json<NamespaceUserOut>, ApiError> {
    let namespace_id = state.store.get_namespace_id(&name)?.ok_or(ApiError::NotFound { what: "Namespace" })?;
    let caller_permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;

    if !acl::require(acl::check_namespace_admin(caller.role, &caller_permissions), false) {
        return Err(ApiError::NoPermission);
    }

    if state.store.get_user(&body.username)?.is_none() {
        return Err(ApiError::NotFound { what: "User" });
    }

    if state.store.namespace_user_exists(namespace_id, &body.username)? {
        return Err(ApiError::AlreadyExists { what: "User" });
    }

    let role = state.store.get_namespace_role(&name, &body.role)?.ok_or(ApiError::NotFound { what: "Role" })?;

    if !acl::is_admin(caller.role) && !acl::has_namespace_permissions(&caller_permissions, &role.permissions) {
        return Err(ApiError::NoPermission);
    }

    state.store.create_namespace_user(namespace_id, &body.username, &body.role, &caller.username)?;

    Ok(Json(NamespaceUserOut {
        username: body.username,
        role: body.role,
    }))
}

/// `POST /namespace/{namespace}/user/{username}` — changes a member's role.
/// Rejects moving the namespace's last owner out of an owning role.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`], or
/// [`ApiError::NoNamespaceOwnerRemains`].
pub async fn edit_namespace_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, username)): Path<(String, String)>,
    Json(body): Json<NamespaceUserEdit>,
) -> Result<Json<NamespaceUserOut>, ApiError> {
    let namespace_id = state.store.get_namespace_id(&name)?.ok_or(ApiError::NotFound { what: "Namespace" })?;
    let caller_permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;

    if !acl::require(acl::check_namespace_admin(caller.role, &caller_permissions), false) {
        return Err(ApiError::NoPermission);
    }

    if state.store.get_namespace_user(&name, &username)?.is_none() {
        return Err(ApiError::NotFound { what: "User" });
    }

    let new_role = state.store.get_namespace_role(&name, &body.role)?.ok_or(ApiError::NotFound { what: "Role" })?;

    if !acl::is_admin(caller.role) && !acl::has_namespace_permissions(&caller_permissions, &new_role.permissions) {
        return Err(ApiError::NoPermission);
    }

    if !new_role.permissions.contains(&PermissionCode::NamespaceOwner) {
        let owners = state.store.get_namespace_owners(namespace_id)?;
        if owners.iter().any(|owner| owner == &username) && owners.len() <= 1 {
            return Err(ApiError::NoNamespaceOwnerRemains);
        }
    }

    state.store.edit_namespace_user(namespace_id, &username, &body.role, &caller.username)?;

    Ok(Json(NamespaceUserOut {
        username,
        role: body.role,
    }))
}

/// `DELETE /namespace/{namespace}/user/{username}` — removes a member. A
/// member may remove themselves; otherwise the caller needs permissions at
/// least as broad as the member's own. Rejects removing the namespace's
/// last owner.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`], or
/// [`ApiError::NoNamespaceOwnerRemains`].
pub async fn delete_namespace_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, username)): Path<(String, String)>,
) -> Result<(), ApiError> {
    let namespace_id = state.store.get_namespace_id(&name)?.ok_or(ApiError::NotFound { what: "Namespace" })?;

    if state.store.get_namespace_user(&name, &username)?.is_none() {
        return Err(ApiError::NotFound { what: "User" });
    }

    if caller.username != username {
        let caller_permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;
        let member_permissions = state.store.get_namespace_user_permissions(&name, &username)?;

        let allowed = acl::is_admin(caller.role) || acl::has_namespace_permissions(&caller_permissions, &member_permissions);

        if !allowed {
            return Err(ApiError::NoPermission);
        }
    }

    let owners = state.store.get_namespace_owners(namespace_id)?;
    if owners.iter().any(|owner| owner == &username) && owners.len() <= 1 {
        return Err(ApiError::NoNamespaceOwnerRemains);
    }

    state.store.delete_namespace_user(namespace_id, &username)?;
    Ok(())
}

/// `GET /namespace/{namespace}/role` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::Internal`] on an unexpected storage failure.
pub async fn get_namespace_roles(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Vec<NamespaceRoleOut>>, ApiError> {
    let roles = state.store.get_namespace_roles(&name)?;
    Ok(Json(
        roles
            .into_iter()
            .map(|role| NamespaceRoleOut {
                name: role.name,
                permissions: role.permissions,
            })
            .collect(),
    ))
}

/// `GET /namespace/{namespace}/role/{role}` — no authentication required.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the role does not exist.
pub async fn get_namespace_role(
    State(state): State<AppState>,
    Path((name, role)): Path<(String, String)>,
) -> Result<Json<NamespaceRoleOut>, ApiError> {
    let found = state.store.get_namespace_role(&name, &role)?.ok_or(ApiError::NotFound { what: "Role" })?;

    Ok(Json(NamespaceRoleOut {
        name: found.name,
        permissions: found.permissions,
    }))
}

/// `POST /namespace/{namespace}/role` — creates a role. The caller may only
/// hand out permissions they themselves hold, unless they are a global
/// admin.
///
/// # Errors
/// Returns [`ApiError::NoPermission`] or [`ApiError::AlreadyExists`].
pub async fn create_namespace_role(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(name): Path<String>,
    Json(body): Json<NamespaceRoleBody>,
) -> Result<Json<NamespaceRoleOut>, ApiError> {
    let namespace_id = state.store.get_namespace_id(&name)?.ok_or(ApiError::NotFound { what: "Namespace" })?;
    let caller_permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;

    if !acl::require(acl::check_namespace_admin(caller.role, &caller_permissions), false) {
        return Err(ApiError::NoPermission);
    }

    if !acl::is_admin(caller.role) && !acl::has_namespace_permissions(&caller_permissions, &body.permissions) {
        return Err(ApiError::NoPermission);
    }

    if state.store.namespace_role_exists(namespace_id, &body.name)? {
        return Err(ApiError::AlreadyExists { what: "Role" });
    }

    state.store.create_namespace_role(namespace_id, &body.name, &body.permissions, &caller.username)?;

    Ok(Json(NamespaceRoleOut {
        name: body.name,
        permissions: body.permissions,
    }))
}

/// `POST /namespace/{namespace}/role/{role}` — edits a role's name and
/// permission set. Rejects a change that would leave the namespace
/// ownerless: dropping `NamespaceOwner` from a role is only safe if every
/// member still holding that role is not among the namespace's current
/// owners once this role's grant is removed.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`],
/// [`ApiError::AlreadyExists`], or [`ApiError::NoNamespaceOwnerRemains`].
pub async fn edit_namespace_role(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, role)): Path<(String, String)>,
    Json(body): Json<NamespaceRoleBody>,
) -> Result<Json<NamespaceRoleOut>, ApiError> {
    let namespace_id = state.store.get_namespace_id(&name)?.ok_or(ApiError::NotFound { what: "Namespace" })?;
    let caller_permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;

    if !acl::require(acl::check_namespace_admin(caller.role, &caller_permissions), false) {
        return Err(ApiError::NoPermission);
    }

    let current = state.store.get_namespace_role(&name, &role)?.ok_or(ApiError::NotFound { what: "Role" })?;

    let renaming = body.name != role;
    if renaming && state.store.namespace_role_exists(namespace_id, &body.name)? {
        return Err(ApiError::AlreadyExists { what: "Role" });
    }

    let is_admin_caller = acl::is_admin(caller.role);

    if !is_admin_caller && !acl::has_namespace_permissions(&caller_permissions, &body.permissions) {
        return Err(ApiError::NoPermission);
    }

    if !is_admin_caller && !acl::has_namespace_permissions(&caller_permissions, &current.permissions) {
        return Err(ApiError::NoPermission);
    }

    let dropping_owner = current.permissions.contains(&PermissionCode::NamespaceOwner) && !body.permissions.contains(&PermissionCode::NamespaceOwner);

    if dropping_owner {
        let owners: BTreeSet<String> = state.store.get_namespace_owners(namespace_id)?.into_iter().collect();
        let affected: BTreeSet<String> = state.store.get_namespace_role_users(namespace_id, &role)?.into_iter().collect();

        if owners.difference(&affected).next().is_none() {
            return Err(ApiError::NoNamespaceOwnerRemains);
        }
    }

    state.store.edit_namespace_role(namespace_id, &role, &body.name, &body.permissions, &caller.username)?;

    Ok(Json(NamespaceRoleOut {
        name: body.name,
        permissions: body.permissions,
    }))
}

/// `DELETE /namespace/{namespace}/role/{role}` — rejects deleting a role
/// that still has members.
///
/// # Errors
/// Returns [`ApiError::NoPermission`], [`ApiError::NotFound`], or
/// [`ApiError::RoleNotEmpty`].
pub async fn delete_namespace_role(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((name, role)): Path<(String, String)>,
) -> Result<(), ApiError> {
    let namespace_id = state.store.get_namespace_id(&name)?.ok_or(ApiError::NotFound { what: "Namespace" })?;
    let caller_permissions = state.store.get_namespace_user_permissions(&name, &caller.username)?;

    if !acl::require(acl::check_namespace_admin(caller.role, &caller_permissions), false) {
        return Err(ApiError::NoPermission);
    }

    let found = state.store.get_namespace_role(&name, &role)?.ok_or(ApiError::NotFound { what: "Role" })?;

    if !acl::is_admin(caller.role) && !acl::has_namespace_permissions(&caller_permissions, &found.permissions) {
        return Err(ApiError::NoPermission);
    }

    if state.store.namespace_role_has_members(namespace_id, &role)? {
        return Err(ApiError::RoleNotEmpty);
    }

    state.store.delete_namespace_role(namespace_id, &role)?;
    Ok(())
}
