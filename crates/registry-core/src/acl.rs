// crates/registry-core/src/acl.rs
// ============================================================================
// Module: Registry ACL Engine
// Description: Pure permission-check logic over users and namespace roles.
// Purpose: Decide whether a caller may perform a namespace- or package-scoped
//          operation, without touching storage or HTTP.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! This module has no side effects and no async: it is a set of pure
//! functions over already-loaded permission sets. The HTTP layer
//! (`registry-server::authz`) is responsible for loading the caller's role
//! and namespace permissions and feeding them in here.
//!
//! The tri-state `Option<bool>` chain mirrors the cascading
//! owner -> admin -> edit checks from the pre-Rust implementation: each
//! check returns `Some(true)` on an explicit grant, `Some(false)` on an
//! explicit denial (banned users), or `None` when no rule applied and the
//! caller should fall through to a weaker check.

use std::collections::BTreeSet;

use crate::model::PermissionCode;
use crate::model::UserRole;

/// Returns `true` if `role` is the global admin role.
#[must_use]
pub const fn is_admin(role: UserRole) -> bool {
    matches!(role, UserRole::Admin)
}

/// First link in the tri-state chain: admins always pass, banned users
/// always fail, everyone else falls through (`None`) to a more specific
/// check.
#[must_use]
pub const fn check_user_role(role: UserRole) -> Option<bool> {
    match role {
        UserRole::Admin => Some(true),
        UserRole::Banned => Some(false),
        UserRole::Regular => None,
    }
}

/// A user may view another user's full profile only if they are that user
/// or the role chain grants it (i.e. they are an admin).
#[must_use]
pub fn can_view_user(caller: &str, subject: &str, role: UserRole) -> bool {
    if caller == subject {
        return true;
    }

    check_user_role(role).unwrap_or(false)
}

/// Only a global admin may create a namespace directly; everyone else
/// (including regular, non-banned users) is denied, matching the original
/// `require(check_user_role)` chain where a `None` (no-rule) result is
/// treated as a denial rather than a default allow.
#[must_use]
pub const fn can_add_namespace(role: UserRole) -> bool {
    matches!(check_user_role(role), Some(true))
}

/// Checks namespace-owner-level access: global admin, or an explicit
/// `NamespaceOwner` permission.
#[must_use]
pub fn check_namespace_owner(role: UserRole, namespace_permissions: &BTreeSet<PermissionCode>) -> Option<bool> {
    if let Some(granted) = check_user_role(role) {
        return Some(granted);
    }

    if namespace_permissions.contains(&PermissionCode::NamespaceOwner) {
        return Some(true);
    }

    None
}

/// Checks namespace-admin-level access: falls back from owner-level, then
/// an explicit `NamespaceAdmin` permission.
#[must_use]
pub fn check_namespace_admin(role: UserRole, namespace_permissions: &BTreeSet<PermissionCode>) -> Option<bool> {
    if let Some(granted) = check_namespace_owner(role, namespace_permissions) {
        return Some(granted);
    }

    if namespace_permissions.contains(&PermissionCode::NamespaceAdmin) {
        return Some(true);
    }

    None
}

/// Checks namespace-edit-level access: falls back from admin-level, then an
/// explicit `NamespaceEdit` permission.
#[must_use]
pub fn check_namespace_edit(role: UserRole, namespace_permissions: &BTreeSet<PermissionCode>) -> Option<bool> {
    if let Some(granted) = check_namespace_admin(role, namespace_permissions) {
        return Some(granted);
    }

    if namespace_permissions.contains(&PermissionCode::NamespaceEdit) {
        return Some(true);
    }

    None
}

/// Returns `true` if `held` (expanded through [`crate::model::implies`])
/// covers every code in `required`.
#[must_use]
pub fn has_namespace_permissions(held: &BTreeSet<PermissionCode>, required: &BTreeSet<PermissionCode>) -> bool {
    crate::model::implies_all(held, required)
}

/// Collapses a tri-state check into a pass/fail decision.
///
/// `None` (no applicable rule) denies unless `allow_by_default` is set.
#[must_use]
pub const fn require(check: Option<bool>, allow_by_default: bool) -> bool {
    match check {
        Some(value) => value,
        None => allow_by_default,
    }
}

/// Package-level edit/delete access: the namespace edit chain, or being a
/// listed owner of the specific package.
#[must_use]
pub fn can_edit_package(
    role: UserRole,
    namespace_permissions: &BTreeSet<PermissionCode>,
    package_owners: &[String],
    caller_username: &str,
) -> bool {
    if check_user_role(role) == Some(false) {
        return false;
    }

    if require(check_namespace_edit(role, namespace_permissions), false) {
        return true;
    }

    package_owners.iter().any(|owner| owner == caller_username)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(codes: &[PermissionCode]) -> BTreeSet<PermissionCode> {
        codes.iter().copied().collect()
    }

    #[test]
    fn banned_user_fails_every_check() {
        let owner_perms = perms(&[PermissionCode::NamespaceOwner]);
        assert_eq!(check_user_role(UserRole::Banned), Some(false));
        assert!(!require(check_namespace_owner(UserRole::Banned, &owner_perms), false));
    }

    #[test]
    fn banned_user_with_namespace_owner_permission_still_fails() {
        let owner_perms = perms(&[PermissionCode::NamespaceOwner]);
        assert!(!require(check_namespace_owner(UserRole::Banned, &owner_perms), false));
        assert!(!require(check_namespace_admin(UserRole::Banned, &owner_perms), false));
        assert!(!require(check_namespace_edit(UserRole::Banned, &owner_perms), false));
    }

    #[test]
    fn banned_package_owner_cannot_edit() {
        let empty = perms(&[]);
        let owners = vec!["alex".to_string()];
        assert!(!can_edit_package(UserRole::Banned, &empty, &owners, "alex"));
    }

    #[test]
    fn admin_passes_without_explicit_permissions() {
        let empty = perms(&[]);
        assert!(require(check_namespace_owner(UserRole::Admin, &empty), false));
    }

    #[test]
    fn owner_permission_satisfies_admin_and_edit_checks() {
        let owner_perms = perms(&[PermissionCode::NamespaceOwner]);
        assert!(require(check_namespace_admin(UserRole::Regular, &owner_perms), false));
        assert!(require(check_namespace_edit(UserRole::Regular, &owner_perms), false));
    }

    #[test]
    fn no_rule_denies_by_default() {
        let empty = perms(&[]);
        assert!(!require(check_namespace_owner(UserRole::Regular, &empty), false));
    }

    #[test]
    fn package_owner_without_namespace_permissions_can_still_edit() {
        let empty = perms(&[]);
        let owners = vec!["alex".to_string()];
        assert!(can_edit_package(UserRole::Regular, &empty, &owners, "alex"));
        assert!(!can_edit_package(UserRole::Regular, &empty, &owners, "sam"));
    }

    #[test]
    fn can_view_user_requires_self_or_admin() {
        assert!(can_view_user("alex", "alex", UserRole::Regular));
        assert!(!can_view_user("alex", "sam", UserRole::Regular));
        assert!(can_view_user("alex", "sam", UserRole::Admin));
    }
}
