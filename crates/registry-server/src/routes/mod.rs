// crates/registry-server/src/routes/mod.rs
// ============================================================================
// Module: Routes
// Description: Wires every handler into one axum Router.
// Purpose: Single place that maps HTTP method/path pairs onto handlers.
// Dependencies: axum, tower-http
// ============================================================================

mod namespace;
mod package;
mod permission;
mod user;

use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router over `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(user::login))
        .route("/user", post(user::register))
        .route("/user/{username}", get(user::get_user))
        .route("/namespace", post(namespace::create_namespace))
        .route(
            "/namespace/{namespace}",
            get(namespace::get_namespace).post(namespace::edit_namespace).delete(namespace::delete_namespace),
        )
        .route("/namespace/{namespace}/package", get(namespace::get_namespace_packages))
        .route(
            "/namespace/{namespace}/user",
            get(namespace::get_namespace_users).post(namespace::create_namespace_user),
        )
        .route(
            "/namespace/{namespace}/user/{username}",
            get(namespace::get_namespace_user)
                .post(namespace::edit_namespace_user)
                .delete(namespace::delete_namespace_user),
        )
        .route(
            "/namespace/{namespace}/role",
            get(namespace::get_namespace_roles).post(namespace::create_namespace_role),
        )
        .route(
            "/namespace/{namespace}/role/{role}",
            get(namespace::get_namespace_role)
                .post(namespace::edit_namespace_role)
                .delete(namespace::delete_namespace_role),
        )
        .route("/package", get(package::get_packages).post(package::create_package))
        .route(
            "/package/{package}",
            get(package::get_package).post(package::edit_package).delete(package::delete_package),
        )
        .route(
            "/package/{package}/version",
            get(package::get_package_versions).post(package::create_package_version),
        )
        .route(
            "/package/{package}/version/{version}",
            get(package::get_package_version).post(package::edit_package_version).delete(package::delete_package_version),
        )
        .route("/package/{package}/tag", get(package::get_package_tags))
        .route(
            "/package/{package}/tag/{tag}",
            get(package::get_package_tag).post(package::create_package_tag).delete(package::delete_package_tag),
        )
        .route("/permission", get(permission::get_permissions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
