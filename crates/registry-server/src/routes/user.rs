// crates/registry-server/src/routes/user.rs
// ============================================================================
// Module: User Routes
// Description: Login, registration, and profile lookup.
// Purpose: Mirror the reference implementation's `/login`, `/user`,
//          `/user/{username}` handler sequencing.
// Dependencies: axum, registry-auth, registry-store-sqlite
// ============================================================================

use axum::extract::Form;
use axum::extract::Path;
use axum::extract::State;
use axum::Json;
use time::Duration;

use registry_auth::hash_password;
use registry_auth::verify_password;
use registry_auth::TokenCodec;
use registry_core::acl;

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;
use crate::wire::AuthToken;
use crate::wire::FullUserInfo;
use crate::wire::LoginForm;
use crate::wire::UserRegister;

/// `POST /login` — exchanges a username/password for a bearer token.
///
/// # Errors
/// Returns [`ApiError::InvalidCredentials`] if the username is unknown or
/// the password does not match.
pub async fn login(State(state): State<AppState>, Form(body): Form<LoginForm>) -> Result<Json<AuthToken>, ApiError> {
    let record = state.store.get_user(&body.username)?.ok_or(ApiError::InvalidCredentials)?;

    let matches = verify_password(&body.password, &record.pwhash).map_err(|_error| ApiError::Internal)?;

    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = state
        .token_codec
        .mint(&record.username, Duration::seconds(i64::try_from(state.token_expiry_seconds).unwrap_or(i64::MAX)))
        .map_err(|_error| ApiError::Internal)?;

    Ok(Json(AuthToken {
        token_type: "bearer",
        access_token,
    }))
}

/// `POST /user` — registers a new account.
///
/// # Errors
/// Returns [`ApiError::UsernameTaken`] or [`ApiError::EmailRegistered`] if
/// either is already in use.
pub async fn register(State(state): State<AppState>, Json(body): Json<UserRegister>) -> Result<Json<FullUserInfo>, ApiError> {
    if !registry_core::validate::is_valid_identity_name(&body.username) {
        return Err(ApiError::Validation("invalid username".to_string()));
    }

    if state.store.get_user(&body.username)?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    if state.store.get_user_by_email(&body.email)?.is_some() {
        return Err(ApiError::EmailRegistered);
    }

    let pwhash = hash_password(&body.password).map_err(|_error| ApiError::Internal)?;
    let record = state.store.create_user(&body.username, &body.email, &pwhash)?;

    Ok(Json(FullUserInfo {
        id: record.id,
        username: record.username,
        email: record.email,
        registered: record.registered,
        namespaces: Vec::new(),
        role: record.role,
    }))
}

/// `GET /user/{username}` — returns a user's full profile.
///
/// Matches the reference implementation: only the user themselves, or a
/// global admin, may view it.
///
/// # Errors
/// Returns [`ApiError::NoPermission`] if the caller is neither, or
/// [`ApiError::NotFound`] if the user does not exist.
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(username): Path<String>,
) -> Result<Json<FullUserInfo>, ApiError> {
    if !acl::can_view_user(&caller.username, &username, caller.role) {
        return Err(ApiError::NoPermission);
    }

    let record = state.store.get_user(&username)?.ok_or(ApiError::NotFound { what: "User" })?;
    let namespaces = state.store.get_user_namespaces(&username)?;

    Ok(Json(FullUserInfo {
        id: record.id,
        username: record.username,
        email: record.email,
        registered: record.registered,
        namespaces,
        role: record.role,
    }))
}
