// crates/registry-server/src/extract.rs
// ============================================================================
// Module: Bearer Auth Extractor
// Description: Resolves a validated bearer token into the calling user.
// Purpose: Keep token parsing and user lookup out of every route handler.
// Dependencies: axum, registry-auth, registry-store-sqlite
// ============================================================================

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use registry_core::model::UserRole;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller for a `bearer`-protected route.
pub struct AuthenticatedUser {
    /// The caller's username.
    pub username: String,
    /// The caller's global role.
    pub role: UserRole,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        let claims = state.token_codec.verify(token).map_err(|_error| ApiError::Unauthorized)?;

        let record = state
            .store
            .get_user(&claims.username)
            .map_err(|_error| ApiError::Internal)?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self {
            username: record.username,
            role: record.role,
        })
    }
}
