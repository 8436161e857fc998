// crates/registry-server/src/error.rs
// ============================================================================
// Module: API Error Taxonomy
// Description: One error enum, one HTTP status and JSON body per variant.
// Purpose: Give every handler a single `Result<T, ApiError>` return type.
// Dependencies: axum, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `ApiError` is the only error type a route handler returns. It carries
//! just enough structure to pick an HTTP status and render a JSON body;
//! anything that needs more context than a status and a detail string
//! belongs in a log line, not a response.

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;

use registry_store_sqlite::StoreError;

/// Every error a route handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No bearer token, or the token is malformed/expired/forged.
    #[error("Could not authenticate the user")]
    Unauthorized,
    /// A login attempt presented a username/password that do not match.
    #[error("Invalid username and/or password")]
    InvalidCredentials,
    /// The caller is authenticated but lacks the permission the operation needs.
    #[error("Access denied due to insufficient permissions")]
    NoPermission,
    /// Registration used a username already in use.
    #[error("Username is already taken")]
    UsernameTaken,
    /// Registration used an email already in use.
    #[error("Email is already registered")]
    EmailRegistered,
    /// The named resource does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Human-readable resource kind, e.g. `"Namespace"`.
        what: &'static str,
    },
    /// The named resource already exists.
    #[error("{what} already exists")]
    AlreadyExists {
        /// Human-readable resource kind, e.g. `"Package"`.
        what: &'static str,
    },
    /// Removing/editing a namespace member or role would leave the
    /// namespace without an owner.
    #[error("Operation would leave namespace without owner")]
    NoNamespaceOwnerRemains,
    /// Removing a package owner would leave the package without one.
    #[error("Operation would leave package without owner")]
    NoPackageOwnerRemains,
    /// A namespace role cannot be deleted while members still hold it.
    #[error("Cannot remove namespace role with members")]
    RoleNotEmpty,
    /// A package or role's owner/member list names users that don't exist.
    #[error("{}", format_unknown_owners(usernames))]
    UnknownOwners {
        /// The unknown usernames, in the order they were supplied.
        usernames: Vec<String>,
    },
    /// A package version depends on packages that don't exist.
    #[error("{}", format_unknown_dependencies(packages))]
    UnknownDependencies {
        /// The unknown package names, in the order they were supplied.
        packages: Vec<String>,
    },
    /// The package being deleted is still depended on by another package.
    #[error("Package has dependent packages")]
    HasDependents,
    /// The version being deleted is still referenced by a tag.
    #[error("Package has tags referring to this version")]
    HasReferringTags,
    /// A request body field failed validation.
    #[error("{0}")]
    Validation(String),
    /// Anything unexpected — detail is logged, never sent to the client.
    #[error("internal error")]
    Internal,
}

fn format_unknown_owners(usernames: &[String]) -> String {
    let joined = usernames.join(", ");
    if usernames.len() == 1 {
        format!("Owner list includes unknown user {joined}")
    } else {
        format!("Owner list includes unknown users {joined}")
    }
}

fn format_unknown_dependencies(packages: &[String]) -> String {
    let joined = packages.join(", ");
    match packages.len() {
        0 => "Package requires unknown dependencies".to_string(),
        1 => format!("Package requires unknown dependency {joined}"),
        _ => format!("Package requires unknown dependencies {joined}"),
    }
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NoPermission => StatusCode::FORBIDDEN,
            Self::UsernameTaken
            | Self::EmailRegistered
            | Self::NoNamespaceOwnerRemains
            | Self::NoPackageOwnerRemains
            | Self::RoleNotEmpty
            | Self::UnknownOwners { .. }
            | Self::UnknownDependencies { .. }
            | Self::HasDependents
            | Self::HasReferringTags => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyExists { .. } => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal) {
            tracing::error!(error = %self, "internal error");
        }

        let status = self.status();
        let mut body = serde_json::json!({ "detail": self.to_string() });

        match &self {
            Self::NotFound { what } | Self::AlreadyExists { what } => {
                body["what"] = serde_json::Value::String((*what).to_string());
            }
            Self::UnknownOwners { usernames } => {
                body["usernames"] = serde_json::json!(usernames);
            }
            Self::UnknownDependencies { packages } => {
                body["packages"] = serde_json::json!(packages);
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();

        if matches!(self, Self::Unauthorized | Self::InvalidCredentials) {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(what) => Self::NotFound { what },
            StoreError::Conflict(what) => Self::AlreadyExists { what },
            StoreError::Invariant(message) => Self::Validation(message.to_string()),
            StoreError::Sqlite(source) => {
                tracing::error!(error = %source, "sqlite error");
                Self::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_owners_formats_singular_and_plural() {
        assert_eq!(format_unknown_owners(&["ghost".to_string()]), "Owner list includes unknown user ghost");
        assert_eq!(
            format_unknown_owners(&["ghost".to_string(), "wisp".to_string()]),
            "Owner list includes unknown users ghost, wisp"
        );
    }

    #[test]
    fn unknown_dependencies_covers_zero_one_many() {
        assert_eq!(format_unknown_dependencies(&[]), "Package requires unknown dependencies");
        assert_eq!(format_unknown_dependencies(&["base".to_string()]), "Package requires unknown dependency base");
        assert_eq!(
            format_unknown_dependencies(&["base".to_string(), "core".to_string()]),
            "Package requires unknown dependencies base, core"
        );
    }

    #[test]
    fn not_found_status_is_404() {
        assert_eq!(ApiError::NotFound { what: "Namespace" }.status(), StatusCode::NOT_FOUND);
    }
}
