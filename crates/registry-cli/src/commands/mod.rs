// crates/registry-cli/src/commands/mod.rs
// ============================================================================
// Module: Commands
// Description: One module per area of the registry's command surface.
// Purpose: Keep `main.rs` to argument parsing and dispatch only.
// Dependencies: (see individual modules)
// ============================================================================

pub mod namespace;
pub mod package;
pub mod user;

use registry_core::model::PermissionCode;

use crate::client::RegistryClient;
use crate::config::Config;
use crate::error::CliError;
use crate::error::CliResult;
use crate::session::Session;

/// Builds a client for the configured server, attaching the saved session's
/// token if one is present.
pub fn client_with_session(config: &Config, session: Option<&Session>) -> RegistryClient {
    RegistryClient::new(&config.url, session.map(|session| session.token.clone()))
}

/// Builds a client for the configured server, requiring a saved session.
pub fn authenticated_client(config: &Config) -> CliResult<(RegistryClient, Session)> {
    let session = crate::session::require_session()?;
    let client = client_with_session(config, Some(&session));
    Ok((client, session))
}

/// Parses one `--permission` flag value into a [`PermissionCode`].
pub fn parse_permission(value: &str) -> Result<PermissionCode, CliError> {
    match value {
        "namespace_owner" => Ok(PermissionCode::NamespaceOwner),
        "namespace_admin" => Ok(PermissionCode::NamespaceAdmin),
        "namespace_edit" => Ok(PermissionCode::NamespaceEdit),
        "package_create" => Ok(PermissionCode::PackageCreate),
        "package_edit" => Ok(PermissionCode::PackageEdit),
        other => Err(CliError::Invalid(format!(
            "unknown permission \"{other}\"; expected one of namespace_owner, namespace_admin, namespace_edit, package_create, package_edit"
        ))),
    }
}

/// Renders a [`PermissionCode`] the way the server's JSON wire format spells it.
#[must_use]
pub fn permission_code_str(code: PermissionCode) -> &'static str {
    match code {
        PermissionCode::NamespaceOwner => "namespace_owner",
        PermissionCode::NamespaceAdmin => "namespace_admin",
        PermissionCode::NamespaceEdit => "namespace_edit",
        PermissionCode::PackageCreate => "package_create",
        PermissionCode::PackageEdit => "package_edit",
    }
}
