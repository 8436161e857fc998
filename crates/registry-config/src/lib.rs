// crates/registry-config/src/lib.rs
// ============================================================================
// Module: Registry Config
// Description: TOML-backed configuration model, fail-closed load path.
// Purpose: Resolve and validate the registry server's runtime configuration.
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! Configuration is loaded from a single TOML file, located via an explicit
//! path, the `KNOT_REGISTRY_CONFIG` environment variable, or the default
//! `./knot-registry.toml`. Loading is fail-closed: oversized, non-UTF-8, or
//! path-abusive input is rejected before `toml` ever sees it.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// Environment variable naming the config file path.
pub const CONFIG_PATH_ENVIRON: &str = "KNOT_REGISTRY_CONFIG";

/// Default config file path when neither an explicit path nor the
/// environment variable is given.
pub const CONFIG_PATH_DEFAULT: &str = "./knot-registry.toml";

/// Default bearer-token lifetime, in seconds (2 hours).
pub const DEFAULT_TOKEN_EXPIRY_SECONDS: u64 = 7_200;

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";

/// Default namespace owner role name, auto-created with every namespace.
pub const DEFAULT_NAMESPACE_OWNER_ROLE: &str = "owner";

const MAX_CONFIG_PATH_LEN: usize = 4_096;
const MAX_CONFIG_PATH_COMPONENT_LEN: usize = 255;
const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576;

/// Errors that can occur while locating or parsing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The resolved path exceeds [`MAX_CONFIG_PATH_LEN`] bytes.
    #[error("config path exceeds max length")]
    PathTooLong,
    /// One path component exceeds [`MAX_CONFIG_PATH_COMPONENT_LEN`] bytes.
    #[error("config path component too long")]
    PathComponentTooLong,
    /// The file could not be opened or read.
    #[error("failed to read config file: {0}")]
    Io(#[source] std::io::Error),
    /// The file exceeds [`MAX_CONFIG_FILE_BYTES`].
    #[error("config file exceeds size limit")]
    TooLarge,
    /// The file contents are not valid UTF-8.
    #[error("config file must be utf-8")]
    NotUtf8,
    /// The file parsed as TOML but failed the config schema.
    #[error("invalid config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// The registry server's runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// HMAC signing secret used to mint and verify bearer tokens.
    pub secret_key: String,
    /// Path to the SQLite database file (or `:memory:`).
    pub database_path: String,
    /// Bearer-token lifetime, in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_seconds: u64,
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Role name auto-created (with `namespace_owner`) for new namespaces.
    #[serde(default = "default_namespace_owner_role")]
    pub default_namespace_owner_role: String,
}

fn default_token_expiry() -> u64 {
    DEFAULT_TOKEN_EXPIRY_SECONDS
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_namespace_owner_role() -> String {
    DEFAULT_NAMESPACE_OWNER_ROLE.to_string()
}

impl RegistryConfig {
    /// Loads configuration from `path`, or from the environment/default
    /// location when `path` is `None`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the resolved path is abusive, the file
    /// cannot be read, is too large, is not UTF-8, or fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let owned;
        let resolved: &Path = match path {
            Some(path) => path,
            None => {
                owned = std::env::var(CONFIG_PATH_ENVIRON).unwrap_or_else(|_| CONFIG_PATH_DEFAULT.to_string());
                Path::new(&owned)
            }
        };

        Self::validate_path(resolved)?;

        let metadata = fs::metadata(resolved).map_err(ConfigError::Io)?;

        if metadata.len() > MAX_CONFIG_FILE_BYTES {
            return Err(ConfigError::TooLarge);
        }

        let bytes = fs::read(resolved).map_err(ConfigError::Io)?;
        let text = String::from_utf8(bytes).map_err(|_error| ConfigError::NotUtf8)?;

        toml::from_str(&text).map_err(ConfigError::Parse)
    }

    fn validate_path(path: &Path) -> Result<(), ConfigError> {
        let path_str = path.to_string_lossy();

        if path_str.len() > MAX_CONFIG_PATH_LEN {
            return Err(ConfigError::PathTooLong);
        }

        for component in path.components() {
            let component_str = component.as_os_str().to_string_lossy();

            if component_str.len() > MAX_CONFIG_PATH_COMPONENT_LEN {
                return Err(ConfigError::PathComponentTooLong);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_parses_minimal_config() -> Result<(), String> {
        let mut file = tempfile::NamedTempFile::new().map_err(|error| error.to_string())?;
        write!(
            file,
            "secret_key = \"s3cr3t\"\ndatabase_path = \":memory:\"\n"
        )
        .map_err(|error| error.to_string())?;

        let config = RegistryConfig::load(Some(file.path())).map_err(|error| error.to_string())?;

        assert_eq!(config.secret_key, "s3cr3t");
        assert_eq!(config.token_expiry_seconds, DEFAULT_TOKEN_EXPIRY_SECONDS);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.default_namespace_owner_role, "owner");
        Ok(())
    }

    #[test]
    fn load_rejects_missing_required_field() -> Result<(), String> {
        let mut file = tempfile::NamedTempFile::new().map_err(|error| error.to_string())?;
        write!(file, "secret_key = \"s3cr3t\"\n").map_err(|error| error.to_string())?;

        let error = RegistryConfig::load(Some(file.path())).expect_err("database_path is required");
        assert!(matches!(error, ConfigError::Parse(_)));
        Ok(())
    }
}
