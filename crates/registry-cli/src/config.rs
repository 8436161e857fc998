// crates/registry-cli/src/config.rs
// ============================================================================
// Module: CLI Config
// Description: Persists the registry server URL the CLI talks to.
// Purpose: Let `--url` be set once instead of on every command.
// Dependencies: serde, toml
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::CliError;
use crate::error::CliResult;
use crate::session::app_dir;

const DEFAULT_URL: &str = "http://localhost:8000";

/// Persisted CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the registry server.
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
        }
    }
}

fn config_file_path() -> CliResult<PathBuf> {
    Ok(app_dir()?.join("config.toml"))
}

impl Config {
    /// Loads the config file, falling back to [`Config::default`] if absent.
    pub fn load() -> CliResult<Self> {
        let path = config_file_path()?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> CliResult<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => return Err(error.into()),
        };

        let text = String::from_utf8(bytes).map_err(|error| CliError::Config {
            path: path.display().to_string(),
            source: Box::new(error),
        })?;

        toml::from_str(&text).map_err(|error| CliError::Config {
            path: path.display().to_string(),
            source: Box::new(error),
        })
    }

    /// Writes this config to disk, replacing any previous one.
    pub fn save(&self) -> CliResult<()> {
        let path = config_file_path()?;
        let text = toml::to_string_pretty(self).map_err(|error| CliError::Config {
            path: path.display().to_string(),
            source: Box::new(error),
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_loads_default_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.url, DEFAULT_URL);
    }

    #[test]
    fn custom_url_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "url = \"https://registry.example.com\"\n").expect("write");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.url, "https://registry.example.com");
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").expect("write");

        assert!(Config::load_from(&path).is_err());
    }
}
