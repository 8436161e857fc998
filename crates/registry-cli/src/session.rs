// crates/registry-cli/src/session.rs
// ============================================================================
// Module: Session Storage
// Description: Persists the signed-in username and bearer token between runs.
// Purpose: Let `login` run once and every later command reuse its token.
// Dependencies: dirs, serde_json
// ============================================================================

//! ## Overview
//! The session lives at `<config-dir>/knot/session.json`. A missing or
//! unparsable file means "signed out" rather than an error — the caller
//! decides whether that's fatal.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::CliError;
use crate::error::CliResult;

/// The signed-in user's identity and bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Login name the token was minted for.
    pub username: String,
    /// Bearer token presented on every authenticated request.
    pub token: String,
}

/// Resolves (and creates, if missing) the per-user config directory for this CLI.
pub fn app_dir() -> CliResult<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| CliError::Invalid("could not resolve a config directory for this platform".to_string()))?;
    let path = base.join("knot");

    if !path.is_dir() {
        std::fs::create_dir_all(&path)?;
    }

    Ok(path)
}

fn session_file_path() -> CliResult<PathBuf> {
    Ok(app_dir()?.join("session.json"))
}

/// Loads the current session, if one exists and is well-formed.
pub fn get_session() -> CliResult<Option<Session>> {
    let path = session_file_path()?;
    read_session(&path)
}

fn read_session(path: &Path) -> CliResult<Option<Session>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };

    match serde_json::from_slice(&bytes) {
        Ok(session) => Ok(Some(session)),
        Err(_) => Ok(None),
    }
}

/// Loads the current session, or fails with [`CliError::NotLoggedIn`].
pub fn require_session() -> CliResult<Session> {
    get_session()?.ok_or(CliError::NotLoggedIn)
}

/// Writes `session` to disk, replacing any previous one.
pub fn save_session(session: &Session) -> CliResult<()> {
    let path = session_file_path()?;
    let bytes = serde_json::to_vec_pretty(session).map_err(|error| CliError::Config {
        path: path.display().to_string(),
        source: Box::new(error),
    })?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Removes the session file, if any.
pub fn remove_session() -> CliResult<()> {
    let path = session_file_path()?;

    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        assert!(read_session(&path).expect("read").is_none());
    }

    #[test]
    fn malformed_session_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").expect("write");
        assert!(read_session(&path).expect("read").is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        let session = Session {
            username: "alex".to_string(),
            token: "abc.def.ghi".to_string(),
        };
        std::fs::write(&path, serde_json::to_vec(&session).expect("serialize")).expect("write");

        let loaded = read_session(&path).expect("read").expect("present");
        assert_eq!(loaded.username, "alex");
        assert_eq!(loaded.token, "abc.def.ghi");
    }
}
