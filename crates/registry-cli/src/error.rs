// crates/registry-cli/src/error.rs
// ============================================================================
// Module: CLI Error
// Description: One error type for every command, wrapping transport, storage,
//              and server-reported failures.
// Purpose: Give every command a single `Result<T, CliError>` return type.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Everything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// No session file, or a command that needs one was run while signed out.
    #[error("Not logged in. Run `knot login` first.")]
    NotLoggedIn,
    /// The server rejected the request; `detail` is its error message.
    #[error("{detail}")]
    Server {
        /// Message taken from the response body's `detail` field.
        detail: String,
        /// The `what` discriminator carried by `NotFound`/`AlreadyExists`
        /// responses, if the server sent one.
        what: Option<String>,
    },
    /// The request could not be sent, or the response could not be read.
    #[error("request to the registry failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The config or session file on disk was malformed.
    #[error("could not read {path}: {source}")]
    Config {
        /// Path of the file that failed to parse.
        path: String,
        /// Underlying parse error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A filesystem operation (read manifest, write session, resolve config dir) failed.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A manifest or package-spec string did not parse.
    #[error("{0}")]
    Invalid(String),
}

/// CLI result alias for fallible operations.
pub type CliResult<T> = Result<T, CliError>;
