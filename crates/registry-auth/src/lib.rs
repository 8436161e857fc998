// crates/registry-auth/src/lib.rs
// ============================================================================
// Module: Registry Auth
// Description: Password hashing and bearer-token mint/verify.
// Purpose: Isolate credential handling from storage and HTTP concerns.
// ============================================================================

//! ## Overview
//! `registry-auth` knows how to turn a password into a hash and back, and
//! how to mint and verify a bearer token. It does not know what a `User`
//! is or how one is looked up — that's `registry-core`/`registry-store-sqlite`'s
//! job; `registry-server` wires the two together.

pub mod password;
pub mod token;

pub use password::hash_password;
pub use password::verify_password;
pub use token::JwtTokenCodec;
pub use token::TokenClaims;
pub use token::TokenCodec;

/// Errors from password hashing or token mint/verify.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The password hash could not be produced or parsed.
    #[error("password hashing failed: {0}")]
    Hash(String),
    /// The token could not be signed.
    #[error("token signing failed: {0}")]
    Token(String),
    /// The token is missing, malformed, incorrectly signed, or expired.
    ///
    /// Deliberately undifferentiated: callers must not be able to tell an
    /// expired token from a forged one.
    #[error("invalid or expired token")]
    InvalidToken,
}
