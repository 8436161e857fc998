// crates/registry-auth/src/token.rs
// ============================================================================
// Module: Bearer Tokens
// Description: Mint and verify HS256 JWTs carrying a username subject claim.
// Purpose: Authenticate API callers without server-side session state.
// Dependencies: jsonwebtoken
// ============================================================================

//! ## Overview
//! Tokens are plain JWTs, `sub = "username:<name>"`, signed with HS256 over
//! a shared secret. [`TokenCodec`] is a trait (not free functions) so the
//! HTTP layer can be exercised in tests against a codec seeded with a throwaway
//! secret, the same way the reference workspace wraps an external namespace
//! check behind a trait rather than calling a concrete client directly.

use serde::Deserialize;
use serde::Serialize;
use time::Duration;
use time::OffsetDateTime;

use crate::AuthError;

const SUBJECT_PREFIX: &str = "username:";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// A verified bearer token's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// The username the token was minted for.
    pub username: String,
}

/// Mints and verifies bearer tokens.
pub trait TokenCodec: Send + Sync {
    /// Mints a token for `username`, expiring after `ttl`.
    ///
    /// # Errors
    /// Returns [`AuthError`] if signing fails.
    fn mint(&self, username: &str, ttl: Duration) -> Result<String, AuthError>;

    /// Verifies `token`, returning its claims if it is well-formed,
    /// correctly signed, and not expired.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] for any malformed, unsigned, or
    /// expired token — callers must not distinguish the reason.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// [`TokenCodec`] backed by HMAC-SHA256 (`jsonwebtoken`, `Algorithm::HS256`).
pub struct JwtTokenCodec {
    encoding_key: jsonwebtoken::EncodingKey,
    decoding_key: jsonwebtoken::DecodingKey,
}

impl JwtTokenCodec {
    /// Builds a codec from a shared secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn mint(&self, username: &str, ttl: Duration) -> Result<String, AuthError> {
        let expiration = OffsetDateTime::now_utc() + ttl;
        let claims = Claims {
            sub: format!("{SUBJECT_PREFIX}{username}"),
            exp: expiration.unix_timestamp(),
        };

        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|error| AuthError::Token(error.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);

        let decoded = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_error| AuthError::InvalidToken)?;

        let username = decoded
            .claims
            .sub
            .strip_prefix(SUBJECT_PREFIX)
            .ok_or(AuthError::InvalidToken)?
            .to_string();

        Ok(TokenClaims { username })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_then_verify_round_trips() -> Result<(), AuthError> {
        let codec = JwtTokenCodec::new("test-secret");
        let token = codec.mint("alex", Duration::hours(2))?;
        let claims = codec.verify(&token)?;
        assert_eq!(claims.username, "alex");
        Ok(())
    }

    #[test]
    fn verify_rejects_expired_token() -> Result<(), AuthError> {
        let codec = JwtTokenCodec::new("test-secret");
        let token = codec.mint("alex", Duration::seconds(-1))?;
        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn verify_rejects_wrong_secret() -> Result<(), AuthError> {
        let minted_by = JwtTokenCodec::new("secret-one");
        let verified_by = JwtTokenCodec::new("secret-two");
        let token = minted_by.mint("alex", Duration::hours(2))?;
        assert!(matches!(verified_by.verify(&token), Err(AuthError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn verify_rejects_garbage() {
        let codec = JwtTokenCodec::new("test-secret");
        assert!(matches!(codec.verify("not-a-jwt"), Err(AuthError::InvalidToken)));
    }
}
