// crates/registry-auth/src/password.rs
// ============================================================================
// Module: Password Hashing
// Description: Argon2id password hashing and verification.
// Purpose: Keep password material out of plaintext without hand-rolling KDF code.
// Dependencies: argon2
// ============================================================================

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use crate::AuthError;

/// Hashes `password` with Argon2id and a freshly generated salt.
///
/// # Errors
/// Returns [`AuthError::Hash`] if the underlying KDF call fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|error| AuthError::Hash(error.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies `password` against a previously produced `hash`.
///
/// Returns `false` (rather than an error) for a structurally valid hash
/// that simply doesn't match — only malformed hash strings are an error.
///
/// # Errors
/// Returns [`AuthError::Hash`] if `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|error| AuthError::Hash(error.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() -> Result<(), AuthError> {
        let hash = hash_password("correct-horse-battery-staple")?;
        assert!(verify_password("correct-horse-battery-staple", &hash)?);
        assert!(!verify_password("wrong-password", &hash)?);
        Ok(())
    }

    #[test]
    fn hashes_are_salted_distinctly() -> Result<(), AuthError> {
        let first = hash_password("same-password")?;
        let second = hash_password("same-password")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
