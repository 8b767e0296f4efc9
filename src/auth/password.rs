//! Password hashing, verification and token generation.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose};
use rand::prelude::RngExt;
use rand::rng;

use crate::errors::Error;

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC recommendations.
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash a password using Argon2id with default parameters.
pub fn hash_string(input: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2Params::default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Verify a password against a hash.
///
/// Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    let argon2 = Argon2::default();
    Ok(argon2.verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// Verify a password against a stored hash that may not exist.
///
/// When the identity is unknown (`None`) the password is still run through a
/// full Argon2 hash so that present and absent identities take comparable
/// time, then the check fails.
pub fn verify_against(input: &str, stored_hash: Option<&str>) -> Result<bool, Error> {
    match stored_hash {
        Some(hash) => verify_string(input, hash),
        None => {
            hash_string(input)?;
            Ok(false)
        }
    }
}

/// Hash a password on a blocking thread; Argon2 is deliberately slow.
pub async fn hash_password(password: String) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("join hash task: {e}"),
        })?
}

/// Verify a password on a blocking thread, with timing parity for unknown
/// identities.
pub async fn verify_password(password: String, stored_hash: Option<String>) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || verify_against(&password, stored_hash.as_deref()))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("join verify task: {e}"),
        })?
}

/// Generate an opaque session token: 32 bytes (256 bits) of CSPRNG output,
/// base64url without padding.
pub fn generate_session_token() -> String {
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hashing() {
        let input = "test_password_123";
        let hash = hash_string(input).unwrap();

        assert!(!hash.is_empty());
        assert!(verify_string(input, &hash).unwrap());
        assert!(!verify_string("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let input = "same_password";

        let hash1 = hash_string(input).unwrap();
        let hash2 = hash_string(input).unwrap();

        // Salts differ, so hashes differ, but both verify.
        assert_ne!(hash1, hash2);
        assert!(verify_string(input, &hash1).unwrap());
        assert!(verify_string(input, &hash2).unwrap());
    }

    #[test]
    fn test_verify_against_missing_hash_fails() {
        assert!(!verify_against("anything", None).unwrap());

        let hash = hash_string("secret").unwrap();
        assert!(verify_against("secret", Some(&hash)).unwrap());
        assert!(!verify_against("not-it", Some(&hash)).unwrap());
    }

    #[test]
    fn test_generate_session_token() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();

        assert_ne!(token1, token2);

        // 32 bytes encode to 43 base64url characters, no padding.
        assert_eq!(token1.len(), 43);
        assert!(token1.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(!token1.contains('='));
    }
}
