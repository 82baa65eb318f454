use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{EmoraError, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password with Argon2id and a fresh random salt (PHC string).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    hash_with_salt(password, &salt)
}

fn hash_with_salt(password: &str, salt: &SaltString) -> Result<String> {
    Argon2::default()
        .hash_password(password.as_bytes(), salt)
        .map(|hash| hash.to_string())
        .map_err(|e| EmoraError::Storage(anyhow::anyhow!("password hashing failed: {e}")))
}

/// Check `password` against a stored hash.
///
/// Accepts Argon2 PHC strings and the unsalted SHA-256 hex digests written by
/// earlier Emora builds.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with('$') {
        return match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Unparseable password hash: {}", e);
                false
            }
        };
    }

    is_legacy_hash(stored) && legacy_sha256(password) == stored.to_ascii_lowercase()
}

fn is_legacy_hash(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

fn legacy_sha256(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
