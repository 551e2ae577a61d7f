//! Password hashing
//!
//! Admin and team credentials are stored as argon2 PHC strings. Verification
//! goes through `PasswordVerifier`, which compares in constant time.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;

use crate::error::PasswordError;

/// Alphabet for generated passwords (no 0/O/1/I lookalikes)
const TEMP_PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const TEMP_PASSWORD_LEN: usize = 8;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a candidate against a stored hash. Malformed hashes never verify.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Generate an 8 character temporary password for a new team account
pub fn generate_temporary_password() -> String {
    let mut rng = rand::thread_rng();
    (0..TEMP_PASSWORD_LEN)
        .map(|_| TEMP_PASSWORD_ALPHABET[rng.gen_range(0..TEMP_PASSWORD_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("TEMP1234").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("TEMP1234", &hash));
        assert!(!verify_password("temp1234", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_and_malformed() {
        assert!(matches!(hash_password(""), Err(PasswordError::Empty)));
        assert!(!verify_password("anything", "plaintext-password"));
    }

    #[test]
    fn test_temporary_password_shape() {
        let pw = generate_temporary_password();
        assert_eq!(pw.len(), 8);
        assert!(pw.bytes().all(|b| TEMP_PASSWORD_ALPHABET.contains(&b)));
    }
}
