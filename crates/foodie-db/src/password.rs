//! # Password Hashing
//!
//! Argon2id hashes for stored accounts. Hashes are PHC strings
//! (`$argon2id$v=19$...`) so the salt and parameters travel with them.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use crate::error::{DbError, DbResult};

/// Hash a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a password against a stored hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("password").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password", &hash));
        assert!(!verify_password("Password", &hash));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = hash_password("admin123").unwrap();
        let b = hash_password("admin123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_does_not_verify() {
        assert!(!verify_password("password", "not-a-hash"));
        assert!(!verify_password("password", ""));
    }
}
