/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt. Hashing never rejects a password
/// because of its content; only bcrypt itself can fail.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AuthError;

/// Hash a password with the default bcrypt cost
///
/// # Errors
/// Returns `AuthError::Hashing` if bcrypt fails
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash a password with an explicit bcrypt cost (4..=31)
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost).map_err(|e| AuthError::Hashing(format!("bcrypt hash failed: {}", e)))
}

/// Verify a password against its stored hash
///
/// A mismatch is `Ok(false)`. Only a malformed stored hash is an error.
///
/// # Errors
/// Returns `AuthError::Hashing` if `hashed` is not a valid bcrypt string
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AuthError> {
    verify(password, hashed)
        .map_err(|e| AuthError::Hashing(format!("stored hash rejected: {}", e)))
}
