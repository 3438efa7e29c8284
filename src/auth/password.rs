/// Password Hashing and Verification
///
/// bcrypt embeds a fresh random salt and its cost in every hash, so hashing
/// the same password twice never yields the same string. Compare with
/// `verify_password`, never with `==`.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AuthError;

/// Cheapest cost bcrypt accepts
pub const MIN_COST: u32 = 4;

/// Hash a password with bcrypt at the default cost
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash a password with bcrypt at an explicit cost
///
/// # Errors
/// Returns `AuthError::Internal` if bcrypt rejects the cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// A malformed or truncated hash is a mismatch, not an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::debug!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}
