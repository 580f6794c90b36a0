/// Password hashing and verification
///
/// bcrypt with a per-call random salt embedded in the output string.
/// The cost factor is the deliberate brake on brute-force attempts.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;
use crate::validators::{is_valid_password, MAX_PASSWORD_LENGTH};

/// A well-formed bcrypt hash belonging to no account. Verified against
/// when a username does not exist, so that path costs the same bcrypt
/// work as a real mismatch; the result is always discarded.
pub const DUMMY_HASH: &str = "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// Hash a password using bcrypt.
///
/// # Errors
/// Returns an error if the password is empty or over the length cap,
/// or if bcrypt itself fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    is_valid_password(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash.
///
/// A malformed stored hash verifies as false; it never surfaces as an
/// error to the caller. Comparison time depends only on the hash
/// output length, not on where the inputs diverge.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if password.len() > MAX_PASSWORD_LENGTH {
        return false;
    }

    verify(password, stored_hash).unwrap_or_else(|e| {
        tracing::warn!("Stored password hash failed verification: {}", e);
        false
    })
}
