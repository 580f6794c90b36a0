/// Input validators - bounds and format checks on credentials.
/// Length caps double as DoS protection: neither the bcrypt path nor
/// the database ever sees unbounded input.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_PASSWORD_LENGTH: usize = 100;

lazy_static! {
    // Letters, digits, and a small set of separators; no whitespace,
    // no control characters.
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
}

/// Validates a username: trims surrounding whitespace, enforces the
/// 3-50 character bound and the allowed character set.
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort(
            "username".to_string(),
            MIN_USERNAME_LENGTH,
        ));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat(
            "username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validates a password for registration: non-empty and bounded.
///
/// No composition rules beyond the cap; the cap keeps the bcrypt cost
/// per request bounded.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    Ok(())
}
