use lazy_static::lazy_static;
use regex::Regex;

use super::errors::ApiError;

pub const MIN_PASSWORD_CHARS: usize = 5;
pub const MAX_USERNAME_CHARS: usize = 150;

/// Letters, digits and `@ . + - _`.
pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Returns the normalized (trimmed) username.
pub fn validate_username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::validation("username", "This field may not be blank."));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ApiError::validation(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_CHARS} characters."),
        ));
    }
    if !is_valid_username(username) {
        return Err(ApiError::validation(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(username.to_string())
}

pub fn validate_new_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::validation(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_CHARS} characters."),
        ));
    }
    Ok(())
}
