//! Form validation shared by account, booking and review services.

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_GUESTS: i32 = 20;
pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,
    #[error("guests must be between 1 and {MAX_GUESTS}")]
    GuestsOutOfRange,
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("unknown {field}: {value}")]
    Unknown { field: &'static str, value: String },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return None;
    }
    if normalized.chars().any(char::is_whitespace) {
        return None;
    }
    Some(normalized)
}

/// Check the signup password pair.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Trim a required text field, rejecting blanks.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional text field, mapping blanks to `None`.
#[must_use]
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

pub fn validate_rating(rating: i16) -> Result<i16, ValidationError> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ValidationError::RatingOutOfRange)
    }
}

pub fn validate_guests(guests: i32) -> Result<i32, ValidationError> {
    if (1..=MAX_GUESTS).contains(&guests) {
        Ok(guests)
    } else {
        Err(ValidationError::GuestsOutOfRange)
    }
}

pub fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
