use super::*;

#[test]
fn normalize_email_accepts_basic_address() {
    assert_eq!(normalize_email("  Traveler@Example.COM "), Some("traveler@example.com".to_owned()));
}

#[test]
fn normalize_email_rejects_invalid_values() {
    assert_eq!(normalize_email(""), None);
    assert_eq!(normalize_email("user"), None);
    assert_eq!(normalize_email("@example.com"), None);
    assert_eq!(normalize_email("user@"), None);
    assert_eq!(normalize_email("a@b@c.com"), None);
    assert_eq!(normalize_email("user@localhost"), None);
    assert_eq!(normalize_email("us er@example.com"), None);
}

#[test]
fn new_password_rejects_short() {
    assert_eq!(validate_new_password("abc", "abc"), Err(ValidationError::PasswordTooShort));
}

#[test]
fn new_password_rejects_mismatch() {
    assert_eq!(validate_new_password("secret1", "secret2"), Err(ValidationError::PasswordMismatch));
}

#[test]
fn new_password_accepts_matching_pair() {
    assert_eq!(validate_new_password("kibira-forest", "kibira-forest"), Ok(()));
}

#[test]
fn new_password_counts_characters_not_bytes() {
    // five multi-byte chars are still too short
    assert_eq!(validate_new_password("ééééé", "ééééé"), Err(ValidationError::PasswordTooShort));
}

#[test]
fn required_trims_and_rejects_blank() {
    assert_eq!(required("name", "  Gitega "), Ok("Gitega".to_owned()));
    assert_eq!(required("name", "   "), Err(ValidationError::Required("name")));
}

#[test]
fn optional_maps_blank_to_none() {
    assert_eq!(optional(Some("  ")), None);
    assert_eq!(optional(None), None);
    assert_eq!(optional(Some(" +257 ")), Some("+257".to_owned()));
}

#[test]
fn rating_bounds() {
    assert_eq!(validate_rating(0), Err(ValidationError::RatingOutOfRange));
    assert_eq!(validate_rating(6), Err(ValidationError::RatingOutOfRange));
    for r in 1..=5 {
        assert_eq!(validate_rating(r), Ok(r));
    }
}

#[test]
fn guests_bounds() {
    assert_eq!(validate_guests(0), Err(ValidationError::GuestsOutOfRange));
    assert_eq!(validate_guests(MAX_GUESTS + 1), Err(ValidationError::GuestsOutOfRange));
    assert_eq!(validate_guests(1), Ok(1));
    assert_eq!(validate_guests(MAX_GUESTS), Ok(MAX_GUESTS));
}

#[test]
fn max_len_reports_field() {
    let err = max_len("body", &"x".repeat(11), 10).unwrap_err();
    assert_eq!(err.to_string(), "body must be at most 10 characters");
    assert!(max_len("body", "short", 10).is_ok());
}
