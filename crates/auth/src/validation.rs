//! Input checks for account fields.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::AuthError;

static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{1,19}$").expect("phone number pattern is valid"));

pub const MAX_FIRST_NAME_LENGTH: usize = 30;
pub const MAX_LAST_NAME_LENGTH: usize = 30;
const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";

/// Phone numbers are up to 20 characters: an optional `+` and digits.
pub fn validate_phone_number(phone_number: &str) -> Result<(), AuthError> {
    if !PHONE_NUMBER.is_match(phone_number) {
        return Err(AuthError::Validation(
            "phone number must contain 1-19 digits with an optional leading +".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_first_name(first_name: &str) -> Result<(), AuthError> {
    if first_name.trim().is_empty() {
        return Err(AuthError::Validation("first name is required".to_string()));
    }
    if first_name.chars().count() > MAX_FIRST_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "first name must be at most {MAX_FIRST_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_last_name(last_name: &str) -> Result<(), AuthError> {
    if last_name.chars().count() > MAX_LAST_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "last name must be at most {MAX_LAST_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Parse a calendar date given as `YYYY-MM-DD` and return it in canonical form.
pub fn normalize_date_of_birth(date_of_birth: &str) -> Result<String, AuthError> {
    NaiveDate::parse_from_str(date_of_birth, DATE_OF_BIRTH_FORMAT)
        .map(|date| date.format(DATE_OF_BIRTH_FORMAT).to_string())
        .map_err(|_| AuthError::Validation("date of birth must be a date in YYYY-MM-DD form".to_string()))
}

pub fn validate_password(password: &str, min_length: usize) -> Result<(), AuthError> {
    if password.chars().count() < min_length {
        return Err(AuthError::Validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(())
}
