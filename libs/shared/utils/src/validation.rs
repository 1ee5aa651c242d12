use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use thiserror::Error;

use shared_models::AppError;

/// A malformed or missing form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::ValidationError(err.0)
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
    })
}

fn contact_regex() -> &'static Regex {
    static CONTACT: OnceLock<Regex> = OnceLock::new();
    CONTACT.get_or_init(|| Regex::new(r"^\+?[0-9][0-9\s\-]{5,19}$").expect("contact pattern compiles"))
}

/// Trimmed value of a mandatory form field.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{} is required", field)));
    }
    Ok(trimmed)
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > 254 || !email_regex().is_match(email) {
        return Err(ValidationError(format!("Invalid email address: {}", email)));
    }
    Ok(())
}

pub fn validate_contact(contact: Option<&str>) -> Result<(), ValidationError> {
    match contact {
        Some(c) if !c.is_empty() && !contact_regex().is_match(c) => Err(ValidationError(
            format!("Invalid contact number: {}", c),
        )),
        _ => Ok(()),
    }
}

pub fn validate_age(age: Option<i64>) -> Result<(), ValidationError> {
    match age {
        Some(a) if !(0..=150).contains(&a) => Err(ValidationError(format!(
            "Age must be between 0 and 150, got {}",
            a
        ))),
        _ => Ok(()),
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}
