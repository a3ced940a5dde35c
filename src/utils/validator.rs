//! # Text Input Validation Utilities
//!
//! Validators shared by the request payloads. They plug into `validator`'s
//! `custom(function = ...)` attribute, so each returns a [`ValidationError`]
//! carrying the message shown to the client.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use validator::{ValidateUrl, ValidationError};

use crate::error::FieldErrors;
use crate::utils::constant::{MONEY_DECIMAL_PLACES, MONEY_MAX_DIGITS};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Passwords rejected regardless of length
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "11111111",
    "00000000",
    "abc12345",
    "letmein1",
    "welcome1",
    "sunshine",
    "football",
    "baseball",
    "princess",
    "trustno1",
    "passw0rd",
];

/// Lowercase slug: ascii letters, digits, hyphens and underscores
pub static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").expect("slug regex is valid"));

/// ISO-4217 style currency code
pub static CURRENCY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("currency regex is valid"));

fn error_with(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Trims and lowercases an email so uniqueness holds regardless of case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Password strength policy: minimum length, not purely numeric, not a common password.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(error_with(
            "password_too_short",
            format!(
                "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
            ),
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(error_with(
            "password_entirely_numeric",
            "This password is entirely numeric.",
        ));
    }
    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(error_with(
            "password_too_common",
            "This password is too common.",
        ));
    }
    Ok(())
}

/// Rejects passwords that embed the local part of the account's email.
pub fn validate_password_not_similar(password: &str, email: &str) -> Result<(), ValidationError> {
    let local = email.split('@').next().unwrap_or_default().to_lowercase();
    if local.len() >= 3 && password.to_lowercase().contains(&local) {
        return Err(error_with(
            "password_too_similar",
            "The password is too similar to the email address.",
        ));
    }
    Ok(())
}

/// Accepts an empty string, otherwise requires a well-formed URL.
pub fn validate_optional_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(error_with("url", "Enter a valid URL."))
    }
}

pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error_with(
            "slug",
            "Enter a valid slug consisting of lowercase letters, numbers, underscores or hyphens.",
        ))
    }
}

pub fn validate_currency(value: &str) -> Result<(), ValidationError> {
    if CURRENCY_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error_with(
            "currency",
            "Currency must be a three-letter uppercase code.",
        ))
    }
}

/// Amount that fits a `NUMERIC(12, 2)` column.
///
/// Trailing zeros do not count as decimal places.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    let whole_digits = MONEY_MAX_DIGITS - MONEY_DECIMAL_PLACES;
    if value.normalize().scale() > MONEY_DECIMAL_PLACES {
        return Err(error_with(
            "max_decimal_places",
            format!("Ensure that there are no more than {MONEY_DECIMAL_PLACES} decimal places."),
        ));
    }
    if value.trunc().abs() >= Decimal::from(10_i64.pow(whole_digits)) {
        return Err(error_with(
            "max_whole_digits",
            format!(
                "Ensure that there are no more than {whole_digits} digits before the decimal point."
            ),
        ));
    }
    Ok(())
}

/// A payload field that keeps its raw JSON when it does not parse as `T`.
///
/// A wrong type or an unknown choice then becomes an error on that field
/// instead of rejecting the whole body.
#[derive(Debug, Clone, PartialEq)]
pub enum Lenient<T> {
    Parsed(T),
    Invalid(Value),
}

impl<T> Lenient<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            Lenient::Parsed(value) => Some(value),
            Lenient::Invalid(_) => None,
        }
    }

    /// The parsed value, or `T::default()` for a value that did not parse.
    pub fn value_or_default(&self) -> T
    where
        T: Clone + Default,
    {
        self.parsed().cloned().unwrap_or_default()
    }
}

impl<T: Default> Default for Lenient<T> {
    fn default() -> Self {
        Lenient::Parsed(T::default())
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Parsed(value)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&raw) {
            Ok(value) => Lenient::Parsed(value),
            Err(_) => Lenient::Invalid(raw),
        })
    }
}

/// What went wrong with a field that did not parse.
#[derive(Debug, Clone, Copy)]
pub enum Expected {
    Choice,
    Integer,
    Number,
}

impl Expected {
    pub fn message(self, raw: &Value) -> String {
        match self {
            Expected::Choice => {
                let shown = match raw {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                format!("\"{shown}\" is not a valid choice.")
            }
            Expected::Integer => "A valid integer is required.".to_string(),
            Expected::Number => "A valid number is required.".to_string(),
        }
    }
}

/// Parsed value of a lenient field, recording an error when it did not parse.
pub fn resolve<T: Clone>(
    errors: &mut FieldErrors,
    field: &str,
    value: &Lenient<T>,
    expected: Expected,
) -> Option<T> {
    match value {
        Lenient::Parsed(value) => Some(value.clone()),
        Lenient::Invalid(raw) => {
            errors.add(field, expected.message(raw));
            None
        }
    }
}

pub fn resolve_optional<T: Clone>(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<Lenient<T>>,
    expected: Expected,
) -> Option<T> {
    value
        .as_ref()
        .and_then(|value| resolve(errors, field, value, expected))
}

/// Records a [`validate_money`] failure against `field`.
pub fn check_money(errors: &mut FieldErrors, field: &str, value: Option<Decimal>) {
    if let Some(value) = value
        && let Err(e) = validate_money(&value)
        && let Some(message) = e.message
    {
        errors.add(field, message);
    }
}
