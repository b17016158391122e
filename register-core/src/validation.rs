//! Field acceptance rules for the registration form.
//!
//! Every rule is a pure predicate over the raw field text. The form state
//! in [`crate::form`] calls these on each dependency write; the submission
//! controller calls them again at submit time.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Letter first, then 8 to 23 letters, digits, `@` or `.`.
pub const EMAIL_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9@.]{8,23}$";

/// Letter first, then 3 to 23 letters, digits, `_` or `-`.
pub const USERNAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_-]{3,23}$";

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 24;

/// Characters of which a password must contain at least one.
pub const PASSWORD_SPECIALS: &[char] = &['!', '@', '#', '$', '%'];

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"));

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(USERNAME_PATTERN).expect("username pattern is valid"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

pub fn is_valid_username(value: &str) -> bool {
    USERNAME_REGEX.is_match(value)
}

/// Length 8..=24 with at least one lowercase letter, one uppercase letter,
/// one digit and one of [`PASSWORD_SPECIALS`]. Line terminators are never
/// accepted.
///
/// Length is measured in UTF-16 code units, the unit browsers use for form
/// values, so a character outside the Basic Multilingual Plane counts twice.
///
/// The `regex` crate has no lookahead, so the character-class requirements
/// are checked directly instead of through a single pattern.
pub fn is_valid_password(value: &str) -> bool {
    let len = value.encode_utf16().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return false;
    }
    if value.chars().any(is_line_terminator) {
        return false;
    }

    value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(&c))
}

/// Exact, case-sensitive equality. No trimming.
pub fn is_matching_confirmation(confirmation: &str, password: &str) -> bool {
    confirmation == password
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// The four inputs of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Username,
    Password,
    ConfirmPassword,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Email,
        Field::Username,
        Field::Password,
        Field::ConfirmPassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Username => "username",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm_password",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Email => "Email:",
            Field::Username => "Username:",
            Field::Password => "Password:",
            Field::ConfirmPassword => "Confirm Password:",
        }
    }

    /// Username, password and confirmation. Editing one of these clears a
    /// pending error message.
    pub fn is_credential(&self) -> bool {
        !matches!(self, Field::Email)
    }

    /// Whether the hint is shown for an empty value while focused.
    ///
    /// Email and username only nag once something has been typed; the
    /// password fields show their constraints straight away.
    pub fn hints_when_empty(&self) -> bool {
        matches!(self, Field::Password | Field::ConfirmPassword)
    }

    /// Instructional text shown under the input while the hint is visible.
    pub fn hint(&self) -> &'static [&'static str] {
        match self {
            Field::Email => &["Valid email with @ and ."],
            Field::Username => &[
                "4 to 24 characters.",
                "Must begin with a letter.",
                "Letters, numbers, underscores, hyphens allowed.",
            ],
            Field::Password => &[
                "8 to 24 characters.",
                "Must include uppercase and lowercase letter.",
                "Must include a number.",
                "Must include a special character (allowed: ! @ # % $).",
            ],
            Field::ConfirmPassword => &["Must match the Password input field."],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown form field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
