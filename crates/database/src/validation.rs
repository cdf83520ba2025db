//! Input validation for records written through this crate.

use std::collections::BTreeSet;
use std::fmt;

use crate::models::{ClientDraft, FollowUpDraft, NotificationDraft};

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid phone number.
    InvalidPhone(String),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Too many entries in a collection field.
    TooMany { field: String, max: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::TooMany { field, max } => {
                write!(f, "{} has too many entries (max {})", field, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 120;
pub const MAX_PHONE_LENGTH: usize = 32;
pub const MAX_SHORT_TEXT_LENGTH: usize = 80;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_NOTES_LENGTH: usize = 10_000;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LENGTH: usize = 32;

/// Require a non-blank value no longer than `max` characters.
pub fn validate_required(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    validate_length(field, value, max)
}

/// Check an optional value's length. Blank values pass.
pub fn validate_optional(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => validate_length(field, value.trim(), max),
        None => Ok(()),
    }
}

fn validate_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

/// Basic `local@domain.tld` shape check.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    validate_required("email", email, MAX_EMAIL_LENGTH)?;

    let (local, domain) = match email.split_once('@') {
        Some((local, domain)) if !domain.contains('@') => (local, domain),
        _ => {
            return Err(ValidationError::InvalidEmail(
                "must contain exactly one @ symbol".to_string(),
            ))
        }
    };

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "malformed domain".to_string(),
        ));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail(
            "cannot contain whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Digits plus the usual separators (`+ - ( ) . space`), at least 5 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    validate_length("phone", phone, MAX_PHONE_LENGTH)?;

    if let Some(bad) = phone
        .chars()
        .find(|c| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' ')))
    {
        return Err(ValidationError::InvalidPhone(format!(
            "unexpected character '{}'",
            bad
        )));
    }

    if phone.chars().filter(char::is_ascii_digit).count() < 5 {
        return Err(ValidationError::InvalidPhone(
            "must contain at least 5 digits".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_tags(tags: &BTreeSet<String>) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooMany {
            field: "tags".to_string(),
            max: MAX_TAGS,
        });
    }
    for tag in tags {
        validate_required("tag", tag, MAX_TAG_LENGTH)?;
    }
    Ok(())
}

pub fn validate_client(draft: &ClientDraft) -> Result<(), ValidationError> {
    validate_required("name", &draft.name, MAX_NAME_LENGTH)?;
    validate_email(&draft.email)?;
    if let Some(phone) = draft.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        validate_phone(phone)?;
    }
    validate_optional("company", draft.company.as_deref(), MAX_NAME_LENGTH)?;
    validate_optional("category", draft.category.as_deref(), MAX_SHORT_TEXT_LENGTH)?;
    validate_optional("source", draft.source.as_deref(), MAX_SHORT_TEXT_LENGTH)?;
    validate_optional("notes", draft.notes.as_deref(), MAX_NOTES_LENGTH)?;
    validate_tags(&draft.tags)
}

pub fn validate_follow_up(draft: &FollowUpDraft) -> Result<(), ValidationError> {
    validate_required("title", &draft.title, MAX_TITLE_LENGTH)?;
    validate_optional("description", draft.description.as_deref(), MAX_NOTES_LENGTH)
}

pub fn validate_notification(draft: &NotificationDraft) -> Result<(), ValidationError> {
    validate_required("title", &draft.title, MAX_TITLE_LENGTH)?;
    validate_required("message", &draft.message, MAX_NOTES_LENGTH)
}

/// Trim tags and drop blanks; set semantics come from the `BTreeSet`.
pub fn normalize_tags(tags: &BTreeSet<String>) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Trim an optional text field, mapping blank to `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
