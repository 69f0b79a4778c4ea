// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission schema validation.
//!
//! Validates decoded form payloads field by field:
//! - Contact form: name, email, phone, message, priority
//! - Newsletter: email
//!
//! Every violated rule is collected; validation never stops at the first
//! problem and never panics on malformed input.

use email_address::{EmailAddress, Options};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("name pattern compiles"));

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+?[0-9]{1,3}[-.\s]?)?\(?[0-9]{1,4}\)?[-.\s]?[0-9]{1,4}[-.\s]?[0-9]{1,9}$")
        .expect("phone pattern compiles")
});

const MIN_MESSAGE_WORDS: usize = 6;

/// Field-keyed validation messages, in field name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, empty if none.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult<T> {
    /// Payload is valid; carries the normalized submission
    Valid(T),
    /// Payload is invalid
    Invalid(FieldErrors),
}

impl<T> ValidationResult<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, FieldErrors> {
        match self {
            ValidationResult::Valid(v) => Ok(v),
            ValidationResult::Invalid(e) => Err(e),
        }
    }
}

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub priority: bool,
}

/// A validated newsletter signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterSubmission {
    pub email: String,
}

/// Validate a contact form payload.
pub fn validate_contact(payload: &Map<String, Value>) -> ValidationResult<ContactSubmission> {
    let mut errors = FieldErrors::new();

    let name = optional_string(payload, "name", "Name", &mut errors);
    if let Some(name) = name.as_deref() {
        check_length(name, "name", "Name", 3, 50, &mut errors);
        if !NAME_PATTERN.is_match(name) {
            errors.add(
                "name",
                "Name can only contain letters, spaces, apostrophes and hyphens",
            );
        }
    }

    let email = required_string(payload, "email", "Email", &mut errors);
    if let Some(email) = email.as_deref() {
        check_email(email, &mut errors);
    }

    let phone = required_string(payload, "phone", "Phone number", &mut errors);
    if let Some(phone) = phone.as_deref() {
        check_length(phone, "phone", "Phone number", 9, 20, &mut errors);
        if !PHONE_PATTERN.is_match(phone) {
            errors.add("phone", "Invalid phone number format");
        }
    }

    let message = required_string(payload, "message", "Message", &mut errors);
    if let Some(message) = message.as_deref() {
        check_length(message, "message", "Message", 15, 2000, &mut errors);
        if word_count(message) < MIN_MESSAGE_WORDS {
            errors.add(
                "message",
                format!("Message must contain at least {MIN_MESSAGE_WORDS} words"),
            );
        }
    }

    let priority = match payload.get("priority") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.add("priority", "Priority must be a boolean");
            false
        }
    };

    match (email, phone, message) {
        (Some(email), Some(phone), Some(message)) if errors.is_empty() => {
            ValidationResult::Valid(ContactSubmission {
                name,
                email,
                phone,
                message,
                priority,
            })
        }
        _ => {
            debug!(%errors, "Contact payload rejected");
            ValidationResult::Invalid(errors)
        }
    }
}

/// Validate a newsletter signup payload.
pub fn validate_newsletter(
    payload: &Map<String, Value>,
) -> ValidationResult<NewsletterSubmission> {
    let mut errors = FieldErrors::new();

    let email = required_string(payload, "email", "Email", &mut errors);
    if let Some(email) = email.as_deref() {
        check_email(email, &mut errors);
    }

    match email {
        Some(email) if errors.is_empty() => {
            ValidationResult::Valid(NewsletterSubmission { email })
        }
        _ => {
            debug!(%errors, "Newsletter payload rejected");
            ValidationResult::Invalid(errors)
        }
    }
}

/// Trimmed string field; missing, non-string or blank records "is required".
fn required_string(
    payload: &Map<String, Value>,
    field: &'static str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match payload.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => {
            errors.add(field, format!("{label} is required"));
            None
        }
    }
}

/// Trimmed string field that may be absent or blank.
fn optional_string(
    payload: &Map<String, Value>,
    field: &'static str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match payload.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.add(field, format!("{label} must be a string"));
            None
        }
    }
}

fn check_length(
    value: &str,
    field: &'static str,
    label: &str,
    min: usize,
    max: usize,
    errors: &mut FieldErrors,
) {
    let len = value.chars().count();
    if len < min {
        errors.add(field, format!("{label} must be at least {min} characters"));
    } else if len > max {
        errors.add(field, format!("{label} must be at most {max} characters"));
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    check_length(email, "email", "Email", 6, 254, errors);
    let dotted_domain = email
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'));
    let plain_address = EmailAddress::parse_with_options(
        email,
        Options::default()
            .without_display_text()
            .without_domain_literal(),
    )
    .is_ok();
    // Must also be addressable by the mail transport
    let addressable = email.parse::<lettre::Address>().is_ok();
    if !(plain_address && addressable && dotted_domain) {
        errors.add("email", "Invalid email address");
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
