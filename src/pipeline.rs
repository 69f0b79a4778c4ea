// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission pipeline shared by both forms.
//!
//! Stages run in order and the first failure ends the request:
//! parse, validate, verify the email domain (contact only), consult the
//! abuse guard, then deliver notifications.

use crate::error::{FormError, Result};
use crate::guard::GuardRequest;
use crate::handlers::AppState;
use crate::notifier::NotificationOutcome;
use crate::templates::{self, EmailContent};
use crate::validator::{
    validate_contact, validate_newsletter, ContactSubmission, NewsletterSubmission,
    ValidationResult,
};
use axum::http::HeaderMap;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// Static description of one form endpoint.
pub struct FormKind<T> {
    /// Endpoint name used in logs and guard requests
    pub name: &'static str,
    pub validate: fn(&Map<String, Value>) -> ValidationResult<T>,
    /// Whether the submitter's email domain must have MX records
    pub verify_domain: bool,
    pub email: fn(&T) -> &str,
    pub admin_notice: fn(&T) -> EmailContent,
    pub confirmation: fn(&T) -> EmailContent,
    pub success_message: &'static str,
    pub failure_message: &'static str,
}

fn contact_email(submission: &ContactSubmission) -> &str {
    &submission.email
}

fn newsletter_email(submission: &NewsletterSubmission) -> &str {
    &submission.email
}

pub const CONTACT: FormKind<ContactSubmission> = FormKind {
    name: "contact",
    validate: validate_contact,
    verify_domain: true,
    email: contact_email,
    admin_notice: templates::contact_admin,
    confirmation: templates::contact_user,
    success_message: "Message sent successfully",
    failure_message: "Failed to send message",
};

pub const NEWSLETTER: FormKind<NewsletterSubmission> = FormKind {
    name: "newsletter",
    validate: validate_newsletter,
    verify_domain: false,
    email: newsletter_email,
    admin_notice: templates::newsletter_admin,
    confirmation: templates::newsletter_user,
    success_message: "Subscription successful",
    failure_message: "Subscription failed",
};

/// Decode a request body into a field map.
///
/// Anything that is not a JSON object (empty body, malformed JSON, arrays,
/// scalars) becomes an empty map so validation reports the missing fields.
pub fn parse_body(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            debug!("Request body is not a JSON object");
            Map::new()
        }
        Err(e) => {
            debug!(error = %e, "Request body is not valid JSON");
            Map::new()
        }
    }
}

/// Run a submission through every stage.
pub async fn submit<T>(
    state: &AppState,
    kind: &FormKind<T>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<()>
where
    T: Send + Sync,
{
    let payload = parse_body(body);

    let submission = (kind.validate)(&payload)
        .into_result()
        .map_err(FormError::InputInvalid)?;
    let email = (kind.email)(&submission);

    if kind.verify_domain && !state.verifier.is_deliverable(email).await {
        return Err(FormError::DomainUnreachable);
    }

    let decision = state
        .guard
        .protect(&GuardRequest::from_headers(headers, kind.name))
        .await;
    if !decision.is_allowed() {
        return Err(FormError::AbuseRejected(decision));
    }

    let Some(notifier) = state.notifier.as_ref() else {
        let missing = state.config.mail.missing();
        let detail = if missing.is_empty() {
            "invalid mail settings".to_string()
        } else {
            format!("missing {}", missing.join(", "))
        };
        error!(
            kind = "configuration",
            form = kind.name,
            detail = %detail,
            "Mail delivery unavailable, cannot deliver submission"
        );
        return Err(FormError::ServerMisconfigured(detail));
    };

    let outcome = notifier
        .deliver(
            email,
            (kind.admin_notice)(&submission),
            (kind.confirmation)(&submission),
        )
        .await;

    match outcome {
        NotificationOutcome::Sent => {
            info!(form = kind.name, "Submission delivered");
            Ok(())
        }
        NotificationOutcome::Failed { stage, cause } => {
            Err(FormError::DeliveryFailed(format!("{stage}: {cause}")))
        }
    }
}
