// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTML and plain-text bodies for notification emails.
//!
//! All submitter input is escaped with `ammonia::clean_text` before it is
//! placed into HTML.

use crate::validator::{ContactSubmission, NewsletterSubmission};
use ammonia::clean_text;
use chrono::Utc;

/// Rendered email: subject plus alternative HTML and text bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

const PRIORITY_PREFIX: &str = "[PRIORITY] ";

fn received_at() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn layout(title: &str, banner: Option<&str>, body: &str) -> String {
    let banner = banner
        .map(|b| {
            format!(
                r#"<div style="background:#c62828;color:#ffffff;padding:12px 16px;font-weight:bold;border-radius:4px;margin-bottom:16px;">{b}</div>"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="margin:0;padding:0;background:#f4f4f7;font-family:Arial,Helvetica,sans-serif;color:#333333;">
<div style="max-width:600px;margin:24px auto;background:#ffffff;border-radius:8px;padding:24px;">
{banner}<h2 style="margin-top:0;color:#1a1a2e;">{title}</h2>
{body}
<p style="font-size:12px;color:#888888;margin-top:24px;">This email was generated automatically by the website forms.</p>
</div>
</body>
</html>"#
    )
}

fn field_row(label: &str, value: &str) -> String {
    format!(
        r#"<tr><td style="padding:6px 12px 6px 0;font-weight:bold;vertical-align:top;">{label}</td><td style="padding:6px 0;white-space:pre-wrap;">{}</td></tr>"#,
        clean_text(value)
    )
}

fn contact_rows(submission: &ContactSubmission, with_priority: bool) -> String {
    let mut rows = Vec::new();
    if let Some(name) = submission.name.as_deref() {
        rows.push(field_row("Name", name));
    }
    rows.push(field_row("Email", &submission.email));
    rows.push(field_row("Phone", &submission.phone));
    rows.push(field_row("Message", &submission.message));
    if with_priority {
        rows.push(field_row(
            "Priority",
            if submission.priority { "Yes" } else { "No" },
        ));
    }
    format!(
        r#"<table style="border-collapse:collapse;width:100%;">{}</table>"#,
        rows.concat()
    )
}

fn contact_text(submission: &ContactSubmission) -> String {
    let mut text = String::new();
    if let Some(name) = submission.name.as_deref() {
        text.push_str(&format!("Name: {name}\n"));
    }
    text.push_str(&format!(
        "Email: {}\nPhone: {}\nMessage:\n{}\n",
        submission.email, submission.phone, submission.message
    ));
    text
}

/// Operator notice for a contact form submission.
pub fn contact_admin(submission: &ContactSubmission) -> EmailContent {
    let from = submission.name.as_deref().unwrap_or(&submission.email);
    let mut subject = format!("New Contact Form Submission from {from}");
    let mut text = String::new();
    let banner = if submission.priority {
        subject.insert_str(0, PRIORITY_PREFIX);
        text.push_str("*** PRIORITY REQUEST ***\n\n");
        Some("Priority request: please respond as soon as possible")
    } else {
        None
    };
    text.push_str(&contact_text(submission));
    let received = received_at();
    text.push_str(&format!(
        "Priority: {}\nReceived: {received}\n",
        if submission.priority { "yes" } else { "no" }
    ));

    let body = format!(
        r#"{}<p style="font-size:12px;color:#888888;">Received {received}</p>"#,
        contact_rows(submission, true)
    );

    EmailContent {
        subject,
        html: layout("New contact form submission", banner, &body),
        text,
    }
}

/// Acknowledgment sent back to the contact form submitter.
pub fn contact_user(submission: &ContactSubmission) -> EmailContent {
    let greeting = match submission.name.as_deref() {
        Some(name) => format!("Hi {},", clean_text(name)),
        None => "Hi,".to_string(),
    };
    let body = format!(
        "<p>{greeting}</p>\
         <p>Thank you for getting in touch. We have received your message and will get back to you shortly.</p>\
         <p>Here is a copy of what you sent us:</p>{}",
        contact_rows(submission, false)
    );

    let text_greeting = match submission.name.as_deref() {
        Some(name) => format!("Hi {name},"),
        None => "Hi,".to_string(),
    };
    let text = format!(
        "{text_greeting}\n\nThank you for getting in touch. We have received your message and will get back to you shortly.\n\nHere is a copy of what you sent us:\n\n{}",
        contact_text(submission)
    );

    EmailContent {
        subject: "Thank you for contacting us".to_string(),
        html: layout("We received your message", None, &body),
        text,
    }
}

/// Operator notice for a newsletter signup.
pub fn newsletter_admin(submission: &NewsletterSubmission) -> EmailContent {
    let received = received_at();
    let body = format!(
        r#"<p>A new visitor subscribed to the newsletter.</p><table style="border-collapse:collapse;width:100%;">{}{}</table>"#,
        field_row("Email", &submission.email),
        field_row("Received", &received)
    );

    EmailContent {
        subject: "New Newsletter Subscription".to_string(),
        html: layout("New newsletter subscription", None, &body),
        text: format!(
            "A new visitor subscribed to the newsletter.\n\nEmail: {}\nReceived: {received}\n",
            submission.email
        ),
    }
}

/// Confirmation sent to the newsletter subscriber.
pub fn newsletter_user(submission: &NewsletterSubmission) -> EmailContent {
    let body = format!(
        "<p>Thanks for subscribing! <strong>{}</strong> will now receive our newsletter.</p>\
         <p>If you did not request this, you can simply ignore this email.</p>",
        clean_text(&submission.email)
    );

    EmailContent {
        subject: "Subscription confirmed".to_string(),
        html: layout("You're subscribed", None, &body),
        text: format!(
            "Thanks for subscribing! {} will now receive our newsletter.\n\nIf you did not request this, you can simply ignore this email.\n",
            submission.email
        ),
    }
}
