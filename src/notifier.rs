// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification delivery.
//!
//! A submission produces two emails, sent one after the other: the operator
//! notice, then the submitter confirmation. Delivery is at-most-once per
//! message and not transactional across the pair. If the confirmation fails
//! after the notice went out, the notice stays sent and the submission is
//! reported as failed.

use crate::config::MailConfig;
use crate::templates::EmailContent;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, error, info};

/// Mail transport and configuration errors.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing mail configuration: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("invalid mailbox {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

/// One message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub content: EmailContent,
}

/// Sends a single email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP mailer backed by lettre's async transport.
///
/// lettre checks connections out per send and returns or drops them on
/// every exit path, including transport errors.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the transport from configuration. Sender and password are required.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let (Some(sender), Some(password)) = (config.sender.as_ref(), config.password.as_ref())
        else {
            return Err(MailError::MissingConfig(config.missing()));
        };

        let from = parse_mailbox(sender)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(&config.smtp_url)?
            .credentials(Credentials::new(sender.clone(), password.clone()))
            .timeout(Some(config.timeout()))
            .build();

        Ok(Self { from, transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.content.subject.as_str());
        if let Some(reply_to) = email.reply_to.as_deref() {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }

        let message = builder.multipart(MultiPart::alternative_plain_html(
            email.content.text.clone(),
            email.content.html.clone(),
        ))?;

        let response = self.transport.send(message).await?;
        debug!(to = %email.to, code = %response.code(), "SMTP accepted message");
        Ok(())
    }
}

/// Outcome of delivering a submission's notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Failed {
        /// Which message failed: "admin notice" or "confirmation"
        stage: &'static str,
        cause: String,
    },
}

impl NotificationOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationOutcome::Sent)
    }
}

/// Sends the operator notice and the submitter confirmation.
pub struct Notifier {
    mailer: Box<dyn Mailer>,
    admin: String,
}

impl Notifier {
    pub fn new(mailer: Box<dyn Mailer>, admin: String) -> Self {
        Self { mailer, admin }
    }

    /// Build an SMTP-backed notifier, validating every mail setting up front.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        if !config.is_complete() {
            return Err(MailError::MissingConfig(config.missing()));
        }
        let admin = config.receiver.clone().unwrap_or_default();
        parse_mailbox(&admin)?;
        let mailer = SmtpMailer::from_config(config)?;
        Ok(Self::new(Box::new(mailer), admin))
    }

    /// Send the operator notice then the confirmation to `submitter`.
    ///
    /// Stops at the first failure; a notice already sent is not recalled.
    pub async fn deliver(
        &self,
        submitter: &str,
        admin_notice: EmailContent,
        confirmation: EmailContent,
    ) -> NotificationOutcome {
        let notice = OutgoingEmail {
            to: self.admin.clone(),
            reply_to: Some(submitter.to_string()),
            content: admin_notice,
        };
        if let Err(e) = self.mailer.send(&notice).await {
            error!(stage = "admin notice", error = %e, "Notification failed");
            return NotificationOutcome::Failed {
                stage: "admin notice",
                cause: e.to_string(),
            };
        }
        info!(stage = "admin notice", "Notification sent");

        let confirmation = OutgoingEmail {
            to: submitter.to_string(),
            reply_to: None,
            content: confirmation,
        };
        if let Err(e) = self.mailer.send(&confirmation).await {
            error!(
                stage = "confirmation",
                error = %e,
                "Notification failed after admin notice was sent"
            );
            return NotificationOutcome::Failed {
                stage: "confirmation",
                cause: e.to_string(),
            };
        }
        info!(stage = "confirmation", "Notification sent");

        NotificationOutcome::Sent
    }
}
