// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types reaching the response layer.

use crate::guard::AbuseDecision;
use crate::validator::FieldErrors;
use axum::http::StatusCode;
use thiserror::Error;

/// Terminal failure of a form submission.
///
/// Library faults (SMTP, HTTP, DNS) never appear here directly; they are
/// logged where they occur and folded into one of these kinds.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("validation failed: {0}")]
    InputInvalid(FieldErrors),

    #[error("email domain cannot receive mail")]
    DomainUnreachable,

    #[error("rejected by abuse guard: {0}")]
    AbuseRejected(AbuseDecision),

    #[error("server misconfigured: {0}")]
    ServerMisconfigured(String),

    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

impl FormError {
    pub fn status(&self) -> StatusCode {
        match self {
            FormError::InputInvalid(_) | FormError::DomainUnreachable => StatusCode::BAD_REQUEST,
            FormError::AbuseRejected(AbuseDecision::RateLimited { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            FormError::AbuseRejected(_) => StatusCode::FORBIDDEN,
            FormError::ServerMisconfigured(_) | FormError::DeliveryFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-readable kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FormError::InputInvalid(_) => "input_invalid",
            FormError::DomainUnreachable => "domain_unreachable",
            FormError::AbuseRejected(_) => "abuse_rejected",
            FormError::ServerMisconfigured(_) => "configuration",
            FormError::DeliveryFailed(_) => "delivery_failed",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FormError>;
