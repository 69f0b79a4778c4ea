// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Maps pipeline outcomes to HTTP responses.

use crate::error::FormError;
use crate::guard::{AbuseDecision, ForbiddenReason};
use crate::validator::FieldErrors;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const VALIDATION_FAILED: &str = "Validation failed";
pub const DOMAIN_INVALID: &str = "The email domain is invalid or cannot receive emails.";
pub const RATE_LIMITED: &str = "Too many requests. Please try again later.";
pub const BOT_DETECTED: &str = "Automated requests are not allowed.";
pub const FORBIDDEN: &str = "Forbidden";
pub const HOSTING_IP: &str = "Requests from hosting providers are not allowed.";
pub const CONFIGURATION_ERROR: &str = "Server configuration error.";

/// JSON body of every form response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// 200 with a success flag and message.
pub fn success(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: message.to_string(),
            errors: None,
        }),
    )
        .into_response()
}

/// Pre-flight answer: 200, empty body.
pub fn preflight() -> Response {
    StatusCode::OK.into_response()
}

pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse {
            success: false,
            message: "Not found".to_string(),
            errors: None,
        }),
    )
        .into_response()
}

/// Shape a failure. `delivery_message` is the endpoint's own failure text.
pub fn failure(err: FormError, delivery_message: &str) -> Response {
    let status = err.status();
    let mut retry_after = None;

    let (message, errors) = match err {
        FormError::InputInvalid(errors) => (VALIDATION_FAILED, Some(errors)),
        FormError::DomainUnreachable => (DOMAIN_INVALID, None),
        FormError::AbuseRejected(decision) => {
            let message = match decision {
                AbuseDecision::RateLimited { retry_after: after } => {
                    retry_after = after;
                    RATE_LIMITED
                }
                AbuseDecision::BotDetected => BOT_DETECTED,
                AbuseDecision::Forbidden(ForbiddenReason::HostingIp) => HOSTING_IP,
                AbuseDecision::Forbidden(ForbiddenReason::Generic) | AbuseDecision::Allow => {
                    FORBIDDEN
                }
            };
            (message, None)
        }
        FormError::ServerMisconfigured(_) => (CONFIGURATION_ERROR, None),
        FormError::DeliveryFailed(_) => (delivery_message, None),
    };

    let mut response = (
        status,
        Json(ApiResponse {
            success: false,
            message: message.to_string(),
            errors,
        }),
    )
        .into_response();

    if let Some(after) = retry_after {
        // Round up so clients never retry early
        let secs = after.as_secs() + u64::from(after.subsec_nanos() > 0);
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }

    response
}
