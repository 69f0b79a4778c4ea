// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact and newsletter endpoints.
//!
//! Bodies are taken as raw bytes so that malformed JSON reaches validation
//! instead of being rejected by an extractor.

use crate::config::Config;
use crate::domain_check::DomainVerifier;
use crate::guard::AbuseGuard;
use crate::limiter::RateLimiter;
use crate::notifier::Notifier;
use crate::pipeline::{self, FormKind, CONTACT, NEWSLETTER};
use crate::response;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub verifier: Box<dyn DomainVerifier>,
    pub guard: AbuseGuard,
    /// `None` when the mail configuration is incomplete
    pub notifier: Option<Notifier>,
    /// In-process limiter, when the guard uses one
    pub limiter: Option<Arc<RateLimiter>>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "site-forms",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// CORS pre-flight. Needs no configuration.
pub async fn preflight() -> Response {
    response::preflight()
}

/// Liveness probe for the newsletter endpoint.
pub async fn newsletter_status() -> Response {
    response::success("Newsletter endpoint is live")
}

pub async fn not_found() -> Response {
    response::not_found()
}

pub async fn contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, &CONTACT, &headers, &body).await
}

pub async fn newsletter(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, &NEWSLETTER, &headers, &body).await
}

async fn handle<T>(
    state: &AppState,
    kind: &FormKind<T>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response
where
    T: Send + Sync,
{
    match pipeline::submit(state, kind, headers, body).await {
        Ok(()) => response::success(kind.success_message),
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                warn!(form = kind.name, kind = e.kind(), error = %e, "Submission failed");
            } else {
                info!(
                    form = kind.name,
                    kind = e.kind(),
                    status = status.as_u16(),
                    "Submission rejected"
                );
            }
            response::failure(e, kind.failure_message)
        }
    }
}
