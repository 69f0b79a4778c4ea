// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Router assembly and state wiring.

use crate::config::Config;
use crate::decision_client::RemoteDecisionService;
use crate::domain_check::MxDomainVerifier;
use crate::guard::{AbuseGuard, DecisionService, GuardError, LocalDecisionService};
use crate::handlers::{
    contact, health, newsletter, newsletter_status, not_found, preflight, AppState,
};
use crate::limiter::RateLimiter;
use crate::notifier::Notifier;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Build the HTTP router. CORS headers are set on every response,
/// including errors and unmatched routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/contact", post(contact).options(preflight))
        .route(
            "/api/newsletter",
            get(newsletter_status).post(newsletter).options(preflight),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .with_state(state)
}

/// Wire the production services from configuration.
///
/// A remote decision service is used when an API key is configured,
/// otherwise the in-process limiter. Incomplete mail configuration leaves
/// the notifier unset; the service still starts.
pub fn build_state(config: Config) -> Result<AppState, GuardError> {
    let (service, limiter): (Box<dyn DecisionService>, Option<Arc<RateLimiter>>) =
        match config.abuse.api_key.clone() {
            Some(key) => {
                info!(url = %config.abuse.api_url, "Using remote abuse decision service");
                let remote = RemoteDecisionService::new(
                    config.abuse.api_url.clone(),
                    key,
                    config.abuse.timeout(),
                )?;
                (Box::new(remote), None)
            }
            None => {
                info!(
                    max_rate_rpm = config.rate_limit.max_rate_rpm,
                    "No abuse API key, using local rate limiter"
                );
                let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
                (Box::new(LocalDecisionService::new(limiter.clone())), Some(limiter))
            }
        };

    let guard = AbuseGuard::new(
        service,
        config.abuse.failure_policy,
        config.abuse.timeout(),
    );

    let notifier = match Notifier::from_config(&config.mail) {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            warn!(kind = "configuration", error = %e, "Mail delivery disabled");
            None
        }
    };

    Ok(AppState {
        verifier: Box::new(MxDomainVerifier::new(config.dns.timeout())),
        guard,
        notifier,
        limiter,
        config,
    })
}
