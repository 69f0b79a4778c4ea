// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-memory application with fake mail, DNS and decision services.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use site_forms::{
    config::{Config, FailurePolicy, RateLimitConfig},
    domain_check::{email_domain, DomainVerifier},
    guard::{
        AbuseDecision, AbuseGuard, DecisionService, GuardError, GuardRequest,
        LocalDecisionService,
    },
    handlers::AppState,
    limiter::RateLimiter,
    notifier::{MailError, Mailer, Notifier, OutgoingEmail},
    router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15";

pub const ADMIN: &str = "team@example.com";

/// Records outgoing mail; fails the send whose index equals `fail_on`.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    pub fail_on: Option<usize>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_on == Some(sent.len()) {
            return Err(MailError::MissingConfig(vec!["EMAIL_PASS"]));
        }
        sent.push(email.clone());
        Ok(())
    }
}

/// Treats reserved `.test` and `.invalid` domains as unable to receive mail.
pub struct ReservedTldVerifier;

#[async_trait]
impl DomainVerifier for ReservedTldVerifier {
    async fn is_deliverable(&self, email: &str) -> bool {
        match email_domain(email) {
            Some(domain) => {
                let domain = domain.to_ascii_lowercase();
                !(domain.ends_with(".test") || domain.ends_with(".invalid"))
            }
            None => false,
        }
    }
}

/// Decision service returning a fixed verdict, or failing every call.
pub struct ScriptedDecisions(pub Option<AbuseDecision>);

#[async_trait]
impl DecisionService for ScriptedDecisions {
    async fn decide(&self, _: &GuardRequest) -> Result<AbuseDecision, GuardError> {
        self.0
            .clone()
            .ok_or_else(|| GuardError::Malformed("service unavailable".to_string()))
    }
}

/// How the test app's abuse guard decides.
pub enum GuardMode {
    Verdict(AbuseDecision),
    Failing(FailurePolicy),
    Local(RateLimitConfig),
}

pub struct TestApp {
    pub router: Router,
    pub mailer: RecordingMailer,
}

impl TestApp {
    pub fn new(guard: GuardMode) -> Self {
        Self::build(guard, Some(RecordingMailer::default()))
    }

    /// App whose notifier failed on the given send index.
    pub fn with_failing_send(fail_on: usize) -> Self {
        Self::build(
            GuardMode::Verdict(AbuseDecision::Allow),
            Some(RecordingMailer {
                fail_on: Some(fail_on),
                ..Default::default()
            }),
        )
    }

    /// App started without any mail configuration.
    pub fn without_mail() -> Self {
        Self::build(GuardMode::Verdict(AbuseDecision::Allow), None)
    }

    fn build(guard: GuardMode, mailer: Option<RecordingMailer>) -> Self {
        let (service, policy, limiter): (Box<dyn DecisionService>, _, _) = match guard {
            GuardMode::Verdict(decision) => (
                Box::new(ScriptedDecisions(Some(decision))),
                FailurePolicy::Open,
                None,
            ),
            GuardMode::Failing(policy) => (Box::new(ScriptedDecisions(None)), policy, None),
            GuardMode::Local(config) => {
                let limiter = Arc::new(RateLimiter::new(config));
                (
                    Box::new(LocalDecisionService::new(limiter.clone())),
                    FailurePolicy::Open,
                    Some(limiter),
                )
            }
        };

        let recorder = mailer.clone().unwrap_or_default();
        let notifier = mailer.map(|m| Notifier::new(Box::new(m), ADMIN.to_string()));

        let state = AppState {
            config: Config::default(),
            verifier: Box::new(ReservedTldVerifier),
            guard: AbuseGuard::new(service, policy, Duration::from_secs(1)),
            notifier,
            limiter,
        };

        Self {
            router: router(Arc::new(state)),
            mailer: recorder,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.mailer.sent.lock().unwrap().clone()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post(&self, uri: &str, body: impl Into<String>) -> TestResponse {
        self.send(post_from(uri, body, "198.51.100.20", Some(BROWSER_UA)))
            .await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// POST with a JSON content type, client IP and optional user agent.
pub fn post_from(
    uri: &str,
    body: impl Into<String>,
    ip: &str,
    user_agent: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip);
    if let Some(ua) = user_agent {
        builder = builder.header(header::USER_AGENT, ua);
    }
    builder.body(Body::from(body.into())).unwrap()
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
