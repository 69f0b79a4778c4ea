// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Abuse guard: rate limiting and bot protection for form submissions.
//!
//! The guard asks a [`DecisionService`] for a verdict keyed by client IP.
//! When the service itself fails, the configured [`FailurePolicy`] decides
//! the outcome. The default is to fail open: a broken abuse dependency must
//! not block legitimate visitors.

use crate::config::FailurePolicy;
use crate::limiter::{RateLimitResult, RateLimiter};
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Client key used when no IP header is present.
pub const UNKNOWN_CLIENT: &str = "unknown";

const CDN_CLIENT_IP: &str = "cf-connecting-ip";
const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Why a request was forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// Blocked by a generic shield rule
    Generic,
    /// Request originates from a hosting provider / data centre
    HostingIp,
}

/// Verdict for a single request. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbuseDecision {
    Allow,
    RateLimited { retry_after: Option<Duration> },
    BotDetected,
    Forbidden(ForbiddenReason),
}

impl AbuseDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AbuseDecision::Allow)
    }
}

impl std::fmt::Display for AbuseDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::RateLimited { .. } => write!(f, "rate limited"),
            Self::BotDetected => write!(f, "bot detected"),
            Self::Forbidden(ForbiddenReason::Generic) => write!(f, "forbidden"),
            Self::Forbidden(ForbiddenReason::HostingIp) => write!(f, "forbidden (hosting IP)"),
        }
    }
}

/// Failure of the decision service itself (not a deny verdict).
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("decision service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decision service returned status {0}")]
    Status(u16),

    #[error("decision service returned an unrecognised verdict: {0}")]
    Malformed(String),

    #[error("decision service timed out after {0:?}")]
    Timeout(Duration),
}

/// Inputs for one decision.
#[derive(Debug, Clone)]
pub struct GuardRequest {
    pub ip: String,
    pub user_agent: Option<String>,
    pub endpoint: &'static str,
}

impl GuardRequest {
    /// Build a request from inbound headers.
    pub fn from_headers(headers: &HeaderMap, endpoint: &'static str) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Self {
            ip: client_ip(headers),
            user_agent,
            endpoint,
        }
    }
}

/// Resolve the client IP from proxy headers.
///
/// Order: CDN client IP, first `x-forwarded-for` entry, `x-real-ip`, then
/// [`UNKNOWN_CLIENT`]. Never fails.
pub fn client_ip(headers: &HeaderMap) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header_value(CDN_CLIENT_IP)
        .or_else(|| {
            header_value(FORWARDED_FOR)
                .and_then(|list| list.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .or_else(|| header_value(REAL_IP))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// A source of abuse verdicts.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn decide(&self, request: &GuardRequest) -> Result<AbuseDecision, GuardError>;
}

/// Applies a [`DecisionService`] verdict under a failure policy and timeout.
pub struct AbuseGuard {
    service: Box<dyn DecisionService>,
    policy: FailurePolicy,
    timeout: Duration,
}

impl AbuseGuard {
    pub fn new(service: Box<dyn DecisionService>, policy: FailurePolicy, timeout: Duration) -> Self {
        Self {
            service,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Obtain a fresh verdict for this request.
    pub async fn protect(&self, request: &GuardRequest) -> AbuseDecision {
        let outcome = match tokio::time::timeout(self.timeout, self.service.decide(request)).await {
            Ok(result) => result,
            Err(_) => Err(GuardError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(decision) => {
                if decision.is_allowed() {
                    debug!(ip = %request.ip, endpoint = request.endpoint, "Request allowed");
                } else {
                    info!(
                        ip = %request.ip,
                        endpoint = request.endpoint,
                        decision = %decision,
                        "Request denied by abuse guard"
                    );
                }
                decision
            }
            Err(e) => match self.policy {
                FailurePolicy::Open => {
                    warn!(
                        ip = %request.ip,
                        endpoint = request.endpoint,
                        error = %e,
                        "Abuse decision failed, failing open"
                    );
                    AbuseDecision::Allow
                }
                FailurePolicy::Closed => {
                    warn!(
                        ip = %request.ip,
                        endpoint = request.endpoint,
                        error = %e,
                        "Abuse decision failed, failing closed"
                    );
                    AbuseDecision::Forbidden(ForbiddenReason::Generic)
                }
            },
        }
    }
}

/// User agent fragments of common automation clients.
const AUTOMATED_AGENTS: &[&str] = &[
    "curl",
    "wget",
    "python-requests",
    "python-urllib",
    "aiohttp",
    "httpx",
    "scrapy",
    "go-http-client",
    "libwww-perl",
    "java/",
    "okhttp",
    "node-fetch",
    "axios",
    "headlesschrome",
    "phantomjs",
    "puppeteer",
    "selenium",
];

/// True when the user agent is missing or names an automation client.
pub fn looks_automated(user_agent: Option<&str>) -> bool {
    match user_agent {
        None => true,
        Some(ua) => {
            let ua = ua.to_ascii_lowercase();
            AUTOMATED_AGENTS.iter().any(|agent| ua.contains(agent))
        }
    }
}

/// In-process decisions: user-agent bot heuristic plus token bucket limiter.
///
/// Used when no remote decision service is configured.
/// The limiter is shared so the periodic cleanup task can reach it.
pub struct LocalDecisionService {
    limiter: Arc<RateLimiter>,
}

impl LocalDecisionService {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl DecisionService for LocalDecisionService {
    async fn decide(&self, request: &GuardRequest) -> Result<AbuseDecision, GuardError> {
        if looks_automated(request.user_agent.as_deref()) {
            debug!(user_agent = ?request.user_agent, "Automated user agent");
            return Ok(AbuseDecision::BotDetected);
        }

        match self.limiter.check(&request.ip).await {
            RateLimitResult::Allowed => Ok(AbuseDecision::Allow),
            RateLimitResult::Limited { reason, retry_after } => {
                debug!(ip = %request.ip, reason = %reason, "Local limiter denied request");
                Ok(AbuseDecision::RateLimited {
                    retry_after: Some(retry_after),
                })
            }
        }
    }
}
