// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client for the remote rate-limit / bot-detection decision service.

use crate::guard::{AbuseDecision, DecisionService, ForbiddenReason, GuardError, GuardRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct DecisionQuery<'a> {
    ip: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
    endpoint: &'a str,
}

/// Verdict as returned by the decision service.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionReply {
    pub conclusion: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub retry_after_secs: Option<u64>,
}

impl DecisionReply {
    /// Map the wire verdict onto an [`AbuseDecision`].
    pub fn interpret(&self) -> Result<AbuseDecision, GuardError> {
        match self.conclusion.to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(AbuseDecision::Allow),
            "DENY" => {
                let reason = self.reason.as_deref().map(str::to_ascii_uppercase);
                Ok(match reason.as_deref() {
                    Some("RATE_LIMIT") => AbuseDecision::RateLimited {
                        retry_after: self.retry_after_secs.map(Duration::from_secs),
                    },
                    Some("BOT") => AbuseDecision::BotDetected,
                    Some("HOSTING") => AbuseDecision::Forbidden(ForbiddenReason::HostingIp),
                    _ => AbuseDecision::Forbidden(ForbiddenReason::Generic),
                })
            }
            "ERROR" => Err(GuardError::Malformed(format!(
                "service reported error: {}",
                self.reason.as_deref().unwrap_or("unspecified")
            ))),
            other => Err(GuardError::Malformed(other.to_string())),
        }
    }
}

/// Decision service reached over HTTP with a bearer API key.
pub struct RemoteDecisionService {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteDecisionService {
    /// Create a new client; `timeout` bounds each HTTP exchange.
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, GuardError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl DecisionService for RemoteDecisionService {
    async fn decide(&self, request: &GuardRequest) -> Result<AbuseDecision, GuardError> {
        let query = DecisionQuery {
            ip: &request.ip,
            user_agent: request.user_agent.as_deref(),
            endpoint: request.endpoint,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GuardError::Status(response.status().as_u16()));
        }

        let reply: DecisionReply = response.json().await?;
        debug!(conclusion = %reply.conclusion, reason = ?reply.reason, "Decision received");
        reply.interpret()
    }
}
