// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the site forms service.
//!
//! Everything is read once at startup from the environment (and an optional
//! `.env` file) and is immutable afterwards.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ABUSE_FAIL_POLICY must be `open` or `closed`, got `{0}`")]
    InvalidFailurePolicy(String),
}

/// Configuration for the site forms service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Outbound mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Abuse guard configuration
    #[serde(default)]
    pub abuse: AbuseConfig,

    /// Local rate limiting configuration (used without a decision service key)
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// DNS configuration for the domain verifier
    #[serde(default)]
    pub dns: DnsConfig,
}

/// Outbound mail configuration.
///
/// The three credentials are optional so that the service can start without
/// them; a submission reaching the notifier then fails with a configuration
/// error instead of a transport fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender address, also used as the SMTP username
    #[serde(default)]
    pub sender: Option<String>,

    /// SMTP password
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Recipient of operator notifications
    #[serde(default)]
    pub receiver: Option<String>,

    /// SMTP connection URL (default: smtps://smtp.gmail.com:465)
    #[serde(default = "default_smtp_url")]
    pub smtp_url: String,

    /// SMTP timeout in milliseconds (default: 10000)
    #[serde(default = "default_smtp_timeout_ms")]
    pub timeout_ms: u64,
}

/// How the guard treats a failure of the decision service itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Treat as allowed
    #[default]
    Open,
    /// Treat as forbidden
    Closed,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}

/// Abuse guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbuseConfig {
    /// API key of the remote decision service; `None` selects the local limiter
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Remote decision endpoint
    #[serde(default = "default_abuse_api_url")]
    pub api_url: String,

    /// Decision timeout in milliseconds (default: 2000)
    #[serde(default = "default_abuse_timeout_ms")]
    pub timeout_ms: u64,

    /// Behaviour when the decision service errors (default: open)
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// Local rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per minute per client IP (default: 5)
    #[serde(default = "default_max_rate_rpm")]
    pub max_rate_rpm: u32,

    /// Cooldown period after burst detection in milliseconds (default: 60000)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_on_burst_ms: u64,

    /// Burst threshold multiplier (default: 3x normal rate in 10s window)
    #[serde(default = "default_burst_threshold")]
    pub burst_threshold_multiplier: f32,
}

/// DNS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// MX lookup timeout in milliseconds (default: 3000)
    #[serde(default = "default_dns_timeout_ms")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_smtp_url() -> String {
    "smtps://smtp.gmail.com:465".to_string()
}

fn default_smtp_timeout_ms() -> u64 {
    10_000
}

fn default_abuse_api_url() -> String {
    "https://decide.arcjet.com/v1/decide".to_string()
}

fn default_abuse_timeout_ms() -> u64 {
    2_000
}

fn default_max_rate_rpm() -> u32 {
    5
}

fn default_cooldown_ms() -> u64 {
    60_000
}

fn default_burst_threshold() -> f32 {
    3.0
}

fn default_dns_timeout_ms() -> u64 {
    3_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            mail: MailConfig::default(),
            abuse: AbuseConfig::default(),
            rate_limit: RateLimitConfig::default(),
            dns: DnsConfig::default(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: None,
            password: None,
            receiver: None,
            smtp_url: default_smtp_url(),
            timeout_ms: default_smtp_timeout_ms(),
        }
    }
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_abuse_api_url(),
            timeout_ms: default_abuse_timeout_ms(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_rate_rpm: default_max_rate_rpm(),
            cooldown_on_burst_ms: default_cooldown_ms(),
            burst_threshold_multiplier: default_burst_threshold(),
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_dns_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable numeric variables fall back to their defaults.
    /// An unrecognized failure policy is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let failure_policy = match non_empty("ABUSE_FAIL_POLICY") {
            Some(value) => value
                .parse::<FailurePolicy>()
                .map_err(|_| ConfigError::InvalidFailurePolicy(value))?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(default_bind_addr),
            mail: MailConfig {
                sender: non_empty("EMAIL_USER"),
                password: non_empty("EMAIL_PASS"),
                receiver: non_empty("EMAIL_RECEIVER"),
                smtp_url: non_empty("SMTP_URL").unwrap_or_else(default_smtp_url),
                timeout_ms: parse_var(non_empty("SMTP_TIMEOUT_MS")).unwrap_or_else(default_smtp_timeout_ms),
            },
            abuse: AbuseConfig {
                api_key: non_empty("ABUSE_API_KEY"),
                api_url: non_empty("ABUSE_API_URL").unwrap_or_else(default_abuse_api_url),
                timeout_ms: parse_var(non_empty("ABUSE_TIMEOUT_MS")).unwrap_or_else(default_abuse_timeout_ms),
                failure_policy,
            },
            rate_limit: RateLimitConfig {
                max_rate_rpm: parse_var(non_empty("MAX_RATE_RPM")).unwrap_or_else(default_max_rate_rpm),
                cooldown_on_burst_ms: parse_var(non_empty("COOLDOWN_MS")).unwrap_or_else(default_cooldown_ms),
                ..Default::default()
            },
            dns: DnsConfig {
                timeout_ms: parse_var(non_empty("DNS_TIMEOUT_MS")).unwrap_or_else(default_dns_timeout_ms),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

impl MailConfig {
    /// True when sender, password and receiver are all present.
    pub fn is_complete(&self) -> bool {
        self.sender.is_some() && self.password.is_some() && self.receiver.is_some()
    }

    /// Names of the missing mail variables.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender.is_none() {
            missing.push("EMAIL_USER");
        }
        if self.password.is_none() {
            missing.push("EMAIL_PASS");
        }
        if self.receiver.is_none() {
            missing.push("EMAIL_RECEIVER");
        }
        missing
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AbuseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl RateLimitConfig {
    /// Get the cooldown duration
    pub fn cooldown_duration(&self) -> Duration {
        Duration::from_millis(self.cooldown_on_burst_ms)
    }
}

impl DnsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
