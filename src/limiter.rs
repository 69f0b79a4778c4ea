// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Token bucket rate limiter for form submissions.
//!
//! One bucket per client key (normally the client IP, or the `unknown`
//! sentinel when no IP header is present). Includes burst detection with
//! configurable cooldown.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed,
    /// Request is rate limited
    Limited {
        /// Reason for rate limiting
        reason: RateLimitReason,
        /// Time until rate limit expires
        retry_after: Duration,
    },
}

/// Reason for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitReason {
    /// Client exceeded its per-minute allowance
    RateExceeded,
    /// Client is in cooldown after burst detection
    BurstCooldown,
}

impl std::fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateExceeded => write!(f, "Client rate limit exceeded"),
            Self::BurstCooldown => write!(f, "Burst detected, in cooldown"),
        }
    }
}

/// Token bucket for rate limiting.
#[derive(Debug)]
struct TokenBucket {
    /// Available tokens
    tokens: f64,
    /// Maximum tokens (bucket capacity)
    max_tokens: f64,
    /// Token refill rate per second
    refill_rate: f64,
    /// Last time tokens were refilled
    last_refill: Instant,
    /// Request timestamps for burst detection
    request_times: Vec<Instant>,
}

impl TokenBucket {
    fn new(max_rate_per_minute: u32) -> Self {
        let max_tokens = max_rate_per_minute.max(1) as f64;
        let refill_rate = max_tokens / 60.0;

        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: Instant::now(),
            request_times: Vec::new(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// Try to consume a token. Returns true if successful.
    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            self.request_times.push(Instant::now());
            true
        } else {
            false
        }
    }

    fn time_until_available(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            let needed = 1.0 - self.tokens;
            Duration::from_secs_f64(needed / self.refill_rate)
        }
    }

    /// Check if burst activity detected in the last 10 seconds.
    fn detect_burst(&mut self, threshold_multiplier: f32) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(10);

        self.request_times
            .retain(|t| now.duration_since(*t) < window);

        // Expected share of the per-minute rate in a 10s window
        let expected_in_window = (self.max_tokens / 6.0).max(1.0);
        // Never fewer than 3 prior requests
        let threshold = (expected_in_window * threshold_multiplier as f64).max(3.0) as usize;

        self.request_times.len() > threshold
    }
}

#[derive(Debug)]
struct CooldownState {
    until: Instant,
}

/// Thread-safe per-client rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
    cooldowns: Arc<RwLock<HashMap<String, CooldownState>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
            cooldowns: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check and consume the allowance for a client key.
    pub async fn check(&self, client: &str) -> RateLimitResult {
        {
            let cooldowns = self.cooldowns.read().await;
            if let Some(state) = cooldowns.get(client) {
                let now = Instant::now();
                if now < state.until {
                    let retry_after = state.until.duration_since(now);
                    debug!(client = %client, ?retry_after, "Client in cooldown");
                    return RateLimitResult::Limited {
                        reason: RateLimitReason::BurstCooldown,
                        retry_after,
                    };
                }
            }
        }

        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.max_rate_rpm));

        if bucket.detect_burst(self.config.burst_threshold_multiplier) {
            warn!(client = %client, "Burst detected, applying cooldown");
            let cooldown_duration = self.config.cooldown_duration();

            let mut cooldowns = self.cooldowns.write().await;
            cooldowns.insert(
                client.to_string(),
                CooldownState {
                    until: Instant::now() + cooldown_duration,
                },
            );

            return RateLimitResult::Limited {
                reason: RateLimitReason::BurstCooldown,
                retry_after: cooldown_duration,
            };
        }

        if bucket.try_consume() {
            RateLimitResult::Allowed
        } else {
            let retry_after = bucket.time_until_available();
            debug!(client = %client, ?retry_after, "Client rate limit exceeded");
            RateLimitResult::Limited {
                reason: RateLimitReason::RateExceeded,
                retry_after,
            }
        }
    }

    /// Clean up expired entries (should be called periodically).
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let stale_threshold = Duration::from_secs(300);

        {
            let mut buckets = self.buckets.write().await;
            buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < stale_threshold);
        }

        {
            let mut cooldowns = self.cooldowns.write().await;
            cooldowns.retain(|_, state| now < state.until);
        }
    }

    /// Number of tracked clients.
    pub async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }
}
