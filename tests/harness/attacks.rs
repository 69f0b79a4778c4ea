// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attack simulation patterns for security testing.

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Number of unique client IPs to rotate through
    pub unique_ips: usize,
    /// User agent sent with every request
    pub user_agent: Option<&'static str>,
    /// Whether payloads pass validation
    pub valid_payloads: bool,
    /// Target endpoint
    pub endpoint: &'static str,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 50,
            unique_ips: 1,
            user_agent: Some(super::fixtures::BROWSER_UA),
            valid_payloads: true,
            endpoint: "/api/newsletter",
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single IP flood against the newsletter endpoint.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 60,
            ..Default::default()
        }
    }

    /// Single IP flood against the contact form.
    pub fn contact_flood() -> Self {
        Self {
            total_requests: 30,
            endpoint: "/api/contact",
            ..Default::default()
        }
    }

    /// Many IPs, two submissions each.
    pub fn distributed() -> Self {
        Self {
            total_requests: 100,
            unique_ips: 50,
            ..Default::default()
        }
    }

    /// Scripted client with an honest user agent.
    pub fn bot_swarm(user_agent: Option<&'static str>) -> Self {
        Self {
            total_requests: 20,
            unique_ips: 20,
            user_agent,
            ..Default::default()
        }
    }

    /// Invalid bodies from one client.
    pub fn junk_payloads() -> Self {
        Self {
            total_requests: 40,
            valid_payloads: false,
            endpoint: "/api/contact",
            ..Default::default()
        }
    }
}

/// Expected outcomes for an attack pattern.
pub struct AttackExpectations {
    /// Maximum number of submissions that may be delivered
    pub max_delivered: usize,
    pub description: &'static str,
}

impl AttackConfig {
    /// Expectations against a local limiter allowing `rpm` per client.
    pub fn expectations(&self, rpm: usize) -> AttackExpectations {
        if !self.valid_payloads {
            AttackExpectations {
                max_delivered: 0,
                description: "Every payload should fail validation",
            }
        } else if site_forms::guard::looks_automated(self.user_agent) {
            AttackExpectations {
                max_delivered: 0,
                description: "Automated clients should be refused",
            }
        } else {
            let per_ip = self.total_requests.div_ceil(self.unique_ips);
            AttackExpectations {
                max_delivered: per_ip.min(rpm) * self.unique_ips,
                description: "Each client capped at its per-minute allowance",
            }
        }
    }
}
