// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Email domain verification via MX lookup.
//!
//! A syntactically valid address says nothing about whether its domain can
//! receive mail. The verifier asks DNS for MX records and fails closed:
//! any resolver error, timeout or malformed domain counts as undeliverable.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use tracing::{debug, warn};

/// Checks whether an email address's domain accepts mail.
#[async_trait]
pub trait DomainVerifier: Send + Sync {
    /// Returns `true` only when the domain is known to receive mail.
    async fn is_deliverable(&self, email: &str) -> bool;
}

/// Domain part of an email address (after the last `@`), if non-empty.
pub fn email_domain(email: &str) -> Option<&str> {
    let (_, domain) = email.rsplit_once('@')?;
    let domain = domain.trim().trim_end_matches('.');
    if domain.is_empty() || domain.contains(char::is_whitespace) {
        None
    } else {
        Some(domain)
    }
}

/// MX-record verifier backed by the hickory resolver.
pub struct MxDomainVerifier {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl MxDomainVerifier {
    /// Create a verifier using the system resolver configuration, falling back
    /// to public resolvers when it cannot be read.
    pub fn new(timeout: Duration) -> Self {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!(error = %e, "System resolver config unavailable, using defaults");
                Self::default_resolver(timeout)
            }
        };
        Self { resolver, timeout }
    }

    /// Create a verifier with the public default resolvers.
    pub fn with_default_resolver(timeout: Duration) -> Self {
        Self {
            resolver: Self::default_resolver(timeout),
            timeout,
        }
    }

    fn default_resolver(timeout: Duration) -> TokioAsyncResolver {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
    }
}

#[async_trait]
impl DomainVerifier for MxDomainVerifier {
    async fn is_deliverable(&self, email: &str) -> bool {
        let Some(domain) = email_domain(email) else {
            warn!(email = %email, "No domain in email address");
            return false;
        };
        let fqdn = format!("{domain}.");

        match tokio::time::timeout(self.timeout, self.resolver.mx_lookup(fqdn.as_str())).await {
            Ok(Ok(lookup)) => {
                let count = lookup.iter().count();
                debug!(domain = %domain, mx_records = count, "MX lookup complete");
                count > 0
            }
            Ok(Err(e)) => {
                warn!(domain = %domain, error = %e, "MX lookup failed");
                false
            }
            Err(_) => {
                warn!(domain = %domain, timeout_ms = self.timeout.as_millis() as u64, "MX lookup timed out");
                false
            }
        }
    }
}
