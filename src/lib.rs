// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Site Forms
//!
//! Backend for the website's contact form and newsletter signup. Each
//! submission passes through the same pipeline:
//!
//! - Schema validation with per-field error messages
//! - MX lookup of the submitter's email domain (contact form only)
//! - Abuse guard: per-IP rate limiting and bot detection, failing open
//! - Two notification emails: operator notice and submitter confirmation
//!
//! Responses are JSON and carry permissive CORS headers.

pub mod app;
pub mod config;
pub mod decision_client;
pub mod domain_check;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod limiter;
pub mod notifier;
pub mod pipeline;
pub mod response;
pub mod templates;
pub mod validator;

pub use app::{build_state, router};
pub use config::Config;
pub use error::FormError;
pub use guard::{AbuseDecision, AbuseGuard};
pub use handlers::AppState;
pub use limiter::{RateLimitResult, RateLimiter};
pub use validator::{FieldErrors, ValidationResult};
