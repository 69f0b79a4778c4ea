// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Site Forms Service
//!
//! Serves the contact form and newsletter signup endpoints.
//!
//! ## Endpoints
//!
//! - `POST /api/contact`: contact form submission
//! - `POST /api/newsletter`, `GET /api/newsletter`: signup and liveness
//! - `OPTIONS` on both: CORS pre-flight
//! - `GET /health`, `GET /healthz`
//!
//! ## Configuration
//!
//! Read from environment variables, optionally via a `.env` file:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `EMAIL_USER`, `EMAIL_PASS`, `EMAIL_RECEIVER`: mail credentials and operator address
//! - `SMTP_URL`: SMTP transport URL (default: smtps://smtp.gmail.com:465)
//! - `ABUSE_API_KEY`: remote decision service key; unset selects the local limiter
//! - `ABUSE_FAIL_POLICY`: `open` (default) or `closed`; any other value stops startup
//! - `MAX_RATE_RPM`: Max submissions per minute per IP for the local limiter (default: 5)
//! - `COOLDOWN_MS`: Burst cooldown in milliseconds (default: 60000)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use site_forms::{build_state, config::Config, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal in production
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        mail_configured = config.mail.is_complete(),
        remote_guard = config.abuse.api_key.is_some(),
        failure_policy = ?config.abuse.failure_policy,
        "Starting site forms service"
    );

    let addr: SocketAddr = config.bind_addr.parse()?;
    let state = Arc::new(build_state(config)?);

    // Spawn cleanup task for the local limiter
    if let Some(limiter) = state.limiter.clone() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
