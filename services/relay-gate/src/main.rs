// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Relay Gate Service
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables, optionally seeded from
//! a `.env` file in the working directory:
//!
//! - `RATE_LIMIT`: sustained requests per second per client (required)
//! - `RATE_BURST`: burst capacity per client (required)
//! - `BIND_ADDR`: server bind address (default: 0.0.0.0:8080)
//! - `SWEEP_INTERVAL_SECS`: idle-client sweep period (default: 60)
//! - `IDLE_TIMEOUT_SECS`: idle eviction threshold (default: 180)
//! - `FORWARDED_HEADER`: trusted client address header (default: x-forwarded-for)
//! - `HC_TOKEN`: health check token (default: unset, open)
//! - `METRICS_ENABLED`: serve `/metrics` (default: true)
//! - `DEV_MODE`: seed the file store with a sample record (default: false)

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relay_gate::{
    client_ip::IdentifierSource,
    config::Config,
    files::{self, MemoryFileStore},
    handlers::{router, AppState},
    limiter::AdmissionController,
    metrics::GateMetrics,
    reclaimer::Reclaimer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(e) = dotenvy::dotenv() {
        info!(reason = %e, "No .env file loaded");
    }

    // Load configuration; invalid limiter settings abort startup
    let config = Config::from_env().context("invalid configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        rate = config.rate_limit.rate,
        burst = config.rate_limit.burst,
        sweep_interval_secs = config.rate_limit.sweep_interval_secs,
        idle_timeout_secs = config.rate_limit.idle_timeout_secs,
        "Starting relay gate"
    );

    let metrics = Arc::new(GateMetrics::new().context("failed to register metrics")?);
    let controller = Arc::new(
        AdmissionController::new(config.rate_limit.clone()).with_metrics(metrics.clone()),
    );
    let reclaimer = Reclaimer::new(controller.clone(), &config.rate_limit).spawn();

    let store = Arc::new(MemoryFileStore::new());
    if config.dev_mode {
        let sample = files::seed_sample(store.as_ref()).context("failed to seed file store")?;
        info!(pub_id = %sample.pub_id, "Seeded sample file");
    }

    let state = Arc::new(AppState {
        controller,
        identifiers: IdentifierSource::new(config.client_ip.header_name()?),
        files: store,
        metrics: config.metrics.enabled.then(|| metrics.clone()),
        health_token: config.health_token.clone(),
        started: Instant::now(),
    });

    let metrics_path = config.metrics.enabled.then_some(config.metrics.path.as_str());
    let app = router(state, metrics_path);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Server listening");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    reclaimer.shutdown().await;
    served?;

    info!("Relay gate stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
