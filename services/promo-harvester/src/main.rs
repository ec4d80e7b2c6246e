//! Promo Harvester
//!
//! Long-running binary that:
//! 1. Loads credentials (`appToken|promoId|eventType` per line)
//! 2. Seeds duplicate suppression from the existing code file
//! 3. Runs every credential through login → event polling → redemption,
//!    spread across supervised execution units
//! 4. Appends each new promo code to the code file until interrupted

mod config;
mod error;
mod metrics;
mod status;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promo_client::{CredentialRecord, FileCodeSink, HttpPromoApi, load_credentials, read_existing_codes};
use promo_engine::{DedupScope, Engine, Supervisor};

use crate::config::Config;
use crate::status::StatusState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting promo-harvester");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        credentials_path = %config.input.credentials_path.display(),
        codes_path = %config.output.codes_path.display(),
        base_url = %config.api.base_url,
        units = config.engine.units,
        "configuration loaded"
    );

    let credentials = match startup_credentials(&config.input.credentials_path).await {
        Ok(credentials) => credentials,
        Err(e) => {
            error!(error = %e, "nothing to harvest");
            std::process::exit(e.exit_code());
        }
    };
    let credential_count = credentials.len();

    let seed = read_existing_codes(&config.output.codes_path)
        .await
        .with_context(|| {
            format!(
                "failed to read existing codes from {}",
                config.output.codes_path.display()
            )
        })?;
    info!(codes = seed.len(), "seeded duplicate suppression from output");

    let api = HttpPromoApi::new(config.api_settings()).context("failed to build HTTP client")?;
    let sink = FileCodeSink::new(config.output.codes_path.clone());
    let engine = Arc::new(Engine::new(
        Arc::new(api),
        Arc::new(sink),
        seed,
        config.dedup_scope(),
        config.retry_policy(),
    ));
    if engine.scope() == DedupScope::PerUnit {
        warn!("dedup_scope = per_unit: a respawned unit forgets codes its predecessor wrote this run");
    }
    let supervisor = Supervisor::new(
        engine.clone(),
        credentials,
        config.engine.units,
        config.restart_policy(),
    );
    let units = supervisor.partitions().len();

    let cancel = CancellationToken::new();

    // Recorder must be installed before any unit emits a metric
    let status_handle = match config.status.listen_addr {
        Some(addr) => {
            let prometheus =
                metrics::install_recorder().context("failed to install Prometheus recorder")?;
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind status listener to {addr}"))?;
            let router = status::build_router(StatusState {
                stats: engine.stats().clone(),
                units,
                credentials: credential_count,
                prometheus,
            });
            info!(addr = %addr, "status listener ready");
            Some(tokio::spawn(status::serve(listener, router, cancel.clone())))
        }
        None => None,
    };

    let engine_handle = tokio::spawn(supervisor.run(cancel.clone()));
    info!(units, credentials = credential_count, "engine running");

    shutdown_signal().await;
    cancel.cancel();

    let drain_timeout = config.drain_timeout();
    match tokio::time::timeout(drain_timeout, engine_handle).await {
        Ok(Ok(())) => info!("all units stopped"),
        Ok(Err(e)) => error!(error = %e, "supervisor task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = drain_timeout.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    if let Some(handle) = status_handle {
        match tokio::time::timeout(drain_timeout, handle).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => error!(error = %e, "status listener error"),
            Ok(Err(e)) => error!(error = %e, "status listener task panicked"),
            Err(_) => warn!("status listener did not stop in time"),
        }
    }

    let stats = engine.stats().snapshot();
    info!(
        codes_persisted = stats.codes_persisted,
        duplicate_codes = stats.duplicate_codes,
        cycles_completed = stats.cycles_completed,
        unit_restarts = stats.unit_restarts,
        "program stopped"
    );
    Ok(())
}

/// Load the credential list, treating an unreadable file like an empty one.
async fn startup_credentials(path: &Path) -> error::Result<Vec<CredentialRecord>> {
    let records = match load_credentials(path).await {
        Ok(report) => report.records,
        Err(e) => {
            warn!(error = %e, "credential file unavailable");
            Vec::new()
        }
    };

    if records.is_empty() {
        return Err(error::Error::NoCredentials {
            path: path.to_path_buf(),
        });
    }
    Ok(records)
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
