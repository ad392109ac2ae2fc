//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, the panic hook and metrics
//! - Run startup health checks
//! - Bind the listener and serve until a termination signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound last (traffic only when ready)

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, RouterConfig};
use crate::error::ErrorTranslator;
use crate::health::{HealthError, HealthProbe};
use crate::http::HttpServer;
use crate::observability::{logging, metrics, LogLevel, StructuredLogger};

use super::shutdown::Shutdown;
use super::signals;

/// Options taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    /// Run the startup checks and exit without serving.
    pub check_only: bool,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("startup check failed: {0}")]
    Health(#[from] HealthError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Load configuration and apply command-line overrides.
pub fn prepare_config(options: &StartupOptions) -> Result<RouterConfig, StartupError> {
    let mut config = load_config(options.config_path.as_deref())?;
    if let Some(address) = &options.bind_address {
        config.listener.bind_address = address.clone();
    }
    Ok(config)
}

/// Run the startup checks, logging through `logger`.
pub async fn startup_checks(
    config: &RouterConfig,
    logger: &StructuredLogger,
) -> Result<(), StartupError> {
    let probe = HealthProbe::from_config(&config.health_check);
    let results = probe.startup(logger).await?;
    tracing::info!(checks = results.len(), "Startup checks passed");
    Ok(())
}

/// Start the router and block until shutdown.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = prepare_config(&options)?;

    logging::init_tracing(&config.observability);
    ErrorTranslator::install();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        app_root = %config.root.app_root.display(),
        bucket = %config.root.bucket_name,
        is_local = config.root.is_local,
        "wp-router starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    if config.health_check.startup || options.check_only {
        let level = config
            .observability
            .log_level
            .parse()
            .unwrap_or(LogLevel::Debug);
        startup_checks(&config, &StructuredLogger::new(level)).await?;
        if options.check_only {
            return Ok(());
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config);
    server
        .run(listener, shutdown.wait())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
