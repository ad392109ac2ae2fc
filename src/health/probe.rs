//! Health probe orchestration.
//!
//! # Responsibilities
//! - Run checks in order, stopping at the first failure
//! - Log each outcome (DEBUG on success, CRITICAL on failure)
//! - Record outcome metrics
//!
//! # Design Decisions
//! - No retries: a failed or timed-out check is terminal
//! - Startup checks (database, network) are separate from per-request
//!   checks (headers) since only the latter need a request

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::HealthCheckConfig;
use crate::health::database::{DatabaseCheck, MySqlConnector};
use crate::health::headers::HeadersCheck;
use crate::health::network::NetworkCheck;
use crate::http::RequestInfo;
use crate::observability::{metrics, StructuredLogger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CheckKind {
    Database,
    Headers,
    Network,
}

impl CheckKind {
    /// Human-readable name used in log lines and failure bodies.
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Database => "Database Access",
            CheckKind::Headers => "Headers",
            CheckKind::Network => "Internet Access",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Database => "database",
            CheckKind::Headers => "headers",
            CheckKind::Network => "network",
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResult {
    pub check: CheckKind,
    pub ok: bool,
    pub detail: Map<String, Value>,
}

impl HealthResult {
    pub fn pass(check: CheckKind) -> Self {
        Self {
            check,
            ok: true,
            detail: Map::new(),
        }
    }

    pub fn fail(check: CheckKind, detail: Value) -> Self {
        let detail = match detail {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("error".to_string(), other);
                map
            }
        };
        Self {
            check,
            ok: false,
            detail,
        }
    }

    /// `"<Name>: OK"` or `"<Name>: FAILED"`.
    pub fn message(&self) -> String {
        format!(
            "{}: {}",
            self.check.name(),
            if self.ok { "OK" } else { "FAILED" }
        )
    }
}

impl fmt::Display for HealthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("{0}")]
    Failed(HealthResult),
}

impl HealthError {
    pub fn result(&self) -> &HealthResult {
        match self {
            HealthError::Failed(result) => result,
        }
    }
}

/// A single pre-flight check.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn kind(&self) -> CheckKind;

    /// `request` is `None` when running outside a request (startup).
    async fn check(&self, request: Option<&RequestInfo>, logger: &StructuredLogger) -> HealthResult;
}

/// Runs the configured checks.
#[derive(Default)]
pub struct HealthProbe {
    startup_checks: Vec<Box<dyn HealthCheck>>,
    request_checks: Vec<Box<dyn HealthCheck>>,
}

impl HealthProbe {
    pub fn new(
        startup_checks: Vec<Box<dyn HealthCheck>>,
        request_checks: Vec<Box<dyn HealthCheck>>,
    ) -> Self {
        Self {
            startup_checks,
            request_checks,
        }
    }

    pub fn from_config(config: &HealthCheckConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut startup_checks: Vec<Box<dyn HealthCheck>> = Vec::new();

        if config.database_enabled {
            let connector = MySqlConnector::new(config.database.clone(), timeout, timeout);
            startup_checks.push(Box::new(DatabaseCheck::new(connector, timeout * 2)));
        }
        if config.network_enabled {
            startup_checks.push(Box::new(NetworkCheck::new(&config.network_url, timeout)));
        }

        Self::new(startup_checks, vec![Box::new(HeadersCheck)])
    }

    /// Database and network checks.
    pub async fn startup(&self, logger: &StructuredLogger) -> Result<Vec<HealthResult>, HealthError> {
        run_checks(&self.startup_checks, None, logger).await
    }

    /// Checks that inspect the incoming request.
    pub async fn preflight(
        &self,
        request: &RequestInfo,
        logger: &StructuredLogger,
    ) -> Result<Vec<HealthResult>, HealthError> {
        run_checks(&self.request_checks, Some(request), logger).await
    }

    /// Every check, request checks first.
    pub async fn run_all(
        &self,
        request: &RequestInfo,
        logger: &StructuredLogger,
    ) -> Result<Vec<HealthResult>, HealthError> {
        let mut results = self.preflight(request, logger).await?;
        results.extend(run_checks(&self.startup_checks, Some(request), logger).await?);
        Ok(results)
    }
}

async fn run_checks(
    checks: &[Box<dyn HealthCheck>],
    request: Option<&RequestInfo>,
    logger: &StructuredLogger,
) -> Result<Vec<HealthResult>, HealthError> {
    let mut results = Vec::with_capacity(checks.len());

    for check in checks {
        let result = check.check(request, logger).await;
        metrics::record_health_check(result.check.label(), result.ok);

        if result.ok {
            logger.debug(result.message(), Value::Null);
            results.push(result);
        } else {
            logger.critical(result.message(), Value::Object(result.detail.clone()));
            return Err(HealthError::Failed(result));
        }
    }

    Ok(results)
}
