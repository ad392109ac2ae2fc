//! Database reachability check.

use std::error::Error as StdError;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::json;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tokio::time;

use crate::config::DatabaseConfig;
use crate::error::ErrorTranslator;
use crate::health::probe::{CheckKind, HealthCheck, HealthResult};
use crate::http::RequestInfo;
use crate::observability::StructuredLogger;

pub type BoxError = Box<dyn StdError + Send + Sync>;

const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Opens a connection to the database.
///
/// `Ok(true)` means a connection was established.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self) -> Result<bool, BoxError>;
}

/// MySQL connector with bounded connect and read phases.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    config: DatabaseConfig,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl MySqlConnector {
    pub fn new(config: DatabaseConfig, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            config,
            connect_timeout,
            read_timeout,
        }
    }

    fn options(&self) -> Result<MySqlConnectOptions, BoxError> {
        let (host, port) = split_host_port(&self.config.host)?;
        let mut options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&self.config.user)
            .password(&self.config.password);
        if !self.config.name.is_empty() {
            options = options.database(&self.config.name);
        }
        Ok(options)
    }
}

/// Split `host[:port]`, defaulting to the MySQL port.
fn split_host_port(value: &str) -> Result<(&str, u16), BoxError> {
    if value.is_empty() {
        return Err("DB_HOST is not set".into());
    }
    match value.rsplit_once(':') {
        Some((host, port)) => Ok((host, port.parse()?)),
        None => Ok((value, DEFAULT_MYSQL_PORT)),
    }
}

#[async_trait]
impl DatabaseConnector for MySqlConnector {
    async fn connect(&self) -> Result<bool, BoxError> {
        let options = self.options()?;

        let mut conn = time::timeout(self.connect_timeout, options.connect())
            .await
            .map_err(|_| format!("connect timed out after {:?}", self.connect_timeout))??;

        time::timeout(self.read_timeout, conn.ping())
            .await
            .map_err(|_| format!("read timed out after {:?}", self.read_timeout))??;

        conn.close().await?;
        Ok(true)
    }
}

/// Fails on any error, a `false` outcome, a timeout or a panic.
pub struct DatabaseCheck {
    connector: Box<dyn DatabaseConnector>,
    timeout: Duration,
}

impl DatabaseCheck {
    pub fn new(connector: impl DatabaseConnector + 'static, timeout: Duration) -> Self {
        Self {
            connector: Box::new(connector),
            timeout,
        }
    }
}

#[async_trait]
impl HealthCheck for DatabaseCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Database
    }

    async fn check(&self, _request: Option<&RequestInfo>, _logger: &StructuredLogger) -> HealthResult {
        let attempt = AssertUnwindSafe(self.connector.connect()).catch_unwind();

        match time::timeout(self.timeout, attempt).await {
            Ok(Ok(Ok(true))) => HealthResult::pass(CheckKind::Database),
            Ok(Ok(Ok(false))) => HealthResult::fail(
                CheckKind::Database,
                json!({ "error": "connection was not established" }),
            ),
            Ok(Ok(Err(e))) => {
                HealthResult::fail(CheckKind::Database, json!({ "error": e.to_string() }))
            }
            Ok(Err(payload)) => {
                let fault = ErrorTranslator::panic_fault(payload.as_ref());
                HealthResult::fail(
                    CheckKind::Database,
                    json!({ "error": fault.message, "panic": true }),
                )
            }
            Err(_) => HealthResult::fail(
                CheckKind::Database,
                json!({ "error": format!("timed out after {:?}", self.timeout) }),
            ),
        }
    }
}
