//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Filesystem root and object-storage settings.
    pub root: RootConfig,

    /// Where script requests are handed off to.
    pub entry: EntryConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Location of the CMS tree and of the bucket mirroring its static files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RootConfig {
    /// Absolute filesystem root of the CMS tree (`WP_ROOT`).
    pub app_root: PathBuf,

    /// Dependency root handed to the script executor (`VENDOR_ROOT`).
    pub vendor_root: PathBuf,

    /// Object-storage bucket holding static assets (`WP_BUCKET`).
    pub bucket_name: String,

    /// Use the local object-storage endpoint instead of S3 (`IS_LOCAL`).
    pub is_local: bool,

    /// Host (and port) of the local object-storage endpoint.
    pub local_endpoint: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("/mnt/wordpress"),
            vendor_root: PathBuf::from("/var/task/vendor"),
            bucket_name: String::new(),
            is_local: false,
            local_endpoint: "localhost:9000".to_string(),
        }
    }
}

/// Script executor the router hands CMS requests to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Upstream address (e.g., "127.0.0.1:8000").
    pub upstream: String,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            upstream: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Database credentials used by the reachability check.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `DB_HOST`, optionally with `:port`.
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Run database and network checks before accepting traffic.
    pub startup: bool,

    /// Run the header check on every request.
    pub per_request: bool,

    /// Include the database check.
    pub database_enabled: bool,

    /// Include the outbound network check.
    pub network_enabled: bool,

    /// Connect and read timeout for each check, in seconds.
    pub timeout_secs: u64,

    /// Endpoint probed by the network check.
    pub network_url: String,

    /// Database credentials.
    pub database: DatabaseConfig,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            startup: false,
            per_request: false,
            database_enabled: true,
            network_enabled: true,
            timeout_secs: 10,
            network_url: "https://example.com".to_string(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Minimum severity for structured records (DEBUG .. EMERGENCY).
    pub log_level: String,

    /// `text` or `json`.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
