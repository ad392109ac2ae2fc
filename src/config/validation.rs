//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::observability::LogLevel;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("root.app_root must not be empty")]
    EmptyAppRoot,
    #[error("root.app_root must be absolute, got '{0}'")]
    RelativeAppRoot(String),
    #[error("root.bucket_name must be set (WP_BUCKET)")]
    MissingBucket,
    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("health_check.network_url is not a valid URL: '{0}'")]
    InvalidUrl(String),
    #[error("observability.log_level '{0}' is not a known level")]
    InvalidLogLevel(String),
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let root = &config.root;
    if root.app_root.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyAppRoot);
    } else if !root.app_root.is_absolute() {
        errors.push(ValidationError::RelativeAppRoot(
            root.app_root.display().to_string(),
        ));
    }
    if root.bucket_name.trim().is_empty() {
        errors.push(ValidationError::MissingBucket);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.entry.upstream.is_empty() {
        errors.push(ValidationError::InvalidAddress {
            field: "entry.upstream",
            value: config.entry.upstream.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("health_check.timeout_secs"));
    }
    if url::Url::parse(&config.health_check.network_url).is_err() {
        errors.push(ValidationError::InvalidUrl(
            config.health_check.network_url.clone(),
        ));
    }

    if config.observability.log_level.parse::<LogLevel>().is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
