//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<RouterConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RouterConfig::default(),
    };

    let config = apply_env(config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `IS_LOCAL` is a presence flag: any value, even empty, enables it.
pub fn apply_env<F>(mut config: RouterConfig, lookup: F) -> RouterConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(root) = lookup("WP_ROOT") {
        config.root.app_root = PathBuf::from(root);
    }
    if let Some(vendor) = lookup("VENDOR_ROOT") {
        config.root.vendor_root = PathBuf::from(vendor);
    }
    if let Some(bucket) = lookup("WP_BUCKET") {
        config.root.bucket_name = bucket;
    }
    if lookup("IS_LOCAL").is_some() {
        config.root.is_local = true;
    }

    let db = &mut config.health_check.database;
    if let Some(host) = lookup("DB_HOST") {
        db.host = host;
    }
    if let Some(user) = lookup("DB_USER") {
        db.user = user;
    }
    if let Some(password) = lookup("DB_PASSWORD") {
        db.password = password;
    }
    if let Some(name) = lookup("DB_NAME") {
        db.name = name;
    }

    config
}
