//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize, overlay WP_ROOT / WP_BUCKET / DB_* ...)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; loaded once per process
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file, matching the platform's env-driven setup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env, load_config, ConfigError};
pub use schema::{
    DatabaseConfig, EntryConfig, HealthCheckConfig, ListenerConfig, ObservabilityConfig,
    RootConfig, RouterConfig, TimeoutConfig,
};
