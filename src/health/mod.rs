//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (probe.rs → startup):
//!     database.rs (connect + ping, 10s each)
//!     → network.rs (outbound GET, 10s)
//!     → fail: CRITICAL log, process exits non-zero
//!
//! Per request (probe.rs → preflight):
//!     headers.rs (forwarded proto + host present)
//!     → fail: CRITICAL log, HTTP 500 "<Check>: FAILED"
//! ```
//!
//! # Design Decisions
//! - Checks are independent; the first failure ends the run
//! - Timeouts count as failures, nothing is retried

pub mod database;
pub mod headers;
pub mod network;
pub mod probe;

pub use probe::{CheckKind, HealthCheck, HealthError, HealthProbe, HealthResult};
