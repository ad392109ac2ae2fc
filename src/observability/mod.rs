//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (leveled records through StructuredLogger → tracing)
//!     → metrics.rs (decision and health counters)
//!
//! Consumers:
//!     → stderr (collected by the platform log stream)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Logger is an explicit value handed to components, not a global
//! - Request ID flows into every per-request log record

pub mod logging;
pub mod metrics;

pub use logging::{LogLevel, LogMessage, LogRecord, StructuredLogger};
