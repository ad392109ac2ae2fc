//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, raw uri)
//!     → resolver.rs (normalize path, probe filesystem)
//!     → matcher.rs (forbidden / private rules)
//!     → Return: RoutingDecision
//! ```
//!
//! # Design Decisions
//! - Rules are fixed at compile time, immutable at runtime
//! - No regex in hot path (prefix and suffix matching only)
//! - Deterministic: same input always yields the same decision
//! - First match wins, in a fixed order

pub mod matcher;
pub mod resolver;

pub use resolver::{classify, classify_with, FsProbe, PathKind, PathResolver, RoutingDecision, StdFsProbe};
