//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Platform HTTP front end
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (RequestInfo: method, uri, forwarded headers)
//!     → dispatch (routing decision, redirect or script hand-off)
//!     → response.rs (403, 302, health failure)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestInfo, X_FORWARDED_HOST, X_FORWARDED_PROTO, X_REQUEST_ID};
pub use server::HttpServer;
