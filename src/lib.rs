//! Request router for a WordPress site on a function-as-a-service platform.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use dispatch::Dispatcher;
pub use error::{ErrorTranslator, RouterError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
