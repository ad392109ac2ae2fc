//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single dispatch handler
//! - Wire up middleware (request ID, tracing, timeout, panic catching)
//! - Build the dispatcher from configuration
//! - Serve until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::dispatch::{Dispatcher, ScriptRunner, UpstreamRunner};
use crate::error::ErrorTranslator;
use crate::health::HealthProbe;
use crate::observability::{LogLevel, StructuredLogger};
use crate::routing::{FsProbe, PathResolver, StdFsProbe};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a server with the filesystem probe and upstream script runner.
    pub fn new(config: RouterConfig) -> Self {
        let fs: Arc<dyn FsProbe> = Arc::new(StdFsProbe);
        let runner: Arc<dyn ScriptRunner> = Arc::new(UpstreamRunner::new(&config.entry.upstream));
        Self::with_components(config, fs, runner)
    }

    /// Create a server with explicit filesystem probe and script runner.
    pub fn with_components(
        config: RouterConfig,
        fs: Arc<dyn FsProbe>,
        runner: Arc<dyn ScriptRunner>,
    ) -> Self {
        ErrorTranslator::install();

        let logger = Self::logger_for(&config);
        let translator = ErrorTranslator::new(logger.clone());
        let resolver = PathResolver::new(Arc::new(config.root.clone()), fs);

        let mut dispatcher = Dispatcher::new(resolver, runner, translator.clone(), logger);
        if config.health_check.per_request {
            dispatcher =
                dispatcher.with_preflight(Arc::new(HealthProbe::from_config(&config.health_check)));
        }

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
        };
        let router = Self::build_router(&config, state, translator);
        Self { router, config }
    }

    fn logger_for(config: &RouterConfig) -> StructuredLogger {
        let level = config
            .observability
            .log_level
            .parse()
            .unwrap_or(LogLevel::Debug);
        StructuredLogger::new(level)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState, translator: ErrorTranslator) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(translator))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            app_root = %self.config.root.app_root.display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Single entry point: every path and method goes through the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.handle(request).await
}
