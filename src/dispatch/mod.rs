//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! Request
//!     → [preflight health checks] (optional, per request)
//!     → PathResolver (RoutingDecision)
//!     → plan():
//!         Forbidden / PrivateBlocked  → 403
//!         LocalPath, not a script     → statics.rs (302 to bucket)
//!         LocalPath, script           → entry.rs (ScriptRunner)
//!     → RouterError escaping          → ErrorTranslator (JSON 500)
//! ```

pub mod entry;
pub mod statics;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ErrorTranslator, RouterResult};
use crate::health::HealthProbe;
use crate::http::{response, RequestInfo};
use crate::observability::{metrics, StructuredLogger};
use crate::routing::{PathResolver, RoutingDecision};

pub use entry::{ScriptRunner, ScriptTarget, UpstreamRunner};
pub use statics::StaticDispatcher;

/// Extension of files executed by the script runner.
pub const SCRIPT_EXTENSION: &str = ".php";

/// What to do with a routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Reject,
    Redirect(PathBuf),
    Script(PathBuf),
}

/// Map a decision to an action. Anything that is not a script goes to the bucket.
pub fn plan(decision: &RoutingDecision) -> Dispatch {
    match decision {
        RoutingDecision::Forbidden | RoutingDecision::PrivateBlocked => Dispatch::Reject,
        RoutingDecision::LocalPath { path, .. } => {
            let is_script = path
                .to_str()
                .is_some_and(|p| p.ends_with(SCRIPT_EXTENSION));
            if is_script {
                Dispatch::Script(path.clone())
            } else {
                Dispatch::Redirect(path.clone())
            }
        }
    }
}

/// Orchestrates one request from classification to response.
pub struct Dispatcher {
    resolver: PathResolver,
    statics: StaticDispatcher,
    runner: Arc<dyn ScriptRunner>,
    preflight: Option<Arc<HealthProbe>>,
    translator: ErrorTranslator,
    logger: StructuredLogger,
}

impl Dispatcher {
    pub fn new(
        resolver: PathResolver,
        runner: Arc<dyn ScriptRunner>,
        translator: ErrorTranslator,
        logger: StructuredLogger,
    ) -> Self {
        let statics = StaticDispatcher::new(Arc::new(resolver.config().clone()));
        Self {
            resolver,
            statics,
            runner,
            preflight: None,
            translator,
            logger,
        }
    }

    /// Run the probe's request checks before every dispatch.
    pub fn with_preflight(mut self, probe: Arc<HealthProbe>) -> Self {
        self.preflight = Some(probe);
        self
    }

    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let (parts, body) = request.into_parts();
        let info = RequestInfo::from_parts(&parts);

        let request_id = info
            .request_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let logger = self.logger.for_request(request_id);

        let response = match self.run_preflight(&info, &logger).await {
            Some(failed) => failed,
            None => match self.dispatch(&info, Request::from_parts(parts, body), &logger).await {
                Ok(response) => response,
                Err(e) => self.translator.with_logger(logger).unhandled_error(&e),
            },
        };

        metrics::record_request(info.method().as_str(), response.status().as_u16(), start);
        response
    }

    async fn run_preflight(&self, info: &RequestInfo, logger: &StructuredLogger) -> Option<Response<Body>> {
        let probe = self.preflight.as_ref()?;
        match probe.preflight(info, logger).await {
            Ok(_) => None,
            Err(e) => Some(response::health_failed(e.result().message())),
        }
    }

    async fn dispatch(
        &self,
        info: &RequestInfo,
        mut request: Request<Body>,
        logger: &StructuredLogger,
    ) -> RouterResult<Response<Body>> {
        let decision = self.resolver.resolve(info, logger);
        metrics::record_decision(decision.label());

        match plan(&decision) {
            Dispatch::Reject => {
                logger.notice(
                    "Rejected: {uri} ({decision})",
                    json!({ "uri": info.uri(), "decision": decision.label() }),
                );
                Ok(response::forbidden())
            }
            Dispatch::Redirect(path) => self.statics.redirect(&path, info, logger),
            Dispatch::Script(path) => {
                // The executor sees the client-facing host, not the adapter's.
                if let Some(host) = info.host() {
                    let value = HeaderValue::from_str(host).map_err(axum::http::Error::from)?;
                    request.headers_mut().insert(header::HOST, value);
                }
                let target = ScriptTarget::new(path, self.resolver.config());
                self.runner.run(&target, request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::PathKind;

    fn local(path: &str, kind: PathKind) -> RoutingDecision {
        RoutingDecision::LocalPath {
            path: PathBuf::from(path),
            kind,
        }
    }

    #[test]
    fn test_plan() {
        assert_eq!(plan(&RoutingDecision::Forbidden), Dispatch::Reject);
        assert_eq!(plan(&RoutingDecision::PrivateBlocked), Dispatch::Reject);
        assert_eq!(
            plan(&local("/mnt/wordpress/about/index.php", PathKind::DirectoryIndex)),
            Dispatch::Script(PathBuf::from("/mnt/wordpress/about/index.php"))
        );
        assert_eq!(
            plan(&local("/mnt/wordpress/logo.png", PathKind::ExistingFile)),
            Dispatch::Redirect(PathBuf::from("/mnt/wordpress/logo.png"))
        );
        assert_eq!(
            plan(&local("/mnt/wordpress/wp-login.php", PathKind::ExistingFile)),
            Dispatch::Script(PathBuf::from("/mnt/wordpress/wp-login.php"))
        );
        assert_eq!(
            plan(&local("/mnt/wordpress/new.jpg", PathKind::PendingFile)),
            Dispatch::Redirect(PathBuf::from("/mnt/wordpress/new.jpg"))
        );
        assert_eq!(
            plan(&local("/mnt/wordpress/index.php", PathKind::AppEntry)),
            Dispatch::Script(PathBuf::from("/mnt/wordpress/index.php"))
        );
    }
}
