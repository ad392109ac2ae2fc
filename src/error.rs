//! Error types and fault translation.
//!
//! # Responsibilities
//! - Define the request pipeline error type
//! - Turn runtime faults into ERROR records and keep going
//! - Turn unhandled errors and panics into a CRITICAL record plus a JSON 500
//!
//! # Design Decisions
//! - File and line come from `#[track_caller]` at the construction site
//! - The trace is the error's `source()` chain, outermost first
//! - Policy rejections (403) are routing decisions, never errors

use std::any::Any;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::panic::{self, Location};
use std::sync::Once;

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::catch_panic::ResponseForPanic;

use crate::observability::StructuredLogger;

pub type RouterResult<T> = Result<T, RouterError>;

/// Source location captured where an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub file: &'static str,
    pub line: u32,
}

impl Site {
    #[track_caller]
    pub fn here() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RouterError {
    /// A header the pipeline depends on was not sent by the edge.
    #[error("required header '{name}' is missing")]
    MissingHeader { name: &'static str, site: Site },

    /// The constructed redirect target is not a valid URL.
    #[error("invalid redirect target '{target}'")]
    InvalidRedirect {
        target: String,
        #[source]
        source: url::ParseError,
        site: Site,
    },

    /// The script executor could not be reached or failed mid-response.
    #[error("script executor request failed")]
    Upstream {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        site: Site,
    },

    /// Building an HTTP message failed.
    #[error("failed to build http message")]
    Http {
        #[source]
        source: axum::http::Error,
        site: Site,
    },
}

impl RouterError {
    #[track_caller]
    pub fn missing_header(name: &'static str) -> Self {
        RouterError::MissingHeader {
            name,
            site: Site::here(),
        }
    }

    #[track_caller]
    pub fn invalid_redirect(target: impl Into<String>, source: url::ParseError) -> Self {
        RouterError::InvalidRedirect {
            target: target.into(),
            source,
            site: Site::here(),
        }
    }

    #[track_caller]
    pub fn upstream(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        RouterError::Upstream {
            source: source.into(),
            site: Site::here(),
        }
    }

    /// Stable machine-readable code for the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::MissingHeader { .. } => "configuration_missing",
            RouterError::InvalidRedirect { .. } => "invalid_redirect",
            RouterError::Upstream { .. } => "upstream_failed",
            RouterError::Http { .. } => "http_build_failed",
        }
    }

    pub fn site(&self) -> Site {
        match self {
            RouterError::MissingHeader { site, .. }
            | RouterError::InvalidRedirect { site, .. }
            | RouterError::Upstream { site, .. }
            | RouterError::Http { site, .. } => *site,
        }
    }
}

impl From<axum::http::Error> for RouterError {
    #[track_caller]
    fn from(source: axum::http::Error) -> Self {
        RouterError::Http {
            source,
            site: Site::here(),
        }
    }
}

/// Structured shape of a fault, logged and returned as the 500 body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultRecord {
    pub code: String,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub trace: Vec<String>,
}

impl FaultRecord {
    #[track_caller]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let site = Site::here();
        Self {
            code: code.into(),
            message: message.into(),
            file: site.file.to_string(),
            line: site.line,
            trace: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }
}

impl From<&RouterError> for FaultRecord {
    fn from(err: &RouterError) -> Self {
        let site = err.site();
        let mut trace = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push(cause.to_string());
            source = cause.source();
        }

        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            file: site.file.to_string(),
            line: site.line,
            trace,
        }
    }
}

/// Converts faults into log records and terminal responses.
#[derive(Debug, Clone, Default)]
pub struct ErrorTranslator {
    logger: StructuredLogger,
}

impl ErrorTranslator {
    pub fn new(logger: StructuredLogger) -> Self {
        Self { logger }
    }

    /// Same translator logging through a request-scoped logger.
    pub fn with_logger(&self, logger: StructuredLogger) -> Self {
        Self { logger }
    }

    /// Install the process panic hook that records where panics happen.
    ///
    /// Idempotent; the hook is installed once per process.
    pub fn install() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                let site = info.location().map(|l| (l.file().to_string(), l.line()));
                LAST_PANIC.with(|cell| *cell.borrow_mut() = site);
                previous(info);
            }));
        });
    }

    /// Non-fatal fault: log at ERROR and continue.
    pub fn runtime_fault(&self, fault: &FaultRecord) {
        self.logger.error("{error}", json!({ "error": fault }));
    }

    /// Fatal fault: log at CRITICAL and build the JSON 500 response.
    pub fn unhandled(&self, fault: &FaultRecord) -> Response<Body> {
        self.logger.critical("{exception}", json!({ "exception": fault }));

        let body = serde_json::to_string_pretty(fault).unwrap_or_else(|_| {
            json!({ "code": fault.code, "message": fault.message }).to_string()
        });

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }

    pub fn unhandled_error(&self, err: &RouterError) -> Response<Body> {
        self.unhandled(&FaultRecord::from(err))
    }

    /// Turn a caught panic payload into a fault record.
    pub fn panic_fault(payload: &(dyn Any + Send)) -> FaultRecord {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };

        let (file, line) = LAST_PANIC
            .with(|cell| cell.borrow_mut().take())
            .unwrap_or_else(|| ("<unknown>".to_string(), 0));

        FaultRecord {
            code: "panic".to_string(),
            message,
            file,
            line,
            trace: Vec::new(),
        }
    }
}

thread_local! {
    static LAST_PANIC: RefCell<Option<(String, u32)>> = const { RefCell::new(None) };
}

impl ResponseForPanic for ErrorTranslator {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let fault = Self::panic_fault(err.as_ref());
        self.unhandled(&fault)
    }
}
