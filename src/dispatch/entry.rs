//! CMS hand-off.
//!
//! # Responsibilities
//! - Describe which script should handle a request (`ScriptTarget`)
//! - Forward the request to the script executor with CGI-style parameters
//!
//! # Design Decisions
//! - The executor is an HTTP upstream; script parameters travel as headers
//! - The response is streamed back untouched
//! - Executor failures surface as `RouterError::Upstream` (JSON 500)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::RootConfig;
use crate::error::{RouterError, RouterResult};

pub const X_SCRIPT_FILENAME: &str = "x-script-filename";
pub const X_SCRIPT_NAME: &str = "x-script-name";
pub const X_DOCUMENT_ROOT: &str = "x-document-root";
pub const X_VENDOR_ROOT: &str = "x-vendor-root";

/// The script chosen to handle a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTarget {
    /// Absolute path of the script.
    pub filename: PathBuf,
    /// Script path relative to the document root, with a leading slash.
    pub name: String,
    pub document_root: PathBuf,
    pub vendor_root: PathBuf,
}

impl ScriptTarget {
    pub fn new(filename: PathBuf, root: &RootConfig) -> Self {
        let name = match filename.strip_prefix(&root.app_root) {
            Ok(relative) => format!("/{}", relative.display()),
            Err(_) => filename.display().to_string(),
        };
        Self {
            filename,
            name,
            document_root: root.app_root.clone(),
            vendor_root: root.vendor_root.clone(),
        }
    }

    fn params(&self) -> [(&'static str, String); 4] {
        [
            (X_SCRIPT_FILENAME, path_str(&self.filename)),
            (X_SCRIPT_NAME, self.name.clone()),
            (X_DOCUMENT_ROOT, path_str(&self.document_root)),
            (X_VENDOR_ROOT, path_str(&self.vendor_root)),
        ]
    }
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

/// Terminal handler for requests that resolve to a script.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, target: &ScriptTarget, request: Request<Body>) -> RouterResult<Response<Body>>;
}

/// Forwards script requests to an HTTP script executor.
#[derive(Clone)]
pub struct UpstreamRunner {
    upstream: String,
    client: Client<HttpConnector, Body>,
}

impl UpstreamRunner {
    pub fn new(upstream: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            upstream: upstream.into(),
            client,
        }
    }
}

#[async_trait]
impl ScriptRunner for UpstreamRunner {
    async fn run(&self, target: &ScriptTarget, request: Request<Body>) -> RouterResult<Response<Body>> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri: Uri = format!("http://{}{}", self.upstream, path_and_query)
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| RouterError::upstream(e))?;
        parts.uri = uri;

        for (name, value) in target.params() {
            let value = HeaderValue::from_bytes(value.as_bytes()).map_err(axum::http::Error::from)?;
            parts.headers.insert(HeaderName::from_static(name), value);
        }

        let request = Request::from_parts(parts, body);
        let response: Response<Incoming> = self
            .client
            .request(request)
            .await
            .map_err(|e| RouterError::upstream(e))?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
