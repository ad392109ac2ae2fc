//! Static asset redirects.
//!
//! Static files are never read from local disk, which is ephemeral and
//! read-only in this environment. The client is sent to the bucket instead.

use std::path::{Component, Path};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::json;

use crate::config::RootConfig;
use crate::error::{RouterError, RouterResult};
use crate::http::{response, RequestInfo, X_FORWARDED_PROTO};
use crate::observability::StructuredLogger;

/// Characters escaped inside one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone)]
pub struct StaticDispatcher {
    config: Arc<RootConfig>,
}

impl StaticDispatcher {
    pub fn new(config: Arc<RootConfig>) -> Self {
        Self { config }
    }

    /// `localhost:9000/<bucket>` locally, `<bucket>.s3.amazonaws.com` otherwise.
    pub fn bucket_domain(&self) -> String {
        if self.config.is_local {
            format!("{}/{}", self.config.local_endpoint, self.config.bucket_name)
        } else {
            format!("{}.s3.amazonaws.com", self.config.bucket_name)
        }
    }

    /// URL path of `local_path` inside the bucket, with the app root removed.
    pub fn bucket_path(&self, local_path: &Path) -> String {
        let relative = local_path
            .strip_prefix(&self.config.app_root)
            .unwrap_or(local_path);

        let mut path = String::new();
        for component in relative.components() {
            if let Component::Normal(segment) = component {
                path.push('/');
                path.extend(utf8_percent_encode(&segment.to_string_lossy(), SEGMENT));
            }
        }
        path
    }

    pub fn bucket_url(&self, local_path: &Path, request: &RequestInfo) -> RouterResult<String> {
        let proto = request
            .forwarded_proto()
            .ok_or_else(|| RouterError::missing_header(X_FORWARDED_PROTO))?;

        let url = format!(
            "{}://{}{}",
            proto,
            self.bucket_domain(),
            self.bucket_path(local_path)
        );
        url::Url::parse(&url).map_err(|e| RouterError::invalid_redirect(url.clone(), e))?;
        Ok(url)
    }

    /// Log the target and answer 302 with `Location`.
    pub fn redirect(
        &self,
        local_path: &Path,
        request: &RequestInfo,
        logger: &StructuredLogger,
    ) -> RouterResult<Response<Body>> {
        let bucket_url = self.bucket_url(local_path, request)?;
        logger.info("Serving: {bucket_url}", json!({ "bucket_url": bucket_url }));
        response::found(&bucket_url)
    }
}
