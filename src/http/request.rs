//! Request handling.
//!
//! # Responsibilities
//! - Extract routing-relevant information (method, raw URI, forwarded headers)
//! - Carry the request ID assigned by the middleware stack
//!
//! # Design Decisions
//! - `RequestInfo` is an immutable snapshot; the incoming request is kept
//!   intact for the hand-off to the script executor
//! - Header lookups are case-insensitive (HeaderMap semantics)

use axum::http::{request::Parts, HeaderMap, Method};

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Routing view of an incoming request.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    method: Method,
    uri: String,
    headers: HeaderMap,
    forwarded_host: Option<String>,
    forwarded_proto: Option<String>,
    request_id: Option<String>,
}

impl RequestInfo {
    pub fn new(method: Method, uri: impl Into<String>, headers: HeaderMap) -> Self {
        let forwarded_host = header_str(&headers, X_FORWARDED_HOST);
        let forwarded_proto = header_str(&headers, X_FORWARDED_PROTO);
        let request_id = header_str(&headers, X_REQUEST_ID);

        Self {
            method,
            uri: uri.into(),
            headers,
            forwarded_host,
            forwarded_proto,
            request_id,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Self::new(parts.method.clone(), uri, parts.headers.clone())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw path and query as received.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn forwarded_proto(&self) -> Option<&str> {
        self.forwarded_proto.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Client-facing host: the forwarded host, else the `Host` header.
    pub fn host(&self) -> Option<&str> {
        self.forwarded_host
            .as_deref()
            .or_else(|| self.headers.get(axum::http::header::HOST)?.to_str().ok())
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_from_parts_keeps_query() {
        let (parts, _) = Request::builder()
            .method("POST")
            .uri("http://example.com/wp-admin/admin-ajax.php?action=x")
            .header("X-Forwarded-Proto", "https")
            .body(())
            .unwrap()
            .into_parts();
        let info = RequestInfo::from_parts(&parts);

        assert_eq!(info.method(), &Method::POST);
        assert_eq!(info.uri(), "/wp-admin/admin-ajax.php?action=x");
        assert_eq!(info.forwarded_proto(), Some("https"));
    }

    #[test]
    fn test_host_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert("host", "internal:8080".parse().unwrap());
        let info = RequestInfo::new(Method::GET, "/", headers.clone());
        assert_eq!(info.host(), Some("internal:8080"));

        headers.insert("x-forwarded-host", "blog.example.com".parse().unwrap());
        let info = RequestInfo::new(Method::GET, "/", headers);
        assert_eq!(info.host(), Some("blog.example.com"));
    }

    #[test]
    fn test_empty_forwarded_proto_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", "".parse().unwrap());
        let info = RequestInfo::new(Method::GET, "/", headers);
        assert_eq!(info.forwarded_proto(), None);
    }
}
