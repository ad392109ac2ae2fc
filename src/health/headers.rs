//! Forwarded header presence check.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::health::probe::{CheckKind, HealthCheck, HealthResult};
use crate::http::RequestInfo;
use crate::observability::StructuredLogger;

/// Verifies the edge sent a protocol and a host.
///
/// Only presence is checked. Static redirects are built from the forwarded
/// protocol, so a request without it cannot be served.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadersCheck;

#[async_trait]
impl HealthCheck for HeadersCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Headers
    }

    async fn check(&self, request: Option<&RequestInfo>, logger: &StructuredLogger) -> HealthResult {
        let Some(request) = request else {
            return HealthResult::fail(CheckKind::Headers, json!({ "error": "no request" }));
        };

        let headers: Map<String, Value> = request
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), Value::String(value))
            })
            .collect();
        logger.debug("Server: {server}", json!({ "server": headers }));

        let protocol = request.forwarded_proto().is_some();
        let host = request.host().is_some();

        if protocol && host {
            HealthResult::pass(CheckKind::Headers)
        } else {
            HealthResult::fail(
                CheckKind::Headers,
                json!({
                    "protocol": if protocol { "OK" } else { "MISS" },
                    "host": if host { "OK" } else { "MISS" },
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method};

    fn request(pairs: &[(&'static str, &'static str)]) -> RequestInfo {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.insert(*k, v.parse().unwrap());
        }
        RequestInfo::new(Method::GET, "/", headers)
    }

    #[tokio::test]
    async fn test_both_present() {
        let logger = StructuredLogger::default();
        let req = request(&[("x-forwarded-proto", "https"), ("host", "a.example")]);
        assert!(HeadersCheck.check(Some(&req), &logger).await.ok);

        let req = request(&[("x-forwarded-proto", "http"), ("x-forwarded-host", "b.example")]);
        assert!(HeadersCheck.check(Some(&req), &logger).await.ok);
    }

    #[tokio::test]
    async fn test_missing_protocol() {
        let logger = StructuredLogger::default();
        let req = request(&[("host", "a.example")]);
        let result = HeadersCheck.check(Some(&req), &logger).await;
        assert!(!result.ok);
        assert_eq!(result.detail["protocol"], "MISS");
        assert_eq!(result.detail["host"], "OK");
    }

    #[tokio::test]
    async fn test_without_request_fails() {
        let result = HeadersCheck.check(None, &StructuredLogger::default()).await;
        assert!(!result.ok);
    }
}
