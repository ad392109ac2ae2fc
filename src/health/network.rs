//! Outbound network reachability check.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::health::probe::{CheckKind, HealthCheck, HealthResult};
use crate::http::RequestInfo;
use crate::observability::StructuredLogger;

/// Bounded GET against a known external endpoint.
///
/// Any response outside 4xx/5xx counts as reachable.
#[derive(Debug, Clone)]
pub struct NetworkCheck {
    url: String,
    timeout: Duration,
}

impl NetworkCheck {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl HealthCheck for NetworkCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Network
    }

    async fn check(&self, _request: Option<&RequestInfo>, _logger: &StructuredLogger) -> HealthResult {
        let client = match reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                return HealthResult::fail(CheckKind::Network, json!({ "error": e.to_string() }))
            }
        };

        match client.get(&self.url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    HealthResult::fail(
                        CheckKind::Network,
                        json!({ "url": self.url, "status": status.as_u16() }),
                    )
                } else {
                    HealthResult::pass(CheckKind::Network)
                }
            }
            Err(e) => HealthResult::fail(
                CheckKind::Network,
                json!({
                    "url": self.url,
                    "error": e.to_string(),
                    "timeout": e.is_timeout(),
                }),
            ),
        }
    }
}
