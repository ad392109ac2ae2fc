//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (text or JSON, stderr)
//! - Provide a leveled logger with `{placeholder}` templates and JSON context
//! - Scope a logger clone to a single request
//!
//! # Design Decisions
//! - Uses tracing crate as the backend; the logger only shapes records
//! - Eight severities mapped onto tracing levels through one fixed table,
//!   the exact severity travels in the `severity` field
//! - Non-text messages are logged whole under the `context` key

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl LogLevel {
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Notice,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
        LogLevel::Alert,
        LogLevel::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Notice => "NOTICE",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Alert => "ALERT",
            LogLevel::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level '{}'", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

/// Message passed to the logger: a template or an arbitrary value.
#[derive(Debug, Clone, PartialEq)]
pub enum LogMessage {
    Text(String),
    Value(Value),
}

impl From<&str> for LogMessage {
    fn from(s: &str) -> Self {
        LogMessage::Text(s.to_string())
    }
}

impl From<String> for LogMessage {
    fn from(s: String) -> Self {
        LogMessage::Text(s)
    }
}

impl From<Value> for LogMessage {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => LogMessage::Text(s),
            other => LogMessage::Value(other),
        }
    }
}

/// A single structured log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: Map<String, Value>,
}

impl LogRecord {
    /// Build a record, wrapping non-text messages under the `context` key.
    pub fn new(level: LogLevel, message: impl Into<LogMessage>, context: Value) -> Self {
        let context = match context {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("context".to_string(), other);
                map
            }
        };

        match message.into() {
            LogMessage::Text(message) => Self { level, message, context },
            LogMessage::Value(value) => {
                let mut wrapped = Map::new();
                wrapped.insert("context".to_string(), value);
                Self {
                    level,
                    message: "{context}".to_string(),
                    context: wrapped,
                }
            }
        }
    }

    /// Message with placeholders substituted from the context.
    pub fn render(&self) -> String {
        interpolate(&self.message, &self.context)
    }
}

/// Replace `{name}` placeholders with context values.
///
/// Strings are inserted verbatim, everything else as compact JSON.
/// Placeholders without a matching key are kept as written.
pub fn interpolate(template: &str, context: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        let valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

        match context.get(key) {
            Some(value) if valid_key => match value {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            },
            _ => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Leveled logger handed explicitly to every component that logs.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    min_level: LogLevel,
    request_id: Option<String>,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl StructuredLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level,
            request_id: None,
        }
    }

    /// Clone of this logger tagged with a request id.
    pub fn for_request(&self, request_id: impl Into<String>) -> Self {
        Self {
            min_level: self.min_level,
            request_id: Some(request_id.into()),
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, message: impl Into<LogMessage>, context: Value) {
        if !self.enabled(level) {
            return;
        }
        self.emit(&LogRecord::new(level, message, context));
    }

    pub fn emit(&self, record: &LogRecord) {
        let message = record.render();
        let context = Value::Object(record.context.clone());
        let request_id = self.request_id.as_deref().unwrap_or("-");
        let severity = record.level.as_str();

        match record.level {
            LogLevel::Debug => {
                tracing::debug!(severity, request_id, context = %context, "{}", message)
            }
            LogLevel::Info | LogLevel::Notice => {
                tracing::info!(severity, request_id, context = %context, "{}", message)
            }
            LogLevel::Warning => {
                tracing::warn!(severity, request_id, context = %context, "{}", message)
            }
            LogLevel::Error | LogLevel::Critical | LogLevel::Alert | LogLevel::Emergency => {
                tracing::error!(severity, request_id, context = %context, "{}", message)
            }
        }
    }

    pub fn debug(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Debug, message, context);
    }

    pub fn info(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Info, message, context);
    }

    pub fn notice(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Notice, message, context);
    }

    pub fn warning(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Warning, message, context);
    }

    pub fn error(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Error, message, context);
    }

    pub fn critical(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Critical, message, context);
    }

    pub fn alert(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Alert, message, context);
    }

    pub fn emergency(&self, message: impl Into<LogMessage>, context: Value) {
        self.log(LogLevel::Emergency, message, context);
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &ObservabilityConfig) {
    let level = config.log_level.parse().unwrap_or(LogLevel::Debug);
    let directive = match level {
        LogLevel::Debug => "debug",
        LogLevel::Info | LogLevel::Notice => "info",
        LogLevel::Warning => "warn",
        _ => "error",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("wp_router={directive},tower_http=info").into());

    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_levels_are_ordered() {
        for pair in LogLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(LogLevel::ALL.len(), 8);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("critical".parse::<LogLevel>(), Ok(LogLevel::Critical));
        assert_eq!("NOTICE".parse::<LogLevel>(), Ok(LogLevel::Notice));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_interpolate() {
        let record = LogRecord::new(
            LogLevel::Info,
            "Request: {method} {uri}",
            json!({ "method": "GET", "uri": "/about?x=1" }),
        );
        assert_eq!(record.render(), "Request: GET /about?x=1");
    }

    #[test]
    fn test_interpolate_non_string_and_missing() {
        let ctx = json!({ "n": 3, "flag": true });
        let Value::Object(map) = ctx else { unreachable!() };
        assert_eq!(interpolate("{n} {flag} {missing}", &map), "3 true {missing}");
        assert_eq!(interpolate("open { brace", &map), "open { brace");
    }

    #[test]
    fn test_non_text_message_is_wrapped() {
        let record = LogRecord::new(LogLevel::Debug, json!({ "a": [1, 2] }), Value::Null);
        assert_eq!(record.message, "{context}");
        assert_eq!(record.context.get("context"), Some(&json!({ "a": [1, 2] })));
        assert_eq!(record.render(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_string_value_stays_text() {
        let record = LogRecord::new(LogLevel::Info, json!("plain"), Value::Null);
        assert_eq!(record.message, "plain");
        assert!(record.context.is_empty());
    }

    #[test]
    fn test_min_level_filter() {
        let logger = StructuredLogger::new(LogLevel::Warning);
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Warning));
        assert!(logger.enabled(LogLevel::Emergency));
    }

    #[test]
    fn test_for_request_keeps_level() {
        let logger = StructuredLogger::new(LogLevel::Notice).for_request("abc");
        assert_eq!(logger.request_id(), Some("abc"));
        assert_eq!(logger.min_level(), LogLevel::Notice);
    }
}
