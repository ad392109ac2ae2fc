//! Request path classification.
//!
//! # Responsibilities
//! - Normalize the request path and keep it inside the app root
//! - Apply the forbidden and private rules
//! - Resolve directories, existing files, pending uploads and the front controller
//!
//! # Design Decisions
//! - Classification is a pure function of (uri, RootConfig, FsProbe)
//! - Path escapes above the root are rejected like forbidden scripts
//! - Filesystem access goes through `FsProbe` so tests need no real tree
//! - Stat failures are reported through a translator on the request-scoped
//!   logger, so fault records carry the request id

use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde_json::json;

use crate::config::RootConfig;
use crate::error::{ErrorTranslator, FaultRecord};
use crate::http::RequestInfo;
use crate::observability::StructuredLogger;
use crate::routing::matcher::{forbidden_rule, private_rule, PathRule};

/// Front-controller script name.
pub const INDEX_SCRIPT: &str = "index.php";

/// What a resolved local path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    DirectoryIndex,
    ExistingFile,
    /// Looks like a file but is not on disk (yet).
    PendingFile,
    AppEntry,
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Forbidden,
    PrivateBlocked,
    LocalPath { path: PathBuf, kind: PathKind },
}

impl RoutingDecision {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RoutingDecision::Forbidden => "forbidden",
            RoutingDecision::PrivateBlocked => "private",
            RoutingDecision::LocalPath { kind, .. } => match kind {
                PathKind::DirectoryIndex => "directory_index",
                PathKind::ExistingFile => "existing_file",
                PathKind::PendingFile => "pending_file",
                PathKind::AppEntry => "app_entry",
            },
        }
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingDecision::LocalPath { path, .. } => {
                write!(f, "{} {}", self.label(), path.display())
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// Filesystem existence checks used during classification.
///
/// `Ok(false)` means nothing is there. `Err` is any other stat failure; the
/// classifier reports it as a runtime fault and treats the path as absent.
pub trait FsProbe: Send + Sync {
    fn is_dir(&self, path: &Path) -> io::Result<bool>;
    fn is_file(&self, path: &Path) -> io::Result<bool>;
}

/// `FsProbe` backed by `std::fs::metadata`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFsProbe;

impl StdFsProbe {
    fn probe(path: &Path, test: fn(&std::fs::Metadata) -> bool) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(test(&meta)),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl FsProbe for StdFsProbe {
    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Self::probe(path, std::fs::Metadata::is_dir)
    }

    fn is_file(&self, path: &Path) -> io::Result<bool> {
        Self::probe(path, std::fs::Metadata::is_file)
    }
}

#[track_caller]
fn present(outcome: io::Result<bool>, op: &str, path: &Path, translator: &ErrorTranslator) -> bool {
    match outcome {
        Ok(found) => found,
        Err(e) => {
            let fault = FaultRecord::new("fs_probe", format!("{op}({}): {e}", path.display()));
            translator.runtime_fault(&fault);
            false
        }
    }
}

/// Percent-decode and normalize the path component of `uri`.
///
/// Returns the path without trailing slash (`""` for the root), or `None`
/// when the path climbs above the root or is not valid text.
pub fn normalize_url_path(uri: &str) -> Option<String> {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    let decoded = percent_decode_str(&uri[..end]).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        Some(String::new())
    } else {
        Some(format!("/{}", segments.join("/")))
    }
}

/// Classify `uri` against the app root.
pub fn classify(uri: &str, config: &RootConfig, probe: &dyn FsProbe) -> RoutingDecision {
    classify_with(uri, config, probe, &ErrorTranslator::default())
}

/// `classify`, reporting probe failures through `translator`.
pub fn classify_with(
    uri: &str,
    config: &RootConfig,
    probe: &dyn FsProbe,
    translator: &ErrorTranslator,
) -> RoutingDecision {
    let Some(url_path) = normalize_url_path(uri) else {
        return RoutingDecision::Forbidden;
    };

    if forbidden_rule().matches(&url_path) {
        return RoutingDecision::Forbidden;
    }
    if private_rule().matches(&url_path) {
        return RoutingDecision::PrivateBlocked;
    }

    let mut local_path = config.app_root.clone();
    local_path.extend(url_path.split('/').filter(|s| !s.is_empty()));

    if present(probe.is_dir(&local_path), "is_dir", &local_path, translator) {
        return RoutingDecision::LocalPath {
            path: local_path.join(INDEX_SCRIPT),
            kind: PathKind::DirectoryIndex,
        };
    }

    if present(probe.is_file(&local_path), "is_file", &local_path, translator) {
        return RoutingDecision::LocalPath {
            path: local_path,
            kind: PathKind::ExistingFile,
        };
    }

    let looks_like_file = url_path
        .rsplit('/')
        .next()
        .is_some_and(|name| name.contains('.'));
    if looks_like_file {
        return RoutingDecision::LocalPath {
            path: local_path,
            kind: PathKind::PendingFile,
        };
    }

    RoutingDecision::LocalPath {
        path: config.app_root.join(INDEX_SCRIPT),
        kind: PathKind::AppEntry,
    }
}

/// Resolves requests to routing decisions.
#[derive(Clone)]
pub struct PathResolver {
    config: Arc<RootConfig>,
    probe: Arc<dyn FsProbe>,
}

impl PathResolver {
    pub fn new(config: Arc<RootConfig>, probe: Arc<dyn FsProbe>) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    pub fn resolve(&self, request: &RequestInfo, logger: &StructuredLogger) -> RoutingDecision {
        logger.info(
            "Request: {method} {uri}",
            json!({ "method": request.method().as_str(), "uri": request.uri() }),
        );

        let translator = ErrorTranslator::new(logger.clone());
        let decision = classify_with(request.uri(), &self.config, self.probe.as_ref(), &translator);

        logger.debug(
            "Resolved: {decision}",
            json!({ "decision": decision.to_string() }),
        );
        decision
    }
}
