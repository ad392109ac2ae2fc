//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use wp_router::config::RouterConfig;
use wp_router::dispatch::{ScriptRunner, ScriptTarget};
use wp_router::error::RouterResult;

/// Start a backend that answers 200 with the raw request head as its body.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    head.len(),
                    head
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that always answers with `status`.
pub async fn start_status_backend(status: u16) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_head(&mut socket).await;
                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// A WordPress-shaped tree under a temporary directory.
pub fn app_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    for sub in ["about", "wp-admin", "wp-content/uploads", "wp-content/plugins/shop"] {
        std::fs::create_dir_all(root.join(sub)).unwrap();
    }
    for file in [
        "index.php",
        "wp-login.php",
        "logo.png",
        "composer.json",
        "wp-admin/index.php",
        "wp-content/uploads/a.png",
        "wp-content/plugins/shop/shop.php",
    ] {
        std::fs::write(root.join(file), b"").unwrap();
    }

    dir
}

pub fn test_config(app_root: &Path) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.root.app_root = app_root.to_path_buf();
    config.root.bucket_name = "assets".into();
    config.health_check.startup = false;
    config.health_check.per_request = false;
    config
}

/// Script runner that records targets and answers 200 with the script name.
#[derive(Default, Clone)]
pub struct RecordingRunner {
    pub calls: Arc<Mutex<Vec<(ScriptTarget, Option<String>)>>>,
}

impl RecordingRunner {
    pub fn targets(&self) -> Vec<ScriptTarget> {
        self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn hosts(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|(_, h)| h.clone()).collect()
    }
}

#[async_trait]
impl ScriptRunner for RecordingRunner {
    async fn run(&self, target: &ScriptTarget, request: Request<Body>) -> RouterResult<Response<Body>> {
        let host = request
            .headers()
            .get("host")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.calls.lock().unwrap().push((target.clone(), host));
        Ok(Response::new(Body::from(target.name.clone())))
    }
}

/// Script runner that panics.
pub struct PanickingRunner;

#[async_trait]
impl ScriptRunner for PanickingRunner {
    async fn run(&self, _target: &ScriptTarget, _request: Request<Body>) -> RouterResult<Response<Body>> {
        panic!("script runner exploded");
    }
}
