//! End-to-end routing through the HTTP stack.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use common::{app_root, test_config, PanickingRunner, RecordingRunner};
use wp_router::config::RouterConfig;
use wp_router::dispatch::ScriptRunner;
use wp_router::routing::StdFsProbe;
use wp_router::HttpServer;

fn router_with(config: RouterConfig, runner: Arc<dyn ScriptRunner>) -> Router {
    let fs = Arc::new(StdFsProbe::default());
    HttpServer::with_components(config, fs, runner).router()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-proto", "https")
        .header("x-forwarded-host", "blog.example.org")
        .header(header::HOST, "lambda.internal")
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_plugin_script_is_forbidden() {
    let root = app_root();
    let runner = RecordingRunner::default();
    let app = router_with(test_config(root.path()), Arc::new(runner.clone()));

    let response = app
        .oneshot(get("/wp-content/plugins/shop/shop.php"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_string(response).await.is_empty());
    assert!(runner.targets().is_empty());
}

#[tokio::test]
async fn test_private_file_is_blocked() {
    let root = app_root();
    let app = router_with(test_config(root.path()), Arc::new(RecordingRunner::default()));

    let response = app.oneshot(get("/composer.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_escape_above_root_is_forbidden() {
    let root = app_root();
    let app = router_with(test_config(root.path()), Arc::new(RecordingRunner::default()));

    let response = app.oneshot(get("/%2e%2e/%2e%2e/etc/passwd")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_existing_asset_redirects_to_bucket() {
    let root = app_root();
    let runner = RecordingRunner::default();
    let app = router_with(test_config(root.path()), Arc::new(runner.clone()));

    let response = app.oneshot(get("/logo.png?ver=6.4")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://assets.s3.amazonaws.com/logo.png"
    );
    assert!(runner.targets().is_empty());
}

#[tokio::test]
async fn test_pending_upload_redirects_to_bucket() {
    let root = app_root();
    let mut config = test_config(root.path());
    config.root.is_local = true;
    let app = router_with(config, Arc::new(RecordingRunner::default()));

    let response = app
        .oneshot(get("/wp-content/uploads/2024/new.jpg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://localhost:9000/assets/wp-content/uploads/2024/new.jpg"
    );
}

#[tokio::test]
async fn test_directory_runs_its_index() {
    let root = app_root();
    let runner = RecordingRunner::default();
    let app = router_with(test_config(root.path()), Arc::new(runner.clone()));

    let response = app.oneshot(get("/about/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "/about/index.php");

    let targets = runner.targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].filename, root.path().join("about").join("index.php"));
    assert_eq!(targets[0].document_root, root.path());
}

#[tokio::test]
async fn test_existing_script_runs_directly() {
    let root = app_root();
    let runner = RecordingRunner::default();
    let app = router_with(test_config(root.path()), Arc::new(runner.clone()));

    let response = app.oneshot(get("/wp-login.php?action=lostpassword")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(runner.targets()[0].name, "/wp-login.php");
}

#[tokio::test]
async fn test_permalink_falls_back_to_front_controller() {
    let root = app_root();
    let runner = RecordingRunner::default();
    let app = router_with(test_config(root.path()), Arc::new(runner.clone()));

    let response = app.oneshot(get("/2024/05/hello-world")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(runner.targets()[0].filename, root.path().join("index.php"));
    assert_eq!(runner.hosts(), vec![Some("blog.example.org".to_string())]);
}

#[tokio::test]
async fn test_missing_proto_on_asset_is_json_500() {
    let root = app_root();
    let app = router_with(test_config(root.path()), Arc::new(RecordingRunner::default()));

    let request = Request::builder()
        .uri("/logo.png")
        .header(header::HOST, "blog.example.org")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["code"], "configuration_missing");
    assert_eq!(body["message"], "required header 'x-forwarded-proto' is missing");
    assert!(body["file"].as_str().unwrap().ends_with("statics.rs"));
    assert!(body["line"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_panic_becomes_json_500() {
    let root = app_root();
    let app = router_with(test_config(root.path()), Arc::new(PanickingRunner));

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["code"], "panic");
    assert_eq!(body["message"], "script runner exploded");
    assert!(body["file"].as_str().unwrap().ends_with("mod.rs"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let root = app_root();
    let app = router_with(test_config(root.path()), Arc::new(RecordingRunner::default()));

    let mut request = get("/logo.png");
    request
        .headers_mut()
        .insert("x-request-id", "req-42".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
}

#[tokio::test]
async fn test_preflight_failure_is_plain_500() {
    let root = app_root();
    let mut config = test_config(root.path());
    config.health_check.per_request = true;
    config.health_check.database_enabled = false;
    config.health_check.network_enabled = false;
    let runner = RecordingRunner::default();
    let app = router_with(config, Arc::new(runner.clone()));

    let request = Request::builder()
        .uri("/")
        .header(header::HOST, "blog.example.org")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Headers: FAILED");
    assert!(runner.targets().is_empty());

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(runner.targets().len(), 1);
}
