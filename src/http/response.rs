//! Response construction.
//!
//! # Design Decisions
//! - Policy rejections are a bare 403 with no body
//! - Redirects carry only `Location`; the bucket serves the content
//! - Failed health checks answer with a plain-text 500 naming the check

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::error::RouterResult;

pub fn forbidden() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
}

pub fn found(location: &str) -> RouterResult<Response<Body>> {
    let response = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .body(Body::empty())?;
    Ok(response)
}

pub fn health_failed(message: impl Into<String>) -> Response<Body> {
    let mut response = Response::new(Body::from(message.into()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
