//! Shared helpers for HTTP-level tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use trafo_server::{api, config::Config, ingest::ReadingStore};

pub const BOUNDARY: &str = "trafo-test-boundary";
pub const USER: &str = "operator-7";

pub const HEADER: &str = "Datetime,Voltage R,Voltage S,Voltage T,Ampere R,Ampere S,Ampere T,Cosphi";

/// Header followed by the given data lines
pub fn csv(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

pub fn create_test_app(store: Arc<dyn ReadingStore>) -> Router {
    api::create_router(store, &Config::default())
}

/// Encode one file part as `multipart/form-data`
pub fn multipart_body(field: &str, filename: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };

    (status, json)
}

pub fn upload_request(uri: &str, user: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn upload(app: &Router, trafo_id: i64, capacity: f64, content: &str) -> (StatusCode, Value) {
    let uri = format!("/api/v1/readings/upload?trafo_id={trafo_id}&capacity={capacity}");
    let body = multipart_body("file", "readings.csv", content);
    send(app, upload_request(&uri, Some(USER), body)).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}
