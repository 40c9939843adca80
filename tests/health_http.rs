// tests/health_http.rs
//
// Liveness router exercised in-process via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt as _; // for `oneshot`

const BODY_LIMIT: usize = 64 * 1024;

async fn get_body(uri: &str) -> (StatusCode, String) {
    let app = outage_relay::router(None);
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn root_returns_ok() {
    let (status, body) = get_body("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, body) = get_body("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn metrics_route_absent_without_recorder() {
    let (status, _) = get_body("/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
