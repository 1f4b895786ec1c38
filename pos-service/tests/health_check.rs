mod common;

use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.expect("Invalid health JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pos-service");

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = TestApp::spawn().await;

    // Generate at least one request so the counters exist.
    app.get("/health").await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status().as_u16(), 200);

    app.cleanup().await;
}
