//! Tests for health check endpoints.
//!
//! These tests verify the health endpoints return correct status and structure.

use axum::http::StatusCode;
use integration_tests::setup::TestContext;

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    for field in [
        "status",
        "ledgerWritable",
        "llmAvailable",
        "geolocationAvailable",
        "mailerAvailable",
        "activeSessions",
    ] {
        assert!(body.get(field).is_some(), "Response should have '{}' field", field);
    }
    assert_eq!(body["ledgerWritable"], true);
}

/// Live sessions are reported by the health endpoint
#[tokio::test]
async fn test_health_counts_active_sessions() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    ctx.start_visit(&server).await;
    ctx.start_visit(&server).await;

    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["activeSessions"], 2);
}

/// Test /health/ready once the ledger is open
#[tokio::test]
async fn test_ready_endpoint() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health/ready").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

/// Test /health/live endpoint always returns 200 when service is running
#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health/live").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}
