//! Admin API tests: access code exchange, token checks and the dashboard reads.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{
    fixtures,
    setup::{TestContext, TestOptions},
};
use serde_json::json;

async fn login(server: &TestServer) -> String {
    let response = server
        .post("/api/admin/auth")
        .json(&json!({ "code": fixtures::ADMIN_CODE }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn test_login_issues_token() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let token = login(&server).await;
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_wrong_code_rejected() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/admin/auth")
        .json(&json!({ "code": "guess" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "AUTH_004");
}

#[tokio::test]
async fn test_token_errors() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let cases = [
        ("/api/admin/visitors", None, "AUTH_001"),
        ("/api/admin/visitors?token=not-a-token", None, "AUTH_002"),
        ("/api/admin/visitors", Some("Bearer xyz"), "AUTH_002"),
        (
            "/api/admin/visitors?token=0123456789abcdef0123456789abcdef",
            None,
            "AUTH_003",
        ),
    ];

    for (path, auth, code) in cases {
        let mut request = server.get(path);
        if let Some(auth) = auth {
            request = request.add_header("Authorization", auth);
        }
        let response = request.await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{}", path);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], code, "{}", path);
    }
}

#[tokio::test]
async fn test_disabled_admin_rejects_everything() {
    let ctx = TestContext::with_options(TestOptions {
        admin_code: None,
        ..TestOptions::default()
    })
    .await;
    let server = ctx.server();

    for code in ["", fixtures::ADMIN_CODE] {
        let response = server.post("/api/admin/auth").json(&json!({ "code": code })).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_dashboard_reads() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let finished = ctx.start_visit(&server).await;
    server
        .post("/api/track/activity")
        .json(&fixtures::scroll_payload(&finished, 80.0))
        .await
        .assert_status_ok();
    server
        .post("/api/track/end")
        .json(&fixtures::end_payload(&finished))
        .await
        .assert_status_ok();

    let live = ctx.start_visit(&server).await;
    ctx.chat_llm.set_reply(fixtures::OUT_OF_SCOPE_REPLY);
    server
        .post("/api/chat")
        .json(&fixtures::chat_payload("Do you build mobile apps?", Some(&live)))
        .await
        .assert_status_ok();

    let token = login(&server).await;

    let visitors: serde_json::Value = server
        .get(&format!("/api/admin/visitors?token={}", token))
        .await
        .json();
    assert_eq!(visitors.as_array().unwrap().len(), 2);

    let questions: serde_json::Value = server
        .get("/api/admin/questions")
        .add_header("Authorization", &format!("Bearer {}", token))
        .await
        .json();
    assert_eq!(questions[0]["type"], "out-of-scope");

    let active: serde_json::Value = server
        .get(&format!("/api/admin/active?token={}", token))
        .await
        .json();
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["id"], live.as_str());

    let stats: serde_json::Value = server
        .get(&format!("/api/admin/stats?token={}", token))
        .await
        .json();
    assert_eq!(stats["totalVisitors"], 2);
    assert_eq!(stats["activeNow"], 1);
    assert_eq!(stats["finishedSessions"], 1);
    assert_eq!(stats["totalQuestions"], 1);
    assert_eq!(stats["outOfScopeQuestions"], 1);
}
