//! End-to-end tests for the chat relay.

use integration_tests::{fixtures, setup::TestContext};
use serde_json::json;

/// In-scope answers are returned and logged but not flagged.
#[tokio::test]
async fn test_in_scope_question() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/chat")
        .json(&fixtures::chat_payload("What does BMAD stand for?", None))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body, json!({ "response": fixtures::IN_SCOPE_REPLY, "logged": false }));

    let questions = ctx.read_data_file("questions.json");
    assert_eq!(questions.as_array().unwrap().len(), 1);
    assert_eq!(questions[0]["question"], "What does BMAD stand for?");
    assert_eq!(questions[0]["type"], "in-scope");
    assert!(questions[0].get("sessionId").is_none());
    assert!(ctx.mailer.sent().is_empty());
}

/// A marked reply is flagged, logged and alerted.
#[tokio::test]
async fn test_out_of_scope_question_alerts() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    ctx.chat_llm.set_reply(fixtures::OUT_OF_SCOPE_REPLY);

    let response = server
        .post("/api/chat")
        .json(&fixtures::chat_payload("Can you migrate our ERP?", None))
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["logged"], true);
    assert_eq!(body["response"], fixtures::OUT_OF_SCOPE_REPLY);

    let questions = ctx.read_data_file("questions.json");
    assert_eq!(questions[0]["type"], "out-of-scope");
    assert_eq!(ctx.mailer.count_with_prefix("Question for the call"), 1);
}

/// The system prompt carries the marker instruction and the message is relayed as-is.
#[tokio::test]
async fn test_question_relayed_with_system_prompt() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/api/chat")
        .json(&fixtures::chat_payload("How long is the audit?", None))
        .await
        .assert_status_ok();

    let requests = ctx.chat_llm.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].system.contains("📝"));
    assert_eq!(requests[0].messages[0].content, "How long is the audit?");
}

/// Provider failure returns the fallback reply and records nothing.
#[tokio::test]
async fn test_provider_failure_uses_fallback() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    ctx.chat_llm.set_should_fail(true);

    let response = server
        .post("/api/chat")
        .json(&fixtures::chat_payload("Anyone there?", None))
        .await;

    response.assert_status_internal_server_error();
    let body: serde_json::Value = response.json();
    assert_eq!(body["response"], tracker_core::FALLBACK_REPLY);
    assert_eq!(body["logged"], false);
    assert!(ctx.read_data_file("questions.json").is_null());
    assert!(ctx.mailer.sent().is_empty());
}

/// Questions asked during a live session land in its transcript.
#[tokio::test]
async fn test_chat_appends_to_live_session() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;

    server
        .post("/api/chat")
        .json(&fixtures::chat_payload("What does BMAD stand for?", Some(&session_id)))
        .await
        .assert_status_ok();

    let session = ctx.tracker.registry().get(&session_id).unwrap();
    assert_eq!(session.chat.len(), 1);
    assert_eq!(session.chat[0].question, "What does BMAD stand for?");
    assert_eq!(session.chat[0].response, fixtures::IN_SCOPE_REPLY);

    let questions = ctx.read_data_file("questions.json");
    assert_eq!(questions[0]["sessionId"], session_id.as_str());
}

/// Questions for an unknown session are still answered and logged.
#[tokio::test]
async fn test_chat_with_unknown_session() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/chat")
        .json(&fixtures::chat_payload("Hello?", Some("gone")))
        .await;

    response.assert_status_ok();
    let questions = ctx.read_data_file("questions.json");
    assert_eq!(questions[0]["sessionId"], "gone");
}

/// Empty and over-long messages are rejected before reaching the provider.
#[tokio::test]
async fn test_invalid_messages_rejected() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for message in [String::new(), "x".repeat(2001)] {
        let response = server
            .post("/api/chat")
            .json(&json!({ "message": message }))
            .await;

        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALID_002");
    }

    let response = server.post("/api/chat").json(&json!({ "text": "hi" })).await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");

    assert_eq!(ctx.chat_llm.call_count(), 0);
}
