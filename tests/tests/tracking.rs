//! End-to-end tests for the visitor tracking lifecycle.
//!
//! visit → activity/heartbeat → end (or inactivity sweep), verified through
//! the HTTP responses, the ledger files and the captured alerts.

use chrono::{Duration, Utc};
use integration_tests::{fixtures, mocks::MockGeo, setup::{TestContext, TestOptions}};
use serde_json::json;
use std::future::IntoFuture;

/// Visit returns an id and writes the visitor and active snapshot.
#[tokio::test]
async fn test_visit_creates_session() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let session_id = ctx.start_visit(&server).await;

    let visitors = ctx.read_data_file("visitors.json");
    assert_eq!(visitors[0]["id"], session_id.as_str());
    assert_eq!(visitors[0]["active"], true);
    assert_eq!(visitors[0]["origin"]["geo"]["city"], "Toronto");
    assert_eq!(visitors[0]["origin"]["device"]["browser"], "Chrome");

    let active = ctx.read_data_file("active_sessions.json");
    assert!(active.get(&session_id).is_some());

    assert_eq!(ctx.mailer.count_with_prefix("New visitor from Toronto"), 1);
    assert_eq!(ctx.geo.lookups(), vec![fixtures::VISITOR_IP.parse::<std::net::IpAddr>().unwrap()]);
}

/// Excluded network: no id, nothing written.
#[tokio::test]
async fn test_excluded_network_not_tracked() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/track/visit")
        .add_header("X-Forwarded-For", &format!("{}, 10.0.0.1", fixtures::OFFICE_IP))
        .json(&fixtures::visit_payload())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body, json!({ "sessionId": null, "tracked": false }));
    assert!(ctx.read_data_file("visitors.json").is_null());
    assert!(ctx.mailer.sent().is_empty());
}

/// Without a trusted proxy, a spoofed X-Forwarded-For cannot opt a visit out.
#[tokio::test]
async fn test_forwarded_header_ignored_without_trusted_proxy() {
    let ctx = TestContext::with_options(TestOptions {
        trust_proxy: false,
        ..TestOptions::default()
    })
    .await;
    let server = ctx.server();

    let response = server
        .post("/api/track/visit")
        .add_header("X-Forwarded-For", fixtures::OFFICE_IP)
        .json(&fixtures::visit_payload())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tracked"], true);
    assert_eq!(ctx.read_data_file("visitors.json").as_array().unwrap().len(), 1);
}

/// Exclusion matches by network, never by substring.
#[tokio::test]
async fn test_exclusion_is_not_substring_match() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    // Shares a prefix with 192.0.2.0/24 as text only
    let response = server
        .post("/api/track/visit")
        .add_header("X-Forwarded-For", "192.0.20.1")
        .json(&fixtures::visit_payload())
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["tracked"], true);
}

/// visit → activity(40) → activity(25) → end ⇒ maxScroll 40.
#[tokio::test]
async fn test_max_scroll_is_monotonic() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;

    for scroll in [40.0, 25.0] {
        let response = server
            .post("/api/track/activity")
            .json(&fixtures::scroll_payload(&session_id, scroll))
            .await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["ok"], true);
    }

    let response = server
        .post("/api/track/end")
        .json(&fixtures::end_payload(&session_id))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["analysis"], fixtures::ANALYSIS_REPLY);

    let visitors = ctx.read_data_file("visitors.json");
    assert_eq!(visitors[0]["maxScroll"], 40.0);
    assert_eq!(visitors[0]["active"], false);
    assert_eq!(visitors[0]["endReason"], "explicit");
    assert_eq!(visitors[0]["analysis"], fixtures::ANALYSIS_REPLY);
    assert_eq!(ctx.read_data_file("active_sessions.json"), json!({}));
}

/// First view of a section alerts once; repeated views do not.
#[tokio::test]
async fn test_first_section_view_alerts_once() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;

    for event in [Some("enter"), Some("exit"), None, Some("enter")] {
        server
            .post("/api/track/activity")
            .json(&fixtures::section_payload(&session_id, "pricing", event))
            .await
            .assert_status_ok();
    }

    let alerts = ctx
        .mailer
        .sent()
        .into_iter()
        .filter(|m| m.subject.contains("\"pricing\""))
        .count();
    assert_eq!(alerts, 1);

    let session = ctx.tracker.registry().get(&session_id).unwrap();
    assert_eq!(session.sections_viewed, vec!["pricing"]);
    assert!(session.open_sections.contains_key("pricing"));
}

/// Heartbeat merges client totals by per-section maximum.
#[tokio::test]
async fn test_heartbeat_merges_section_times() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;

    for times in [json!({ "hero": 4000, "pricing": 1500 }), json!({ "hero": 2500 })] {
        let response = server
            .post("/api/track/heartbeat")
            .json(&json!({ "sessionId": session_id, "sectionTimes": times }))
            .await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["ok"], true);
    }

    let session = ctx.tracker.registry().get(&session_id).unwrap();
    assert_eq!(session.section_times["hero"], 4000);
    assert_eq!(session.section_times["pricing"], 1500);
}

/// Client totals and server intervals cover the same time and are never summed.
#[tokio::test]
async fn test_client_totals_do_not_inflate_dwell() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;

    for section in ["pricing", "roi"] {
        server
            .post("/api/track/activity")
            .json(&fixtures::section_payload(&session_id, section, Some("enter")))
            .await
            .assert_status_ok();
    }

    // Heartbeat report, then the section closes
    server
        .post("/api/track/heartbeat")
        .json(&json!({ "sessionId": session_id, "sectionTimes": { "pricing": 600000 } }))
        .await
        .assert_status_ok();
    server
        .post("/api/track/activity")
        .json(&fixtures::section_payload(&session_id, "pricing", Some("exit")))
        .await
        .assert_status_ok();

    // Final report while "roi" is still open
    server
        .post("/api/track/end")
        .json(&json!({ "sessionId": session_id, "sectionTimes": { "roi": 600000 } }))
        .await
        .assert_status_ok();

    let visitors = ctx.read_data_file("visitors.json");
    assert_eq!(visitors[0]["sectionTimes"]["pricing"], 600000);
    assert_eq!(visitors[0]["sectionTimes"]["roi"], 600000);
}

/// Beacon delivery: end accepts a text/plain JSON body.
#[tokio::test]
async fn test_end_accepts_text_plain_beacon() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;

    let payload = json!({ "sessionId": session_id, "sectionTimes": { "hero": 1234.6 } }).to_string();
    let response = server
        .post("/api/track/end")
        .content_type("text/plain;charset=UTF-8")
        .bytes(payload.into())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);

    let visitors = ctx.read_data_file("visitors.json");
    assert_eq!(visitors[0]["sectionTimes"]["hero"], 1235);
}

/// Unknown sessions are soft failures and write nothing.
#[tokio::test]
async fn test_unknown_session_is_soft_failure() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for path in ["/api/track/activity", "/api/track/heartbeat"] {
        let response = server.post(path).json(&fixtures::scroll_payload("missing", 10.0)).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["ok"], false);
    }

    let response = server.post("/api/track/end").json(&fixtures::end_payload("missing")).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body, json!({ "ok": false, "analysis": null }));
    assert!(ctx.read_data_file("visitors.json").is_null());
    assert_eq!(ctx.analysis_llm.call_count(), 0);
}

/// Two rapid end calls ⇒ exactly one finalization.
#[tokio::test]
async fn test_double_end_finalizes_once() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;

    let payload = fixtures::end_payload(&session_id);
    let (first, second) = tokio::join!(
        server.post("/api/track/end").json(&payload).into_future(),
        server.post("/api/track/end").json(&payload).into_future(),
    );

    let oks = [first, second]
        .iter()
        .filter(|r| r.json::<serde_json::Value>()["ok"] == true)
        .count();
    assert_eq!(oks, 1);
    assert_eq!(ctx.analysis_llm.call_count(), 1);
    assert_eq!(ctx.mailer.count_with_prefix("Session ended"), 1);
    assert_eq!(ctx.read_data_file("visitors.json").as_array().unwrap().len(), 1);
}

/// Sweeper finalizes a 31 s idle session, not a 29 s idle one.
#[tokio::test]
async fn test_sweeper_idle_threshold() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let session_id = ctx.start_visit(&server).await;
    let now = Utc::now();

    assert_eq!(ctx.tracker.sweep_at(now + Duration::seconds(29)).await, 0);
    assert!(ctx.tracker.registry().contains(&session_id));

    assert_eq!(ctx.tracker.sweep_at(now + Duration::seconds(31)).await, 1);
    assert!(!ctx.tracker.registry().contains(&session_id));

    let visitors = ctx.read_data_file("visitors.json");
    assert_eq!(visitors[0]["endReason"], "inactivity");
    assert_eq!(ctx.mailer.count_with_prefix("Session ended (inactivity)"), 1);

    // A late end from the page is a no-op
    let response = server.post("/api/track/end").json(&fixtures::end_payload(&session_id)).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(ctx.analysis_llm.call_count(), 1);
}

/// Geolocation failure degrades to "unknown" and still tracks the visit.
#[tokio::test]
async fn test_geolocation_failure_is_not_fatal() {
    let ctx = TestContext::with_options(TestOptions {
        geo: MockGeo::failing(),
        ..TestOptions::default()
    })
    .await;
    let server = ctx.server();

    let session_id = ctx.start_visit(&server).await;
    let session = ctx.tracker.registry().get(&session_id).unwrap();
    assert_eq!(session.origin.geo.city, "unknown");
}

/// Malformed bodies are rejected with a coded error.
#[tokio::test]
async fn test_malformed_activity_rejected() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/api/track/activity")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}
