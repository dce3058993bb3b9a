// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete intake pipeline.
//!
//! Each test creates an isolated TestHarness with a temp SQLite store and
//! a scriptable mock SMS gateway, then drives signed webhook requests
//! through the router in-process. Tests are independent and
//! order-insensitive.

use std::time::Instant;

use calldock_core::RecordStore;
use calldock_test_utils::TestHarness;

// ---- Scenario 1: authenticated health check ----

#[tokio::test]
async fn signed_health_check_responds_healthy_and_fast() {
    let harness = TestHarness::builder().build().await.unwrap();

    let start = Instant::now();
    let (status, body) = harness.post_event(r#"{"type":"health-check"}"#).await;
    let elapsed = start.elapsed();

    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["type"], "health-check");
    // No downstream calls are involved; anything near a second means a
    // blocking path crept into the handler.
    assert!(elapsed.as_millis() < 1000, "health check took {elapsed:?}");
}

#[tokio::test]
async fn unsigned_and_tampered_requests_are_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();

    let (status, body) = harness.post_raw(r#"{"type":"health-check"}"#, None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "MISSING_SIGNATURE");

    let signed_for_other_body = harness.sign(br#"{"type":"call-started"}"#);
    let (status, body) = harness
        .post_raw(r#"{"type":"health-check"}"#, Some(signed_for_other_body))
        .await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
}

// ---- Scenario 2: flooding call classified P1 ----

#[tokio::test]
async fn flooding_transcript_is_classified_p1_with_zero_sla() {
    let harness = TestHarness::builder().build().await.unwrap();

    let body = r#"{"type":"call-ended",
        "call":{"id":"call-flood","status":"ended",
                "startedAt":"2026-03-02T09:00:00Z","endedAt":"2026-03-02T09:06:00Z",
                "durationSecs":360},
        "transcript":"bonjour, il y a une inondation dans ma cuisine, l'eau monte",
        "intake":{"customerName":"M. Bernard","phone":"+33612345678",
                  "requestedService":"fuite"}}"#;

    let (status, response) = harness.post_event(body).await;
    assert_eq!(status, 200);
    assert_eq!(response["classification"]["tier"], "P1");
    assert_eq!(response["classification"]["slaSecs"], 0);

    let record = harness.store.get_call("call-flood").await.unwrap().unwrap();
    assert_eq!(record.status, "ended");
    assert!(record.classification_json.unwrap().contains("P1"));
    assert!(record.intake_json.unwrap().contains("M. Bernard"));
}

// ---- Scenario 3: mixed tool-call batch ----

#[tokio::test]
async fn tool_calls_with_unknown_function_resolve_independently() {
    let harness = TestHarness::builder().build().await.unwrap();

    let body = r#"{"type":"tool-calls","callId":"call-tools","toolCalls":[
        {"toolCallId":"tc-quote","function":"calculate_quote",
         "arguments":{"service":"chauffe-eau","zone":"grande-couronne","tier":"P2"}},
        {"toolCallId":"tc-oops","function":"summon_electrician","arguments":{}}
    ]}"#;

    let (status, response) = harness.post_event(body).await;
    assert_eq!(status, 200);

    let results = response["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    let quote = results
        .iter()
        .find(|r| r["toolCallId"] == "tc-quote")
        .expect("tc-quote must be present exactly once");
    assert_eq!(quote["result"]["currency"], "EUR");
    assert!(quote["result"]["min_cents"].as_u64().unwrap() > 0);

    let failed = results
        .iter()
        .find(|r| r["toolCallId"] == "tc-oops")
        .expect("tc-oops must be present exactly once");
    assert_eq!(failed["error"], "VALIDATION_ERROR");

    // Both invocations were logged, the failed one with its error.
    let logs = harness.store.list_tool_calls("call-tools").await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs.iter().filter(|l| l.error.is_some()).count(), 1);
}

// ---- Scenario 4: retried fan-out delivers to all recipients ----

#[tokio::test]
async fn flaky_recipient_is_delivered_on_third_attempt() {
    let recipients = vec![
        "+33600000001".to_string(),
        "+33600000002".to_string(),
        "+33600000003".to_string(),
    ];
    let harness = TestHarness::builder()
        .with_on_call(recipients)
        .with_max_attempts(3)
        .with_flaky_recipient("+33600000002", 2)
        .build()
        .await
        .unwrap();

    let body = r#"{"type":"call-ended",
        "call":{"id":"call-alert","status":"ended"},
        "summary":"urgence: fuite majeure au sous-sol d'une ecole"}"#;
    let (status, response) = harness.post_event(body).await;
    assert_eq!(status, 200);
    assert_eq!(response["classification"]["tier"], "P1");

    harness.drain_background().await;

    let outcomes = harness.store.list_notifications("call-alert").await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.status == "delivered"));

    let flaky = outcomes
        .iter()
        .find(|o| o.recipient == "+33600000002")
        .unwrap();
    assert_eq!(flaky.attempts, 3);
    assert_eq!(harness.gateway.calls_for("+33600000002"), 3);
    assert_eq!(harness.gateway.calls_for("+33600000001"), 1);
}

// ---- Record lifecycle across events ----

#[tokio::test]
async fn call_record_accretes_across_lifecycle_events() {
    let harness = TestHarness::builder().build().await.unwrap();

    let started = r#"{"type":"call-started",
        "call":{"id":"call-life","status":"ringing",
                "startedAt":"2026-03-02T14:00:00Z"}}"#;
    let (status, _) = harness.post_event(started).await;
    assert_eq!(status, 200);

    let transcript = r#"{"type":"transcript","callId":"call-life",
        "transcript":"mon chauffe-eau ne fonctionne plus"}"#;
    let (status, _) = harness.post_event(transcript).await;
    assert_eq!(status, 200);

    let ended = r#"{"type":"call-ended",
        "call":{"id":"call-life","status":"ended",
                "endedAt":"2026-03-02T14:05:00Z"},
        "summary":"panne de chauffe-eau, devis demande"}"#;
    let (status, _) = harness.post_event(ended).await;
    assert_eq!(status, 200);

    let record = harness.store.get_call("call-life").await.unwrap().unwrap();
    assert_eq!(record.status, "ended");
    // started_at came from the first event and survived later upserts.
    assert_eq!(record.started_at.as_deref(), Some("2026-03-02T14:00:00Z"));
    assert_eq!(record.ended_at.as_deref(), Some("2026-03-02T14:05:00Z"));
    assert!(record.transcript.unwrap().contains("chauffe-eau"));
    assert!(record.summary.unwrap().contains("devis"));
}

#[tokio::test]
async fn notify_on_call_tool_reports_delivery_counts() {
    let harness = TestHarness::builder()
        .with_on_call(vec![
            "+33600000010".to_string(),
            "+33600000011".to_string(),
        ])
        .build()
        .await
        .unwrap();

    let body = r#"{"type":"tool-calls","toolCalls":[
        {"toolCallId":"tc-notify","function":"notify_on_call",
         "arguments":{"message":"client bloque dehors, intervention demandee"}}
    ]}"#;
    let (status, response) = harness.post_event(body).await;
    assert_eq!(status, 200);

    let result = &response["results"][0];
    assert_eq!(result["toolCallId"], "tc-notify");
    assert_eq!(result["result"]["dispatched"], true);
    assert_eq!(result["result"]["delivered"], 2);
    assert_eq!(result["result"]["failed"], 0);

    let outcomes = harness.store.list_notifications("tc-notify").await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(harness.gateway.sent_messages().len(), 2);
}
