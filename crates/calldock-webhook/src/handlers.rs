// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook request handlers.
//!
//! POST /webhook runs the full inbound pipeline: size check, signature
//! verification on the raw bytes, typed parsing, then per-variant handling.
//! Authentication and validation failures are surfaced immediately and never
//! retried; downstream failures inside a handler go through the resilience
//! primitives instead of failing the request.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{info, warn};

use calldock_core::{
    CallRecord, CallStatus, CalldockError, NotificationOutcome, RecordStore, ToolCallLog,
};
use calldock_notify::{DeliveryReport, NotificationJob};
use calldock_resilience::run_bounded;
use calldock_rules::classify_priority;

use crate::event::{
    parse_event, CallEndedEvent, CallLifecycleEvent, ToolCallsEvent, ToolInvocation,
    TranscriptEvent, WebhookEvent,
};
use crate::server::WebhookState;
use crate::{signature, tools};

/// Maximum characters in an outbound alert SMS body.
const ALERT_BODY_MAX_CHARS: usize = 300;

/// POST /webhook — authenticate, parse, and dispatch one inbound event.
pub async fn post_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process_event(&state, &headers, &body).await {
        Ok(response) => response,
        Err(err) => error_response(&err),
    }
}

async fn process_event(
    state: &WebhookState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, CalldockError> {
    let webhook = &state.config.webhook;

    signature::enforce_size_limit(body, webhook.max_payload_bytes)?;

    let header_value = headers
        .get(webhook.signature_header.as_str())
        .and_then(|value| value.to_str().ok());
    signature::verify(body, header_value, &webhook.secret)?;

    let event = parse_event(body)?;
    signature::check_clock_skew(
        event.timestamp_ms(),
        webhook.clock_skew_secs,
        Utc::now().timestamp_millis(),
    )?;

    info!(
        event = event.event_name(),
        call_id = event.call_id().unwrap_or("-"),
        "webhook event accepted"
    );

    match &event {
        WebhookEvent::HealthCheck(_) => Ok(Json(json!({
            "success": true,
            "type": "health-check",
            "status": "healthy",
        }))
        .into_response()),
        WebhookEvent::CallStarted(e) => handle_call_started(state, e).await,
        WebhookEvent::CallEnded(e) => handle_call_ended(state, e).await,
        WebhookEvent::Transcript(e) => handle_transcript(state, e).await,
        WebhookEvent::ToolCalls(e) => handle_tool_calls(state, e).await,
        WebhookEvent::FunctionCall(e) => handle_function_call(state, e).await,
        WebhookEvent::Message(e) => {
            info!(call_id = e.call_id.as_deref().unwrap_or("-"), "platform message");
            Ok(Json(ok_body("message", e.call_id.as_deref())).into_response())
        }
    }
}

/// GET /health — public liveness probe.
pub async fn get_health(State(state): State<WebhookState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

async fn handle_call_started(
    state: &WebhookState,
    event: &CallLifecycleEvent,
) -> Result<Response, CalldockError> {
    let now = Utc::now().to_rfc3339();
    let record = CallRecord {
        id: event.call.id.clone(),
        status: event.call.status.to_string(),
        started_at: event.call.started_at.clone(),
        ended_at: None,
        duration_secs: None,
        transcript: None,
        summary: None,
        intake_json: None,
        classification_json: None,
        created_at: now.clone(),
        updated_at: now,
    };
    state.store.upsert_call(&record).await?;
    Ok(Json(ok_body("call-started", Some(&event.call.id))).into_response())
}

async fn handle_transcript(
    state: &WebhookState,
    event: &TranscriptEvent,
) -> Result<Response, CalldockError> {
    if let Some(call_id) = &event.call_id {
        let now = Utc::now().to_rfc3339();
        let record = match state.store.get_call(call_id).await? {
            Some(mut existing) => {
                existing.transcript = Some(event.transcript.clone());
                existing.updated_at = now;
                existing
            }
            None => CallRecord {
                id: call_id.clone(),
                status: CallStatus::InProgress.to_string(),
                started_at: None,
                ended_at: None,
                duration_secs: None,
                transcript: Some(event.transcript.clone()),
                summary: None,
                intake_json: None,
                classification_json: None,
                created_at: now.clone(),
                updated_at: now,
            },
        };
        state.store.upsert_call(&record).await?;
    }
    Ok(Json(ok_body("transcript", event.call_id.as_deref())).into_response())
}

/// The post-call pipeline: persist, classify, and alert on-call staff.
///
/// The HTTP response carries the classification but never blocks on the
/// notification fan-out beyond the configured grace period; the fan-out
/// finishes in the background and its outcomes are recorded there.
async fn handle_call_ended(
    state: &WebhookState,
    event: &CallEndedEvent,
) -> Result<Response, CalldockError> {
    let call_id = event.call.id.clone();
    let now = Utc::now().to_rfc3339();

    let mut text = String::new();
    for part in [
        event.transcript.as_deref(),
        event.summary.as_deref(),
        event.intake.as_ref().and_then(|i| i.problem.as_deref()),
    ]
    .into_iter()
    .flatten()
    {
        text.push_str(part);
        text.push(' ');
    }
    let classification = classify_priority(&text, None);

    let classification_json = serde_json::to_string(&classification)
        .map_err(|err| CalldockError::Internal(format!("classification encoding: {err}")))?;
    let intake_json = match &event.intake {
        Some(intake) => Some(
            serde_json::to_string(intake)
                .map_err(|err| CalldockError::Internal(format!("intake encoding: {err}")))?,
        ),
        None => None,
    };

    let record = CallRecord {
        id: call_id.clone(),
        status: event.call.status.to_string(),
        started_at: event.call.started_at.clone(),
        ended_at: event.call.ended_at.clone(),
        duration_secs: event.call.duration_secs,
        transcript: event.transcript.clone(),
        summary: event.summary.clone(),
        intake_json,
        classification_json: Some(classification_json),
        created_at: now.clone(),
        updated_at: now,
    };
    state.store.upsert_call(&record).await?;

    let notify = &state.config.notify;
    let urgent = classification.tier <= calldock_core::PriorityTier::P2;
    if notify.enabled && urgent && !notify.on_call.is_empty() {
        let job = NotificationJob {
            correlation_id: call_id.clone(),
            recipients: notify.on_call.clone(),
            body: alert_body(&classification.tier.to_string(), &call_id, event),
        };
        let done = spawn_alert(state, job);
        let grace = std::time::Duration::from_secs(notify.grace_period_secs);
        // Bounded wait only; the fan-out keeps running if this times out.
        let _ = tokio::time::timeout(grace, done).await;
    }

    Ok(Json(json!({
        "success": true,
        "type": "call-ended",
        "callId": call_id,
        "classification": {
            "tier": classification.tier.to_string(),
            "reason": classification.reason,
            "slaSecs": classification.sla_secs,
        },
    }))
    .into_response())
}

async fn handle_tool_calls(
    state: &WebhookState,
    event: &ToolCallsEvent,
) -> Result<Response, CalldockError> {
    let limit = state.config.runner.max_concurrency;
    let tasks: Vec<_> = event
        .tool_calls
        .iter()
        .map(|invocation| {
            let state = state.clone();
            let call_id = event.call_id.clone();
            let invocation = invocation.clone();
            move || async move {
                Ok::<_, CalldockError>(
                    run_invocation(&state, call_id.as_deref(), &invocation).await,
                )
            }
        })
        .collect();

    let outcomes = run_bounded(tasks, limit).await;

    let results: Vec<Value> = outcomes
        .into_iter()
        .zip(&event.tool_calls)
        .map(|(outcome, invocation)| match outcome.result {
            Ok(item) => item,
            // Task-level failure (panic isolation); still resolve the id.
            Err(err) => error_item(&invocation.tool_call_id, &err),
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "type": "tool-calls",
        "results": results,
    }))
    .into_response())
}

async fn handle_function_call(
    state: &WebhookState,
    event: &crate::event::FunctionCallEvent,
) -> Result<Response, CalldockError> {
    let tool_call_id = event
        .tool_call_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let invocation = ToolInvocation {
        tool_call_id,
        function: event.function.clone(),
        arguments: event.arguments.clone(),
    };
    let item = run_invocation(state, event.call_id.as_deref(), &invocation).await;
    Ok(Json(json!({
        "success": true,
        "type": "function-call",
        "result": item,
    }))
    .into_response())
}

/// Run one invocation, log it, and shape its per-invocation result item.
async fn run_invocation(
    state: &WebhookState,
    call_id: Option<&str>,
    invocation: &ToolInvocation,
) -> Value {
    let start = Instant::now();
    let result = tools::run_function(
        state,
        &invocation.tool_call_id,
        &invocation.function,
        &invocation.arguments,
    )
    .await;
    let duration_ms = start.elapsed().as_millis() as i64;

    let log = ToolCallLog {
        tool_call_id: invocation.tool_call_id.clone(),
        call_id: call_id.map(str::to_string),
        function: invocation.function.clone(),
        arguments_json: invocation.arguments.to_string(),
        result_json: result.as_ref().ok().map(Value::to_string),
        error: result.as_ref().err().map(|err| err.to_string()),
        duration_ms,
        created_at: Utc::now().to_rfc3339(),
    };
    if let Err(err) = state.store.log_tool_call(&log).await {
        warn!(
            tool_call_id = %invocation.tool_call_id,
            error = %err,
            "failed to log tool invocation"
        );
    }

    match result {
        Ok(value) => json!({
            "toolCallId": invocation.tool_call_id,
            "result": value,
        }),
        Err(err) => error_item(&invocation.tool_call_id, &err),
    }
}

fn error_item(tool_call_id: &str, err: &CalldockError) -> Value {
    json!({
        "toolCallId": tool_call_id,
        "error": error_code(err),
        "message": err.to_string(),
    })
}

fn alert_body(tier: &str, call_id: &str, event: &CallEndedEvent) -> String {
    let detail = event
        .summary
        .as_deref()
        .or_else(|| event.intake.as_ref().and_then(|i| i.problem.as_deref()))
        .or(event.transcript.as_deref())
        .unwrap_or("nouvel appel");
    let body = format!("[{tier}] {detail} (appel {call_id})");
    if body.chars().count() > ALERT_BODY_MAX_CHARS {
        body.chars().take(ALERT_BODY_MAX_CHARS).collect()
    } else {
        body
    }
}

/// Spawn the fan-out on the state's task tracker and return a receiver that
/// resolves when dispatch and outcome recording have finished.
fn spawn_alert(state: &WebhookState, job: NotificationJob) -> oneshot::Receiver<()> {
    let (done_tx, done_rx) = oneshot::channel();
    let notifier = state.notifier.clone();
    let store = state.store.clone();
    state.tracker.spawn(async move {
        let correlation_id = job.correlation_id.clone();
        let report = notifier.dispatch(job).await;
        record_outcomes(store.as_ref(), &correlation_id, &report).await;
        let _ = done_tx.send(());
    });
    done_rx
}

/// Persist one outcome row per recipient. Storage failures here are logged,
/// not surfaced: the alert already went out (or didn't) either way.
pub(crate) async fn record_outcomes(
    store: &dyn RecordStore,
    correlation_id: &str,
    report: &DeliveryReport,
) {
    let now = Utc::now().to_rfc3339();
    for delivery in &report.delivered {
        let outcome = NotificationOutcome {
            correlation_id: correlation_id.to_string(),
            recipient: delivery.recipient.clone(),
            status: "delivered".to_string(),
            attempts: delivery.attempts,
            provider_id: Some(delivery.provider_id.clone()),
            last_error: None,
            created_at: now.clone(),
        };
        if let Err(err) = store.record_notification(&outcome).await {
            warn!(recipient = %delivery.recipient, error = %err, "failed to record delivery");
        }
    }
    for failure in &report.failed {
        let outcome = NotificationOutcome {
            correlation_id: correlation_id.to_string(),
            recipient: failure.recipient.clone(),
            status: "exhausted".to_string(),
            attempts: failure.attempts,
            provider_id: None,
            last_error: Some(failure.error.to_string()),
            created_at: now.clone(),
        };
        if let Err(err) = store.record_notification(&outcome).await {
            warn!(recipient = %failure.recipient, error = %err, "failed to record failure");
        }
    }
}

fn ok_body(event_type: &str, call_id: Option<&str>) -> Value {
    let mut body = json!({ "success": true, "type": event_type });
    if let Some(id) = call_id
        && let Some(map) = body.as_object_mut()
    {
        map.insert("callId".to_string(), Value::String(id.to_string()));
    }
    body
}

fn error_code(err: &CalldockError) -> &'static str {
    match err {
        CalldockError::Auth { .. } => "AUTH_ERROR",
        CalldockError::Validation(_) => "VALIDATION_ERROR",
        CalldockError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        CalldockError::Transient { .. } | CalldockError::Timeout { .. } => "TRANSIENT_DOWNSTREAM",
        CalldockError::CircuitOpen { .. } => "CIRCUIT_OPEN",
        CalldockError::Storage { .. } => "STORAGE_ERROR",
        CalldockError::Gateway { .. } => "GATEWAY_ERROR",
        CalldockError::Config(_) => "CONFIG_ERROR",
        CalldockError::Internal(_) => "INTERNAL_ERROR",
    }
}

fn error_response(err: &CalldockError) -> Response {
    let status = match err {
        CalldockError::Auth { .. } => StatusCode::UNAUTHORIZED,
        CalldockError::Validation(_) => StatusCode::BAD_REQUEST,
        CalldockError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = match err {
        CalldockError::Auth { code } => json!({ "error": { "code": code.to_string() } }),
        _ => json!({ "error": { "code": error_code(err), "message": err.to_string() } }),
    };
    (status, Json(body)).into_response()
}
