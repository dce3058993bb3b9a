// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named business functions callable from tool-call invocations.
//!
//! The voice agent asks for one of a closed set of functions; each maps to
//! a rules-engine call or a notification send and returns a JSON result.
//! An unknown name or malformed arguments fail that invocation only.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use calldock_core::{CalldockError, PriorityTier};
use calldock_notify::NotificationJob;
use calldock_rules::{
    calculate_quote, classify_priority, evaluate_scheduling, validate_service, Zone,
};

use crate::handlers::record_outcomes;
use crate::server::WebhookState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceArgs {
    service: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteArgs {
    service: String,
    #[serde(default)]
    zone: Option<Zone>,
    #[serde(default)]
    tier: Option<PriorityTier>,
    #[serde(default)]
    after_hours: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriorityArgs {
    transcript: String,
    #[serde(default)]
    estimated_value_cents: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleArgs {
    service: String,
    #[serde(default)]
    tier: Option<PriorityTier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotifyArgs {
    message: String,
}

fn parse_args<T: DeserializeOwned>(function: &str, arguments: &Value) -> Result<T, CalldockError> {
    serde_json::from_value(arguments.clone()).map_err(|err| {
        CalldockError::Validation(format!("invalid arguments for `{function}`: {err}"))
    })
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, CalldockError> {
    serde_json::to_value(value)
        .map_err(|err| CalldockError::Internal(format!("result serialization failed: {err}")))
}

/// Execute one named function and return its JSON result.
///
/// `correlation_id` is the toolCallId (or callId) used to correlate any
/// notification outcomes the function produces.
pub async fn run_function(
    state: &WebhookState,
    correlation_id: &str,
    function: &str,
    arguments: &Value,
) -> Result<Value, CalldockError> {
    match function {
        "validate_service" => {
            let args: ServiceArgs = parse_args(function, arguments)?;
            to_value(&validate_service(&args.service))
        }
        "calculate_quote" => {
            let args: QuoteArgs = parse_args(function, arguments)?;
            let quote = calculate_quote(
                &args.service,
                args.zone.unwrap_or(Zone::Paris),
                args.tier.unwrap_or(PriorityTier::P4),
                args.after_hours,
            );
            to_value(&quote)
        }
        "classify_priority" => {
            let args: PriorityArgs = parse_args(function, arguments)?;
            to_value(&classify_priority(&args.transcript, args.estimated_value_cents))
        }
        "evaluate_scheduling" => {
            let args: ScheduleArgs = parse_args(function, arguments)?;
            let window =
                evaluate_scheduling(&args.service, args.tier.unwrap_or(PriorityTier::P4));
            to_value(&window)
        }
        "notify_on_call" => {
            let args: NotifyArgs = parse_args(function, arguments)?;
            notify_on_call(state, correlation_id, args.message).await
        }
        other => Err(CalldockError::Validation(format!(
            "unknown function `{other}`"
        ))),
    }
}

/// Send the given message to every configured on-call recipient.
///
/// Runs inline because the voice agent is waiting on the result; outcomes
/// are still recorded per recipient.
async fn notify_on_call(
    state: &WebhookState,
    correlation_id: &str,
    message: String,
) -> Result<Value, CalldockError> {
    let notify = &state.config.notify;
    if !notify.enabled {
        info!(correlation_id, "notifications disabled, on-call alert skipped");
        return Ok(json!({ "dispatched": false, "reason": "notifications disabled" }));
    }
    if notify.on_call.is_empty() {
        return Err(CalldockError::Validation(
            "no on-call recipients configured".to_string(),
        ));
    }

    let job = NotificationJob {
        correlation_id: correlation_id.to_string(),
        recipients: notify.on_call.clone(),
        body: message,
    };
    let report = state.notifier.dispatch(job).await;
    record_outcomes(state.store.as_ref(), correlation_id, &report).await;

    Ok(json!({
        "dispatched": true,
        "delivered": report.delivered.len(),
        "failed": report.failed.len(),
        "complete": report.is_complete(),
    }))
}
