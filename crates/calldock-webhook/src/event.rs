// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed webhook event parsing and dispatch.
//!
//! The `type` discriminator is a closed set; anything else fails with a
//! validation error before reaching a handler. Variant payloads tolerate
//! extra fields because the voice platform adds them between releases, but
//! each variant enforces its own required-field contract (`call-ended`
//! requires `call.id` and `call.status`).

use serde::Deserialize;
use serde_json::Value;

use calldock_core::{CallStatus, CalldockError, StructuredIntake};

/// One inbound webhook event, dispatched on the `type` discriminator.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WebhookEvent {
    HealthCheck(HealthCheckEvent),
    CallStarted(CallLifecycleEvent),
    CallEnded(CallEndedEvent),
    Transcript(TranscriptEvent),
    ToolCalls(ToolCallsEvent),
    FunctionCall(FunctionCallEvent),
    Message(MessageEvent),
}

/// Platform liveness probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckEvent {
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Call identity and lifecycle attributes shared by call events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInfo {
    pub id: String,
    pub status: CallStatus,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<i64>,
}

/// `call-started`: a call entered the queue or began ringing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLifecycleEvent {
    pub call: CallInfo,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// `call-ended`: the full post-call payload driving classification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEndedEvent {
    pub call: CallInfo,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub intake: Option<StructuredIntake>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// `transcript`: an incremental or final transcript fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEvent {
    #[serde(default)]
    pub call_id: Option<String>,
    pub transcript: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// One function invocation within a `tool-calls` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_call_id: String,
    pub function: String,
    #[serde(default)]
    pub arguments: Value,
}

/// `tool-calls`: 0..N invocations, each resolved independently.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallsEvent {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolInvocation>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// `function-call`: legacy single-invocation form of `tool-calls`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallEvent {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
    pub function: String,
    #[serde(default)]
    pub arguments: Value,
}

/// `message`: free-text platform notice, acknowledged and logged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl WebhookEvent {
    /// Wire name of the discriminator, echoed back in responses.
    pub fn event_name(&self) -> &'static str {
        match self {
            WebhookEvent::HealthCheck(_) => "health-check",
            WebhookEvent::CallStarted(_) => "call-started",
            WebhookEvent::CallEnded(_) => "call-ended",
            WebhookEvent::Transcript(_) => "transcript",
            WebhookEvent::ToolCalls(_) => "tool-calls",
            WebhookEvent::FunctionCall(_) => "function-call",
            WebhookEvent::Message(_) => "message",
        }
    }

    /// Payload-embedded epoch-millisecond timestamp, when present.
    pub fn timestamp_ms(&self) -> Option<i64> {
        match self {
            WebhookEvent::HealthCheck(e) => e.timestamp,
            WebhookEvent::CallStarted(e) => e.timestamp,
            WebhookEvent::CallEnded(e) => e.timestamp,
            WebhookEvent::Transcript(e) => e.timestamp,
            WebhookEvent::ToolCalls(e) => e.timestamp,
            WebhookEvent::FunctionCall(_) => None,
            WebhookEvent::Message(e) => e.timestamp,
        }
    }

    /// The callId this event references, when it references one.
    pub fn call_id(&self) -> Option<&str> {
        match self {
            WebhookEvent::HealthCheck(_) => None,
            WebhookEvent::CallStarted(e) => Some(&e.call.id),
            WebhookEvent::CallEnded(e) => Some(&e.call.id),
            WebhookEvent::Transcript(e) => e.call_id.as_deref(),
            WebhookEvent::ToolCalls(e) => e.call_id.as_deref(),
            WebhookEvent::FunctionCall(e) => e.call_id.as_deref(),
            WebhookEvent::Message(e) => e.call_id.as_deref(),
        }
    }

    /// Semantic checks serde cannot express (non-empty identifiers, the
    /// endedAt >= startedAt invariant).
    pub fn validate(&self) -> Result<(), CalldockError> {
        match self {
            WebhookEvent::CallStarted(e) => validate_call(&e.call),
            WebhookEvent::CallEnded(e) => validate_call(&e.call),
            WebhookEvent::ToolCalls(e) => {
                for invocation in &e.tool_calls {
                    if invocation.tool_call_id.is_empty() {
                        return Err(CalldockError::Validation(
                            "tool invocation has an empty toolCallId".to_string(),
                        ));
                    }
                    if invocation.function.is_empty() {
                        return Err(CalldockError::Validation(format!(
                            "tool invocation `{}` has an empty function name",
                            invocation.tool_call_id
                        )));
                    }
                }
                Ok(())
            }
            WebhookEvent::FunctionCall(e) => {
                if e.function.is_empty() {
                    return Err(CalldockError::Validation(
                        "function-call event has an empty function name".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn validate_call(call: &CallInfo) -> Result<(), CalldockError> {
    if call.id.is_empty() {
        return Err(CalldockError::Validation(
            "call.id must be a non-empty string".to_string(),
        ));
    }
    if let (Some(started), Some(ended)) = (&call.started_at, &call.ended_at)
        && ended < started
    {
        return Err(CalldockError::Validation(format!(
            "call `{}` ended at {ended}, before it started at {started}",
            call.id
        )));
    }
    Ok(())
}

/// Parse and validate one raw event body.
///
/// Malformed JSON, unknown `type` values, and missing required fields all
/// surface as validation errors and never reach a handler.
pub fn parse_event(raw: &[u8]) -> Result<WebhookEvent, CalldockError> {
    let event: WebhookEvent = serde_json::from_slice(raw)
        .map_err(|err| CalldockError::Validation(format!("malformed event payload: {err}")))?;
    event.validate()?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_parses() {
        let event = parse_event(br#"{"type":"health-check"}"#).unwrap();
        assert_eq!(event.event_name(), "health-check");
        assert!(event.call_id().is_none());
    }

    #[test]
    fn call_ended_requires_call_id_and_status() {
        let ok = parse_event(
            br#"{"type":"call-ended","call":{"id":"call-1","status":"ended"}}"#,
        )
        .unwrap();
        assert_eq!(ok.call_id(), Some("call-1"));

        let missing_status =
            parse_event(br#"{"type":"call-ended","call":{"id":"call-1"}}"#);
        assert!(matches!(
            missing_status,
            Err(CalldockError::Validation(_))
        ));

        let missing_call = parse_event(br#"{"type":"call-ended"}"#);
        assert!(matches!(missing_call, Err(CalldockError::Validation(_))));
    }

    #[test]
    fn empty_call_id_is_rejected() {
        let err = parse_event(
            br#"{"type":"call-started","call":{"id":"","status":"ringing"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CalldockError::Validation(_)));
    }

    #[test]
    fn ended_before_started_is_rejected() {
        let err = parse_event(
            br#"{"type":"call-ended","call":{
                "id":"call-1","status":"ended",
                "startedAt":"2026-03-01T10:30:00Z","endedAt":"2026-03-01T10:00:00Z"
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CalldockError::Validation(_)));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = parse_event(br#"{"type":"call-paused"}"#).unwrap_err();
        assert!(matches!(err, CalldockError::Validation(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_event(b"{not json").unwrap_err();
        assert!(matches!(err, CalldockError::Validation(_)));
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let event = parse_event(
            br#"{"type":"call-started","platformVersion":"7.2",
                "call":{"id":"call-2","status":"ringing","region":"eu-west"}}"#,
        )
        .unwrap();
        assert_eq!(event.event_name(), "call-started");
    }

    #[test]
    fn tool_calls_parse_with_arguments() {
        let event = parse_event(
            br#"{"type":"tool-calls","callId":"call-3","toolCalls":[
                {"toolCallId":"tc-1","function":"validate_service",
                 "arguments":{"service":"fuite d'eau"}},
                {"toolCallId":"tc-2","function":"calculate_quote","arguments":{}}
            ]}"#,
        )
        .unwrap();
        match event {
            WebhookEvent::ToolCalls(e) => {
                assert_eq!(e.tool_calls.len(), 2);
                assert_eq!(e.tool_calls[0].function, "validate_service");
                assert_eq!(e.tool_calls[1].tool_call_id, "tc-2");
            }
            other => panic!("expected tool-calls, got {}", other.event_name()),
        }
    }

    #[test]
    fn empty_tool_call_id_is_rejected() {
        let err = parse_event(
            br#"{"type":"tool-calls","toolCalls":[
                {"toolCallId":"","function":"validate_service"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CalldockError::Validation(_)));
    }

    #[test]
    fn call_ended_carries_intake() {
        let event = parse_event(
            br#"{"type":"call-ended","call":{"id":"call-4","status":"ended"},
                "transcript":"fuite sous l'evier",
                "intake":{"customerName":"Mme Laurent","requestedService":"fuite"}}"#,
        )
        .unwrap();
        match event {
            WebhookEvent::CallEnded(e) => {
                let intake = e.intake.unwrap();
                assert_eq!(intake.customer_name.as_deref(), Some("Mme Laurent"));
                assert_eq!(intake.requested_service.as_deref(), Some("fuite"));
            }
            other => panic!("expected call-ended, got {}", other.event_name()),
        }
    }
}
