// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Calldock workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a phone call, stable for the life of the call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

/// Unique identifier for a single tool invocation within a webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallId(pub String);

/// Lifecycle status of a call as reported by the voice platform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Ended,
}

/// Urgency tier driving the response-time SLA and notification routing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString,
    Serialize, Deserialize,
)]
pub enum PriorityTier {
    P1,
    P2,
    P3,
    P4,
}

impl PriorityTier {
    /// Default SLA deadline in seconds for this tier. P1 means immediate.
    pub fn default_sla_secs(self) -> u64 {
        match self {
            PriorityTier::P1 => 0,
            PriorityTier::P2 => 2 * 3600,
            PriorityTier::P3 => 24 * 3600,
            PriorityTier::P4 => 72 * 3600,
        }
    }
}

/// Output of the priority classifier.
///
/// Derived, never persisted on its own; always attached to a call record
/// or a quote request.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub tier: PriorityTier,
    /// Fixed reason code naming the rule that fired.
    pub reason: &'static str,
    /// SLA deadline in seconds; 0 means immediate response.
    pub sla_secs: u64,
}

/// Structured customer intake captured by the voice agent during a call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredIntake {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub requested_service: Option<String>,
    #[serde(default)]
    pub preferred_schedule: Option<String>,
}

/// Receipt returned by an SMS gateway on a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Provider-assigned message identifier.
    pub provider_id: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a downstream seam.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Gateway,
    Storage,
}

// --- Persisted record rows ---
//
// Canonical row types live here so they can cross the RecordStore trait
// boundary; calldock-storage re-exports them.

/// A persisted call record, created on the first event referencing a callId
/// and updated by subsequent events. Never deleted by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    /// One of queued/ringing/in-progress/ended (wire form of [`CallStatus`]).
    pub status: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub duration_secs: Option<i64>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    /// JSON-encoded [`StructuredIntake`], when the agent captured one.
    pub intake_json: Option<String>,
    /// JSON-encoded classification result, once the call has been classified.
    pub classification_json: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A persisted log row for one tool invocation and its resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallLog {
    pub tool_call_id: String,
    pub call_id: Option<String>,
    pub function: String,
    pub arguments_json: String,
    pub result_json: Option<String>,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub created_at: String,
}

/// A persisted per-recipient notification outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    /// Correlation id: the originating callId or toolCallId.
    pub correlation_id: String,
    pub recipient: String,
    /// Terminal state: "delivered" or "exhausted".
    pub status: String,
    pub attempts: i64,
    pub provider_id: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
}
