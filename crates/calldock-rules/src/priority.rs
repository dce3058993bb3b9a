// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Priority classification from call transcript keywords and job value.
//!
//! Fixed tie-break order: P1 emergency keywords beat P2 municipal-client
//! keywords beat P3 high-value threshold beats the P4 default. First
//! matching rule wins; there is no scoring or averaging, so a transcript
//! containing both a P1 and a P3 signal always classifies P1.

use calldock_core::{Classification, PriorityTier};

/// Emergency indicators (substring match on the lowercased transcript).
const P1_KEYWORDS: &[&str] = &[
    "inondation",
    "urgence",
    "urgent",
    "dégât des eaux",
    "degat des eaux",
    "fuite majeure",
    "eau partout",
    "plus d'eau",
];

/// Municipal and institutional clients get next-tier treatment.
const P2_KEYWORDS: &[&str] = &[
    "mairie",
    "municipal",
    "municipale",
    "collectivité",
    "collectivite",
    "école",
    "ecole",
    "syndic",
];

/// Estimated job value at or above this classifies P3 (1500 EUR).
pub const HIGH_VALUE_THRESHOLD_CENTS: u64 = 150_000;

/// Classify a call into a priority tier.
///
/// Deterministic and side-effect-free. `estimated_value_cents` is the
/// value extracted from the call, when the caller gave one.
pub fn classify_priority(transcript: &str, estimated_value_cents: Option<u64>) -> Classification {
    let lower = transcript.to_lowercase();

    if let Some(keyword) = P1_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        tracing::debug!(keyword, "emergency keyword matched");
        return Classification {
            tier: PriorityTier::P1,
            reason: "emergency keyword in transcript",
            sla_secs: PriorityTier::P1.default_sla_secs(),
        };
    }

    if P2_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Classification {
            tier: PriorityTier::P2,
            reason: "municipal or institutional client",
            sla_secs: PriorityTier::P2.default_sla_secs(),
        };
    }

    if let Some(value) = estimated_value_cents
        && value >= HIGH_VALUE_THRESHOLD_CENTS
    {
        return Classification {
            tier: PriorityTier::P3,
            reason: "estimated value above threshold",
            sla_secs: PriorityTier::P3.default_sla_secs(),
        };
    }

    Classification {
        tier: PriorityTier::P4,
        reason: "standard request",
        sla_secs: PriorityTier::P4.default_sla_secs(),
    }
}
