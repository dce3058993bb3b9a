// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduling window evaluation.
//!
//! Produces a window description, never a fixed calendar date; concrete
//! booking happens downstream with a human in the loop.

use calldock_core::PriorityTier;
use serde::Serialize;

use crate::service::needs_assessment;

/// Proposed scheduling window for an intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulingWindow {
    /// Human-readable window, relative to the call.
    pub window: &'static str,
    /// Whether a technician must assess the site before work is booked.
    pub assessment_required: bool,
}

/// Evaluate the scheduling window for a service at a given urgency tier.
///
/// Deterministic and side-effect-free. Assessment-gated services keep
/// their tier's window for the assessment visit itself.
pub fn evaluate_scheduling(service: &str, tier: PriorityTier) -> SchedulingWindow {
    let window = match tier {
        PriorityTier::P1 => "dispatch immediately, on site within 4 hours",
        PriorityTier::P2 => "same business day",
        PriorityTier::P3 => "within 2 business days",
        PriorityTier::P4 => "within 5 business days",
    };

    SchedulingWindow {
        window,
        assessment_required: needs_assessment(service),
    }
}
