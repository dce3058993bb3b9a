// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic business rules for phone-intake classification.
//!
//! Four independent pure functions, each total for well-formed input:
//!
//! - [`validate_service`]: catalogue lookup with refused/restricted reasons
//! - [`classify_priority`]: fixed tie-break tier classification
//! - [`calculate_quote`]: price band in EUR cents with ordered surcharges
//! - [`evaluate_scheduling`]: relative window, never a calendar date
//!
//! All four are side-effect-free and safe to call concurrently across
//! simultaneous calls.

pub mod priority;
pub mod quote;
pub mod schedule;
pub mod service;

pub use priority::{classify_priority, HIGH_VALUE_THRESHOLD_CENTS};
pub use quote::{calculate_quote, QuoteEstimate, Zone};
pub use schedule::{evaluate_scheduling, SchedulingWindow};
pub use service::{needs_assessment, validate_service, RefusalReason, ServiceDecision};
