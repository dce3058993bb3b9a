// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for Calldock's outward calls.
//!
//! Every downstream interaction (SMS gateway, storage) goes through some
//! combination of these three primitives:
//!
//! - [`retry`] — exponential backoff with jitter around a single operation
//! - [`breaker`] — per-dependency circuit breaking with fail-fast
//! - [`runner`] — bounded-concurrency batch execution with isolated failures

pub mod breaker;
pub mod retry;
pub mod runner;

pub use breaker::{BreakerPolicy, CircuitBreaker, CircuitRegistry, CircuitState};
pub use retry::{retry, retry_transient, RetryPolicy};
pub use runner::{map_reduce, run_bounded, run_chunked, TaskOutcome};
