// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breaker for named downstream dependencies.
//!
//! States: Closed (pass-through) -> Open (after `failure_threshold`
//! consecutive failures; calls fail fast with `CalldockError::CircuitOpen`)
//! -> HalfOpen (after `open_timeout` elapses, one probe call is allowed) ->
//! Closed on probe success, back to Open on probe failure.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use calldock_core::CalldockError;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Dependency considered down, calls fail fast.
    Open,
    /// Probing recovery, one call allowed through.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Configuration for a single breaker.
#[derive(Debug, Clone)]
pub struct BreakerPolicy {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing a probe.
    pub open_timeout: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
        }
    }
}

impl BreakerPolicy {
    /// Build a policy from raw config values.
    pub fn from_millis(failure_threshold: u32, open_timeout_ms: u64) -> Self {
        Self {
            failure_threshold,
            open_timeout: Duration::from_millis(open_timeout_ms),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding one named downstream dependency.
///
/// The state transition (consecutive-failure counter plus open/close flip)
/// is the critical section; it lives behind an async mutex so concurrent
/// callers observe transitions atomically.
pub struct CircuitBreaker {
    name: String,
    policy: BreakerPolicy,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, policy: BreakerPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// The dependency name this breaker guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, transitioning Open -> HalfOpen if the timeout elapsed.
    pub async fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().await;
        self.maybe_half_open(&mut inner);
        inner.state
    }

    /// Run `op` under the breaker.
    ///
    /// Fails fast with `CalldockError::CircuitOpen` while the circuit is
    /// open. In half-open, exactly the caller that observes the transition
    /// runs as the probe; its outcome decides whether the circuit closes
    /// or re-opens.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, CalldockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CalldockError>>,
    {
        let probing = {
            let mut inner = self.inner.lock().await;
            self.maybe_half_open(&mut inner);
            match inner.state {
                CircuitState::Closed => false,
                CircuitState::HalfOpen => {
                    // Claim the probe slot: concurrent callers see Open.
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    true
                }
                CircuitState::Open => {
                    return Err(CalldockError::CircuitOpen {
                        dependency: self.name.clone(),
                    });
                }
            }
        };

        match op().await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure(probing).await;
                Err(err)
            }
        }
    }

    async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != CircuitState::Closed {
            info!(dependency = %self.name, "circuit closed after successful probe");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    async fn record_failure(&self, probing: bool) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures += 1;
        if probing {
            // Probe failed: stay open and restart the timeout.
            warn!(dependency = %self.name, "probe failed, circuit re-opened");
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        } else if inner.consecutive_failures >= self.policy.failure_threshold
            && inner.state == CircuitState::Closed
        {
            warn!(
                dependency = %self.name,
                failures = inner.consecutive_failures,
                "failure threshold reached, circuit opened"
            );
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        } else {
            debug!(
                dependency = %self.name,
                failures = inner.consecutive_failures,
                "failure recorded"
            );
        }
    }

    fn maybe_half_open(&self, inner: &mut BreakerInner) {
        if inner.state == CircuitState::Open
            && let Some(opened_at) = inner.opened_at
            && opened_at.elapsed() >= self.policy.open_timeout
        {
            debug!(dependency = %self.name, "open timeout elapsed, circuit half-open");
            inner.state = CircuitState::HalfOpen;
        }
    }
}

/// Registry of circuit breakers keyed by dependency name.
///
/// Owned by the application and injected where needed; callers share one
/// breaker per dependency name so failure counts accumulate process-wide.
#[derive(Clone)]
pub struct CircuitRegistry {
    policy: BreakerPolicy,
    breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitRegistry {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            breakers: Arc::new(DashMap::new()),
        }
    }

    /// Get or create the breaker for `dependency`.
    pub fn breaker(&self, dependency: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(dependency.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(dependency, self.policy.clone()))
            })
            .clone()
    }
}
