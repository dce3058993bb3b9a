// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry wrapper with exponential backoff and jitter.
//!
//! Wraps an async operation and retries it on transient failures, with a
//! delay of `min(base_delay * exponential_base^(n-1), max_delay)` before
//! attempt `n+1`, optionally scaled by a uniform jitter factor in [0.5, 1.0]
//! to avoid synchronized retry storms across concurrent callers.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use calldock_core::CalldockError;

/// Policy governing retry attempts and backoff delays.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (so 3 means up to 2 retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per attempt (typically 2.0).
    pub exponential_base: f64,
    /// Scale each delay by a uniform factor in [0.5, 1.0].
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Build a policy from raw millisecond values (as carried in config files).
    pub fn from_millis(
        max_attempts: u32,
        base_delay_ms: u64,
        max_delay_ms: u64,
        exponential_base: f64,
        jitter: bool,
    ) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
            exponential_base,
            jitter,
        }
    }

    /// Delay before retry attempt `attempt` (1-indexed: 1 is the first retry).
    ///
    /// Attempt 0 returns zero. Delays grow exponentially and are capped at
    /// `max_delay` before jitter is applied, so jitter can only shorten a
    /// capped delay, never exceed it.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let raw_ms = base_ms * self.exponential_base.powi(attempt as i32 - 1);
        let capped = Duration::from_millis(raw_ms as u64).min(self.max_delay);

        if self.jitter {
            let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
            Duration::from_millis((capped.as_millis() as f64 * factor) as u64)
        } else {
            capped
        }
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping between failures.
///
/// A failure is retried only while `condition(&err)` holds; errors the
/// condition rejects (auth, validation) surface immediately. Exhausting all
/// attempts surfaces the last error. Sleeps use the tokio timer, so many
/// retries can be in flight without blocking a worker thread each.
pub async fn retry<T, F, Fut, C>(
    policy: &RetryPolicy,
    condition: C,
    mut op: F,
) -> Result<T, CalldockError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CalldockError>>,
    C: Fn(&CalldockError) -> bool,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts || !condition(&err) {
                    if attempt > 1 {
                        warn!(attempt, error = %err, "retries exhausted");
                    }
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Retry with the default condition: transient and timeout errors only.
pub async fn retry_transient<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, CalldockError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CalldockError>>,
{
    retry(policy, CalldockError::is_transient, op).await
}
