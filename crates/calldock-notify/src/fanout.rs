// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification fan-out over the resilience primitives.
//!
//! Each recipient is an independent send through the bounded runner, with
//! every individual send wrapped in retry-with-backoff and the SMS-gateway
//! circuit breaker. Partial delivery is reported per recipient, never
//! collapsed into one boolean: urgent alerts may only need one successful
//! recipient, and that policy belongs to the caller.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use calldock_core::{CalldockError, SmsGateway};
use calldock_resilience::{retry_transient, run_bounded, CircuitRegistry, RetryPolicy};

/// Breaker key for the SMS gateway dependency.
pub const SMS_DEPENDENCY: &str = "sms-gateway";

/// One alert to deliver to a set of recipients.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    /// Originating callId or toolCallId, used to correlate outcomes.
    pub correlation_id: String,
    pub recipients: Vec<String>,
    pub body: String,
}

/// A successful per-recipient delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub recipient: String,
    pub provider_id: String,
    /// Total attempts including the successful one.
    pub attempts: i64,
}

/// A per-recipient failure after the retry budget was spent.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub recipient: String,
    pub attempts: i64,
    pub error: CalldockError,
}

/// Per-recipient outcome of one fan-out job.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<Delivery>,
    pub failed: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    /// Every recipient was delivered.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// At least one recipient was delivered (enough for urgent alerts).
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }
}

/// Fan-out engine: one shared gateway, retry policy, and breaker registry.
#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn SmsGateway + Send + Sync>,
    retry: RetryPolicy,
    registry: CircuitRegistry,
    max_concurrency: usize,
}

impl Notifier {
    pub fn new(
        gateway: Arc<dyn SmsGateway + Send + Sync>,
        retry: RetryPolicy,
        registry: CircuitRegistry,
        max_concurrency: usize,
    ) -> Self {
        Self {
            gateway,
            retry,
            registry,
            max_concurrency,
        }
    }

    /// Deliver a job to every recipient and report per-recipient outcomes.
    ///
    /// Each attempt passes through the SMS circuit breaker, so consecutive
    /// gateway failures across recipients accumulate toward opening it; a
    /// `CircuitOpen` error is not transient and ends that recipient's
    /// retries immediately.
    pub async fn dispatch(&self, job: NotificationJob) -> DeliveryReport {
        let tasks: Vec<_> = job
            .recipients
            .iter()
            .map(|recipient| {
                let recipient = recipient.clone();
                let body = job.body.clone();
                let gateway = self.gateway.clone();
                let retry = self.retry.clone();
                let breaker = self.registry.breaker(SMS_DEPENDENCY);
                move || async move {
                    let attempts = Arc::new(AtomicI64::new(0));
                    let counter = attempts.clone();
                    let result = retry_transient(&retry, move || {
                        let gateway = gateway.clone();
                        let breaker = breaker.clone();
                        let recipient = recipient.clone();
                        let body = body.clone();
                        counter.fetch_add(1, Ordering::SeqCst);
                        async move {
                            breaker
                                .call(|| async { gateway.send(&recipient, &body).await })
                                .await
                        }
                    })
                    .await;
                    // Carry the attempt count out alongside either outcome.
                    Ok::<_, CalldockError>((result, attempts.load(Ordering::SeqCst)))
                }
            })
            .collect();

        let outcomes = run_bounded(tasks, self.max_concurrency).await;

        let mut report = DeliveryReport::default();
        for (outcome, recipient) in outcomes.into_iter().zip(job.recipients.iter()) {
            // The task itself never errors; the send result rides inside.
            let (result, attempts) = match outcome.result {
                Ok(inner) => inner,
                Err(error) => (Err(error), 0),
            };
            match result {
                Ok(receipt) => {
                    info!(
                        correlation_id = %job.correlation_id,
                        recipient,
                        attempts,
                        provider_id = %receipt.provider_id,
                        "notification delivered"
                    );
                    report.delivered.push(Delivery {
                        recipient: recipient.clone(),
                        provider_id: receipt.provider_id,
                        attempts,
                    });
                }
                Err(error) => {
                    warn!(
                        correlation_id = %job.correlation_id,
                        recipient,
                        attempts,
                        error = %error,
                        "notification delivery failed"
                    );
                    report.failed.push(DeliveryFailure {
                        recipient: recipient.clone(),
                        attempts,
                        error,
                    });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use calldock_core::{
        AdapterType, HealthStatus, PluginAdapter, SendReceipt,
    };
    use calldock_resilience::BreakerPolicy;

    /// Scriptable gateway: fails the first N sends per recipient.
    struct FlakyGateway {
        failures_before_success: Mutex<HashMap<String, u32>>,
        calls: Mutex<HashMap<String, u32>>,
    }

    impl FlakyGateway {
        fn new(script: &[(&str, u32)]) -> Self {
            Self {
                failures_before_success: Mutex::new(
                    script
                        .iter()
                        .map(|(r, n)| (r.to_string(), *n))
                        .collect(),
                ),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn calls_for(&self, recipient: &str) -> u32 {
            *self.calls.lock().unwrap().get(recipient).unwrap_or(&0)
        }
    }

    #[async_trait]
    impl PluginAdapter for FlakyGateway {
        fn name(&self) -> &str {
            "flaky"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Gateway
        }
        async fn health_check(&self) -> Result<HealthStatus, CalldockError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), CalldockError> {
            Ok(())
        }
    }

    #[async_trait]
    impl SmsGateway for FlakyGateway {
        async fn send(&self, recipient: &str, _body: &str) -> Result<SendReceipt, CalldockError> {
            let call_n = {
                let mut calls = self.calls.lock().unwrap();
                let n = calls.entry(recipient.to_string()).or_insert(0);
                *n += 1;
                *n
            };
            let budget = *self
                .failures_before_success
                .lock()
                .unwrap()
                .get(recipient)
                .unwrap_or(&0);
            if call_n <= budget {
                Err(CalldockError::transient("gateway unavailable"))
            } else {
                Ok(SendReceipt {
                    provider_id: format!("SM-{recipient}-{call_n}"),
                })
            }
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            exponential_base: 2.0,
            jitter: false,
        }
    }

    fn notifier(gateway: Arc<FlakyGateway>, max_attempts: u32) -> Notifier {
        Notifier::new(
            gateway,
            fast_retry(max_attempts),
            CircuitRegistry::new(BreakerPolicy::from_millis(100, 60_000)),
            4,
        )
    }

    fn job(recipients: &[&str]) -> NotificationJob {
        NotificationJob {
            correlation_id: "call-1".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            body: "P1 inondation - 12 rue de la Pompe".to_string(),
        }
    }

    #[tokio::test]
    async fn all_recipients_delivered_on_clean_path() {
        let gateway = Arc::new(FlakyGateway::new(&[]));
        let report = notifier(gateway, 3).dispatch(job(&["+331", "+332"])).await;
        assert!(report.is_complete());
        assert_eq!(report.delivered.len(), 2);
        assert!(report.delivered.iter().all(|d| d.attempts == 1));
    }

    #[tokio::test]
    async fn flaky_recipient_delivered_on_third_attempt() {
        // Recipient 2 fails twice, then succeeds on retry 3.
        let gateway = Arc::new(FlakyGateway::new(&[("+332", 2)]));
        let report = notifier(gateway.clone(), 3)
            .dispatch(job(&["+331", "+332", "+333"]))
            .await;

        assert!(report.is_complete(), "all three should deliver: {report:?}");
        assert_eq!(report.delivered.len(), 3);
        let flaky = report
            .delivered
            .iter()
            .find(|d| d.recipient == "+332")
            .unwrap();
        assert_eq!(flaky.attempts, 3);
        assert_eq!(gateway.calls_for("+332"), 3);
        assert_eq!(gateway.calls_for("+331"), 1);
    }

    #[tokio::test]
    async fn exhausted_recipient_reported_failed_others_delivered() {
        let gateway = Arc::new(FlakyGateway::new(&[("+332", 10)]));
        let report = notifier(gateway, 3).dispatch(job(&["+331", "+332"])).await;

        assert!(!report.is_complete());
        assert!(report.any_delivered());
        assert_eq!(report.delivered.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].recipient, "+332");
        assert_eq!(report.failed[0].attempts, 3);
    }

    #[tokio::test]
    async fn open_circuit_fails_fast_without_retries() {
        let gateway = Arc::new(FlakyGateway::new(&[("+331", 100)]));
        // Threshold 1: the first failure opens the circuit.
        let registry = CircuitRegistry::new(BreakerPolicy::from_millis(1, 60_000));
        let notifier = Notifier::new(gateway.clone(), fast_retry(5), registry, 1);

        let report = notifier.dispatch(job(&["+331", "+332"])).await;
        assert!(!report.is_complete());
        // Second recipient hit the open circuit, not the gateway.
        assert!(report
            .failed
            .iter()
            .any(|f| matches!(f.error, CalldockError::CircuitOpen { .. })));
        assert_eq!(gateway.calls_for("+332"), 0);
    }

    #[tokio::test]
    async fn empty_recipient_list_is_trivially_complete() {
        let gateway = Arc::new(FlakyGateway::new(&[]));
        let report = notifier(gateway, 3).dispatch(job(&[])).await;
        assert!(report.is_complete());
        assert!(!report.any_delivered());
    }
}
