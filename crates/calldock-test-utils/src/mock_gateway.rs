// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable mock SMS gateway for deterministic testing.
//!
//! `MockSmsGateway` implements `SmsGateway` with per-recipient failure
//! scripts, enabling retry and circuit-breaker scenarios without an
//! external carrier.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use calldock_core::{
    AdapterType, CalldockError, HealthStatus, PluginAdapter, SendReceipt, SmsGateway,
};

/// A mock SMS gateway with scripted per-recipient behavior.
///
/// By default every send succeeds. `fail_times` schedules N transient
/// failures before a recipient's sends start succeeding; `always_fail`
/// makes a recipient fail permanently with a gateway error.
pub struct MockSmsGateway {
    transient_failures: Mutex<HashMap<String, u32>>,
    permanent_failures: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, i64>>,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockSmsGateway {
    pub fn new() -> Self {
        Self {
            transient_failures: Mutex::new(HashMap::new()),
            permanent_failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Schedule `count` transient failures for `recipient` before success.
    pub fn fail_times(&self, recipient: &str, count: u32) {
        self.transient_failures
            .lock()
            .unwrap()
            .insert(recipient.to_string(), count);
    }

    /// Make every send to `recipient` fail with a permanent gateway error.
    pub fn always_fail(&self, recipient: &str) {
        self.permanent_failures
            .lock()
            .unwrap()
            .insert(recipient.to_string());
    }

    /// Number of send attempts made for `recipient`.
    pub fn calls_for(&self, recipient: &str) -> i64 {
        self.calls
            .lock()
            .unwrap()
            .get(recipient)
            .copied()
            .unwrap_or(0)
    }

    /// All successfully delivered `(recipient, body)` pairs, in send order.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockSmsGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSmsGateway {
    fn name(&self) -> &str {
        "mock-sms"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
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
impl SmsGateway for MockSmsGateway {
    async fn send(&self, recipient: &str, body: &str) -> Result<SendReceipt, CalldockError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let counter = calls.entry(recipient.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };

        if self.permanent_failures.lock().unwrap().contains(recipient) {
            return Err(CalldockError::Gateway {
                message: format!("carrier rejected {recipient}"),
                source: None,
            });
        }

        {
            let mut failures = self.transient_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(recipient) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(CalldockError::transient(format!(
                        "scripted failure for {recipient}"
                    )));
                }
            }
        }

        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), body.to_string()));
        Ok(SendReceipt {
            provider_id: format!("SM-{recipient}-{attempt}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_failures_then_success() {
        let gateway = MockSmsGateway::new();
        gateway.fail_times("+33611111111", 2);

        assert!(gateway.send("+33611111111", "alerte").await.is_err());
        assert!(gateway.send("+33611111111", "alerte").await.is_err());
        let receipt = gateway.send("+33611111111", "alerte").await.unwrap();
        assert!(receipt.provider_id.starts_with("SM-"));
        assert_eq!(gateway.calls_for("+33611111111"), 3);
        assert_eq!(gateway.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_transient() {
        let gateway = MockSmsGateway::new();
        gateway.always_fail("+33622222222");
        let err = gateway.send("+33622222222", "alerte").await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn unscripted_recipient_succeeds_immediately() {
        let gateway = MockSmsGateway::new();
        assert!(gateway.send("+33633333333", "alerte").await.is_ok());
        assert_eq!(gateway.calls_for("+33633333333"), 1);
    }
}
