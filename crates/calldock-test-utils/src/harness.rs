// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full intake stack: a temp SQLite store, a
//! scriptable mock SMS gateway, the notifier, and the webhook router.
//! `post_event()` signs a body and drives it through the router in-process.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use calldock_config::model::StorageConfig;
use calldock_config::CalldockConfig;
use calldock_core::{CalldockError, RecordStore};
use calldock_notify::Notifier;
use calldock_resilience::{BreakerPolicy, CircuitRegistry, RetryPolicy};
use calldock_storage::SqliteStore;
use calldock_webhook::server::{router, WebhookState};
use calldock_webhook::signature;

use crate::mock_gateway::MockSmsGateway;

const TEST_SECRET: &str = "harness-webhook-secret";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    on_call: Vec<String>,
    notify_enabled: bool,
    max_attempts: u32,
    failure_threshold: u32,
    fail_plan: Vec<(String, u32)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            on_call: Vec::new(),
            notify_enabled: false,
            max_attempts: 3,
            failure_threshold: 100,
            fail_plan: Vec::new(),
        }
    }

    /// Enable notifications with the given on-call recipients.
    pub fn with_on_call(mut self, recipients: Vec<String>) -> Self {
        self.notify_enabled = true;
        self.on_call = recipients;
        self
    }

    /// Set the retry budget used by the notifier.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the SMS circuit-breaker failure threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Script `count` transient send failures for `recipient`.
    pub fn with_flaky_recipient(mut self, recipient: &str, count: u32) -> Self {
        self.fail_plan.push((recipient.to_string(), count));
        self
    }

    /// Build the harness, creating the temp store and full webhook state.
    pub async fn build(self) -> Result<TestHarness, CalldockError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| CalldockError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("calldock-test.db");

        let store = Arc::new(SqliteStore::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
            query_timeout_secs: 5,
        }));
        store.initialize().await?;

        let gateway = Arc::new(MockSmsGateway::new());
        for (recipient, count) in &self.fail_plan {
            gateway.fail_times(recipient, *count);
        }

        let mut config = CalldockConfig::default();
        config.webhook.secret = TEST_SECRET.to_string();
        config.notify.enabled = self.notify_enabled;
        config.notify.on_call = self.on_call;
        config.notify.grace_period_secs = 5;
        config.retry.max_attempts = self.max_attempts;
        config.retry.base_delay_ms = 1;
        config.retry.max_delay_ms = 10;
        config.retry.jitter = false;

        let notifier = Notifier::new(
            gateway.clone(),
            RetryPolicy::from_millis(
                config.retry.max_attempts,
                config.retry.base_delay_ms,
                config.retry.max_delay_ms,
                config.retry.exponential_base,
                config.retry.jitter,
            ),
            CircuitRegistry::new(BreakerPolicy::from_millis(self.failure_threshold, 1_000)),
            config.runner.max_concurrency,
        );

        let state = WebhookState::new(Arc::new(config), store.clone(), notifier);

        Ok(TestHarness {
            state,
            store,
            gateway,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired intake stack backed by mocks and a temp database.
pub struct TestHarness {
    pub state: WebhookState,
    pub store: Arc<SqliteStore>,
    pub gateway: Arc<MockSmsGateway>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sign `body` with the harness secret, `sha256=<hex>` form.
    pub fn sign(&self, body: &[u8]) -> String {
        signature::sign(body, TEST_SECRET)
    }

    /// POST a signed event body to /webhook and return (status, JSON body).
    pub async fn post_event(&self, body: &str) -> (StatusCode, Value) {
        let header = self.sign(body.as_bytes());
        self.post_raw(body, Some(header)).await
    }

    /// POST an unsigned (or custom-signed) body to /webhook.
    pub async fn post_raw(&self, body: &str, header: Option<String>) -> (StatusCode, Value) {
        let app = router(self.state.clone());
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some(value) = header {
            builder = builder.header(
                self.state.config.webhook.signature_header.as_str(),
                value,
            );
        }
        // Request construction only fails on invalid parts, not in tests.
        let request = builder
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| Request::new(Body::empty()));
        let response = match app.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Wait for background fan-out tasks spawned by handlers to finish.
    pub async fn drain_background(&self) {
        self.state.tracker.close();
        self.state.tracker.wait().await;
    }
}
