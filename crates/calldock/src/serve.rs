// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `calldock serve` command implementation.
//!
//! Wires the full intake stack: SQLite store, Twilio gateway, circuit
//! registry, notifier, and the webhook server. Supports graceful shutdown
//! via signal handlers, draining background fan-outs within the configured
//! grace period before closing storage.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use calldock_config::CalldockConfig;
use calldock_core::{CalldockError, RecordStore};
use calldock_notify::{Notifier, TwilioGateway};
use calldock_resilience::{BreakerPolicy, CircuitRegistry, RetryPolicy};
use calldock_storage::SqliteStore;
use calldock_webhook::server::{start_server, WebhookState};

use crate::shutdown;

/// Runs the `calldock serve` command.
pub async fn run_serve(config: CalldockConfig) -> Result<(), CalldockError> {
    init_tracing(&config.agent.log_level);

    info!("starting calldock serve");

    if config.webhook.secret.is_empty() {
        return Err(CalldockError::Config(
            "webhook.secret must be set to serve; \
             inbound events cannot be authenticated without it"
                .to_string(),
        ));
    }

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;

    let registry = CircuitRegistry::new(BreakerPolicy::from_millis(
        config.breaker.failure_threshold,
        config.breaker.open_timeout_ms,
    ));
    let retry = RetryPolicy::from_millis(
        config.retry.max_attempts,
        config.retry.base_delay_ms,
        config.retry.max_delay_ms,
        config.retry.exponential_base,
        config.retry.jitter,
    );
    let gateway = Arc::new(TwilioGateway::new(&config.notify)?);
    let notifier = Notifier::new(gateway, retry, registry, config.runner.max_concurrency);

    if config.notify.enabled {
        info!(
            recipients = config.notify.on_call.len(),
            "notifications enabled"
        );
    } else {
        info!("notifications disabled, urgent calls will only be recorded");
    }

    let config = Arc::new(config);
    let state = WebhookState::new(config.clone(), store.clone(), notifier);
    let tracker = state.tracker.clone();

    let cancel = shutdown::install_signal_handler();
    start_server(state, cancel).await?;

    // Listener is down; let in-flight fan-outs finish within the grace
    // period, then close storage.
    tracker.close();
    let grace = Duration::from_secs(config.notify.grace_period_secs);
    if tokio::time::timeout(grace, tracker.wait()).await.is_err() {
        warn!(
            grace_secs = config.notify.grace_period_secs,
            "grace period elapsed with fan-outs still in flight"
        );
    }

    store.close().await?;
    info!("calldock serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("calldock={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
