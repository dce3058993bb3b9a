// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP server built on axum.
//!
//! Sets up routes, middleware, and the shared state handed to handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use calldock_config::CalldockConfig;
use calldock_core::{CalldockError, RecordStore};
use calldock_notify::Notifier;

use crate::handlers;

/// Shared state for axum request handlers.
///
/// The circuit-breaker registry lives inside the [`Notifier`]; beyond that
/// there is no cross-request mutable state.
#[derive(Clone)]
pub struct WebhookState {
    pub config: Arc<CalldockConfig>,
    pub store: Arc<dyn RecordStore>,
    pub notifier: Notifier,
    /// Tracks background fan-out tasks so shutdown can drain them.
    pub tracker: TaskTracker,
    pub started_at: Instant,
}

impl WebhookState {
    pub fn new(
        config: Arc<CalldockConfig>,
        store: Arc<dyn RecordStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
            tracker: TaskTracker::new(),
            started_at: Instant::now(),
        }
    }
}

/// Build the webhook router.
///
/// - POST /webhook (signature-authenticated event intake)
/// - GET /health (public liveness)
pub fn router(state: WebhookState) -> Router {
    // One byte above the configured cap so the handler's own size check can
    // produce the structured 413 body for boundary cases; anything larger is
    // rejected during body collection, also as 413.
    let body_limit = state.config.webhook.max_payload_bytes.saturating_add(1);
    Router::new()
        .route("/webhook", post(handlers::post_webhook))
        .route("/health", get(handlers::get_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the shutdown token fires.
///
/// Returns once the listener has drained; background fan-out tasks on the
/// state's tracker are the caller's responsibility to await.
pub async fn start_server(
    state: WebhookState,
    shutdown: CancellationToken,
) -> Result<(), CalldockError> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CalldockError::Internal(format!("failed to bind webhook server to {addr}: {e}")))?;

    tracing::info!("webhook server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| CalldockError::Internal(format!("webhook server error: {e}")))?;

    Ok(())
}
