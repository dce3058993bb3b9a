// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio-style SMS gateway client.
//!
//! Speaks the Messages API: form-encoded POST with basic auth, one request
//! per recipient. Retry and circuit breaking live in the fan-out layer,
//! not here; this client only classifies failures as transient or
//! permanent so the resilience wrappers can decide.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use calldock_config::model::NotifyConfig;
use calldock_core::{
    AdapterType, CalldockError, HealthStatus, PluginAdapter, SendReceipt, SmsGateway,
};

/// HTTP client for a Twilio-compatible Messages endpoint.
pub struct TwilioGateway {
    client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

/// The subset of the Messages API response we care about.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

impl TwilioGateway {
    /// Build a gateway from the notify config section.
    pub fn new(config: &NotifyConfig) -> Result<Self, CalldockError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_secs))
            .build()
            .map_err(|e| CalldockError::Gateway {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.api_base = base_url.trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.api_base, self.account_sid)
    }
}

#[async_trait]
impl PluginAdapter for TwilioGateway {
    fn name(&self) -> &str {
        "twilio"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, CalldockError> {
        // No cheap ping endpoint; a configured gateway is assumed healthy
        // and actual sends report their own failures.
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Ok(HealthStatus::Unhealthy("missing credentials".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CalldockError> {
        Ok(())
    }
}

#[async_trait]
impl SmsGateway for TwilioGateway {
    async fn send(&self, recipient: &str, body: &str) -> Result<SendReceipt, CalldockError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", recipient),
                ("From", self.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| {
                // Connection failures and client-side timeouts are transient.
                CalldockError::Transient {
                    message: format!("SMS request failed: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;

        let status = response.status();
        debug!(status = %status, recipient, "SMS gateway response");

        if status.is_success() {
            let parsed: MessageResponse =
                response.json().await.map_err(|e| CalldockError::Gateway {
                    message: format!("failed to parse gateway response: {e}"),
                    source: Some(Box::new(e)),
                })?;
            return Ok(SendReceipt {
                provider_id: parsed.sid,
            });
        }

        let body_text = response.text().await.unwrap_or_default();
        if is_transient_status(status) {
            Err(CalldockError::Transient {
                message: format!("gateway returned {status}: {body_text}"),
                source: None,
            })
        } else {
            Err(CalldockError::Gateway {
                message: format!("gateway returned {status}: {body_text}"),
                source: None,
            })
        }
    }
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
