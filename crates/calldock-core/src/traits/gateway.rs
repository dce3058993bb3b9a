// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS gateway trait for outbound alert delivery.

use async_trait::async_trait;

use crate::error::CalldockError;
use crate::traits::adapter::PluginAdapter;
use crate::types::SendReceipt;

/// Adapter for the SMS/telephony gateway.
///
/// The core assumes nothing about the transport beyond this result shape:
/// a successful send yields a provider-assigned message id, a failure yields
/// an error classified as transient or permanent for retry purposes.
#[async_trait]
pub trait SmsGateway: PluginAdapter {
    /// Sends a single message to one recipient.
    async fn send(&self, recipient: &str, body: &str) -> Result<SendReceipt, CalldockError>;
}
