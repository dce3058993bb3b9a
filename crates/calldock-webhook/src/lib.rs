// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook server for Calldock.
//!
//! Authenticates voice-platform callbacks with an HMAC-SHA256 signature
//! over the raw body, parses them into a closed set of typed events, and
//! dispatches each to its handler: lifecycle events feed the call store
//! and classification pipeline, tool-call invocations resolve against the
//! business rules, and urgent classifications fan out SMS alerts in the
//! background.

pub mod event;
pub mod handlers;
pub mod server;
pub mod signature;
pub mod tools;

pub use event::{parse_event, ToolInvocation, WebhookEvent};
pub use server::{router, start_server, WebhookState};
pub use signature::{sign, verify};
