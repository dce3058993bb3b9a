// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Calldock intake backend.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Calldock workspace. Downstream adapters
//! (SMS gateway, record store) implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AuthErrorCode, CalldockError};
pub use types::{
    AdapterType, CallId, CallRecord, CallStatus, Classification, HealthStatus,
    NotificationOutcome, PriorityTier, SendReceipt, StructuredIntake, ToolCallId,
    ToolCallLog,
};

// Re-export adapter traits at crate root.
pub use traits::{PluginAdapter, RecordStore, SmsGateway};
