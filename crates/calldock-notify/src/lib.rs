// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound SMS notification for Calldock.
//!
//! [`TwilioGateway`] speaks the Messages API for a single recipient;
//! [`Notifier`] fans a job out to every on-call recipient through the
//! bounded runner, retry wrapper, and SMS circuit breaker, reporting
//! delivery per recipient.

pub mod fanout;
pub mod twilio;

pub use fanout::{
    Delivery, DeliveryFailure, DeliveryReport, NotificationJob, Notifier, SMS_DEPENDENCY,
};
pub use twilio::TwilioGateway;
