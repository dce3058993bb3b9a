// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for Calldock's downstream seams.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod gateway;
pub mod store;

pub use adapter::PluginAdapter;
pub use gateway::SmsGateway;
pub use store::RecordStore;
