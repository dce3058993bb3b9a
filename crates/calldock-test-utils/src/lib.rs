// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Calldock integration tests.
//!
//! Provides a scriptable mock SMS gateway and a full-stack test harness
//! (temp SQLite store + webhook router + signing helper).

pub mod harness;
pub mod mock_gateway;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_gateway::MockSmsGateway;
