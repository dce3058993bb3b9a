// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `calldock check` command implementation.
//!
//! The configuration is already loaded and validated by the time this
//! runs (main exits with rendered diagnostics otherwise); this prints a
//! redacted summary for operators.

use calldock_config::CalldockConfig;

/// Prints a summary of the validated configuration.
pub fn run_check(config: &CalldockConfig) {
    println!("configuration OK");
    println!("  agent.name          = {}", config.agent.name);
    println!("  agent.log_level     = {}", config.agent.log_level);
    println!(
        "  server              = {}:{}",
        config.server.host, config.server.port
    );
    println!(
        "  webhook.secret      = {}",
        if config.webhook.secret.is_empty() {
            "(unset)"
        } else {
            "[redacted]"
        }
    );
    println!(
        "  webhook.max_payload = {} bytes",
        config.webhook.max_payload_bytes
    );
    println!("  notify.enabled      = {}", config.notify.enabled);
    println!(
        "  notify.on_call      = {} recipient(s)",
        config.notify.on_call.len()
    );
    println!(
        "  retry               = {} attempts, base {}ms, cap {}ms",
        config.retry.max_attempts, config.retry.base_delay_ms, config.retry.max_delay_ms
    );
    println!(
        "  breaker             = open after {} failures, probe after {}ms",
        config.breaker.failure_threshold, config.breaker.open_timeout_ms
    );
    println!("  runner.concurrency  = {}", config.runner.max_concurrency);
    println!("  storage.path        = {}", config.storage.database_path);
}
