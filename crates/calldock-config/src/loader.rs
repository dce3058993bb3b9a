// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./calldock.toml` > `~/.config/calldock/calldock.toml`
//! > `/etc/calldock/calldock.toml` with environment variable overrides via the
//! `CALLDOCK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CalldockConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/calldock/calldock.toml` (system-wide)
/// 3. `~/.config/calldock/calldock.toml` (user XDG config)
/// 4. `./calldock.toml` (local directory)
/// 5. `CALLDOCK_*` environment variables
pub fn load_config() -> Result<CalldockConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<CalldockConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CalldockConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CalldockConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CalldockConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CalldockConfig::default()))
        .merge(Toml::file("/etc/calldock/calldock.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("calldock/calldock.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("calldock.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CALLDOCK_WEBHOOK_MAX_PAYLOAD_BYTES`
/// must map to `webhook.max_payload_bytes`, not `webhook.max.payload.bytes`.
fn env_provider() -> Env {
    Env::prefixed("CALLDOCK_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CALLDOCK_WEBHOOK_SECRET -> "webhook_secret"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("server_", "server.", 1)
            .replacen("webhook_", "webhook.", 1)
            .replacen("notify_", "notify.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("breaker_", "breaker.", 1)
            .replacen("runner_", "runner.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
