// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Calldock intake backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Calldock configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CalldockConfig {
    /// Process identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP server bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Inbound webhook authentication settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Outbound SMS notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Retry-with-backoff policy for downstream calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Circuit breaker thresholds for downstream dependencies.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Bounded-concurrency task runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service instance.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "calldock".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

/// Inbound webhook authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Shared secret for the keyed-hash signature. Empty disables serving.
    #[serde(default)]
    pub secret: String,

    /// Header carrying the `sha256=<hex>` signature of the raw body.
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Maximum accepted payload size in bytes. Enforced before hashing.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// Events with an embedded timestamp older than this window are rejected
    /// after signature validation (replay mitigation). 0 disables the check.
    #[serde(default = "default_clock_skew_secs")]
    pub clock_skew_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            signature_header: default_signature_header(),
            max_payload_bytes: default_max_payload_bytes(),
            clock_skew_secs: default_clock_skew_secs(),
        }
    }
}

fn default_signature_header() -> String {
    "x-calldock-signature".to_string()
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024
}

fn default_clock_skew_secs() -> u64 {
    300
}

/// Outbound SMS notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Enable outbound notifications. When false, alerts are logged only.
    #[serde(default = "default_notify_enabled")]
    pub enabled: bool,

    /// Base URL of the SMS gateway API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Gateway account identifier.
    #[serde(default)]
    pub account_sid: String,

    /// Gateway auth token.
    #[serde(default)]
    pub auth_token: String,

    /// Sender phone number in E.164 format.
    #[serde(default)]
    pub from_number: String,

    /// On-call recipient phone numbers for alert fan-out.
    #[serde(default)]
    pub on_call: Vec<String>,

    /// Per-send timeout in seconds. Exceeding it counts as a failure.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Grace period during which the webhook response waits for fan-out
    /// before detaching it to the background.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_notify_enabled(),
            api_base: default_api_base(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            on_call: Vec::new(),
            send_timeout_secs: default_send_timeout_secs(),
            grace_period_secs: default_grace_period_secs(),
        }
    }
}

fn default_notify_enabled() -> bool {
    false
}

fn default_api_base() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_grace_period_secs() -> u64 {
    2
}

/// Retry-with-backoff policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on any single retry delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier applied per attempt (typically 2.0).
    #[serde(default = "default_exponential_base")]
    pub exponential_base: f64,

    /// Whether to multiply delays by a uniform jitter factor in [0.5, 1.0].
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            exponential_base: default_exponential_base(),
            jitter: default_jitter(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_exponential_base() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

/// Circuit breaker configuration, one instance per downstream dependency.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Time the circuit stays open before allowing a half-open probe, in ms.
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_timeout_ms: default_open_timeout_ms(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_open_timeout_ms() -> u64 {
    30_000
}

/// Bounded-concurrency task runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Maximum number of tasks in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_max_concurrency() -> usize {
    4
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Upper bound in seconds on any single storage operation.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("calldock").join("calldock.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("calldock.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_query_timeout_secs() -> u64 {
    5
}

fn default_wal_mode() -> bool {
    true
}
