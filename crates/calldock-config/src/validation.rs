// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive retry parameters, payload size floors, and notification
//! credentials when notifications are enabled.

use crate::diagnostic::ConfigError;
use crate::model::CalldockConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CalldockConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty
    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    // Validate host looks like a valid IP or hostname
    if !config.server.host.trim().is_empty() {
        let addr = config.server.host.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{addr}` is not a valid IP address or hostname"),
            });
        }
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.query_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.query_timeout_secs must be greater than 0".to_string(),
        });
    }

    // Payload cap below 1 KiB rejects every realistic webhook body
    if config.webhook.max_payload_bytes < 1024 {
        errors.push(ConfigError::Validation {
            message: format!(
                "webhook.max_payload_bytes must be at least 1024, got {}",
                config.webhook.max_payload_bytes
            ),
        });
    }

    if config.retry.max_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.max_attempts must be at least 1, got {}",
                config.retry.max_attempts
            ),
        });
    }

    if config.retry.base_delay_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.base_delay_ms must be greater than 0".to_string(),
        });
    }

    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.max_delay_ms ({}) must be at least retry.base_delay_ms ({})",
                config.retry.max_delay_ms, config.retry.base_delay_ms
            ),
        });
    }

    if config.retry.exponential_base < 1.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.exponential_base must be at least 1.0, got {}",
                config.retry.exponential_base
            ),
        });
    }

    if config.breaker.failure_threshold < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "breaker.failure_threshold must be at least 1, got {}",
                config.breaker.failure_threshold
            ),
        });
    }

    if config.runner.max_concurrency < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "runner.max_concurrency must be at least 1, got {}",
                config.runner.max_concurrency
            ),
        });
    }

    // Notification credentials are only required when fan-out is enabled
    if config.notify.enabled {
        if config.notify.account_sid.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "notify.account_sid must not be empty when notify.enabled is true"
                    .to_string(),
            });
        }
        if config.notify.auth_token.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "notify.auth_token must not be empty when notify.enabled is true"
                    .to_string(),
            });
        }
        if config.notify.from_number.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "notify.from_number must not be empty when notify.enabled is true"
                    .to_string(),
            });
        }
        if config.notify.on_call.is_empty() {
            errors.push(ConfigError::Validation {
                message: "notify.on_call must list at least one recipient when notify.enabled is true"
                    .to_string(),
            });
        }
        for (i, recipient) in config.notify.on_call.iter().enumerate() {
            if recipient.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: format!("notify.on_call[{i}] must not be empty"),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CalldockConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = CalldockConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_query_timeout_fails_validation() {
        let mut config = CalldockConfig::default();
        config.storage.query_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("query_timeout_secs"))));
    }

    #[test]
    fn tiny_payload_cap_fails_validation() {
        let mut config = CalldockConfig::default();
        config.webhook.max_payload_bytes = 512;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_payload_bytes"))));
    }

    #[test]
    fn zero_retry_attempts_fails_validation() {
        let mut config = CalldockConfig::default();
        config.retry.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_attempts"))));
    }

    #[test]
    fn max_delay_below_base_delay_fails_validation() {
        let mut config = CalldockConfig::default();
        config.retry.base_delay_ms = 5000;
        config.retry.max_delay_ms = 1000;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_delay_ms"))));
    }

    #[test]
    fn sub_unit_exponential_base_fails_validation() {
        let mut config = CalldockConfig::default();
        config.retry.exponential_base = 0.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("exponential_base"))));
    }

    #[test]
    fn enabled_notify_without_credentials_fails_validation() {
        let mut config = CalldockConfig::default();
        config.notify.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("account_sid"))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("on_call"))));
    }

    #[test]
    fn disabled_notify_skips_credential_checks() {
        let config = CalldockConfig::default();
        assert!(!config.notify.enabled);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn enabled_notify_with_full_credentials_passes() {
        let mut config = CalldockConfig::default();
        config.notify.enabled = true;
        config.notify.account_sid = "AC123".to_string();
        config.notify.auth_token = "token".to_string();
        config.notify.from_number = "+33100000000".to_string();
        config.notify.on_call = vec!["+33611111111".to_string()];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn multiple_errors_collected_in_one_pass() {
        let mut config = CalldockConfig::default();
        config.server.host = "".to_string();
        config.storage.database_path = "".to_string();
        config.runner.max_concurrency = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
