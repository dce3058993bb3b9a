// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Calldock intake backend.
//!
//! The taxonomy distinguishes failures by how they are handled: authentication
//! and validation errors are surfaced immediately and never retried, transient
//! downstream failures feed the retry and circuit-breaker machinery, and an
//! open circuit is its own distinct error so callers can degrade gracefully.

use thiserror::Error;

/// Machine-readable code carried by webhook authentication failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AuthErrorCode {
    /// No signature header was present on the request.
    #[strum(serialize = "MISSING_SIGNATURE")]
    MissingSignature,
    /// The computed keyed hash did not match the supplied signature.
    #[strum(serialize = "INVALID_SIGNATURE")]
    InvalidSignature,
}

/// The primary error type used across all Calldock crates.
#[derive(Debug, Error)]
pub enum CalldockError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook authentication failure. Fatal, mapped to HTTP 401, never retried.
    #[error("authentication failed: {code}")]
    Auth { code: AuthErrorCode },

    /// Malformed or unrecognized payload. Fatal, mapped to HTTP 400, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Payload exceeded the configured size cap. Rejected before hashing, HTTP 413.
    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Transient downstream failure (timeout, 5xx-equivalent). Retried per policy.
    #[error("transient downstream error: {message}")]
    Transient {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Fast-fail while a downstream dependency's circuit is open.
    #[error("circuit open for dependency `{dependency}`")]
    CircuitOpen { dependency: String },

    /// Operation exceeded its bounded timeout. Treated as transient.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Permanent failure from an outbound gateway (4xx-equivalent, bad request).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CalldockError {
    /// Returns true if this failure is worth retrying.
    ///
    /// Authentication, validation, and permanent gateway failures are never
    /// retried; transient downstream failures and timeouts are.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CalldockError::Transient { .. } | CalldockError::Timeout { .. }
        )
    }

    /// Convenience constructor for transient errors without a source.
    pub fn transient(message: impl Into<String>) -> Self {
        CalldockError::Transient {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_codes_render_wire_format() {
        assert_eq!(AuthErrorCode::MissingSignature.to_string(), "MISSING_SIGNATURE");
        assert_eq!(AuthErrorCode::InvalidSignature.to_string(), "INVALID_SIGNATURE");
    }

    #[test]
    fn transient_classification() {
        assert!(CalldockError::transient("503 from gateway").is_transient());
        assert!(
            CalldockError::Timeout {
                duration: std::time::Duration::from_secs(5)
            }
            .is_transient()
        );
        assert!(
            !CalldockError::Auth {
                code: AuthErrorCode::InvalidSignature
            }
            .is_transient()
        );
        assert!(!CalldockError::Validation("bad payload".into()).is_transient());
        assert!(
            !CalldockError::CircuitOpen {
                dependency: "sms".into()
            }
            .is_transient()
        );
        assert!(
            !CalldockError::Gateway {
                message: "400 from carrier".into(),
                source: None,
            }
            .is_transient()
        );
    }
}
