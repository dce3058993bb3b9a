// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed-hash authentication of inbound webhook requests.
//!
//! The voice platform signs the raw request body with HMAC-SHA256 over a
//! shared secret and sends the digest as `sha256=<hex>` in a configurable
//! header. Verification operates on the exact raw bytes as received, before
//! any JSON parsing, so re-serialization cannot bypass it. The size cap is
//! enforced before hashing to bound CPU work on unauthenticated input.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use calldock_core::{AuthErrorCode, CalldockError};

type HmacSha256 = Hmac<Sha256>;

/// Scheme prefix carried by the signature header.
const SCHEME_PREFIX: &str = "sha256=";

/// Reject payloads larger than `limit` before any hashing happens.
pub fn enforce_size_limit(raw: &[u8], limit: usize) -> Result<(), CalldockError> {
    if raw.len() > limit {
        return Err(CalldockError::PayloadTooLarge {
            size: raw.len(),
            limit,
        });
    }
    Ok(())
}

/// Compute the `sha256=<hex>` signature of `raw` under `secret`.
///
/// Used by outbound test helpers and by operators signing replayed events.
pub fn sign(raw: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length; new_from_slice cannot fail here.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(raw);
    format!("{SCHEME_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify the header-supplied signature against the raw request bytes.
///
/// A missing or empty header fails with `MISSING_SIGNATURE`; a malformed
/// or non-matching digest fails with `INVALID_SIGNATURE`. The comparison
/// is constant-time via `Mac::verify_slice`.
pub fn verify(
    raw: &[u8],
    header_value: Option<&str>,
    secret: &str,
) -> Result<(), CalldockError> {
    let header = match header_value {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => {
            return Err(CalldockError::Auth {
                code: AuthErrorCode::MissingSignature,
            });
        }
    };

    let invalid = || CalldockError::Auth {
        code: AuthErrorCode::InvalidSignature,
    };

    let hex_digest = header.strip_prefix(SCHEME_PREFIX).ok_or_else(invalid)?;
    let digest = hex::decode(hex_digest).map_err(|_| invalid())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| invalid())?;
    mac.update(raw);
    mac.verify_slice(&digest).map_err(|_| invalid())
}

/// Soft replay check on a payload-embedded epoch-millisecond timestamp.
///
/// Applied only after signature validation succeeds; a valid signature with
/// a stale timestamp indicates a replayed capture, not a forgery. A skew
/// window of 0 disables the check.
pub fn check_clock_skew(
    timestamp_ms: Option<i64>,
    skew_secs: u64,
    now_ms: i64,
) -> Result<(), CalldockError> {
    if skew_secs == 0 {
        return Ok(());
    }
    if let Some(ts) = timestamp_ms {
        let age_secs = (now_ms - ts).abs() / 1000;
        if age_secs > skew_secs as i64 {
            return Err(CalldockError::Validation(format!(
                "event timestamp is {age_secs}s outside the {skew_secs}s clock-skew window"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "test-webhook-secret";

    #[test]
    fn sign_then_verify_accepts() {
        let body = br#"{"type":"health-check"}"#;
        let header = sign(body, SECRET);
        assert!(header.starts_with("sha256="));
        assert!(verify(body, Some(&header), SECRET).is_ok());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let body = br#"{"type":"health-check"}"#;
        let header = sign(body, SECRET);
        let err = verify(body, Some(&header), "other-secret").unwrap_err();
        assert!(matches!(
            err,
            CalldockError::Auth {
                code: AuthErrorCode::InvalidSignature
            }
        ));
    }

    #[test]
    fn missing_header_is_distinct_from_invalid() {
        let body = b"payload";
        for header in [None, Some(""), Some("   ")] {
            let err = verify(body, header, SECRET).unwrap_err();
            assert!(matches!(
                err,
                CalldockError::Auth {
                    code: AuthErrorCode::MissingSignature
                }
            ));
        }
    }

    #[test]
    fn missing_scheme_prefix_is_invalid() {
        let body = b"payload";
        let bare_hex = sign(body, SECRET).trim_start_matches("sha256=").to_string();
        let err = verify(body, Some(&bare_hex), SECRET).unwrap_err();
        assert!(matches!(
            err,
            CalldockError::Auth {
                code: AuthErrorCode::InvalidSignature
            }
        ));
    }

    #[test]
    fn non_hex_digest_is_invalid() {
        let err = verify(b"payload", Some("sha256=not-hex!"), SECRET).unwrap_err();
        assert!(matches!(err, CalldockError::Auth { .. }));
    }

    #[test]
    fn size_limit_rejects_before_hashing() {
        let body = vec![0u8; 2048];
        let err = enforce_size_limit(&body, 1024).unwrap_err();
        assert!(matches!(
            err,
            CalldockError::PayloadTooLarge {
                size: 2048,
                limit: 1024
            }
        ));
        assert!(enforce_size_limit(&body, 2048).is_ok());
    }

    #[test]
    fn clock_skew_rejects_stale_and_future_timestamps() {
        let now = 1_700_000_000_000i64;
        assert!(check_clock_skew(Some(now - 10_000), 300, now).is_ok());
        assert!(check_clock_skew(Some(now - 301_000), 300, now).is_err());
        assert!(check_clock_skew(Some(now + 301_000), 300, now).is_err());
        assert!(check_clock_skew(None, 300, now).is_ok());
        // 0 disables the check entirely.
        assert!(check_clock_skew(Some(0), 0, now).is_ok());
    }

    proptest! {
        #[test]
        fn round_trip_verifies_for_any_payload(
            payload in proptest::collection::vec(any::<u8>(), 0..512),
            secret in "[a-zA-Z0-9]{1,64}",
        ) {
            let header = sign(&payload, &secret);
            prop_assert!(verify(&payload, Some(&header), &secret).is_ok());
        }

        #[test]
        fn different_secret_never_verifies(
            payload in proptest::collection::vec(any::<u8>(), 0..512),
            secret in "[a-z]{8,32}",
            other in "[A-Z]{8,32}",
        ) {
            let header = sign(&payload, &secret);
            prop_assert!(verify(&payload, Some(&header), &other).is_err());
        }

        #[test]
        fn single_byte_tamper_invalidates(
            payload in proptest::collection::vec(any::<u8>(), 1..512),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let header = sign(&payload, SECRET);
            let mut tampered = payload.clone();
            let i = index.index(tampered.len());
            tampered[i] ^= flip;
            prop_assert!(verify(&tampered, Some(&header), SECRET).is_err());
        }
    }
}
