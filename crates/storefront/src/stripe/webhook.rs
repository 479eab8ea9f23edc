//! `Stripe-Signature` header verification.
//!
//! The header carries `t=<unix seconds>` and one or more `v1=<hex hmac>`
//! entries. The HMAC-SHA256 is computed over `"{t}.{raw body}"` with the
//! endpoint's signing secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed payload.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Reasons a webhook signature is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing or malformed Stripe-Signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("no matching signature")]
    Mismatch,
}

/// Verify a webhook payload against its `Stripe-Signature` header.
///
/// # Errors
///
/// Returns the reason the signature was rejected.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    let age = now
        .checked_sub(timestamp)
        .map(i64::unsigned_abs)
        .ok_or(SignatureError::Expired)?;
    if age > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    let matched = signatures.into_iter().any(|signature| {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Compute the `v1` signature for a payload (used to build test headers).
#[must_use]
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_abc123";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn test_valid_signature() {
        let header = format!("t=1700000000,v1={}", sign(BODY, SECRET, 1_700_000_000));
        assert_eq!(
            verify_signature(BODY, &header, SECRET, 1_700_000_100, DEFAULT_TOLERANCE_SECS),
            Ok(())
        );
    }

    #[test]
    fn test_any_v1_may_match() {
        let header = format!(
            "t=1700000000,v1=deadbeef,v1={}",
            sign(BODY, SECRET, 1_700_000_000)
        );
        assert!(verify_signature(BODY, &header, SECRET, 1_700_000_000, 300).is_ok());
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let header = format!("t=1700000000,v1={}", sign(BODY, SECRET, 1_700_000_000));
        assert_eq!(
            verify_signature(b"{}", &header, SECRET, 1_700_000_000, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let header = format!("t=1700000000,v1={}", sign(BODY, SECRET, 1_700_000_000));
        assert_eq!(
            verify_signature(BODY, &header, SECRET, 1_700_000_301, 300),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_extreme_timestamps_are_rejected() {
        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            assert_eq!(
                verify_signature(b"{}", header, SECRET, 1_700_000_000, 300),
                Err(SignatureError::Expired)
            );
        }
        assert_eq!(
            verify_signature(b"{}", "t=1700000000,v1=00", SECRET, i64::MIN, 300),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_signature(BODY, "garbage", SECRET, 0, 300),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(BODY, "t=1", SECRET, 1, 300),
            Err(SignatureError::Malformed)
        );
    }
}
