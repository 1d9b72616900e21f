//! Signature verification for internal event deliveries.
//!
//! The event bus bridge signs each delivery with HMAC-SHA256 over
//! `v1:{timestamp}:{body}` and sends the hex digest in
//! `X-Event-Signature` alongside `X-Event-Timestamp` (Unix seconds).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

pub const TIMESTAMP_HEADER: &str = "x-event-timestamp";
pub const SIGNATURE_HEADER: &str = "x-event-signature";

/// Maximum clock skew accepted between signer and receiver, in seconds.
pub const MAX_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Missing signature headers")]
    Missing,

    #[error("Invalid timestamp")]
    InvalidTimestamp,

    #[error("Request timestamp too old")]
    Stale,

    #[error("Signature mismatch")]
    Mismatch,
}

/// Hex HMAC-SHA256 of `v1:{timestamp}:{body}`.
#[must_use]
pub fn sign(secret: &[u8], timestamp: i64, body: &[u8]) -> String {
    let mut mac = hmac_for(secret);
    mac.update(format!("v1:{timestamp}:").as_bytes());
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a delivery signature against `now` (Unix seconds).
///
/// # Errors
///
/// Returns `SignatureError` if the timestamp is unparseable or outside the
/// accepted window, or the signature does not match.
pub fn verify(
    secret: &[u8],
    timestamp: &str,
    signature: &str,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;

    if (now - ts).abs() > MAX_SKEW_SECS {
        return Err(SignatureError::Stale);
    }

    let expected = sign(secret, ts, body);

    // Constant-time comparison
    if !constant_time_compare(&expected, signature.trim()) {
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

fn hmac_for(secret: &[u8]) -> Hmac<Sha256> {
    match Hmac::<Sha256>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
