//! Security-stamp protocol for review submissions
//!
//! Every rendered review form carries hidden `content_type`, `object_pk` and
//! `timestamp` fields plus a `security_hash` binding the three together. A
//! client can only submit a review against an object reference it was
//! actually shown, and a captured form stops replaying once the timestamp
//! falls outside the acceptance window (2 hours by default).
//!
//! The hash is a keyed HMAC-SHA256 over the three fields, each preceded by
//! its byte length so no two field splits produce the same input stream;
//! the key is derived from the application secret plus a namespace salt. A
//! config-gated fallback accepts the older unsalted SHA-1 scheme so forms
//! issued by the previous implementation stay valid across the migration.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const STAMP_KEY_SALT: &str = "critique.security.ReviewSecurityForm";

/// The hidden security fields of a review form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityStamp {
    pub content_type: String,
    pub object_pk: String,
    /// Unix seconds, rendered as a decimal string in the form
    pub timestamp: u64,
    pub security_hash: String,
}

/// Why a submitted stamp was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampError {
    /// The hash does not match the submitted fields.
    HashMismatch,
    /// The timestamp is older than the acceptance window.
    Expired,
}

impl fmt::Display for StampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StampError::HashMismatch => write!(f, "Security hash check failed."),
            StampError::Expired => write!(f, "Timestamp check failed."),
        }
    }
}

impl std::error::Error for StampError {}

fn signing_key() -> [u8; 32] {
    let secret = crate::app_config::security().secret_key;
    let mut hasher = Sha256::new();
    hasher.update(STAMP_KEY_SALT.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Compute the stamp hash over the raw field strings as they appear in the
/// form. Validation must pass the submitted strings through unmodified.
pub fn stamp_hash(content_type: &str, object_pk: &str, timestamp: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(&signing_key())
        .expect("HMAC accepts any key length");
    // Length-prefix each field so field boundaries cannot shift
    for field in [content_type, object_pk, timestamp] {
        mac.update(&(field.len() as u64).to_be_bytes());
        mac.update(field.as_bytes());
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Hash used by the previous implementation: unsalted SHA-1 over the
/// concatenated fields and the raw secret.
fn legacy_stamp_hash(content_type: &str, object_pk: &str, timestamp: &str) -> String {
    let secret = crate::app_config::security().secret_key;
    let mut hasher = Sha1::new();
    hasher.update(content_type.as_bytes());
    hasher.update(object_pk.as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Generate a fresh stamp for a target object reference.
pub fn generate(content_type: &str, object_pk: &str) -> SecurityStamp {
    let timestamp = unix_now();
    let security_hash = stamp_hash(content_type, object_pk, &timestamp.to_string());
    SecurityStamp {
        content_type: content_type.to_string(),
        object_pk: object_pk.to_string(),
        timestamp,
        security_hash,
    }
}

/// Verify a submitted hash against the submitted field strings.
///
/// Comparison is constant-time. When the primary HMAC does not match and the
/// legacy fallback is enabled, the old SHA-1 scheme is tried before giving
/// up.
pub fn verify_hash(
    content_type: &str,
    object_pk: &str,
    timestamp: &str,
    provided_hash: &str,
) -> Result<(), StampError> {
    let expected = stamp_hash(content_type, object_pk, timestamp);
    if expected.as_bytes().ct_eq(provided_hash.as_bytes()).into() {
        return Ok(());
    }

    if crate::app_config::security().legacy_sha1_fallback {
        let expected_old = legacy_stamp_hash(content_type, object_pk, timestamp);
        if expected_old
            .as_bytes()
            .ct_eq(provided_hash.as_bytes())
            .into()
        {
            log::info!(
                "Accepted legacy SHA-1 security hash for {}:{}",
                content_type,
                object_pk
            );
            return Ok(());
        }
    }

    Err(StampError::HashMismatch)
}

/// Reject timestamps older than the configured acceptance window.
/// This check is independent of hash validity.
pub fn verify_timestamp(timestamp: u64) -> Result<(), StampError> {
    verify_timestamp_at(timestamp, unix_now())
}

fn verify_timestamp_at(timestamp: u64, now: u64) -> Result<(), StampError> {
    let window = crate::app_config::security().stamp_window_seconds;
    if now.saturating_sub(timestamp) > window {
        return Err(StampError::Expired);
    }
    Ok(())
}
