//! QR token codec: issues and verifies the signed, time-boxed payload that
//! binds a session to its validity window.
//!
//! The payload carries no secret data; the signature is tamper-evidence, not
//! confidentiality. Signing recomputes deterministically from
//! `(sessionId, issuedAt, secret)` so verification needs no per-token state.
//!
//! `now` is always an explicit argument so expiry behavior is testable
//! without clock mocking.

use crate::geofence::Geofence;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default extra window after nominal expiry, absorbing client/network latency.
pub const DEFAULT_GRACE_PERIOD_MS: i64 = 30_000;

/// The QR payload as rendered into the code and redeemed by a scan.
///
/// Timestamps are epoch milliseconds. `issued_at` travels as `timestamp`
/// on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub session_id: String,
    pub course_id: String,
    pub faculty_id: String,
    #[serde(rename = "timestamp")]
    pub issued_at: i64,
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Geofence>,
    pub qr_version: i64,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QrError {
    #[error("QR signature does not match")]
    SignatureMismatch,
    #[error("QR code has expired")]
    Expired,
}

fn mac_for(session_id: &str, issued_at: i64, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{session_id}:{issued_at}").as_bytes());
    mac
}

/// Hex-encoded HMAC-SHA256 over `(sessionId, issuedAt)` keyed by the shared secret.
pub fn sign(session_id: &str, issued_at: i64, secret: &str) -> String {
    hex::encode(mac_for(session_id, issued_at, secret).finalize().into_bytes())
}

/// Builds a signed payload valid for `ttl_ms` starting at `now`.
pub fn issue(
    session_id: &str,
    course_id: &str,
    faculty_id: &str,
    location: Option<Geofence>,
    ttl_ms: i64,
    version: i64,
    secret: &str,
    now: DateTime<Utc>,
) -> QrPayload {
    let issued_at = now.timestamp_millis();
    QrPayload {
        session_id: session_id.to_owned(),
        course_id: course_id.to_owned(),
        faculty_id: faculty_id.to_owned(),
        issued_at,
        expires_at: issued_at + ttl_ms,
        location,
        qr_version: version,
        signature: sign(session_id, issued_at, secret),
    }
}

/// Verifies signature and validity window.
///
/// The version check is advisory: a payload bearing a stale `qr_version` is
/// still accepted unless the stored version differs *and* the grace-adjusted
/// expiry has passed, so a scan made just as the faculty display rotated to
/// a new code still lands.
pub fn verify(
    payload: &QrPayload,
    current_version: Option<i64>,
    secret: &str,
    grace_ms: i64,
    now: DateTime<Utc>,
) -> Result<(), QrError> {
    let sig_bytes = hex::decode(&payload.signature).map_err(|_| QrError::SignatureMismatch)?;
    mac_for(&payload.session_id, payload.issued_at, secret)
        .verify_slice(&sig_bytes)
        .map_err(|_| QrError::SignatureMismatch)?;

    let now_ms = now.timestamp_millis();
    if now_ms > payload.expires_at + grace_ms {
        return Err(QrError::Expired);
    }

    if let Some(current) = current_version {
        if payload.qr_version != current && now_ms > payload.expires_at + grace_ms {
            return Err(QrError::Expired);
        }
    }

    Ok(())
}
