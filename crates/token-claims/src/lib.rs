//! Bearer-token claim inspection for the session coordinator.
//!
//! Reads the embedded claim set of an opaque bearer token to answer one
//! question: how long until this token expires? The signature is never
//! verified; authenticity is the server's concern. Every failure mode
//! (missing token, malformed payload, unusable `exp`) collapses into the
//! fail-closed answer: expired now.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Claim set embedded in a bearer token payload.
///
/// Only the claims the coordinator reads; everything else in the payload
/// is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimSet {
    /// Expiry instant, seconds since epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued-at instant, seconds since epoch.
    #[serde(default)]
    pub iat: Option<i64>,
    /// Subject, kept for log correlation only.
    #[serde(default)]
    pub sub: Option<String>,
}

/// Derived view of a token's validity. Recomputed on demand, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// The payload decoded to a claim set.
    pub is_valid: bool,
    /// The token is past its expiry, or carries no usable expiry.
    pub is_expired: bool,
    /// Time left before expiry, floored at zero.
    pub time_until_expiration: Duration,
    /// Expiry instant, when the claim set carries one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenInfo {
    /// The fail-closed value for unparsable input.
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            is_expired: true,
            time_until_expiration: Duration::ZERO,
            expires_at: None,
        }
    }
}

/// Decode the claim set from a token, without verifying the signature.
///
/// Returns `None` for anything that is not a three-segment token with a
/// base64url JSON payload.
pub fn decode_claims(token: &str) -> Option<ClaimSet> {
    let mut segments = token.split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);
    segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let raw = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice(&raw) {
        Ok(claims) => Some(claims),
        Err(err) => {
            tracing::debug!(error = %err, "Token payload is not a JSON claim set");
            None
        }
    }
}

/// Inspect a token and derive its validity.
pub fn inspect(token: &str) -> TokenInfo {
    let claims = match decode_claims(token) {
        Some(claims) => claims,
        None => return TokenInfo::invalid(),
    };

    match claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()) {
        Some(expires_at) => {
            let remaining = (expires_at.timestamp() - Utc::now().timestamp()).max(0);
            TokenInfo {
                is_valid: true,
                is_expired: remaining == 0,
                time_until_expiration: Duration::from_secs(remaining as u64),
                expires_at: Some(expires_at),
            }
        }
        // Parseable payload without a usable expiry: valid, but expired now.
        None => TokenInfo {
            is_valid: true,
            is_expired: true,
            time_until_expiration: Duration::ZERO,
            expires_at: None,
        },
    }
}

/// Whether the token is past its expiry. Malformed counts as expired.
pub fn is_expired(token: &str) -> bool {
    inspect(token).is_expired
}

/// Time left before the token expires, floored at zero.
pub fn time_until_expiration(token: &str) -> Duration {
    inspect(token).time_until_expiration
}
