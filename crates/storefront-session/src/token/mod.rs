//! Bearer token inspection.
//!
//! This module reads the claims carried inside the access and refresh
//! tokens issued by the storefront API:
//! - `decode`: Payload decoding into a validated `DecodedToken`
//! - `is_expired`: Liveness check with a safety buffer
//!
//! Signatures are never verified here. Tokens come from the issuing
//! endpoint over TLS and are only read for expiry and identity.

pub mod codec;
pub mod expiry;

pub use codec::{decode, DecodedToken};
pub use expiry::{
    is_expired, is_expired_at, ACCESS_TOKEN_BUFFER_SECS, REFRESH_TOKEN_BUFFER_SECS,
};

/// Build an unsigned token around a JSON claims object.
#[cfg(test)]
pub(crate) fn unsigned_token(claims: serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

/// Unsigned token for user `u1` expiring at `exp`.
#[cfg(test)]
pub(crate) fn token_expiring_at(exp: i64) -> String {
    unsigned_token(serde_json::json!({
        "userId": "u1",
        "username": "bob",
        "email": "b@b.com",
        "iat": exp - 900,
        "exp": exp,
    }))
}
