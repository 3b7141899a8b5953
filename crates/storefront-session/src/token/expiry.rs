use chrono::Utc;

use super::codec::decode;

/// Access tokens are refreshed this many seconds before they actually expire,
/// so a request is not dispatched with a token that lapses in flight.
pub const ACCESS_TOKEN_BUFFER_SECS: i64 = 60;

/// Refresh tokens are used right up to their expiry.
pub const REFRESH_TOKEN_BUFFER_SECS: i64 = 0;

/// Check whether `token` expires within `buffer_secs` of now.
///
/// A token that cannot be decoded is treated as expired.
pub fn is_expired(token: &str, buffer_secs: i64) -> bool {
    is_expired_at(token, buffer_secs, Utc::now().timestamp())
}

/// Same as [`is_expired`] against an explicit clock reading in epoch seconds.
pub fn is_expired_at(token: &str, buffer_secs: i64, now_secs: i64) -> bool {
    match decode(token) {
        Some(decoded) => decoded.expires_at <= now_secs.saturating_add(buffer_secs),
        None => true,
    }
}
