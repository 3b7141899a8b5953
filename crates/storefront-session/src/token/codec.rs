use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::User;

/// Base64url without a padding requirement. Issuers differ on whether they
/// strip the trailing `=`.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims schema of a storefront token payload. `userId` and `exp` are
/// required; a payload without them is not a usable token.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "userId")]
    user_id: String,
    username: Option<String>,
    email: Option<String>,
    iat: Option<i64>,
    exp: i64,
    #[serde(rename = "isAdmin")]
    is_admin: Option<bool>,
}

/// Claims read from a bearer token. Never persisted; derive it again from the
/// raw token whenever needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct DecodedToken {
    #[serde(rename = "subjectId")]
    pub subject_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "issuedAt")]
    pub issued_at: Option<i64>,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    #[serde(rename = "isAdmin")]
    pub is_admin: Option<bool>,
}

impl From<Claims> for DecodedToken {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.user_id,
            username: claims.username,
            email: claims.email,
            issued_at: claims.iat,
            expires_at: claims.exp,
            is_admin: claims.is_admin,
        }
    }
}

impl DecodedToken {
    /// Identity record carried by the token, used to restore the current user
    /// when only tokens were persisted.
    pub fn user(&self) -> User {
        User {
            id: self.subject_id.clone(),
            username: self.username.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            is_admin: self.is_admin.unwrap_or(false),
        }
    }
}

/// Decode the payload segment of a `header.payload.signature` token.
///
/// Returns `None` when the token is not exactly three segments, the payload
/// is empty or not base64url, is not UTF-8 JSON, or does not match the claims
/// schema. Callers treat `None` as an invalid token.
pub fn decode(token: &str) -> Option<DecodedToken> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() || payload.is_empty() {
        return None;
    }

    let bytes = match PAYLOAD_ENGINE.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Token payload is not base64url");
            return None;
        }
    };

    let text = String::from_utf8(bytes).ok()?;

    match serde_json::from_str::<Claims>(&text) {
        Ok(claims) => Some(claims.into()),
        Err(e) => {
            debug!(error = %e, "Token payload does not match claims schema");
            None
        }
    }
}
