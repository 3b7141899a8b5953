use std::fmt;

use serde::{Deserialize, Serialize};

/// The signed-in account as reported by the API or rebuilt from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

impl User {
    /// Name to show in the account menu, falling back to the email address
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct SignupData {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupData {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SignupData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupData")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response body of `/users/login` and `/users/signup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Response body of `/users/refresh-token`. The refresh token is not rotated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_auth_response() {
        let json = r#"{"accessToken":"A1","refreshToken":"R1","user":{"_id":"u1","username":"bob","email":"b@b.com","isAdmin":true}}"#;
        let resp: AuthResponse = serde_json::from_str(json).expect("Failed to parse auth response");

        assert_eq!(resp.access_token, "A1");
        assert_eq!(resp.refresh_token, "R1");
        assert_eq!(resp.user.id, "u1");
        assert!(resp.user.is_admin);
    }

    #[test]
    fn test_user_is_admin_defaults_to_false() {
        let json = r#"{"id":"u2","username":"amy","email":"a@a.com"}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user");
        assert!(!user.is_admin);
        assert_eq!(user.display_name(), "amy");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = LoginCredentials::new("b@b.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("b@b.com"));
        assert!(!debug.contains("hunter2"));

        let signup = SignupData::new("bob", "b@b.com", "hunter2");
        assert!(!format!("{:?}", signup).contains("hunter2"));
    }

    #[test]
    fn test_refresh_request_wire_name() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "R1".to_string(),
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "refreshToken": "R1" }));
    }
}
