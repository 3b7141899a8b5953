//! API client for the storefront `/users` authentication endpoints.
//!
//! This module provides the `ApiClient` struct, which talks to the login,
//! signup and refresh endpoints, and the `AuthApi` trait the session layer
//! is written against.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::ApiError;
use crate::config::Config;
use crate::models::{AuthResponse, LoginCredentials, RefreshRequest, RefreshResponse, SignupData};

const LOGIN_PATH: &str = "/users/login";
const SIGNUP_PATH: &str = "/users/signup";
const REFRESH_PATH: &str = "/users/refresh-token";

/// The token-issuing endpoints of the storefront API.
#[async_trait]
pub trait AuthApi: Send + Sync + 'static {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError>;

    async fn signup(&self, data: &SignupData) -> Result<AuthResponse, ApiError>;

    /// Mint a new access token. The refresh token itself is not rotated.
    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError>;
}

/// HTTP client for the storefront API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with the configured base URL and request timeout
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The underlying connection pool, for issuing other API calls
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a path against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self.client.post(&url).json(body).send().await?;
        let response = check_response(response).await?;
        debug!(url = %url, "Auth endpoint responded");
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self.post_json(LOGIN_PATH, credentials).await?;
        validate_auth_response(auth)
    }

    async fn signup(&self, data: &SignupData) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self.post_json(SIGNUP_PATH, data).await?;
        validate_auth_response(auth)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let refreshed: RefreshResponse = self.post_json(REFRESH_PATH, &body).await?;
        if refreshed.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Refresh response carried an empty access token".to_string(),
            ));
        }
        Ok(refreshed)
    }
}

fn validate_auth_response(auth: AuthResponse) -> Result<AuthResponse, ApiError> {
    if auth.access_token.is_empty() || auth.refresh_token.is_empty() {
        return Err(ApiError::InvalidResponse(
            "Auth response is missing a token".to_string(),
        ));
    }
    Ok(auth)
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Check if response is successful, returning an error with body if not.
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}
