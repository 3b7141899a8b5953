//! Authenticated calls to the storefront API.
//!
//! `AuthenticatedClient` guarantees a live bearer token before each call.
//! Each request is sent exactly once; a 401 is returned to the caller
//! rather than retried.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::client::{check_response, join_url, ApiClient, AuthApi};
use super::ApiError;
use crate::auth::AuthService;
use crate::config::Config;

/// Extra headers and an optional JSON body for one request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header. Caller headers override the defaults on conflict.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::InvalidRequest(format!("Failed to encode request body: {}", e))
        })?;
        self.body = Some(value);
        Ok(self)
    }
}

pub struct AuthenticatedClient<A: AuthApi> {
    http: Client,
    base_url: String,
    auth: AuthService<A>,
}

impl<A: AuthApi> Clone for AuthenticatedClient<A> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl AuthenticatedClient<ApiClient> {
    /// Build the whole stack (HTTP client, token storage, session) from `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let auth = AuthService::from_config(config)?;
        let http = auth.api().http().clone();
        let base_url = auth.api().base_url().to_string();
        Ok(Self::new(http, base_url, auth))
    }
}

impl<A: AuthApi> AuthenticatedClient<A> {
    pub fn new(http: Client, base_url: impl Into<String>, auth: AuthService<A>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthService<A> {
        &self.auth
    }

    /// Send one request with a live bearer token attached.
    ///
    /// Fails with [`ApiError::NoValidToken`] when no live token can be
    /// obtained; the session has been cleared in that case. Non-2xx
    /// responses are returned as-is.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let token = self
            .auth
            .ensure_live_access_token()
            .await
            .ok_or(ApiError::NoValidToken)?;

        let headers = merge_headers(&token, options.headers)?;
        let url = join_url(&self.base_url, url);

        let mut builder = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        debug!(
            method = %method,
            url = %url,
            status = %response.status(),
            "Authenticated request completed"
        );
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, url, RequestOptions::new()).await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let options = RequestOptions::new().json(body)?;
        let response = self.request(Method::POST, url, options).await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, url: &str) -> Result<(), ApiError> {
        let response = self.request(Method::DELETE, url, RequestOptions::new()).await?;
        check_response(response).await?;
        Ok(())
    }
}

/// Bearer auth and JSON content type, overridden by any caller header of the
/// same name.
fn merge_headers(token: &str, overrides: HeaderMap) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::InvalidHeader(e.to_string()))?,
    );
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for name in overrides.keys() {
        headers.remove(name);
    }
    for (name, value) in overrides.iter() {
        headers.append(name.clone(), value.clone());
    }
    Ok(headers)
}
