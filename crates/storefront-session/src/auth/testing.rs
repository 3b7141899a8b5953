//! In-memory stand-in for the auth endpoints.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::api::{ApiError, AuthApi};
use crate::models::{AuthResponse, LoginCredentials, RefreshResponse, SignupData, User};
use crate::token::token_expiring_at;

#[derive(Default)]
pub(crate) struct MockAuthApi {
    pub reject_login: bool,
    pub reject_refresh: bool,
    /// When set, each login waits for a notification before answering
    pub hold_login: Option<Arc<Notify>>,
    /// When set, each refresh waits for a notification before answering
    pub hold_refresh: Option<Arc<Notify>>,
    pub refresh_calls: AtomicUsize,
}

impl MockAuthApi {
    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        if let Some(notify) = &self.hold_login {
            notify.notified().await;
        }
        if self.reject_login {
            return Err(ApiError::Unauthorized);
        }
        Ok(AuthResponse {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
            user: User {
                id: "u1".to_string(),
                username: "bob".to_string(),
                email: credentials.email.clone(),
                is_admin: false,
            },
        })
    }

    async fn signup(&self, data: &SignupData) -> Result<AuthResponse, ApiError> {
        Ok(AuthResponse {
            access_token: "A1".to_string(),
            refresh_token: "R1".to_string(),
            user: User {
                id: "u2".to_string(),
                username: data.username.clone(),
                email: data.email.clone(),
                is_admin: false,
            },
        })
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match &self.hold_refresh {
            Some(notify) => notify.notified().await,
            None => tokio::task::yield_now().await,
        }
        if self.reject_refresh {
            return Err(ApiError::Unauthorized);
        }
        Ok(RefreshResponse {
            access_token: token_expiring_at(Utc::now().timestamp() + 3600),
        })
    }
}
