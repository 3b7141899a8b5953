use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use super::session::{SessionSnapshot, SessionStore};
use crate::api::{ApiClient, ApiError, AuthApi};
use crate::config::Config;
use crate::models::{LoginCredentials, SignupData, User};
use crate::token::ACCESS_TOKEN_BUFFER_SECS;

/// Drives the session through login, signup, refresh and logout against an
/// [`AuthApi`].
pub struct AuthService<A: AuthApi> {
    pub(super) api: Arc<A>,
    pub(super) store: SessionStore,
    /// Serialises token refreshes so concurrent callers share one round-trip
    pub(super) refresh_gate: Arc<Mutex<()>>,
    pub(super) access_buffer_secs: i64,
}

impl<A: AuthApi> Clone for AuthService<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: self.store.clone(),
            refresh_gate: Arc::clone(&self.refresh_gate),
            access_buffer_secs: self.access_buffer_secs,
        }
    }
}

impl AuthService<ApiClient> {
    /// Build the HTTP client and session store described by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api = ApiClient::new(config)?;
        let store = SessionStore::new(config.token_store()?);
        Ok(Self::new(api, store).with_expiry_buffer(config.expiry_buffer_secs))
    }
}

impl<A: AuthApi> AuthService<A> {
    pub fn new(api: A, store: SessionStore) -> Self {
        Self {
            api: Arc::new(api),
            store,
            refresh_gate: Arc::new(Mutex::new(())),
            access_buffer_secs: ACCESS_TOKEN_BUFFER_SECS,
        }
    }

    /// Refresh access tokens this many seconds ahead of expiry
    pub fn with_expiry_buffer(mut self, secs: i64) -> Self {
        self.access_buffer_secs = secs;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot().await
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ApiError> {
        let _loading = self.store.begin_request().await;

        match self.api.login(credentials).await {
            Ok(auth) => {
                let user = auth.user.clone();
                self.store.establish(auth).await;
                info!(user_id = %user.id, "Login successful");
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.store.fail_request(e.user_message()).await;
                Err(e)
            }
        }
    }

    pub async fn signup(&self, data: &SignupData) -> Result<User, ApiError> {
        let _loading = self.store.begin_request().await;

        match self.api.signup(data).await {
            Ok(auth) => {
                let user = auth.user.clone();
                self.store.establish(auth).await;
                info!(user_id = %user.id, "Signup successful");
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "Signup failed");
                self.store.fail_request(e.user_message()).await;
                Err(e)
            }
        }
    }

    pub async fn logout(&self) {
        self.store.logout().await;
    }
}
