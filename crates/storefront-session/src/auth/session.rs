use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::storage::{TokenStore, ACCESS_TOKEN_KEY};
use crate::models::{AuthResponse, User};
use crate::token;

#[derive(Debug, Default)]
struct SessionState {
    current_user: Option<User>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
    /// Bumped whenever the identity is established or cleared
    generation: u64,
}

impl SessionState {
    fn is_anonymous(&self) -> bool {
        self.current_user.is_none() && self.access_token.is_none() && self.refresh_token.is_none()
    }

    fn clear_identity(&mut self) {
        self.current_user = None;
        self.access_token = None;
        self.refresh_token = None;
        self.error = None;
        self.generation += 1;
    }
}

/// Point-in-time copy of the session handed to readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct SessionSnapshot {
    #[serde(rename = "currentUser")]
    pub current_user: Option<User>,
    #[serde(skip)]
    pub access_token: Option<String>,
    #[serde(skip)]
    pub refresh_token: Option<String>,
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    #[serde(rename = "isLoading")]
    pub is_loading: bool,
    pub error: Option<String>,
    pub generation: u64,
}

/// Marks a login or signup as in flight until dropped, so a cancelled
/// request never leaves the session loading.
#[must_use]
pub(crate) struct LoadingGuard {
    pending: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The process-wide authentication state.
///
/// Cloning is cheap and every clone shares the same session. Mutation only
/// happens through the transition methods; readers get a [`SessionSnapshot`].
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    /// Login and signup requests currently in flight
    pending: Arc<AtomicUsize>,
    storage: Arc<dyn TokenStore>,
}

impl SessionStore {
    /// Create a store, hydrating from `storage`.
    ///
    /// The session starts authenticated when both tokens were persisted; the
    /// tokens are not validated until they are next used.
    pub fn new(storage: Arc<dyn TokenStore>) -> Self {
        let mut state = SessionState::default();

        match storage.load() {
            Ok(Some(tokens)) => {
                let current_user = token::decode(&tokens.access_token).map(|d| d.user());
                if current_user.is_none() {
                    warn!("Persisted access token has unreadable claims");
                }
                state.current_user = current_user;
                state.access_token = Some(tokens.access_token);
                state.refresh_token = Some(tokens.refresh_token);
                debug!("Session restored from storage");
            }
            Ok(None) => debug!("No persisted session found"),
            Err(e) => warn!(error = %e, "Failed to load persisted session"),
        }

        Self {
            state: Arc::new(RwLock::new(state)),
            pending: Arc::new(AtomicUsize::new(0)),
            storage,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            current_user: state.current_user.clone(),
            access_token: state.access_token.clone(),
            refresh_token: state.refresh_token.clone(),
            is_authenticated: state.access_token.is_some(),
            is_loading: self.is_loading(),
            error: state.error.clone(),
            generation: state.generation,
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.state.read().await.refresh_token.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.current_user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.access_token.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Generation and refresh token read together, for a refresh about to start
    pub(crate) async fn refresh_context(&self) -> (u64, Option<String>) {
        let state = self.state.read().await;
        (state.generation, state.refresh_token.clone())
    }

    /// A login or signup request has been sent. The session reports loading
    /// until the returned guard is dropped.
    pub(crate) async fn begin_request(&self) -> LoadingGuard {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let guard = LoadingGuard {
            pending: Arc::clone(&self.pending),
        };
        self.state.write().await.error = None;
        guard
    }

    /// A login or signup request failed; the auth state is left as it was
    pub(crate) async fn fail_request(&self, message: String) {
        self.state.write().await.error = Some(message);
    }

    /// Login or signup succeeded
    pub(crate) async fn establish(&self, response: AuthResponse) {
        let mut state = self.state.write().await;

        if let Err(e) = self
            .storage
            .save(&response.access_token, &response.refresh_token)
        {
            warn!(error = %e, "Failed to persist session tokens");
        }

        state.current_user = Some(response.user);
        state.access_token = Some(response.access_token);
        state.refresh_token = Some(response.refresh_token);
        state.error = None;
        state.generation += 1;
        info!(generation = state.generation, "Session established");
    }

    /// Swap in a refreshed access token.
    ///
    /// Returns `false` and changes nothing if the session moved on to another
    /// generation (or was cleared) while the refresh was in flight.
    pub(crate) async fn replace_access_token(&self, generation: u64, access_token: &str) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation || state.refresh_token.is_none() {
            return false;
        }

        if let Err(e) = self.storage.set(ACCESS_TOKEN_KEY, access_token) {
            warn!(error = %e, "Failed to persist refreshed access token");
        }
        state.access_token = Some(access_token.to_string());
        debug!(generation, "Access token refreshed");
        true
    }

    /// End the session after an unrecoverable refresh, but only if it is
    /// still the session the refresh was started for.
    pub(crate) async fn expire(&self, generation: u64) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        if !state.is_anonymous() {
            state.clear_identity();
            info!(generation = state.generation, "Session expired");
        }
        self.purge_storage();
        true
    }

    /// Clear the session and purge persisted tokens. Logging out an anonymous
    /// session leaves it untouched.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        if !state.is_anonymous() {
            state.clear_identity();
            info!(generation = state.generation, "Logged out");
        }
        self.purge_storage();
    }

    fn purge_storage(&self) {
        if let Err(e) = self.storage.purge() {
            warn!(error = %e, "Failed to purge persisted session tokens");
        }
    }
}
