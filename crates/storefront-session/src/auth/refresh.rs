use tracing::{debug, info, warn};

use super::service::AuthService;
use crate::api::AuthApi;
use crate::token::{is_expired, REFRESH_TOKEN_BUFFER_SECS};

impl<A: AuthApi> AuthService<A> {
    /// Return an access token that will stay valid for at least the expiry
    /// buffer, refreshing it first if needed.
    ///
    /// `None` means there is no usable session: the caller must not go ahead
    /// with an authenticated action. When a refresh cannot succeed the
    /// session has already been cleared.
    pub async fn ensure_live_access_token(&self) -> Option<String> {
        let access = self.store.access_token().await?;
        if !is_expired(&access, self.access_buffer_secs) {
            return Some(access);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited for the gate
        let access = self.store.access_token().await?;
        if !is_expired(&access, self.access_buffer_secs) {
            debug!("Access token already refreshed by a concurrent caller");
            return Some(access);
        }

        self.refresh_locked().await
    }

    /// Exchange the refresh token for a new access token regardless of the
    /// current one's expiry. Failure clears the session.
    pub async fn refresh(&self) -> Option<String> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Option<String> {
        let (generation, refresh_token) = self.store.refresh_context().await;

        let refresh_token = match refresh_token {
            Some(token) if !is_expired(&token, REFRESH_TOKEN_BUFFER_SECS) => token,
            Some(_) => {
                info!("Refresh token expired, ending session");
                return self.end_session(generation).await;
            }
            None => {
                debug!("No refresh token available");
                return self.end_session(generation).await;
            }
        };

        match self.api.refresh_token(&refresh_token).await {
            Ok(refreshed) => {
                if self
                    .store
                    .replace_access_token(generation, &refreshed.access_token)
                    .await
                {
                    Some(refreshed.access_token)
                } else {
                    debug!(generation, "Discarding refresh result for a superseded session");
                    self.current_live_token().await
                }
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.end_session(generation).await
            }
        }
    }

    /// Clear the session the refresh was started for. If it was already
    /// replaced, hand back whatever the newer session holds.
    async fn end_session(&self, generation: u64) -> Option<String> {
        if self.store.expire(generation).await {
            None
        } else {
            self.current_live_token().await
        }
    }

    async fn current_live_token(&self) -> Option<String> {
        self.store
            .access_token()
            .await
            .filter(|token| !is_expired(token, self.access_buffer_secs))
    }
}
