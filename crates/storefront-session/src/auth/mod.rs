//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: The process-wide session with its enumerated transitions
//! - `AuthService`: Login, signup, logout and token refresh over the API
//! - `TokenStore`: Persistence of the access/refresh token pair (file,
//!   OS keyring or memory)
//!
//! Access tokens are refreshed shortly before they expire; a refresh that
//! fails ends the session.

mod refresh;
pub mod service;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use service::AuthService;
pub use session::{SessionSnapshot, SessionStore};
pub use storage::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, PersistedTokens, TokenStore,
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
