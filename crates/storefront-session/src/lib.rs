//! Storefront session - client-side authentication for the storefront API.
//!
//! This crate owns the session lifecycle of a storefront client: signing in,
//! keeping a live access token, attaching it to outbound requests and
//! falling back to a signed-out state when credentials can no longer be
//! renewed.
//!
//! ```no_run
//! use storefront_session::{AuthenticatedClient, Config, LoginCredentials};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = AuthenticatedClient::from_config(&Config::load()?)?;
//! client.auth().login(&LoginCredentials::new("b@b.com", "secret")).await?;
//! let orders: serde_json::Value = client.get_json("/orders/my-orders").await?;
//! # let _ = orders;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod token;

pub use api::{ApiClient, ApiError, AuthApi, AuthenticatedClient, RequestOptions};
pub use auth::{AuthService, SessionSnapshot, SessionStore, TokenStore};
pub use config::{Config, StorageBackend};
pub use models::{LoginCredentials, SignupData, User};
pub use token::{decode, is_expired, DecodedToken};
