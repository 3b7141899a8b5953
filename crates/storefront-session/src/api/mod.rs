//! REST API client module for the storefront services.
//!
//! This module provides the `ApiClient` for the token-issuing `/users`
//! endpoints and the `AuthenticatedClient` that attaches a live bearer
//! token to every other call.
//!
//! Tokens are JWT-shaped bearer credentials obtained from the login and
//! signup endpoints and renewed through `/users/refresh-token`.

pub mod client;
pub mod error;
pub mod request;

pub use client::{ApiClient, AuthApi};
pub use error::ApiError;
pub use request::{AuthenticatedClient, RequestOptions};
