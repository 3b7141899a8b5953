//! Data models for the storefront authentication endpoints.
//!
//! This module contains the identity record held by the session and the
//! request/response bodies exchanged with the `/users` endpoints:
//!
//! - `User`: The signed-in account
//! - `LoginCredentials`, `SignupData`: Request bodies for login and signup
//! - `AuthResponse`, `RefreshResponse`: Token-bearing responses

pub mod user;

pub use user::{AuthResponse, LoginCredentials, RefreshRequest, RefreshResponse, SignupData, User};
