//! Core library for sessiongate.
//!
//! Establishes, persists, validates and expires a login session on the
//! client, and decides whether protected content or a login form is shown.
//! The login call itself goes to an external authenticator; this crate only
//! consumes its pass/fail outcome.

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{Authenticator, HttpAuthenticator};
pub use auth::{AuthController, AuthGate, AuthState, LoginFlow, SessionStore};
pub use config::Config;
