//! Client for the external authentication endpoint.
//!
//! This module provides the `Authenticator` seam used by the login flow and
//! `HttpAuthenticator`, its reqwest implementation. The endpoint accepts
//! `{"Username", "Password"}` and answers with an HTTP status plus a body
//! carrying an application-level `statusCode` and optional `message`.

pub mod client;
pub mod error;

pub use client::{AuthReply, AuthReplyBody, Authenticator, Credentials, HttpAuthenticator};
pub use error::TransportError;
