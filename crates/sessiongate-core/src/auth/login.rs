//! Credential submission: validate, call the authenticator, drive the controller.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::AuthController;
use crate::api::{AuthReply, Authenticator, Credentials, TransportError};

pub const VALIDATION_MESSAGE: &str = "Please enter both username and password.";
pub const SUCCESS_MESSAGE: &str = "Logged in successfully!";
/// HTTP 200 whose body does not carry the success code.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid login credentials.";
/// Non-200 HTTP response without a message.
pub const SERVER_ERROR_MESSAGE: &str = "An error occurred. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: "Success".to_string(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Username and password required")]
    Validation,

    #[error("Login rejected with HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        status_code: Option<i64>,
        message: Option<String>,
    },

    #[error("Login request failed: {0}")]
    Transport(#[from] TransportError),
}

impl LoginError {
    fn rejected(reply: &AuthReply) -> Self {
        LoginError::Rejected {
            status: reply.status,
            status_code: reply.body.status_code,
            message: reply.message().map(str::to_string),
        }
    }

    /// Most specific message available: server text, then transport text,
    /// then a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            LoginError::Validation => VALIDATION_MESSAGE.to_string(),
            LoginError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            LoginError::Rejected {
                status: 200..=299, ..
            } => INVALID_CREDENTIALS_MESSAGE.to_string(),
            LoginError::Rejected { .. } => SERVER_ERROR_MESSAGE.to_string(),
            LoginError::Transport(e) => e.user_message(),
        }
    }
}

/// One login form's worth of behavior.
///
/// Every submission emits exactly one notification. If the receiving side
/// has gone away the notification is dropped.
pub struct LoginFlow {
    controller: Arc<AuthController>,
    authenticator: Arc<dyn Authenticator>,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl LoginFlow {
    pub fn new(
        controller: Arc<AuthController>,
        authenticator: Arc<dyn Authenticator>,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        Self {
            controller,
            authenticator,
            notifications,
        }
    }

    /// Submit credentials. On success the controller is logged in.
    pub async fn submit(&self, username: &str, password: &str) -> Result<(), LoginError> {
        let result = self.attempt(username, password).await;

        match &result {
            Ok(()) => {
                info!(username = %username, "Login successful");
                self.emit(Notification::success(SUCCESS_MESSAGE));
                self.controller.login();
            }
            Err(LoginError::Validation) => {
                debug!("Login form incomplete");
                self.emit(Notification::error(VALIDATION_MESSAGE));
            }
            Err(e) => {
                error!(error = %e, username = %username, "Login failed");
                self.emit(Notification::error(e.user_message()));
            }
        }

        result
    }

    async fn attempt(&self, username: &str, password: &str) -> Result<(), LoginError> {
        let credentials = Credentials::new(username, password);
        if !credentials.is_complete() {
            return Err(LoginError::Validation);
        }

        let reply = self.authenticator.authenticate(&credentials).await;
        drop(credentials);
        let reply = reply?;

        if reply.is_success() {
            Ok(())
        } else {
            Err(LoginError::rejected(&reply))
        }
    }

    fn emit(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("Notification receiver gone, dropping notification");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
