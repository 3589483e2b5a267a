//! Application state management for sessiongate.
//!
//! This module contains the `App` struct that wires the auth controller,
//! gate and login flow to the terminal: login form state, the protected
//! pages, notifications and navigation requests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sessiongate_core::api::{Authenticator, HttpAuthenticator};
use sessiongate_core::auth::{
    AuthController, AuthGate, AuthState, GateView, LoginFlow, Navigator, Notification,
    SessionRecord, SessionStore,
};
use sessiongate_core::storage::{FileStorage, Storage};
use sessiongate_core::Config;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
/// Usernames are typically email addresses, 50 chars covers most.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Pages behind the login gate. `Home` is where navigation requests land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Session,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Session => "Session",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Page::Home => Page::Session,
            Page::Session => Page::Home,
        }
    }
}

/// Navigator that records "go home" requests for the main loop to apply.
#[derive(Debug, Default)]
pub struct HomeNavigator {
    requested: AtomicBool,
}

impl HomeNavigator {
    /// Returns true once per request.
    pub fn take_request(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

impl Navigator for HomeNavigator {
    fn navigate_home(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    pub controller: Arc<AuthController>,
    pub gate: AuthGate,
    login_flow: LoginFlow,
    navigator: Arc<HomeNavigator>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    persist_config: bool,

    // UI State
    pub state: AppState,
    pub page: Page,
    pub storage_location: Option<PathBuf>,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,

    /// Last notification from the login flow
    pub notification: Option<Notification>,
}

impl App {
    /// Create the application with file-backed storage and the HTTP authenticator.
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
        debug!(?data_dir, "Session storage directory configured");

        let authenticator =
            HttpAuthenticator::new(config.auth_url.clone(), config.request_timeout())?;
        if authenticator.auth_url().is_none() {
            warn!("No auth URL configured; logins will fail");
        }

        let storage = Arc::new(FileStorage::new(data_dir.clone()));
        let mut app = Self::from_parts(config, storage, Arc::new(authenticator));
        app.persist_config = true;
        app.storage_location = Some(data_dir);
        Ok(app)
    }

    /// Assemble the app from explicit collaborators. Config is never saved.
    pub fn from_parts(
        config: Config,
        storage: Arc<dyn Storage>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let navigator = Arc::new(HomeNavigator::default());
        let controller = Arc::new(
            AuthController::new(SessionStore::new(storage), navigator.clone())
                .with_session_duration(config.session_duration()),
        );
        let gate = AuthGate::mount(controller.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let login_flow = LoginFlow::new(controller.clone(), authenticator, tx);

        let login_username = config.last_username.clone().unwrap_or_default();

        Self {
            config,
            controller,
            gate,
            login_flow,
            navigator,
            notifications: rx,
            persist_config: false,

            state: AppState::Normal,
            page: Page::Home,
            storage_location: None,

            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,

            notification: None,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Run the startup session check.
    pub fn initialize(&mut self) -> AuthState {
        let state = self.controller.initialize();
        info!(authenticated = state.authenticated, "Session check complete");
        if !state.authenticated {
            self.start_login();
        }
        state
    }

    pub fn view(&self) -> GateView {
        self.gate.view()
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let result = self
            .login_flow
            .submit(&self.login_username, &self.login_password)
            .await;
        self.login_password.clear();
        self.check_notifications();

        match result {
            Ok(()) => {
                self.remember_username();
                Ok(())
            }
            Err(e) => {
                if !self.login_username.is_empty() {
                    self.login_focus = LoginFocus::Password;
                }
                Err(e.into())
            }
        }
    }

    fn remember_username(&mut self) {
        if self.config.last_username.as_deref() == Some(self.login_username.as_str()) {
            return;
        }
        self.config.last_username = Some(self.login_username.clone());
        if self.persist_config {
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    pub fn logout(&mut self) {
        self.controller.logout();
        self.notification = None;
        self.start_login();
        self.check_notifications();
    }

    /// Reset the login form for a fresh attempt
    pub fn start_login(&mut self) {
        self.state = AppState::Normal;
        self.login_password.clear();
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    // =========================================================================
    // Event plumbing
    // =========================================================================

    /// Drain pending notifications and apply navigation requests.
    pub fn check_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            self.notification = Some(notification);
        }

        if self.navigator.take_request() {
            debug!("Navigating home");
            self.page = Page::Home;
            self.state = AppState::Normal;
        }
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Human-readable session lifetime for the status bar.
    pub fn session_status(&self) -> String {
        match self.controller.expires_at() {
            Some(expires_at) if self.controller.is_authenticated() => {
                let record = SessionRecord {
                    authenticated: true,
                    expires_at,
                };
                format!(
                    "Session expires in {}m",
                    record.minutes_until_expiry(self.controller.now())
                )
            }
            _ => "Not signed in".to_string(),
        }
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Check if a character is valid for text input (printable, non-control)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sessiongate_core::api::{AuthReply, AuthReplyBody, Credentials, TransportError};
    use sessiongate_core::auth::{NotificationLevel, SESSION_KEY};
    use sessiongate_core::storage::MemoryStorage;

    /// Accepts exactly one username/password pair.
    struct StaticAuthenticator;

    #[async_trait]
    impl Authenticator for StaticAuthenticator {
        async fn authenticate(
            &self,
            credentials: &Credentials,
        ) -> Result<AuthReply, TransportError> {
            let ok = credentials.username() == "alice" && credentials.password() == "secret";
            let body = if ok {
                AuthReplyBody {
                    status_code: Some(200),
                    message: Some("OK".to_string()),
                }
            } else {
                AuthReplyBody {
                    status_code: Some(401),
                    message: Some("bad credentials".to_string()),
                }
            };
            Ok(AuthReply::new(200, body))
        }
    }

    fn app_with(storage: Arc<MemoryStorage>) -> App {
        App::from_parts(Config::default(), storage, Arc::new(StaticAuthenticator))
    }

    // -------------------------------------------------------------------------
    // Page Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_page_next_wraps() {
        assert_eq!(Page::Home.next(), Page::Session);
        assert_eq!(Page::Session.next(), Page::Home);
    }

    // -------------------------------------------------------------------------
    // Gate Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_gate_pending_until_initialized() {
        let mut app = app_with(Arc::new(MemoryStorage::new()));
        assert_eq!(app.view(), GateView::Pending);

        app.initialize();
        assert_eq!(app.view(), GateView::Login);
    }

    #[test]
    fn test_restored_session_skips_login() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(SESSION_KEY, r#"{"authenticated":true,"expiresAt":32503680000000}"#)
            .unwrap();
        let mut app = app_with(storage);

        assert!(app.initialize().authenticated);
        assert_eq!(app.view(), GateView::Protected);
        assert!(app.session_status().starts_with("Session expires in"));
    }

    #[tokio::test]
    async fn test_login_swaps_to_protected_home() {
        let storage = Arc::new(MemoryStorage::new());
        let mut app = app_with(storage.clone());
        app.initialize();
        app.page = Page::Session;

        app.login_username = "alice".to_string();
        app.login_password = "secret".to_string();
        app.attempt_login().await.unwrap();

        assert_eq!(app.view(), GateView::Protected);
        assert_eq!(app.page, Page::Home);
        assert!(app.login_password.is_empty());
        assert_eq!(app.config.last_username.as_deref(), Some("alice"));
        assert_eq!(
            app.notification.as_ref().map(|n| n.level),
            Some(NotificationLevel::Success)
        );
        assert!(storage.get(SESSION_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_session_status_counts_down_from_configured_lifetime() {
        let mut app = app_with(Arc::new(MemoryStorage::new()));
        app.initialize();
        assert_eq!(app.session_status(), "Not signed in");

        app.login_username = "alice".to_string();
        app.login_password = "secret".to_string();
        app.attempt_login().await.unwrap();

        // Whole minutes, rounded down
        let status = app.session_status();
        assert!(
            status == "Session expires in 59m" || status == "Session expires in 60m",
            "unexpected status: {status}"
        );
    }

    #[tokio::test]
    async fn test_failed_login_stays_on_form() {
        let mut app = app_with(Arc::new(MemoryStorage::new()));
        app.initialize();

        app.login_username = "alice".to_string();
        app.login_password = "wrong".to_string();
        assert!(app.attempt_login().await.is_err());

        assert_eq!(app.view(), GateView::Login);
        assert_eq!(app.login_focus, LoginFocus::Password);
        let notification = app.notification.as_ref().unwrap();
        assert!(notification.is_error());
        assert_eq!(notification.description, "bad credentials");
    }

    #[tokio::test]
    async fn test_logout_returns_to_login() {
        let storage = Arc::new(MemoryStorage::new());
        let mut app = app_with(storage.clone());
        app.initialize();
        app.login_username = "alice".to_string();
        app.login_password = "secret".to_string();
        app.attempt_login().await.unwrap();

        app.page = Page::Session;
        app.logout();

        assert_eq!(app.view(), GateView::Login);
        assert_eq!(app.page, Page::Home);
        assert_eq!(app.login_focus, LoginFocus::Password);
        assert!(storage.get(SESSION_KEY).unwrap().is_none());
        assert_eq!(app.session_status(), "Not signed in");
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_username_char() {
        // Valid chars within length
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        // Exceeds max length
        assert!(!can_add_username_char(50, 'a'));
        // Control characters rejected
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }
}
