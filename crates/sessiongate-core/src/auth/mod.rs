//! Authentication module for client-side session gating.
//!
//! This module provides:
//! - `SessionRecord` and the expiry policy (`is_valid`, `new_record`)
//! - `SessionStore`: the single persisted record under `session_active`
//! - `AuthController`: owner of the in-memory auth state and its transitions
//! - `AuthGate`: picks login form vs. protected content from that state
//! - `LoginFlow`: validates and submits credentials, then drives the controller
//!
//! Sessions last one hour by default and are only checked at startup.

pub mod controller;
pub mod gate;
pub mod login;
pub mod session;
pub mod store;

pub use controller::{
    AuthController, AuthPhase, AuthState, Listener, Navigator, NoopNavigator, SubscriptionId,
};
pub use gate::{AuthGate, GateView};
pub use login::{LoginError, LoginFlow, Notification, NotificationLevel};
pub use session::{
    default_session_duration, is_valid, new_record, Clock, ManualClock, SessionRecord,
    SystemClock, DEFAULT_SESSION_DURATION_MS,
};
pub use store::{SessionStore, SESSION_KEY};
