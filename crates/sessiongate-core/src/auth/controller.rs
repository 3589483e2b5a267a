//! The single authority over in-memory authentication state.
//!
//! `AuthController` owns the `initialized`/`authenticated` flags, keeps the
//! session store in step with them, and tells subscribers about every
//! genuine transition. Storage failures are logged and absorbed here; no
//! operation on the controller returns an error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::session::{default_session_duration, Clock, SessionRecord, SystemClock};
use super::SessionStore;

/// Snapshot of the authentication state as seen by the rest of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AuthState {
    pub initialized: bool,
    pub authenticated: bool,
}

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Startup read has not completed. Never re-entered.
    Uninitialized,
    Unauthenticated,
    Authenticated,
}

impl AuthPhase {
    pub fn state(self) -> AuthState {
        match self {
            AuthPhase::Uninitialized => AuthState {
                initialized: false,
                authenticated: false,
            },
            AuthPhase::Unauthenticated => AuthState {
                initialized: true,
                authenticated: false,
            },
            AuthPhase::Authenticated => AuthState {
                initialized: true,
                authenticated: true,
            },
        }
    }
}

/// "Go to the home location" capability, invoked on login and logout.
pub trait Navigator: Send + Sync {
    fn navigate_home(&self);
}

/// Navigator for hosts without a notion of location.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate_home(&self) {}
}

/// Callback invoked with the new state after each transition.
pub type Listener = Arc<dyn Fn(AuthState) + Send + Sync>;

/// Handle returned by [`AuthController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner {
    phase: AuthPhase,
    expires_at: Option<DateTime<Utc>>,
}

pub struct AuthController {
    store: SessionStore,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
    session_duration: Duration,
    inner: Mutex<Inner>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl AuthController {
    /// Create a controller in the `Uninitialized` phase using the wall clock
    /// and the default one-hour session.
    pub fn new(store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            navigator,
            session_duration: default_session_duration(),
            inner: Mutex::new(Inner {
                phase: AuthPhase::Uninitialized,
                expires_at: None,
            }),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Read-only snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.phase().state()
    }

    pub fn phase(&self) -> AuthPhase {
        self.lock_inner().phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().authenticated
    }

    /// Expiry of the session this controller currently believes in.
    ///
    /// The session is only checked against the clock at startup, so this
    /// may lie in the past while the app stays open.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lock_inner().expires_at
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Startup check: read the stored session and decide the initial phase.
    ///
    /// Runs once. Later calls leave the state alone and return it.
    pub fn initialize(&self) -> AuthState {
        let changed = {
            let mut inner = self.lock_inner();
            if inner.phase != AuthPhase::Uninitialized {
                debug!(phase = ?inner.phase, "Controller already initialized");
                return inner.phase.state();
            }

            let now = self.clock.now();
            let record = match self.store.read() {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Failed to read session, treating as absent");
                    None
                }
            };

            match record {
                Some(record) if record.is_valid(now) => {
                    debug!(expires_at = %record.expires_at, "Restored session");
                    inner.expires_at = Some(record.expires_at);
                    Self::set_phase(&mut inner, AuthPhase::Authenticated)
                }
                record => {
                    if let Some(ref stale) = record {
                        debug!(
                            authenticated = stale.authenticated,
                            expires_at = %stale.expires_at,
                            "Stored session expired"
                        );
                    }
                    self.clear_store();
                    inner.expires_at = None;
                    Self::set_phase(&mut inner, AuthPhase::Unauthenticated)
                }
            }
        };

        let state = changed.unwrap_or_else(|| self.state());
        if changed.is_some() {
            self.notify(state);
        }
        state
    }

    /// Record a successful login and switch to `Authenticated`.
    ///
    /// Credentials are checked upstream; this never fails. A repeated call
    /// rewrites the record with a fresh expiry but notifies nobody.
    pub fn login(&self) {
        let record = SessionRecord::new(self.clock.now(), self.session_duration);

        let changed = {
            let mut inner = self.lock_inner();
            if let Err(e) = self.store.write(&record) {
                warn!(error = %e, "Failed to save session");
            }
            inner.expires_at = Some(record.expires_at);
            Self::set_phase(&mut inner, AuthPhase::Authenticated)
        };

        info!(expires_at = %record.expires_at, "Logged in");
        if let Some(state) = changed {
            self.notify(state);
        }
        self.navigator.navigate_home();
    }

    /// Drop the session and switch to `Unauthenticated`.
    pub fn logout(&self) {
        let changed = {
            let mut inner = self.lock_inner();
            self.clear_store();
            inner.expires_at = None;
            Self::set_phase(&mut inner, AuthPhase::Unauthenticated)
        };

        info!("Logged out");
        if let Some(state) = changed {
            self.notify(state);
        }
        self.navigator.navigate_home();
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session");
        }
    }

    /// Returns the new state when the phase actually changed.
    fn set_phase(inner: &mut Inner, phase: AuthPhase) -> Option<AuthState> {
        if inner.phase == phase {
            return None;
        }
        debug!(from = ?inner.phase, to = ?phase, "Auth state transition");
        inner.phase = phase;
        Some(phase.state())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register a callback invoked once per genuine state transition.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, listener));
        id
    }

    /// Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock_listeners().retain(|(existing, _)| *existing != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn notify(&self, state: AuthState) {
        // Snapshot so listeners may (un)subscribe from inside the callback
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
