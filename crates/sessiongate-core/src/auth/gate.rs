//! Render-time decision between the login form and protected content.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::controller::{AuthController, AuthState, SubscriptionId};

/// Which branch the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    /// Startup check still running: show nothing (or a neutral placeholder).
    Pending,
    Protected,
    Login,
}

pub fn decide(state: AuthState) -> GateView {
    if !state.initialized {
        GateView::Pending
    } else if state.authenticated {
        GateView::Protected
    } else {
        GateView::Login
    }
}

/// Build the content for `state`. Only the selected branch is evaluated;
/// `None` means render nothing.
pub fn render<C>(
    state: AuthState,
    protected: impl FnOnce() -> C,
    login: impl FnOnce() -> C,
) -> Option<C> {
    render_view(decide(state), protected, login)
}

fn render_view<C>(
    view: GateView,
    protected: impl FnOnce() -> C,
    login: impl FnOnce() -> C,
) -> Option<C> {
    match view {
        GateView::Pending => None,
        GateView::Protected => Some(protected()),
        GateView::Login => Some(login()),
    }
}

/// A gate bound to a controller.
///
/// While mounted it tracks every state transition; dropping it unsubscribes,
/// after which the controller no longer touches it.
pub struct AuthGate {
    controller: Arc<AuthController>,
    subscription: SubscriptionId,
    view: Arc<Mutex<GateView>>,
    revision: Arc<AtomicU64>,
}

impl AuthGate {
    pub fn mount(controller: Arc<AuthController>) -> Self {
        let view = Arc::new(Mutex::new(GateView::Pending));
        let revision = Arc::new(AtomicU64::new(0));

        let listener_view = Arc::clone(&view);
        let listener_revision = Arc::clone(&revision);
        let listener_controller = Arc::downgrade(&controller);
        let subscription = controller.subscribe(Arc::new(move |_: AuthState| {
            let Some(controller) = listener_controller.upgrade() else {
                return;
            };
            // Notifications can arrive out of order: decide from the current
            // state, read under the view lock.
            let mut view = listener_view.lock().unwrap_or_else(|e| e.into_inner());
            let next = decide(controller.state());
            *view = next;
            listener_revision.fetch_add(1, Ordering::SeqCst);
            debug!(view = ?next, "Auth gate re-evaluated");
        }));

        // Subscribed first so a transition racing the mount is not lost
        {
            let mut current = view.lock().unwrap_or_else(|e| e.into_inner());
            *current = decide(controller.state());
        }

        Self {
            controller,
            subscription,
            view,
            revision,
        }
    }

    pub fn view(&self) -> GateView {
        *self.view.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of re-evaluations triggered by the controller since mount.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn render<C>(
        &self,
        protected: impl FnOnce() -> C,
        login: impl FnOnce() -> C,
    ) -> Option<C> {
        render_view(self.view(), protected, login)
    }
}

impl Drop for AuthGate {
    fn drop(&mut self) {
        self.controller.unsubscribe(self.subscription);
    }
}
