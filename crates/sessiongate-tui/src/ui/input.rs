//! Keyboard input handling for the TUI.
//!
//! Which handler runs is decided by the auth gate: the login form while
//! signed out, page navigation while signed in, nothing while pending.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use sessiongate_core::auth::GateView;

use crate::app::{can_add_password_char, can_add_username_char, App, AppState, LoginFocus, Page};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ConfirmingQuit => return Ok(handle_quit_confirm(app, key)),
        AppState::ConfirmingLogout => {
            handle_logout_confirm(app, key);
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    match app.view() {
        GateView::Pending => Ok(false),
        GateView::Login => handle_login_input(app, key).await,
        GateView::Protected => {
            handle_protected_input(app, key);
            Ok(false)
        }
    }
}

fn handle_quit_confirm(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.state = AppState::Quitting;
            true
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.state = AppState::Normal;
            false
        }
        _ => false,
    }
}

fn handle_logout_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.logout(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        _ => {}
    }
}

fn handle_protected_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('1') => app.page = Page::Home,
        KeyCode::Char('2') => app.page = Page::Session,
        KeyCode::Tab | KeyCode::BackTab => app.page = app.page.next(),
        KeyCode::Char('l') => app.state = AppState::ConfirmingLogout,
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Esc => app.dismiss_notification(),
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            // Enter in the password field submits, like a web form
            LoginFocus::Password | LoginFocus::Button => {
                // Outcome is surfaced through app.notification
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use sessiongate_core::api::{
        AuthReply, AuthReplyBody, Authenticator, Credentials, TransportError,
    };
    use sessiongate_core::storage::MemoryStorage;
    use sessiongate_core::Config;
    use std::sync::Arc;

    struct AcceptAll;

    #[async_trait::async_trait]
    impl Authenticator for AcceptAll {
        async fn authenticate(&self, _: &Credentials) -> Result<AuthReply, TransportError> {
            Ok(AuthReply::new(
                200,
                AuthReplyBody {
                    status_code: Some(200),
                    message: None,
                },
            ))
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_input(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    fn app() -> App {
        let mut app = App::from_parts(
            Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(AcceptAll),
        );
        app.initialize();
        app
    }

    #[tokio::test]
    async fn test_keys_ignored_while_pending() {
        let mut app = App::from_parts(
            Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(AcceptAll),
        );
        assert!(!handle_input(&mut app, key(KeyCode::Esc)).await.unwrap());
        assert!(!handle_input(&mut app, key(KeyCode::Char('x'))).await.unwrap());
        assert!(app.login_username.is_empty());
    }

    #[tokio::test]
    async fn test_typing_and_submitting_login_form() {
        let mut app = app();
        assert_eq!(app.login_focus, LoginFocus::Username);

        type_text(&mut app, "alice").await;
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        type_text(&mut app, "pw").await;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.view(), GateView::Protected);
        assert_eq!(app.page, Page::Home);
    }

    #[tokio::test]
    async fn test_submitting_empty_form_shows_validation_error() {
        let mut app = app();
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        handle_input(&mut app, key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.login_focus, LoginFocus::Button);
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.view(), GateView::Login);
        assert!(app.notification.as_ref().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_escape_on_login_quits() {
        let mut app = app();
        assert!(handle_input(&mut app, key(KeyCode::Esc)).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_logout_requires_confirmation() {
        let mut app = app();
        type_text(&mut app, "alice").await;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        type_text(&mut app, "pw").await;
        handle_input(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.view(), GateView::Protected);

        handle_input(&mut app, key(KeyCode::Char('l'))).await.unwrap();
        assert_eq!(app.state, AppState::ConfirmingLogout);
        handle_input(&mut app, key(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.view(), GateView::Protected);

        handle_input(&mut app, key(KeyCode::Char('l'))).await.unwrap();
        handle_input(&mut app, key(KeyCode::Char('y'))).await.unwrap();
        assert_eq!(app.view(), GateView::Login);
        assert_eq!(app.state, AppState::Normal);
    }
}
