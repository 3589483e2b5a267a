use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use sessiongate_core::auth::GateView;

use crate::app::{App, AppState, LoginFocus, Page};

use super::styles;

/// Width of the login and confirmation dialogs.
const DIALOG_WIDTH: u16 = 46;

/// Visible width of the username/password fields.
const FIELD_WIDTH: usize = 16;

/// What the gate selected for the main area.
enum Screen<'a> {
    Protected(Paragraph<'a>),
    Login(Paragraph<'a>, u16),
}

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(8),    // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);

    // Nothing but chrome until the startup check resolves
    let screen = app.gate.render(
        || Screen::Protected(protected_page(app)),
        || {
            let (form, height) = login_form(app);
            Screen::Login(form, height)
        },
    );

    match screen {
        Some(Screen::Protected(page)) => frame.render_widget(page, chunks[1]),
        Some(Screen::Login(form, height)) => {
            let area = centered_rect_fixed(DIALOG_WIDTH, height, chunks[1]);
            frame.render_widget(Clear, area);
            frame.render_widget(form, area);
        }
        None => {}
    }

    render_status_bar(frame, app, chunks[2]);

    match app.state {
        AppState::ConfirmingLogout => {
            render_confirm_overlay(frame, "Log out of this session?", "log out")
        }
        AppState::ConfirmingQuit => {
            render_confirm_overlay(frame, "Are you sure you want to quit?", "quit")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled("  sessiongate", styles::title_style())];

    // Page tabs only make sense behind the gate
    if app.view() == GateView::Protected {
        spans.push(Span::raw("   "));
        for (i, page) in [Page::Home, Page::Session].iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            let label = format!("[{}] {}", i + 1, page.title());
            spans.push(Span::styled(label, styles::tab_style(app.page == *page)));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn protected_page(app: &App) -> Paragraph<'static> {
    let lines = match app.page {
        Page::Home => {
            let who = app
                .config
                .last_username
                .clone()
                .unwrap_or_else(|| "unknown user".to_string());
            vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled("  Welcome, ", styles::list_item_style()),
                    Span::styled(who, styles::highlight_style()),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    "  You are signed in. Protected content is available.",
                    styles::list_item_style(),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled("  [Tab]", styles::help_key_style()),
                    Span::styled(" switch page  ", styles::muted_style()),
                    Span::styled("[l]", styles::help_key_style()),
                    Span::styled(" log out  ", styles::muted_style()),
                    Span::styled("[q]", styles::help_key_style()),
                    Span::styled(" quit", styles::muted_style()),
                ]),
            ]
        }
        Page::Session => {
            let expires = app
                .controller
                .expires_at()
                .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            let location = app
                .storage_location
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "in memory".to_string());
            let state = app.controller.state();
            vec![
                Line::from(""),
                detail_line("Initialized", state.initialized.to_string()),
                detail_line("Authenticated", state.authenticated.to_string()),
                detail_line("Expires", expires),
                detail_line(
                    "Lifetime",
                    format!("{}m", app.controller.session_duration().num_minutes()),
                ),
                detail_line("Storage", location),
            ]
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(format!(" {} ", app.page.title()));

    Paragraph::new(lines).block(block)
}

fn detail_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<14}", label), styles::muted_style()),
        Span::styled(value, styles::list_item_style()),
    ])
}

/// Login dialog and the height it needs.
fn login_form(app: &App) -> (Paragraph<'static>, u16) {
    let mut lines = vec![
        Line::from(Span::styled("              Sign in", styles::title_style())),
        Line::from(""),
    ];

    let username_focused = app.login_focus == LoginFocus::Username;
    lines.push(field_line("Username", &app.login_username, username_focused));

    let password_masked = "*".repeat(app.login_password.chars().count());
    let password_focused = app.login_focus == LoginFocus::Password;
    lines.push(field_line("Password", &password_masked, password_focused));

    // Login button (centered)
    let button_focused = app.login_focus == LoginFocus::Button;
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(label, styles::field_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref notification) = app.notification {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", notification.description),
            styles::notification_style(notification.level),
        )));
    }

    let height = lines.len() as u16 + 2;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    (Paragraph::new(lines).block(block), height)
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    // Show the tail so the cursor stays visible on long input
    let shown: String = {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("      "),
        Span::styled(format!("{}: [", label), styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH),
            styles::field_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left = match (&app.notification, app.view()) {
        (_, GateView::Pending) => Span::styled(" Checking session...", styles::muted_style()),
        (Some(notification), GateView::Protected) => Span::styled(
            format!(" {}: {}", notification.title, notification.description),
            styles::notification_style(notification.level),
        ),
        (_, GateView::Login) => Span::styled(
            " [Tab] next field  [Enter] submit  [Esc] quit",
            styles::muted_style(),
        ),
        (None, GateView::Protected) => Span::styled(" Signed in", styles::success_style()),
    };

    let right = app.session_status();
    let padding = (area.width as usize)
        .saturating_sub(left.content.chars().count() + right.len() + 2);

    let line = Line::from(vec![
        left,
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
        Span::raw(" "),
    ]);

    frame.render_widget(Paragraph::new(line).style(styles::status_bar_style()), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &str) {
    let area = centered_rect_fixed(DIALOG_WIDTH, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
