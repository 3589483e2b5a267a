use ratatui::style::{Color, Modifier, Style};

use sessiongate_core::auth::NotificationLevel;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SUCCESS: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);
pub const STATUS_BAR: Color = Color::Rgb(32, 32, 40);

pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

/// Form inputs and the login button
pub fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
    } else {
        list_item_style()
    }
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SUCCESS)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn notification_style(level: NotificationLevel) -> Style {
    match level {
        NotificationLevel::Success => success_style(),
        NotificationLevel::Error => error_style(),
    }
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(STATUS_BAR).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}
