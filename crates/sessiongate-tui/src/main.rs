//! sessiongate - a terminal front-end that keeps protected content behind
//! a login session.
//!
//! The session is a plain authenticated flag with an expiry, persisted in the
//! user's data directory and checked once at startup.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sessiongate_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside the cache directory
const LOG_FILE_NAME: &str = "sessiongate.log";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a daily-rolling file.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(config: &Config) -> WorkerGuard {
    let log_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./logs"));
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {:#}. Using default configuration.", e);
            let mut config = Config::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
    };

    let _log_guard = init_tracing(&config);

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--login") => return login_interactive(config).await,
        Some("--logout") => return logout(config),
        Some("--status") => return status(config),
        Some(other) => bail!("Unknown argument: {} (expected --login, --logout or --status)", other),
        None => {}
    }

    info!("sessiongate starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
    }

    info!("sessiongate shutting down");
    Ok(())
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<()> {
    let mut app = App::new(config)?;

    // First frame before the session check: chrome only, no form, no content
    terminal.draw(|f| render(f, &app))?;
    app.initialize();

    run_app(terminal, &mut app).await
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        app.check_notifications();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// CLI commands
// ============================================================================

/// Prompt-based login (no TUI)
async fn login_interactive(config: Config) -> Result<()> {
    let mut app = App::new(config)?;
    if app.initialize().authenticated {
        println!("Already logged in. {}.", app.session_status());
        return Ok(());
    }

    println!("\n=== sessiongate login ===\n");

    let username = match app.config.last_username.clone() {
        Some(last_user) => {
            print!("Username [{}]: ", last_user);
            io::stdout().flush()?;
            let input = read_line()?;
            if input.is_empty() {
                last_user
            } else {
                input
            }
        }
        None => {
            print!("Username: ");
            io::stdout().flush()?;
            read_line()?
        }
    };

    app.login_username = username;
    app.login_password = rpassword::prompt_password("Password: ")?;

    println!("\nAuthenticating...");
    let result = app.attempt_login().await;

    if let Some(ref notification) = app.notification {
        println!("{}: {}", notification.title, notification.description);
    }
    if let Err(e) = result {
        warn!(error = %e, "Interactive login failed");
        return Err(e.context("Login failed"));
    }

    println!("{}.", app.session_status());
    Ok(())
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn logout(config: Config) -> Result<()> {
    let mut app = App::new(config)?;
    app.initialize();
    app.logout();
    println!("Logged out.");
    Ok(())
}

fn status(config: Config) -> Result<()> {
    let mut app = App::new(config)?;
    let state = app.initialize();
    if state.authenticated {
        println!("Logged in. {}.", app.session_status());
    } else {
        println!("Not logged in.");
    }
    Ok(())
}
