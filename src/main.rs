//! Skycast - terminal weather for your location
//!
//! A terminal UI application that shows current conditions, an hourly
//! timeline with sunrise/sunset markers, and a 7-day outlook.

use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use skycast::app::App;
use skycast::cache::{MemoryBackend, Preferences};
use skycast::cli::{Cli, StartupConfig};
use skycast::connectivity::ConnectivityObserver;
use skycast::data::location::LocationClient;
use skycast::data::weather::WeatherClient;
use skycast::session::WeatherSession;
use skycast::ui;

/// Sets up a panic hook that restores the terminal before printing the panic
/// message, so the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    let state = app.state();
    if state.current.is_none() && state.is_loading {
        ui::render_loading(frame);
    } else {
        ui::render_landing(frame, app);
    }
    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = StartupConfig::from_cli(&cli)?;

    setup_panic_hook();

    // Preferences fall back to an in-memory store when no config directory
    // is available (nothing persists, the session still works)
    let prefs = Arc::new(
        Preferences::open_disk()
            .unwrap_or_else(|| Preferences::new(Box::<MemoryBackend>::default())),
    );
    if let Some(unit) = config.unit {
        prefs.save_temperature_unit(unit);
    }
    if let Some(dark) = config.dark_mode {
        prefs.save_dark_mode(dark);
    }

    let connectivity = ConnectivityObserver::spawn();
    let session = WeatherSession::start(
        Arc::new(WeatherClient::new()),
        Arc::new(LocationClient::new()),
        prefs.clone(),
        connectivity.subscribe(),
        config.fix,
    );
    let mut app = App::new(session, prefs);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    loop {
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout; session updates
        // arrive through the watch channel and show up on the next draw
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
