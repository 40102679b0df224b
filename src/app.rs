//! Application state management for Skycast
//!
//! This module wraps the weather session for the terminal UI: it snapshots
//! the observable session state for rendering and handles keyboard input
//! (quit, manual refresh, unit toggle, theme toggle, help overlay).

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};

use crate::cache::Preferences;
use crate::data::TemperatureUnit;
use crate::session::{SessionState, WeatherSession};

/// Main application struct managing UI state on top of one session
pub struct App {
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show the help overlay
    pub show_help: bool,
    /// Display unit for temperatures
    pub unit: TemperatureUnit,
    /// Explicit theme choice; `None` follows the daytime flag
    pub dark_mode: Option<bool>,
    session: WeatherSession,
    state_rx: tokio::sync::watch::Receiver<SessionState>,
    prefs: Arc<Preferences>,
}

impl App {
    /// Creates the app over a started session, picking up persisted
    /// preferences for unit and theme
    pub fn new(session: WeatherSession, prefs: Arc<Preferences>) -> Self {
        let state_rx = session.subscribe();
        let unit = *prefs.temperature_unit().borrow();
        let dark_mode = *prefs.dark_mode().borrow();
        Self {
            should_quit: false,
            show_help: false,
            unit,
            dark_mode,
            session,
            state_rx,
            prefs,
        }
    }

    /// Snapshot of the latest session state for rendering
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Whether to render with the dark palette: the explicit preference
    /// wins, otherwise night-time data selects it
    pub fn dark_theme(&self) -> bool {
        self.dark_mode
            .unwrap_or_else(|| !self.state_rx.borrow().is_daytime)
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `r`: Refresh now
    /// - `u`: Toggle Celsius/Fahrenheit
    /// - `d`: Toggle dark/light theme
    /// - `?`: Toggle help overlay
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => {
                self.session.request_refresh();
            }
            KeyCode::Char('u') => {
                self.toggle_unit();
            }
            KeyCode::Char('d') => {
                self.toggle_dark_mode();
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn toggle_unit(&mut self) {
        self.unit = self.unit.toggled();
        self.prefs.save_temperature_unit(self.unit);
    }

    fn toggle_dark_mode(&mut self) {
        let next = !self.dark_theme();
        self.dark_mode = Some(next);
        self.prefs.save_dark_mode(next);
    }
}
