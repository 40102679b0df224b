//! UI rendering module for Skycast
//!
//! This module contains all the rendering logic for the terminal user
//! interface, using the ratatui library for TUI components.

pub mod help_overlay;
pub mod landing;

pub use help_overlay::render as render_help_overlay;
pub use landing::{render as render_landing, render_loading};
