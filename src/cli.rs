//! Command-line interface parsing for Skycast
//!
//! This module handles parsing of CLI arguments using clap: an optional
//! coordinate override, the display unit, and the theme.

use clap::Parser;
use thiserror::Error;

use crate::data::location::LocationFix;
use crate::data::TemperatureUnit;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// Latitude outside [-90, 90] or longitude outside [-180, 180]
    #[error("Invalid coordinates: latitude must be in [-90, 90] and longitude in [-180, 180], got ({0}, {1})")]
    InvalidCoordinates(f64, f64),
}

/// Skycast - current conditions, hourly timeline, and 7-day outlook
#[derive(Parser, Debug)]
#[command(name = "skycast")]
#[command(about = "Terminal weather for your location")]
#[command(version)]
pub struct Cli {
    /// Latitude override; skips location discovery (requires --lon)
    #[arg(long, value_name = "DEG", requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude override; skips location discovery (requires --lat)
    #[arg(long, value_name = "DEG", requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Show temperatures in Fahrenheit
    #[arg(long)]
    pub fahrenheit: bool,

    /// Force the dark theme
    #[arg(long, conflicts_with = "light")]
    pub dark: bool,

    /// Force the light theme
    #[arg(long)]
    pub light: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Fixed coordinates, bypassing location discovery
    pub fix: Option<LocationFix>,
    /// Unit override to persist before the first render
    pub unit: Option<TemperatureUnit>,
    /// Theme override to persist before the first render
    pub dark_mode: Option<bool>,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if a coordinate is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let fix = match (cli.lat, cli.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(CliError::InvalidCoordinates(lat, lon));
                }
                Some(LocationFix {
                    latitude: lat,
                    longitude: lon,
                })
            }
            // clap enforces that the flags come as a pair
            _ => None,
        };

        let unit = cli.fahrenheit.then_some(TemperatureUnit::Fahrenheit);
        let dark_mode = if cli.dark {
            Some(true)
        } else if cli.light {
            Some(false)
        } else {
            None
        };

        Ok(StartupConfig {
            fix,
            unit,
            dark_mode,
        })
    }
}
