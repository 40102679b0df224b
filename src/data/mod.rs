//! Core data types for Skycast
//!
//! This module contains the external-collaborator clients (forecast fetch,
//! location lookup) and the small display-unit helpers shared across the
//! application.

pub mod location;
pub mod weather;

pub use location::{LocationClient, LocationError, LocationFix, LocationProvider};
#[allow(unused_imports)]
pub use weather::{ForecastFetcher, ForecastResponse, WeatherClient, WeatherError};

use serde::{Deserialize, Serialize};

/// Temperature unit selected by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Display symbol for the unit
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "\u{2103}",
            TemperatureUnit::Fahrenheit => "\u{2109}",
        }
    }

    /// The other unit
    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    /// Converts a stored Celsius value into this unit for display
    pub fn display(self, celsius: i32) -> i32 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }
}

/// Converts an integer Celsius temperature to Fahrenheit
///
/// Source values are rounded to integer Celsius before conversion, so the
/// integer arithmetic (with its truncating division) is the intended
/// behavior.
pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    celsius * 9 / 5 + 32
}

/// Maps wind direction degrees to a 16-point compass direction
pub fn degrees_to_cardinal(degrees: f64) -> &'static str {
    const DIRECTIONS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let index = (((degrees + 11.25) / 22.5).floor() as isize).rem_euclid(16) as usize;
    DIRECTIONS[index]
}
