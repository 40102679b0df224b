//! Open-Meteo forecast API client
//!
//! Fetches the forecast for a coordinate pair and deserializes it into the
//! raw response structs. Field names follow the wire schema exactly; the
//! cached copy of the last response round-trips through these same structs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL for the Open-Meteo API
const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Fixed query field lists; the server resolves local time via timezone=auto
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,weather_code,is_day";
const DAILY_FIELDS: &str =
    "sunrise,sunset,temperature_2m_max,temperature_2m_min,weather_code,precipitation_probability_max";
const CURRENT_FIELDS: &str = "apparent_temperature,temperature_2m,weather_code,is_day,relative_humidity_2m,wind_speed_10m,wind_direction_10m";

/// A raw forecast response, immutable once received
///
/// The hourly and daily blocks are parallel arrays sharing one length each;
/// index alignment is the only correlation between a timestamp and its
/// sample values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
    pub current: CurrentSample,
}

/// Hourly parallel arrays, index-aligned with `time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub precipitation_probability: Vec<i64>,
    pub weather_code: Vec<u16>,
    pub is_day: Vec<u8>,
}

/// Daily parallel arrays, index-aligned with `time`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub temperature_2m_max: Vec<f64>,
    pub temperature_2m_min: Vec<f64>,
    pub weather_code: Vec<u16>,
    pub precipitation_probability_max: Vec<i64>,
}

/// Current conditions block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSample {
    pub temperature_2m: f64,
    pub apparent_temperature: f64,
    pub weather_code: u16,
    pub is_day: u8,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
    pub wind_direction_10m: f64,
}

/// Errors that can occur when fetching forecast data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Port for the forecast fetch collaborator, so the session controller can
/// run against an in-memory fake in tests
#[async_trait]
pub trait ForecastFetcher: Send + Sync {
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse, WeatherError>;
}

/// Client for fetching forecast data from the Open-Meteo API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherClient {
    /// Create a new WeatherClient with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a new WeatherClient with a custom HTTP client
    #[allow(dead_code)]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn forecast_url(lat: f64, lon: f64) -> String {
        format!(
            "{}?latitude={}&longitude={}&timezone=auto&hourly={}&daily={}&current={}",
            OPEN_METEO_BASE_URL, lat, lon, HOURLY_FIELDS, DAILY_FIELDS, CURRENT_FIELDS
        )
    }
}

#[async_trait]
impl ForecastFetcher for WeatherClient {
    /// Fetch the forecast for the given coordinates
    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse, WeatherError> {
        let url = Self::forecast_url(lat, lon);
        let response = self.client.get(&url).send().await?;
        let text = response.text().await?;
        let parsed: ForecastResponse = serde_json::from_str(&text)?;
        Ok(parsed)
    }
}
