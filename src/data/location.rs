//! Location lookup for the terminal client
//!
//! A terminal has no GPS, so the current position comes from an IP
//! geolocation service; place names come from reverse geocoding. Both are
//! thin HTTP clients behind the `LocationProvider` port.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// IP geolocation endpoint: one call yields coordinates for the caller's IP
const IP_LOCATION_URL: &str = "http://ip-api.com/json";

/// Free reverse-geocoding endpoint, no API key required
const REVERSE_GEOCODE_URL: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";

/// A resolved geographic position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// Errors that can occur when resolving a location or place name
#[derive(Debug, Error)]
pub enum LocationError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The lookup service answered but could not produce a fix
    #[error("location lookup failed: {0}")]
    LookupFailed(String),
}

/// Port for the location collaborator
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Resolves the current position, or fails
    async fn current_location(&self) -> Result<LocationFix, LocationError>;

    /// Resolves a human-readable place name for a position
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String, LocationError>;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    city: String,
    #[serde(default, rename = "principalSubdivision")]
    principal_subdivision: String,
    #[serde(default, rename = "countryName")]
    country_name: String,
}

/// Builds a readable place string from the available address components,
/// falling back to the country name when city/region are absent
fn format_place(response: &ReverseGeocodeResponse) -> String {
    let joined = [
        response.city.as_str(),
        response.principal_subdivision.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .cloned()
    .collect::<Vec<_>>()
    .join(", ");

    if joined.is_empty() {
        response.country_name.clone()
    } else {
        joined
    }
}

/// Client for IP geolocation and reverse geocoding
#[derive(Debug, Clone)]
pub struct LocationClient {
    client: Client,
}

impl Default for LocationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    #[allow(dead_code)]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LocationProvider for LocationClient {
    async fn current_location(&self) -> Result<LocationFix, LocationError> {
        let response = self.client.get(IP_LOCATION_URL).send().await?;
        let parsed: IpApiResponse = response.json().await?;

        if parsed.status != "success" {
            return Err(LocationError::LookupFailed(parsed.message));
        }
        Ok(LocationFix {
            latitude: parsed.lat,
            longitude: parsed.lon,
        })
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String, LocationError> {
        let url = format!(
            "{}?latitude={}&longitude={}&localityLanguage=en",
            REVERSE_GEOCODE_URL, lat, lon
        );
        let response = self.client.get(&url).send().await?;
        let parsed: ReverseGeocodeResponse = response.json().await?;

        let place = format_place(&parsed);
        if place.is_empty() {
            return Err(LocationError::LookupFailed(format!(
                "no place name for {}, {}",
                lat, lon
            )));
        }
        Ok(place)
    }
}
