//! User preference and cache persistence
//!
//! An observable key-value store: the whole preference document is one JSON
//! file under the XDG config directory, and every key exposes a watch
//! channel yielding the stored value (`None`/default before the first
//! write) followed by every subsequent update. The backing storage is a
//! small trait so tests run against an in-memory document.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::data::TemperatureUnit;

/// On-disk document holding every persisted key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefData {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub dark_mode_enabled: Option<bool>,
    pub temperature_unit: Option<TemperatureUnit>,
    pub cached_weather_response: Option<String>,
    pub last_updated_timestamp: Option<i64>,
}

/// A saved location: coordinates plus the resolved place name
#[derive(Debug, Clone, PartialEq)]
pub struct SavedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

/// Backing storage for the preference document
pub trait PrefBackend: Send + Sync {
    /// Loads the stored document; `None` when absent or unreadable
    fn load(&self) -> Option<PrefData>;
    /// Persists the document
    fn save(&self, data: &PrefData) -> io::Result<()>;
}

/// Stores the preference document as a JSON file
#[derive(Debug, Clone)]
pub struct DiskBackend {
    path: PathBuf,
}

impl DiskBackend {
    /// Creates a backend under the XDG-compliant config directory
    /// (`~/.config/skycast/prefs.json` on Linux). Returns `None` if the
    /// directory cannot be determined.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "skycast")?;
        Some(Self {
            path: project_dirs.config_dir().join("prefs.json"),
        })
    }

    /// Creates a backend at a specific file path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PrefBackend for DiskBackend {
    fn load(&self) -> Option<PrefData> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn save(&self, data: &PrefData) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, json)
    }
}

/// In-memory backend for tests
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Mutex<Option<PrefData>>,
}

impl MemoryBackend {
    /// Creates a backend pre-seeded with a document
    pub fn with_data(data: PrefData) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }
}

impl PrefBackend for MemoryBackend {
    fn load(&self) -> Option<PrefData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, data: &PrefData) -> io::Result<()> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(data.clone());
        Ok(())
    }
}

/// Observable preference store
///
/// Writes update the in-memory document, persist it through the backend,
/// and broadcast the new value to every subscriber of the affected key.
pub struct Preferences {
    backend: Box<dyn PrefBackend>,
    state: Mutex<PrefData>,
    location_tx: watch::Sender<Option<SavedLocation>>,
    dark_mode_tx: watch::Sender<Option<bool>>,
    unit_tx: watch::Sender<TemperatureUnit>,
    cached_response_tx: watch::Sender<Option<String>>,
    last_updated_tx: watch::Sender<Option<i64>>,
}

impl Preferences {
    /// Creates a store over the given backend, loading any existing document
    pub fn new(backend: Box<dyn PrefBackend>) -> Self {
        let data = backend.load().unwrap_or_default();
        let (location_tx, _) = watch::channel(saved_location(&data));
        let (dark_mode_tx, _) = watch::channel(data.dark_mode_enabled);
        let (unit_tx, _) = watch::channel(data.temperature_unit.unwrap_or_default());
        let (cached_response_tx, _) = watch::channel(data.cached_weather_response.clone());
        let (last_updated_tx, _) = watch::channel(data.last_updated_timestamp);
        Self {
            backend,
            state: Mutex::new(data),
            location_tx,
            dark_mode_tx,
            unit_tx,
            cached_response_tx,
            last_updated_tx,
        }
    }

    /// Creates a store over the default disk backend, or `None` if no
    /// config directory is available
    pub fn open_disk() -> Option<Self> {
        DiskBackend::new().map(|backend| Self::new(Box::new(backend)))
    }

    fn update<F>(&self, mutate: F) -> PrefData
    where
        F: FnOnce(&mut PrefData),
    {
        let mut data = self.state.lock().unwrap_or_else(|e| e.into_inner());
        mutate(&mut data);
        if let Err(err) = self.backend.save(&data) {
            log::warn!("failed to persist preferences: {err}");
        }
        data.clone()
    }

    pub fn save_location(&self, lat: f64, lon: f64, name: &str) {
        let data = self.update(|d| {
            d.latitude = Some(lat);
            d.longitude = Some(lon);
            d.location_name = Some(name.to_string());
        });
        self.location_tx.send_replace(saved_location(&data));
    }

    pub fn location(&self) -> watch::Receiver<Option<SavedLocation>> {
        self.location_tx.subscribe()
    }

    pub fn save_dark_mode(&self, enabled: bool) {
        self.update(|d| d.dark_mode_enabled = Some(enabled));
        self.dark_mode_tx.send_replace(Some(enabled));
    }

    pub fn dark_mode(&self) -> watch::Receiver<Option<bool>> {
        self.dark_mode_tx.subscribe()
    }

    pub fn save_temperature_unit(&self, unit: TemperatureUnit) {
        self.update(|d| d.temperature_unit = Some(unit));
        self.unit_tx.send_replace(unit);
    }

    pub fn temperature_unit(&self) -> watch::Receiver<TemperatureUnit> {
        self.unit_tx.subscribe()
    }

    pub fn save_weather_response(&self, response_json: &str) {
        self.update(|d| d.cached_weather_response = Some(response_json.to_string()));
        self.cached_response_tx
            .send_replace(Some(response_json.to_string()));
    }

    pub fn cached_weather_response(&self) -> watch::Receiver<Option<String>> {
        self.cached_response_tx.subscribe()
    }

    pub fn save_last_updated(&self, timestamp_millis: i64) {
        self.update(|d| d.last_updated_timestamp = Some(timestamp_millis));
        self.last_updated_tx.send_replace(Some(timestamp_millis));
    }

    pub fn last_updated(&self) -> watch::Receiver<Option<i64>> {
        self.last_updated_tx.subscribe()
    }
}

fn saved_location(data: &PrefData) -> Option<SavedLocation> {
    match (data.latitude, data.longitude, &data.location_name) {
        (Some(latitude), Some(longitude), Some(name)) => Some(SavedLocation {
            latitude,
            longitude,
            name: name.clone(),
        }),
        _ => None,
    }
}
