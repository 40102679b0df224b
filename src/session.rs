//! Weather session controller
//!
//! One `WeatherSession` per live UI view. On cold start it replays the
//! cached response, then always begins a location+fetch cycle and an
//! hour-aligned periodic refresh. Fresh responses are persisted and turned
//! into display state through the forecast assembler. State is published on
//! a watch channel, so any number of observers receive the latest value
//! plus every subsequent update; dropping the session aborts every
//! background task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::cache::Preferences;
use crate::conditions;
use crate::data::location::{LocationFix, LocationProvider};
use crate::data::weather::{CurrentSample, ForecastFetcher, ForecastResponse};
use crate::data::degrees_to_cardinal;
use crate::forecast::{DailyOutlook, Forecast, TimelineEntry};

/// Interval between periodic refreshes once aligned to the top of the hour
const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Current conditions resolved for display
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Rounded Celsius; converted to the display unit at render time
    pub temperature: i32,
    pub apparent_temperature: i32,
    pub weather_code: u16,
    pub icon: &'static str,
    pub label: &'static str,
    pub wind_text: String,
    pub humidity_text: String,
    pub is_daytime: bool,
}

/// The observable UI state owned by one session
///
/// Replaced wholesale on every successful fetch or cache replay;
/// `is_loading`, `is_network_available`, and `error_message` are patched
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub is_loading: bool,
    pub is_network_available: bool,
    pub error_message: Option<String>,
    pub place_name: Option<String>,
    pub current: Option<CurrentConditions>,
    pub today_high: Option<i32>,
    pub today_low: Option<i32>,
    pub timeline: Option<Vec<TimelineEntry>>,
    pub daily_outlook: Option<Vec<DailyOutlook>>,
    pub last_updated_millis: Option<i64>,
    /// Whether the current hour is daytime; drives the automatic theme
    pub is_daytime: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_loading: false,
            is_network_available: true,
            error_message: None,
            place_name: None,
            current: None,
            today_high: None,
            today_low: None,
            timeline: None,
            daily_outlook: None,
            last_updated_millis: None,
            is_daytime: true,
        }
    }
}

/// Derives a full session state from a raw response
///
/// Pure: the same response and instant always produce the same state, so a
/// cache replay is indistinguishable from the live fetch it was saved from.
/// Connection status, place name, and the last-updated stamp carry over
/// from the previous state.
pub fn derive_state(
    previous: &SessionState,
    response: &ForecastResponse,
    now: NaiveDateTime,
) -> SessionState {
    let forecast = Forecast::from_response(response);
    let (today_high, today_low) = forecast.today_high_low(now.date());
    SessionState {
        is_loading: false,
        is_network_available: previous.is_network_available,
        error_message: None,
        place_name: previous.place_name.clone(),
        current: Some(current_conditions(&response.current)),
        today_high,
        today_low,
        timeline: Some(forecast.combined_timeline(now)),
        daily_outlook: Some(forecast.daily_outlook()),
        last_updated_millis: previous.last_updated_millis,
        is_daytime: forecast.is_daytime_at(now),
    }
}

fn current_conditions(current: &CurrentSample) -> CurrentConditions {
    let is_daytime = current.is_day == 1;
    let classification = conditions::classify(current.weather_code, is_daytime);
    CurrentConditions {
        temperature: current.temperature_2m.round() as i32,
        apparent_temperature: current.apparent_temperature.round() as i32,
        weather_code: current.weather_code,
        icon: classification.icon,
        label: classification.label,
        wind_text: format!(
            "{} km/h {}",
            current.wind_speed_10m,
            degrees_to_cardinal(current.wind_direction_10m)
        ),
        humidity_text: format!("{}%", current.relative_humidity_2m as i64),
        is_daytime,
    }
}

/// A live weather session bound to one UI view
pub struct WeatherSession {
    inner: Arc<SessionInner>,
    refresh_tx: mpsc::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

struct SessionInner {
    state_tx: watch::Sender<SessionState>,
    prefs: Arc<Preferences>,
    fetcher: Arc<dyn ForecastFetcher>,
    locator: Arc<dyn LocationProvider>,
    fetch_in_flight: AtomicBool,
}

impl WeatherSession {
    /// Starts a session: cache replay, initial location+fetch cycle,
    /// connectivity tracking, and the hour-aligned refresh loop
    ///
    /// `initial_fix` short-circuits location discovery (CLI override).
    pub fn start(
        fetcher: Arc<dyn ForecastFetcher>,
        locator: Arc<dyn LocationProvider>,
        prefs: Arc<Preferences>,
        connectivity: watch::Receiver<bool>,
        initial_fix: Option<LocationFix>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::default());
        let inner = Arc::new(SessionInner {
            state_tx,
            prefs,
            fetcher,
            locator,
            fetch_in_flight: AtomicBool::new(false),
        });
        let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn({
            let inner = inner.clone();
            async move {
                inner.replay_cache();
                inner.locate_and_fetch(initial_fix).await;
            }
        }));
        tasks.push(tokio::spawn({
            let inner = inner.clone();
            async move {
                while refresh_rx.recv().await.is_some() {
                    inner.refresh().await;
                }
            }
        }));
        tasks.push(tokio::spawn(track_connectivity(inner.clone(), connectivity)));
        tasks.push(tokio::spawn(hourly_refresh(inner.clone())));

        Self {
            inner,
            refresh_tx,
            tasks,
        }
    }

    /// Subscribes an observer; yields the latest state immediately and every
    /// update after it
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Requests a manual refresh; requests arriving while one is already
    /// queued are coalesced
    pub fn request_refresh(&self) {
        let _ = self.refresh_tx.try_send(());
    }
}

impl Drop for WeatherSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl SessionInner {
    /// Replays the persisted response, if present and parseable. A corrupt
    /// blob is equivalent to no cache at all.
    fn replay_cache(&self) {
        let cached = self.prefs.cached_weather_response().borrow().clone();
        let Some(json) = cached else {
            return;
        };
        let response: ForecastResponse = match serde_json::from_str(&json) {
            Ok(response) => response,
            Err(err) => {
                log::warn!("discarding corrupt cached response: {err}");
                return;
            }
        };

        let last_updated = *self.prefs.last_updated().borrow();
        let saved_name = self
            .prefs
            .location()
            .borrow()
            .clone()
            .map(|saved| saved.name);
        self.state_tx.send_modify(|state| {
            state.last_updated_millis = last_updated;
            if state.place_name.is_none() {
                state.place_name = saved_name;
            }
        });
        self.publish_derived(&response);
    }

    fn publish_derived(&self, response: &ForecastResponse) {
        let now = Local::now().naive_local();
        self.state_tx
            .send_modify(|state| *state = derive_state(state, response, now));
    }

    /// Initial location resolution: CLI override, then saved coordinates,
    /// then a live lookup. With no fix at all the failure is surfaced.
    async fn locate_and_fetch(&self, initial_fix: Option<LocationFix>) {
        if let Some(fix) = initial_fix {
            futures::future::join(
                self.fetch(fix.latitude, fix.longitude),
                self.resolve_place_name(fix),
            )
            .await;
            return;
        }

        let saved = self.prefs.location().borrow().clone();
        if let Some(saved) = saved {
            self.state_tx
                .send_modify(|state| state.place_name = Some(saved.name.clone()));
            self.fetch(saved.latitude, saved.longitude).await;
            return;
        }

        match self.locator.current_location().await {
            Ok(fix) => {
                futures::future::join(
                    self.fetch(fix.latitude, fix.longitude),
                    self.resolve_place_name(fix),
                )
                .await;
            }
            Err(err) => {
                log::warn!("location lookup failed: {err}");
                self.state_tx.send_modify(|state| {
                    state.error_message = Some("Failed to get location.".to_string());
                });
            }
        }
    }

    async fn resolve_place_name(&self, fix: LocationFix) {
        match self.locator.reverse_geocode(fix.latitude, fix.longitude).await {
            Ok(name) => {
                self.prefs.save_location(fix.latitude, fix.longitude, &name);
                self.state_tx
                    .send_modify(|state| state.place_name = Some(name));
            }
            Err(err) => {
                log::warn!("reverse geocoding failed: {err}");
            }
        }
    }

    /// Refresh cycle used by the periodic tick and manual refresh: saved
    /// coordinates when present, full location discovery otherwise
    async fn refresh(&self) {
        let saved = self.prefs.location().borrow().clone();
        match saved {
            Some(saved) => self.fetch(saved.latitude, saved.longitude).await,
            None => self.locate_and_fetch(None).await,
        }
    }

    /// Fetches the forecast for a position, persists it, and publishes the
    /// derived state. At most one fetch runs at a time per session; an
    /// overlapping trigger is dropped. `is_loading` is always cleared,
    /// whatever the outcome.
    async fn fetch(&self, lat: f64, lon: f64) {
        if self.fetch_in_flight.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state_tx.send_modify(|state| state.is_loading = true);

        match self.fetcher.fetch_forecast(lat, lon).await {
            Ok(response) => {
                match serde_json::to_string(&response) {
                    Ok(json) => {
                        let millis = Utc::now().timestamp_millis();
                        self.prefs.save_weather_response(&json);
                        self.prefs.save_last_updated(millis);
                        self.state_tx
                            .send_modify(|state| state.last_updated_millis = Some(millis));
                    }
                    Err(err) => log::warn!("failed to serialize response for cache: {err}"),
                }
                self.publish_derived(&response);
            }
            Err(err) => {
                log::warn!("forecast fetch failed: {err}");
                self.state_tx.send_modify(|state| {
                    state.error_message = Some("Failed to refresh weather data.".to_string());
                });
            }
        }

        self.state_tx.send_modify(|state| state.is_loading = false);
        self.fetch_in_flight.store(false, Ordering::SeqCst);
    }
}

/// Mirrors the connectivity signal into the session state
async fn track_connectivity(inner: Arc<SessionInner>, mut connectivity: watch::Receiver<bool>) {
    loop {
        let available = *connectivity.borrow_and_update();
        inner
            .state_tx
            .send_modify(|state| state.is_network_available = available);
        if connectivity.changed().await.is_err() {
            break;
        }
    }
}

/// Waits until the next top of the hour, then refreshes every 60 minutes.
/// Offline ticks are skipped, not queued.
async fn hourly_refresh(inner: Arc<SessionInner>) {
    let now = Local::now();
    let seconds_past_hour = u64::from(now.minute()) * 60 + u64::from(now.second());
    tokio::time::sleep(Duration::from_secs(3600 - seconds_past_hour)).await;

    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        interval.tick().await;
        if inner.state_tx.borrow().is_network_available {
            inner.refresh().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryBackend, PrefData};
    use crate::data::location::LocationError;
    use crate::data::weather::{DailySeries, HourlySeries, WeatherError};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    /// A response whose hourly series brackets the current hour, so the
    /// derived window is non-empty regardless of the wall clock
    fn live_response() -> ForecastResponse {
        let now = Local::now().naive_local();
        let start = now.date().and_hms_opt(0, 0, 0).unwrap() - chrono::Duration::hours(24);
        let mut time = Vec::new();
        for h in 0..96 {
            let t = start + chrono::Duration::hours(h);
            time.push(t.format("%Y-%m-%dT%H:%M").to_string());
        }
        let n = time.len();
        let today = now.date();
        ForecastResponse {
            latitude: 49.28,
            longitude: -123.12,
            timezone: "America/Vancouver".to_string(),
            hourly: HourlySeries {
                time,
                temperature_2m: vec![15.0; n],
                precipitation_probability: vec![10; n],
                weather_code: vec![2; n],
                is_day: vec![1; n],
            },
            daily: DailySeries {
                time: (0..4)
                    .map(|d| (today + chrono::Duration::days(d)).format("%Y-%m-%d").to_string())
                    .collect(),
                sunrise: (0..4)
                    .map(|d| {
                        (today + chrono::Duration::days(d))
                            .and_hms_opt(5, 14, 0)
                            .unwrap()
                            .format("%Y-%m-%dT%H:%M")
                            .to_string()
                    })
                    .collect(),
                sunset: (0..4)
                    .map(|d| {
                        (today + chrono::Duration::days(d))
                            .and_hms_opt(21, 3, 0)
                            .unwrap()
                            .format("%Y-%m-%dT%H:%M")
                            .to_string()
                    })
                    .collect(),
                temperature_2m_max: vec![22.4; 4],
                temperature_2m_min: vec![12.6; 4],
                weather_code: vec![2; 4],
                precipitation_probability_max: vec![20; 4],
            },
            current: CurrentSample {
                temperature_2m: 17.6,
                apparent_temperature: 18.2,
                weather_code: 2,
                is_day: 1,
                relative_humidity_2m: 65.0,
                wind_speed_10m: 12.5,
                wind_direction_10m: 292.0,
            },
        }
    }

    struct FakeFetcher {
        response: Option<ForecastResponse>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl FakeFetcher {
        fn succeeding(response: ForecastResponse) -> Self {
            Self {
                response: Some(response),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ForecastFetcher for FakeFetcher {
        async fn fetch_forecast(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> Result<ForecastResponse, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.response {
                Some(response) => Ok(response.clone()),
                None => Err(WeatherError::ParseError(
                    serde_json::from_str::<ForecastResponse>("{}").unwrap_err(),
                )),
            }
        }
    }

    struct FakeLocator {
        fix: Option<LocationFix>,
    }

    #[async_trait]
    impl LocationProvider for FakeLocator {
        async fn current_location(&self) -> Result<LocationFix, LocationError> {
            self.fix
                .ok_or_else(|| LocationError::LookupFailed("no fix".to_string()))
        }

        async fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Result<String, LocationError> {
            Ok("Vancouver, British Columbia".to_string())
        }
    }

    fn prefs_with(data: PrefData) -> Arc<Preferences> {
        Arc::new(Preferences::new(Box::new(MemoryBackend::with_data(data))))
    }

    async fn wait_for<F>(rx: &mut watch::Receiver<SessionState>, predicate: F) -> SessionState
    where
        F: Fn(&SessionState) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if predicate(&rx.borrow()) {
                    return rx.borrow().clone();
                }
                rx.changed().await.expect("session dropped");
            }
        })
        .await
        .expect("state never matched")
    }

    #[test]
    fn test_derive_state_is_pure() {
        let response = live_response();
        let now = dt("2024-05-25T07:00");
        let a = derive_state(&SessionState::default(), &response, now);
        let b = derive_state(&SessionState::default(), &response, now);
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_state_resolves_current_conditions() {
        let response = live_response();
        let state = derive_state(
            &SessionState::default(),
            &response,
            Local::now().naive_local(),
        );

        let current = state.current.expect("current conditions");
        assert_eq!(current.temperature, 18);
        assert_eq!(current.apparent_temperature, 18);
        assert_eq!(current.wind_text, "12.5 km/h WNW");
        assert_eq!(current.humidity_text, "65%");
        assert_eq!(current.label, "Partly Cloudy");
        assert_eq!(state.today_high, Some(22));
        assert_eq!(state.today_low, Some(13));
        assert!(state.timeline.is_some());
        assert!(!state.timeline.unwrap().is_empty());
        assert!(state.error_message.is_none());
        assert!(!state.is_loading);
    }

    #[test]
    fn test_derive_state_carries_connection_and_place() {
        let previous = SessionState {
            is_network_available: false,
            place_name: Some("Vancouver".to_string()),
            last_updated_millis: Some(42),
            ..Default::default()
        };
        let state = derive_state(&previous, &live_response(), Local::now().naive_local());
        assert!(!state.is_network_available);
        assert_eq!(state.place_name.as_deref(), Some("Vancouver"));
        assert_eq!(state.last_updated_millis, Some(42));
    }

    #[tokio::test]
    async fn test_cold_start_replays_cache_before_fetch() {
        let response = live_response();
        let cached = serde_json::to_string(&response).unwrap();
        let prefs = prefs_with(PrefData {
            cached_weather_response: Some(cached),
            last_updated_timestamp: Some(1_716_600_000_000),
            ..Default::default()
        });
        // The fetcher fails, so any derived data must come from the cache
        let session = WeatherSession::start(
            Arc::new(FakeFetcher::failing()),
            Arc::new(FakeLocator {
                fix: Some(LocationFix {
                    latitude: 49.28,
                    longitude: -123.12,
                }),
            }),
            prefs,
            watch::channel(true).1,
            None,
        );

        let mut rx = session.subscribe();
        let state = wait_for(&mut rx, |s| s.current.is_some()).await;
        assert_eq!(state.last_updated_millis, Some(1_716_600_000_000));
        assert!(state.daily_outlook.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_swallowed() {
        let prefs = prefs_with(PrefData {
            cached_weather_response: Some("{ not valid".to_string()),
            ..Default::default()
        });
        let session = WeatherSession::start(
            Arc::new(FakeFetcher::succeeding(live_response())),
            Arc::new(FakeLocator {
                fix: Some(LocationFix {
                    latitude: 49.28,
                    longitude: -123.12,
                }),
            }),
            prefs,
            watch::channel(true).1,
            None,
        );

        // The session still reaches a derived state via the live fetch
        let mut rx = session.subscribe();
        let state = wait_for(&mut rx, |s| s.current.is_some()).await;
        assert!(state.error_message.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_last_good_state_and_sets_error() {
        let response = live_response();
        let cached = serde_json::to_string(&response).unwrap();
        let prefs = prefs_with(PrefData {
            latitude: Some(49.28),
            longitude: Some(-123.12),
            location_name: Some("Vancouver".to_string()),
            cached_weather_response: Some(cached),
            ..Default::default()
        });
        let session = WeatherSession::start(
            Arc::new(FakeFetcher::failing()),
            Arc::new(FakeLocator { fix: None }),
            prefs,
            watch::channel(true).1,
            None,
        );

        let mut rx = session.subscribe();
        let state = wait_for(&mut rx, |s| {
            s.error_message.is_some() && !s.is_loading
        })
        .await;
        // Derived data from the replay survives the failed fetch
        assert!(state.current.is_some());
        assert_eq!(
            state.error_message.as_deref(),
            Some("Failed to refresh weather data.")
        );
    }

    #[tokio::test]
    async fn test_location_failure_is_surfaced() {
        let prefs = prefs_with(PrefData::default());
        let session = WeatherSession::start(
            Arc::new(FakeFetcher::succeeding(live_response())),
            Arc::new(FakeLocator { fix: None }),
            prefs,
            watch::channel(true).1,
            None,
        );

        let mut rx = session.subscribe();
        let state = wait_for(&mut rx, |s| s.error_message.is_some()).await;
        assert_eq!(state.error_message.as_deref(), Some("Failed to get location."));
        assert!(state.current.is_none());
    }

    #[tokio::test]
    async fn test_successful_fetch_persists_response_and_timestamp() {
        let prefs = prefs_with(PrefData::default());
        let session = WeatherSession::start(
            Arc::new(FakeFetcher::succeeding(live_response())),
            Arc::new(FakeLocator {
                fix: Some(LocationFix {
                    latitude: 49.28,
                    longitude: -123.12,
                }),
            }),
            prefs.clone(),
            watch::channel(true).1,
            None,
        );

        let mut rx = session.subscribe();
        let state = wait_for(&mut rx, |s| {
            s.current.is_some() && !s.is_loading && s.place_name.is_some()
        })
        .await;

        assert!(prefs.cached_weather_response().borrow().is_some());
        assert!(prefs.last_updated().borrow().is_some());
        assert_eq!(state.last_updated_millis, *prefs.last_updated().borrow());
        assert_eq!(
            state.place_name.as_deref(),
            Some("Vancouver, British Columbia")
        );
    }

    #[tokio::test]
    async fn test_connectivity_change_patches_flag_only() {
        let (conn_tx, conn_rx) = watch::channel(true);
        let prefs = prefs_with(PrefData::default());
        let session = WeatherSession::start(
            Arc::new(FakeFetcher::succeeding(live_response())),
            Arc::new(FakeLocator {
                fix: Some(LocationFix {
                    latitude: 49.28,
                    longitude: -123.12,
                }),
            }),
            prefs,
            conn_rx,
            None,
        );

        let mut rx = session.subscribe();
        wait_for(&mut rx, |s| s.is_network_available).await;

        conn_tx.send_replace(false);
        let state = wait_for(&mut rx, |s| !s.is_network_available).await;
        assert!(!state.is_network_available);

        conn_tx.send_replace(true);
        wait_for(&mut rx, |s| s.is_network_available).await;
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_collapse_to_one_fetch() {
        let fetcher = Arc::new(FakeFetcher {
            response: Some(live_response()),
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(100),
        });
        let prefs = prefs_with(PrefData {
            latitude: Some(49.28),
            longitude: Some(-123.12),
            location_name: Some("Vancouver".to_string()),
            ..Default::default()
        });
        let session = WeatherSession::start(
            fetcher.clone(),
            Arc::new(FakeLocator { fix: None }),
            prefs,
            watch::channel(true).1,
            None,
        );

        let mut rx = session.subscribe();
        wait_for(&mut rx, |s| s.is_loading).await;

        // Trigger more refreshes while the first fetch is still sleeping
        session.request_refresh();
        session.request_refresh();
        wait_for(&mut rx, |s| !s.is_loading && s.current.is_some()).await;
        tokio::time::sleep(Duration::from_millis(250)).await;

        // The initial fetch plus at most one queued manual refresh
        assert!(fetcher.calls.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_drop_aborts_background_tasks() {
        let prefs = prefs_with(PrefData::default());
        let session = WeatherSession::start(
            Arc::new(FakeFetcher::succeeding(live_response())),
            Arc::new(FakeLocator {
                fix: Some(LocationFix {
                    latitude: 49.28,
                    longitude: -123.12,
                }),
            }),
            prefs,
            watch::channel(true).1,
            None,
        );

        let mut rx = session.subscribe();
        wait_for(&mut rx, |s| s.current.is_some()).await;
        drop(session);

        // With every task aborted and the sender gone, the channel closes
        tokio::time::timeout(Duration::from_secs(2), async {
            while rx.changed().await.is_ok() {}
        })
        .await
        .expect("channel should close after drop");
    }
}
