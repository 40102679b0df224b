//! Forecast assembly
//!
//! Turns a raw forecast response into the UI-facing structures: a rolling
//! 24-hour window, a combined timeline interleaving sunrise/sunset markers
//! with the hourly samples, a 7-day outlook, and today's high/low.
//!
//! The API's index-aligned parallel arrays are normalized into one composite
//! record per timestamp on ingestion; everything downstream reads the record
//! sequences. Malformed or incomplete indices are dropped at that boundary
//! and the derivations degrade softly: an unmatched "now" yields an empty
//! window, a bad day record is skipped, an unparseable sun timestamp means
//! no marker.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::conditions::{self, Classification};
use crate::data::weather::{DailySeries, ForecastResponse, HourlySeries};
use crate::timefmt;

/// One normalized hourly record: a timestamp plus every value sharing its
/// index in the raw arrays. `raw_time` keeps the verbatim series string,
/// which is the exact-match key for locating "now".
#[derive(Debug, Clone, PartialEq)]
pub struct HourRecord {
    pub raw_time: String,
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub precipitation_probability: u8,
    pub weather_code: u16,
    pub is_daytime: bool,
}

/// One normalized daily record
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub raw_date: String,
    pub date: NaiveDate,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub weather_code: u16,
    pub precipitation_probability_max: u8,
}

/// An hourly sample inside the rolling window
///
/// The temperature belongs to the hour before `local_time`: element 0 of a
/// window carries the current hour's temperature alongside the next hour's
/// precipitation, condition, and daytime flag.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySample {
    pub local_time: NaiveDateTime,
    pub temperature: f64,
    pub precipitation_probability: u8,
    pub weather_code: u16,
    pub is_daytime: bool,
}

/// A classified hourly sample ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSample {
    pub clock_time: String,
    pub sample: HourlySample,
    pub classification: Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunEventKind {
    Sunrise,
    Sunset,
}

impl SunEventKind {
    pub fn label(self) -> &'static str {
        match self {
            SunEventKind::Sunrise => "Sunrise",
            SunEventKind::Sunset => "Sunset",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            SunEventKind::Sunrise => "\u{1F305}", // 🌅
            SunEventKind::Sunset => "\u{1F307}",  // 🌇
        }
    }
}

/// A sunrise or sunset marker placed inside the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct SunEvent {
    pub kind: SunEventKind,
    pub clock_time: String,
    pub icon: &'static str,
}

/// One entry of the combined timeline, chronological by the moment it
/// represents: each hourly sample first, then any sun events falling inside
/// that sample's hour bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    Condition(ConditionSample),
    Sun(SunEvent),
}

/// One day of the 7-day outlook
#[derive(Debug, Clone, PartialEq)]
pub struct DailyOutlook {
    pub day_name: String,
    pub high: i32,
    pub low: i32,
    pub weather_code: u16,
    pub precipitation_chance: u8,
    pub day_icon: &'static str,
    pub night_icon: &'static str,
}

/// A forecast normalized for assembly
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub hours: Vec<HourRecord>,
    pub days: Vec<DayRecord>,
}

impl Forecast {
    /// Normalizes a raw response into per-timestamp records
    pub fn from_response(response: &ForecastResponse) -> Self {
        Self {
            hours: normalize_hours(&response.hourly),
            days: normalize_days(&response.daily),
        }
    }

    fn hour_index(&self, key: &str) -> Option<usize> {
        timefmt::find_hour_index(self.hours.iter().map(|h| h.raw_time.as_str()), key)
    }

    /// Builds the rolling window of up to 24 samples following the current
    /// hour bucket
    ///
    /// Sample timestamps, precipitation, condition codes, and daytime flags
    /// start at the hour after "now"; the temperature series starts one hour
    /// earlier so that element 0 shows the current temperature. An unmatched
    /// "now" yields an empty window.
    pub fn hourly_window(&self, now: NaiveDateTime) -> Vec<HourlySample> {
        let key = timefmt::hour_bucket_key(now);
        let Some(idx) = self.hour_index(&key) else {
            return Vec::new();
        };

        self.hours[idx + 1..]
            .iter()
            .take(24)
            .enumerate()
            .map(|(offset, hour)| HourlySample {
                local_time: hour.time,
                temperature: self.hours[idx + offset].temperature,
                precipitation_probability: hour.precipitation_probability,
                weather_code: hour.weather_code,
                is_daytime: hour.is_daytime,
            })
            .collect()
    }

    /// Interleaves sunrise/sunset markers into the hourly window
    ///
    /// A sun instant attaches to the hour bucket `[t, t + 1h)` containing
    /// it, immediately after that bucket's sample: an event exactly on the
    /// hour belongs to that hour's bucket, not the previous one. Instants
    /// outside the window are omitted.
    pub fn combined_timeline(&self, now: NaiveDateTime) -> Vec<TimelineEntry> {
        let window = self.hourly_window(now);
        let sun_events = self.upcoming_sun_events();

        let mut timeline = Vec::with_capacity(window.len() + sun_events.len());
        for sample in window {
            let bucket_start = sample.local_time;
            let bucket_end = bucket_start + Duration::hours(1);
            let classification =
                conditions::classify(sample.weather_code, sample.is_daytime);
            timeline.push(TimelineEntry::Condition(ConditionSample {
                clock_time: timefmt::clock_time(bucket_start),
                sample,
                classification,
            }));
            for &(kind, instant) in &sun_events {
                if instant >= bucket_start && instant < bucket_end {
                    timeline.push(TimelineEntry::Sun(SunEvent {
                        kind,
                        clock_time: timefmt::clock_time(instant),
                        icon: kind.icon(),
                    }));
                }
            }
        }
        timeline
    }

    /// The four sun instants that can appear in a 24-hour window: today's
    /// and tomorrow's sunrise and sunset. Missing or unparseable instants
    /// are absent.
    fn upcoming_sun_events(&self) -> Vec<(SunEventKind, NaiveDateTime)> {
        let today = self.days.first();
        let tomorrow = self.days.get(1);
        [
            (SunEventKind::Sunrise, today.and_then(|d| d.sunrise)),
            (SunEventKind::Sunrise, tomorrow.and_then(|d| d.sunrise)),
            (SunEventKind::Sunset, today.and_then(|d| d.sunset)),
            (SunEventKind::Sunset, tomorrow.and_then(|d| d.sunset)),
        ]
        .into_iter()
        .filter_map(|(kind, instant)| instant.map(|at| (kind, at)))
        .collect()
    }

    /// Builds the 7-day outlook; entry 0 is always the first day record,
    /// whatever its date
    pub fn daily_outlook(&self) -> Vec<DailyOutlook> {
        self.days
            .iter()
            .take(7)
            .map(|day| DailyOutlook {
                day_name: day.date.format("%A").to_string(),
                high: day.max_temperature.round() as i32,
                low: day.min_temperature.round() as i32,
                weather_code: day.weather_code,
                precipitation_chance: day.precipitation_probability_max,
                day_icon: conditions::classify(day.weather_code, true).icon,
                night_icon: conditions::classify(day.weather_code, false).icon,
            })
            .collect()
    }

    /// Looks up today's high and low by date key, independently of array
    /// position; `(None, None)` when no daily entry carries today's date
    pub fn today_high_low(&self, today: NaiveDate) -> (Option<i32>, Option<i32>) {
        let key = timefmt::date_key(today);
        match self.days.iter().find(|d| d.raw_date == key) {
            Some(day) => (
                Some(day.max_temperature.round() as i32),
                Some(day.min_temperature.round() as i32),
            ),
            None => (None, None),
        }
    }

    /// Daytime flag of the current hour bucket; false when the bucket is
    /// not present in the series
    pub fn is_daytime_at(&self, now: NaiveDateTime) -> bool {
        let key = timefmt::hour_bucket_key(now);
        self.hour_index(&key)
            .map(|idx| self.hours[idx].is_daytime)
            .unwrap_or(false)
    }
}

fn normalize_hours(hourly: &HourlySeries) -> Vec<HourRecord> {
    hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let time = match timefmt::parse_local_timestamp(raw) {
                Ok(t) => t,
                Err(err) => {
                    log::warn!("skipping hourly sample: {err}");
                    return None;
                }
            };
            Some(HourRecord {
                raw_time: raw.clone(),
                time,
                temperature: *hourly.temperature_2m.get(i)?,
                precipitation_probability: clamp_percent(
                    *hourly.precipitation_probability.get(i)?,
                ),
                weather_code: *hourly.weather_code.get(i)?,
                is_daytime: *hourly.is_day.get(i)? == 1,
            })
        })
        .collect()
}

fn normalize_days(daily: &DailySeries) -> Vec<DayRecord> {
    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let date = match timefmt::parse_local_date(raw) {
                Ok(d) => d,
                Err(err) => {
                    log::warn!("skipping daily entry: {err}");
                    return None;
                }
            };
            Some(DayRecord {
                raw_date: raw.clone(),
                date,
                // A bad or missing sun timestamp removes the marker, not the day
                sunrise: parse_sun_instant(daily.sunrise.get(i)),
                sunset: parse_sun_instant(daily.sunset.get(i)),
                max_temperature: *daily.temperature_2m_max.get(i)?,
                min_temperature: *daily.temperature_2m_min.get(i)?,
                weather_code: *daily.weather_code.get(i)?,
                precipitation_probability_max: clamp_percent(
                    *daily.precipitation_probability_max.get(i)?,
                ),
            })
        })
        .collect()
}

fn parse_sun_instant(raw: Option<&String>) -> Option<NaiveDateTime> {
    let raw = raw?;
    match timefmt::parse_local_timestamp(raw) {
        Ok(t) => Some(t),
        Err(err) => {
            log::warn!("ignoring sun event: {err}");
            None
        }
    }
}

fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}
