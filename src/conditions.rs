//! WMO weather-code classification
//!
//! Maps the integer condition codes reported by Open-Meteo to a coarse
//! condition category, a display glyph (with day/night variants), and a
//! human-readable label. The mapping is total: codes outside the known
//! enumeration fall back to the clear-sky classification instead of erroring.

/// Coarse condition categories used for theming and summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCategory {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Rain,
    Showers,
    Snow,
    Thunderstorm,
}

/// The resolved classification for one weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: ConditionCategory,
    /// Glyph for the requested time of day
    pub icon: &'static str,
    pub label: &'static str,
}

/// Classifies a WMO weather code for display
///
/// Codes: 0 clear, 1-3 increasing cloud, 45/48 fog, 51-57 drizzle, 61-67
/// rain, 71-77 snow, 80-86 showers, 95-99 thunderstorm.
pub fn classify(code: u16, is_daytime: bool) -> Classification {
    Classification {
        category: condition_category(code),
        icon: condition_icon(code, is_daytime),
        label: condition_label(code),
    }
}

/// Maps a weather code to its coarse category
pub fn condition_category(code: u16) -> ConditionCategory {
    match code {
        1 | 2 => ConditionCategory::PartlyCloudy,
        3 => ConditionCategory::Cloudy,
        45 | 48 => ConditionCategory::Fog,
        51 | 53 | 55 | 61 | 63 | 65 | 80 | 81 | 82 => ConditionCategory::Rain,
        56 | 57 | 66 | 67 => ConditionCategory::Showers,
        71 | 73 | 75 | 77 | 85 | 86 => ConditionCategory::Snow,
        95 | 96 | 99 => ConditionCategory::Thunderstorm,
        // 0, and any code outside the enumeration
        _ => ConditionCategory::Clear,
    }
}

/// Returns the display glyph for a weather code and time of day
fn condition_icon(code: u16, is_daytime: bool) -> &'static str {
    match code {
        1 => day_night(is_daytime, "\u{1F324}", "\u{1F319}"), // 🌤 / 🌙
        2 => day_night(is_daytime, "\u{26C5}", "\u{2601}"),   // ⛅ / ☁
        3 => "\u{2601}",                                      // ☁
        45 | 48 => "\u{1F32B}",                               // 🌫
        51 | 53 | 55 | 56 | 57 => day_night(is_daytime, "\u{1F326}", "\u{1F327}"), // 🌦 / 🌧
        61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => "\u{1F327}", // 🌧
        71 | 73 | 75 | 77 | 85 | 86 => "\u{2744}",            // ❄
        95 | 96 | 99 => day_night(is_daytime, "\u{26C8}", "\u{1F329}"), // ⛈ / 🌩
        _ => day_night(is_daytime, "\u{2600}", "\u{1F319}"),  // ☀ / 🌙
    }
}

fn day_night(is_daytime: bool, day: &'static str, night: &'static str) -> &'static str {
    if is_daytime {
        day
    } else {
        night
    }
}

/// Returns the label for a weather code; unknown codes read as clear sky
fn condition_label(code: u16) -> &'static str {
    match code {
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime Fog",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Dense Freezing Drizzle",
        61 => "Slight Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",
        71 => "Slight Snow",
        73 => "Moderate Snow",
        75 => "Heavy Snow",
        77 => "Snow Grains",
        80 => "Slight Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Violent Rain Showers",
        85 => "Slight Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Slight Hail Thunderstorm",
        99 => "Heavy Hail Thunderstorm",
        _ => "Clear Sky",
    }
}
