use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unit system a provider reported its numbers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Celsius, metres per second.
    #[default]
    #[serde(alias = "celsius")]
    Metric,
    /// Fahrenheit, miles per hour.
    #[serde(alias = "fahrenheit")]
    Imperial,
    /// Kelvin, metres per second.
    #[serde(alias = "kelvin")]
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            Units::Metric => value,
            Units::Imperial => (value - 32.0) * 5.0 / 9.0,
            Units::Standard => value - 273.15,
        }
    }

    pub fn to_kmh(self, speed: f64) -> f64 {
        match self {
            Units::Metric | Units::Standard => speed * 3.6,
            Units::Imperial => speed * 1.609_344,
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nested measurement block, e.g. `{"main": {"temp": 12.3}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMain {
    pub temp: Option<Value>,
    #[serde(alias = "feels_like")]
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
}

/// Provider-shaped "now" record, as it comes off the wire.
///
/// Every field is optional; the normalizer decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawObservation {
    #[serde(alias = "name")]
    pub city: Option<String>,
    pub country: Option<String>,
    /// Flat temperature key.
    pub temp: Option<Value>,
    pub main: Option<RawMain>,
    pub units: Option<Units>,
    #[serde(alias = "description", alias = "weatherDescription", alias = "weather")]
    pub condition: Option<String>,
    #[serde(alias = "weatherIcon")]
    pub icon: Option<String>,
    #[serde(alias = "dateTime")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    /// In the speed unit implied by `units`.
    pub wind_speed: Option<f64>,
    pub visibility_m: Option<f64>,
    /// Pre-rendered labels from sources without timestamps.
    pub weekday: Option<String>,
    #[serde(alias = "localTime")]
    pub time: Option<String>,
}

/// One hourly or 3-hourly forecast entry as the provider returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawForecastPoint {
    #[serde(alias = "dateTime")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Time label from legacy sources that omit timestamps.
    pub time: Option<String>,
    pub temp: Option<Value>,
    pub main: Option<RawMain>,
    pub units: Option<Units>,
    #[serde(alias = "description", alias = "weatherDescription", alias = "weather")]
    pub condition: Option<String>,
    #[serde(alias = "weatherIcon")]
    pub icon: Option<String>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Normalized current-weather snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalObservation {
    pub city: String,
    pub country: String,
    pub temp_c: i32,
    pub feels_like_c: Option<i32>,
    pub humidity_pct: Option<u8>,
    pub wind_kmh: Option<i32>,
    pub visibility_km: Option<i32>,
    /// Lower-cased condition vocabulary.
    pub condition: String,
    pub condition_icon: String,
    pub weekday: String,
    pub local_time: String,
}

/// A forecast point in canonical units, independent of provider field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub label: String,
    pub temp_c: i32,
    pub condition: String,
    pub condition_icon: String,
    pub humidity_pct: Option<u8>,
    pub wind_kmh: Option<i32>,
}

/// One calendar day of forecast, reduced from its points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub label: String,
    pub high_c: i32,
    pub low_c: i32,
    pub condition: String,
    pub condition_icon: String,
    pub humidity_pct: Option<u8>,
    pub wind_kmh: Option<i32>,
}
