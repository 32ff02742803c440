//! Conversion of provider records into the canonical display shapes.
//!
//! Both entry points are pure. The primary temperature is the only field a
//! record cannot do without; everything else degrades to `None` or an empty
//! label.

use serde_json::Value;

use crate::condition::{Condition, DEFAULT_CONDITION};
use crate::error::ForecastError;
use crate::model::{
    CanonicalObservation, ForecastPoint, RawForecastPoint, RawMain, RawObservation, Units,
};

const WEEKDAY_FORMAT: &str = "%A";
const TIME_FORMAT: &str = "%H:%M";

pub fn normalize_observation(raw: &RawObservation) -> Result<CanonicalObservation, ForecastError> {
    let units = raw.units.unwrap_or_default();
    let temp = resolve_temperature(raw.main.as_ref(), raw.temp.as_ref()).ok_or_else(|| {
        ForecastError::MalformedRecord(format!(
            "current observation for '{}' has no numeric temperature",
            raw.city.as_deref().unwrap_or("unknown city")
        ))
    })?;

    let feels_like = raw
        .main
        .as_ref()
        .and_then(|m| m.feels_like)
        .or(raw.feels_like);
    let humidity = raw.main.as_ref().and_then(|m| m.humidity).or(raw.humidity);

    let (condition, condition_icon) = normalize_condition(raw.condition.as_deref());

    let (weekday, local_time) = match raw.timestamp {
        Some(ts) => (
            ts.format(WEEKDAY_FORMAT).to_string(),
            ts.format(TIME_FORMAT).to_string(),
        ),
        None => (
            raw.weekday.clone().unwrap_or_default(),
            raw.time.clone().unwrap_or_default(),
        ),
    };

    Ok(CanonicalObservation {
        city: raw.city.as_deref().map(str::trim).unwrap_or_default().to_string(),
        country: raw.country.as_deref().map(str::trim).unwrap_or_default().to_string(),
        temp_c: round_celsius(units, temp),
        feels_like_c: feels_like.map(|t| round_celsius(units, t)),
        humidity_pct: humidity.and_then(percent),
        wind_kmh: raw.wind_speed.and_then(|s| finite_round(units.to_kmh(s))),
        visibility_km: raw.visibility_m.and_then(|m| finite_round(m / 1000.0)),
        condition,
        condition_icon,
        weekday,
        local_time,
    })
}

pub fn normalize_point(raw: &RawForecastPoint) -> Result<ForecastPoint, ForecastError> {
    let units = raw.units.unwrap_or_default();
    let temp = resolve_temperature(raw.main.as_ref(), raw.temp.as_ref()).ok_or_else(|| {
        ForecastError::MalformedRecord(format!(
            "forecast point at {} has no numeric temperature",
            point_label(raw).unwrap_or_else(|| "unknown time".to_string())
        ))
    })?;

    let humidity = raw.main.as_ref().and_then(|m| m.humidity).or(raw.humidity);
    let (condition, condition_icon) = normalize_condition(raw.condition.as_deref());

    Ok(ForecastPoint {
        timestamp: raw.timestamp,
        label: point_label(raw).unwrap_or_default(),
        temp_c: round_celsius(units, temp),
        condition,
        condition_icon,
        humidity_pct: humidity.and_then(percent),
        wind_kmh: raw.wind_speed.and_then(|s| finite_round(units.to_kmh(s))),
    })
}

/// `main.temp` first, then the flat `temp` key; the first numeric one wins.
fn resolve_temperature(main: Option<&RawMain>, flat: Option<&Value>) -> Option<f64> {
    main.and_then(|m| m.temp.as_ref())
        .and_then(Value::as_f64)
        .or_else(|| flat.and_then(Value::as_f64))
        .filter(|t| t.is_finite())
}

/// Lower-cased condition text plus its icon. Blank text becomes the default
/// condition.
fn normalize_condition(text: Option<&str>) -> (String, String) {
    let text = text.map(str::trim).unwrap_or_default().to_lowercase();
    let condition = Condition::from_description(&text);

    if text.is_empty() {
        (
            DEFAULT_CONDITION.description().to_string(),
            DEFAULT_CONDITION.icon_name().to_string(),
        )
    } else {
        (text, condition.icon_name().to_string())
    }
}

fn point_label(raw: &RawForecastPoint) -> Option<String> {
    raw.timestamp
        .map(|ts| ts.format(TIME_FORMAT).to_string())
        .or_else(|| raw.time.clone())
}

fn round_celsius(units: Units, value: f64) -> i32 {
    units.to_celsius(value).round() as i32
}

fn finite_round(value: f64) -> Option<i32> {
    value.is_finite().then(|| value.round() as i32)
}

fn percent(value: f64) -> Option<u8> {
    value.is_finite().then(|| value.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observation(value: serde_json::Value) -> RawObservation {
        serde_json::from_value(value).expect("raw observation should deserialize")
    }

    fn point(value: serde_json::Value) -> RawForecastPoint {
        serde_json::from_value(value).expect("raw point should deserialize")
    }

    #[test]
    fn reads_nested_temperature() {
        let raw = observation(json!({
            "name": "London",
            "country": "GB",
            "main": {"temp": 11.6, "feels_like": 9.4, "humidity": 81},
            "description": "Light Rain"
        }));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.city, "London");
        assert_eq!(obs.temp_c, 12);
        assert_eq!(obs.feels_like_c, Some(9));
        assert_eq!(obs.humidity_pct, Some(81));
        assert_eq!(obs.condition, "light rain");
        assert_eq!(obs.condition_icon, "cloud_rain");
    }

    #[test]
    fn reads_flat_temperature() {
        let raw = observation(json!({"city": "Lima", "temp": 18.4, "condition": "Clear"}));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.temp_c, 18);
        assert_eq!(obs.condition_icon, "sun");
    }

    #[test]
    fn nested_key_wins_over_flat_key() {
        let raw = observation(json!({"temp": 1.0, "main": {"temp": 30.0}}));

        assert_eq!(normalize_observation(&raw).expect("should normalize").temp_c, 30);
    }

    #[test]
    fn falls_back_to_flat_key_when_nested_is_not_numeric() {
        let raw = observation(json!({"temp": 4.0, "main": {"temp": "warm"}}));

        assert_eq!(normalize_observation(&raw).expect("should normalize").temp_c, 4);
    }

    #[test]
    fn kelvin_is_converted_before_rounding() {
        let raw = observation(json!({"temp": 293.15, "units": "kelvin", "condition": "Clear"}));

        assert_eq!(normalize_observation(&raw).expect("should normalize").temp_c, 20);
    }

    #[test]
    fn fahrenheit_is_converted_before_rounding() {
        let raw = observation(json!({
            "main": {"temp": 68.0, "feels_like": 50.0},
            "units": "imperial",
            "windSpeed": 10.0
        }));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.temp_c, 20);
        assert_eq!(obs.feels_like_c, Some(10));
        assert_eq!(obs.wind_kmh, Some(16));
    }

    #[test]
    fn missing_temperature_is_malformed() {
        let raw = observation(json!({"city": "Nowhere", "condition": "Clear"}));

        let err = normalize_observation(&raw).unwrap_err();
        assert!(matches!(err, ForecastError::MalformedRecord(_)));
        assert!(err.to_string().contains("Nowhere"));
    }

    #[test]
    fn non_numeric_temperature_is_malformed() {
        let raw = observation(json!({"temp": "20", "main": {"temp": null}}));

        assert!(matches!(
            normalize_observation(&raw),
            Err(ForecastError::MalformedRecord(_))
        ));
    }

    #[test]
    fn unknown_condition_gets_default_icon() {
        let raw = observation(json!({"temp": 10, "condition": "Sandstorm Advisory"}));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.condition, "sandstorm advisory");
        assert_eq!(obs.condition_icon, DEFAULT_CONDITION.icon_name());
    }

    #[test]
    fn blank_condition_becomes_default() {
        let raw = observation(json!({"temp": 10}));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.condition, "partly cloudy");
        assert_eq!(obs.condition_icon, "cloud_sun");
    }

    #[test]
    fn optional_fields_stay_empty() {
        let raw = observation(json!({"temp": 10}));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.feels_like_c, None);
        assert_eq!(obs.humidity_pct, None);
        assert_eq!(obs.wind_kmh, None);
        assert_eq!(obs.visibility_km, None);
        assert_eq!(obs.weekday, "");
    }

    #[test]
    fn metric_wind_and_visibility_are_converted() {
        let raw = observation(json!({"temp": 10, "windSpeed": 5.0, "visibilityM": 9600.0}));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.wind_kmh, Some(18));
        assert_eq!(obs.visibility_km, Some(10));
    }

    #[test]
    fn humidity_is_clamped() {
        let raw = observation(json!({"temp": 10, "humidity": 104.2}));

        assert_eq!(normalize_observation(&raw).expect("should normalize").humidity_pct, Some(100));
    }

    #[test]
    fn timestamp_drives_weekday_and_local_time() {
        let raw = observation(json!({
            "temp": 10,
            "timestamp": "2024-05-01T23:30:00+09:00",
            "weekday": "Tuesday"
        }));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.weekday, "Wednesday");
        assert_eq!(obs.local_time, "23:30");
    }

    #[test]
    fn legacy_labels_are_used_without_timestamp() {
        let raw = observation(json!({"temp": 10, "weekday": "Friday", "time": "10:15:00 AM"}));

        let obs = normalize_observation(&raw).expect("should normalize");
        assert_eq!(obs.weekday, "Friday");
        assert_eq!(obs.local_time, "10:15:00 AM");
    }

    #[test]
    fn point_is_shape_unified() {
        let nested = point(json!({
            "timestamp": "2024-05-01T15:00:00Z",
            "main": {"temp": 17.5, "humidity": 60},
            "condition": "Broken Clouds",
            "windSpeed": 2.0
        }));
        let flat = point(json!({"time": "03:00 PM", "temp": 17.5, "weather": "Broken Clouds"}));

        let a = normalize_point(&nested).expect("nested point");
        let b = normalize_point(&flat).expect("flat point");

        assert_eq!(a.temp_c, 18);
        assert_eq!(a.temp_c, b.temp_c);
        assert_eq!(a.condition, b.condition);
        assert_eq!(a.condition_icon, "cloud_sun");
        assert_eq!(a.label, "15:00");
        assert_eq!(b.label, "03:00 PM");
        assert_eq!(a.humidity_pct, Some(60));
        assert_eq!(a.wind_kmh, Some(7));
        assert_eq!(b.wind_kmh, None);
    }

    #[test]
    fn point_without_temperature_is_malformed() {
        let raw = point(json!({"time": "06:00", "condition": "Rain"}));

        let err = normalize_point(&raw).unwrap_err();
        assert!(matches!(err, ForecastError::MalformedRecord(_)));
        assert!(err.to_string().contains("06:00"));
    }
}
