use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    ForecastError,
    aggregate::MAX_DAYS,
    model::{RawForecastPoint, RawObservation, Units},
};

use super::{WeatherGateway, local_timestamp, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com error code for an unresolvable `q`.
const NO_MATCHING_LOCATION: i64 = 1006;

/// WeatherAPI reports hourly; the hourly view keeps every third hour.
const HOURLY_STRIDE: usize = 3;

#[derive(Debug, Clone)]
pub struct WeatherApiGateway {
    api_key: String,
    base_url: String,
    forecast_days: usize,
    http: Client,
}

impl WeatherApiGateway {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            forecast_days: MAX_DAYS,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_forecast_days(mut self, days: usize) -> Self {
        self.forecast_days = days.clamp(1, MAX_DAYS);
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
        extra: &[(&str, String)],
    ) -> Result<T, ForecastError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        tracing::debug!(%url, city, "requesting WeatherAPI");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .query(extra)
            .send()
            .await
            .map_err(|e| {
                ForecastError::Unavailable(format!(
                    "Failed to send request to WeatherAPI.com ({endpoint}): {e}"
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ForecastError::Unavailable(format!("Failed to read WeatherAPI {endpoint} response body: {e}"))
        })?;

        if !status.is_success() {
            let code = serde_json::from_str::<WaErrorResponse>(&body)
                .ok()
                .map(|e| e.error.code);
            if code == Some(NO_MATCHING_LOCATION) {
                return Err(ForecastError::not_found(city));
            }

            return Err(ForecastError::Unavailable(format!(
                "WeatherAPI {endpoint} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ForecastError::MalformedRecord(format!("Failed to parse WeatherAPI {endpoint} JSON: {e}"))
        })
    }

    async fn fetch_forecast(&self, city: &str, days: usize) -> Result<WaForecastResponse, ForecastError> {
        self.get(
            "forecast.json",
            city,
            &[
                ("days", days.to_string()),
                ("aqi", "no".to_string()),
                ("alerts", "no".to_string()),
            ],
        )
        .await
    }
}

/// UTC offset of the location, recovered from its wall-clock `localtime`
/// and the matching epoch. Rounded to the quarter hour because `localtime`
/// only has minute precision.
fn location_offset(location: &WaLocation) -> i32 {
    let (Some(local), Some(epoch)) = (location.localtime.as_deref(), location.localtime_epoch) else {
        return 0;
    };

    match NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M") {
        Ok(naive) => {
            let diff = naive.and_utc().timestamp() - epoch;
            ((diff as f64 / 900.0).round() as i32) * 900
        }
        Err(e) => {
            tracing::debug!(localtime = local, error = %e, "unparseable WeatherAPI localtime");
            0
        }
    }
}

fn hours_to_points(hours: Vec<WaForecastHour>, offset: i32) -> Vec<RawForecastPoint> {
    hours
        .into_iter()
        .map(|hour| {
            let condition = hour.condition;
            RawForecastPoint {
                timestamp: local_timestamp(hour.time_epoch, offset),
                time: None,
                temp: hour.temp_c,
                main: None,
                units: Some(Units::Metric),
                condition: condition.as_ref().map(|c| c.text.clone()),
                icon: condition.and_then(|c| c.icon),
                humidity: hour.humidity,
                wind_speed: hour.wind_kph.map(|kph| kph / 3.6),
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    code: i64,
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: WaErrorBody,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: Option<String>,
    country: Option<String>,
    localtime_epoch: Option<i64>,
    localtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    #[serde(default)]
    temp_c: Option<Value>,
    feelslike_c: Option<f64>,
    humidity: Option<f64>,
    wind_kph: Option<f64>,
    vis_km: Option<f64>,
    condition: Option<WaCondition>,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time_epoch: i64,
    #[serde(default)]
    temp_c: Option<Value>,
    humidity: Option<f64>,
    wind_kph: Option<f64>,
    condition: Option<WaCondition>,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    #[serde(default)]
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    forecast: WaForecast,
}

#[async_trait]
impl WeatherGateway for WeatherApiGateway {
    async fn fetch_current(&self, city: &str) -> Result<RawObservation, ForecastError> {
        let parsed: WaResponse = self.get("current.json", city, &[]).await?;
        let offset = location_offset(&parsed.location);
        let current = parsed.current;
        let ts = current.last_updated_epoch.or(parsed.location.localtime_epoch);

        Ok(RawObservation {
            city: parsed.location.name,
            country: parsed.location.country,
            temp: current.temp_c,
            main: None,
            units: Some(Units::Metric),
            condition: current.condition.as_ref().map(|c| c.text.clone()),
            icon: current.condition.and_then(|c| c.icon),
            timestamp: ts.and_then(|ts| local_timestamp(ts, offset)),
            feels_like: current.feelslike_c,
            humidity: current.humidity,
            wind_speed: current.wind_kph.map(|kph| kph / 3.6),
            visibility_m: current.vis_km.map(|km| km * 1000.0),
            weekday: None,
            time: None,
        })
    }

    async fn fetch_hourly(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        let parsed = self.fetch_forecast(city, 2).await?;
        let offset = location_offset(&parsed.location);
        // Start from the hour containing "now".
        let from = parsed
            .location
            .localtime_epoch
            .map(|now| now - 3600)
            .unwrap_or(i64::MIN);

        let hours = parsed
            .forecast
            .forecastday
            .into_iter()
            .flat_map(|day| day.hour)
            .filter(|hour| hour.time_epoch > from)
            .step_by(HOURLY_STRIDE)
            .collect();

        Ok(hours_to_points(hours, offset))
    }

    async fn fetch_daily(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        let parsed = self.fetch_forecast(city, self.forecast_days).await?;
        let offset = location_offset(&parsed.location);

        let hours = parsed
            .forecast
            .forecastday
            .into_iter()
            .flat_map(|day| day.hour)
            .collect();

        Ok(hours_to_points(hours, offset))
    }
}
