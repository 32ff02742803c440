use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    ForecastError,
    model::{RawForecastPoint, RawMain, RawObservation, Units},
};

use super::{WeatherGateway, local_timestamp, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// How long a `/forecast` response may be handed to the second series call.
const SERIES_REUSE: Duration = Duration::from_secs(30);

/// A `/forecast` response waiting for its second consumer.
#[derive(Debug)]
struct SeriesEntry {
    city: String,
    fetched: Instant,
    points: Vec<RawForecastPoint>,
}

/// OpenWeather free tier: `/weather` for now, `/forecast` (5 days, 3-hourly)
/// for both series.
///
/// One `/forecast` response serves the hourly and the daily call of a search:
/// the first call fetches and parks the series, the next call for the same
/// city takes it. Any further call fetches again.
#[derive(Debug, Clone)]
pub struct OpenWeatherGateway {
    api_key: String,
    base_url: String,
    units: Units,
    http: Client,
    series: Arc<Mutex<Option<SeriesEntry>>>,
}

impl OpenWeatherGateway {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: Units::Metric,
            http: Client::new(),
            series: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, city: &str) -> Result<T, ForecastError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        tracing::debug!(%url, city, units = %self.units, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                ForecastError::Unavailable(format!(
                    "Failed to send request to OpenWeather ({endpoint}): {e}"
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ForecastError::Unavailable(format!(
                "Failed to read OpenWeather {endpoint} response body: {e}"
            ))
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(ForecastError::not_found(city));
        }

        if !status.is_success() {
            return Err(ForecastError::Unavailable(format!(
                "OpenWeather {endpoint} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ForecastError::MalformedRecord(format!("Failed to parse OpenWeather {endpoint} JSON: {e}"))
        })
    }

    /// The lock is held across the request so a concurrent second call
    /// waits for the first one's response instead of issuing its own.
    async fn shared_series(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        let mut slot = self.series.lock().await;

        match slot.take() {
            Some(entry) if entry.city == city && entry.fetched.elapsed() < SERIES_REUSE => {
                tracing::debug!(city, "reusing OpenWeather forecast response");
                return Ok(entry.points);
            }
            _ => {}
        }

        let points = self.fetch_series(city).await?;
        *slot = Some(SeriesEntry {
            city: city.to_string(),
            fetched: Instant::now(),
            points: points.clone(),
        });
        Ok(points)
    }

    async fn fetch_series(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        let parsed: OwForecastResponse = self.get("forecast", city).await?;
        let offset = parsed.city.timezone;

        Ok(parsed
            .list
            .into_iter()
            .map(|entry| RawForecastPoint {
                timestamp: local_timestamp(entry.dt, offset),
                time: None,
                temp: None,
                main: entry.main.map(OwMain::into_raw),
                units: Some(self.units),
                condition: entry.weather.first().map(|w| w.description.clone()),
                icon: entry.weather.first().and_then(|w| w.icon.clone()),
                humidity: None,
                wind_speed: entry.wind.and_then(|w| w.speed),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    #[serde(default)]
    temp: Option<Value>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

impl OwMain {
    fn into_raw(self) -> RawMain {
        RawMain {
            temp: self.temp,
            feels_like: self.feels_like,
            humidity: self.humidity,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    dt: Option<i64>,
    #[serde(default)]
    timezone: i32,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    visibility: Option<f64>,
    sys: Option<OwSys>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherGateway for OpenWeatherGateway {
    async fn fetch_current(&self, city: &str) -> Result<RawObservation, ForecastError> {
        let parsed: OwCurrentResponse = self.get("weather", city).await?;
        let condition = parsed.weather.first();

        Ok(RawObservation {
            city: parsed.name,
            country: parsed.sys.and_then(|s| s.country),
            temp: None,
            main: parsed.main.map(OwMain::into_raw),
            units: Some(self.units),
            condition: condition.map(|w| w.description.clone()),
            icon: condition.and_then(|w| w.icon.clone()),
            timestamp: parsed.dt.and_then(|dt| local_timestamp(dt, parsed.timezone)),
            feels_like: None,
            humidity: None,
            wind_speed: parsed.wind.and_then(|w| w.speed),
            visibility_m: parsed.visibility,
            weekday: None,
            time: None,
        })
    }

    async fn fetch_hourly(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        self.shared_series(city).await
    }

    async fn fetch_daily(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        self.shared_series(city).await
    }
}
