//! In-memory gateway serving canned payloads per city.
//!
//! Used for offline runs and tests. Lookup is case-insensitive; a city with
//! no fixture resolves to `NotFound`, the same way a real provider would.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    ForecastError,
    model::{RawForecastPoint, RawObservation},
};

use super::WeatherGateway;

/// Canned responses for one city.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityFixture {
    pub current: RawObservation,
    #[serde(default)]
    pub hourly: Vec<RawForecastPoint>,
    #[serde(default)]
    pub daily: Vec<RawForecastPoint>,
    /// Simulated latency applied to every call for this city.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureGateway {
    cities: HashMap<String, CityFixture>,
    failures: HashMap<String, ForecastError>,
    requests: Arc<AtomicUsize>,
}

impl FixtureGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, city: &str, fixture: CityFixture) -> Self {
        self.cities.insert(key(city), fixture);
        self
    }

    /// Make every call for `city` fail with `error`.
    pub fn with_failure(mut self, city: &str, error: ForecastError) -> Self {
        self.failures.insert(key(city), error);
        self
    }

    /// Parse a JSON object mapping city names to [`CityFixture`]s.
    pub fn from_json(json: &str) -> Result<Self> {
        let cities: HashMap<String, CityFixture> =
            serde_json::from_str(json).context("Failed to parse fixture JSON")?;

        Ok(cities
            .into_iter()
            .fold(Self::new(), |gateway, (city, fixture)| gateway.with_city(&city, fixture)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file: {}", path.display()))?;

        Self::from_json(&contents)
            .with_context(|| format!("Invalid fixture file: {}", path.display()))
    }

    /// Total gateway calls served so far, across clones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn lookup(&self, city: &str) -> Result<&CityFixture, ForecastError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let key = key(city);

        if let Some(err) = self.failures.get(&key) {
            return Err(err.clone());
        }

        let fixture = self
            .cities
            .get(&key)
            .ok_or_else(|| ForecastError::not_found(city))?;

        if let Some(ms) = fixture.delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        Ok(fixture)
    }
}

fn key(city: &str) -> String {
    city.trim().to_lowercase()
}

#[async_trait]
impl WeatherGateway for FixtureGateway {
    async fn fetch_current(&self, city: &str) -> Result<RawObservation, ForecastError> {
        Ok(self.lookup(city).await?.current.clone())
    }

    async fn fetch_hourly(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        Ok(self.lookup(city).await?.hourly.clone())
    }

    async fn fetch_daily(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError> {
        Ok(self.lookup(city).await?.daily.clone())
    }
}
