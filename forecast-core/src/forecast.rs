use serde::{Deserialize, Serialize};

use crate::{
    ForecastError,
    aggregate::{aggregate_daily, hourly_window},
    gateway::WeatherGateway,
    model::{CanonicalObservation, DailySummary, ForecastPoint, RawForecastPoint},
    normalize::{normalize_observation, normalize_point},
};

/// Everything one successful search commits to the session, all at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastBundle {
    pub observation: CanonicalObservation,
    pub hourly: Vec<ForecastPoint>,
    pub daily: Vec<DailySummary>,
}

/// Issue the three gateway calls for `city` concurrently, then normalize and
/// aggregate.
///
/// Fails as a whole: if any call or any record fails, no partial bundle is
/// produced.
pub async fn fetch_forecast<G>(
    gateway: &G,
    city: &str,
    day_count: usize,
) -> Result<ForecastBundle, ForecastError>
where
    G: WeatherGateway + ?Sized,
{
    let (current, hourly, daily) = tokio::try_join!(
        gateway.fetch_current(city),
        gateway.fetch_hourly(city),
        gateway.fetch_daily(city),
    )?;

    let mut observation = normalize_observation(&current)?;
    if observation.city.is_empty() {
        observation.city = city.to_string();
    }

    let hourly = normalize_series(&hourly)?;
    let daily = normalize_series(&daily)?;

    tracing::debug!(
        city,
        hourly_points = hourly.len(),
        daily_points = daily.len(),
        "normalized forecast"
    );

    Ok(ForecastBundle {
        observation,
        hourly: hourly_window(&hourly),
        daily: aggregate_daily(&daily, day_count),
    })
}

fn normalize_series(points: &[RawForecastPoint]) -> Result<Vec<ForecastPoint>, ForecastError> {
    points.iter().map(normalize_point).collect()
}
