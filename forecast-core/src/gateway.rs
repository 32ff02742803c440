use crate::{
    Config, ForecastError,
    gateway::{openweather::OpenWeatherGateway, weatherapi::WeatherApiGateway},
    model::{RawForecastPoint, RawObservation},
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::{convert::TryFrom, fmt::Debug};

pub mod fixture;
pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// The fetch boundary. Implementations own transport, credentials and the
/// provider's wire format; they hand back raw records for the normalizer.
///
/// Each call may fail with [`ForecastError::NotFound`],
/// [`ForecastError::Unavailable`] or [`ForecastError::MalformedRecord`].
#[async_trait]
pub trait WeatherGateway: Send + Sync + Debug {
    async fn fetch_current(&self, city: &str) -> Result<RawObservation, ForecastError>;

    /// Near-term series, 3-hour spacing, chronological.
    async fn fetch_hourly(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError>;

    /// Longer series used for day summaries, chronological.
    async fn fetch_daily(&self, city: &str) -> Result<Vec<RawForecastPoint>, ForecastError>;
}

/// Construct a gateway from config and explicit ProviderId.
pub fn gateway_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherGateway>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `forecast configure {id}` and enter your API key."
        )
    })?;

    let boxed: Box<dyn WeatherGateway> = match id {
        ProviderId::OpenWeather => {
            let mut gateway = OpenWeatherGateway::new(api_key.to_owned()).with_units(config.units);
            if let Some(url) = config.provider_base_url(id) {
                gateway = gateway.with_base_url(url);
            }
            Box::new(gateway)
        }
        ProviderId::WeatherApi => {
            let mut gateway = WeatherApiGateway::new(api_key.to_owned())
                .with_forecast_days(config.effective_forecast_days());
            if let Some(url) = config.provider_base_url(id) {
                gateway = gateway.with_base_url(url);
            }
            Box::new(gateway)
        }
    };

    Ok(boxed)
}

/// Construct the default gateway from config, using `default_provider` field.
pub fn default_gateway_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherGateway>> {
    let id = config.default_provider_id()?;
    gateway_from_config(id, config)
}

/// Unix seconds rendered in the location's own UTC offset.
pub(crate) fn local_timestamp(epoch: i64, offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(epoch, 0).map(|utc| utc.with_timezone(&offset))
}

/// Shorten a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let parsed = ProviderId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(
            ProviderId::try_from("OpenWeather").expect("should parse"),
            ProviderId::OpenWeather
        );
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn gateway_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = gateway_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_gateway_from_config_errors_when_not_set() {
        let cfg = Config::default();
        let msg = default_gateway_from_config(&cfg).unwrap_err().to_string();

        assert!(msg.contains("No default provider configured"));
        assert!(msg.contains("Hint: run `forecast configure"));
    }

    #[test]
    fn default_gateway_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "KEY".to_string());

        assert!(default_gateway_from_config(&cfg).is_ok());
    }

    #[test]
    fn local_timestamp_applies_offset() {
        let ts = local_timestamp(1_714_575_600, 9 * 3600).expect("valid epoch");
        assert_eq!(ts.to_rfc3339(), "2024-05-02T00:00:00+09:00");

        let ts = local_timestamp(0, 1_000_000).expect("valid epoch");
        assert_eq!(ts.offset().local_minus_utc(), 0);
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let short = "city not found";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }
}
