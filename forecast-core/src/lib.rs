//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - Normalization of provider weather records into one canonical shape
//! - Day-level aggregation of hourly forecast series
//! - The search session state machine presentation layers drive
//! - The gateway abstraction over weather providers, plus configuration
//!
//! Network I/O happens only behind [`WeatherGateway`]; everything else is pure
//! given the gateway's output.

pub mod aggregate;
pub mod condition;
pub mod config;
pub mod error;
pub mod forecast;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod session;

pub use aggregate::{HOURLY_WINDOW, MAX_DAYS, aggregate_daily, hourly_window};
pub use condition::Condition;
pub use config::{Config, ProviderConfig};
pub use error::ForecastError;
pub use forecast::{ForecastBundle, fetch_forecast};
pub use gateway::{
    ProviderId, WeatherGateway,
    fixture::{CityFixture, FixtureGateway},
    openweather::OpenWeatherGateway,
    weatherapi::WeatherApiGateway,
};
pub use model::{
    CanonicalObservation, DailySummary, ForecastPoint, RawForecastPoint, RawMain, RawObservation,
    Units,
};
pub use normalize::{normalize_observation, normalize_point};
pub use session::{ForecastSession, Phase, SessionState, Submission};
