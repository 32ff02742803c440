use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, FixtureGateway, ForecastSession, ProviderId, WeatherGateway,
    gateway::{default_gateway_from_config, gateway_from_config},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "City weather forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current weather and forecast for a city.
    Show {
        /// City name.
        city: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Number of days in the daily summary (1-7).
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=7))]
        days: Option<u8>,

        /// Print the session state as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Search repeatedly in one session; an empty line exits.
    Interactive {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Debug, clap::Args)]
pub struct SourceArgs {
    /// Provider to use instead of the configured default.
    #[arg(long, conflicts_with = "fixture")]
    provider: Option<String>,

    /// Serve data from a JSON fixture file instead of a provider.
    #[arg(long)]
    fixture: Option<PathBuf>,
}

impl SourceArgs {
    fn gateway(&self, config: &Config) -> anyhow::Result<Box<dyn WeatherGateway>> {
        if let Some(path) = &self.fixture {
            tracing::debug!(path = %path.display(), "serving from fixture file");
            return Ok(Box::new(FixtureGateway::load(path)?));
        }

        match &self.provider {
            Some(name) => {
                let id = ProviderId::try_from(name.as_str())?;
                tracing::debug!(provider = %id, "using provider from command line");
                gateway_from_config(id, config)
            }
            None => default_gateway_from_config(config),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show {
                city,
                source,
                days,
                json,
            } => {
                let config = Config::load()?;
                let gateway = source.gateway(&config)?;
                let days = days
                    .map(usize::from)
                    .unwrap_or_else(|| config.effective_forecast_days());
                let mut session = ForecastSession::with_day_count(days);

                if !session.search(gateway.as_ref(), &city).await {
                    bail!("City name must not be empty");
                }

                if json {
                    let out = serde_json::to_string_pretty(session.state())
                        .context("Failed to serialize session state")?;
                    println!("{out}");
                } else {
                    print!("{}", render::session(session.state()));
                }
                Ok(())
            }
            Command::Interactive { source } => {
                let config = Config::load()?;
                let gateway = source.gateway(&config)?;
                interactive(gateway.as_ref(), config.effective_forecast_days()).await
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.trim().to_string());

    let is_default = config.default_provider_id().ok() == Some(id);
    if !is_default
        && inquire::Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?
    {
        config.set_default_provider(id);
    }

    config.save()?;
    println!(
        "Saved {id} credentials to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn interactive(gateway: &dyn WeatherGateway, days: usize) -> anyhow::Result<()> {
    let mut session = ForecastSession::with_day_count(days);

    loop {
        let query = inquire::Text::new("City:")
            .with_help_message("empty line to quit")
            .prompt()
            .context("Failed to read city")?;

        if query.trim().is_empty() {
            return Ok(());
        }

        println!("Loading weather data...");
        session.search(gateway, &query).await;
        print!("{}", render::session(session.state()));
    }
}
