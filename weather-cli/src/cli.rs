use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select};
use std::path::PathBuf;
use tracing::warn;
use weather_core::{
    Config, FetchEvent, FetchHandle, FetchOrchestrator, IconFetcher, ServiceId, TemperatureUnit,
    WindUnit,
};

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for where you are, or anywhere else")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure an API key ("weather", "geocoding") or the default units ("units").
    Configure {
        target: String,
    },

    /// Show current weather for a city, or for your IP location when no city is given.
    Show {
        /// City name; matching is case-insensitive.
        city: Option<String>,

        #[command(flatten)]
        units: UnitArgs,

        /// Also download the condition icon to this file.
        #[arg(long)]
        icon_out: Option<PathBuf>,
    },

    /// Show current weather for known coordinates.
    #[command(allow_negative_numbers = true)]
    At {
        latitude: f64,
        longitude: f64,

        #[command(flatten)]
        units: UnitArgs,
    },

    /// Search, switch units and reset in a running session.
    Interactive,
}

#[derive(Debug, Args)]
pub struct UnitArgs {
    /// celsius, fahrenheit or kelvin; defaults to the configured unit.
    #[arg(long, value_parser = parse_temperature_unit)]
    temp_unit: Option<TemperatureUnit>,

    /// m/s, km/h or mph; defaults to the configured unit.
    #[arg(long, value_parser = parse_wind_unit)]
    wind_unit: Option<WindUnit>,
}

impl UnitArgs {
    fn apply(&self, orch: &FetchOrchestrator) {
        if let Some(unit) = self.temp_unit {
            orch.set_temperature_unit(unit);
        }
        if let Some(unit) = self.wind_unit {
            orch.set_wind_unit(unit);
        }
    }
}

fn parse_temperature_unit(s: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(s).map_err(|e| e.to_string())
}

fn parse_wind_unit(s: &str) -> Result<WindUnit, String> {
    WindUnit::try_from(s).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { target } => configure(&target),
            Command::Show { city, units, icon_out } => {
                let config = Config::load()?;
                let (orch, mut events) = FetchOrchestrator::from_config(&config)?;
                units.apply(&orch);

                let handle = match city {
                    Some(city) => orch.start_search(&city),
                    None => Some(orch.start_auto()),
                };
                let event = settle(handle, &mut events).await?;
                print_outcome(&orch, event)?;

                if let Some(path) = icon_out {
                    save_icon(&config, &orch, path).await?;
                }
                Ok(())
            }
            Command::At { latitude, longitude, units } => {
                let config = Config::load()?;
                let (orch, mut events) = FetchOrchestrator::from_config(&config)?;
                units.apply(&orch);

                let handle = orch.start_refresh(latitude, longitude);
                let event = settle(Some(handle), &mut events).await?;
                print_outcome(&orch, event)
            }
            Command::Interactive => {
                let config = Config::load()?;
                session::run(&config).await
            }
        }
    }
}

/// Wait for a one-shot request and take the event it produced.
async fn settle(
    handle: Option<FetchHandle>,
    events: &mut tokio::sync::mpsc::UnboundedReceiver<FetchEvent>,
) -> anyhow::Result<FetchEvent> {
    if let Some(handle) = handle {
        handle.wait().await;
    }
    events
        .try_recv()
        .map_err(|_| anyhow!("The request finished without reporting a result"))
}

fn print_outcome(orch: &FetchOrchestrator, event: FetchEvent) -> anyhow::Result<()> {
    match event {
        FetchEvent::Loaded { .. } => {
            let text = render::current(orch).context("Weather was reported but not stored")?;
            println!("{text}");
            Ok(())
        }
        FetchEvent::Failed { error, .. } => Err(anyhow!(render::error(&error))),
    }
}

/// Icon problems are logged and never fail the command.
async fn save_icon(config: &Config, orch: &FetchOrchestrator, path: PathBuf) -> anyhow::Result<()> {
    let Some(snapshot) = orch.snapshot() else {
        return Ok(());
    };

    let fetcher = IconFetcher::new(&config.services)?;
    match fetcher.fetch(&snapshot.icon_code).await {
        Ok(bytes) => {
            tokio::fs::write(&path, bytes)
                .await
                .with_context(|| format!("Failed to write icon to {}", path.display()))?;
            println!("Icon saved to {}", path.display());
        }
        Err(warning) => warn!("{warning}"),
    }
    Ok(())
}

fn configure(target: &str) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if target.eq_ignore_ascii_case("units") {
        let temps = TemperatureUnit::all().to_vec();
        let start = temps.iter().position(|u| *u == config.display.temperature_unit).unwrap_or(0);
        config.display.temperature_unit = Select::new("Temperature unit:", temps)
            .with_starting_cursor(start)
            .prompt()?;

        let winds = WindUnit::all().to_vec();
        let start = winds.iter().position(|u| *u == config.display.wind_unit).unwrap_or(0);
        config.display.wind_unit = Select::new("Wind speed unit:", winds)
            .with_starting_cursor(start)
            .prompt()?;
    } else {
        let service = ServiceId::try_from(target)?;
        let api_key = Password::new(&format!("API key for the {service} service:"))
            .without_confirmation()
            .prompt()?;
        config.upsert_api_key(service, api_key.trim().to_string());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
