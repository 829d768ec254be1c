//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Location resolution (IP geolocation, city geocoding)
//! - The weather provider abstraction and its OpenWeather implementation
//! - Unit conversion and condition themes for display
//! - The fetch orchestrator that sequences the lookups and drops stale results
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod country;
pub mod error;
mod http;
pub mod icon;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod theme;
pub mod units;

pub use config::{Config, ServiceEndpoints, ServiceId};
pub use error::{FetchError, IconFetchWarning};
pub use icon::IconFetcher;
pub use location::{HttpLocationResolver, LocationResolver};
pub use model::{DisplayPreferences, ResolvedLocation, TemperatureUnit, WeatherSnapshot, WindUnit};
pub use orchestrator::{
    FetchEvent, FetchHandle, FetchOrchestrator, FetchState, OrchestratorOptions, Phase,
};
pub use provider::WeatherProvider;
pub use theme::{Theme, theme_for};
pub use units::DisplayReading;
