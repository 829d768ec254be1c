//! Resolving "where am I" or "where is this city" to coordinates.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::debug;

use crate::{
    config::{Config, ServiceEndpoints, ServiceId},
    country::country_name,
    error::FetchError,
    http::{build_client, success_body},
    model::ResolvedLocation,
};

#[async_trait]
pub trait LocationResolver: Send + Sync + Debug {
    /// Locate the caller from their public IP address.
    async fn resolve_by_ip(&self) -> Result<ResolvedLocation, FetchError>;

    /// Geocode a free-text city name. Blank input is rejected before any I/O.
    async fn resolve_by_name(&self, city: &str) -> Result<ResolvedLocation, FetchError>;
}

/// Resolver backed by an ipinfo-style lookup and a city geocoding service.
#[derive(Debug, Clone)]
pub struct HttpLocationResolver {
    ip_lookup_url: String,
    geocoding_url: String,
    geocoding_api_key: Option<String>,
    http: Client,
}

impl HttpLocationResolver {
    pub fn new(endpoints: &ServiceEndpoints, geocoding_api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            ip_lookup_url: endpoints.ip_lookup_url.clone(),
            geocoding_url: endpoints.geocoding_url.clone(),
            geocoding_api_key,
            http: build_client(endpoints.timeout())?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.services,
            config.api_key(ServiceId::Geocoding).map(str::to_owned),
        )
    }

    async fn lookup_ip(&self) -> Result<ResolvedLocation> {
        let res = self
            .http
            .get(&self.ip_lookup_url)
            .send()
            .await
            .context("Failed to send request to the IP geolocation service")?;

        let body = success_body(res, "IP geolocation").await?;
        let parsed: IpInfoResponse =
            serde_json::from_str(&body).context("Failed to parse IP geolocation JSON")?;

        let city = required(parsed.city, "city")?;
        let loc = required(parsed.loc, "loc")?;
        let code = required(parsed.country, "country")?;
        let (latitude, longitude) = parse_loc(&loc)?;

        Ok(ResolvedLocation {
            latitude,
            longitude,
            city,
            country: display_country(&code),
        })
    }

    async fn geocode(&self, city: &str) -> Result<ResolvedLocation> {
        let mut req = self.http.get(&self.geocoding_url).query(&[("city", city)]);
        if let Some(key) = &self.geocoding_api_key {
            req = req.header("X-Api-Key", key);
        }

        let res = req
            .send()
            .await
            .context("Failed to send request to the geocoding service")?;

        let body = success_body(res, "Geocoding").await?;
        let matches: Vec<GeocodingMatch> =
            serde_json::from_str(&body).context("Failed to parse geocoding JSON")?;

        let first = matches
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No location found for '{city}'"))?;

        Ok(ResolvedLocation {
            latitude: first.latitude,
            longitude: first.longitude,
            city: first.city,
            country: display_country(&first.country),
        })
    }
}

#[async_trait]
impl LocationResolver for HttpLocationResolver {
    async fn resolve_by_ip(&self) -> Result<ResolvedLocation, FetchError> {
        debug!(url = %self.ip_lookup_url, "resolving location by IP");
        self.lookup_ip().await.map_err(FetchError::location)
    }

    async fn resolve_by_name(&self, city: &str) -> Result<ResolvedLocation, FetchError> {
        let city = normalize_city(city)?;
        debug!(%city, "geocoding city");
        self.geocode(&city).await.map_err(FetchError::location)
    }
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    city: Option<String>,
    loc: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodingMatch {
    latitude: f64,
    longitude: f64,
    #[serde(alias = "name")]
    city: String,
    #[serde(default)]
    country: String,
}

/// Trim and title-case a search term, rejecting blank input.
pub fn normalize_city(input: &str) -> Result<String, FetchError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidInput("Please provide the name of the city".into()));
    }
    Ok(title_case(trimmed))
}

/// Upper-case the first letter of every word, lower-case the rest.
/// Any non-alphabetic character starts a new word ("o'neill" → "O'Neill").
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

fn required(field: Option<String>, name: &str) -> Result<String> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("IP geolocation response is missing '{name}'"))
}

fn parse_loc(loc: &str) -> Result<(f64, f64)> {
    let (lat, lon) = loc
        .split_once(',')
        .ok_or_else(|| anyhow!("Malformed 'loc' field '{loc}', expected \"lat,lon\""))?;

    let lat = lat
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid latitude in 'loc' field '{loc}'"))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid longitude in 'loc' field '{loc}'"))?;

    Ok((lat, lon))
}

/// Best effort: a known two-letter code becomes its name, an unknown code
/// becomes empty, and anything longer is assumed to already be a name.
fn display_country(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() == 2 {
        match country_name(raw) {
            Some(name) => name.to_string(),
            None => {
                debug!(code = raw, "unknown country code, leaving country name empty");
                String::new()
            }
        }
    } else {
        raw.to_string()
    }
}
