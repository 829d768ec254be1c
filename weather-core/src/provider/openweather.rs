use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::ServiceEndpoints,
    error::FetchError,
    http::{build_client, success_body},
    model::WeatherSnapshot,
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    url: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(endpoints: &ServiceEndpoints, api_key: String) -> Result<Self> {
        Ok(Self {
            url: endpoints.weather_url.clone(),
            api_key,
            http: build_client(endpoints.timeout())?,
        })
    }

    async fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot> {
        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", latitude.to_string().as_str()),
                ("lon", longitude.to_string().as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (current weather)")?;

        let body = success_body(res, "OpenWeather current").await?;

        let parsed: OwCurrentResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather current JSON")?;

        parsed.into_snapshot()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<i64>,
    pressure: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwClouds {
    all: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    dt: Option<i64>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    clouds: OwClouds,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot> {
        let temperature_c = field(self.main.temp, "main.temp")?;
        let condition = self.weather.into_iter().next().unwrap_or_default();
        let description = field(
            condition.description.filter(|d| !d.trim().is_empty()),
            "weather[0].description",
        )?;
        let humidity = field(self.main.humidity, "main.humidity")?;
        let wind_speed_ms = field(self.wind.speed, "wind.speed")?;
        let pressure = field(self.main.pressure, "main.pressure")?;
        let cloudiness = field(self.clouds.all, "clouds.all")?;

        if !(0.0..).contains(&wind_speed_ms) {
            return Err(anyhow!("OpenWeather reported a negative wind speed ({wind_speed_ms})"));
        }

        Ok(WeatherSnapshot {
            temperature_c,
            feels_like_c: self.main.feels_like.unwrap_or(temperature_c),
            description,
            humidity_pct: percentage(humidity, "main.humidity")?,
            wind_speed_ms,
            pressure_hpa: u32::try_from(pressure)
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| anyhow!("OpenWeather reported an invalid pressure ({pressure})"))?,
            cloudiness_pct: percentage(cloudiness, "clouds.all")?,
            icon_code: condition.icon.unwrap_or_default(),
            observed_at: self.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now),
        })
    }
}

fn field<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("OpenWeather response is missing '{name}'"))
}

fn percentage(value: i64, name: &str) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| anyhow!("OpenWeather reported '{name}' out of range ({value})"))
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, FetchError> {
        debug!(latitude, longitude, "fetching current weather");
        self.fetch_current(latitude, longitude)
            .await
            .map_err(FetchError::weather)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Result<WeatherSnapshot> {
        serde_json::from_value::<OwCurrentResponse>(json)
            .expect("shape must deserialize")
            .into_snapshot()
    }

    fn full() -> serde_json::Value {
        serde_json::json!({
            "dt": 1_700_000_000,
            "main": { "temp": 29.4, "feels_like": 33.1, "humidity": 88, "pressure": 1008 },
            "weather": [{ "description": "light rain", "icon": "10d" }],
            "wind": { "speed": 3.2 },
            "clouds": { "all": 90 }
        })
    }

    #[test]
    fn full_response_maps_every_field() {
        let snap = parse(full()).expect("valid");

        assert_eq!(snap.temperature_c, 29.4);
        assert_eq!(snap.feels_like_c, 33.1);
        assert_eq!(snap.description, "light rain");
        assert_eq!(snap.humidity_pct, 88);
        assert_eq!(snap.wind_speed_ms, 3.2);
        assert_eq!(snap.pressure_hpa, 1008);
        assert_eq!(snap.cloudiness_pct, 90);
        assert_eq!(snap.icon_code, "10d");
        assert_eq!(snap.observed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn optional_fields_fall_back() {
        let mut json = full();
        json["main"].as_object_mut().expect("object").remove("feels_like");
        json["weather"][0].as_object_mut().expect("object").remove("icon");

        let snap = parse(json).expect("valid");
        assert_eq!(snap.feels_like_c, 29.4);
        assert_eq!(snap.icon_code, "");
    }

    #[test]
    fn each_required_field_is_enforced() {
        let cases: &[(&str, &str)] = &[
            ("main", "temp"),
            ("main", "humidity"),
            ("main", "pressure"),
            ("wind", "speed"),
            ("clouds", "all"),
        ];

        for (section, key) in cases {
            let mut json = full();
            json[*section].as_object_mut().expect("object").remove(*key);

            let err = parse(json).unwrap_err();
            assert!(
                err.to_string().contains(&format!("{section}.{key}")),
                "unexpected error for {section}.{key}: {err}"
            );
        }
    }

    #[test]
    fn empty_weather_array_is_missing_description() {
        let mut json = full();
        json["weather"] = serde_json::json!([]);

        let err = parse(json).unwrap_err();
        assert!(err.to_string().contains("weather[0].description"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut json = full();
        json["main"]["humidity"] = serde_json::json!(140);
        assert!(parse(json).is_err());

        let mut json = full();
        json["main"]["pressure"] = serde_json::json!(0);
        assert!(parse(json).is_err());

        let mut json = full();
        json["wind"]["speed"] = serde_json::json!(-1.0);
        assert!(parse(json).is_err());
    }
}
