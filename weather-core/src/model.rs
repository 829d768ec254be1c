use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A location resolved to coordinates, either from the caller's IP or a city search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    /// Display name; empty when the country code could not be mapped.
    pub country: String,
}

impl ResolvedLocation {
    /// "City, Country", or just the city when the country is unknown.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.city.clone()
        } else {
            format!("{}, {}", self.city, self.country)
        }
    }
}

/// Current conditions in canonical units (Celsius, m/s).
///
/// Display conversions always read from these fields; nothing ever writes a
/// converted value back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
    pub pressure_hpa: u32,
    pub cloudiness_pct: u8,
    pub icon_code: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Kelvin => "kelvin",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, TemperatureUnit::Kelvin]
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "celsius" | "c" | "°c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "°f" => Ok(TemperatureUnit::Fahrenheit),
            "kelvin" | "k" => Ok(TemperatureUnit::Kelvin),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit, kelvin."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindUnit {
    #[default]
    MeterPerSecond,
    KilometerPerHour,
    MilePerHour,
}

impl WindUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindUnit::MeterPerSecond => "m/s",
            WindUnit::KilometerPerHour => "km/h",
            WindUnit::MilePerHour => "mph",
        }
    }

    pub const fn all() -> &'static [WindUnit] {
        &[WindUnit::MeterPerSecond, WindUnit::KilometerPerHour, WindUnit::MilePerHour]
    }
}

impl fmt::Display for WindUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WindUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "m/s" | "mps" | "meter_per_second" => Ok(WindUnit::MeterPerSecond),
            "km/h" | "kmh" | "kph" | "kilometer_per_hour" => Ok(WindUnit::KilometerPerHour),
            "mph" | "mile_per_hour" => Ok(WindUnit::MilePerHour),
            _ => Err(anyhow::anyhow!(
                "Unknown wind speed unit '{value}'. Supported units: m/s, km/h, mph."
            )),
        }
    }
}

/// Units the presentation layer renders with. Session state, not persisted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayPreferences {
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
    #[serde(default)]
    pub wind_unit: WindUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_unit_as_str_roundtrip() {
        for unit in TemperatureUnit::all() {
            let parsed =
                TemperatureUnit::try_from(unit.as_str()).expect("roundtrip should succeed");
            assert_eq!(*unit, parsed);
        }
    }

    #[test]
    fn wind_unit_as_str_roundtrip() {
        for unit in WindUnit::all() {
            let parsed = WindUnit::try_from(unit.as_str()).expect("roundtrip should succeed");
            assert_eq!(*unit, parsed);
        }
    }

    #[test]
    fn unknown_unit_error() {
        let err = TemperatureUnit::try_from("rankine").unwrap_err();
        assert!(err.to_string().contains("Unknown temperature unit"));

        let err = WindUnit::try_from("knots").unwrap_err();
        assert!(err.to_string().contains("Unknown wind speed unit"));
    }

    #[test]
    fn label_omits_unknown_country() {
        let mut loc = ResolvedLocation {
            latitude: 11.24,
            longitude: 125.0,
            city: "Tacloban".into(),
            country: "Philippines".into(),
        };
        assert_eq!(loc.label(), "Tacloban, Philippines");

        loc.country.clear();
        assert_eq!(loc.label(), "Tacloban");
    }
}
