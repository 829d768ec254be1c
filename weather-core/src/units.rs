//! Conversions from canonical units (Celsius, m/s) to display units.
//!
//! All functions are pure and total. Inverses exist so callers can check
//! round trips; the core itself never converts a display value back.

use serde::Serialize;

use crate::model::{DisplayPreferences, TemperatureUnit, WeatherSnapshot, WindUnit};

const KELVIN_OFFSET: f64 = 273.15;
const MPS_TO_KMH: f64 = 3.6;
const KM_PER_MILE: f64 = 1.609;

pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => celsius + KELVIN_OFFSET,
    }
}

pub fn temperature_to_celsius(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        TemperatureUnit::Kelvin => value - KELVIN_OFFSET,
    }
}

pub fn convert_wind_speed(meters_per_second: f64, unit: WindUnit) -> f64 {
    match unit {
        WindUnit::MeterPerSecond => meters_per_second,
        WindUnit::KilometerPerHour => meters_per_second * MPS_TO_KMH,
        WindUnit::MilePerHour => meters_per_second / KM_PER_MILE,
    }
}

pub fn wind_speed_to_mps(value: f64, unit: WindUnit) -> f64 {
    match unit {
        WindUnit::MeterPerSecond => value,
        WindUnit::KilometerPerHour => value / MPS_TO_KMH,
        WindUnit::MilePerHour => value * KM_PER_MILE,
    }
}

/// e.g. `85.00 °F`
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    format!("{:.2} {}", convert_temperature(celsius, unit), unit.symbol())
}

/// e.g. `11.52 km/h`
pub fn format_wind_speed(meters_per_second: f64, unit: WindUnit) -> String {
    format!("{:.2} {}", convert_wind_speed(meters_per_second, unit), unit.as_str())
}

/// Snapshot values converted for display with a given set of preferences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayReading {
    pub temperature: f64,
    pub feels_like: f64,
    pub wind_speed: f64,
    pub preferences: DisplayPreferences,
}

impl DisplayReading {
    pub fn new(snapshot: &WeatherSnapshot, preferences: DisplayPreferences) -> Self {
        Self {
            temperature: convert_temperature(snapshot.temperature_c, preferences.temperature_unit),
            feels_like: convert_temperature(snapshot.feels_like_c, preferences.temperature_unit),
            wind_speed: convert_wind_speed(snapshot.wind_speed_ms, preferences.wind_unit),
            preferences,
        }
    }

    pub fn temperature_text(&self) -> String {
        format!("{:.2} {}", self.temperature, self.preferences.temperature_unit.symbol())
    }

    pub fn feels_like_text(&self) -> String {
        format!("{:.2} {}", self.feels_like, self.preferences.temperature_unit.symbol())
    }

    pub fn wind_speed_text(&self) -> String {
        format!("{:.2} {}", self.wind_speed, self.preferences.wind_unit.as_str())
    }
}
