use chrono::Local;
use weather_core::{
    DisplayReading, FetchError, FetchOrchestrator, ResolvedLocation, Theme, WeatherSnapshot,
};

/// Text block for one snapshot, in the units of `reading`.
pub fn report(
    location: Option<&ResolvedLocation>,
    snapshot: &WeatherSnapshot,
    reading: &DisplayReading,
    theme: &Theme,
) -> String {
    let place = location
        .map(ResolvedLocation::label)
        .unwrap_or_else(|| "Current location".to_string());
    let observed = snapshot
        .observed_at
        .with_timezone(&Local)
        .format("%A, %d %B · %I:%M %p");

    let mut out = String::new();
    out.push_str(&format!("{place}\n{observed}\n\n"));
    out.push_str(&format!(
        "  {}  (feels like {})\n",
        reading.temperature_text(),
        reading.feels_like_text()
    ));
    out.push_str(&format!("  {}\n\n", snapshot.description));
    out.push_str(&format!("  {:<12}{}%\n", "Humidity", snapshot.humidity_pct));
    out.push_str(&format!("  {:<12}{}\n", "Wind", reading.wind_speed_text()));
    out.push_str(&format!("  {:<12}{} hPa\n", "Pressure", snapshot.pressure_hpa));
    out.push_str(&format!("  {:<12}{}%\n", "Cloudiness", snapshot.cloudiness_pct));
    out.push_str(&format!(
        "  {:<12}{} ({}, text {})",
        "Theme",
        theme.background_key,
        theme.asset_path(),
        theme.text_color()
    ));
    out
}

/// Report for whatever the orchestrator currently holds, if anything.
pub fn current(orch: &FetchOrchestrator) -> Option<String> {
    let snapshot = orch.snapshot()?;
    let reading = orch.reading()?;
    Some(report(orch.location().as_ref(), &snapshot, &reading, &orch.theme()))
}

pub fn error(err: &FetchError) -> String {
    format!("{}: {}", err.title(), err.message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use weather_core::{DisplayPreferences, TemperatureUnit, WindUnit, theme_for};

    #[test]
    fn report_lists_every_metric_in_display_units() {
        let snapshot = WeatherSnapshot {
            temperature_c: 29.4,
            feels_like_c: 33.1,
            description: "light rain".into(),
            humidity_pct: 88,
            wind_speed_ms: 3.2,
            pressure_hpa: 1008,
            cloudiness_pct: 90,
            icon_code: "10d".into(),
            observed_at: Utc::now(),
        };
        let location = ResolvedLocation {
            latitude: 11.24,
            longitude: 125.0,
            city: "Tacloban".into(),
            country: "Philippines".into(),
        };
        let prefs = DisplayPreferences {
            temperature_unit: TemperatureUnit::Fahrenheit,
            wind_unit: WindUnit::KilometerPerHour,
        };
        let reading = DisplayReading::new(&snapshot, prefs);

        let text = report(Some(&location), &snapshot, &reading, &theme_for(&snapshot.description));

        assert!(text.starts_with("Tacloban, Philippines\n"));
        assert!(text.contains("84.92 °F  (feels like 91.58 °F)"));
        assert!(text.contains("11.52 km/h"));
        assert!(text.contains("1008 hPa"));
        assert!(text.contains("88%"));
        assert!(text.contains("rainy (assets/backgrounds/rainy.jpg, text #edeef1)"));
    }

    #[test]
    fn error_uses_title_and_message() {
        let err = FetchError::InvalidInput("Please provide the name of the city".into());
        assert_eq!(error(&err), "Empty field detected: Please provide the name of the city");
    }
}
