//! Interactive session: searches and refreshes run in the background while the
//! prompt stays available, so a newer request can supersede an older one.

use anyhow::Context;
use inquire::{InquireError, Text};
use tokio::sync::mpsc::UnboundedReceiver;
use weather_core::{Config, FetchEvent, FetchOrchestrator, TemperatureUnit, WindUnit};

use crate::render;

const HELP: &str = "\
Type a city name to search, or one of:
  :auto                   locate by IP address
  :refresh                re-fetch the current location
  :units temp <unit>      celsius | fahrenheit | kelvin
  :units wind <unit>      m/s | km/h | mph
  :reset                  clear the display and locate by IP again
  :help                   show this text
  :quit                   leave
Press Enter on an empty line to check for finished requests.";

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Poll,
    Search(String),
    Auto,
    Refresh,
    TemperatureUnit(TemperatureUnit),
    WindUnit(WindUnit),
    Reset,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Action, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Action::Poll);
    }
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Action::Search(line.to_string()));
    };

    let mut words = command.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("auto"), None, _) => Ok(Action::Auto),
        (Some("refresh"), None, _) => Ok(Action::Refresh),
        (Some("reset"), None, _) => Ok(Action::Reset),
        (Some("help"), None, _) => Ok(Action::Help),
        (Some("quit" | "q"), None, _) => Ok(Action::Quit),
        (Some("units"), Some("temp"), Some(unit)) => TemperatureUnit::try_from(unit)
            .map(Action::TemperatureUnit)
            .map_err(|e| e.to_string()),
        (Some("units"), Some("wind"), Some(unit)) => WindUnit::try_from(unit)
            .map(Action::WindUnit)
            .map_err(|e| e.to_string()),
        _ => Err(format!("Unknown command ':{command}'. Type :help for the list.")),
    }
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let (orch, mut events) = FetchOrchestrator::from_config(config)?;

    println!("{HELP}\n");
    orch.start_auto();

    loop {
        drain(&orch, &mut events);
        if orch.state().busy() {
            println!("(loading…)");
        }

        let line = match prompt().await? {
            Some(line) => line,
            None => break,
        };

        match parse_line(&line) {
            Ok(Action::Poll) => {}
            Ok(Action::Search(city)) => {
                orch.start_search(&city);
            }
            Ok(Action::Auto) => {
                orch.start_auto();
            }
            Ok(Action::Refresh) => match orch.location() {
                Some(loc) => {
                    orch.start_refresh_at(loc);
                }
                None => println!("Nothing to refresh yet."),
            },
            Ok(Action::TemperatureUnit(unit)) => {
                orch.set_temperature_unit(unit);
                show_current(&orch);
            }
            Ok(Action::WindUnit(unit)) => {
                orch.set_wind_unit(unit);
                show_current(&orch);
            }
            Ok(Action::Reset) => {
                orch.reset();
                orch.start_auto();
            }
            Ok(Action::Help) => println!("{HELP}"),
            Ok(Action::Quit) => break,
            Err(msg) => println!("{msg}"),
        }
    }

    Ok(())
}

/// One line of input; `None` when the user cancels.
async fn prompt() -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| Text::new("weather>").prompt())
        .await
        .context("Prompt task failed")?;

    match answer {
        Ok(line) => Ok(Some(line)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn drain(orch: &FetchOrchestrator, events: &mut UnboundedReceiver<FetchEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            FetchEvent::Loaded { .. } => show_current(orch),
            FetchEvent::Failed { error, .. } => println!("{}\n", render::error(&error)),
        }
    }
}

fn show_current(orch: &FetchOrchestrator) {
    if let Some(text) = render::current(orch) {
        println!("{text}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_search() {
        assert_eq!(parse_line("  new york "), Ok(Action::Search("new york".into())));
        assert_eq!(parse_line(""), Ok(Action::Poll));
        assert_eq!(parse_line("   "), Ok(Action::Poll));
    }

    #[test]
    fn commands() {
        assert_eq!(parse_line(":auto"), Ok(Action::Auto));
        assert_eq!(parse_line(":refresh"), Ok(Action::Refresh));
        assert_eq!(parse_line(":reset"), Ok(Action::Reset));
        assert_eq!(parse_line(":q"), Ok(Action::Quit));
        assert_eq!(
            parse_line(":units temp kelvin"),
            Ok(Action::TemperatureUnit(TemperatureUnit::Kelvin))
        );
        assert_eq!(parse_line(":units wind mph"), Ok(Action::WindUnit(WindUnit::MilePerHour)));
    }

    #[test]
    fn bad_commands_explain_themselves() {
        let err = parse_line(":units temp rankine").unwrap_err();
        assert!(err.contains("Unknown temperature unit"));
        assert!(parse_line(":fly").unwrap_err().contains(":help"));
        assert!(parse_line(":auto now").is_err());
    }
}
