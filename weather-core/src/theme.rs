//! Maps a provider's condition text to a background and text colour.

use serde::Serialize;

/// Text colour used over most backgrounds.
pub const DEFAULT_TEXT_COLOR: &str = "#edeef1";

/// Used over the thunderstorm and tornado art, which are too light for the default.
pub const DARK_TEXT_COLOR: &str = "#000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub background_key: &'static str,
    pub text_color_override: Option<&'static str>,
    asset_file: &'static str,
}

impl Theme {
    const fn new(background_key: &'static str, asset_file: &'static str) -> Self {
        Self { background_key, text_color_override: None, asset_file }
    }

    const fn dark_text(mut self) -> Self {
        self.text_color_override = Some(DARK_TEXT_COLOR);
        self
    }

    /// Effective text colour: the override if any, otherwise the default.
    pub fn text_color(&self) -> &'static str {
        self.text_color_override.unwrap_or(DEFAULT_TEXT_COLOR)
    }

    /// Relative path of the background image, e.g. `assets/backgrounds/rainy.jpg`.
    pub fn asset_path(&self) -> String {
        format!("assets/backgrounds/{}", self.asset_file)
    }

    pub fn is_default(&self) -> bool {
        *self == DEFAULT_THEME
    }
}

pub const DEFAULT_THEME: Theme = Theme::new("default", "default.png");

// Ordered; the first entry with a keyword contained in the description wins.
// Thunderstorm sits ahead of rain so "thunderstorm with heavy rain" keeps its dark text.
const CONDITIONS: &[(&[&str], Theme)] = &[
    (&["clear"], Theme::new("sunny", "sunny.png")),
    (&["clouds"], Theme::new("cloudy", "cloudy.png")),
    (&["thunderstorm"], Theme::new("thunderstorm", "thunderstorm.jpg").dark_text()),
    (&["rain", "drizzle"], Theme::new("rainy", "rainy.jpg")),
    (&["snow"], Theme::new("snowy", "snowy.png")),
    (&["mist", "fog", "haze"], Theme::new("foggy", "foggy.png")),
    (&["tornado"], Theme::new("tornado", "tornado.jpg").dark_text()),
    (&["hurricane"], Theme::new("hurricane", "hurricane.jpg")),
    (&["cold"], Theme::new("cold", "cold.jpg")),
    (&["hot"], Theme::new("hot", "hot.jpg")),
    (&["windy"], Theme::new("windy", "windy.jpg")),
    (&["hail"], Theme::new("hail", "hail.jpg")),
];

/// Theme for a condition description. Never fails; unknown text gets [`DEFAULT_THEME`].
pub fn theme_for(description: &str) -> Theme {
    let description = description.to_lowercase();

    CONDITIONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| description.contains(k)))
        .map(|(_, theme)| *theme)
        .unwrap_or(DEFAULT_THEME)
}
