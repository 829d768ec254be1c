use thiserror::Error;

/// Failure of a location or weather lookup, classified by the step that failed.
///
/// Every variant ends up as a single user-visible notification; see
/// [`FetchError::title`] and [`FetchError::message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Rejected before any I/O, e.g. an empty search box.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IP geolocation or geocoding failed: network, malformed response, no match.
    #[error("location lookup failed: {0}")]
    LocationLookup(String),

    /// The weather request failed: network, status, malformed response.
    #[error("weather lookup failed: {0}")]
    WeatherLookup(String),
}

impl FetchError {
    /// Wrap a lower-level error (with its whole context chain) as a location failure.
    pub fn location(err: anyhow::Error) -> Self {
        FetchError::LocationLookup(format!("{err:#}"))
    }

    /// Wrap a lower-level error (with its whole context chain) as a weather failure.
    pub fn weather(err: anyhow::Error) -> Self {
        FetchError::WeatherLookup(format!("{err:#}"))
    }

    /// Short heading for the error notification.
    pub fn title(&self) -> &'static str {
        match self {
            FetchError::InvalidInput(_) => "Empty field detected",
            FetchError::LocationLookup(_) | FetchError::WeatherLookup(_) => "An error occurred",
        }
    }

    /// Body of the error notification.
    pub fn message(&self) -> &str {
        match self {
            FetchError::InvalidInput(msg)
            | FetchError::LocationLookup(msg)
            | FetchError::WeatherLookup(msg) => msg,
        }
    }
}

/// Non-fatal failure while downloading a condition glyph.
///
/// Callers log it and carry on rendering the rest of the snapshot.
#[derive(Debug, Error)]
#[error("failed to load weather icon '{code}': {reason}")]
pub struct IconFetchWarning {
    pub code: String,
    pub reason: String,
}
