//! Error kinds for each external collaborator and for the orchestration layer.

use reqwest::StatusCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinatesError {
    #[error("Latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("Longitude {0} is outside -180..=180")]
    Longitude(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The payload carried no `weather` entries at all.
    #[error("Missing weather condition in data")]
    MissingCondition,
}

/// Weather provider errors. Display strings are user-facing.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather service authentication failed. Please check API key.")]
    Auth,
    #[error("Weather service rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Weather service error: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Weather service is taking too long to respond. Please try again.")]
    Timeout,
    #[error("Unable to fetch weather data. Please try again later.")]
    Request(#[source] reqwest::Error),
    #[error("Invalid response from weather service. Please try again later.")]
    Malformed(#[source] serde_json::Error),
    #[error("Invalid forecast data received from weather service")]
    MissingForecast,
    #[error("No forecast data available")]
    EmptyForecast,
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout
        } else {
            WeatherError::Request(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Location not found")]
    NotFound,
    #[error("Geocoding service timed out")]
    Timeout,
    #[error("Geocoding service returned status {0}")]
    Status(StatusCode),
    #[error("Geocoding request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Invalid response from geocoding service: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::Request(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimezoneError {
    #[error("Timezone lookup failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Timezone service returned status {0}")]
    Status(StatusCode),
    #[error("Timezone service returned no zone")]
    Missing,
    #[error("Unknown timezone '{0}'")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SunsetError {
    #[error("The sun does not set at this location on {0}")]
    NoSunset(chrono::NaiveDate),
    #[error("Could not convert sunset timestamp {0} to local time")]
    InvalidTimestamp(i64),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No selected file")]
    NoSelectedFile,
    #[error("Invalid file type")]
    InvalidFileType,
    #[error("Failed to store photo: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a full prediction. Display strings are user-facing.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Days must be between 1 and {max}, got {got}")]
    InvalidDays { got: u8, max: u8 },
    #[error("Location not found. Please try a different location.")]
    LocationNotFound,
    #[error("Unable to find location. Please check the address and try again.")]
    Geocoding(#[source] GeocodeError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error("Weather data not available")]
    NoWeatherData,
    #[error("Error calculating sunset time: {0}")]
    Sunset(#[from] SunsetError),
}

impl From<GeocodeError> for PredictError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound => PredictError::LocationNotFound,
            other => PredictError::Geocoding(other),
        }
    }
}
