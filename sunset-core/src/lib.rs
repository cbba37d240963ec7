//! Core library for the `sunset` predictor.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers, geocoding and time zone lookup
//! - Weather normalization and the sunset quality score
//! - The prediction pipeline tying them together
//!
//! It is used by `sunset-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod favorites;
pub mod geocode;
pub mod http;
pub mod model;
pub mod normalize;
pub mod predict;
pub mod provider;
pub mod score;
pub mod sun;
pub mod timezone;
pub mod tips;
pub mod uploads;

pub use config::{Config, HttpConfig, ProviderConfig, ServerConfig};
pub use error::{
    CoordinatesError, GeocodeError, NormalizeError, PredictError, SunsetError, TimezoneError,
    UploadError, WeatherError,
};
pub use favorites::FavoritesStore;
pub use geocode::{Geocoder, NominatimGeocoder};
pub use model::{
    Coordinates, Favorite, Place, Prediction, PredictionReport, WeatherPayload, WeatherRequest,
    WeatherSnapshot,
};
pub use normalize::normalize;
pub use predict::Predictor;
pub use provider::{ProviderId, WeatherProvider};
pub use score::{FALLBACK_SCORE, score};
pub use timezone::{OpenMeteoTimezone, TimezoneResolver};
pub use uploads::PhotoStore;
