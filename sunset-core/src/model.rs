use serde::{Deserialize, Serialize};

use crate::error::CoordinatesError;

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the valid lat/lon ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::Longitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }
}

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub address: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy)]
pub struct WeatherRequest {
    pub at: Coordinates,
    /// 1 means current conditions; anything larger asks for a daily forecast.
    pub days: u8,
}

/// Weather as reported by a provider, in the OpenWeatherMap "current weather"
/// shape. Other providers convert into this shape; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Vec<ConditionEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clouds: Option<Clouds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<Wind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<MainReadings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    #[serde(default)]
    pub temp: Option<f64>,
}

impl WeatherPayload {
    /// The primary condition as reported, without case folding.
    pub fn primary_condition(&self) -> Option<&str> {
        self.weather
            .as_ref()
            .and_then(|entries| entries.first())
            .map(|entry| entry.main.as_str())
    }

    pub fn temperature_c(&self) -> Option<f64> {
        self.main.as_ref().and_then(|m| m.temp)
    }
}

/// Canonical, provider-agnostic weather fields used for scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub condition_text: String,
    pub cloud_cover_percent: f64,
    pub wind_speed_mps: f64,
}

/// One day's sunset prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// RFC 3339 timestamp in the location's time zone.
    pub sunset_time: String,
    pub arrival_time: String,
    pub weather_condition: Option<String>,
    pub quality_score: u8,
    pub clouds: f64,
    pub wind_speed: f64,
    pub temperature: Option<i64>,
    pub photography_tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub location: String,
    pub predictions: Vec<Prediction>,
}

/// A saved sunset spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}
