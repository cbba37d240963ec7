//! Time zone lookup for coordinates.
//!
//! Open-Meteo resolves `timezone=auto` to the IANA zone of the requested
//! point, which saves shipping a zone-boundary database.

use std::fmt::Debug;

use async_trait::async_trait;
pub use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;

use crate::error::TimezoneError;
use crate::model::Coordinates;

const OPEN_METEO_API_BASE: &str = "https://api.open-meteo.com/v1";

#[async_trait]
pub trait TimezoneResolver: Send + Sync + Debug {
    async fn resolve(&self, at: Coordinates) -> Result<Tz, TimezoneError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoTimezone {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    timezone: Option<String>,
}

impl OpenMeteoTimezone {
    pub fn new(http: Client) -> Self {
        Self {
            base_url: OPEN_METEO_API_BASE.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TimezoneResolver for OpenMeteoTimezone {
    async fn resolve(&self, at: Coordinates) -> Result<Tz, TimezoneError> {
        let url = format!("{}/forecast", self.base_url);
        let (lat, lon) = (at.latitude.to_string(), at.longitude.to_string());

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TimezoneError::Status(response.status()));
        }

        let body: OpenMeteoResponse = response.json().await?;
        let name = body.timezone.ok_or(TimezoneError::Missing)?;
        parse_zone(&name)
    }
}

pub(crate) fn parse_zone(name: &str) -> Result<Tz, TimezoneError> {
    name.parse::<Tz>()
        .map_err(|_| TimezoneError::Unknown(name.to_string()))
}
