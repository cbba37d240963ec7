//! Forward and reverse geocoding.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::GeocodeError;
use crate::model::{Coordinates, Place};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Resolve a free-form place name to its best match.
    async fn search(&self, query: &str) -> Result<Place, GeocodeError>;

    async fn reverse(&self, at: Coordinates) -> Result<Place, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(http: Client) -> Self {
        Self {
            base_url: NOMINATIM_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GeocodeError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            tracing::debug!("Nominatim returned status {}", response.status());
            return Err(GeocodeError::Status(response.status()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Place, GeocodeError> {
        let hits: Vec<SearchHit> = self
            .get("search", &[("q", query), ("format", "json"), ("limit", "1")])
            .await?;

        let Some(hit) = hits.into_iter().next() else {
            tracing::info!("Location not found by geocoder: {}", query);
            return Err(GeocodeError::NotFound);
        };

        let latitude = parse_degrees(&hit.lat)?;
        let longitude = parse_degrees(&hit.lon)?;
        let coordinates = Coordinates::new(latitude, longitude)
            .map_err(|e| GeocodeError::Malformed(e.to_string()))?;

        tracing::info!(
            "Geocoded '{}' to {} ({}, {})",
            query,
            hit.display_name,
            latitude,
            longitude
        );
        Ok(Place {
            address: hit.display_name,
            coordinates,
        })
    }

    async fn reverse(&self, at: Coordinates) -> Result<Place, GeocodeError> {
        let (lat, lon) = (at.latitude.to_string(), at.longitude.to_string());
        let body: ReverseResponse = self
            .get(
                "reverse",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "json")],
            )
            .await?;

        if let Some(err) = body.error {
            tracing::debug!("Reverse geocode failed: {}", err);
            return Err(GeocodeError::NotFound);
        }

        let address = body.display_name.ok_or(GeocodeError::NotFound)?;
        tracing::info!("Reverse geocoded to: {}", address);
        Ok(Place {
            address,
            coordinates: at,
        })
    }
}

fn parse_degrees(raw: &str) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse()
        .map_err(|_| GeocodeError::Malformed(format!("invalid coordinate '{raw}'")))
}
