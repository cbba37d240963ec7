use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{Clouds, ConditionEntry, Coordinates, MainReadings, WeatherPayload, WeatherRequest, Wind},
    provider::fetch_body,
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    /// Point the provider at another host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_current(&self, at: Coordinates) -> Result<WeatherPayload, WeatherError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let (lat, lon) = (at.latitude.to_string(), at.longitude.to_string());

        let body = fetch_body(
            &self.http,
            &url,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ],
        )
        .await?;

        // The current-weather document already has the payload shape.
        serde_json::from_str(&body).map_err(WeatherError::Malformed)
    }

    async fn fetch_daily(
        &self,
        at: Coordinates,
        days: u8,
    ) -> Result<Vec<WeatherPayload>, WeatherError> {
        let url = format!("{}/data/3.0/onecall", self.base_url);
        let (lat, lon) = (at.latitude.to_string(), at.longitude.to_string());

        let body = fetch_body(
            &self.http,
            &url,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", "minutely,hourly,alerts"),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ],
        )
        .await?;

        let parsed: OcResponse = serde_json::from_str(&body).map_err(WeatherError::Malformed)?;

        let Some(daily) = parsed.daily else {
            tracing::error!("forecast response is missing 'daily' data");
            return Err(WeatherError::MissingForecast);
        };
        if daily.is_empty() {
            tracing::error!("forecast response has an empty 'daily' list");
            return Err(WeatherError::EmptyForecast);
        }

        Ok(daily
            .into_iter()
            .take(usize::from(days))
            .map(OcDaily::into_payload)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct OcResponse {
    daily: Option<Vec<OcDaily>>,
}

#[derive(Debug, Deserialize)]
struct OcTemp {
    day: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OcDaily {
    dt: i64,
    temp: Option<OcTemp>,
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    clouds: Option<f64>,
    wind_speed: Option<f64>,
}

impl OcDaily {
    fn into_payload(self) -> WeatherPayload {
        WeatherPayload {
            dt: Some(self.dt),
            weather: Some(self.weather.into_iter().take(1).collect()),
            clouds: Some(Clouds {
                all: Some(self.clouds.unwrap_or(0.0)),
            }),
            wind: Some(Wind {
                speed: Some(self.wind_speed.unwrap_or(0.0)),
            }),
            main: Some(MainReadings {
                temp: self.temp.and_then(|t| t.day),
            }),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(
        &self,
        request: &WeatherRequest,
    ) -> Result<Vec<WeatherPayload>, WeatherError> {
        if request.days <= 1 {
            Ok(vec![self.fetch_current(request.at).await?])
        } else {
            self.fetch_daily(request.at, request.days).await
        }
    }
}
