use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{Clouds, ConditionEntry, Coordinates, MainReadings, WeatherPayload, WeatherRequest, Wind},
    provider::fetch_body,
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_current(&self, at: Coordinates) -> Result<WeatherPayload, WeatherError> {
        let url = format!("{}/v1/current.json", self.base_url);
        let q = query_location(at);

        let body =
            fetch_body(&self.http, &url, &[("key", self.api_key.as_str()), ("q", q.as_str())])
                .await?;

        let parsed: WaResponse = serde_json::from_str(&body).map_err(WeatherError::Malformed)?;
        let current = parsed.current;

        Ok(payload(
            current.last_updated_epoch,
            current.condition,
            current.cloud,
            current.wind_kph,
            current.temp_c,
        ))
    }

    async fn fetch_daily(
        &self,
        at: Coordinates,
        days: u8,
    ) -> Result<Vec<WeatherPayload>, WeatherError> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let q = query_location(at);
        let days_param = days.to_string();

        let body = fetch_body(
            &self.http,
            &url,
            &[
                ("key", self.api_key.as_str()),
                ("q", q.as_str()),
                ("days", days_param.as_str()),
            ],
        )
        .await?;

        let parsed: WaForecastResponse =
            serde_json::from_str(&body).map_err(WeatherError::Malformed)?;

        let Some(forecast) = parsed.forecast else {
            tracing::error!("forecast response is missing 'forecast' data");
            return Err(WeatherError::MissingForecast);
        };
        if forecast.forecastday.is_empty() {
            return Err(WeatherError::EmptyForecast);
        }

        Ok(forecast
            .forecastday
            .into_iter()
            .take(usize::from(days))
            .map(|fd| {
                let clouds = mean(fd.hour.iter().filter_map(|h| h.cloud));
                payload(
                    fd.date_epoch,
                    fd.day.condition,
                    clouds,
                    fd.day.maxwind_kph,
                    fd.day.avgtemp_c,
                )
            })
            .collect())
    }
}

fn query_location(at: Coordinates) -> String {
    format!("{},{}", at.latitude, at.longitude)
}

fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, n), v| (sum + v, n + 1));
    (count > 0).then(|| sum / f64::from(count))
}

fn payload(
    dt: Option<i64>,
    condition: Option<WaCondition>,
    cloud: Option<f64>,
    wind_kph: Option<f64>,
    temp_c: Option<f64>,
) -> WeatherPayload {
    let weather = condition
        .map(|c| {
            vec![ConditionEntry {
                main: c.text.trim().to_string(),
                description: c.text.trim().to_lowercase(),
            }]
        })
        .unwrap_or_default();

    WeatherPayload {
        dt,
        weather: Some(weather),
        clouds: Some(Clouds { all: cloud }),
        wind: Some(Wind { speed: wind_kph.map(kph_to_mps) }),
        main: Some(MainReadings { temp: temp_c }),
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: Option<f64>,
    wind_kph: Option<f64>,
    cloud: Option<f64>,
    condition: Option<WaCondition>,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    cloud: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: Option<f64>,
    maxwind_kph: Option<f64>,
    condition: Option<WaCondition>,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date_epoch: Option<i64>,
    day: WaDay,
    #[serde(default)]
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: Option<WaForecast>,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn get_weather(
        &self,
        request: &WeatherRequest,
    ) -> Result<Vec<WeatherPayload>, WeatherError> {
        match request.days {
            0 | 1 => Ok(vec![self.fetch_current(request.at).await?]),
            days => self.fetch_daily(request.at, days).await,
        }
    }
}
