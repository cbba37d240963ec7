//! Prediction pipeline: geocode, resolve the zone, fetch weather, compute
//! sunset, score.

use anyhow::Context;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{
    Config,
    error::{GeocodeError, NormalizeError, PredictError},
    geocode::{Geocoder, NominatimGeocoder},
    model::{Coordinates, Place, Prediction, PredictionReport, WeatherPayload, WeatherRequest},
    normalize::normalize,
    provider::{MAX_FORECAST_DAYS, WeatherProvider, default_provider_from_config},
    score::{FALLBACK_SCORE, score},
    sun::{arrival_time, sunset_on},
    timezone::{OpenMeteoTimezone, TimezoneResolver},
    tips::photography_tip,
};

#[derive(Debug)]
pub struct Predictor {
    geocoder: Box<dyn Geocoder>,
    timezones: Box<dyn TimezoneResolver>,
    weather: Box<dyn WeatherProvider>,
}

impl Predictor {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        timezones: Box<dyn TimezoneResolver>,
        weather: Box<dyn WeatherProvider>,
    ) -> Self {
        Self {
            geocoder,
            timezones,
            weather,
        }
    }

    /// Wire the public upstream services using the configured default
    /// weather provider.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = crate::http::client(&config.http).context("Failed to build HTTP client")?;
        let weather = default_provider_from_config(config, http.clone())?;

        Ok(Self::new(
            Box::new(NominatimGeocoder::new(http.clone())),
            Box::new(OpenMeteoTimezone::new(http)),
            weather,
        ))
    }

    pub async fn predict(&self, location: &str, days: u8) -> Result<PredictionReport, PredictError> {
        self.predict_at(location, days, Utc::now()).await
    }

    /// Same as [`Predictor::predict`], with "today" derived from `now`.
    pub async fn predict_at(
        &self,
        location: &str,
        days: u8,
        now: DateTime<Utc>,
    ) -> Result<PredictionReport, PredictError> {
        if !(1..=MAX_FORECAST_DAYS).contains(&days) {
            return Err(PredictError::InvalidDays {
                got: days,
                max: MAX_FORECAST_DAYS,
            });
        }

        tracing::info!("Processing location: {}", location);
        let place = self.geocoder.search(location).await.inspect_err(|e| {
            tracing::error!("Geocoding error for '{}': {}", location, e);
        })?;
        let at = place.coordinates;

        let tz = self.timezone_for(at).await;

        let payloads = self
            .weather
            .get_weather(&WeatherRequest { at, days })
            .await
            .inspect_err(|e| tracing::error!("Error fetching weather data: {}", e))?;
        if payloads.is_empty() {
            tracing::error!("No weather data returned from provider");
            return Err(PredictError::NoWeatherData);
        }

        let today = now.with_timezone(&tz).date_naive();
        let predictions = payloads
            .iter()
            .enumerate()
            .map(|(offset, payload)| {
                let date = forecast_date(payload, tz, today, offset, days > 1);
                build_prediction(at, tz, date, payload)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            "Generated {} prediction(s) for {}",
            predictions.len(),
            place.address
        );
        Ok(PredictionReport {
            location: place.address,
            predictions,
        })
    }

    pub async fn reverse(&self, at: Coordinates) -> Result<Place, GeocodeError> {
        self.geocoder.reverse(at).await
    }

    async fn timezone_for(&self, at: Coordinates) -> Tz {
        match self.timezones.resolve(at).await {
            Ok(tz) => {
                tracing::info!("Using timezone: {}", tz.name());
                tz
            }
            Err(e) => {
                tracing::warn!("Timezone not found ({}), using UTC", e);
                Tz::UTC
            }
        }
    }
}

/// The local date a payload describes. Forecast entries carry their own
/// timestamp; current readings (and unstamped entries) count from `today`.
fn forecast_date(
    payload: &WeatherPayload,
    tz: Tz,
    today: NaiveDate,
    offset: usize,
    is_forecast: bool,
) -> NaiveDate {
    let stamped = payload
        .dt
        .filter(|_| is_forecast)
        .and_then(|dt| tz.timestamp_opt(dt, 0).earliest())
        .map(|local| local.date_naive());

    stamped.unwrap_or_else(|| {
        today
            .checked_add_days(Days::new(offset as u64))
            .unwrap_or(today)
    })
}

fn build_prediction(
    at: Coordinates,
    tz: Tz,
    date: NaiveDate,
    payload: &WeatherPayload,
) -> Result<Prediction, PredictError> {
    let snapshot = normalize(payload);
    let quality_score = match &snapshot {
        Ok(snapshot) => score(snapshot),
        Err(NormalizeError::MissingCondition) => {
            tracing::error!("Missing weather condition in data, using fallback score");
            FALLBACK_SCORE
        }
    };
    let (clouds, wind_speed) = snapshot
        .map(|s| (s.cloud_cover_percent, s.wind_speed_mps))
        .unwrap_or_else(|_| fallback_readings(payload));

    let sunset = sunset_on(at, date, tz)?;

    Ok(Prediction {
        date: date.format("%Y-%m-%d").to_string(),
        sunset_time: sunset.to_rfc3339(),
        arrival_time: arrival_time(sunset).to_rfc3339(),
        weather_condition: payload.primary_condition().map(str::to_string),
        quality_score,
        clouds,
        wind_speed,
        temperature: payload.temperature_c().map(round_temperature),
        photography_tip: photography_tip(clouds, wind_speed),
    })
}

/// Nearest whole degree, halves going to the even neighbour.
fn round_temperature(celsius: f64) -> i64 {
    celsius.round_ties_even() as i64
}

fn fallback_readings(payload: &WeatherPayload) -> (f64, f64) {
    let clouds = payload.clouds.as_ref().and_then(|c| c.all).unwrap_or(0.0);
    let wind = payload.wind.as_ref().and_then(|w| w.speed).unwrap_or(0.0);
    (clouds, wind)
}
