use crate::error::NormalizeError;
use crate::model::{WeatherPayload, WeatherSnapshot};

/// Extract the scoring inputs from a provider payload.
///
/// Cloud cover and wind speed default to 0 when absent and are clamped into
/// their physical ranges. A payload without any condition entry is rejected:
/// that means the upstream response is malformed, and the caller decides how
/// to degrade.
pub fn normalize(payload: &WeatherPayload) -> Result<WeatherSnapshot, NormalizeError> {
    let condition = payload
        .weather
        .as_ref()
        .and_then(|entries| entries.first())
        .ok_or(NormalizeError::MissingCondition)?;

    let clouds = payload
        .clouds
        .as_ref()
        .and_then(|c| c.all)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);

    let wind = payload
        .wind
        .as_ref()
        .and_then(|w| w.speed)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
        .max(0.0);

    Ok(WeatherSnapshot {
        condition_text: condition.main.to_lowercase(),
        cloud_cover_percent: clouds,
        wind_speed_mps: wind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> WeatherPayload {
        serde_json::from_value(value).expect("test payload must deserialize")
    }

    #[test]
    fn reads_all_fields() {
        let snap = normalize(&payload(json!({
            "weather": [{"main": "Clouds", "description": "broken clouds"}],
            "clouds": {"all": 64},
            "wind": {"speed": 6.2},
            "main": {"temp": 18.4}
        })))
        .unwrap();

        assert_eq!(snap.condition_text, "clouds");
        assert_eq!(snap.cloud_cover_percent, 64.0);
        assert_eq!(snap.wind_speed_mps, 6.2);
    }

    #[test]
    fn empty_condition_list_is_an_error() {
        let err = normalize(&payload(json!({
            "weather": [],
            "clouds": {"all": 10},
            "wind": {"speed": 1.0}
        })))
        .unwrap_err();
        assert_eq!(err, NormalizeError::MissingCondition);
    }

    #[test]
    fn absent_condition_list_is_an_error() {
        let err = normalize(&payload(json!({"clouds": {"all": 10}}))).unwrap_err();
        assert_eq!(err, NormalizeError::MissingCondition);
    }

    #[test]
    fn missing_clouds_and_wind_default_to_zero() {
        let snap = normalize(&payload(json!({
            "weather": [{"main": "Clear", "description": "clear sky"}]
        })))
        .unwrap();

        assert_eq!(snap.condition_text, "clear");
        assert_eq!(snap.cloud_cover_percent, 0.0);
        assert_eq!(snap.wind_speed_mps, 0.0);
    }

    #[test]
    fn empty_nested_objects_default_to_zero() {
        let snap = normalize(&payload(json!({
            "weather": [{"main": "Mist"}],
            "clouds": {},
            "wind": {}
        })))
        .unwrap();

        assert_eq!(snap.cloud_cover_percent, 0.0);
        assert_eq!(snap.wind_speed_mps, 0.0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let snap = normalize(&payload(json!({
            "weather": [{"main": "Clear"}],
            "clouds": {"all": 1000},
            "wind": {"speed": -5}
        })))
        .unwrap();

        assert_eq!(snap.cloud_cover_percent, 100.0);
        assert_eq!(snap.wind_speed_mps, 0.0);
    }
}
