//! Property tests for the normalizer and scorer.

use proptest::prelude::*;
use sunset_core::{WeatherPayload, WeatherSnapshot, normalize, score};

fn condition() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("clear".to_string()),
        Just("clouds".to_string()),
        Just("rain".to_string()),
        Just("snow".to_string()),
        Just("thunderstorm".to_string()),
        Just("drizzle".to_string()),
        Just("mist".to_string()),
        Just("fog".to_string()),
        "[a-zA-Z ]{0,24}",
    ]
}

fn snapshot(condition: String, clouds: f64, wind: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        condition_text: condition,
        cloud_cover_percent: clouds,
        wind_speed_mps: wind,
    }
}

proptest! {
    #[test]
    fn score_is_always_in_range(
        cond in condition(),
        clouds in -1.0e6f64..1.0e6,
        wind in -1.0e6f64..1.0e6,
    ) {
        let s = score(&snapshot(cond, clouds, wind));
        prop_assert!(s <= 10);
    }

    #[test]
    fn score_is_deterministic(cond in condition(), clouds in 0.0f64..100.0, wind in 0.0f64..40.0) {
        let snap = snapshot(cond, clouds, wind);
        prop_assert_eq!(score(&snap), score(&snap.clone()));
    }

    #[test]
    fn more_cloud_never_helps(
        cond in condition(),
        a in 0.0f64..100.0,
        b in 0.0f64..100.0,
        wind in 0.0f64..20.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(score(&snapshot(cond.clone(), high, wind)) <= score(&snapshot(cond, low, wind)));
    }

    #[test]
    fn more_wind_never_helps(
        cond in condition(),
        clouds in 0.0f64..100.0,
        a in 0.0f64..40.0,
        b in 0.0f64..40.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(score(&snapshot(cond.clone(), clouds, high)) <= score(&snapshot(cond, clouds, low)));
    }

    #[test]
    fn normalized_fields_stay_in_bounds(clouds in -1.0e4f64..1.0e4, wind in -1.0e4f64..1.0e4) {
        let payload: WeatherPayload = serde_json::from_value(serde_json::json!({
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "clouds": {"all": clouds},
            "wind": {"speed": wind},
        }))
        .unwrap();

        let snap = normalize(&payload).unwrap();
        prop_assert!((0.0..=100.0).contains(&snap.cloud_cover_percent));
        prop_assert!(snap.wind_speed_mps >= 0.0);
    }
}

#[test]
fn adversarial_payload_scores_in_range() {
    let payload: WeatherPayload = serde_json::from_value(serde_json::json!({
        "weather": [{"main": "Thunderstorm"}],
        "clouds": {"all": 1000},
        "wind": {"speed": -5},
    }))
    .unwrap();

    let snap = normalize(&payload).unwrap();
    // 4 for cloud, 0 for wind, 7 for thunderstorm
    assert_eq!(score(&snap), 0);
}
