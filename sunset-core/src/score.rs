//! Sunset quality scoring.
//!
//! The score starts at [`MAX_SCORE`] and loses points for cloud cover, wind
//! and adverse conditions. Each factor contributes at most one deduction.

use crate::model::WeatherSnapshot;

pub const MAX_SCORE: u8 = 10;

/// Score reported when the weather condition could not be determined.
pub const FALLBACK_SCORE: u8 = 5;

const CLOUD_BUCKETS: [(f64, u8); 4] = [(80.0, 4), (60.0, 3), (40.0, 2), (20.0, 1)];
const WIND_BUCKETS: [(f64, u8); 3] = [(10.0, 3), (7.0, 2), (5.0, 1)];

// Order matters: the first rule whose keywords match wins.
const CONDITION_RULES: [(&[&str], u8); 4] = [
    (&["rain", "snow"], 5),
    (&["thunderstorm"], 7),
    (&["drizzle"], 3),
    (&["mist", "fog"], 2),
];

/// Map a snapshot to a quality score in `0..=10`, 10 being the best.
pub fn score(snapshot: &WeatherSnapshot) -> u8 {
    let deductions = cloud_deduction(snapshot.cloud_cover_percent)
        + wind_deduction(snapshot.wind_speed_mps)
        + condition_deduction(&snapshot.condition_text);

    let final_score = MAX_SCORE.saturating_sub(deductions);
    tracing::debug!(
        clouds = snapshot.cloud_cover_percent,
        wind = snapshot.wind_speed_mps,
        condition = %snapshot.condition_text,
        deductions,
        final_score,
        "scored sunset"
    );
    final_score
}

fn bucket(value: f64, buckets: &[(f64, u8)]) -> u8 {
    buckets
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map_or(0, |(_, penalty)| *penalty)
}

fn cloud_deduction(percent: f64) -> u8 {
    bucket(percent, &CLOUD_BUCKETS)
}

fn wind_deduction(speed_mps: f64) -> u8 {
    bucket(speed_mps, &WIND_BUCKETS)
}

fn condition_deduction(condition: &str) -> u8 {
    let condition = condition.to_lowercase();
    CONDITION_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| condition.contains(k)))
        .map_or(0, |(_, penalty)| *penalty)
}
