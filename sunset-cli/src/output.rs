use chrono::DateTime;
use sunset_core::{Favorite, Prediction, PredictionReport};

/// Formats a prediction report into a human-readable string
pub fn format_report(report: &PredictionReport) -> String {
    let mut output = format!("Sunset forecast for {}\n\n", report.location);
    for prediction in &report.predictions {
        output.push_str(&format_prediction(prediction));
        output.push('\n');
    }
    output
}

fn format_prediction(p: &Prediction) -> String {
    let condition = p.weather_condition.as_deref().unwrap_or("Unknown");
    let temperature = p
        .temperature
        .map_or_else(|| "n/a".to_string(), |t| format!("{t}\u{00b0}C"));

    format!(
        "{}:\n  Quality: {}/10 ({})\n  Sunset: {} (arrive by {})\n  Conditions: {}, {:.0}% cloud, wind {:.1} m/s, {}\n  Tip: {}\n",
        p.date,
        p.quality_score,
        quality_label(p.quality_score),
        clock_time(&p.sunset_time),
        clock_time(&p.arrival_time),
        condition,
        p.clouds,
        p.wind_speed,
        temperature,
        p.photography_tip,
    )
}

/// Same bands the web page uses to color the score.
fn quality_label(score: u8) -> &'static str {
    match score {
        8..=10 => "great",
        6..=7 => "fair",
        _ => "poor",
    }
}

/// `HH:MM` in the timestamp's own offset, or the raw string if it does not parse.
fn clock_time(rfc3339: &str) -> String {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}

pub fn format_favorites(favorites: &[Favorite]) -> String {
    if favorites.is_empty() {
        return "No favorite spots yet.\n".to_string();
    }

    let mut output = String::from("Favorite sunset spots:\n\n");
    for fav in favorites {
        output.push_str(&format!(
            "  {} ({:.4}, {:.4})\n",
            fav.location, fav.latitude, fav.longitude
        ));
    }
    output
}
