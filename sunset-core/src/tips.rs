/// A short photography hint for the given cloud cover (%) and wind (m/s).
pub fn photography_tip(clouds: f64, wind_speed: f64) -> String {
    let sky = if clouds <= 30.0 {
        "Clear skies suggest vibrant colors. Look for interesting foreground elements to add depth to your composition."
    } else if clouds <= 70.0 {
        "Partial cloud cover can create dramatic light rays and colorful cloud formations."
    } else {
        "Heavy cloud cover may diffuse the light. Focus on moody compositions and silhouettes."
    };

    let wind = if wind_speed <= 3.0 {
        "Low wind speeds are perfect for long exposures and reflections."
    } else if wind_speed <= 7.0 {
        "Moderate wind might create interesting cloud movements."
    } else {
        "High winds may cause camera shake. Use a sturdy tripod and faster shutter speeds."
    };

    format!("{sky} {wind}")
}
