//! Weather-risk classification for anthracnose spread
//!
//! Pure function of (temperature °C, relative humidity %, leaf wetness
//! hours). Branches are evaluated High → Low → Medium: the High branch
//! must win over Low for borderline readings, so it is checked first.

use crate::models::{RiskLevel, WeatherReading};

/// Classify daily weather into a Low / Medium / High anthracnose risk
pub fn classify_weather_risk(temperature: f64, humidity: f64, wetness: f64) -> RiskLevel {
    let prolonged_wet = (25.0..=30.0).contains(&temperature) && humidity >= 95.0 && wetness >= 12.0;
    let warm_saturated = (22.0..=30.0).contains(&temperature) && humidity >= 95.0 && wetness >= 6.0;
    if prolonged_wet || warm_saturated {
        return RiskLevel::High;
    }

    if temperature < 22.0 || humidity < 85.0 || wetness < 6.0 {
        return RiskLevel::Low;
    }

    // Mixed/borderline conditions
    RiskLevel::Medium
}

/// Convenience wrapper over a full reading
pub fn classify_reading(reading: &WeatherReading) -> RiskLevel {
    classify_weather_risk(reading.temperature, reading.humidity, reading.wetness)
}
