//! Weather reading and risk tier

use mango_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Local weather at the orchard, echoed back in the response
///
/// No agronomic bounds are enforced: implausible values are accepted and
/// classified as whatever tier the thresholds produce. Only finiteness is
/// validated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Relative humidity in %
    pub humidity: f64,
    /// Temperature in °C
    pub temperature: f64,
    /// Continuous hours of leaf wetness
    pub wetness: f64,
    pub lat: f64,
    pub lon: f64,
}

impl WeatherReading {
    /// Reject NaN/infinite fields before any inference runs
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("humidity", self.humidity),
            ("temperature", self.temperature),
            ("wetness", self.wetness),
            ("lat", self.lat),
            ("lon", self.lon),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "weather field '{}' must be a finite number",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// How favourable current weather is to anthracnose spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Case-insensitive label lookup (used by the recommendation table)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }
}
