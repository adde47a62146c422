//! Severity classes emitted by the leaf model
//!
//! Ordinal position encodes increasing disease extent. `Background` is
//! non-clinical: it marks a photograph that is not a usable leaf image
//! and never receives a recommendation.

use serde::{Deserialize, Serialize};

/// Per-image condition class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityClass {
    Healthy,
    Mild,
    Moderate,
    Severe,
    Background,
}

impl SeverityClass {
    /// Class order of the model's output layer
    pub const MODEL_OUTPUT: [SeverityClass; 5] = [
        SeverityClass::Healthy,
        SeverityClass::Mild,
        SeverityClass::Moderate,
        SeverityClass::Severe,
        SeverityClass::Background,
    ];

    /// The four clinical classes, in ordinal order
    pub const CLINICAL: [SeverityClass; 4] = [
        SeverityClass::Healthy,
        SeverityClass::Mild,
        SeverityClass::Moderate,
        SeverityClass::Severe,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SeverityClass::Healthy => "Healthy",
            SeverityClass::Mild => "Mild",
            SeverityClass::Moderate => "Moderate",
            SeverityClass::Severe => "Severe",
            SeverityClass::Background => "Background",
        }
    }

    /// Case-insensitive label lookup (used by the recommendation table)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "healthy" => Some(SeverityClass::Healthy),
            "mild" => Some(SeverityClass::Mild),
            "moderate" => Some(SeverityClass::Moderate),
            "severe" => Some(SeverityClass::Severe),
            "background" => Some(SeverityClass::Background),
            _ => None,
        }
    }

    /// Ordinal index within the model output (Background = 4)
    pub fn index(&self) -> usize {
        match self {
            SeverityClass::Healthy => 0,
            SeverityClass::Mild => 1,
            SeverityClass::Moderate => 2,
            SeverityClass::Severe => 3,
            SeverityClass::Background => 4,
        }
    }

    /// Ordinal index among clinical classes; `None` for Background
    pub fn clinical_index(&self) -> Option<usize> {
        match self {
            SeverityClass::Background => None,
            other => Some(other.index()),
        }
    }

    pub fn is_background(&self) -> bool {
        matches!(self, SeverityClass::Background)
    }

    /// Fixed lesion area weight used for the PSI mean; `None` for
    /// Background (non-clinical images never reach the aggregator)
    pub fn area_weight(&self) -> Option<f64> {
        match self {
            SeverityClass::Healthy => Some(0.0),
            SeverityClass::Mild => Some(2.0),
            SeverityClass::Moderate => Some(8.0),
            SeverityClass::Severe => Some(15.0),
            SeverityClass::Background => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for class in SeverityClass::MODEL_OUTPUT {
            assert_eq!(SeverityClass::from_label(class.label()), Some(class));
        }
        assert_eq!(SeverityClass::from_label("HEALTHY"), Some(SeverityClass::Healthy));
        assert_eq!(SeverityClass::from_label("leaf"), None);
    }

    #[test]
    fn clinical_indices_are_ordinal() {
        let indices: Vec<_> = SeverityClass::CLINICAL
            .iter()
            .map(|c| c.clinical_index().unwrap())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(SeverityClass::Background.clinical_index(), None);
    }

    #[test]
    fn area_weights_match_psi_table() {
        assert_eq!(SeverityClass::Healthy.area_weight(), Some(0.0));
        assert_eq!(SeverityClass::Mild.area_weight(), Some(2.0));
        assert_eq!(SeverityClass::Moderate.area_weight(), Some(8.0));
        assert_eq!(SeverityClass::Severe.area_weight(), Some(15.0));
        assert_eq!(SeverityClass::Background.area_weight(), None);
    }
}
