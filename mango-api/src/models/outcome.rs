//! Tagged analysis outcome
//!
//! The orchestrator's result is a tagged union so every terminal path has
//! its own structurally distinct response shape. Callers branch on the
//! `outcome` field instead of sniffing string-vs-object bodies.

use crate::models::{RecommendationRecord, SeverityClass, WeatherReading};
use serde::Serialize;

/// Terminal result of one batch analysis
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Full pipeline ran; verdict and recommendation attached
    Completed(AnalysisReport),
    /// Species gate rejected the batch before any severity inference
    RetakePhoto { reason: String },
    /// A confident background image made the batch non-analyzable
    NotAnalyzable { reason: String },
}

/// Success-path response body
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub percent_severity_index: f64,
    pub overall_label: SeverityClass,
    /// Ordinal of `overall_label`
    pub overall_severity_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_confidence: Option<f64>,
    /// Echo of the submitted weather fields and coordinates
    pub weather: WeatherReading,
    pub recommendation: RecommendationRecord,
}
