//! Per-image and batch-level prediction types

use crate::models::SeverityClass;
use serde::Serialize;

/// Second-ranked class of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunnerUp {
    pub class: SeverityClass,
    /// Percent in [0, 100]
    pub confidence: f32,
}

/// Effective prediction for one image, after the background override
///
/// `index` is the position in the submitted batch (zero-based, stable
/// regardless of processing order). Top-1 and runner-up confidences are
/// non-increasing.
#[derive(Debug, Clone, Serialize)]
pub struct ImagePrediction {
    pub index: usize,
    pub class: SeverityClass,
    /// Percent in [0, 100]
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner_up: Option<RunnerUp>,
}

/// Batch-level severity verdict
#[derive(Debug, Clone, Serialize)]
pub struct BatchVerdict {
    /// Percent Severity Index in [0, 15], rounded to 2 decimals
    pub psi: f64,
    /// Overall class derived from the PSI bands
    pub overall: SeverityClass,
    /// Mean of per-image effective confidences, rounded to 2 decimals
    pub overall_confidence: Option<f64>,
}
