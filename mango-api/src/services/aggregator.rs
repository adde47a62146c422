//! Batch severity aggregation
//!
//! Combines per-image effective predictions into a Percent Severity
//! Index and an overall label, or reports the batch as non-analyzable
//! when a confident background image survived the override.

use crate::models::{BatchVerdict, ImagePrediction, SeverityClass};
use mango_common::{Error, Result};

/// Result of aggregating one batch
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Verdict(BatchVerdict),
    /// At least one effective prediction stayed Background
    BackgroundDetected { indices: Vec<usize> },
}

/// Severity aggregator
pub struct SeverityAggregator;

impl SeverityAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate effective predictions into a batch verdict
    ///
    /// The batch must be non-empty; the transport layer rejects empty
    /// uploads before inference, so an empty slice here is a programming
    /// error reported as invalid input.
    pub fn aggregate(&self, predictions: &[ImagePrediction]) -> Result<BatchOutcome> {
        if predictions.is_empty() {
            return Err(Error::InvalidInput(
                "at least one image prediction is required".to_string(),
            ));
        }

        let background: Vec<usize> = predictions
            .iter()
            .filter(|p| p.class.is_background())
            .map(|p| p.index)
            .collect();
        if !background.is_empty() {
            return Ok(BatchOutcome::BackgroundDetected {
                indices: background,
            });
        }

        let mut weight_sum = 0.0;
        for prediction in predictions {
            // Clinical by the background check above
            weight_sum += prediction.class.area_weight().ok_or_else(|| {
                Error::Internal("background prediction reached PSI computation".to_string())
            })?;
        }
        let psi = round2(weight_sum / predictions.len() as f64);

        let confidence_sum: f64 = predictions.iter().map(|p| p.confidence as f64).sum();
        let overall_confidence = round2(confidence_sum / predictions.len() as f64);

        Ok(BatchOutcome::Verdict(BatchVerdict {
            psi,
            overall: overall_label(psi),
            overall_confidence: Some(overall_confidence),
        }))
    }
}

impl Default for SeverityAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Overall label from the PSI bands; upper bounds are inclusive
fn overall_label(psi: f64) -> SeverityClass {
    if psi == 0.0 {
        SeverityClass::Healthy
    } else if psi <= 3.0 {
        SeverityClass::Mild
    } else if psi <= 12.0 {
        SeverityClass::Moderate
    } else {
        SeverityClass::Severe
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(index: usize, class: SeverityClass, confidence: f32) -> ImagePrediction {
        ImagePrediction {
            index,
            class,
            confidence,
            runner_up: None,
        }
    }

    fn verdict(outcome: BatchOutcome) -> BatchVerdict {
        match outcome {
            BatchOutcome::Verdict(v) => v,
            BatchOutcome::BackgroundDetected { indices } => {
                panic!("unexpected background outcome: {:?}", indices)
            }
        }
    }

    #[test]
    fn uniform_batch_psi_equals_class_weight() {
        let aggregator = SeverityAggregator::new();
        for class in SeverityClass::CLINICAL {
            let batch: Vec<_> = (0..4).map(|i| prediction(i, class, 90.0)).collect();
            let v = verdict(aggregator.aggregate(&batch).unwrap());
            assert_eq!(v.psi, class.area_weight().unwrap());
        }
    }

    #[test]
    fn psi_stays_within_bounds() {
        let aggregator = SeverityAggregator::new();
        let batch = vec![
            prediction(0, SeverityClass::Healthy, 99.0),
            prediction(1, SeverityClass::Severe, 88.0),
            prediction(2, SeverityClass::Mild, 77.0),
        ];
        let v = verdict(aggregator.aggregate(&batch).unwrap());
        assert!(v.psi >= 0.0 && v.psi <= 15.0);
    }

    #[test]
    fn overall_label_bands_are_inclusive_at_upper_bounds() {
        assert_eq!(overall_label(0.0), SeverityClass::Healthy);
        assert_eq!(overall_label(0.01), SeverityClass::Mild);
        assert_eq!(overall_label(3.0), SeverityClass::Mild);
        assert_eq!(overall_label(3.01), SeverityClass::Moderate);
        assert_eq!(overall_label(12.0), SeverityClass::Moderate);
        assert_eq!(overall_label(12.01), SeverityClass::Severe);
        assert_eq!(overall_label(15.0), SeverityClass::Severe);
    }

    #[test]
    fn severe_plus_moderate_pair_rounds_to_moderate() {
        let aggregator = SeverityAggregator::new();
        let batch = vec![
            prediction(0, SeverityClass::Severe, 91.0),
            prediction(1, SeverityClass::Moderate, 87.0),
        ];
        let v = verdict(aggregator.aggregate(&batch).unwrap());
        assert_eq!(v.psi, 11.5);
        assert_eq!(v.overall, SeverityClass::Moderate);
        assert_eq!(v.overall_confidence, Some(89.0));
    }

    #[test]
    fn confidence_mean_rounds_to_two_decimals() {
        let aggregator = SeverityAggregator::new();
        let batch = vec![
            prediction(0, SeverityClass::Mild, 99.5),
            prediction(1, SeverityClass::Mild, 98.8),
            prediction(2, SeverityClass::Mild, 97.9),
        ];
        let v = verdict(aggregator.aggregate(&batch).unwrap());
        assert_eq!(v.overall_confidence, Some(98.73));
    }

    #[test]
    fn background_prediction_aborts_the_verdict() {
        let aggregator = SeverityAggregator::new();
        let batch = vec![
            prediction(0, SeverityClass::Mild, 60.0),
            prediction(1, SeverityClass::Background, 97.0),
        ];
        match aggregator.aggregate(&batch).unwrap() {
            BatchOutcome::BackgroundDetected { indices } => assert_eq!(indices, vec![1]),
            BatchOutcome::Verdict(v) => panic!("expected background outcome, got {:?}", v),
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let aggregator = SeverityAggregator::new();
        assert!(aggregator.aggregate(&[]).is_err());
    }
}
