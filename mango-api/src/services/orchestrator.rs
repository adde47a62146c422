//! Batch analysis orchestration
//!
//! Sequences one request through
//! GateCheck (optional) → Classify → BackgroundCheck → Aggregate →
//! WeatherRisk → Resolve, with two terminal short-circuits: a species
//! gate rejection ends the request as "retake photo", and a confident
//! background image ends it as "not analyzable". Neither short-circuit
//! runs weather-risk classification or recommendation resolution.

use crate::models::{
    AnalysisOutcome, AnalysisReport, ImagePrediction, WeatherReading,
};
use crate::services::aggregator::{BatchOutcome, SeverityAggregator};
use crate::services::classifier::{self, SeverityModel};
use crate::services::recommendation::RecommendationTable;
use crate::services::species_gate::{GateVerdict, SpeciesVerifier};
use crate::services::weather_risk;
use mango_common::{Error, Result};
use std::sync::Arc;
use uuid::Uuid;

/// One uploaded image, still undecoded
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Everything one analysis needs, assembled by the transport layer
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub images: Vec<UploadedImage>,
    pub weather: WeatherReading,
    /// Run the species gate before classification
    pub verify_species: bool,
}

/// Analysis pipeline orchestrator
///
/// Holds the long-lived collaborators, all constructed at startup and
/// shared read-only across requests.
pub struct AnalysisOrchestrator {
    classifier: Arc<dyn SeverityModel>,
    species_gate: Arc<dyn SpeciesVerifier>,
    aggregator: SeverityAggregator,
    recommendations: Arc<RecommendationTable>,
}

impl AnalysisOrchestrator {
    pub fn new(
        classifier: Arc<dyn SeverityModel>,
        species_gate: Arc<dyn SpeciesVerifier>,
        recommendations: Arc<RecommendationTable>,
    ) -> Self {
        Self {
            classifier,
            species_gate,
            aggregator: SeverityAggregator::new(),
            recommendations,
        }
    }

    /// Run the full pipeline for one batch
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome> {
        let request_id = Uuid::new_v4();

        if request.images.is_empty() {
            return Err(Error::InvalidInput(
                "at least one image is required".to_string(),
            ));
        }
        request.weather.validate()?;

        tracing::info!(
            request_id = %request_id,
            images = request.images.len(),
            verify_species = request.verify_species,
            "starting batch analysis"
        );

        if request.verify_species {
            if let Some(outcome) = self.run_gate_check(request_id, &request.images).await {
                return Ok(outcome);
            }
        }

        let predictions = self.classify_batch(request_id, &request.images).await?;

        let verdict = match self.aggregator.aggregate(&predictions)? {
            BatchOutcome::BackgroundDetected { indices } => {
                tracing::info!(
                    request_id = %request_id,
                    images = ?indices,
                    "confident background detected, skipping analysis"
                );
                let listed = indices
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Ok(AnalysisOutcome::NotAnalyzable {
                    reason: format!("background detected in image(s) {}", listed),
                });
            }
            BatchOutcome::Verdict(verdict) => verdict,
        };

        let risk = weather_risk::classify_reading(&request.weather);
        let recommendation = self.recommendations.resolve(verdict.overall, risk)?.clone();

        tracing::info!(
            request_id = %request_id,
            psi = verdict.psi,
            overall = verdict.overall.label(),
            risk = risk.label(),
            action = %recommendation.action_label,
            "batch analysis complete"
        );

        Ok(AnalysisOutcome::Completed(AnalysisReport {
            percent_severity_index: verdict.psi,
            overall_severity_index: verdict.overall.index(),
            overall_label: verdict.overall,
            overall_confidence: verdict.overall_confidence,
            weather: request.weather,
            recommendation,
        }))
    }

    /// Verify every image against the expected species; first rejection
    /// terminates the batch before any severity inference runs
    async fn run_gate_check(
        &self,
        request_id: Uuid,
        images: &[UploadedImage],
    ) -> Option<AnalysisOutcome> {
        for (index, image) in images.iter().enumerate() {
            match self.species_gate.verify(&image.bytes).await {
                GateVerdict::Verified => {}
                GateVerdict::Rejected { reason } => {
                    tracing::info!(
                        request_id = %request_id,
                        image = index,
                        reason = %reason,
                        "species gate rejected batch"
                    );
                    return Some(AnalysisOutcome::RetakePhoto { reason });
                }
            }
        }
        None
    }

    /// Classify all images, preserving submission order in the output
    async fn classify_batch(
        &self,
        request_id: Uuid,
        images: &[UploadedImage],
    ) -> Result<Vec<ImagePrediction>> {
        let mut predictions = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            let model = Arc::clone(&self.classifier);
            let bytes = image.bytes.clone();
            let ranked = tokio::task::spawn_blocking(move || model.classify(&bytes))
                .await
                .map_err(|e| Error::Internal(format!("classification task failed: {}", e)))??;

            let top = ranked.first().copied();
            let prediction = classifier::effective_prediction(index, &ranked)?;

            if let Some(top) = top {
                if top.class.is_background() && !prediction.class.is_background() {
                    tracing::warn!(
                        request_id = %request_id,
                        image = index,
                        background_confidence = top.confidence,
                        promoted = prediction.class.label(),
                        promoted_confidence = prediction.confidence,
                        "suspected background overridden"
                    );
                }
            }
            tracing::info!(
                request_id = %request_id,
                image = index,
                file = image.file_name.as_deref().unwrap_or("-"),
                class = prediction.class.label(),
                confidence = prediction.confidence,
                "image classified"
            );

            predictions.push(prediction);
        }

        Ok(predictions)
    }
}
