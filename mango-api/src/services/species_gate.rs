//! Species verification via a Pl@ntNet-style identification API
//!
//! Best-effort, non-authoritative pre-check that the photographed leaf
//! is a mango leaf. The gate never fails the request pipeline with an
//! error: network trouble, non-success statuses, and unreadable bodies
//! all degrade to a rejection reason. HTTP 404 from the service is
//! defined to mean "nothing plant-like was found".

use async_trait::async_trait;
use mango_common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://my-api.plantnet.org/v2/identify/all";

/// The gate call must not stall the request pipeline
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Ranked candidates inspected for an expected-species match
const TOP_K: usize = 10;

/// Case-insensitive keywords accepted as the expected species
/// (scientific genus plus common-name aliases)
const SPECIES_KEYWORDS: &[&str] = &["mangifera", "mango", "mangga"];

/// Rejection reason when the service finds nothing plant-like
pub const NOT_A_PLANT: &str = "NOT_A_PLANT";

/// Outcome of one species verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Verified,
    Rejected { reason: String },
}

/// Species verifier seam
///
/// Verification never returns an error; a failed call is a definitive
/// "not verified" for that request and is not retried.
#[async_trait]
pub trait SpeciesVerifier: Send + Sync {
    async fn verify(&self, image_bytes: &[u8]) -> GateVerdict;
}

#[derive(Debug, Deserialize)]
struct IdentifyResponse {
    #[serde(default)]
    results: Vec<IdentifyCandidate>,
}

/// One ranked candidate species
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyCandidate {
    pub score: f64,
    pub species: IdentifySpecies,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentifySpecies {
    #[serde(rename = "scientificNameWithoutAuthor")]
    pub scientific_name: String,
    #[serde(rename = "commonNames", default)]
    pub common_names: Vec<String>,
}

/// Pl@ntNet identification gate
pub struct PlantNetGate {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PlantNetGate {
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        })
    }
}

#[async_trait]
impl SpeciesVerifier for PlantNetGate {
    async fn verify(&self, image_bytes: &[u8]) -> GateVerdict {
        let Some(api_key) = &self.api_key else {
            return GateVerdict::Rejected {
                reason: "identification service not configured".to_string(),
            };
        };

        let part = match reqwest::multipart::Part::bytes(image_bytes.to_vec())
            .file_name("leaf.jpg")
            .mime_str("image/jpeg")
        {
            Ok(part) => part,
            Err(e) => {
                return GateVerdict::Rejected {
                    reason: format!("identification upload could not be built: {}", e),
                }
            }
        };
        let form = reqwest::multipart::Form::new()
            .text("organs", "leaf")
            .part("images", part);

        let url = format!("{}?api-key={}", self.base_url, api_key);
        let response = match self.http_client.post(&url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "species identification call failed");
                return GateVerdict::Rejected {
                    reason: format!("identification service unreachable: {}", e),
                };
            }
        };

        let status = response.status();
        if status.as_u16() == 404 {
            // The service answers 404 when no species matches the image
            return GateVerdict::Rejected {
                reason: NOT_A_PLANT.to_string(),
            };
        }
        if !status.is_success() {
            tracing::warn!(status = %status, "species identification returned an error status");
            return GateVerdict::Rejected {
                reason: format!("identification service error (HTTP {})", status.as_u16()),
            };
        }

        match response.json::<IdentifyResponse>().await {
            Ok(body) => verdict_from_candidates(&body.results),
            Err(e) => GateVerdict::Rejected {
                reason: format!("identification response unreadable: {}", e),
            },
        }
    }
}

/// Inspect the top-K candidates for the expected species
///
/// On a miss the reason is the simplified name of the best-scoring
/// candidate, so the caller can tell the user what the photo looked
/// like instead.
pub fn verdict_from_candidates(candidates: &[IdentifyCandidate]) -> GateVerdict {
    if candidates.is_empty() {
        return GateVerdict::Rejected {
            reason: NOT_A_PLANT.to_string(),
        };
    }

    if candidates
        .iter()
        .take(TOP_K)
        .any(|candidate| candidate_matches(&candidate.species))
    {
        return GateVerdict::Verified;
    }

    let best = candidates
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
        .map(|candidate| simplified_name(&candidate.species))
        .unwrap_or_else(|| NOT_A_PLANT.to_string());
    GateVerdict::Rejected { reason: best }
}

fn candidate_matches(species: &IdentifySpecies) -> bool {
    let scientific = species.scientific_name.to_lowercase();
    SPECIES_KEYWORDS.iter().any(|keyword| {
        scientific.contains(keyword)
            || species
                .common_names
                .iter()
                .any(|name| name.to_lowercase().contains(keyword))
    })
}

/// Short display name for a candidate: first common name, else the
/// scientific name without author
fn simplified_name(species: &IdentifySpecies) -> String {
    species
        .common_names
        .first()
        .cloned()
        .unwrap_or_else(|| species.scientific_name.clone())
}
