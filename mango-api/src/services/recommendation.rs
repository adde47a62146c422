//! Recommendation table loading, validation, and resolution
//!
//! The 12 (severity × risk) records are static data, authored in a TOML
//! resource embedded at build time (overridable by file path). Totality
//! over the full cross-product is validated at startup; a missing or
//! duplicate entry is a configuration error that must never reach a live
//! request.

use crate::models::{RecommendationRecord, RiskLevel, SeverityClass};
use mango_common::{Error, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TABLE: &str = include_str!("../../resources/recommendations.toml");

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default, rename = "record")]
    records: Vec<RecommendationRecord>,
}

/// Validated, total (severity × risk) → record lookup
#[derive(Debug)]
pub struct RecommendationTable {
    /// Flat row-major storage: index = clinical severity * 3 + risk
    records: Vec<RecommendationRecord>,
}

impl RecommendationTable {
    /// Load the table from an override path, or the embedded resource
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        match override_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!(
                        "failed to read recommendation table {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml_str(&content)
            }
            None => Self::from_toml_str(DEFAULT_TABLE),
        }
    }

    /// Parse and validate a TOML table document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TableFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("recommendation table parse failed: {}", e)))?;

        let mut slots: Vec<Option<RecommendationRecord>> =
            vec![None; SeverityClass::CLINICAL.len() * RiskLevel::ALL.len()];

        for record in file.records {
            let severity = SeverityClass::from_label(&record.severity_label)
                .filter(|c| !c.is_background())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "recommendation record has unknown severity '{}'",
                        record.severity_label
                    ))
                })?;
            let risk = RiskLevel::from_label(&record.weather_risk).ok_or_else(|| {
                Error::Config(format!(
                    "recommendation record has unknown weather risk '{}'",
                    record.weather_risk
                ))
            })?;

            for (field, value) in [
                ("action_label", &record.action_label),
                ("advice", &record.advice),
                ("rationale", &record.rationale),
                ("action_label_tagalog", &record.action_label_tagalog),
                ("advice_tagalog", &record.advice_tagalog),
                ("rationale_tagalog", &record.rationale_tagalog),
            ] {
                if value.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "recommendation record {}/{} has empty {}",
                        severity.label(),
                        risk.label(),
                        field
                    )));
                }
            }

            let slot = slot_index(severity, risk);
            if slots[slot].is_some() {
                return Err(Error::Config(format!(
                    "duplicate recommendation record for {}/{}",
                    severity.label(),
                    risk.label()
                )));
            }
            slots[slot] = Some(record);
        }

        let mut records = Vec::with_capacity(slots.len());
        for (slot, record) in slots.into_iter().enumerate() {
            match record {
                Some(record) => records.push(record),
                None => {
                    let severity = SeverityClass::CLINICAL[slot / RiskLevel::ALL.len()];
                    let risk = RiskLevel::ALL[slot % RiskLevel::ALL.len()];
                    return Err(Error::Config(format!(
                        "recommendation table is missing an entry for {}/{}",
                        severity.label(),
                        risk.label()
                    )));
                }
            }
        }

        Ok(Self { records })
    }

    /// Total lookup for a clinical severity and risk tier
    ///
    /// Background carries no recommendation; requesting one is invalid
    /// input, not a table gap.
    pub fn resolve(&self, severity: SeverityClass, risk: RiskLevel) -> Result<&RecommendationRecord> {
        let clinical = severity.clinical_index().ok_or_else(|| {
            Error::InvalidInput("no recommendation exists for background images".to_string())
        })?;
        Ok(&self.records[slot_index_from(clinical, risk)])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn slot_index(severity: SeverityClass, risk: RiskLevel) -> usize {
    // Callers guarantee a clinical class
    slot_index_from(severity.index(), risk)
}

fn slot_index_from(clinical_index: usize, risk: RiskLevel) -> usize {
    clinical_index * RiskLevel::ALL.len() + risk.index()
}
