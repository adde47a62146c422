//! Pre-authored treatment recommendation record

use serde::{Deserialize, Serialize};

/// One entry of the (severity × risk) recommendation matrix
///
/// Statically authored; exactly one record exists per clinical severity
/// and risk tier combination. The `*_tagalog` fields are the parallel
/// localized rendition, a static lookup rather than a runtime translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    /// Clinical severity label ("Healthy" … "Severe")
    pub severity_label: String,
    /// Weather risk label ("Low" / "Medium" / "High")
    pub weather_risk: String,
    /// Action on the escalation scale
    /// (Maintain < Prevent < Monitor/Treat < Treat < Intensive Treatment < Emergency Action)
    pub action_label: String,
    /// Ordered step text, one step per line
    pub advice: String,
    /// Agronomic reasoning behind the action
    pub rationale: String,
    pub action_label_tagalog: String,
    pub advice_tagalog: String,
    pub rationale_tagalog: String,
}
