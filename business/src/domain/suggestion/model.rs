use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence given to a parsed AI response that did not report one.
pub const DEFAULT_AI_CONFIDENCE: f64 = 0.7;
/// Confidence of every rule-based suggestion.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;
/// Confidence of the stub returned when the service is shut down.
pub const UNAVAILABLE_CONFIDENCE: f64 = 0.5;

pub const SOURCE_AI: &str = "ai_analysis";
pub const SOURCE_RULES: &str = "rule_based_analysis";
pub const SOURCE_UNAVAILABLE: &str = "service_unavailable";

/// Suggested values for one assessment section.
///
/// Produced either from the completion API or by the fallback generator.
/// Never mutated after it is handed to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub field_suggestions: BTreeMap<String, serde_json::Value>,
    pub insights: Vec<String>,
    pub warnings: Vec<String>,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl Suggestion {
    /// Returned when the suggestion pipeline has been shut down and can no
    /// longer resolve queued requests.
    pub fn service_unavailable(generated_at: DateTime<Utc>) -> Self {
        Self {
            field_suggestions: BTreeMap::new(),
            insights: vec![
                "AI suggestions are temporarily unavailable. Please complete this section manually."
                    .to_string(),
            ],
            warnings: vec![],
            confidence: UNAVAILABLE_CONFIDENCE,
            sources: vec![SOURCE_UNAVAILABLE.to_string()],
            generated_at,
        }
    }
}

/// Clamps a reported confidence into `[0, 1]`.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_AI_CONFIDENCE;
    }
    value.clamp(0.0, 1.0)
}
