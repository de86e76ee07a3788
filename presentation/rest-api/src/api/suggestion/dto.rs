use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use poem_openapi::Object;
use serde_json::Value;

use business::domain::suggestion::metrics::MetricsSnapshot;
use business::domain::suggestion::model::Suggestion;

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct GenerateSuggestionRequest {
    /// Assessment section identifier, e.g. `financial_situation`
    pub section: String,
    /// Full assessment form, keyed by section
    pub form_data: Value,
    /// Client context supplied by the platform
    #[oai(skip_serializing_if_is_none)]
    pub platform_context: Option<Value>,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct SuggestionResponse {
    /// Suggested values keyed by field id
    pub field_suggestions: BTreeMap<String, Value>,
    /// Observations for the adviser
    pub insights: Vec<String>,
    /// Concerns the adviser should review
    pub warnings: Vec<String>,
    /// Confidence between 0 and 1
    pub confidence: f64,
    /// Where the suggestion came from (`ai_analysis`, `rule_based_analysis`, `service_unavailable`)
    pub sources: Vec<String>,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
}

impl From<Suggestion> for SuggestionResponse {
    fn from(s: Suggestion) -> Self {
        Self {
            field_suggestions: s.field_suggestions,
            insights: s.insights,
            warnings: s.warnings,
            confidence: s.confidence,
            sources: s.sources,
            generated_at: s.generated_at,
        }
    }
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub api_calls: u64,
    pub queued: u64,
    pub errors: u64,
    pub fallbacks: u64,
    pub rate_limit_rejections: u64,
    pub cache_size: u64,
    pub queue_depth: u64,
    /// Cache hits over total requests, 0 when nothing has been served
    pub cache_hit_rate: f64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(m: MetricsSnapshot) -> Self {
        Self {
            cache_hit_rate: m.cache_hit_rate(),
            total_requests: m.total_requests,
            cache_hits: m.cache_hits,
            api_calls: m.api_calls,
            queued: m.queued,
            errors: m.errors,
            fallbacks: m.fallbacks,
            rate_limit_rejections: m.rate_limit_rejections,
            cache_size: m.cache_size as u64,
            queue_depth: m.queue_depth as u64,
        }
    }
}
