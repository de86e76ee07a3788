use async_trait::async_trait;
use serde_json::Value;

use crate::domain::suggestion::metrics::MetricsSnapshot;
use crate::domain::suggestion::model::Suggestion;
use crate::domain::suggestion::value_objects::SectionId;

pub struct GenerateSuggestionParams {
    pub section: SectionId,
    pub form_data: Value,
    pub platform_context: Value,
}

/// Produces a suggestion for one assessment section.
///
/// Infallible by contract: every failure path resolves to a rule-based or
/// stub suggestion.
#[async_trait]
pub trait GenerateSuggestionUseCase: Send + Sync {
    async fn execute(&self, params: GenerateSuggestionParams) -> Suggestion;

    fn metrics(&self) -> MetricsSnapshot;
}
