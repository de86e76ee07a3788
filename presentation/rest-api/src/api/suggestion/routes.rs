use std::sync::Arc;

use poem_openapi::{OpenApi, payload::Json};
use serde_json::Value;

use business::domain::suggestion::use_cases::generate::{
    GenerateSuggestionParams, GenerateSuggestionUseCase,
};
use business::domain::suggestion::value_objects::SectionId;

use crate::api::error::{ErrorResponse, IntoErrorResponse};
use crate::api::suggestion::dto::{GenerateSuggestionRequest, MetricsResponse, SuggestionResponse};
use crate::api::tags::ApiTags;

pub struct SuggestionApi {
    generate_use_case: Arc<dyn GenerateSuggestionUseCase>,
}

impl SuggestionApi {
    pub fn new(generate_use_case: Arc<dyn GenerateSuggestionUseCase>) -> Self {
        Self { generate_use_case }
    }
}

/// Suggestion API
///
/// Endpoints for generating field suggestions for suitability assessment sections.
#[OpenApi]
impl SuggestionApi {
    /// Generate suggestions for one section
    ///
    /// Returns AI-generated suggestions when the completion API is configured and
    /// reachable, otherwise rule-based ones. Check `sources` to tell them apart.
    #[oai(path = "/suggestions", method = "post", tag = "ApiTags::Suggestions")]
    async fn generate_suggestion(
        &self,
        body: Json<GenerateSuggestionRequest>,
    ) -> GenerateSuggestionResponse {
        let request = body.0;

        let section = match SectionId::parse(&request.section) {
            Ok(section) => section,
            Err(err) => {
                let (_, json) = err.into_error_response();
                return GenerateSuggestionResponse::UnprocessableEntity(json);
            }
        };

        let suggestion = self
            .generate_use_case
            .execute(GenerateSuggestionParams {
                section,
                form_data: request.form_data,
                platform_context: request.platform_context.unwrap_or(Value::Null),
            })
            .await;

        GenerateSuggestionResponse::Ok(Json(suggestion.into()))
    }

    /// Suggestion pipeline counters
    ///
    /// Request, cache, queue and fallback counts since start-up.
    #[oai(path = "/suggestions/metrics", method = "get", tag = "ApiTags::Suggestions")]
    async fn get_metrics(&self) -> Json<MetricsResponse> {
        Json(self.generate_use_case.metrics().into())
    }
}

#[derive(poem_openapi::ApiResponse)]
pub enum GenerateSuggestionResponse {
    #[oai(status = 200)]
    Ok(Json<SuggestionResponse>),
    #[oai(status = 422)]
    UnprocessableEntity(Json<ErrorResponse>),
}
