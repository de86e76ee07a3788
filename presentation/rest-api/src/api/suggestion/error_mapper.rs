use poem::http::StatusCode;
use poem_openapi::payload::Json;

use business::domain::suggestion::errors::SuggestionError;

use crate::api::error::{ErrorResponse, IntoErrorResponse};

impl IntoErrorResponse for SuggestionError {
    fn into_error_response(self) -> (StatusCode, Json<ErrorResponse>) {
        let (status, name) = match &self {
            SuggestionError::InvalidSection => (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError"),
            SuggestionError::MalformedResponse => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GenerationError")
            }
        };

        (status, ErrorResponse::json(name, &self.to_string()))
    }
}
