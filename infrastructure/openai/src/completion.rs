use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use business::domain::suggestion::services::{
    CompletionError, CompletionPrompt, SuggestionCompletionService,
};

use crate::client::OpenAIClient;

const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 1500;

/// Chat completions adapter for the suggestion pipeline.
///
/// Asks for a JSON object reply and hands back the raw `content` of the
/// first choice. HTTP failures are mapped onto `CompletionError` so the
/// retry queue can tell transient from permanent ones.
pub struct SuggestionCompletionOpenAI {
    client: OpenAIClient,
}

impl SuggestionCompletionOpenAI {
    pub fn new(client: OpenAIClient) -> Self {
        Self { client }
    }

    fn build_body(&self, prompt: &CompletionPrompt) -> Value {
        json!({
            "model": self.client.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "response_format": {"type": "json_object"},
        })
    }

    fn classify_status(status: StatusCode) -> CompletionError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            CompletionError::RateLimited
        } else if status.is_server_error() {
            CompletionError::ServerError(status.as_u16())
        } else {
            CompletionError::Rejected(status.as_u16())
        }
    }

    fn extract_content(data: &Value) -> Result<String, CompletionError> {
        data["choices"]
            .as_array()
            .and_then(|choices| choices.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(|content| content.to_string())
            .ok_or(CompletionError::InvalidPayload)
    }
}

#[async_trait]
impl SuggestionCompletionService for SuggestionCompletionOpenAI {
    fn is_configured(&self) -> bool {
        self.client.has_credentials()
    }

    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, CompletionError> {
        let auth_header = self
            .client
            .auth_header()
            .ok_or(CompletionError::MissingCredentials)?;

        let response = self
            .client
            .client
            .post(self.client.chat_completions_url())
            .header("Content-Type", "application/json")
            .header("Authorization", auth_header)
            .json(&self.build_body(prompt))
            .send()
            .await
            .map_err(|_| CompletionError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|_| CompletionError::InvalidPayload)?;

        Self::extract_content(&data)
    }
}
