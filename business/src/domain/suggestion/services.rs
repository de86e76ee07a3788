use async_trait::async_trait;

/// Prompt pair sent to the completion API.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPrompt {
    pub system: String,
    pub user: String,
}

/// Failures of a single completion call.
/// Use code-style identifiers for all error variants for i18n compatibility.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    #[error("completion.missing_credentials")]
    MissingCredentials,
    #[error("completion.network")]
    Network,
    #[error("completion.rate_limited")]
    RateLimited,
    #[error("completion.server_error")]
    ServerError(u16),
    #[error("completion.rejected")]
    Rejected(u16),
    #[error("completion.invalid_payload")]
    InvalidPayload,
}

impl CompletionError {
    /// Network errors, 429 and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::Network | CompletionError::RateLimited | CompletionError::ServerError(_)
        )
    }
}

/// Service port for the external chat-completion API.
///
/// Returns the raw `content` string of the first choice. Parsing it into a
/// suggestion is the caller's job.
#[async_trait]
pub trait SuggestionCompletionService: Send + Sync {
    /// False when no API key is configured; callers skip network I/O entirely.
    fn is_configured(&self) -> bool;

    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, CompletionError>;
}
