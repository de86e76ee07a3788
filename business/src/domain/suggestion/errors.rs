/// Suggestion errors for the domain layer.
/// Use code-style identifiers for all error variants for i18n compatibility.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SuggestionError {
    #[error("suggestion.invalid_section")]
    InvalidSection,
    #[error("suggestion.malformed_response")]
    MalformedResponse,
}
