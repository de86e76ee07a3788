use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::errors::SuggestionError;
use super::model::{DEFAULT_AI_CONFIDENCE, SOURCE_AI, Suggestion, clamp_confidence};

/// Turns the completion `content` into a suggestion.
///
/// `fieldSuggestions` must be an object and `insights` an array of strings.
/// `warnings` and `confidence` are optional. Anything else is a malformed
/// response and is not worth retrying.
pub fn parse_suggestion(
    content: &str,
    generated_at: DateTime<Utc>,
) -> Result<Suggestion, SuggestionError> {
    let json_text = extract_json_object(content).ok_or(SuggestionError::MalformedResponse)?;

    let parsed: Value =
        serde_json::from_str(json_text).map_err(|_| SuggestionError::MalformedResponse)?;

    let field_suggestions: BTreeMap<String, Value> = parsed
        .get("fieldSuggestions")
        .and_then(|f| f.as_object())
        .ok_or(SuggestionError::MalformedResponse)?
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let insights = parsed
        .get("insights")
        .and_then(|i| i.as_array())
        .ok_or(SuggestionError::MalformedResponse)?
        .iter()
        .map(|i| i.as_str().map(|s| s.to_string()))
        .collect::<Option<Vec<String>>>()
        .ok_or(SuggestionError::MalformedResponse)?;

    let warnings = parsed
        .get("warnings")
        .and_then(|w| w.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|w| w.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let confidence = parsed
        .get("confidence")
        .and_then(|c| c.as_f64())
        .map(clamp_confidence)
        .unwrap_or(DEFAULT_AI_CONFIDENCE);

    Ok(Suggestion {
        field_suggestions,
        insights,
        warnings,
        confidence,
        sources: vec![SOURCE_AI.to_string()],
        generated_at,
    })
}

/// Strips markdown fences and any chatter around the outermost JSON object.
fn extract_json_object(content: &str) -> Option<&str> {
    regex::Regex::new(r"\{[\s\S]*\}")
        .ok()
        .and_then(|re| re.find(content))
        .map(|m| m.as_str())
}
