use serde_json::Value;

use super::fingerprint::relevant_form_slice;
use super::services::CompletionPrompt;
use super::value_objects::{AssessmentSection, SectionId};

const SYSTEM_PROMPT: &str = r#"You are an assistant for UK independent financial advisers completing FCA suitability assessments (COBS 9).
Given one section of a client's fact-find, suggest values for missing or inconsistent fields and point out anything the adviser should review.

Core principles:
- Only suggest values that follow from the data provided; never invent personal details
- Flag affordability, capacity for loss and vulnerability concerns explicitly
- Keep insights short and factual, written for the adviser, not the client
- Use GBP and UK tax wrappers (ISA, SIPP, GIA) where relevant

Return ONLY a JSON object with this EXACT structure:
{
  "fieldSuggestions": { "<fieldId>": <value> },
  "insights": ["..."],
  "warnings": ["..."],
  "confidence": 0.0-1.0
}"#;

fn section_focus(section: &AssessmentSection) -> &'static str {
    match section {
        AssessmentSection::ClientDetails => {
            "Check the personal details for completeness (age, employment status, dependants, retirement age)."
        }
        AssessmentSection::FinancialSituation => {
            "Review income, expenditure, assets, liabilities and emergency fund. Comment on net worth, savings rate and emergency fund coverage in months."
        }
        AssessmentSection::Objectives => {
            "Review the investment objectives, time horizon and required income. Flag objectives that conflict with the time horizon."
        }
        AssessmentSection::RiskAssessment => {
            "Suggest an attitude to risk on a 1-7 scale and assess capacity for loss against the financial situation."
        }
        AssessmentSection::KnowledgeExperience => {
            "Assess the client's investment knowledge and experience and whether complex products are appropriate."
        }
        AssessmentSection::ExistingArrangements => {
            "Review existing pensions, ISAs and investments. Flag charges, guarantees or benefits that could be lost on transfer."
        }
        AssessmentSection::VulnerabilityAssessment => {
            "Identify indicators of vulnerability (health, life events, resilience, capability) under FCA FG21/1."
        }
        AssessmentSection::RegulatoryCompliance => {
            "Check that disclosures, fees and consumer duty outcomes are recorded."
        }
        AssessmentSection::Other(_) => "Review this section and suggest sensible values.",
    }
}

/// Builds the prompt pair for one section of the assessment form.
pub fn build_prompt(
    section: &SectionId,
    form_data: &Value,
    platform_context: &Value,
) -> CompletionPrompt {
    let slice = relevant_form_slice(section, form_data);
    let section_kind = section.section();

    let mut parts = vec![
        format!("SECTION: {}", section),
        section_focus(&section_kind).to_string(),
        String::new(),
        "SECTION DATA:".to_string(),
        pretty(slice),
    ];

    if !is_empty(platform_context) {
        parts.push(String::new());
        parts.push("CLIENT CONTEXT:".to_string());
        parts.push(pretty(platform_context));
    }

    CompletionPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user: parts.join("\n"),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
