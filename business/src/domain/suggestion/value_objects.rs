use serde::{Deserialize, Serialize};

use super::errors::SuggestionError;

const MAX_SECTION_ID_LEN: usize = 64;

/// Assessment sections the fallback generator has rules for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentSection {
    ClientDetails,
    FinancialSituation,
    Objectives,
    RiskAssessment,
    KnowledgeExperience,
    ExistingArrangements,
    VulnerabilityAssessment,
    RegulatoryCompliance,
    Other(String),
}

impl std::fmt::Display for AssessmentSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssessmentSection::ClientDetails => write!(f, "client_details"),
            AssessmentSection::FinancialSituation => write!(f, "financial_situation"),
            AssessmentSection::Objectives => write!(f, "objectives"),
            AssessmentSection::RiskAssessment => write!(f, "risk_assessment"),
            AssessmentSection::KnowledgeExperience => write!(f, "knowledge_experience"),
            AssessmentSection::ExistingArrangements => write!(f, "existing_arrangements"),
            AssessmentSection::VulnerabilityAssessment => write!(f, "vulnerability_assessment"),
            AssessmentSection::RegulatoryCompliance => write!(f, "regulatory_compliance"),
            AssessmentSection::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for AssessmentSection {
    fn from(s: &str) -> Self {
        match s {
            "client_details" => AssessmentSection::ClientDetails,
            "financial_situation" => AssessmentSection::FinancialSituation,
            "objectives" => AssessmentSection::Objectives,
            "risk_assessment" => AssessmentSection::RiskAssessment,
            "knowledge_experience" => AssessmentSection::KnowledgeExperience,
            "existing_arrangements" => AssessmentSection::ExistingArrangements,
            "vulnerability_assessment" => AssessmentSection::VulnerabilityAssessment,
            "regulatory_compliance" => AssessmentSection::RegulatoryCompliance,
            other => AssessmentSection::Other(other.to_string()),
        }
    }
}

/// Identifier of the form section a suggestion is requested for.
///
/// Normalised to lower snake case (`"Financial-Situation"` becomes
/// `"financial_situation"`). Must be non-empty and contain only ASCII
/// alphanumerics and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionId(String);

impl SectionId {
    pub fn parse(raw: &str) -> Result<Self, SuggestionError> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        if normalized.is_empty() || normalized.len() > MAX_SECTION_ID_LEN {
            return Err(SuggestionError::InvalidSection);
        }

        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SuggestionError::InvalidSection);
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn section(&self) -> AssessmentSection {
        AssessmentSection::from(self.0.as_str())
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_normalize_section_id() {
        let id = SectionId::parse("  Financial-Situation ").unwrap();
        assert_eq!(id.as_str(), "financial_situation");
        assert_eq!(id.section(), AssessmentSection::FinancialSituation);
    }

    #[test]
    fn should_reject_empty_section_id() {
        assert_eq!(SectionId::parse("   "), Err(SuggestionError::InvalidSection));
    }

    #[test]
    fn should_reject_section_id_with_symbols() {
        assert_eq!(
            SectionId::parse("objectives; drop table"),
            Err(SuggestionError::InvalidSection)
        );
    }

    #[test]
    fn should_reject_overlong_section_id() {
        let raw = "a".repeat(MAX_SECTION_ID_LEN + 1);
        assert_eq!(SectionId::parse(&raw), Err(SuggestionError::InvalidSection));
    }

    #[test]
    fn should_keep_unknown_sections_as_other() {
        let id = SectionId::parse("pension_transfer").unwrap();
        assert_eq!(
            id.section(),
            AssessmentSection::Other("pension_transfer".to_string())
        );
        assert_eq!(id.section().to_string(), "pension_transfer");
    }

    #[test]
    fn should_round_trip_known_sections_through_display() {
        for name in [
            "client_details",
            "financial_situation",
            "objectives",
            "risk_assessment",
            "knowledge_experience",
            "existing_arrangements",
            "vulnerability_assessment",
            "regulatory_compliance",
        ] {
            assert_eq!(AssessmentSection::from(name).to_string(), name);
        }
    }
}
