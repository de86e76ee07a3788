use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::fingerprint::relevant_form_slice;
use super::model::{FALLBACK_CONFIDENCE, SOURCE_RULES, Suggestion};
use super::value_objects::{AssessmentSection, SectionId};

pub const FALLBACK_NOTICE: &str =
    "AI analysis is unavailable, so these suggestions come from rule-based analysis.";

const AFFORDABILITY_THRESHOLD: f64 = 0.8;
const EMERGENCY_FUND_MONTHS: f64 = 6.0;
const MIN_EMERGENCY_FUND_MONTHS: f64 = 3.0;
const DEFAULT_RETIREMENT_AGE: f64 = 67.0;
const SHORT_HORIZON_YEARS: f64 = 5.0;
const VULNERABLE_AGE: f64 = 75.0;

/// Deterministic stand-in for the AI suggestion.
///
/// Every input is optional. Numbers may arrive as JSON numbers or as strings
/// such as `"£42,000"`. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    pub fn generate(
        &self,
        section: &SectionId,
        form_data: &Value,
        platform_context: &Value,
        generated_at: DateTime<Utc>,
    ) -> Suggestion {
        let facts = Facts {
            slice: relevant_form_slice(section, form_data),
            form: form_data,
            context: platform_context,
        };
        let mut out = RuleOutput::default();

        match section.section() {
            AssessmentSection::FinancialSituation => financial_situation(&facts, &mut out),
            AssessmentSection::Objectives => objectives(&facts, &mut out),
            AssessmentSection::RiskAssessment => risk_assessment(&facts, &mut out),
            AssessmentSection::KnowledgeExperience => knowledge_experience(&facts, &mut out),
            AssessmentSection::VulnerabilityAssessment => vulnerability(&facts, &mut out),
            AssessmentSection::ClientDetails
            | AssessmentSection::ExistingArrangements
            | AssessmentSection::RegulatoryCompliance => out.insights.push(
                "No automatic checks exist for this section; please review it manually."
                    .to_string(),
            ),
            AssessmentSection::Other(_) => out.insights.push(
                "No suggestions are available for this section.".to_string(),
            ),
        }

        let mut insights = vec![FALLBACK_NOTICE.to_string()];
        insights.extend(out.insights);

        Suggestion {
            field_suggestions: out.fields,
            insights,
            warnings: out.warnings,
            confidence: FALLBACK_CONFIDENCE,
            sources: vec![SOURCE_RULES.to_string()],
            generated_at,
        }
    }
}

#[derive(Default)]
struct RuleOutput {
    fields: BTreeMap<String, Value>,
    insights: Vec<String>,
    warnings: Vec<String>,
}

/// Lookup over the section slice, then the whole form, then the platform context.
struct Facts<'a> {
    slice: &'a Value,
    form: &'a Value,
    context: &'a Value,
}

impl Facts<'_> {
    fn raw(&self, keys: &[&str]) -> Option<&Value> {
        [self.slice, self.form, self.context]
            .into_iter()
            .flat_map(|source| keys.iter().filter_map(move |key| source.get(*key)))
            .find(|value| !value.is_null())
    }

    fn number(&self, keys: &[&str]) -> Option<f64> {
        self.raw(keys).and_then(as_number)
    }

    fn has(&self, keys: &[&str]) -> bool {
        self.raw(keys).is_some_and(|value| match value {
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
    }

    fn flag(&self, keys: &[&str]) -> bool {
        match self.raw(keys) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                let s = s.trim().to_lowercase();
                !s.is_empty() && s != "no" && s != "none" && s != "false"
            }
            Some(Value::Array(items)) => !items.is_empty(),
            _ => false,
        }
    }

    fn annual_income(&self) -> Option<f64> {
        self.number(&["annual_income", "annualIncome", "income"])
            .or_else(|| self.number(&["monthly_income", "monthlyIncome"]).map(|m| m * 12.0))
    }

    fn monthly_expenditure(&self) -> Option<f64> {
        self.number(&["monthly_expenditure", "monthlyExpenditure"])
            .or_else(|| {
                self.number(&["annual_expenditure", "annualExpenditure", "expenditure"])
                    .map(|a| a / 12.0)
            })
    }

    fn emergency_fund(&self) -> Option<f64> {
        self.number(&["emergency_fund", "emergencyFund"])
    }

    fn age(&self) -> Option<f64> {
        self.number(&["age", "client_age", "clientAge"])
    }

    fn time_horizon(&self) -> Option<f64> {
        self.number(&["time_horizon", "timeHorizon", "investment_horizon", "investmentHorizon"])
    }

    fn horizon_from_age(&self) -> Option<f64> {
        let age = self.age()?;
        let retirement_age = self
            .number(&["retirement_age", "retirementAge"])
            .unwrap_or(DEFAULT_RETIREMENT_AGE);
        let years = (retirement_age - age).round();
        (years > 0.0).then_some(years)
    }

    fn emergency_fund_months(&self) -> Option<f64> {
        let fund = self.emergency_fund()?;
        let monthly = self.monthly_expenditure().filter(|m| *m > 0.0)?;
        Some(fund / monthly)
    }
}

fn financial_situation(facts: &Facts<'_>, out: &mut RuleOutput) {
    let assets = facts.number(&["total_assets", "totalAssets", "assets"]);
    let liabilities = facts.number(&["total_liabilities", "totalLiabilities", "liabilities"]);

    if assets.is_some() || liabilities.is_some() {
        let assets = assets.unwrap_or(0.0);
        let liabilities = liabilities.unwrap_or(0.0);
        let net_worth = (assets - liabilities).round();
        out.fields.insert("net_worth".to_string(), json!(net_worth));
        out.insights
            .push(format!("Net worth is {}.", format_gbp(net_worth)));
        if liabilities > assets {
            out.warnings.push(
                "Liabilities exceed assets; review debt before recommending investment."
                    .to_string(),
            );
        }
    }

    let income = facts.annual_income();
    let monthly_expenditure = facts.monthly_expenditure();

    if let (Some(income), Some(monthly)) = (income, monthly_expenditure)
        && income > 0.0
    {
        let annual_expenditure = monthly * 12.0;
        let disposable = (income - annual_expenditure).round();
        let savings_rate = round_to(disposable / income * 100.0, 1);
        out.fields
            .insert("disposable_income".to_string(), json!(disposable));
        out.fields
            .insert("savings_rate".to_string(), json!(savings_rate));
        out.insights
            .push(format!("Estimated savings rate is {}% of income.", savings_rate));

        if annual_expenditure > income * AFFORDABILITY_THRESHOLD {
            out.warnings.push(format!(
                "Expenditure is {}% of income, above the {}% affordability threshold.",
                round_to(annual_expenditure / income * 100.0, 0),
                round_to(AFFORDABILITY_THRESHOLD * 100.0, 0)
            ));
        }
    }

    match (facts.emergency_fund(), monthly_expenditure) {
        (None, Some(monthly)) if monthly > 0.0 => {
            let suggested = (monthly * EMERGENCY_FUND_MONTHS).round();
            out.fields
                .insert("emergency_fund".to_string(), json!(suggested));
            out.insights.push(format!(
                "No emergency fund recorded; {} covers six months of expenditure.",
                format_gbp(suggested)
            ));
        }
        (None, _) => out.insights.push(
            "No emergency fund recorded; six months of expenditure is the usual target."
                .to_string(),
        ),
        (Some(_), _) => {
            if let Some(months) = facts.emergency_fund_months() {
                let months = round_to(months, 1);
                out.fields
                    .insert("emergency_fund_months".to_string(), json!(months));
                if months < MIN_EMERGENCY_FUND_MONTHS {
                    out.warnings.push(format!(
                        "Emergency fund covers only {} months of expenditure.",
                        months
                    ));
                }
            }
        }
    }
}

fn objectives(facts: &Facts<'_>, out: &mut RuleOutput) {
    let horizon = match facts.time_horizon() {
        Some(horizon) => Some(horizon),
        None => {
            let suggested = facts.horizon_from_age();
            if let Some(years) = suggested {
                out.fields.insert("time_horizon".to_string(), json!(years));
                out.insights.push(format!(
                    "Time horizon of {} years assumed from age and retirement age.",
                    years
                ));
            }
            suggested
        }
    };

    match horizon {
        Some(years) if years < SHORT_HORIZON_YEARS => out.warnings.push(format!(
            "A {} year horizon is short for investing; capital may be at risk when it is needed.",
            years
        )),
        Some(_) => {}
        None => out
            .insights
            .push("Record a time horizon so objectives can be assessed.".to_string()),
    }
}

fn risk_assessment(facts: &Facts<'_>, out: &mut RuleOutput) {
    if !facts.has(&["attitude_to_risk", "attitudeToRisk", "risk_score", "riskScore"]) {
        let horizon = facts.time_horizon().or_else(|| facts.horizon_from_age());
        let score = match (horizon, facts.age()) {
            (Some(h), _) if h < 3.0 => 2,
            (Some(h), _) if h < 5.0 => 3,
            (Some(h), _) if h < 10.0 => 4,
            (Some(_), _) => 5,
            (None, Some(age)) if age < 40.0 => 5,
            (None, Some(age)) if age < 55.0 => 4,
            (None, Some(age)) if age < 65.0 => 3,
            (None, Some(_)) => 2,
            (None, None) => 3,
        };
        out.fields
            .insert("attitude_to_risk".to_string(), json!(score));
        out.insights.push(format!(
            "Suggested attitude to risk {} of 7; confirm with the risk questionnaire.",
            score
        ));
    }

    if let Some(months) = facts.emergency_fund_months()
        && months < MIN_EMERGENCY_FUND_MONTHS
    {
        out.fields
            .insert("capacity_for_loss".to_string(), json!("low"));
        out.warnings.push(
            "Limited emergency fund suggests low capacity for loss.".to_string(),
        );
    }
}

fn knowledge_experience(facts: &Facts<'_>, out: &mut RuleOutput) {
    if !facts.has(&["investment_experience", "investmentExperience"]) {
        out.fields
            .insert("investment_experience".to_string(), json!("none"));
        out.insights.push(
            "No investment experience recorded; explain investment risks in plain terms."
                .to_string(),
        );
    }
}

fn vulnerability(facts: &Facts<'_>, out: &mut RuleOutput) {
    let elderly = facts.age().is_some_and(|age| age >= VULNERABLE_AGE);
    let health = facts.flag(&["health_concerns", "healthConcerns", "health_issues"]);
    let life_event = facts.flag(&["recent_life_event", "recentLifeEvent", "bereavement"]);

    if elderly {
        out.warnings
            .push("Client is 75 or over; apply vulnerable client procedures.".to_string());
    }
    if health {
        out.warnings
            .push("Health concerns recorded; consider vulnerability adjustments.".to_string());
    }
    if life_event {
        out.warnings
            .push("Recent life event recorded; check the client's resilience.".to_string());
    }

    let vulnerable = elderly || health || life_event;
    out.fields
        .insert("is_vulnerable".to_string(), json!(vulnerable));
    if !vulnerable {
        out.insights
            .push("No vulnerability indicators found in the data provided.".to_string());
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '£' | ',' | ' '))
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn format_gbp(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-£{}", grouped)
    } else {
        format!("£{}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(section: &str, form: Value) -> Suggestion {
        FallbackGenerator.generate(
            &SectionId::parse(section).unwrap(),
            &form,
            &Value::Null,
            Utc::now(),
        )
    }

    #[test]
    fn should_always_lead_with_rule_based_notice() {
        let suggestion = generate("financial_situation", json!({}));

        assert_eq!(suggestion.insights[0], FALLBACK_NOTICE);
        assert_eq!(suggestion.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(suggestion.sources, vec![SOURCE_RULES.to_string()]);
    }

    #[test]
    fn should_warn_when_expenditure_exceeds_eighty_percent_of_income() {
        let suggestion = generate(
            "financial_situation",
            json!({"annual_income": 40000, "monthly_expenditure": 3000}),
        );

        assert!(
            suggestion
                .warnings
                .iter()
                .any(|w| w.contains("90% of income"))
        );
        assert_eq!(suggestion.field_suggestions["savings_rate"], json!(10.0));
        assert_eq!(suggestion.field_suggestions["disposable_income"], json!(4000.0));
    }

    #[test]
    fn should_not_warn_at_comfortable_expenditure() {
        let suggestion = generate(
            "financial_situation",
            json!({"annual_income": 60000, "annual_expenditure": 30000, "emergency_fund": 20000}),
        );

        assert!(suggestion.warnings.is_empty());
        assert_eq!(suggestion.field_suggestions["emergency_fund_months"], json!(8.0));
    }

    #[test]
    fn should_suggest_six_months_of_expenditure_as_emergency_fund() {
        let suggestion = generate(
            "financial_situation",
            json!({"annual_income": "£50,000", "monthly_expenditure": "2,500"}),
        );

        assert_eq!(suggestion.field_suggestions["emergency_fund"], json!(15000.0));
        assert!(suggestion.insights.iter().any(|i| i.contains("£15,000")));
    }

    #[test]
    fn should_warn_about_thin_emergency_fund() {
        let suggestion = generate(
            "financial_situation",
            json!({"monthly_expenditure": 2000, "emergency_fund": 3000}),
        );

        assert!(
            suggestion
                .warnings
                .iter()
                .any(|w| w.contains("1.5 months"))
        );
    }

    #[test]
    fn should_compute_net_worth_and_flag_negative_position() {
        let suggestion = generate(
            "financial_situation",
            json!({"total_assets": 100000, "total_liabilities": 150000}),
        );

        assert_eq!(suggestion.field_suggestions["net_worth"], json!(-50000.0));
        assert!(suggestion.insights.iter().any(|i| i.contains("-£50,000")));
        assert!(
            suggestion
                .warnings
                .iter()
                .any(|w| w.contains("Liabilities exceed assets"))
        );
    }

    #[test]
    fn should_read_nested_section_slice() {
        let suggestion = generate(
            "financial_situation",
            json!({"financial_situation": {"annual_income": 40000, "monthly_expenditure": 3000}}),
        );

        assert!(suggestion.field_suggestions.contains_key("savings_rate"));
    }

    #[test]
    fn should_assume_horizon_from_age_for_objectives() {
        let suggestion = generate("objectives", json!({"age": 64}));

        assert_eq!(suggestion.field_suggestions["time_horizon"], json!(3.0));
        assert!(suggestion.warnings.iter().any(|w| w.contains("3 year horizon")));
    }

    #[test]
    fn should_use_platform_context_for_missing_facts() {
        let suggestion = FallbackGenerator.generate(
            &SectionId::parse("objectives").unwrap(),
            &json!({}),
            &json!({"clientAge": 30, "retirementAge": 60}),
            Utc::now(),
        );

        assert_eq!(suggestion.field_suggestions["time_horizon"], json!(30.0));
        assert!(suggestion.warnings.is_empty());
    }

    #[test]
    fn should_suggest_risk_score_from_horizon() {
        let suggestion = generate("risk_assessment", json!({"time_horizon": 15}));

        assert_eq!(suggestion.field_suggestions["attitude_to_risk"], json!(5));
    }

    #[test]
    fn should_keep_existing_risk_score_and_flag_capacity_for_loss() {
        let suggestion = generate(
            "risk_assessment",
            json!({"attitude_to_risk": 6, "monthly_expenditure": 2000, "emergency_fund": 1000}),
        );

        assert!(!suggestion.field_suggestions.contains_key("attitude_to_risk"));
        assert_eq!(suggestion.field_suggestions["capacity_for_loss"], json!("low"));
    }

    #[test]
    fn should_default_investment_experience_to_none() {
        let suggestion = generate("knowledge_experience", json!({}));

        assert_eq!(
            suggestion.field_suggestions["investment_experience"],
            json!("none")
        );
    }

    #[test]
    fn should_flag_vulnerability_indicators() {
        let suggestion = generate(
            "vulnerability_assessment",
            json!({"age": 81, "health_concerns": "mobility"}),
        );

        assert_eq!(suggestion.field_suggestions["is_vulnerable"], json!(true));
        assert_eq!(suggestion.warnings.len(), 2);
    }

    #[test]
    fn should_return_empty_suggestion_for_unknown_section() {
        let suggestion = generate("pension_transfer", json!({"anything": 1}));

        assert!(suggestion.field_suggestions.is_empty());
        assert!(suggestion.warnings.is_empty());
        assert_eq!(suggestion.insights.len(), 2);
    }

    #[test]
    fn should_survive_garbage_inputs() {
        for form in [
            Value::Null,
            json!("text"),
            json!([1, 2, 3]),
            json!({"annual_income": "lots", "monthly_expenditure": {"nested": true}}),
            json!({"annual_income": 0, "monthly_expenditure": 0}),
        ] {
            for section in ["financial_situation", "objectives", "risk_assessment", "vulnerability_assessment"] {
                let suggestion = generate(section, form.clone());
                assert!(!suggestion.insights.is_empty());
                assert!(suggestion.confidence <= FALLBACK_CONFIDENCE);
            }
        }
    }

    #[test]
    fn should_format_pounds_with_thousands_separators() {
        assert_eq!(format_gbp(0.0), "£0");
        assert_eq!(format_gbp(999.0), "£999");
        assert_eq!(format_gbp(1234567.4), "£1,234,567");
        assert_eq!(format_gbp(-50000.0), "-£50,000");
    }
}
