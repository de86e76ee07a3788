use serde_json::Value;
use sha2::{Digest, Sha256};

use super::value_objects::SectionId;

/// Part of the form a section's suggestion depends on.
///
/// Forms that nest each section under its own key contribute only that
/// object; flat forms contribute everything.
pub fn relevant_form_slice<'a>(section: &SectionId, form_data: &'a Value) -> &'a Value {
    match form_data.get(section.as_str()) {
        Some(slice) if slice.is_object() => slice,
        _ => form_data,
    }
}

/// Cache key for a suggestion request.
///
/// SHA-256 over the section id, the relevant form slice and the platform
/// context. serde_json keeps object keys sorted, so logically equal inputs
/// hash the same regardless of key order.
pub fn fingerprint(section: &SectionId, form_data: &Value, platform_context: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(section.as_str());
    hasher.update([0u8]);
    hasher.update(relevant_form_slice(section, form_data).to_string());
    hasher.update([0u8]);
    hasher.update(platform_context.to_string());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn section(id: &str) -> SectionId {
        SectionId::parse(id).unwrap()
    }

    #[test]
    fn should_produce_lowercase_hex_sha256() {
        let fp = fingerprint(&section("objectives"), &json!({}), &json!({}));

        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn should_ignore_key_order() {
        let a: Value = serde_json::from_str(r#"{"income": 50000, "expenditure": 30000}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"expenditure": 30000, "income": 50000}"#).unwrap();

        assert_eq!(
            fingerprint(&section("financial_situation"), &a, &json!({})),
            fingerprint(&section("financial_situation"), &b, &json!({}))
        );
    }

    #[test]
    fn should_differ_per_section() {
        let form = json!({"age": 40});

        assert_ne!(
            fingerprint(&section("objectives"), &form, &json!({})),
            fingerprint(&section("risk_assessment"), &form, &json!({}))
        );
    }

    #[test]
    fn should_differ_per_platform_context() {
        let form = json!({"age": 40});

        assert_ne!(
            fingerprint(&section("objectives"), &form, &json!({"clientId": "c1"})),
            fingerprint(&section("objectives"), &form, &json!({"clientId": "c2"}))
        );
    }

    #[test]
    fn should_only_hash_the_section_slice_of_nested_forms() {
        let before = json!({
            "objectives": {"goal": "retirement"},
            "risk_assessment": {"score": 3}
        });
        let after = json!({
            "objectives": {"goal": "retirement"},
            "risk_assessment": {"score": 6}
        });

        assert_eq!(
            fingerprint(&section("objectives"), &before, &json!({})),
            fingerprint(&section("objectives"), &after, &json!({}))
        );
    }

    #[test]
    fn should_use_whole_form_when_section_key_is_not_an_object() {
        let form = json!({"objectives": "retirement", "age": 50});

        assert_eq!(relevant_form_slice(&section("objectives"), &form), &form);
    }

    proptest! {
        #[test]
        fn should_be_deterministic(income in 0u64..10_000_000, age in 18u32..100, client in "[a-z0-9]{1,12}") {
            let form = json!({"income": income, "age": age});
            let context = json!({"clientId": client});

            let first = fingerprint(&section("financial_situation"), &form, &context);
            let second = fingerprint(&section("financial_situation"), &form.clone(), &context.clone());

            prop_assert_eq!(first, second);
        }
    }
}
