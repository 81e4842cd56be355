/// Property-based tests using proptest.
/// Invariants of phone normalization, validation, and attribution extraction.
use fastoffer_lead_api::attribution::{extract_attribution, ATTRIBUTION_FIELDS, URL_VALUE_MAX};
use fastoffer_lead_api::ghl_sync::normalize_phone;
use fastoffer_lead_api::models::LeadSubmission;
use fastoffer_lead_api::validation::validate_submission;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;

proptest! {
    #[test]
    fn phone_normalization_never_panics(phone in "\\PC*") {
        let _ = normalize_phone(&phone);
    }

    #[test]
    fn phone_normalization_is_idempotent(phone in "\\PC*") {
        let once = normalize_phone(&phone);
        let twice = normalize_phone(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn ten_digit_numbers_get_us_country_code(number in 2_000_000_000u64..=9_999_999_999u64) {
        let raw = number.to_string();
        prop_assert_eq!(normalize_phone(&raw), format!("+1{}", raw));
    }

    #[test]
    fn eleven_digit_numbers_starting_with_one_get_plus(rest in 1_000_000_000u64..=9_999_999_999u64) {
        let raw = format!("1{}", rest);
        prop_assert_eq!(normalize_phone(&raw), format!("+{}", raw));
    }

    #[test]
    fn plus_prefixed_numbers_pass_through(digits in "[0-9]{1,15}") {
        let raw = format!("+{}", digits);
        prop_assert_eq!(normalize_phone(&raw), raw.clone());
    }

    #[test]
    fn validation_never_panics(
        first in proptest::option::of("\\PC{0,150}"),
        email in proptest::option::of("\\PC{0,300}"),
        phone in proptest::option::of("\\PC{0,30}"),
        address in proptest::option::of("\\PC{0,600}"),
        condition in proptest::option::of("\\PC{0,20}"),
    ) {
        let submission = LeadSubmission {
            first_name: first,
            email,
            phone,
            address,
            condition,
            ..Default::default()
        };
        let _ = validate_submission(&submission);
    }

    #[test]
    fn extraction_emits_only_known_capped_keys(
        entries in proptest::collection::hash_map("[a-zA-Z_]{1,24}", "\\PC{0,3000}", 0..12)
    ) {
        let extra: HashMap<String, serde_json::Value> = entries
            .into_iter()
            .map(|(k, v)| (k, json!(v)))
            .collect();
        let out = extract_attribution(&extra);
        for (key, value) in &out {
            prop_assert!(ATTRIBUTION_FIELDS.iter().any(|f| f.key == key.as_str()));
            prop_assert!(!value.trim().is_empty());
            prop_assert!(value.chars().count() <= URL_VALUE_MAX);
        }
    }

    #[test]
    fn extraction_respects_per_field_caps(value in "\\PC{0,3000}") {
        let extra: HashMap<String, serde_json::Value> =
            [("gclid".to_string(), json!(value))].into();
        let out = extract_attribution(&extra);
        if let Some(v) = out.get("gclid") {
            let gclid_cap = ATTRIBUTION_FIELDS
                .iter()
                .find(|f| f.key == "gclid")
                .unwrap()
                .max_len;
            prop_assert!(v.chars().count() <= gclid_cap);
        }
    }
}
