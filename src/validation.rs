use regex::Regex;

use crate::attribution::extract_attribution;
use crate::models::{
    FieldError, LeadSubmission, ListedStatus, PropertyCondition, SaleTimeline, ValidatedLead,
};

pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 255;
pub const PHONE_MIN: usize = 10;
pub const PHONE_MAX: usize = 20;
pub const ADDRESS_MIN: usize = 5;
pub const ADDRESS_MAX: usize = 500;
pub const ASKING_PRICE_MAX: usize = 50;

/// Basic email syntax check.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    // RFC 5322 simplified email regex
    // Matches: local@domain.tld
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    email_regex.is_match(email)
}

/// The `website` field is invisible to humans; any non-blank value means an
/// automated submission.
pub fn is_bot_submission(submission: &LeadSubmission) -> bool {
    submission
        .website
        .as_deref()
        .is_some_and(|w| !w.trim().is_empty())
}

/// Validate and normalize a raw submission into a [`ValidatedLead`].
///
/// All failing fields are reported together; a submission is never partially
/// accepted. Field names in errors use the wire (camelCase) spelling.
pub fn validate_submission(submission: &LeadSubmission) -> Result<ValidatedLead, Vec<FieldError>> {
    let mut errors = Vec::new();

    let first_name = required_text(
        &mut errors,
        "firstName",
        submission.first_name.as_deref(),
        1,
        NAME_MAX,
    );
    let last_name = required_text(
        &mut errors,
        "lastName",
        submission.last_name.as_deref(),
        1,
        NAME_MAX,
    );

    let email = match submission.email.as_deref().map(str::trim) {
        Some(e) if !e.is_empty() => {
            if e.chars().count() > EMAIL_MAX {
                errors.push(FieldError::new(
                    "email",
                    format!("must be at most {} characters", EMAIL_MAX),
                ));
                None
            } else if !is_valid_email(e) {
                errors.push(FieldError::new("email", "must be a valid email address"));
                None
            } else {
                Some(e.to_string())
            }
        }
        _ => {
            errors.push(FieldError::new("email", "is required"));
            None
        }
    };

    let phone = required_text(
        &mut errors,
        "phone",
        submission.phone.as_deref(),
        PHONE_MIN,
        PHONE_MAX,
    );
    let address = required_text(
        &mut errors,
        "address",
        submission.address.as_deref(),
        ADDRESS_MIN,
        ADDRESS_MAX,
    );

    let is_listed = optional_enum(
        &mut errors,
        "isListed",
        submission.is_listed.as_deref(),
        ListedStatus::parse,
        "must be one of: yes, no",
    );
    let condition = optional_enum(
        &mut errors,
        "condition",
        submission.condition.as_deref(),
        PropertyCondition::parse,
        "must be one of: poor, fair, good, excellent",
    );
    let timeline = optional_enum(
        &mut errors,
        "timeline",
        submission.timeline.as_deref(),
        SaleTimeline::parse,
        "must be one of: asap, 30days, 60days, 90days, 90plus",
    );

    let asking_price = match submission.asking_price.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => {
            if p.chars().count() > ASKING_PRICE_MAX {
                errors.push(FieldError::new(
                    "askingPrice",
                    format!("must be at most {} characters", ASKING_PRICE_MAX),
                ));
                None
            } else {
                Some(p.to_string())
            }
        }
        _ => None,
    };

    let attribution = extract_attribution(&submission.extra);

    if !errors.is_empty() {
        return Err(errors);
    }

    // The unwraps cannot fire: a missing value always pushed an error above.
    Ok(ValidatedLead {
        first_name: first_name.unwrap(),
        last_name: last_name.unwrap(),
        email: email.unwrap(),
        phone: phone.unwrap(),
        address: address.unwrap(),
        is_listed,
        condition,
        timeline,
        asking_price,
        sms_consent: submission.sms_consent.unwrap_or(false),
        attribution,
    })
}

/// Require a trimmed, non-empty value within a character-count bound.
fn required_text(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "is required"));
        return None;
    }
    let len = trimmed.chars().count();
    if len < min {
        errors.push(FieldError::new(
            field,
            format!("must be at least {} characters", min),
        ));
        return None;
    }
    if len > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", max),
        ));
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse an optional enum field; blank values count as absent.
fn optional_enum<T>(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    message: &str,
) -> Option<T> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return None;
    }
    match parse(trimmed) {
        Some(v) => Some(v),
        None => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_submission() -> LeadSubmission {
        serde_json::from_value(json!({
            "firstName": "John",
            "lastName": "Smith",
            "email": "john@example.com",
            "phone": "5551234567",
            "address": "123 Main St, City, ST 00000",
            "isListed": "no",
            "condition": "good",
            "timeline": "30days",
            "askingPrice": "$250,000",
            "smsConsent": true
        }))
        .unwrap()
    }

    #[test]
    fn valid_submission_passes() {
        let lead = validate_submission(&valid_submission()).unwrap();
        assert_eq!(lead.full_name(), "John Smith");
        assert_eq!(lead.timeline, Some(SaleTimeline::ThirtyDays));
        assert_eq!(lead.condition, Some(PropertyCondition::Good));
        assert_eq!(lead.is_listed, Some(ListedStatus::No));
        assert!(lead.sms_consent);
        assert!(lead.attribution.is_empty());
    }

    #[test]
    fn all_failing_fields_are_reported() {
        let submission: LeadSubmission = serde_json::from_value(json!({
            "email": "not-an-email",
            "phone": "123"
        }))
        .unwrap();
        let errors = validate_submission(&submission).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"firstName"));
        assert!(fields.contains(&"lastName"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"phone"));
        assert!(fields.contains(&"address"));
    }

    #[test]
    fn bad_enum_values_are_rejected() {
        let mut submission = valid_submission();
        submission.condition = Some("pristine".to_string());
        submission.timeline = Some("someday".to_string());
        let errors = validate_submission(&submission).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["condition", "timeline"]);
    }

    #[test]
    fn blank_optional_fields_count_as_absent() {
        let mut submission = valid_submission();
        submission.condition = Some("  ".to_string());
        submission.asking_price = Some("".to_string());
        let lead = validate_submission(&submission).unwrap();
        assert!(lead.condition.is_none());
        assert!(lead.asking_price.is_none());
    }

    #[test]
    fn honeypot_detection() {
        let mut submission = valid_submission();
        assert!(!is_bot_submission(&submission));
        submission.website = Some("   ".to_string());
        assert!(!is_bot_submission(&submission));
        submission.website = Some("https://spam.example".to_string());
        assert!(is_bot_submission(&submission));
    }

    #[test]
    fn attribution_flows_through_validation() {
        let submission: LeadSubmission = serde_json::from_value(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@example.com",
            "phone": "5559876543",
            "address": "456 Oak Ave, Town, ST 11111",
            "gclid": "click-id-1",
            "utmCampaign": "summer"
        }))
        .unwrap();
        let lead = validate_submission(&submission).unwrap();
        assert_eq!(lead.attribution.len(), 2);
        assert_eq!(lead.attribution["utm_campaign"], "summer");
    }

    #[test]
    fn email_validation_accepts_common_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("user_name@example-domain.com"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email(""));
    }
}
