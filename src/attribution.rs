use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Length cap for short attribution identifiers (click ids, UTM values).
pub const SHORT_VALUE_MAX: usize = 255;
/// Length cap for URL-shaped attribution values (landing page, referrer).
pub const URL_VALUE_MAX: usize = 2048;

/// One logical field that can be mapped onto a CRM custom field.
///
/// `key` is the canonical snake_case name used in the stored attribution
/// blob, the webhook payload, the notes fallback, and the
/// `GHL_CUSTOM_FIELD_<KEY>_ID` override env name. `wire_key` is the
/// camelCase spelling the form posts.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub wire_key: &'static str,
    pub max_len: usize,
    pub key_synonyms: &'static [&'static str],
    pub name_synonyms: &'static [&'static str],
}

impl FieldSpec {
    /// Env var carrying the operator override id for this field.
    pub fn override_env(&self) -> String {
        format!("GHL_CUSTOM_FIELD_{}_ID", self.key.to_uppercase())
    }
}

/// Marketing attribution fields captured at form-fill time.
///
/// This table is the single source of truth for the attribution field set.
/// Extraction, config override loading, and CRM field resolution all walk it.
pub const ATTRIBUTION_FIELDS: [FieldSpec; 17] = [
    FieldSpec {
        key: "gclid",
        wire_key: "gclid",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["gclid"],
        name_synonyms: &["GCLID", "Google Click ID"],
    },
    FieldSpec {
        key: "wbraid",
        wire_key: "wbraid",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["wbraid"],
        name_synonyms: &["WBRAID"],
    },
    FieldSpec {
        key: "gbraid",
        wire_key: "gbraid",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["gbraid"],
        name_synonyms: &["GBRAID"],
    },
    FieldSpec {
        key: "utm_source",
        wire_key: "utmSource",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_source", "utmSource"],
        name_synonyms: &["UTM Source"],
    },
    FieldSpec {
        key: "utm_medium",
        wire_key: "utmMedium",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_medium", "utmMedium"],
        name_synonyms: &["UTM Medium"],
    },
    FieldSpec {
        key: "utm_campaign",
        wire_key: "utmCampaign",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_campaign", "utmCampaign"],
        name_synonyms: &["UTM Campaign"],
    },
    FieldSpec {
        key: "utm_campaign_id",
        wire_key: "utmCampaignId",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_campaign_id", "utmCampaignId"],
        name_synonyms: &["UTM Campaign ID"],
    },
    FieldSpec {
        key: "utm_adgroup_id",
        wire_key: "utmAdgroupId",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_adgroup_id", "utmAdgroupId"],
        name_synonyms: &["UTM Adgroup ID", "UTM Ad Group ID"],
    },
    FieldSpec {
        key: "utm_term",
        wire_key: "utmTerm",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_term", "utmTerm"],
        name_synonyms: &["UTM Term"],
    },
    FieldSpec {
        key: "utm_device",
        wire_key: "utmDevice",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_device", "utmDevice"],
        name_synonyms: &["UTM Device"],
    },
    FieldSpec {
        key: "utm_creative",
        wire_key: "utmCreative",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_creative", "utmCreative"],
        name_synonyms: &["UTM Creative"],
    },
    FieldSpec {
        key: "utm_network",
        wire_key: "utmNetwork",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_network", "utmNetwork"],
        name_synonyms: &["UTM Network"],
    },
    FieldSpec {
        key: "utm_asset_group",
        wire_key: "utmAssetGroup",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_asset_group", "utmAssetGroup"],
        name_synonyms: &["UTM Asset Group"],
    },
    FieldSpec {
        key: "utm_headline",
        wire_key: "utmHeadline",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["utm_headline", "utmHeadline"],
        name_synonyms: &["UTM Headline"],
    },
    FieldSpec {
        key: "landing_page",
        wire_key: "landingPage",
        max_len: URL_VALUE_MAX,
        key_synonyms: &["landing_page", "landingPage"],
        name_synonyms: &["Landing Page", "Landing Page URL"],
    },
    FieldSpec {
        key: "referrer",
        wire_key: "referrer",
        max_len: URL_VALUE_MAX,
        key_synonyms: &["referrer"],
        name_synonyms: &["Referrer", "Referrer URL"],
    },
    FieldSpec {
        key: "session_id",
        wire_key: "sessionId",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["session_id", "sessionId"],
        name_synonyms: &["Session ID"],
    },
];

/// Property attributes that are mapped onto CRM custom fields.
/// Order matters: asking price, timeline, listed flag, condition.
pub const PROPERTY_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        key: "asking_price",
        wire_key: "askingPrice",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["asking_price", "askingPrice"],
        name_synonyms: &["Asking Price"],
    },
    FieldSpec {
        key: "timeline",
        wire_key: "timeline",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["timeline", "sale_timeline"],
        name_synonyms: &["Timeline", "Timeline to Sell"],
    },
    FieldSpec {
        key: "property_listed",
        wire_key: "isListed",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["property_listed", "propertyListed", "is_listed"],
        name_synonyms: &["Property Listed", "Is Listed"],
    },
    FieldSpec {
        key: "condition",
        wire_key: "condition",
        max_len: SHORT_VALUE_MAX,
        key_synonyms: &["condition", "property_condition"],
        name_synonyms: &["Condition", "Property Condition"],
    },
];

/// Normalize an identifier for matching: lowercase, ASCII alphanumerics only.
/// Makes snake_case and camelCase spellings of the same name compare equal.
pub fn normalize_match(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Truncate to a maximum number of characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Extract the sparse attribution mapping from the unvalidated extra fields
/// of a submission. Only keys with non-empty trimmed values are kept; both
/// camelCase and snake_case spellings are accepted on the wire.
pub fn extract_attribution(extra: &HashMap<String, Value>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for field in &ATTRIBUTION_FIELDS {
        let raw = extra
            .get(field.wire_key)
            .or_else(|| extra.get(field.key))
            .and_then(Value::as_str);
        if let Some(value) = raw {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                out.insert(field.key.to_string(), truncate_chars(trimmed, field.max_len));
            }
        }
    }
    out
}
