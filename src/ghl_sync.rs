use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::attribution::{normalize_match, FieldSpec, ATTRIBUTION_FIELDS, PROPERTY_FIELDS};
use crate::config::GhlConfig;
use crate::ghl_client::{ApiResponse, GhlClient, PIT_PREFIX};
use crate::lead_store::LeadStore;
use crate::models::{CustomFieldDescriptor, ValidatedLead};

/// Tags attached to every upserted contact.
const CONTACT_TAGS: [&str; 2] = ["website-lead", "cash-buyer"];

/// Source marker sent with every contact.
const CONTACT_SOURCE: &str = "website_form";

/// Terminal result of one sync attempt. Every path through the sync ends in
/// exactly one of these; the outcome is recorded on the lead row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Success { contact_id: String, message: String },
    Failure { message: String },
}

/// One resolved custom field value in the upsert payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CustomFieldValue {
    pub id: String,
    pub value: String,
}

/// Custom field values plus the notes fallback for unmatched attribution.
#[derive(Debug, Clone, Default)]
pub struct ContactFieldMapping {
    pub custom_fields: Vec<CustomFieldValue>,
    pub notes: Option<String>,
}

/// Resolves logical fields to remote custom field ids.
///
/// Lookup precedence per logical field: machine-key synonyms against the
/// discovered catalog, then display-name synonyms, then the operator
/// override id. Overrides also register their field's synonyms so later
/// key/name lookups reuse them.
pub struct FieldResolver {
    by_key: HashMap<String, String>,
    by_name: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl FieldResolver {
    pub fn new(descriptors: &[CustomFieldDescriptor], overrides: &HashMap<String, String>) -> Self {
        let mut by_key = HashMap::new();
        let mut by_name = HashMap::new();

        for descriptor in descriptors {
            if let Some(field_key) = &descriptor.field_key {
                // Machine keys arrive as "contact.asking_price"; the model
                // prefix is not part of the logical name.
                let stripped = field_key.strip_prefix("contact.").unwrap_or(field_key);
                let normalized = normalize_match(stripped);
                if !normalized.is_empty() {
                    by_key.entry(normalized).or_insert_with(|| descriptor.id.clone());
                }
            }
            let normalized_name = normalize_match(&descriptor.name);
            if !normalized_name.is_empty() {
                by_name
                    .entry(normalized_name)
                    .or_insert_with(|| descriptor.id.clone());
            }
        }

        // Catalog entries win: overrides only fill gaps in the synonym maps.
        for (logical, id) in overrides {
            let spec = PROPERTY_FIELDS
                .iter()
                .chain(ATTRIBUTION_FIELDS.iter())
                .find(|f| f.key == logical.as_str());
            if let Some(spec) = spec {
                for key in spec.key_synonyms {
                    by_key
                        .entry(normalize_match(key))
                        .or_insert_with(|| id.clone());
                }
                for name in spec.name_synonyms {
                    by_name
                        .entry(normalize_match(name))
                        .or_insert_with(|| id.clone());
                }
            }
        }

        Self {
            by_key,
            by_name,
            overrides: overrides.clone(),
        }
    }

    pub fn resolve(&self, spec: &FieldSpec) -> Option<&str> {
        spec.key_synonyms
            .iter()
            .find_map(|k| self.by_key.get(&normalize_match(k)))
            .or_else(|| {
                spec.name_synonyms
                    .iter()
                    .find_map(|n| self.by_name.get(&normalize_match(n)))
            })
            .or_else(|| self.overrides.get(spec.key))
            .map(String::as_str)
    }
}

/// Best-effort E.164 normalization for US numbers. Not a validation gate;
/// values that do not fit the 10/11 digit patterns pass through untouched.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("+1{}", digits)
    } else if digits.len() == 11 && digits.starts_with('1') {
        format!("+{}", digits)
    } else {
        trimmed.to_string()
    }
}

/// Check the configuration gate before any network call.
///
/// Returns the location id on success, or the configuration error message
/// to record on the lead row.
pub fn check_preconditions(config: &GhlConfig) -> Result<&str, String> {
    if !config.api_key.starts_with(PIT_PREFIX) {
        return Err(format!(
            "Unsupported GHL token type. Provide a private integration token (starts with \"{}\")",
            PIT_PREFIX
        ));
    }
    let location_id = match config.location_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return Err("Missing GHL_LOCATION_ID for PIT token".to_string()),
    };
    if location_id.starts_with(PIT_PREFIX) {
        return Err(
            "GHL_LOCATION_ID appears to be a PIT token instead of a Sub-Account ID".to_string(),
        );
    }
    Ok(location_id)
}

/// Map lead values onto remote custom field ids.
///
/// Property values with no resolved id are dropped. Attribution values with
/// no resolved id fall back to freeform `key: value` lines collected into
/// the contact notes, so attribution is never silently lost. Blank values
/// are skipped entirely.
pub fn map_contact_fields(lead: &ValidatedLead, resolver: &FieldResolver) -> ContactFieldMapping {
    let mut custom_fields = Vec::new();
    let mut notes_lines = Vec::new();

    let property_values: [Option<String>; 4] = [
        lead.asking_price.clone(),
        lead.timeline.map(|t| t.as_str().to_string()),
        lead.is_listed.map(|l| l.as_yes_no().to_string()),
        lead.condition.map(|c| c.as_str().to_string()),
    ];

    for (spec, value) in PROPERTY_FIELDS.iter().zip(property_values) {
        let Some(value) = value else { continue };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if let Some(id) = resolver.resolve(spec) {
            custom_fields.push(CustomFieldValue {
                id: id.to_string(),
                value: value.to_string(),
            });
        }
    }

    for spec in &ATTRIBUTION_FIELDS {
        let Some(value) = lead.attribution.get(spec.key) else {
            continue;
        };
        match resolver.resolve(spec) {
            Some(id) => custom_fields.push(CustomFieldValue {
                id: id.to_string(),
                value: value.clone(),
            }),
            None => notes_lines.push(format!("{}: {}", spec.key, value)),
        }
    }

    let notes = if notes_lines.is_empty() {
        None
    } else {
        Some(notes_lines.join("\n"))
    };

    ContactFieldMapping {
        custom_fields,
        notes,
    }
}

/// Assemble the contact upsert payload.
pub fn build_upsert_payload(
    lead: &ValidatedLead,
    location_id: &str,
    mapping: &ContactFieldMapping,
) -> Value {
    let mut payload = json!({
        "locationId": location_id,
        "firstName": lead.first_name,
        "lastName": lead.last_name,
        "email": lead.email,
        "phone": normalize_phone(&lead.phone),
        "address1": lead.address,
        "tags": CONTACT_TAGS,
        "source": CONTACT_SOURCE,
        "customFields": mapping.custom_fields,
    });
    if let Some(notes) = &mapping.notes {
        payload["notes"] = json!(notes);
    }
    payload
}

/// Pull the remote contact id out of an upsert response body, tolerating
/// non-JSON or differently shaped bodies.
pub fn parse_contact_id(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return "unknown".to_string();
    };
    value
        .get("contact")
        .and_then(|c| c.get("id"))
        .or_else(|| value.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

/// Classify the upsert response into a terminal outcome with an
/// operator-readable diagnostic.
pub fn classify_response(response: &ApiResponse) -> SyncOutcome {
    if response.is_success() {
        let contact_id = parse_contact_id(&response.body);
        let message = format!(
            "Success - Contact ID: {} - {}",
            contact_id,
            response.body_prefix(300)
        );
        return SyncOutcome::Success {
            contact_id,
            message,
        };
    }

    let body = response.body_prefix(1000);
    let message = match response.status {
        401 => format!(
            "Unauthorized (401): verify the API key (pit-...) and its contacts.write scope - Body: {}",
            body
        ),
        403 => format!(
            "Forbidden (403): the token lacks access to this location or field - Body: {}",
            body
        ),
        422 => format!(
            "Unprocessable (422): payload or custom field type mismatch - Body: {}",
            body
        ),
        status => format!("API Error - Status: {}, Body: {}", status, body),
    };
    SyncOutcome::Failure { message }
}

/// Run one sync attempt against the CRM.
///
/// Strictly sequential: precondition gate, best-effort schema discovery,
/// field resolution, upsert, classification. Exactly one upsert attempt;
/// every path returns a terminal outcome.
pub async fn run_sync(client: &GhlClient, config: &GhlConfig, lead: &ValidatedLead) -> SyncOutcome {
    let location_id = match check_preconditions(config) {
        Ok(id) => id,
        Err(message) => {
            return SyncOutcome::Failure {
                message: format!("Configuration Error: {}", message),
            }
        }
    };

    // Discovery is best-effort: an unreachable or unauthorized catalog read
    // degrades to override-only resolution instead of aborting the sync.
    let descriptors = match client.fetch_custom_fields(location_id).await {
        Ok(descriptors) => descriptors,
        Err(e) => {
            tracing::warn!("GHL custom field discovery failed, continuing without: {}", e);
            Vec::new()
        }
    };

    let resolver = FieldResolver::new(&descriptors, &config.custom_field_ids);
    let mapping = map_contact_fields(lead, &resolver);
    let payload = build_upsert_payload(lead, location_id, &mapping);

    tracing::debug!(
        custom_fields = mapping.custom_fields.len(),
        notes = mapping.notes.is_some(),
        "Sending GHL contact upsert"
    );

    match client.upsert_contact(&payload).await {
        Ok(response) => classify_response(&response),
        Err(e) => SyncOutcome::Failure {
            message: format!("Exception: {}", e),
        },
    }
}

/// Launch the sync as a detached background task and record its outcome on
/// the lead row. Never fails the caller; a missing integration config is
/// itself recorded as a configuration error.
pub fn spawn_sync(
    store: LeadStore,
    config: Option<GhlConfig>,
    lead_id: Uuid,
    lead: ValidatedLead,
) {
    tokio::spawn(async move {
        let outcome = match &config {
            None => SyncOutcome::Failure {
                message: "Configuration Error: Missing GHL_API_KEY".to_string(),
            },
            Some(config) => match GhlClient::new(config.api_base.clone(), config.api_key.clone()) {
                Ok(client) => run_sync(&client, config, &lead).await,
                Err(e) => SyncOutcome::Failure {
                    message: format!("Exception: {}", e),
                },
            },
        };

        match outcome {
            SyncOutcome::Success {
                contact_id,
                message,
            } => {
                tracing::info!("GHL sync succeeded for lead {}: contact {}", lead_id, contact_id);
                if let Err(e) = store.record_ghl_success(lead_id, &message).await {
                    tracing::error!("Failed to record GHL success for {}: {}", lead_id, e);
                }
            }
            SyncOutcome::Failure { message } => {
                tracing::warn!("GHL sync failed for lead {}: {}", lead_id, message);
                if let Err(e) = store.record_ghl_error(lead_id, &message).await {
                    tracing::error!("Failed to record GHL error for {}: {}", lead_id, e);
                }
            }
        }
    });
}
