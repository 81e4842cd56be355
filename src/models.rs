use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Whether the property is currently listed with an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListedStatus {
    Yes,
    No,
}

impl ListedStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    /// Rendering used for the CRM custom field value.
    pub fn as_yes_no(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    pub fn is_listed(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Self-reported condition of the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyCondition {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl PropertyCondition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "poor" => Some(Self::Poor),
            "fair" => Some(Self::Fair),
            "good" => Some(Self::Good),
            "excellent" => Some(Self::Excellent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

/// How soon the seller wants to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleTimeline {
    #[serde(rename = "asap")]
    Asap,
    #[serde(rename = "30days")]
    ThirtyDays,
    #[serde(rename = "60days")]
    SixtyDays,
    #[serde(rename = "90days")]
    NinetyDays,
    #[serde(rename = "90plus")]
    NinetyPlus,
}

impl SaleTimeline {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asap" => Some(Self::Asap),
            "30days" => Some(Self::ThirtyDays),
            "60days" => Some(Self::SixtyDays),
            "90days" => Some(Self::NinetyDays),
            "90plus" => Some(Self::NinetyPlus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asap => "asap",
            Self::ThirtyDays => "30days",
            Self::SixtyDays => "60days",
            Self::NinetyDays => "90days",
            Self::NinetyPlus => "90plus",
        }
    }
}

/// Raw lead submission as posted by the website form.
///
/// Every field is optional at this layer; `validation::validate_submission`
/// enforces the actual contract. Unknown keys (including the attribution
/// parameters) are collected in `extra` rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadSubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_listed: Option<String>,
    pub condition: Option<String>,
    pub timeline: Option<String>,
    pub asking_price: Option<String>,
    pub sms_consent: Option<bool>,
    /// Honeypot field. Hidden from humans; bots fill it in.
    pub website: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A lead that passed validation. Strings are trimmed and length-bounded,
/// enums are typed, attribution is the sparse snake_case mapping.
#[derive(Debug, Clone)]
pub struct ValidatedLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub is_listed: Option<ListedStatus>,
    pub condition: Option<PropertyCondition>,
    pub timeline: Option<SaleTimeline>,
    pub asking_price: Option<String>,
    pub sms_consent: bool,
    pub attribution: BTreeMap<String, String>,
}

impl ValidatedLead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Row shape of the `leads` table.
///
/// The core columns are written once at insert time. The delivery status
/// columns (`webhook_*`, `ghl_*`) are mutated later by the integration
/// tasks, each confined to its own columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredLead {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub is_listed: Option<String>,
    pub condition: Option<String>,
    pub timeline: Option<String>,
    pub asking_price: Option<String>,
    pub sms_consent: bool,
    pub attribution: Option<Value>,
    pub webhook_sent: bool,
    pub webhook_sent_at: Option<DateTime<Utc>>,
    pub ghl_sent: bool,
    pub ghl_sent_at: Option<DateTime<Utc>>,
    pub ghl_response: Option<String>,
    pub ghl_error: Option<String>,
}

/// One failed validation rule, reported back to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Body of the `POST /submit-lead` success response.
#[derive(Debug, Serialize)]
pub struct SubmitLeadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
}

impl SubmitLeadResponse {
    pub fn accepted(lead_id: Option<Uuid>) -> Self {
        Self {
            success: true,
            message: "Lead submitted successfully".to_string(),
            lead_id,
        }
    }
}

/// A custom field definition fetched from the CRM at sync time.
/// Never persisted; rediscovered on every sync.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "fieldKey", default)]
    pub field_key: Option<String>,
}

/// Envelope of the custom field discovery endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CustomFieldList {
    #[serde(rename = "customFields", default)]
    pub custom_fields: Vec<CustomFieldDescriptor>,
}
