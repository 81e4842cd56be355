use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::lead_store::LeadStore;
use crate::models::ValidatedLead;

/// Build the normalized lead envelope sent to the automation webhook.
///
/// The attribution block is present only when at least one attribution key
/// was captured.
pub fn build_lead_payload(lead_id: Uuid, created_at: DateTime<Utc>, lead: &ValidatedLead) -> Value {
    let mut payload = json!({
        "lead_id": lead_id,
        "timestamp": created_at.to_rfc3339(),
        "property": {
            "address": lead.address,
            "condition": lead.condition.map(|c| c.as_str()),
            "timeline": lead.timeline.map(|t| t.as_str()),
            "asking_price": lead.asking_price,
            "is_listed": lead.is_listed.map(|l| l.is_listed()).unwrap_or(false),
        },
        "contact": {
            "first_name": lead.first_name,
            "last_name": lead.last_name,
            "full_name": lead.full_name(),
            "email": lead.email,
            "phone": lead.phone,
            "sms_consent": lead.sms_consent,
        },
        "source": "website_form",
    });
    if !lead.attribution.is_empty() {
        payload["attribution"] = json!(lead.attribution);
    }
    payload
}

/// POST the payload to the webhook. Exactly one attempt; returns the
/// response status and a body excerpt for logging.
pub async fn deliver(
    client: &reqwest::Client,
    url: &str,
    payload: &Value,
) -> Result<(u16, String), reqwest::Error> {
    let response = client.post(url).json(payload).send().await?;
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Ok((status, body.chars().take(300).collect()))
}

/// Launch the forward as a detached background task.
///
/// On 2xx the lead row is marked `webhook_sent`; any other outcome is
/// logged and left at the default. Never surfaces to the caller.
pub fn spawn_forward(store: LeadStore, url: String, lead_id: Uuid, payload: Value) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        match deliver(&client, &url, &payload).await {
            Ok((status, _)) if (200..300).contains(&status) => {
                tracing::info!("Webhook delivered for lead {}", lead_id);
                if let Err(e) = store.mark_webhook_sent(lead_id).await {
                    tracing::error!("Failed to mark webhook_sent for {}: {}", lead_id, e);
                }
            }
            Ok((status, body)) => {
                tracing::warn!(
                    "Webhook returned {} for lead {}: {}",
                    status,
                    lead_id,
                    body
                );
            }
            Err(e) => {
                tracing::warn!("Webhook delivery failed for lead {}: {}", lead_id, e);
            }
        }
    });
}
