use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{StoredLead, ValidatedLead};

/// Database storage for lead rows.
///
/// Inserts happen once on the synchronous request path. The delivery status
/// writers touch disjoint columns (`webhook_*` vs `ghl_*`) so the two
/// integration tasks can update the same row concurrently without
/// coordination.
#[derive(Clone)]
pub struct LeadStore {
    pool: PgPool,
}

impl LeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a validated lead and return the stored row.
    ///
    /// The attribution blob is SQL NULL when no attribution keys were
    /// captured, never an empty object.
    pub async fn insert_lead(&self, lead: &ValidatedLead) -> Result<StoredLead, AppError> {
        let attribution = if lead.attribution.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&lead.attribution).map_err(|e| {
                AppError::InternalError(format!("Failed to serialize attribution: {}", e))
            })?)
        };

        let stored = sqlx::query_as::<_, StoredLead>(
            r#"
            INSERT INTO leads (
                first_name, last_name, email, phone, address,
                is_listed, condition, timeline, asking_price,
                sms_consent, attribution
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.address)
        .bind(lead.is_listed.map(|v| v.as_str()))
        .bind(lead.condition.map(|v| v.as_str()))
        .bind(lead.timeline.map(|v| v.as_str()))
        .bind(lead.asking_price.as_deref())
        .bind(lead.sms_consent)
        .bind(attribution)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Lead stored with id {}", stored.id);
        Ok(stored)
    }

    /// Record a successful webhook delivery.
    pub async fn mark_webhook_sent(&self, lead_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE leads SET webhook_sent = true, webhook_sent_at = now() WHERE id = $1",
        )
        .bind(lead_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("No lead row found to mark webhook_sent: {}", lead_id);
        }
        Ok(())
    }

    /// Record a successful CRM upsert, with the remote contact id message.
    pub async fn record_ghl_success(&self, lead_id: Uuid, message: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET ghl_sent = true, ghl_sent_at = now(), ghl_response = $2
            WHERE id = $1
            "#,
        )
        .bind(lead_id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("No lead row found to record GHL success: {}", lead_id);
        }
        Ok(())
    }

    /// Record a failed or skipped CRM sync with an operator-readable message.
    pub async fn record_ghl_error(&self, lead_id: Uuid, message: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET ghl_sent = false, ghl_sent_at = now(), ghl_error = $2
            WHERE id = $1
            "#,
        )
        .bind(lead_id)
        .bind(message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("No lead row found to record GHL error: {}", lead_id);
        }
        Ok(())
    }

    /// Fetch a lead row by id.
    #[allow(dead_code)]
    pub async fn get_lead(&self, lead_id: Uuid) -> Result<Option<StoredLead>, AppError> {
        let lead = sqlx::query_as::<_, StoredLead>("SELECT * FROM leads WHERE id = $1")
            .bind(lead_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }
}
