use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::ghl_sync;
use crate::lead_store::LeadStore;
use crate::models::{LeadSubmission, SubmitLeadResponse};
use crate::validation::{is_bot_submission, validate_submission};
use crate::webhook_forwarder::{self, build_lead_payload};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "fastoffer-lead-api",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// POST /submit-lead
///
/// Orchestration order: validate, honeypot short-circuit, persist, launch
/// the webhook and CRM tasks detached, respond. The response never waits on
/// either integration; their outcomes land on the lead row asynchronously.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<LeadSubmission>,
) -> Result<(StatusCode, Json<SubmitLeadResponse>), AppError> {
    tracing::info!("Received lead submission (contact details redacted)");

    let lead = validate_submission(&submission).map_err(AppError::Validation)?;

    // Bots that fill the hidden field get a response indistinguishable from
    // a real success, minus the lead id. Nothing is stored or forwarded.
    if is_bot_submission(&submission) {
        tracing::info!("Honeypot field populated, discarding submission");
        return Ok((StatusCode::OK, Json(SubmitLeadResponse::accepted(None))));
    }

    let store = LeadStore::new(state.db.clone());
    let stored = store.insert_lead(&lead).await?;

    let payload = build_lead_payload(stored.id, stored.created_at, &lead);

    match &state.config.integrations.webhook {
        Some(webhook) => {
            webhook_forwarder::spawn_forward(
                store.clone(),
                webhook.url.clone(),
                stored.id,
                payload,
            );
        }
        None => tracing::debug!("Webhook URL not configured, skipping"),
    }

    ghl_sync::spawn_sync(
        store,
        state.config.integrations.ghl.clone(),
        stored.id,
        lead,
    );

    Ok((
        StatusCode::OK,
        Json(SubmitLeadResponse::accepted(Some(stored.id))),
    ))
}
