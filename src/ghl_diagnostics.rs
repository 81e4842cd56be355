use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::ghl_client::{ApiResponse, GhlClient, PIT_PREFIX};
use crate::handlers::AppState;

/// Result of one read-only probe against the CRM API.
#[derive(Debug, Serialize)]
pub struct ProbeResult {
    pub url: String,
    pub status: Option<u16>,
    pub ok: bool,
    pub body: Value,
}

#[derive(Debug, Serialize)]
pub struct DiagnoseTests {
    pub contacts_no_v1: ProbeResult,
    pub contacts_v1: ProbeResult,
    pub locations_list: ProbeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_details: Option<ProbeResult>,
    pub users_me: ProbeResult,
}

/// Structured diagnosis returned to the operator.
#[derive(Debug, Serialize)]
pub struct DiagnoseResponse {
    pub ok: bool,
    pub diagnosis: String,
    pub recommended_endpoint: String,
    pub api_key_present: bool,
    pub api_key_prefix: String,
    pub api_key_length: usize,
    pub location_id_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id_first8: Option<String>,
    pub location_id_looks_like_pit: bool,
    pub tests: DiagnoseTests,
}

/// POST /ghl-diagnose
///
/// Operator tool, separate from the lead pipeline. Runs a battery of
/// read-only probes with the configured credentials and reports the most
/// likely misconfiguration. Secrets are summarized (prefix and length),
/// never echoed in full.
pub async fn ghl_diagnose(State(state): State<Arc<AppState>>) -> Response {
    let Some(ghl) = &state.config.integrations.ghl else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error": "Missing GHL_API_KEY secret",
                "hint": "Set the GHL_API_KEY deployment secret",
            })),
        )
            .into_response();
    };

    let client = match GhlClient::new(ghl.api_base.clone(), ghl.api_key.clone()) {
        Ok(client) => client,
        Err(e) => return e.into_response(),
    };

    let location_id = ghl.location_id.as_deref();
    tracing::info!(
        api_key_prefix = %prefix(&ghl.api_key, 4),
        location_id_present = location_id.is_some(),
        "Running GHL diagnostics"
    );

    let contacts_no_v1 = run_probe(&client, &ghl.api_base, "/contacts/?limit=1", location_id).await;
    let contacts_v1 = run_probe(&client, &ghl.api_base, "/v1/contacts/?limit=1", location_id).await;
    // Location listing is account-scoped; the Location-Id header is omitted.
    let locations_list = run_probe(&client, &ghl.api_base, "/locations/", None).await;
    let location_details = match location_id {
        Some(id) => Some(run_probe(&client, &ghl.api_base, &format!("/locations/{}", id), None).await),
        None => None,
    };
    let users_me = run_probe(&client, &ghl.api_base, "/users/me", None).await;

    let location_looks_like_pit = location_id.is_some_and(|l| l.starts_with(PIT_PREFIX));

    let diagnosis = diagnose(
        location_id,
        location_looks_like_pit,
        &contacts_no_v1,
        &contacts_v1,
        &locations_list,
    );

    let response = DiagnoseResponse {
        ok: contacts_no_v1.ok || contacts_v1.ok,
        diagnosis,
        recommended_endpoint: format!("{}/contacts", ghl.api_base),
        api_key_present: true,
        api_key_prefix: prefix(&ghl.api_key, 3),
        api_key_length: ghl.api_key.chars().count(),
        location_id_present: location_id.is_some(),
        location_id_first8: location_id.map(|l| prefix(l, 8)),
        location_id_looks_like_pit: location_looks_like_pit,
        tests: DiagnoseTests {
            contacts_no_v1,
            contacts_v1,
            locations_list,
            location_details,
            users_me,
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

async fn run_probe(
    client: &GhlClient,
    base: &str,
    path: &str,
    location_id: Option<&str>,
) -> ProbeResult {
    let url = format!("{}{}", base, path);
    match client.probe(path, location_id).await {
        Ok(response) => ProbeResult {
            url,
            status: Some(response.status),
            ok: response.is_success(),
            body: probe_body(&response),
        },
        Err(e) => ProbeResult {
            url,
            status: None,
            ok: false,
            body: Value::String(e.to_string()),
        },
    }
}

/// JSON body when parseable, else a truncated text excerpt.
fn probe_body(response: &ApiResponse) -> Value {
    serde_json::from_str(&response.body)
        .unwrap_or_else(|_| Value::String(response.body_prefix(300)))
}

fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn diagnose(
    location_id: Option<&str>,
    location_looks_like_pit: bool,
    contacts_no_v1: &ProbeResult,
    contacts_v1: &ProbeResult,
    locations_list: &ProbeResult,
) -> String {
    let status_is = |probe: &ProbeResult, code: u16| probe.status == Some(code);

    if location_looks_like_pit {
        return "CRITICAL: Location ID appears to be a PIT token, not a Location ID. \
                Set GHL_LOCATION_ID to the actual Sub-Account (Location) ID."
            .to_string();
    }
    if contacts_no_v1.ok {
        return "Contacts endpoint works without /v1".to_string();
    }
    if contacts_v1.ok {
        return "Contacts endpoint only works with /v1. For PIT tokens prefer /contacts; \
                verify the token type and scopes."
            .to_string();
    }
    if status_is(contacts_no_v1, 401) || status_is(contacts_v1, 401) {
        return "Unauthorized. Verify the API key (pit-...) and required scopes (contacts.write)."
            .to_string();
    }
    if (status_is(contacts_no_v1, 403) || status_is(contacts_v1, 403)) && location_id.is_none() {
        return "Forbidden. Missing Location-Id. Set the GHL_LOCATION_ID secret to the \
                Sub-Account (Location) ID."
            .to_string();
    }
    if status_is(contacts_no_v1, 403) || status_is(contacts_v1, 403) {
        if locations_list.ok {
            return "Token works for /locations but gets 403 for /contacts with Location-Id. \
                    Verify the Location ID, the contacts.write scope, and that the PIT has \
                    access to this location."
                .to_string();
        }
        return "Forbidden for both /contacts and /locations. Verify API key validity and \
                scopes (contacts.write, locations.read)."
            .to_string();
    }
    if status_is(contacts_no_v1, 404) && status_is(contacts_v1, 404) {
        return "Both /contacts and /v1/contacts return 404. Likely incorrect base path or \
                missing headers (Version, Location-Id)."
            .to_string();
    }
    "Contacts endpoint failed. Check API key, Location-Id, and headers.".to_string()
}
