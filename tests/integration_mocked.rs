/// Integration tests with a mocked GoHighLevel API and webhook receiver.
/// Exercises the sync state machine end to end without hitting real
/// external services or a database.
use std::collections::{BTreeMap, HashMap};

use fastoffer_lead_api::config::GhlConfig;
use fastoffer_lead_api::ghl_client::GhlClient;
use fastoffer_lead_api::ghl_sync::{run_sync, SyncOutcome};
use fastoffer_lead_api::models::{ListedStatus, PropertyCondition, SaleTimeline, ValidatedLead};
use fastoffer_lead_api::webhook_forwarder::{build_lead_payload, deliver};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_lead() -> ValidatedLead {
    ValidatedLead {
        first_name: "John".to_string(),
        last_name: "Smith".to_string(),
        email: "john@example.com".to_string(),
        phone: "5551234567".to_string(),
        address: "123 Main St, City, ST 00000".to_string(),
        is_listed: Some(ListedStatus::No),
        condition: Some(PropertyCondition::Good),
        timeline: Some(SaleTimeline::ThirtyDays),
        asking_price: Some("$250,000".to_string()),
        sms_consent: true,
        attribution: BTreeMap::new(),
    }
}

fn test_config(base: String) -> GhlConfig {
    GhlConfig {
        api_key: "pit-test-token".to_string(),
        location_id: Some("Loc123".to_string()),
        api_base: base,
        custom_field_ids: HashMap::new(),
    }
}

async fn upsert_request_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let upsert = requests
        .iter()
        .find(|r| r.url.path() == "/contacts/upsert")
        .expect("no upsert request received");
    serde_json::from_slice(&upsert.body).unwrap()
}

#[tokio::test]
async fn custom_field_discovery_parses_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/Loc123/customFields"))
        .and(query_param("model", "contact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customFields": [
                {"id": "f-price", "name": "Asking Price", "fieldKey": "contact.asking_price"},
                {"id": "f-gclid", "name": "GCLID"}
            ]
        })))
        .mount(&server)
        .await;

    let client = GhlClient::new(server.uri(), "pit-test-token").unwrap();
    let fields = client.fetch_custom_fields("Loc123").await.unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].id, "f-price");
    assert_eq!(fields[1].field_key, None);
}

#[tokio::test]
async fn sync_upserts_contact_with_resolved_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/Loc123/customFields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customFields": [
                {"id": "f-price", "name": "Asking Price", "fieldKey": "contact.asking_price"},
                {"id": "f-gclid", "name": "GCLID", "fieldKey": "contact.gclid"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/contacts/upsert"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"contact": {"id": "contact-1"}})),
        )
        .mount(&server)
        .await;

    let client = GhlClient::new(server.uri(), "pit-test-token").unwrap();
    let mut lead = test_lead();
    lead.attribution
        .insert("gclid".to_string(), "click-99".to_string());

    let outcome = run_sync(&client, &test_config(server.uri()), &lead).await;
    match outcome {
        SyncOutcome::Success {
            contact_id,
            message,
        } => {
            assert_eq!(contact_id, "contact-1");
            assert!(message.starts_with("Success - Contact ID: contact-1"));
        }
        SyncOutcome::Failure { message } => panic!("sync failed: {}", message),
    }

    let body = upsert_request_body(&server).await;
    assert_eq!(body["phone"], "+15551234567");
    assert_eq!(body["locationId"], "Loc123");
    assert_eq!(body["firstName"], "John");
    assert_eq!(body["address1"], "123 Main St, City, ST 00000");
    assert_eq!(body["tags"], json!(["website-lead", "cash-buyer"]));

    let custom_fields = body["customFields"].as_array().unwrap();
    assert!(custom_fields
        .iter()
        .any(|f| f["id"] == "f-price" && f["value"] == "$250,000"));
    assert!(custom_fields
        .iter()
        .any(|f| f["id"] == "f-gclid" && f["value"] == "click-99"));
    assert!(body.get("notes").is_none());
}

#[tokio::test]
async fn discovery_failure_degrades_to_notes_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/Loc123/customFields"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/contacts/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "contact-2"})))
        .mount(&server)
        .await;

    let client = GhlClient::new(server.uri(), "pit-test-token").unwrap();
    let mut lead = test_lead();
    lead.attribution
        .insert("utm_source".to_string(), "google".to_string());

    let outcome = run_sync(&client, &test_config(server.uri()), &lead).await;
    assert!(matches!(outcome, SyncOutcome::Success { .. }));

    // No catalog and no overrides: attribution must survive in the notes,
    // and the customFields array must not invent ids.
    let body = upsert_request_body(&server).await;
    assert_eq!(body["customFields"], json!([]));
    assert_eq!(body["notes"], "utm_source: google");
}

#[tokio::test]
async fn operator_override_is_used_without_catalog_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations/Loc123/customFields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customFields": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/contacts/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "contact-3"})))
        .mount(&server)
        .await;

    let client = GhlClient::new(server.uri(), "pit-test-token").unwrap();
    let mut config = test_config(server.uri());
    config
        .custom_field_ids
        .insert("asking_price".to_string(), "override-77".to_string());

    let outcome = run_sync(&client, &config, &test_lead()).await;
    assert!(matches!(outcome, SyncOutcome::Success { .. }));

    let body = upsert_request_body(&server).await;
    let custom_fields = body["customFields"].as_array().unwrap();
    assert!(custom_fields
        .iter()
        .any(|f| f["id"] == "override-77" && f["value"] == "$250,000"));
}

#[tokio::test]
async fn upsert_error_statuses_are_classified() {
    for (status, needle) in [
        (401, "Unauthorized (401)"),
        (403, "Forbidden (403)"),
        (422, "Unprocessable (422)"),
        (503, "API Error - Status: 503"),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/Loc123/customFields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customFields": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/contacts/upsert"))
            .respond_with(ResponseTemplate::new(status).set_body_string("remote detail"))
            .mount(&server)
            .await;

        let client = GhlClient::new(server.uri(), "pit-test-token").unwrap();
        let outcome = run_sync(&client, &test_config(server.uri()), &test_lead()).await;
        match outcome {
            SyncOutcome::Failure { message } => {
                assert!(message.contains(needle), "{}", message);
                assert!(message.contains("remote detail"));
            }
            SyncOutcome::Success { .. } => panic!("expected failure for {}", status),
        }
    }
}

#[tokio::test]
async fn misconfigured_credentials_make_no_network_calls() {
    let server = MockServer::start().await;

    // Token that is not PIT-shaped
    let mut config = test_config(server.uri());
    config.api_key = "raw-legacy-key".to_string();
    let client = GhlClient::new(server.uri(), config.api_key.clone()).unwrap();
    let outcome = run_sync(&client, &config, &test_lead()).await;
    match outcome {
        SyncOutcome::Failure { message } => {
            assert!(message.starts_with("Configuration Error:"), "{}", message)
        }
        SyncOutcome::Success { .. } => panic!("expected configuration failure"),
    }

    // Location id that is actually a PIT token
    let mut config = test_config(server.uri());
    config.location_id = Some("pit-swapped".to_string());
    let client = GhlClient::new(server.uri(), config.api_key.clone()).unwrap();
    let outcome = run_sync(&client, &config, &test_lead()).await;
    assert!(matches!(outcome, SyncOutcome::Failure { .. }));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn webhook_delivery_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/lead"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut lead = test_lead();
    lead.attribution
        .insert("utm_campaign".to_string(), "spring".to_string());
    let payload = build_lead_payload(Uuid::new_v4(), chrono::Utc::now(), &lead);

    let client = reqwest::Client::new();
    let url = format!("{}/hooks/lead", server.uri());
    let (status, _) = deliver(&client, &url, &payload).await.unwrap();
    assert_eq!(status, 200);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["source"], "website_form");
    assert_eq!(body["contact"]["full_name"], "John Smith");
    assert_eq!(body["property"]["is_listed"], false);
    assert_eq!(body["attribution"]["utm_campaign"], "spring");
}

#[tokio::test]
async fn webhook_non_2xx_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/lead"))
        .respond_with(ResponseTemplate::new(410).set_body_string("gone"))
        .mount(&server)
        .await;

    let payload = build_lead_payload(Uuid::new_v4(), chrono::Utc::now(), &test_lead());
    let client = reqwest::Client::new();
    let url = format!("{}/hooks/lead", server.uri());
    let (status, body) = deliver(&client, &url, &payload).await.unwrap();
    assert_eq!(status, 410);
    assert_eq!(body, "gone");
}
