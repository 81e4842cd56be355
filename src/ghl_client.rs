use serde_json::Value;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::{CustomFieldDescriptor, CustomFieldList};

/// Production base URL of the GoHighLevel (LeadConnector) API.
pub const GHL_DEFAULT_BASE_URL: &str = "https://services.leadconnectorhq.com";

/// Fixed API version header required by the contacts API.
const GHL_API_VERSION: &str = "2021-07-28";

/// Prefix that identifies a private integration token.
pub const PIT_PREFIX: &str = "pit-";

/// A raw API response, kept as status + body so callers can classify
/// outcomes and embed diagnostics without re-fetching.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First `max` characters of the body, for logs and stored diagnostics.
    pub fn body_prefix(&self, max: usize) -> String {
        self.body.chars().take(max).collect()
    }
}

/// Client for the GoHighLevel contacts API.
///
/// Bearer authentication with a private integration token; the base URL is
/// injected so tests can point it at a mock server.
#[derive(Clone)]
pub struct GhlClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GhlClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create GHL client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Version", GHL_API_VERSION)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
    }

    /// Fetch the tenant's contact custom field definitions.
    pub async fn fetch_custom_fields(
        &self,
        location_id: &str,
    ) -> Result<Vec<CustomFieldDescriptor>, AppError> {
        let url = format!(
            "{}/locations/{}/customFields?model=contact",
            self.base_url, location_id
        );
        tracing::debug!("Fetching GHL custom fields for location {}", location_id);

        let response = self
            .headers(self.client.get(&url))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("GHL request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "GHL custom field discovery returned {}: {}",
                status,
                truncate(&body, 300)
            )));
        }

        let list: CustomFieldList = serde_json::from_str(&body).map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse GHL custom fields: {}", e))
        })?;

        tracing::debug!("Discovered {} GHL custom fields", list.custom_fields.len());
        Ok(list.custom_fields)
    }

    /// POST the assembled contact payload to the upsert endpoint.
    ///
    /// Non-2xx statuses are returned as data, not errors; only transport
    /// failures produce `Err`.
    pub async fn upsert_contact(&self, payload: &Value) -> Result<ApiResponse, AppError> {
        let url = format!("{}/contacts/upsert", self.base_url);

        let response = self
            .headers(self.client.post(&url))
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("GHL upsert failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ApiResponse { status, body })
    }

    /// Read-only GET probe used by the diagnostics endpoint.
    pub async fn probe(
        &self,
        path: &str,
        location_id: Option<&str>,
    ) -> Result<ApiResponse, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.headers(self.client.get(&url));
        if let Some(location) = location_id {
            request = request.header("Location-Id", location);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("GHL probe failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ApiResponse { status, body })
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
