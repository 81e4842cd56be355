use std::collections::HashMap;

use crate::attribution::{ATTRIBUTION_FIELDS, PROPERTY_FIELDS};
use crate::ghl_client::GHL_DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub port: u16,
    pub integrations: Integrations,
    pub analytics: Option<AnalyticsConfig>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Privileged credential injected as the pool password.
    pub service_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct Integrations {
    pub webhook: Option<WebhookConfig>,
    pub ghl: Option<GhlConfig>,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct GhlConfig {
    pub api_key: String,
    pub location_id: Option<String>,
    pub api_base: String,
    /// Operator override ids keyed by logical field name (e.g. "gclid").
    pub custom_field_ids: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub gtag_id: Option<String>,
    pub conversion_label: Option<String>,
}

impl Config {
    /// Build the configuration from the environment.
    ///
    /// Database credentials are mandatory; every integration block is
    /// optional and present only when its defining secret is non-empty.
    /// Pure function of the environment, safe to call repeatedly.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
            .and_then(|url| {
                if url.trim().is_empty() {
                    anyhow::bail!("DATABASE_URL cannot be empty");
                }
                if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                    anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                }
                Ok(url)
            })?;

        let service_key = std::env::var("DATABASE_SERVICE_KEY")
            .map_err(|_| anyhow::anyhow!("DATABASE_SERVICE_KEY environment variable required"))
            .and_then(|key| {
                if key.trim().is_empty() {
                    anyhow::bail!("DATABASE_SERVICE_KEY cannot be empty");
                }
                Ok(key)
            })?;

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?;

        let mut integrations = Integrations::default();

        if let Some(url) = non_empty_env("WEBHOOK_URL") {
            match url::Url::parse(&url) {
                Ok(_) => integrations.webhook = Some(WebhookConfig { url }),
                Err(e) => {
                    tracing::warn!("WEBHOOK_URL is not a valid URL, webhook disabled: {}", e);
                }
            }
        }

        if let Some(api_key) = non_empty_env("GHL_API_KEY") {
            let mut custom_field_ids = HashMap::new();
            for field in PROPERTY_FIELDS.iter().chain(ATTRIBUTION_FIELDS.iter()) {
                if let Some(id) = non_empty_env(&field.override_env()) {
                    custom_field_ids.insert(field.key.to_string(), id);
                }
            }
            integrations.ghl = Some(GhlConfig {
                api_key,
                location_id: non_empty_env("GHL_LOCATION_ID"),
                api_base: non_empty_env("GHL_BASE_URL")
                    .unwrap_or_else(|| GHL_DEFAULT_BASE_URL.to_string()),
                custom_field_ids,
            });
        }

        let gtag_id = non_empty_env("GTAG_ID");
        let conversion_label = non_empty_env("CONVERSION_LABEL");
        let analytics = if gtag_id.is_some() || conversion_label.is_some() {
            Some(AnalyticsConfig {
                gtag_id,
                conversion_label,
            })
        } else {
            None
        };

        Ok(Self {
            database: DatabaseConfig {
                url: database_url,
                service_key,
            },
            port,
            integrations,
            analytics,
        })
    }

    /// Log which blocks are configured, without secret values.
    pub fn log_status(&self) {
        let ghl_overrides = self
            .integrations
            .ghl
            .as_ref()
            .map(|g| g.custom_field_ids.len())
            .unwrap_or(0);
        tracing::info!(
            webhook = self.integrations.webhook.is_some(),
            ghl = self.integrations.ghl.is_some(),
            ghl_location_id = self
                .integrations
                .ghl
                .as_ref()
                .is_some_and(|g| g.location_id.is_some()),
            ghl_custom_field_overrides = ghl_overrides,
            analytics_gtag = self
                .analytics
                .as_ref()
                .is_some_and(|a| a.gtag_id.is_some()),
            analytics_conversion_label = self
                .analytics
                .as_ref()
                .is_some_and(|a| a.conversion_label.is_some()),
            port = self.port,
            "Configuration status"
        );
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
