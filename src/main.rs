mod attribution;
mod config;
mod db;
mod errors;
mod ghl_client;
mod ghl_diagnostics;
mod ghl_sync;
mod handlers;
mod lead_store;
mod models;
mod validation;
mod webhook_forwarder;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Main entry point for the lead intake service.
///
/// Initializes tracing, configuration, and the database pool, then serves
/// the submission and diagnostics endpoints.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fastoffer_lead_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; missing database secrets abort here.
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");
    config.log_status();

    // Initialize database connection pool
    let db = Database::new(&config.database).await?;
    tracing::info!("Database connection pool established");

    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
    });

    // Rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    let protected_routes = Router::new()
        .route("/submit-lead", post(handlers::submit_lead))
        .route("/ghl-diagnose", post(ghl_diagnostics::ghl_diagnose))
        .layer(
            ServiceBuilder::new()
                // Form submissions are small; cap bodies well below that
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port = config.port;
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
