//! Lead Intake API Library
//!
//! Backend for a cash home-buying website: validates inbound lead
//! submissions, persists them, and forwards each lead best-effort to an
//! automation webhook and the GoHighLevel CRM.
//!
//! # Modules
//!
//! - `attribution`: Marketing attribution field table and extraction.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `ghl_client`: GoHighLevel API client.
//! - `ghl_diagnostics`: Operator-facing CRM diagnostics endpoint.
//! - `ghl_sync`: CRM contact sync (field resolution, upsert, outcome).
//! - `handlers`: HTTP request handlers.
//! - `lead_store`: Lead row storage and status updates.
//! - `models`: Core data models.
//! - `validation`: Lead submission validation and honeypot detection.
//! - `webhook_forwarder`: Automation webhook delivery.

pub mod attribution;
pub mod config;
pub mod db;
pub mod errors;
pub mod ghl_client;
pub mod ghl_diagnostics;
pub mod ghl_sync;
pub mod handlers;
pub mod lead_store;
pub mod models;
pub mod validation;
pub mod webhook_forwarder;
