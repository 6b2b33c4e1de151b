//! Hemmer provider for the StatusCake monitoring API.
//!
//! This crate maps declarative configuration onto the StatusCake REST API
//! and back: uptime, SSL, pagespeed, and heartbeat checks, contact groups,
//! and maintenance windows, plus read-only lookups for contact groups and
//! monitoring locations.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **Schema types**: Attribute/block descriptors with validators and
//!   cross-field constraints ([`schema`], [`validation`])
//! - **Resource definitions**: schema + Create/Read/Update/Delete for each
//!   StatusCake entity ([`resources`], [`data_sources`])
//! - **Diff-aware request building**: update payloads contain only changed
//!   fields ([`state::ResourceData`])
//! - **A shared API client**: rate limited and retrying, built once per
//!   process ([`client::ApiClient`])
//! - **A provider registry**: dispatches host calls by type name
//!   ([`provider::Provider`])
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! The plugin wire protocol is the host's concern; it drives the provider
//! through the [`provider::Provider`] entry points.
//!
//! # Quick Start
//!
//! ```no_run
//! use hemmer_provider_statuscake::Provider;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::new();
//! provider
//!     .configure(json!({"api_token": "abcdefghij0123456789"}))
//!     .map_err(|d| format!("{:?}", d))?;
//!
//! let state = provider
//!     .create(
//!         "statuscake_uptime_check",
//!         json!({
//!             "name": "example",
//!             "check_interval": 300,
//!             "monitored_resource": [{"address": "https://example.com"}],
//!             "http_check": [{}],
//!         }),
//!     )
//!     .await
//!     .map_err(|d| format!("{:?}", d))?;
//!
//! println!("created check {}", state["id"]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod data_sources;
pub mod diag;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod state;
pub mod testing;
pub mod util;
pub mod validation;

// Re-export main types at crate root
pub use client::{ApiClient, ClientOptions};
pub use diag::Diagnostics;
pub use error::{ApiError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{DataSource, Provider, ProviderConfig, ProviderMetadata, Resource};
pub use schema::{Diagnostic, ProviderSchema};
pub use state::ResourceData;
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
