//! Error types for the StatusCake provider.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors that can occur while executing provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found upstream.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A configuration value failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A codec could not convert a schema-valid value.
    #[error("Expansion error: {0}")]
    Expansion(String),

    /// The provider configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The requested data source type is not registered.
    #[error("Unknown data source type: {0}")]
    UnknownDataSource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An HTTP transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API rejected a request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// An error response returned by the StatusCake API.
///
/// Validation failures carry a map of field names to violation messages
/// which is fanned out into one diagnostic per field.
#[derive(Debug, Clone, Error)]
#[error("API error (status {status}): {message}")]
pub struct ApiError {
    /// HTTP status code of the response.
    pub status: u16,
    /// Human-readable message from the API.
    pub message: String,
    /// Field-level violations, keyed by payload field name.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ApiError {
    /// Create an error from a status code and message with no field violations.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    /// Whether the response indicated the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Whether the request may succeed if retried.
    pub fn is_transient(&self) -> bool {
        self.status == 408 || self.status == 429 || self.status >= 500
    }
}
