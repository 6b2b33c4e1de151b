//! Testing utilities for exercising the provider without a host.
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_statuscake::testing::ProviderTester;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_check() {
//!     let tester = ProviderTester::configured(json!({"api_token": "..."})).unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("statuscake_uptime_check", json!({
//!             "name": "example",
//!             "check_interval": 300,
//!             "monitored_resource": [{"address": "https://example.com"}],
//!             "http_check": [{}],
//!         }))
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(state["name"], "example");
//! }
//! ```

use serde_json::Value;

use crate::diag::Diagnostics;
use crate::provider::{Provider, ProviderMetadata};
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};

/// A test harness wrapping a [`Provider`].
pub struct ProviderTester {
    provider: Provider,
}

impl ProviderTester {
    /// Wrap an already-constructed provider.
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Construct and configure a provider in one step.
    pub fn configured(config: Value) -> Result<Self, TestError> {
        let provider = Provider::new();
        provider.configure(config).map_err(TestError::Diagnostics)?;
        Ok(Self { provider })
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// The provider's full schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Registered type names.
    pub fn metadata(&self) -> ProviderMetadata {
        self.provider.metadata()
    }

    /// Create a resource.
    pub async fn create(&self, type_name: &str, config: Value) -> Result<Value, TestError> {
        self.provider
            .create(type_name, config)
            .await
            .map_err(TestError::Diagnostics)
    }

    /// Read a resource's current state.
    pub async fn read(&self, type_name: &str, state: Value) -> Result<Option<Value>, TestError> {
        self.provider
            .read(type_name, state)
            .await
            .map_err(TestError::Diagnostics)
    }

    /// Update a resource.
    pub async fn update(
        &self,
        type_name: &str,
        state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        self.provider
            .update(type_name, state, config)
            .await
            .map_err(TestError::Diagnostics)
    }

    /// Delete a resource.
    pub async fn delete(&self, type_name: &str, state: Value) -> Result<(), TestError> {
        self.provider
            .delete(type_name, state)
            .await
            .map_err(TestError::Diagnostics)
    }

    /// Import a resource by identifier.
    pub async fn import_resource(
        &self,
        type_name: &str,
        id: &str,
    ) -> Result<Option<Value>, TestError> {
        self.provider
            .import_resource(type_name, id)
            .await
            .map_err(TestError::Diagnostics)
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Option<Value>, TestError> {
        self.provider
            .read_data_source(type_name, config)
            .await
            .map_err(TestError::Diagnostics)
    }

    /// Create a resource and immediately read it back.
    pub async fn lifecycle_create(&self, type_name: &str, config: Value) -> Result<Value, TestError> {
        let created = self.create(type_name, config).await?;
        self.read(type_name, created)
            .await?
            .ok_or(TestError::MissingUpstream)
    }

    /// Update a resource and immediately read it back.
    pub async fn lifecycle_update(
        &self,
        type_name: &str,
        state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        let updated = self.update(type_name, state, config).await?;
        self.read(type_name, updated)
            .await?
            .ok_or(TestError::MissingUpstream)
    }

    /// Run a full create → update → delete lifecycle, returning the state
    /// after the update.
    pub async fn lifecycle_crud(
        &self,
        type_name: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(type_name, initial_config).await?;
        let updated = self
            .lifecycle_update(type_name, created, updated_config)
            .await?;
        self.delete(type_name, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Diagnostics),
    /// A read found the resource missing upstream.
    MissingUpstream,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::MissingUpstream => write!(f, "resource is missing upstream"),
        }
    }
}

impl std::error::Error for TestError {}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    let has_errors = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error));

    assert!(has_errors, "Expected at least one error, but got none");
}

/// Assert that diagnostics contain an error whose summary contains the
/// given substring.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error) && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain an error anchored at the given
/// attribute path.
///
/// # Panics
///
/// Panics if no error diagnostic carries the attribute path.
pub fn assert_error_at(diagnostics: &[Diagnostic], attribute: &str) {
    let has_matching_error = diagnostics.iter().any(|d| {
        matches!(d.severity, DiagnosticSeverity::Error) && d.attribute.as_deref() == Some(attribute)
    });

    assert!(
        has_matching_error,
        "Expected an error at attribute '{}'. Errors: {:?}",
        attribute,
        diagnostics
            .iter()
            .map(|d| (&d.summary, &d.attribute))
            .collect::<Vec<_>>()
    );
}
