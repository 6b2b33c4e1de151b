//! Diagnostic construction helpers.
//!
//! Operations report failure as a list of [`Diagnostic`]s. API validation
//! failures carry field-level violations which are fanned out into one
//! diagnostic per field; everything else becomes a single diagnostic
//! wrapping the underlying error.

use crate::error::{ApiError, ProviderError};
use crate::schema::{Diagnostic, DiagnosticSeverity};

/// A list of diagnostics returned by provider operations.
pub type Diagnostics = Vec<Diagnostic>;

/// Create a single error diagnostic.
pub fn error(summary: impl Into<String>) -> Diagnostics {
    vec![Diagnostic::error(summary)]
}

/// Convert an error into diagnostics, prefixing each summary with a
/// contextual message.
pub fn from_err(message: &str, err: &ProviderError) -> Diagnostics {
    match err {
        ProviderError::Api(api) if !api.errors.is_empty() => violations(message, api),
        _ => vec![Diagnostic::error(format!("{}: {}", message, err))],
    }
}

/// Convert a codec error into a diagnostic carrying the attribute path.
pub fn from_attribute_err(message: &str, attribute: &str, err: &ProviderError) -> Diagnostics {
    vec![Diagnostic::error(format!("{}: {}", message, err)).with_attribute(attribute)]
}

/// Whether any diagnostic in the list is an error.
pub fn has_errors(diagnostics: &Diagnostics) -> bool {
    diagnostics
        .iter()
        .any(|d| matches!(d.severity, DiagnosticSeverity::Error))
}

fn violations(message: &str, err: &ApiError) -> Diagnostics {
    err.errors
        .iter()
        .map(|(field, violations)| {
            Diagnostic::error(format!("{}: {}: {} contains violations", message, err, field))
                .with_detail(violations.join("; "))
        })
        .collect()
}
