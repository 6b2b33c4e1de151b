//! Schema validation.
//!
//! Validates a `serde_json::Value` against a [`Schema`] before any codec
//! runs: structural checks (types, required attributes, block item counts),
//! per-attribute value predicates, and cross-field constraint groups.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_statuscake::schema::{Attribute, Schema, Validator};
//! use hemmer_provider_statuscake::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0().with_attribute(
//!     "check_interval",
//!     Attribute::required_int64().with_validator(Validator::IntInSlice(vec![30, 60, 300])),
//! );
//!
//! assert!(validate(&schema, &json!({"check_interval": 300})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"check_interval": 299}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("check_interval".to_string()));
//! ```

use std::net::IpAddr;

use serde_json::Value;
use url::Url;

use crate::schema::{
    Attribute, AttributeType, Block, Diagnostic, DiagnosticSeverity, NestedBlock, Schema,
    SchemaConstraint, Validator,
};
use crate::util::{is_empty_value, lookup_path};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    for constraint in &schema.constraints {
        validate_constraint(constraint, value, &mut diagnostics);
    }
    diagnostics
}

/// Validate a JSON value against a schema, returning `Err` with the
/// diagnostics when invalid.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Determine which changed paths force resource replacement.
///
/// Compares the prior state against the proposed configuration and returns
/// the dotted paths of `force_new` attributes and blocks whose values
/// differ. The host must reject in-place updates for any returned path.
pub fn requires_replace(schema: &Schema, prior: &Value, proposed: &Value) -> Vec<String> {
    let mut paths = Vec::new();

    for (name, attr) in &schema.block.attributes {
        if attr.force_new && path_changed(prior, proposed, name) {
            paths.push(name.clone());
        }
    }

    for (name, nested) in &schema.block.blocks {
        if nested.force_new && path_changed(prior, proposed, name) {
            paths.push(name.clone());
            continue;
        }
        // Single-instance blocks may carry force_new attributes of their own.
        if nested.max_items == 1 {
            for (attr_name, attr) in &nested.block.attributes {
                if attr.force_new {
                    let path = format!("{}.0.{}", name, attr_name);
                    if path_changed(prior, proposed, &path) {
                        paths.push(path);
                    }
                }
            }
        }
    }

    paths.sort();
    paths
}

fn path_changed(prior: &Value, proposed: &Value, path: &str) -> bool {
    let old = lookup_path(prior, path).cloned().unwrap_or(Value::Null);
    let new = lookup_path(proposed, path).cloned().unwrap_or(Value::Null);
    if is_empty_value(&old) && is_empty_value(&new) {
        return false;
    }
    old != new
}

fn validate_constraint(
    constraint: &SchemaConstraint,
    value: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let paths = match constraint {
        SchemaConstraint::ExactlyOneOf(paths)
        | SchemaConstraint::AtLeastOneOf(paths)
        | SchemaConstraint::ConflictsWith(paths) => paths,
    };
    let present: Vec<&String> = paths
        .iter()
        .filter(|p| {
            lookup_path(value, p)
                .map(|v| !is_empty_value(v))
                .unwrap_or(false)
        })
        .collect();

    let group = paths.join(", ");
    match constraint {
        SchemaConstraint::ExactlyOneOf(_) => {
            if present.len() != 1 {
                diagnostics.push(
                    Diagnostic::error(format!("Exactly one of [{}] must be specified", group))
                        .with_detail(format!("Found {} of the mutually exclusive attributes", present.len())),
                );
            }
        },
        SchemaConstraint::AtLeastOneOf(_) => {
            if present.is_empty() {
                diagnostics.push(Diagnostic::error(format!(
                    "At least one of [{}] must be specified",
                    group
                )));
            }
        },
        SchemaConstraint::ConflictsWith(_) => {
            if present.len() > 1 {
                diagnostics.push(
                    Diagnostic::error(format!("Only one of [{}] may be specified", group))
                        .with_detail(format!("Found {} conflicting attributes", present.len())),
                );
            }
        },
    }
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        let attr_value = obj.get(name);
        validate_attribute(attr, attr_value, &attr_path, diagnostics);
    }

    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        let block_value = obj.get(name);
        validate_nested_block(nested_block, block_value, &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Computed-only attributes are written by the provider, never the user.
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            // Value predicates only make sense once the shape is right.
            if diagnostics.len() == before {
                validate_attribute_values(attr, v, path, diagnostics);
            }
        },
    }
}

fn validate_attribute_values(
    attr: &Attribute,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for validator in &attr.validators {
        if let Some(message) = check(validator, value) {
            diagnostics.push(
                Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                    .with_detail(message)
                    .with_attribute(path),
            );
        }
    }

    if attr.element_validators.is_empty() {
        return;
    }

    match value {
        Value::Array(arr) => {
            for (i, elem) in arr.iter().enumerate() {
                let elem_path = format!("{}.{}", path, i);
                for validator in &attr.element_validators {
                    if let Some(message) = check(validator, elem) {
                        diagnostics.push(
                            Diagnostic::error(format!("Invalid value for attribute '{}'", elem_path))
                                .with_detail(message)
                                .with_attribute(&elem_path),
                        );
                    }
                }
            }
        },
        Value::Object(obj) => {
            for (key, elem) in obj {
                let elem_path = format!("{}.{}", path, key);
                for validator in &attr.element_validators {
                    if let Some(message) = check(validator, elem) {
                        diagnostics.push(
                            Diagnostic::error(format!("Invalid value for attribute '{}'", elem_path))
                                .with_detail(message)
                                .with_attribute(&elem_path),
                        );
                    }
                }
            }
        },
        _ => {},
    }
}

/// Evaluate a single validator, returning an error message on failure.
fn check(validator: &Validator, value: &Value) -> Option<String> {
    match validator {
        Validator::StringNotEmpty => {
            let s = value.as_str()?;
            if s.is_empty() {
                return Some("expected a non-empty string".to_string());
            }
            None
        },
        Validator::StringNumerical => {
            let s = value.as_str()?;
            if s.is_empty() || s.parse::<i64>().is_err() {
                return Some(format!("expected a numerical string, got {:?}", s));
            }
            None
        },
        Validator::StringInSlice(allowed) => {
            let s = value.as_str()?;
            if !allowed.iter().any(|a| a == s) {
                return Some(format!("expected one of {:?}, got {:?}", allowed, s));
            }
            None
        },
        Validator::EmailAddress => {
            let s = value.as_str()?;
            let well_formed = s
                .split_once('@')
                .map(|(local, domain)| {
                    !local.is_empty() && !domain.is_empty() && domain.contains('.')
                })
                .unwrap_or(false);
            if !well_formed {
                return Some(format!("expected a valid email address, got {:?}", s));
            }
            None
        },
        Validator::UrlHttpOrHttps => {
            let s = value.as_str()?;
            match Url::parse(s) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => None,
                _ => Some(format!("expected an http or https URL, got {:?}", s)),
            }
        },
        Validator::UrlOrIpAddress => {
            let s = value.as_str()?;
            let is_url = matches!(
                Url::parse(s),
                Ok(url) if url.scheme() == "http" || url.scheme() == "https"
            );
            if is_url || s.parse::<IpAddr>().is_ok() {
                None
            } else {
                Some(format!("expected a URL or IP address, got {:?}", s))
            }
        },
        Validator::IpAddress => {
            let s = value.as_str()?;
            if s.parse::<IpAddr>().is_err() {
                return Some(format!("expected an IP address, got {:?}", s));
            }
            None
        },
        Validator::Rfc3339 => {
            let s = value.as_str()?;
            if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                return Some(format!("expected an RFC3339 timestamp, got {:?}", s));
            }
            None
        },
        Validator::IntBetween(min, max) => {
            let n = value.as_i64()?;
            if n < *min || n > *max {
                return Some(format!("expected a value between {} and {}, got {}", min, max, n));
            }
            None
        },
        Validator::IntAtLeast(min) => {
            let n = value.as_i64()?;
            if n < *min {
                return Some(format!("expected a value of at least {}, got {}", min, n));
            }
            None
        },
        Validator::IntInSlice(allowed) => {
            let n = value.as_i64()?;
            if !allowed.contains(&n) {
                return Some(format!("expected one of {:?}, got {}", allowed, n));
            }
            None
        },
        Validator::PortNumber => {
            let n = value.as_i64()?;
            if n < 1 || n > 65535 {
                return Some(format!("expected a port number between 1 and 65535, got {}", n));
            }
            None
        },
        Validator::SetSize { min, max } => {
            let len = value.as_array()?.len();
            if len < *min || len > *max {
                return Some(format!(
                    "expected between {} and {} elements, got {}",
                    min, max, len
                ));
            }
            None
        },
        Validator::TokenFormat { min_len, max_len } => {
            let s = value.as_str()?;
            let well_formed = s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !well_formed || s.len() < *min_len || s.len() > *max_len {
                return Some(format!(
                    "token must be {}-{} characters of 0-9, a-z, A-Z and underscores",
                    min_len, max_len
                ));
            }
            None
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Float64 => {
            if !value.is_number() {
                diagnostics.push(type_error(path, "float64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        // Sets are represented as arrays in JSON.
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

// Helper functions

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.as_i64().is_some()
                || n.as_f64()
                    .map(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
                    .unwrap_or(false)
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!("Expected {}, got {}", expected, value_type_name(got))),
        attribute: Some(path.to_string()),
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "example"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("paused", Attribute::optional_bool());

        assert!(validate(&schema, &json!({"paused": true})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"paused": null})).is_empty());

        let diagnostics = validate(&schema, &json!({"paused": "yes"}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("location", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"location": 123})).is_empty());
    }

    #[test]
    fn test_int_in_slice_rejects_outside_set() {
        let schema = Schema::v0().with_attribute(
            "check_interval",
            Attribute::required_int64()
                .with_validator(Validator::IntInSlice(vec![30, 60, 300, 900, 1800, 3600, 86400])),
        );

        assert!(validate(&schema, &json!({"check_interval": 300})).is_empty());

        for bad in [0, 299, 301, 100000] {
            let diagnostics = validate(&schema, &json!({ "check_interval": bad }));
            assert_eq!(diagnostics.len(), 1, "expected rejection of {}", bad);
            assert_eq!(diagnostics[0].attribute, Some("check_interval".to_string()));
        }
    }

    #[test]
    fn test_string_in_slice() {
        let schema = Schema::v0().with_attribute(
            "matcher",
            Attribute::optional_string().with_validator(Validator::StringInSlice(vec![
                "CONTAINS_STRING".to_string(),
                "NOT_CONTAINS_STRING".to_string(),
            ])),
        );

        assert!(validate(&schema, &json!({"matcher": "CONTAINS_STRING"})).is_empty());
        assert_eq!(validate(&schema, &json!({"matcher": "MATCHES_REGEX"})).len(), 1);
    }

    #[test]
    fn test_element_validators() {
        let schema = Schema::v0().with_attribute(
            "contact_groups",
            Attribute::optional_string_set().with_element_validator(Validator::StringNumerical),
        );

        assert!(validate(&schema, &json!({"contact_groups": ["1", "42"]})).is_empty());

        let diagnostics = validate(&schema, &json!({"contact_groups": ["1", "abc"]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("contact_groups.1".to_string()));
    }

    #[test]
    fn test_email_and_url_validators() {
        assert!(check(&Validator::EmailAddress, &json!("ops@example.com")).is_none());
        assert!(check(&Validator::EmailAddress, &json!("not-an-email")).is_some());
        assert!(check(&Validator::EmailAddress, &json!("a@b")).is_some());

        assert!(check(&Validator::UrlHttpOrHttps, &json!("https://example.com")).is_none());
        assert!(check(&Validator::UrlHttpOrHttps, &json!("ftp://example.com")).is_some());
        assert!(check(&Validator::UrlHttpOrHttps, &json!("example.com")).is_some());

        assert!(check(&Validator::UrlOrIpAddress, &json!("192.168.0.1")).is_none());
        assert!(check(&Validator::UrlOrIpAddress, &json!("https://example.com")).is_none());
        assert!(check(&Validator::UrlOrIpAddress, &json!("nonsense")).is_some());
    }

    #[test]
    fn test_rfc3339_validator() {
        assert!(check(&Validator::Rfc3339, &json!("2024-05-01T12:00:00Z")).is_none());
        assert!(check(&Validator::Rfc3339, &json!("2024-05-01 12:00")).is_some());
    }

    #[test]
    fn test_token_format_validator() {
        let v = Validator::TokenFormat {
            min_len: 20,
            max_len: 30,
        };
        assert!(check(&v, &json!("abcdefghij0123456789")).is_none());
        assert!(check(&v, &json!("short")).is_some());
        assert!(check(&v, &json!("abcdefghij0123456789!")).is_some());
    }

    #[test]
    fn test_set_size_validator() {
        let v = Validator::SetSize { min: 3, max: 3 };
        assert!(check(&v, &json!([7, 14, 30])).is_none());
        assert!(check(&v, &json!([7, 14])).is_some());
        assert!(check(&v, &json!([7, 14, 30, 60])).is_some());
    }

    #[test]
    fn test_exactly_one_of() {
        let schema = Schema::v0()
            .with_block("dns_check", NestedBlock::single(Block::new()))
            .with_block("http_check", NestedBlock::single(Block::new()))
            .with_constraint(SchemaConstraint::ExactlyOneOf(vec![
                "dns_check".to_string(),
                "http_check".to_string(),
            ]));

        assert!(validate(&schema, &json!({"http_check": [{}]})).is_empty());

        // Zero blocks configured.
        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Exactly one"));

        // More than one block configured.
        let diagnostics = validate(&schema, &json!({"dns_check": [{}], "http_check": [{}]}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_at_least_one_of() {
        let schema = Schema::v0()
            .with_attribute("tags", Attribute::optional_string_set())
            .with_attribute("tests", Attribute::optional_string_set())
            .with_constraint(SchemaConstraint::AtLeastOneOf(vec![
                "tags".to_string(),
                "tests".to_string(),
            ]));

        assert!(validate(&schema, &json!({"tags": ["a"]})).is_empty());
        assert!(validate(&schema, &json!({"tags": ["a"], "tests": ["1"]})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("At least one"));
    }

    #[test]
    fn test_conflicts_with() {
        let schema = Schema::v0()
            .with_attribute("request_payload", Attribute::optional_string())
            .with_attribute("request_payload_raw", Attribute::optional_string())
            .with_constraint(SchemaConstraint::ConflictsWith(vec![
                "request_payload".to_string(),
                "request_payload_raw".to_string(),
            ]));

        assert!(validate(&schema, &json!({"request_payload": "x"})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"request_payload": "x", "request_payload_raw": "y"}),
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_nested_block_items() {
        let schema = Schema::v0().with_block(
            "alert_config",
            NestedBlock::required_single(
                Block::new().with_attribute(
                    "alert_at",
                    Attribute::new(
                        AttributeType::set(AttributeType::Int64),
                        AttributeFlags::required(),
                    ),
                ),
            ),
        );

        assert!(validate(&schema, &json!({"alert_config": [{"alert_at": [7, 14, 30]}]})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"alert_config": [{"alert_at": [7]}, {"alert_at": [14]}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 1"));
    }

    #[test]
    fn test_requires_replace() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_block(
                "dns_check",
                NestedBlock::single(Block::new()).with_force_new(),
            )
            .with_block(
                "monitored_resource",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute("address", Attribute::required_string().with_force_new()),
                ),
            );

        let prior = json!({
            "name": "example",
            "dns_check": [{"dns_ips": ["1.2.3.4"]}],
            "monitored_resource": [{"address": "https://example.com"}]
        });

        // Name changes update in place.
        let proposed = json!({
            "name": "renamed",
            "dns_check": [{"dns_ips": ["1.2.3.4"]}],
            "monitored_resource": [{"address": "https://example.com"}]
        });
        assert!(requires_replace(&schema, &prior, &proposed).is_empty());

        // Changing the check type block or the address forces replacement.
        let proposed = json!({
            "name": "example",
            "monitored_resource": [{"address": "https://other.example.com"}]
        });
        let paths = requires_replace(&schema, &prior, &proposed);
        assert_eq!(
            paths,
            vec!["dns_check".to_string(), "monitored_resource.0.address".to_string()]
        );
    }

    #[test]
    fn test_is_valid_and_result_helpers() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "example"})));
        assert!(!is_valid(&schema, &json!({})));

        assert!(validate_result(&schema, &json!({"name": "example"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }
}
