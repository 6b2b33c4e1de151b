//! Maintenance window resource.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::schema::{Attribute, Schema, SchemaConstraint, Validator};
use crate::state::ResourceData;

/// Allowed repeat intervals.
const REPEAT_INTERVALS: [&str; 5] = ["never", "1d", "1w", "2w", "1m"];

/// `statuscake_maintenance_window` resource.
pub struct MaintenanceWindow;

/// Maintenance window representation returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
struct MaintenanceWindowDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    start_at: String,
    #[serde(default)]
    end_at: String,
    #[serde(default)]
    repeat_interval: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    tests: Vec<String>,
    #[serde(default)]
    timezone: String,
}

fn expand_timestamp(data: &ResourceData, attribute: &str) -> Result<String, ProviderError> {
    let raw = data.get_str(attribute).unwrap_or_default();
    let parsed: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| ProviderError::Expansion(format!("malformed timestamp {:?}: {}", raw, e)))?;
    Ok(parsed.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn flatten_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|_| raw.to_string())
}

fn request_body(data: &ResourceData) -> Result<Map<String, Value>, Diagnostics> {
    let mut body = Map::new();

    if data.has_change("end") {
        let end = expand_timestamp(data, "end")
            .map_err(|e| diag::from_attribute_err("failed to expand end", "end", &e))?;
        body.insert("end_at".to_string(), json!(end));
    }

    if data.has_change("name") {
        body.insert(
            "name".to_string(),
            data.get("name").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("repeat_interval") {
        body.insert(
            "repeat_interval".to_string(),
            data.get("repeat_interval").cloned().unwrap_or_default(),
        );
    }

    if data.has_change("start") {
        let start = expand_timestamp(data, "start")
            .map_err(|e| diag::from_attribute_err("failed to expand start", "start", &e))?;
        body.insert("start_at".to_string(), json!(start));
    }

    if data.has_change("tags") {
        body.insert(
            "tags".to_string(),
            data.get("tags").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("tests") {
        body.insert(
            "tests".to_string(),
            data.get("tests").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("timezone") {
        body.insert(
            "timezone".to_string(),
            data.get("timezone").cloned().unwrap_or_default(),
        );
    }

    Ok(body)
}

fn flatten_maintenance_window(data: &mut ResourceData, window: &MaintenanceWindowDetail) {
    data.set("end", json!(flatten_timestamp(&window.end_at)));
    data.set("name", json!(window.name));
    data.set("repeat_interval", json!(window.repeat_interval));
    data.set("start", json!(flatten_timestamp(&window.start_at)));
    data.set("tags", json!(window.tags));
    data.set("tests", json!(window.tests));
    data.set("timezone", json!(window.timezone));
}

#[async_trait::async_trait]
impl Resource for MaintenanceWindow {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "end",
                Attribute::required_string()
                    .with_description("End of the maintenance window (RFC3339 format)")
                    .with_validator(Validator::Rfc3339),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("Name of the maintenance window")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "repeat_interval",
                Attribute::optional_string()
                    .with_description("How often the maintenance window should occur")
                    .with_default(json!("never"))
                    .with_validator(Validator::StringInSlice(
                        REPEAT_INTERVALS.iter().map(|s| s.to_string()).collect(),
                    )),
            )
            .with_attribute(
                "start",
                Attribute::required_string()
                    .with_description("Start of the maintenance window (RFC3339 format)")
                    .with_validator(Validator::Rfc3339),
            )
            .with_attribute(
                "tags",
                Attribute::optional_string_set()
                    .with_description(
                        "List of tags used to include matching uptime checks in this maintenance window",
                    )
                    .with_element_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "tests",
                Attribute::optional_string_set()
                    .with_description(
                        "List of uptime check IDs explicitly included in this maintenance window",
                    )
                    .with_element_validator(Validator::StringNumerical),
            )
            .with_attribute(
                "timezone",
                Attribute::required_string()
                    .with_description("Standard timezone associated with this maintenance window")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_constraint(SchemaConstraint::AtLeastOneOf(vec![
                "tags".to_string(),
                "tests".to_string(),
            ]))
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let body = Value::Object(request_body(data)?);
        debug!("creating maintenance window");

        let id = client
            .create("maintenance-windows", &body)
            .await
            .map_err(|e| diag::from_err("failed to create maintenance window", &e))?;

        data.set_id(id);
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("maintenance window has no identifier")),
        };

        let payload = match client.get(&format!("maintenance-windows/{}", id)).await {
            Ok(payload) => payload,
            Err(ProviderError::Api(err)) if err.is_not_found() => {
                data.clear_id();
                return Ok(());
            },
            Err(err) => {
                return Err(diag::from_err("failed to get maintenance window", &err));
            },
        };

        let window: MaintenanceWindowDetail = serde_json::from_value(payload).map_err(|e| {
            diag::from_err(
                "failed to decode maintenance window",
                &ProviderError::from(e),
            )
        })?;

        flatten_maintenance_window(data, &window);
        Ok(())
    }

    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("maintenance window has no identifier")),
        };

        let body = request_body(data)?;
        if body.is_empty() {
            debug!(%id, "no maintenance window changes to apply");
        } else {
            debug!(%id, "updating maintenance window");
            client
                .update(&format!("maintenance-windows/{}", id), &Value::Object(body))
                .await
                .map_err(|e| diag::from_err("failed to update maintenance window", &e))?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("maintenance window has no identifier")),
        };

        debug!(%id, "deleting maintenance window");
        client
            .delete(&format!("maintenance-windows/{}", id))
            .await
            .map_err(|e| {
                diag::from_err(
                    &format!("failed to delete maintenance window with id {}", id),
                    &e,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_renames_timestamps() {
        let config = json!({
            "name": "weekend work",
            "start": "2024-06-01T22:00:00Z",
            "end": "2024-06-02T02:00:00Z",
            "timezone": "UTC",
            "tags": ["production"],
            "repeat_interval": "never"
        });
        let data = ResourceData::new(config, Value::Null);

        let body = request_body(&data).unwrap();
        assert_eq!(body["start_at"], "2024-06-01T22:00:00Z");
        assert_eq!(body["end_at"], "2024-06-02T02:00:00Z");
        assert_eq!(body["name"], "weekend work");
        assert_eq!(body["repeat_interval"], "never");
        assert!(!body.contains_key("start"));
        assert!(!body.contains_key("end"));
    }

    #[test]
    fn test_expand_normalizes_offsets() {
        let config = json!({
            "name": "weekend work",
            "start": "2024-06-01T22:00:00+02:00",
            "end": "2024-06-02T02:00:00Z",
            "timezone": "UTC",
            "tags": ["production"]
        });
        let data = ResourceData::new(config, Value::Null);

        let body = request_body(&data).unwrap();
        assert_eq!(body["start_at"], "2024-06-01T22:00:00+02:00");
    }

    #[test]
    fn test_malformed_timestamp_is_an_expansion_error() {
        let config = json!({
            "name": "weekend work",
            "start": "next saturday",
            "end": "2024-06-02T02:00:00Z",
            "timezone": "UTC",
            "tags": ["production"]
        });
        let data = ResourceData::new(config, Value::Null);

        let err = request_body(&data).unwrap_err();
        assert_eq!(err[0].attribute.as_deref(), Some("start"));
        assert!(err[0].summary.contains("failed to expand start"));
    }

    #[test]
    fn test_schema_requires_tags_or_tests() {
        let schema = MaintenanceWindow.schema();

        let base = json!({
            "name": "weekend work",
            "start": "2024-06-01T22:00:00Z",
            "end": "2024-06-02T02:00:00Z",
            "timezone": "UTC"
        });
        let diagnostics = crate::validation::validate(&schema, &base);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("At least one"));

        let mut with_tests = base.clone();
        with_tests["tests"] = json!(["12345"]);
        assert!(crate::validation::validate(&schema, &with_tests).is_empty());
    }

    #[test]
    fn test_schema_rejects_unknown_repeat_interval() {
        let schema = MaintenanceWindow.schema();
        let config = json!({
            "name": "weekend work",
            "start": "2024-06-01T22:00:00Z",
            "end": "2024-06-02T02:00:00Z",
            "timezone": "UTC",
            "tags": ["production"],
            "repeat_interval": "fortnightly"
        });

        let diagnostics = crate::validation::validate(&schema, &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("repeat_interval"));
    }

    #[test]
    fn test_flatten_round_trips_state() {
        let window = MaintenanceWindowDetail {
            name: "weekend work".to_string(),
            start_at: "2024-06-01T22:00:00Z".to_string(),
            end_at: "2024-06-02T02:00:00Z".to_string(),
            repeat_interval: "never".to_string(),
            tags: vec!["production".to_string()],
            tests: vec![],
            timezone: "UTC".to_string(),
        };

        let mut data = ResourceData::from_id("77");
        flatten_maintenance_window(&mut data, &window);

        let state = data.into_state().unwrap();
        assert_eq!(state["start"], "2024-06-01T22:00:00Z");
        assert_eq!(state["end"], "2024-06-02T02:00:00Z");
        assert_eq!(state["tags"], json!(["production"]));
    }
}
