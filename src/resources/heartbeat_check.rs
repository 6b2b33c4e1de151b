//! Heartbeat check resource.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::schema::{Attribute, Block, NestedBlock, Schema, Validator};
use crate::state::ResourceData;

/// `statuscake_heartbeat_check` resource.
pub struct HeartbeatCheck;

/// Heartbeat check representation returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
struct HeartbeatTest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    website_url: String,
    #[serde(default)]
    period: i64,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    contact_groups: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    host: Option<String>,
}

fn request_body(data: &ResourceData) -> Map<String, Value> {
    let mut body = Map::new();

    if data.has_change("contact_groups") {
        body.insert(
            "contact_groups".to_string(),
            data.get("contact_groups").cloned().unwrap_or_default(),
        );
    }

    if data.has_change("monitored_resource") {
        // When the block is absent the API still requires the host field;
        // omitting it entirely is rejected upstream.
        match data.get_str("monitored_resource.0.host") {
            Some(host) if data.has_change("monitored_resource.0.host") => {
                body.insert("host".to_string(), json!(host));
            },
            Some(_) => {},
            None => {
                body.insert("host".to_string(), json!(""));
            },
        }
    }

    if data.has_change("name") {
        body.insert(
            "name".to_string(),
            data.get("name").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("paused") {
        body.insert(
            "paused".to_string(),
            data.get("paused").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("period") {
        body.insert(
            "period".to_string(),
            data.get("period").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("tags") {
        body.insert(
            "tags".to_string(),
            data.get("tags").cloned().unwrap_or_default(),
        );
    }

    body
}

fn flatten_heartbeat_check(data: &mut ResourceData, test: &HeartbeatTest) {
    data.set("check_url", json!(test.website_url));
    data.set("contact_groups", json!(test.contact_groups));

    let host = test.host.clone().unwrap_or_default();
    if host.is_empty() {
        data.set("monitored_resource", json!([]));
    } else {
        data.set("monitored_resource", json!([{ "host": host }]));
    }

    data.set("name", json!(test.name));
    data.set("paused", json!(test.paused));
    data.set("period", json!(test.period));
    data.set("tags", json!(test.tags));
}

#[async_trait::async_trait]
impl Resource for HeartbeatCheck {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "check_url",
                Attribute::computed_string().with_description("URL of the heartbeat check"),
            )
            .with_attribute(
                "contact_groups",
                Attribute::optional_string_set()
                    .with_description("List of contact group IDs")
                    .with_element_validator(Validator::StringNumerical),
            )
            .with_block(
                "monitored_resource",
                NestedBlock::single(
                    Block::new()
                        .with_attribute(
                            "host",
                            Attribute::optional_string()
                                .with_description("Name of the hosting provider")
                                .with_validator(Validator::StringNotEmpty),
                        )
                        .with_description("Describes the server under test"),
                ),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("Name of the check")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "paused",
                Attribute::optional_bool()
                    .with_description("Whether the check should be run")
                    .with_default(json!(false)),
            )
            .with_attribute(
                "period",
                Attribute::required_int64()
                    .with_description(
                        "Number of seconds since the last ping before the check is considered down",
                    )
                    .with_validator(Validator::IntBetween(30, 172800)),
            )
            .with_attribute(
                "tags",
                Attribute::optional_string_set()
                    .with_description("List of tags")
                    .with_element_validator(Validator::StringNotEmpty),
            )
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let body = Value::Object(request_body(data));
        debug!("creating heartbeat check");

        let id = client
            .create("heartbeat", &body)
            .await
            .map_err(|e| diag::from_err("failed to create heartbeat check", &e))?;

        data.set_id(id);
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("heartbeat check has no identifier")),
        };

        let payload = match client.get(&format!("heartbeat/{}", id)).await {
            Ok(payload) => payload,
            Err(ProviderError::Api(err)) if err.is_not_found() => {
                data.clear_id();
                return Ok(());
            },
            Err(err) => {
                return Err(diag::from_err(
                    &format!("failed to get heartbeat check with ID: {}", id),
                    &err,
                ));
            },
        };

        let test: HeartbeatTest = serde_json::from_value(payload).map_err(|e| {
            diag::from_err("failed to decode heartbeat check", &ProviderError::from(e))
        })?;

        flatten_heartbeat_check(data, &test);
        Ok(())
    }

    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("heartbeat check has no identifier")),
        };

        let body = request_body(data);
        if body.is_empty() {
            debug!(%id, "no heartbeat check changes to apply");
        } else {
            debug!(%id, "updating heartbeat check");
            client
                .update(&format!("heartbeat/{}", id), &Value::Object(body))
                .await
                .map_err(|e| {
                    diag::from_err(
                        &format!("failed to update heartbeat check with id {}", id),
                        &e,
                    )
                })?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("heartbeat check has no identifier")),
        };

        debug!(%id, "deleting heartbeat check");
        client.delete(&format!("heartbeat/{}", id)).await.map_err(|e| {
            diag::from_err(
                &format!("failed to delete heartbeat check with id {}", id),
                &e,
            )
        })
    }
}
