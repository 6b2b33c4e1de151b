//! SSL check resource.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema, Validator};
use crate::state::ResourceData;
use crate::util::merge;

/// Check rates accepted by the SSL endpoint, in seconds.
const SSL_CHECK_RATES: [i64; 6] = [300, 600, 1800, 3600, 86400, 2073600];

/// `statuscake_ssl_check` resource.
pub struct SslCheck;

/// SSL check representation returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
struct SslTest {
    #[serde(default)]
    website_url: String,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    check_rate: i64,
    #[serde(default)]
    contact_groups: Vec<String>,
    #[serde(default)]
    follow_redirects: bool,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    alert_at: Vec<i64>,
    #[serde(default)]
    alert_broken: bool,
    #[serde(default)]
    alert_expiry: bool,
    #[serde(default)]
    alert_mixed: bool,
    #[serde(default)]
    alert_reminder: bool,
}

fn expand_alert_config(data: &ResourceData) -> Map<String, Value> {
    let mut fragment = Map::new();
    if data.get("alert_config.0").is_none() {
        return fragment;
    }

    if data.has_change("alert_config.0.alert_at") {
        fragment.insert(
            "alert_at".to_string(),
            data.get("alert_config.0.alert_at").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("alert_config.0.on_broken") {
        fragment.insert(
            "alert_broken".to_string(),
            data.get("alert_config.0.on_broken").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("alert_config.0.on_expiry") {
        fragment.insert(
            "alert_expiry".to_string(),
            data.get("alert_config.0.on_expiry").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("alert_config.0.on_mixed") {
        fragment.insert(
            "alert_mixed".to_string(),
            data.get("alert_config.0.on_mixed").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("alert_config.0.on_reminder") {
        fragment.insert(
            "alert_reminder".to_string(),
            data.get("alert_config.0.on_reminder").cloned().unwrap_or_default(),
        );
    }

    fragment
}

fn expand_monitored_resource(data: &ResourceData) -> Map<String, Value> {
    let mut fragment = Map::new();
    if data.get("monitored_resource.0").is_none() {
        return fragment;
    }

    if data.has_change("monitored_resource.0.address") {
        fragment.insert(
            "website_url".to_string(),
            data.get("monitored_resource.0.address").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("monitored_resource.0.hostname") {
        fragment.insert(
            "hostname".to_string(),
            data.get("monitored_resource.0.hostname").cloned().unwrap_or_default(),
        );
    }

    fragment
}

fn request_body(data: &ResourceData) -> Map<String, Value> {
    let mut body = Map::new();

    if data.has_change("alert_config") {
        merge(&mut body, expand_alert_config(data));
    }

    if data.has_change("check_interval") {
        body.insert(
            "check_rate".to_string(),
            data.get("check_interval").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("contact_groups") {
        body.insert(
            "contact_groups".to_string(),
            data.get("contact_groups").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("follow_redirects") {
        body.insert(
            "follow_redirects".to_string(),
            data.get("follow_redirects").cloned().unwrap_or_default(),
        );
    }

    if data.has_change("monitored_resource") {
        merge(&mut body, expand_monitored_resource(data));
    }

    if data.has_change("paused") {
        body.insert(
            "paused".to_string(),
            data.get("paused").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("user_agent") {
        body.insert(
            "user_agent".to_string(),
            data.get("user_agent").cloned().unwrap_or_default(),
        );
    }

    body
}

fn flatten_ssl_check(data: &mut ResourceData, test: &SslTest) {
    data.set(
        "alert_config",
        json!([{
            "alert_at": test.alert_at,
            "on_broken": test.alert_broken,
            "on_expiry": test.alert_expiry,
            "on_mixed": test.alert_mixed,
            "on_reminder": test.alert_reminder,
        }]),
    );
    data.set("check_interval", json!(test.check_rate));
    data.set("contact_groups", json!(test.contact_groups));
    data.set("follow_redirects", json!(test.follow_redirects));
    data.set(
        "monitored_resource",
        json!([{
            "address": test.website_url,
            "hostname": test.hostname.clone().unwrap_or_default(),
        }]),
    );
    data.set("paused", json!(test.paused));
    data.set("user_agent", json!(test.user_agent.clone().unwrap_or_default()));
}

#[async_trait::async_trait]
impl Resource for SslCheck {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_block(
                "alert_config",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute(
                            "alert_at",
                            Attribute::new(
                                AttributeType::set(AttributeType::Int64),
                                AttributeFlags::required(),
                            )
                            .with_description(
                                "List representing when alerts should be sent (days). Must be exactly 3 numerical values",
                            )
                            .with_validator(Validator::SetSize { min: 3, max: 3 })
                            .with_element_validator(Validator::IntAtLeast(1)),
                        )
                        .with_attribute(
                            "on_broken",
                            Attribute::optional_bool()
                                .with_description(
                                    "Whether to enable alerts when SSL certificate issues are found",
                                )
                                .with_default(json!(false)),
                        )
                        .with_attribute(
                            "on_expiry",
                            Attribute::optional_bool()
                                .with_description(
                                    "Whether to enable alerts when the SSL certificate is to expire",
                                )
                                .with_default(json!(false)),
                        )
                        .with_attribute(
                            "on_mixed",
                            Attribute::optional_bool()
                                .with_description("Whether to enable alerts when mixed content is found")
                                .with_default(json!(false)),
                        )
                        .with_attribute(
                            "on_reminder",
                            Attribute::optional_bool()
                                .with_description("Whether to enable alert reminders")
                                .with_default(json!(false)),
                        )
                        .with_description("Alert configuration block"),
                ),
            )
            .with_attribute(
                "check_interval",
                Attribute::required_int64()
                    .with_description("Number of seconds between checks")
                    .with_validator(Validator::IntInSlice(SSL_CHECK_RATES.to_vec())),
            )
            .with_attribute(
                "contact_groups",
                Attribute::optional_string_set()
                    .with_description("List of contact group IDs")
                    .with_element_validator(Validator::StringNumerical),
            )
            .with_attribute(
                "follow_redirects",
                Attribute::optional_bool()
                    .with_description("Whether to follow redirects when testing")
                    .with_default(json!(false)),
            )
            .with_block(
                "monitored_resource",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute(
                            "address",
                            Attribute::required_string()
                                .with_description("URL of the server under test")
                                .with_validator(Validator::UrlHttpOrHttps),
                        )
                        .with_attribute(
                            "hostname",
                            Attribute::optional_string()
                                .with_description("Hostname of the server under test")
                                .with_validator(Validator::StringNotEmpty),
                        )
                        .with_description("Describes the server under test"),
                ),
            )
            .with_attribute(
                "paused",
                Attribute::optional_bool()
                    .with_description("Whether the check should be run")
                    .with_default(json!(false)),
            )
            .with_attribute(
                "user_agent",
                Attribute::optional_string()
                    .with_description("Custom user agent string set when testing")
                    .with_validator(Validator::StringNotEmpty),
            )
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let body = Value::Object(request_body(data));
        debug!("creating SSL check");

        let id = client
            .create("ssl", &body)
            .await
            .map_err(|e| diag::from_err("failed to create SSL check", &e))?;

        data.set_id(id);
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("SSL check has no identifier")),
        };

        let payload = match client.get(&format!("ssl/{}", id)).await {
            Ok(payload) => payload,
            Err(ProviderError::Api(err)) if err.is_not_found() => {
                data.clear_id();
                return Ok(());
            },
            Err(err) => {
                return Err(diag::from_err(
                    &format!("failed to get SSL check with ID: {}", id),
                    &err,
                ));
            },
        };

        let test: SslTest = serde_json::from_value(payload)
            .map_err(|e| diag::from_err("failed to decode SSL check", &ProviderError::from(e)))?;

        flatten_ssl_check(data, &test);
        Ok(())
    }

    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("SSL check has no identifier")),
        };

        let body = request_body(data);
        if body.is_empty() {
            debug!(%id, "no SSL check changes to apply");
        } else {
            debug!(%id, "updating SSL check");
            client
                .update(&format!("ssl/{}", id), &Value::Object(body))
                .await
                .map_err(|e| {
                    diag::from_err(&format!("failed to update SSL check with id {}", id), &e)
                })?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("SSL check has no identifier")),
        };

        debug!(%id, "deleting SSL check");
        client.delete(&format!("ssl/{}", id)).await.map_err(|e| {
            diag::from_err(&format!("failed to delete SSL check with id {}", id), &e)
        })
    }
}
