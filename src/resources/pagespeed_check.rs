//! Pagespeed check resource.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::schema::{Attribute, Block, NestedBlock, Schema, Validator};
use crate::state::ResourceData;
use crate::util::merge;

/// Check rates accepted by the pagespeed endpoint, in seconds.
const PAGESPEED_CHECK_RATES: [i64; 4] = [900, 1800, 3600, 86400];

/// Regions on which pagespeed checks can be run.
const PAGESPEED_REGIONS: [&str; 11] = [
    "AU", "CA", "DE", "FR", "IN", "JP", "NL", "SG", "UK", "US", "USW",
];

/// `statuscake_pagespeed_check` resource.
pub struct PagespeedCheck;

/// Pagespeed check representation returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
struct PagespeedTest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    website_url: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    check_rate: i64,
    #[serde(default)]
    contact_groups: Vec<String>,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    alert_bigger: i64,
    #[serde(default)]
    alert_slower: i64,
    #[serde(default)]
    alert_smaller: i64,
}

fn expand_alert_config(data: &ResourceData) -> Map<String, Value> {
    let mut fragment = Map::new();
    if data.get("alert_config.0").is_none() {
        return fragment;
    }

    if data.has_change("alert_config.0.alert_bigger") {
        fragment.insert(
            "alert_bigger".to_string(),
            data.get("alert_config.0.alert_bigger").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("alert_config.0.alert_slower") {
        fragment.insert(
            "alert_slower".to_string(),
            data.get("alert_config.0.alert_slower").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("alert_config.0.alert_smaller") {
        fragment.insert(
            "alert_smaller".to_string(),
            data.get("alert_config.0.alert_smaller").cloned().unwrap_or_default(),
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
    if data.has_change("name") {
        body.insert(
            "name".to_string(),
            data.get("name").cloned().unwrap_or_default(),
        );
    }

    if data.has_change("monitored_resource") && data.has_change("monitored_resource.0.address") {
        body.insert(
            "website_url".to_string(),
            data.get("monitored_resource.0.address").cloned().unwrap_or_default(),
        );
    }

    if data.has_change("paused") {
        body.insert(
            "paused".to_string(),
            data.get("paused").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("region") {
        body.insert(
            "region".to_string(),
            data.get("region").cloned().unwrap_or_default(),
        );
    }

    body
}

fn flatten_pagespeed_check(data: &mut ResourceData, test: &PagespeedTest) {
    // The API does not echo the region back; carry it from configuration.
    let region = data.get("region").cloned();

    data.set(
        "alert_config",
        json!([{
            "alert_bigger": test.alert_bigger,
            "alert_slower": test.alert_slower,
            "alert_smaller": test.alert_smaller,
        }]),
    );
    data.set("check_interval", json!(test.check_rate));
    data.set("contact_groups", json!(test.contact_groups));
    data.set("location", json!(test.location));
    data.set("monitored_resource", json!([{ "address": test.website_url }]));
    data.set("name", json!(test.name));
    data.set("paused", json!(test.paused));
    if let Some(region) = region {
        data.set("region", region);
    }
}

#[async_trait::async_trait]
impl Resource for PagespeedCheck {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_block(
                "alert_config",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute(
                            "alert_bigger",
                            Attribute::optional_int64()
                                .with_description(
                                    "An alert will be sent if the size of the page is larger than this value (kb)",
                                )
                                .with_default(json!(0))
                                .with_validator(Validator::IntAtLeast(0)),
                        )
                        .with_attribute(
                            "alert_slower",
                            Attribute::optional_int64()
                                .with_description(
                                    "An alert will be sent if the load time of the page exceeds this value (ms)",
                                )
                                .with_default(json!(0))
                                .with_validator(Validator::IntAtLeast(0)),
                        )
                        .with_attribute(
                            "alert_smaller",
                            Attribute::optional_int64()
                                .with_description(
                                    "An alert will be sent if the size of the page is smaller than this value (kb)",
                                )
                                .with_default(json!(0))
                                .with_validator(Validator::IntAtLeast(0)),
                        )
                        .with_description("Alert configuration block"),
                ),
            )
            .with_attribute(
                "check_interval",
                Attribute::required_int64()
                    .with_description("Number of seconds between checks")
                    .with_validator(Validator::IntInSlice(PAGESPEED_CHECK_RATES.to_vec())),
            )
            .with_attribute(
                "contact_groups",
                Attribute::optional_string_set()
                    .with_description("List of contact group IDs")
                    .with_element_validator(Validator::StringNumerical),
            )
            .with_attribute(
                "location",
                Attribute::computed_string()
                    .with_description("Assigned monitoring location on which checks will be run"),
            )
            .with_block(
                "monitored_resource",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute(
                            "address",
                            Attribute::required_string()
                                .with_description("URL or IP address of the website under test")
                                .with_force_new()
                                .with_validator(Validator::UrlOrIpAddress),
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
                "region",
                Attribute::required_string()
                    .with_description("Region on which to run checks")
                    .with_validator(Validator::StringInSlice(
                        PAGESPEED_REGIONS.iter().map(|s| s.to_string()).collect(),
                    )),
            )
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let body = Value::Object(request_body(data));
        debug!("creating pagespeed check");

        let id = client
            .create("pagespeed", &body)
            .await
            .map_err(|e| diag::from_err("failed to create pagespeed check", &e))?;

        data.set_id(id);
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("pagespeed check has no identifier")),
        };

        let payload = match client.get(&format!("pagespeed/{}", id)).await {
            Ok(payload) => payload,
            Err(ProviderError::Api(err)) if err.is_not_found() => {
                data.clear_id();
                return Ok(());
            },
            Err(err) => {
                return Err(diag::from_err("failed to get pagespeed check", &err));
            },
        };

        let test: PagespeedTest = serde_json::from_value(payload).map_err(|e| {
            diag::from_err("failed to decode pagespeed check", &ProviderError::from(e))
        })?;

        flatten_pagespeed_check(data, &test);
        Ok(())
    }

    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("pagespeed check has no identifier")),
        };

        let body = request_body(data);
        if body.is_empty() {
            debug!(%id, "no pagespeed check changes to apply");
        } else {
            debug!(%id, "updating pagespeed check");
            client
                .update(&format!("pagespeed/{}", id), &Value::Object(body))
                .await
                .map_err(|e| diag::from_err("failed to update pagespeed check", &e))?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("pagespeed check has no identifier")),
        };

        debug!(%id, "deleting pagespeed check");
        client.delete(&format!("pagespeed/{}", id)).await.map_err(|e| {
            diag::from_err(
                &format!("failed to delete pagespeed check with id {}", id),
                &e,
            )
        })
    }
}
