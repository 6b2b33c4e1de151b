//! Contact group resource.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::schema::{Attribute, Schema, Validator};
use crate::state::ResourceData;

/// `statuscake_contact_group` resource.
pub struct ContactGroup;

/// Contact group representation returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ContactGroupDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ping_url: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub mobile_numbers: Vec<String>,
}

pub(crate) fn flatten_contact_group(data: &mut ResourceData, group: &ContactGroupDetail) {
    data.set("email_addresses", json!(group.email_addresses));
    data.set("integrations", json!(group.integrations));
    data.set("mobile_numbers", json!(group.mobile_numbers));
    data.set("name", json!(group.name));
    data.set("ping_url", json!(group.ping_url.clone().unwrap_or_default()));
}

fn request_body(data: &ResourceData) -> Map<String, Value> {
    let mut body = Map::new();

    if data.has_change("email_addresses") {
        body.insert(
            "email_addresses".to_string(),
            data.get("email_addresses").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("integrations") {
        body.insert(
            "integrations".to_string(),
            data.get("integrations").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("mobile_numbers") {
        body.insert(
            "mobile_numbers".to_string(),
            data.get("mobile_numbers").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("name") {
        body.insert(
            "name".to_string(),
            data.get("name").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("ping_url") {
        body.insert(
            "ping_url".to_string(),
            data.get("ping_url").cloned().unwrap_or_default(),
        );
    }

    body
}

#[async_trait::async_trait]
impl Resource for ContactGroup {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "email_addresses",
                Attribute::optional_string_set()
                    .with_description("List of email addresses")
                    .with_element_validator(Validator::EmailAddress),
            )
            .with_attribute(
                "integrations",
                Attribute::optional_string_set()
                    .with_description("List of integration IDs")
                    .with_element_validator(Validator::StringNumerical),
            )
            .with_attribute(
                "mobile_numbers",
                Attribute::optional_string_set()
                    .with_description("List of international format mobile phone numbers")
                    .with_element_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("Name of the contact group")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "ping_url",
                Attribute::optional_string()
                    .with_description("URL or IP address of an endpoint to push uptime events")
                    .with_validator(Validator::UrlHttpOrHttps),
            )
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let body = Value::Object(request_body(data));
        debug!("creating contact group");

        let id = client
            .create("contact-groups", &body)
            .await
            .map_err(|e| diag::from_err("failed to create contact group", &e))?;

        data.set_id(id);
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("contact group has no identifier")),
        };

        let payload = match client.get(&format!("contact-groups/{}", id)).await {
            Ok(payload) => payload,
            Err(ProviderError::Api(err)) if err.is_not_found() => {
                data.clear_id();
                return Ok(());
            },
            Err(err) => {
                return Err(diag::from_err("failed to get contact group", &err));
            },
        };

        let group: ContactGroupDetail = serde_json::from_value(payload)
            .map_err(|e| diag::from_err("failed to decode contact group", &ProviderError::from(e)))?;

        flatten_contact_group(data, &group);
        Ok(())
    }

    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("contact group has no identifier")),
        };

        let body = request_body(data);
        if body.is_empty() {
            debug!(%id, "no contact group changes to apply");
        } else {
            debug!(%id, "updating contact group");
            client
                .update(&format!("contact-groups/{}", id), &Value::Object(body))
                .await
                .map_err(|e| {
                    diag::from_err(
                        &format!("failed to update contact group with id {}", id),
                        &e,
                    )
                })?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("contact group has no identifier")),
        };

        debug!(%id, "deleting contact group");
        client.delete(&format!("contact-groups/{}", id)).await.map_err(|e| {
            diag::from_err(&format!("failed to delete contact group with id {}", id), &e)
        })
    }
}
