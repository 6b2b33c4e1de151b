//! Contact group lookup by identifier.

use tracing::debug;

use crate::client::ApiClient;
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::DataSource;
use crate::resources::contact_group::{flatten_contact_group, ContactGroupDetail};
use crate::schema::{Attribute, Schema, Validator};
use crate::state::ResourceData;

/// `statuscake_contact_group` data source.
pub struct ContactGroupLookup;

#[async_trait::async_trait]
impl DataSource for ContactGroupLookup {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "id",
                Attribute::required_string()
                    .with_description("Contact group ID")
                    .with_validator(Validator::StringNumerical),
            )
            .with_attribute(
                "email_addresses",
                Attribute::new(
                    crate::schema::AttributeType::set(crate::schema::AttributeType::String),
                    crate::schema::AttributeFlags::computed(),
                )
                .with_description("List of email addresses"),
            )
            .with_attribute(
                "integrations",
                Attribute::new(
                    crate::schema::AttributeType::set(crate::schema::AttributeType::String),
                    crate::schema::AttributeFlags::computed(),
                )
                .with_description("List of integration IDs"),
            )
            .with_attribute(
                "mobile_numbers",
                Attribute::new(
                    crate::schema::AttributeType::set(crate::schema::AttributeType::String),
                    crate::schema::AttributeFlags::computed(),
                )
                .with_description("List of international format mobile phone numbers"),
            )
            .with_attribute(
                "name",
                Attribute::computed_string().with_description("Name of the contact group"),
            )
            .with_attribute(
                "ping_url",
                Attribute::computed_string()
                    .with_description("URL or IP address of an endpoint to push uptime events"),
            )
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = data
            .get_str("id")
            .map(str::to_string)
            .ok_or_else(|| diag::error("contact group id is required"))?;

        debug!(%id, "looking up contact group");
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
        data.set_id(if group.id.is_empty() { id } else { group.id.clone() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_requires_numerical_id() {
        let schema = ContactGroupLookup.schema();

        assert!(crate::validation::validate(&schema, &json!({"id": "42"})).is_empty());

        let diagnostics = crate::validation::validate(&schema, &json!({"id": "not-a-number"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("id"));

        let diagnostics = crate::validation::validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
    }
}
