//! Monitoring location lookups.
//!
//! The uptime and pagespeed location endpoints share a response shape, so
//! one definition is registered twice with different endpoints. Results
//! have no upstream identity; state is keyed by a synthetic timestamp.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::DataSource;
use crate::schema::{Attribute, Block, NestedBlock, Schema, Validator};
use crate::state::ResourceData;

/// Location lookup data source, parameterised by endpoint.
pub struct MonitoringLocations {
    path: &'static str,
}

impl MonitoringLocations {
    /// Lookup against the uptime locations endpoint.
    pub fn uptime() -> Self {
        Self {
            path: "uptime-locations",
        }
    }

    /// Lookup against the pagespeed locations endpoint.
    pub fn pagespeed() -> Self {
        Self {
            path: "pagespeed-locations",
        }
    }
}

/// A monitoring location returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MonitoringLocation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ipv4: String,
    #[serde(default)]
    pub ipv6: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub region_code: String,
    #[serde(default)]
    pub status: String,
}

/// Schema block describing a single monitoring location. Locations appear
/// in multiple resources, so the structure is shared.
pub(crate) fn location_block() -> Block {
    Block::new()
        .with_attribute(
            "description",
            Attribute::computed_string().with_description("Location description"),
        )
        .with_attribute(
            "ipv4",
            Attribute::computed_string().with_description("Location IPv4 address"),
        )
        .with_attribute(
            "ipv6",
            Attribute::computed_string().with_description("Location IPv6 address"),
        )
        .with_attribute(
            "region",
            Attribute::computed_string().with_description("Location region"),
        )
        .with_attribute(
            "region_code",
            Attribute::computed_string().with_description("Location region code"),
        )
        .with_attribute(
            "status",
            Attribute::computed_string().with_description("Location status"),
        )
}

pub(crate) fn flatten_monitoring_locations(locations: &[MonitoringLocation]) -> Value {
    Value::Array(
        locations
            .iter()
            .map(|location| {
                json!({
                    "description": location.description,
                    "ipv4": location.ipv4,
                    "ipv6": location.ipv6,
                    "region": location.region,
                    "region_code": location.region_code,
                    "status": location.status,
                })
            })
            .collect(),
    )
}

#[async_trait::async_trait]
impl DataSource for MonitoringLocations {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "region_code",
                Attribute::optional_string()
                    .with_description("Location region code")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_block(
                "locations",
                NestedBlock::set(
                    location_block().with_description("List of monitoring locations"),
                ),
            )
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let region_code = data.get_str("region_code").map(str::to_string);

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(code) = region_code.as_deref() {
            query.push(("location", code));
        }

        debug!(path = self.path, "listing monitoring locations");
        let payload = client
            .get_with_query(self.path, &query)
            .await
            .map_err(|e| diag::from_err("failed to list monitoring locations", &e))?;

        let locations: Vec<MonitoringLocation> = serde_json::from_value(payload).map_err(|e| {
            diag::from_err(
                "failed to decode monitoring locations",
                &ProviderError::from(e),
            )
        })?;

        if let Some(code) = region_code {
            data.set("region_code", json!(code));
        }
        data.set("locations", flatten_monitoring_locations(&locations));
        data.set_id(Utc::now().timestamp().to_string());
        Ok(())
    }
}
