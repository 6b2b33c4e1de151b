//! Provider registry and lifecycle entry points.
//!
//! The [`Provider`] owns the process-wide table of resource and data
//! source definitions, and the single shared [`ApiClient`] built during
//! [`configure`](Provider::configure). Hosts call the lifecycle entry
//! points directly; each validates configuration against the declared
//! schema before any codec runs.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{ApiClient, ClientOptions};
use crate::diag::{self, Diagnostics};
use crate::schema::{Attribute, ProviderSchema, Schema, Validator};
use crate::state::{apply_defaults, ResourceData};
use crate::validation::validate;

/// A manageable resource type: schema plus CRUD lifecycle.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// Schema describing the resource configuration.
    fn schema(&self) -> Schema;

    /// Create the resource upstream, record its identifier, and populate
    /// state (including computed attributes) via a read.
    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics>;

    /// Refresh state from upstream. A missing resource clears the
    /// identifier and succeeds.
    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics>;

    /// Apply configuration changes upstream. Only changed fields are sent;
    /// when nothing changed the write is skipped and state is refreshed.
    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics>;

    /// Delete the resource upstream.
    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics>;
}

/// A read-only lookup against the upstream API.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Schema describing the data source configuration.
    fn schema(&self) -> Schema;

    /// Perform the lookup and populate state.
    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics>;
}

/// Names of the registered resource and data source types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
}

/// Provider-level configuration, decoded from the host configuration
/// block. Every option falls back to a same-named `STATUSCAKE_*`
/// environment variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// API token used to authenticate requests.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Requests-per-second ceiling applied when making API calls.
    #[serde(default)]
    pub rps: Option<u32>,
    /// Maximum number of retries to perform when an API request fails.
    #[serde(default)]
    pub retries: Option<u32>,
    /// Minimum backoff period in seconds after failed API calls.
    #[serde(default)]
    pub min_backoff: Option<u64>,
    /// Maximum backoff period in seconds after failed API calls.
    #[serde(default)]
    pub max_backoff: Option<u64>,
    /// Custom endpoint to which requests will be made.
    #[serde(default)]
    pub custom_endpoint: Option<String>,
}

/// The provider: registry of resource and data source definitions plus
/// the shared API client. Built once per plugin process.
pub struct Provider {
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
    client: OnceLock<Arc<ApiClient>>,
}

impl Provider {
    /// Construct the provider with every supported resource and data
    /// source registered.
    pub fn new() -> Self {
        let mut resources: BTreeMap<&'static str, Box<dyn Resource>> = BTreeMap::new();
        resources.insert(
            "statuscake_contact_group",
            Box::new(crate::resources::contact_group::ContactGroup),
        );
        resources.insert(
            "statuscake_heartbeat_check",
            Box::new(crate::resources::heartbeat_check::HeartbeatCheck),
        );
        resources.insert(
            "statuscake_maintenance_window",
            Box::new(crate::resources::maintenance_window::MaintenanceWindow),
        );
        resources.insert(
            "statuscake_pagespeed_check",
            Box::new(crate::resources::pagespeed_check::PagespeedCheck),
        );
        resources.insert(
            "statuscake_ssl_check",
            Box::new(crate::resources::ssl_check::SslCheck),
        );
        resources.insert(
            "statuscake_uptime_check",
            Box::new(crate::resources::uptime_check::UptimeCheck),
        );

        let mut data_sources: BTreeMap<&'static str, Box<dyn DataSource>> = BTreeMap::new();
        data_sources.insert(
            "statuscake_contact_group",
            Box::new(crate::data_sources::contact_group::ContactGroupLookup),
        );
        data_sources.insert(
            "statuscake_uptime_monitoring_locations",
            Box::new(crate::data_sources::monitoring_locations::MonitoringLocations::uptime()),
        );
        data_sources.insert(
            "statuscake_pagespeed_monitoring_locations",
            Box::new(crate::data_sources::monitoring_locations::MonitoringLocations::pagespeed()),
        );

        Self {
            resources,
            data_sources,
            client: OnceLock::new(),
        }
    }

    /// Schema for the provider configuration block.
    pub fn provider_config_schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "api_token",
                Attribute::required_string()
                    .sensitive()
                    .with_description("The API token for operations")
                    .with_validator(Validator::TokenFormat {
                        min_len: 20,
                        max_len: 30,
                    }),
            )
            .with_attribute(
                "rps",
                Attribute::optional_int64()
                    .with_description("RPS limit to apply when making calls to the API")
                    .with_default(serde_json::json!(4))
                    .with_validator(Validator::IntAtLeast(1)),
            )
            .with_attribute(
                "retries",
                Attribute::optional_int64()
                    .with_description(
                        "Maximum number of retries to perform when an API request fails",
                    )
                    .with_default(serde_json::json!(3))
                    .with_validator(Validator::IntBetween(0, 10)),
            )
            .with_attribute(
                "min_backoff",
                Attribute::optional_int64()
                    .with_description("Minimum backoff period in seconds after failed API calls")
                    .with_default(serde_json::json!(1))
                    .with_validator(Validator::IntAtLeast(0)),
            )
            .with_attribute(
                "max_backoff",
                Attribute::optional_int64()
                    .with_description("Maximum backoff period in seconds after failed API calls")
                    .with_default(serde_json::json!(30))
                    .with_validator(Validator::IntAtLeast(1)),
            )
            .with_attribute(
                "custom_endpoint",
                Attribute::optional_string()
                    .with_description("Custom endpoint to which requests will be made")
                    .with_validator(Validator::UrlHttpOrHttps),
            )
    }

    /// The full provider schema: configuration, resources, data sources.
    pub fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(Self::provider_config_schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    /// Names of everything this provider can manage.
    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.resources.keys().map(|k| k.to_string()).collect(),
            data_sources: self.data_sources.keys().map(|k| k.to_string()).collect(),
        }
    }

    /// Configure the provider, building the shared API client.
    ///
    /// Missing options fall back to `STATUSCAKE_*` environment variables,
    /// then to defaults. Fails when credentials are absent or any value is
    /// out of range.
    pub fn configure(&self, config: Value) -> Result<(), Diagnostics> {
        let mut merged = match config {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(diag::error(format!(
                    "Expected provider configuration object, got {}",
                    other
                )))
            },
        };
        merge_env_defaults(&mut merged, |key| std::env::var(key).ok());

        let merged = Value::Object(merged);
        let diagnostics = validate(&Self::provider_config_schema(), &merged);
        if diag::has_errors(&diagnostics) {
            return Err(diagnostics);
        }

        let config: ProviderConfig = serde_json::from_value(merged)
            .map_err(|e| diag::error(format!("Invalid provider configuration: {}", e)))?;

        let token = match config.api_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(diag::error("credentials are not set correctly")),
        };

        let mut options = ClientOptions::new(token)
            .with_rps(config.rps.unwrap_or(4))
            .with_retries(config.retries.unwrap_or(3))
            .with_backoff(
                Duration::from_secs(config.min_backoff.unwrap_or(1)),
                Duration::from_secs(config.max_backoff.unwrap_or(30)),
            );
        if let Some(endpoint) = config.custom_endpoint {
            options = options.with_base_url(endpoint);
        }

        let client = ApiClient::new(options)
            .map_err(|e| diag::from_err("failed to build API client", &e))?;

        self.client
            .set(Arc::new(client))
            .map_err(|_| diag::error("provider is already configured"))
    }

    /// Validate a resource configuration against its schema.
    pub fn validate_resource_config(
        &self,
        type_name: &str,
        config: &Value,
    ) -> Result<Diagnostics, Diagnostics> {
        let resource = self.resource(type_name)?;
        Ok(validate(&resource.schema(), config))
    }

    /// Validate a data source configuration against its schema.
    pub fn validate_data_source_config(
        &self,
        type_name: &str,
        config: &Value,
    ) -> Result<Diagnostics, Diagnostics> {
        let data_source = self.data_source(type_name)?;
        Ok(validate(&data_source.schema(), config))
    }

    /// Create a new resource and return its persisted state.
    pub async fn create(&self, type_name: &str, config: Value) -> Result<Value, Diagnostics> {
        let resource = self.resource(type_name)?;
        let schema = resource.schema();
        let config = self.validated(&schema, config)?;

        let mut data = ResourceData::new(config, Value::Null);
        let client = self.client()?;
        resource.create(&client, &mut data).await?;
        data.into_state()
            .ok_or_else(|| diag::error("created resource is missing upstream"))
    }

    /// Refresh a resource's state from upstream.
    ///
    /// Returns `Ok(None)` when the resource no longer exists; the host
    /// drops it from state and schedules recreation on the next apply.
    pub async fn read(&self, type_name: &str, state: Value) -> Result<Option<Value>, Diagnostics> {
        let resource = self.resource(type_name)?;

        let mut data = ResourceData::new(state.clone(), state);
        if data.id().is_none() {
            return Ok(None);
        }
        let client = self.client()?;
        resource.read(&client, &mut data).await?;
        Ok(data.into_state())
    }

    /// Update an existing resource and return its refreshed state.
    pub async fn update(
        &self,
        type_name: &str,
        state: Value,
        config: Value,
    ) -> Result<Value, Diagnostics> {
        let resource = self.resource(type_name)?;
        let schema = resource.schema();
        let config = self.validated(&schema, config)?;

        let mut data = ResourceData::new(config, state);
        if data.id().is_none() {
            return Err(diag::error(format!(
                "cannot update {} without an identifier",
                type_name
            )));
        }
        let client = self.client()?;
        resource.update(&client, &mut data).await?;
        data.into_state()
            .ok_or_else(|| diag::error("updated resource is missing upstream"))
    }

    /// Delete a resource. Local state is discarded by the host once this
    /// returns successfully.
    pub async fn delete(&self, type_name: &str, state: Value) -> Result<(), Diagnostics> {
        let resource = self.resource(type_name)?;

        let mut data = ResourceData::new(state.clone(), state);
        if data.id().is_none() {
            return Err(diag::error(format!(
                "cannot delete {} without an identifier",
                type_name
            )));
        }
        let client = self.client()?;
        resource.delete(&client, &mut data).await
    }

    /// Import an existing resource by externally supplied identifier.
    pub async fn import_resource(
        &self,
        type_name: &str,
        id: &str,
    ) -> Result<Option<Value>, Diagnostics> {
        let resource = self.resource(type_name)?;

        let mut data = ResourceData::from_id(id);
        let client = self.client()?;
        resource.read(&client, &mut data).await?;
        Ok(data.into_state())
    }

    /// Execute a data source lookup.
    ///
    /// Returns `Ok(None)` when the looked-up object does not exist.
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: Value,
    ) -> Result<Option<Value>, Diagnostics> {
        let data_source = self.data_source(type_name)?;
        let schema = data_source.schema();
        let config = self.validated(&schema, config)?;

        let mut data = ResourceData::new(config, Value::Null);
        let client = self.client()?;
        data_source.read(&client, &mut data).await?;
        Ok(data.into_state())
    }

    fn validated(&self, schema: &Schema, config: Value) -> Result<Value, Diagnostics> {
        let diagnostics = validate(schema, &config);
        if diag::has_errors(&diagnostics) {
            return Err(diagnostics);
        }
        Ok(apply_defaults(schema, config))
    }

    fn resource(&self, type_name: &str) -> Result<&dyn Resource, Diagnostics> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| diag::error(format!("Unknown resource type: {}", type_name)))
    }

    fn data_source(&self, type_name: &str) -> Result<&dyn DataSource, Diagnostics> {
        self.data_sources
            .get(type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| diag::error(format!("Unknown data source type: {}", type_name)))
    }

    fn client(&self) -> Result<Arc<ApiClient>, Diagnostics> {
        self.client
            .get()
            .cloned()
            .ok_or_else(|| diag::error("provider is not configured"))
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill missing provider options from environment variables.
fn merge_env_defaults(
    config: &mut Map<String, Value>,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let string_keys = [("api_token", "STATUSCAKE_API_TOKEN"),
        ("custom_endpoint", "STATUSCAKE_CUSTOM_ENDPOINT")];
    for (key, var) in string_keys {
        let absent = matches!(config.get(key), None | Some(Value::Null));
        if absent {
            if let Some(value) = lookup(var) {
                config.insert(key.to_string(), Value::String(value));
                debug!(key, "provider option taken from environment");
            }
        }
    }

    let int_keys = [
        ("rps", "STATUSCAKE_RPS"),
        ("retries", "STATUSCAKE_RETRIES"),
        ("min_backoff", "STATUSCAKE_MIN_BACKOFF"),
        ("max_backoff", "STATUSCAKE_MAX_BACKOFF"),
    ];
    for (key, var) in int_keys {
        let absent = matches!(config.get(key), None | Some(Value::Null));
        if absent {
            if let Some(value) = lookup(var).and_then(|v| v.parse::<i64>().ok()) {
                config.insert(key.to_string(), Value::Number(value.into()));
                debug!(key, "provider option taken from environment");
            }
        }
    }
}
