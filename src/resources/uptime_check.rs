//! Uptime check resource.
//!
//! An uptime check is configured with exactly one of four check-type
//! blocks (`dns_check`, `http_check`, `icmp_check`, `tcp_check`). The API
//! stores all four shapes in one flat payload discriminated by the
//! `test_type` field, so the blocks are modelled as a tagged union:
//! expansion selects the variant from configuration, flattening selects it
//! from the payload discriminator alone.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::ApiClient;
use crate::data_sources::monitoring_locations::{
    flatten_monitoring_locations, location_block, MonitoringLocation,
};
use crate::diag::{self, Diagnostics};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::schema::{
    Attribute, AttributeType, Block, NestedBlock, Schema, SchemaConstraint, Validator,
};
use crate::state::ResourceData;
use crate::util::merge;

/// Check rates accepted by the uptime endpoint, in seconds.
const UPTIME_CHECK_RATES: [i64; 7] = [30, 60, 300, 900, 1800, 3600, 86400];

const MATCHER_CONTAINS: &str = "CONTAINS_STRING";
const MATCHER_NO_CONTAINS: &str = "NOT_CONTAINS_STRING";

const TEST_TYPE_DNS: &str = "DNS";
const TEST_TYPE_PING: &str = "PING";

fn is_http_check_type(test_type: &str) -> bool {
    test_type == "HTTP" || test_type == "HEAD"
}

fn is_tcp_check_type(test_type: &str) -> bool {
    test_type == "TCP" || test_type == "SMTP" || test_type == "SSH"
}

/// `statuscake_uptime_check` resource.
pub struct UptimeCheck;

/// Uptime check representation returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
struct UptimeTest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    test_type: String,
    #[serde(default)]
    check_rate: i64,
    #[serde(default)]
    confirmation: i64,
    #[serde(default)]
    contact_groups: Vec<String>,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    trigger_rate: i64,
    #[serde(default)]
    website_url: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    dns_ips: Vec<String>,
    #[serde(default)]
    dns_server: Option<String>,
    #[serde(default)]
    find_string: Option<String>,
    #[serde(default)]
    do_not_find: bool,
    #[serde(default)]
    include_header: bool,
    #[serde(default)]
    use_jar: bool,
    #[serde(default)]
    final_endpoint: Option<String>,
    #[serde(default)]
    follow_redirects: bool,
    #[serde(default)]
    custom_header: Option<String>,
    #[serde(default)]
    post_body: Option<String>,
    #[serde(default)]
    post_raw: Option<String>,
    #[serde(default)]
    status_codes: Vec<String>,
    #[serde(default)]
    timeout: i64,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    enable_ssl_alert: bool,
    #[serde(default)]
    port: Option<i64>,
    #[serde(default)]
    servers: Vec<MonitoringLocation>,
}

// Typed views of the configuration blocks. Configuration crosses the
// boundary as JSON and is decoded here before any codec logic runs.

#[derive(Debug, Clone, Deserialize)]
struct BasicAuthConfig {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentMatchersConfig {
    #[serde(default)]
    content: String,
    #[serde(default)]
    include_headers: bool,
    #[serde(default)]
    matcher: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DnsCheckConfig {
    #[serde(default)]
    dns_ips: Vec<String>,
    #[serde(default)]
    dns_server: String,
}

#[derive(Debug, Clone, Deserialize)]
struct HttpCheckConfig {
    #[serde(default)]
    basic_authentication: Vec<BasicAuthConfig>,
    #[serde(default)]
    content_matchers: Vec<ContentMatchersConfig>,
    #[serde(default)]
    enable_cookies: bool,
    #[serde(default)]
    final_endpoint: String,
    #[serde(default)]
    follow_redirects: bool,
    #[serde(default)]
    request_headers: Map<String, Value>,
    #[serde(default)]
    request_method: String,
    #[serde(default)]
    request_payload: Map<String, Value>,
    #[serde(default)]
    request_payload_raw: String,
    #[serde(default)]
    status_codes: Vec<String>,
    #[serde(default)]
    timeout: i64,
    #[serde(default)]
    user_agent: String,
    #[serde(default)]
    validate_ssl: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct TcpCheckConfig {
    #[serde(default)]
    authentication: Vec<BasicAuthConfig>,
    #[serde(default)]
    port: i64,
    #[serde(default)]
    protocol: String,
    #[serde(default)]
    timeout: i64,
}

/// The four mutually exclusive check configurations.
#[derive(Debug, Clone)]
enum CheckKind {
    Dns(DnsCheckConfig),
    Http(HttpCheckConfig),
    Icmp,
    Tcp(TcpCheckConfig),
}

/// Select the configured check kind. Schema validation has already
/// guaranteed at most one block is present.
fn check_kind(data: &ResourceData) -> Result<Option<CheckKind>, ProviderError> {
    if let Some(block) = data.get("dns_check.0") {
        return Ok(Some(CheckKind::Dns(serde_json::from_value(block.clone())?)));
    }
    if let Some(block) = data.get("http_check.0") {
        return Ok(Some(CheckKind::Http(serde_json::from_value(block.clone())?)));
    }
    if data.get("icmp_check.0").is_some() {
        return Ok(Some(CheckKind::Icmp));
    }
    if let Some(block) = data.get("tcp_check.0") {
        return Ok(Some(CheckKind::Tcp(serde_json::from_value(block.clone())?)));
    }
    Ok(None)
}

/// Map a content matcher token onto the inverted payload flag. The two
/// tokens form a strict bijection with the boolean.
fn expand_matcher(token: &str) -> Result<bool, ProviderError> {
    match token {
        MATCHER_CONTAINS => Ok(false),
        MATCHER_NO_CONTAINS => Ok(true),
        other => Err(ProviderError::Expansion(format!(
            "unknown content matcher {:?}",
            other
        ))),
    }
}

fn flatten_matcher(do_not_find: bool) -> &'static str {
    if do_not_find {
        MATCHER_NO_CONTAINS
    } else {
        MATCHER_CONTAINS
    }
}

/// Serialize a string map to the JSON-object string the API expects. An
/// empty map expands to the empty string, meaning "unset".
fn expand_json_map(map: &Map<String, Value>) -> Result<String, ProviderError> {
    if map.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(map)?)
}

/// Deserialize a JSON-object string from the API. Malformed input (the
/// server legitimately returns an empty string for "unset") yields an
/// empty map rather than an error.
fn flatten_json_map(raw: Option<&str>) -> Value {
    match raw.and_then(|s| serde_json::from_str::<Map<String, Value>>(s).ok()) {
        Some(map) => Value::Object(map),
        None => json!({}),
    }
}

fn expand_status_codes(codes: &[String]) -> String {
    let mut codes = codes.to_vec();
    codes.sort();
    codes.join(",")
}

fn expand_basic_auth(auth: Option<&BasicAuthConfig>, data: &ResourceData) -> Map<String, Value> {
    let mut fragment = Map::new();
    let Some(auth) = auth else {
        return fragment;
    };

    if data.has_changes(&[
        "http_check.0.basic_authentication.0.password",
        "tcp_check.0.authentication.0.password",
    ]) {
        fragment.insert("basic_password".to_string(), json!(auth.password));
    }
    if data.has_changes(&[
        "http_check.0.basic_authentication.0.username",
        "tcp_check.0.authentication.0.username",
    ]) {
        fragment.insert("basic_username".to_string(), json!(auth.username));
    }

    fragment
}

fn expand_dns_check(cfg: &DnsCheckConfig, data: &ResourceData) -> Map<String, Value> {
    let mut fragment = Map::new();
    fragment.insert("test_type".to_string(), json!(TEST_TYPE_DNS));

    if data.has_change("dns_check.0.dns_ips") {
        fragment.insert("dns_ips".to_string(), json!(cfg.dns_ips));
    }
    if data.has_change("dns_check.0.dns_server") {
        fragment.insert("dns_server".to_string(), json!(cfg.dns_server));
    }

    fragment
}

fn expand_http_check(
    cfg: &HttpCheckConfig,
    data: &ResourceData,
) -> Result<Map<String, Value>, ProviderError> {
    let mut fragment = Map::new();

    if data.has_change("http_check.0.basic_authentication") {
        merge(
            &mut fragment,
            expand_basic_auth(cfg.basic_authentication.first(), data),
        );
    }

    if data.has_change("http_check.0.content_matchers") {
        if let Some(matchers) = cfg.content_matchers.first() {
            if data.has_change("http_check.0.content_matchers.0.content") {
                fragment.insert("find_string".to_string(), json!(matchers.content));
            }
            if data.has_change("http_check.0.content_matchers.0.include_headers") {
                fragment.insert("include_header".to_string(), json!(matchers.include_headers));
            }
            if data.has_change("http_check.0.content_matchers.0.matcher") {
                fragment.insert(
                    "do_not_find".to_string(),
                    json!(expand_matcher(&matchers.matcher)?),
                );
            }
        }
    }

    if data.has_change("http_check.0.enable_cookies") {
        fragment.insert("use_jar".to_string(), json!(cfg.enable_cookies));
    }
    if data.has_change("http_check.0.final_endpoint") {
        fragment.insert("final_endpoint".to_string(), json!(cfg.final_endpoint));
    }
    if data.has_change("http_check.0.follow_redirects") {
        fragment.insert("follow_redirects".to_string(), json!(cfg.follow_redirects));
    }
    if data.has_change("http_check.0.request_headers") {
        fragment.insert(
            "custom_header".to_string(),
            json!(expand_json_map(&cfg.request_headers)?),
        );
    }
    if data.has_change("http_check.0.request_method") {
        fragment.insert("test_type".to_string(), json!(cfg.request_method));
    }
    if data.has_change("http_check.0.request_payload") {
        fragment.insert(
            "post_body".to_string(),
            json!(expand_json_map(&cfg.request_payload)?),
        );
    }
    if data.has_change("http_check.0.request_payload_raw") {
        fragment.insert("post_raw".to_string(), json!(cfg.request_payload_raw));
    }
    // status_codes is also computed: when unset the server-assigned values
    // persisted in state must not be diffed against the empty configuration.
    if !cfg.status_codes.is_empty() && data.has_change("http_check.0.status_codes") {
        fragment.insert(
            "status_codes_csv".to_string(),
            json!(expand_status_codes(&cfg.status_codes)),
        );
    }
    if data.has_change("http_check.0.timeout") {
        fragment.insert("timeout".to_string(), json!(cfg.timeout));
    }
    if data.has_change("http_check.0.user_agent") {
        fragment.insert("user_agent".to_string(), json!(cfg.user_agent));
    }
    if data.has_change("http_check.0.validate_ssl") {
        fragment.insert("enable_ssl_alert".to_string(), json!(cfg.validate_ssl));
    }

    Ok(fragment)
}

fn expand_tcp_check(cfg: &TcpCheckConfig, data: &ResourceData) -> Map<String, Value> {
    let mut fragment = Map::new();

    if data.has_change("tcp_check.0.authentication") {
        merge(
            &mut fragment,
            expand_basic_auth(cfg.authentication.first(), data),
        );
    }
    if data.has_change("tcp_check.0.port") {
        fragment.insert("port".to_string(), json!(cfg.port));
    }
    if data.has_change("tcp_check.0.protocol") {
        fragment.insert("test_type".to_string(), json!(cfg.protocol));
    }
    if data.has_change("tcp_check.0.timeout") {
        fragment.insert("timeout".to_string(), json!(cfg.timeout));
    }

    fragment
}

fn expand_check_kind(data: &ResourceData) -> Result<Map<String, Value>, ProviderError> {
    let Some(kind) = check_kind(data)? else {
        return Ok(Map::new());
    };

    match kind {
        CheckKind::Dns(cfg) if data.has_change("dns_check") => Ok(expand_dns_check(&cfg, data)),
        CheckKind::Http(cfg) if data.has_change("http_check") => expand_http_check(&cfg, data),
        CheckKind::Icmp if data.has_change("icmp_check") => {
            let mut fragment = Map::new();
            fragment.insert("test_type".to_string(), json!(TEST_TYPE_PING));
            Ok(fragment)
        },
        CheckKind::Tcp(cfg) if data.has_change("tcp_check") => Ok(expand_tcp_check(&cfg, data)),
        _ => Ok(Map::new()),
    }
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
    if data.has_change("monitored_resource.0.host") {
        fragment.insert(
            "host".to_string(),
            data.get("monitored_resource.0.host").cloned().unwrap_or_default(),
        );
    }

    fragment
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    Update,
}

fn request_body(data: &ResourceData, op: Operation) -> Result<Map<String, Value>, Diagnostics> {
    let mut body = Map::new();

    if data.has_change("check_interval") {
        body.insert(
            "check_rate".to_string(),
            data.get("check_interval").cloned().unwrap_or_default(),
        );
    }

    // Always sent on create: the API does not apply a usable default when
    // confirmation or trigger_rate is omitted.
    if op == Operation::Create || data.has_change("confirmation") {
        body.insert(
            "confirmation".to_string(),
            data.get("confirmation").cloned().unwrap_or(json!(0)),
        );
    }

    if data.has_change("contact_groups") {
        body.insert(
            "contact_groups".to_string(),
            data.get("contact_groups").cloned().unwrap_or_default(),
        );
    }

    let fragment = expand_check_kind(data)
        .map_err(|e| diag::from_err("failed to expand check configuration", &e))?;
    merge(&mut body, fragment);

    if data.has_change("monitored_resource") {
        merge(&mut body, expand_monitored_resource(data));
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
    if data.has_change("regions") {
        body.insert(
            "regions".to_string(),
            data.get("regions").cloned().unwrap_or_default(),
        );
    }
    if data.has_change("tags") {
        body.insert(
            "tags".to_string(),
            data.get("tags").cloned().unwrap_or_default(),
        );
    }

    if op == Operation::Create || data.has_change("trigger_rate") {
        body.insert(
            "trigger_rate".to_string(),
            data.get("trigger_rate").cloned().unwrap_or(json!(0)),
        );
    }

    Ok(body)
}

fn flatten_dns_check(test: &UptimeTest) -> Value {
    if test.test_type != TEST_TYPE_DNS {
        return json!([]);
    }
    json!([{
        "dns_ips": test.dns_ips,
        "dns_server": test.dns_server.clone().unwrap_or_default(),
    }])
}

fn flatten_content_matchers(test: &UptimeTest) -> Value {
    let find_string = test.find_string.clone().unwrap_or_default();
    if find_string.is_empty() {
        return json!([]);
    }
    json!([{
        "content": find_string,
        "include_headers": test.include_header,
        "matcher": flatten_matcher(test.do_not_find),
    }])
}

/// Basic auth credentials are write-only upstream, so the block is carried
/// over from configuration rather than the payload.
fn flatten_http_check(test: &UptimeTest, auth: Value) -> Value {
    if !is_http_check_type(&test.test_type) {
        return json!([]);
    }
    json!([{
        "basic_authentication": auth,
        "content_matchers": flatten_content_matchers(test),
        "enable_cookies": test.use_jar,
        "final_endpoint": test.final_endpoint.clone().unwrap_or_default(),
        "follow_redirects": test.follow_redirects,
        "request_headers": flatten_json_map(test.custom_header.as_deref()),
        "request_method": test.test_type,
        "request_payload": flatten_json_map(test.post_body.as_deref()),
        "request_payload_raw": test.post_raw.clone().unwrap_or_default(),
        "status_codes": test.status_codes,
        "timeout": test.timeout,
        "user_agent": test.user_agent.clone().unwrap_or_default(),
        "validate_ssl": test.enable_ssl_alert,
    }])
}

fn flatten_icmp_check(test: &UptimeTest) -> Value {
    if test.test_type != TEST_TYPE_PING {
        return json!([]);
    }
    json!([{ "enabled": true }])
}

fn flatten_tcp_check(test: &UptimeTest, auth: Value) -> Value {
    if !is_tcp_check_type(&test.test_type) {
        return json!([]);
    }
    json!([{
        "authentication": auth,
        "port": test.port.unwrap_or_default(),
        "protocol": test.test_type,
        "timeout": test.timeout,
    }])
}

fn flatten_uptime_check(data: &mut ResourceData, test: &UptimeTest) {
    let http_auth = data
        .get("http_check.0.basic_authentication")
        .cloned()
        .unwrap_or(json!([]));
    let tcp_auth = data
        .get("tcp_check.0.authentication")
        .cloned()
        .unwrap_or(json!([]));
    // Regions are accepted on write but never echoed back.
    let regions = data.get("regions").cloned();

    data.set("check_interval", json!(test.check_rate));
    data.set("confirmation", json!(test.confirmation));
    data.set("contact_groups", json!(test.contact_groups));
    data.set("dns_check", flatten_dns_check(test));
    data.set("http_check", flatten_http_check(test, http_auth));
    data.set("icmp_check", flatten_icmp_check(test));
    data.set("locations", flatten_monitoring_locations(&test.servers));
    data.set(
        "monitored_resource",
        json!([{
            "address": test.website_url,
            "host": test.host.clone().unwrap_or_default(),
        }]),
    );
    data.set("name", json!(test.name));
    data.set("paused", json!(test.paused));
    if let Some(regions) = regions {
        data.set("regions", regions);
    }
    data.set("tags", json!(test.tags));
    data.set("tcp_check", flatten_tcp_check(test, tcp_auth));
    data.set("trigger_rate", json!(test.trigger_rate));
}

/// Basic authentication appears in both the HTTP and TCP blocks, so its
/// structure is shared.
fn basic_auth_block() -> Block {
    Block::new()
        .with_attribute("username", Attribute::required_string())
        .with_attribute("password", Attribute::required_string().sensitive())
}

fn dns_check_block() -> NestedBlock {
    NestedBlock::single(
        Block::new()
            .with_attribute(
                "dns_ips",
                Attribute::new(
                    AttributeType::set(AttributeType::String),
                    crate::schema::AttributeFlags::required(),
                )
                .with_description("List of IP addresses to compare against returned DNS records")
                .with_element_validator(Validator::IpAddress),
            )
            .with_attribute(
                "dns_server",
                Attribute::optional_string()
                    .with_description("FQDN or IP address of the nameserver to query")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_description("DNS check configuration block"),
    )
    .with_force_new()
}

fn http_check_block() -> NestedBlock {
    NestedBlock::single(
        Block::new()
            .with_block(
                "basic_authentication",
                NestedBlock::single(
                    basic_auth_block()
                        .with_description("Basic Authentication (RFC7235) configuration block"),
                ),
            )
            .with_block(
                "content_matchers",
                NestedBlock::single(
                    Block::new()
                        .with_attribute(
                            "content",
                            Attribute::required_string()
                                .with_description(
                                    "String to look for within the response. Considered down if not found",
                                )
                                .with_validator(Validator::StringNotEmpty),
                        )
                        .with_attribute(
                            "include_headers",
                            Attribute::optional_bool()
                                .with_description("Include header content in string match search")
                                .with_default(json!(false)),
                        )
                        .with_attribute(
                            "matcher",
                            Attribute::optional_string()
                                .with_description(
                                    "Whether to consider the check as down if the content is present within the response",
                                )
                                .with_default(json!(MATCHER_CONTAINS))
                                .with_validator(Validator::StringInSlice(vec![
                                    MATCHER_CONTAINS.to_string(),
                                    MATCHER_NO_CONTAINS.to_string(),
                                ])),
                        )
                        .with_description("Content matcher configuration block"),
                ),
            )
            .with_attribute(
                "enable_cookies",
                Attribute::optional_bool()
                    .with_description("Whether to enable cookie storage")
                    .with_default(json!(false)),
            )
            .with_attribute(
                "final_endpoint",
                Attribute::optional_string()
                    .with_description("Specify where the redirect chain should end")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "follow_redirects",
                Attribute::optional_bool()
                    .with_description("Whether to follow redirects when testing")
                    .with_default(json!(false)),
            )
            .with_attribute(
                "request_headers",
                Attribute::new(
                    AttributeType::map(AttributeType::String),
                    crate::schema::AttributeFlags::optional(),
                )
                .with_description("Represents headers to be sent when making requests"),
            )
            .with_attribute(
                "request_method",
                Attribute::optional_string()
                    .with_description("Type of HTTP check. Either HTTP, or HEAD")
                    .with_default(json!("HTTP"))
                    .with_force_new()
                    .with_validator(Validator::StringInSlice(vec![
                        "HTTP".to_string(),
                        "HEAD".to_string(),
                    ])),
            )
            .with_attribute(
                "request_payload",
                Attribute::new(
                    AttributeType::map(AttributeType::String),
                    crate::schema::AttributeFlags::optional(),
                )
                .with_description(
                    "Payload submitted with the request. Setting this updates the check to use the HTTP POST verb",
                ),
            )
            .with_attribute(
                "request_payload_raw",
                Attribute::optional_string()
                    .with_description(
                        "Raw payload submitted with the request. Setting this updates the check to use the HTTP POST verb",
                    )
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "status_codes",
                Attribute::new(
                    AttributeType::set(AttributeType::String),
                    crate::schema::AttributeFlags::optional_computed(),
                )
                .with_description(
                    "List of status codes that trigger an alert. Once set, the default status codes cannot be restored",
                )
                .with_element_validator(Validator::StringNumerical),
            )
            .with_attribute(
                "timeout",
                Attribute::optional_int64()
                    .with_description("The number of seconds to wait to receive the first byte")
                    .with_default(json!(15))
                    .with_validator(Validator::IntBetween(5, 75)),
            )
            .with_attribute(
                "user_agent",
                Attribute::optional_string()
                    .with_description("Custom user agent string set when testing")
                    .with_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "validate_ssl",
                Attribute::optional_bool()
                    .with_description(
                        "Whether to send an alert if the SSL certificate is soon to expire",
                    )
                    .with_default(json!(false)),
            )
            .with_description("HTTP check configuration block"),
    )
    .with_force_new()
}

fn icmp_check_block() -> NestedBlock {
    // There are no special fields for an ICMP check. All that is required
    // is the address supplied in the monitored_resource block.
    NestedBlock::single(
        Block::new()
            .with_attribute(
                "enabled",
                Attribute::optional_bool()
                    .with_description("Dummy attribute to allow for a nested block")
                    .with_default(json!(true)),
            )
            .with_description("ICMP check configuration block"),
    )
    .with_force_new()
}

fn tcp_check_block() -> NestedBlock {
    NestedBlock::single(
        Block::new()
            .with_block(
                "authentication",
                NestedBlock::single(
                    basic_auth_block().with_description("Authentication configuration block"),
                ),
            )
            .with_attribute(
                "port",
                Attribute::required_int64()
                    .with_description("Destination port for TCP checks")
                    .with_validator(Validator::PortNumber),
            )
            .with_attribute(
                "protocol",
                Attribute::optional_string()
                    .with_description("Type of TCP check. Either SMTP, SSH or TCP")
                    .with_default(json!("TCP"))
                    .with_force_new()
                    .with_validator(Validator::StringInSlice(vec![
                        "SMTP".to_string(),
                        "SSH".to_string(),
                        "TCP".to_string(),
                    ])),
            )
            .with_attribute(
                "timeout",
                Attribute::optional_int64()
                    .with_description("The number of seconds to wait to receive the first byte")
                    .with_default(json!(15))
                    .with_validator(Validator::IntBetween(5, 75)),
            )
            .with_description("TCP check configuration block"),
    )
    .with_force_new()
}

#[async_trait::async_trait]
impl Resource for UptimeCheck {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "check_interval",
                Attribute::required_int64()
                    .with_description("Number of seconds between checks")
                    .with_validator(Validator::IntInSlice(UPTIME_CHECK_RATES.to_vec())),
            )
            .with_attribute(
                "confirmation",
                Attribute::optional_int64()
                    .with_description(
                        "Number of confirmation servers to confirm downtime before an alert is triggered",
                    )
                    .with_default(json!(2))
                    .with_validator(Validator::IntBetween(0, 3)),
            )
            .with_attribute(
                "contact_groups",
                Attribute::optional_string_set()
                    .with_description("List of contact group IDs")
                    .with_element_validator(Validator::StringNumerical),
            )
            .with_block("dns_check", dns_check_block())
            .with_block("http_check", http_check_block())
            .with_block("icmp_check", icmp_check_block())
            .with_block(
                "locations",
                NestedBlock::set(
                    location_block().with_description(
                        "List of assigned monitoring locations on which to run checks",
                    ),
                ),
            )
            .with_block(
                "monitored_resource",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute(
                            "address",
                            Attribute::required_string()
                                .with_description("URL, FQDN, or IP address of the server under test")
                                .with_validator(Validator::StringNotEmpty),
                        )
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
                "regions",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    crate::schema::AttributeFlags::optional(),
                )
                .with_description("List of regions on which to run checks")
                .with_element_validator(Validator::StringNotEmpty),
            )
            .with_attribute(
                "tags",
                Attribute::optional_string_set()
                    .with_description("List of tags")
                    .with_element_validator(Validator::StringNotEmpty),
            )
            .with_block("tcp_check", tcp_check_block())
            .with_attribute(
                "trigger_rate",
                Attribute::optional_int64()
                    .with_description("The number of minutes to wait before sending an alert")
                    .with_default(json!(0))
                    .with_validator(Validator::IntBetween(0, 60)),
            )
            .with_constraint(SchemaConstraint::ExactlyOneOf(vec![
                "dns_check".to_string(),
                "http_check".to_string(),
                "icmp_check".to_string(),
                "tcp_check".to_string(),
            ]))
            .with_constraint(SchemaConstraint::ConflictsWith(vec![
                "http_check.0.request_payload".to_string(),
                "http_check.0.request_payload_raw".to_string(),
            ]))
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let body = Value::Object(request_body(data, Operation::Create)?);
        debug!("creating uptime check");

        let id = client
            .create("uptime", &body)
            .await
            .map_err(|e| diag::from_err("failed to create uptime check", &e))?;

        data.set_id(id);
        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("uptime check has no identifier")),
        };

        let payload = match client.get(&format!("uptime/{}", id)).await {
            Ok(payload) => payload,
            Err(ProviderError::Api(err)) if err.is_not_found() => {
                data.clear_id();
                return Ok(());
            },
            Err(err) => {
                return Err(diag::from_err("failed to get uptime check with ID", &err));
            },
        };

        let test: UptimeTest = serde_json::from_value(payload)
            .map_err(|e| diag::from_err("failed to decode uptime check", &ProviderError::from(e)))?;

        flatten_uptime_check(data, &test);
        Ok(())
    }

    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("uptime check has no identifier")),
        };

        let body = request_body(data, Operation::Update)?;
        if body.is_empty() {
            debug!(%id, "no uptime check changes to apply");
        } else {
            debug!(%id, "updating uptime check");
            client
                .update(&format!("uptime/{}", id), &Value::Object(body))
                .await
                .map_err(|e| {
                    diag::from_err(&format!("failed to update uptime check with id {}", id), &e)
                })?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<(), Diagnostics> {
        let id = match data.id() {
            Some(id) => id.to_string(),
            None => return Err(diag::error("uptime check has no identifier")),
        };

        debug!(%id, "deleting uptime check");
        client.delete(&format!("uptime/{}", id)).await.map_err(|e| {
            diag::from_err(&format!("failed to delete uptime check with id {}", id), &e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::apply_defaults;
    use proptest::prelude::*;

    fn http_config() -> Value {
        json!({
            "name": "example",
            "check_interval": 300,
            "monitored_resource": [{"address": "https://example.com"}],
            "http_check": [{}]
        })
    }

    fn defaulted(config: Value) -> Value {
        apply_defaults(&UptimeCheck.schema(), config)
    }

    #[test]
    fn test_create_body_for_http_check() {
        let data = ResourceData::new(defaulted(http_config()), Value::Null);
        let body = request_body(&data, Operation::Create).unwrap();

        assert_eq!(body["name"], "example");
        assert_eq!(body["check_rate"], 300);
        assert_eq!(body["website_url"], "https://example.com");
        assert_eq!(body["test_type"], "HTTP");
        assert_eq!(body["timeout"], 15);

        // Included on create regardless of diff state.
        assert_eq!(body["confirmation"], 2);
        assert_eq!(body["trigger_rate"], 0);

        // Unset fields stay out of the payload.
        assert!(!body.contains_key("paused"));
        assert!(!body.contains_key("tags"));
        assert!(!body.contains_key("find_string"));
    }

    #[test]
    fn test_partial_update_diff() {
        let prior = json!({
            "id": "42",
            "name": "example",
            "check_interval": 300,
            "paused": false,
            "tags": ["a"],
            "monitored_resource": [{"address": "https://example.com", "host": ""}],
            "http_check": [{"timeout": 15, "request_method": "HTTP"}]
        });
        let config = defaulted(json!({
            "name": "example",
            "check_interval": 300,
            "paused": false,
            "tags": ["a", "b"],
            "monitored_resource": [{"address": "https://example.com"}],
            "http_check": [{}]
        }));

        let data = ResourceData::new(config, prior);
        let body = request_body(&data, Operation::Update).unwrap();

        assert_eq!(body.len(), 1);
        assert_eq!(body["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_no_change_update_is_empty() {
        let config = defaulted(http_config());
        let mut prior = config.clone();
        prior["id"] = json!("42");

        let data = ResourceData::new(config, prior);
        let body = request_body(&data, Operation::Update).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_unset_status_codes_are_not_clobbered_on_update() {
        let mut prior = defaulted(http_config());
        prior["id"] = json!("42");
        prior["http_check"][0]["status_codes"] = json!(["500", "501"]);

        let mut config = defaulted(http_config());
        config["paused"] = json!(true);

        let data = ResourceData::new(config, prior);
        let body = request_body(&data, Operation::Update).unwrap();

        assert_eq!(body.len(), 1);
        assert_eq!(body["paused"], true);
    }

    #[test]
    fn test_dns_check_sets_discriminator() {
        let config = defaulted(json!({
            "name": "example",
            "check_interval": 300,
            "monitored_resource": [{"address": "example.com"}],
            "dns_check": [{"dns_ips": ["1.2.3.4", "5.6.7.8"]}]
        }));
        let data = ResourceData::new(config, Value::Null);
        let body = request_body(&data, Operation::Create).unwrap();

        assert_eq!(body["test_type"], "DNS");
        assert_eq!(body["dns_ips"], json!(["1.2.3.4", "5.6.7.8"]));
        assert!(!body.contains_key("dns_server"));
    }

    #[test]
    fn test_icmp_check_sets_discriminator() {
        let config = defaulted(json!({
            "name": "example",
            "check_interval": 300,
            "monitored_resource": [{"address": "203.0.113.14"}],
            "icmp_check": [{}]
        }));
        let data = ResourceData::new(config, Value::Null);
        let body = request_body(&data, Operation::Create).unwrap();

        assert_eq!(body["test_type"], "PING");
    }

    #[test]
    fn test_tcp_check_includes_auth() {
        let config = defaulted(json!({
            "name": "mail",
            "check_interval": 300,
            "monitored_resource": [{"address": "mail.example.com"}],
            "tcp_check": [{
                "port": 587,
                "protocol": "SMTP",
                "authentication": [{"username": "user", "password": "hunter2"}]
            }]
        }));
        let data = ResourceData::new(config, Value::Null);
        let body = request_body(&data, Operation::Create).unwrap();

        assert_eq!(body["test_type"], "SMTP");
        assert_eq!(body["port"], 587);
        assert_eq!(body["basic_username"], "user");
        assert_eq!(body["basic_password"], "hunter2");
    }

    #[test]
    fn test_matcher_bijection() {
        assert_eq!(expand_matcher(MATCHER_CONTAINS).unwrap(), false);
        assert_eq!(expand_matcher(MATCHER_NO_CONTAINS).unwrap(), true);
        assert!(expand_matcher("MATCHES_REGEX").is_err());

        assert_eq!(flatten_matcher(false), MATCHER_CONTAINS);
        assert_eq!(flatten_matcher(true), MATCHER_NO_CONTAINS);

        for token in [MATCHER_CONTAINS, MATCHER_NO_CONTAINS] {
            assert_eq!(flatten_matcher(expand_matcher(token).unwrap()), token);
        }
    }

    #[test]
    fn test_json_map_codec() {
        let mut headers = Map::new();
        headers.insert("Authorization".to_string(), json!("Basic dTpw"));
        let encoded = expand_json_map(&headers).unwrap();
        assert_eq!(encoded, r#"{"Authorization":"Basic dTpw"}"#);

        assert_eq!(expand_json_map(&Map::new()).unwrap(), "");

        // An empty payload value flattens to an empty map, not an error.
        assert_eq!(flatten_json_map(Some("")), json!({}));
        assert_eq!(flatten_json_map(None), json!({}));
        assert_eq!(flatten_json_map(Some("not json")), json!({}));
        assert_eq!(
            flatten_json_map(Some(r#"{"Authorization":"Basic dTpw"}"#)),
            json!({"Authorization": "Basic dTpw"})
        );
    }

    #[test]
    fn test_status_codes_csv_is_sorted() {
        let codes = vec!["502".to_string(), "500".to_string(), "501".to_string()];
        assert_eq!(expand_status_codes(&codes), "500,501,502");
    }

    #[test]
    fn test_flatten_selects_block_from_discriminator() {
        let test = UptimeTest {
            name: "example".to_string(),
            test_type: "DNS".to_string(),
            check_rate: 300,
            website_url: "example.com".to_string(),
            dns_ips: vec!["1.2.3.4".to_string()],
            ..Default::default()
        };

        let mut data = ResourceData::from_id("42");
        flatten_uptime_check(&mut data, &test);

        let state = data.into_state().unwrap();
        assert_eq!(state["dns_check"][0]["dns_ips"], json!(["1.2.3.4"]));
        assert_eq!(state["http_check"], json!([]));
        assert_eq!(state["icmp_check"], json!([]));
        assert_eq!(state["tcp_check"], json!([]));
    }

    #[test]
    fn test_flatten_http_check_carries_auth_from_config() {
        let config = defaulted(json!({
            "name": "example",
            "check_interval": 300,
            "monitored_resource": [{"address": "https://example.com"}],
            "http_check": [{
                "basic_authentication": [{"username": "user", "password": "hunter2"}]
            }]
        }));

        let test = UptimeTest {
            name: "example".to_string(),
            test_type: "HTTP".to_string(),
            check_rate: 300,
            website_url: "https://example.com".to_string(),
            timeout: 15,
            status_codes: vec!["500".to_string(), "501".to_string()],
            ..Default::default()
        };

        let mut data = ResourceData::new(config, json!({"id": "42"}));
        flatten_uptime_check(&mut data, &test);

        let state = data.into_state().unwrap();
        let http = &state["http_check"][0];
        assert_eq!(http["basic_authentication"][0]["username"], "user");
        assert_eq!(http["request_method"], "HTTP");
        assert_eq!(http["status_codes"], json!(["500", "501"]));
        assert_eq!(http["content_matchers"], json!([]));
    }

    #[test]
    fn test_schema_enforces_exactly_one_check_block() {
        let schema = UptimeCheck.schema();

        assert!(crate::validation::validate(&schema, &http_config()).is_empty());

        // No check block at all.
        let config = json!({
            "name": "example",
            "check_interval": 300,
            "monitored_resource": [{"address": "https://example.com"}]
        });
        let diagnostics = crate::validation::validate(&schema, &config);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Exactly one"));

        // Two check blocks.
        let config = json!({
            "name": "example",
            "check_interval": 300,
            "monitored_resource": [{"address": "https://example.com"}],
            "http_check": [{}],
            "icmp_check": [{}]
        });
        let diagnostics = crate::validation::validate(&schema, &config);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_schema_rejects_payload_conflict() {
        let schema = UptimeCheck.schema();
        let config = json!({
            "name": "example",
            "check_interval": 300,
            "monitored_resource": [{"address": "https://example.com"}],
            "http_check": [{
                "request_payload": {"key": "value"},
                "request_payload_raw": "raw body"
            }]
        });

        let diagnostics = crate::validation::validate(&schema, &config);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Only one of"));
    }

    #[test]
    fn test_schema_rejects_check_interval_outside_set() {
        let schema = UptimeCheck.schema();
        let mut config = http_config();
        config["check_interval"] = json!(299);

        let diagnostics = crate::validation::validate(&schema, &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("check_interval"));
    }

    proptest! {
        // Request headers survive the map -> JSON string -> map round trip.
        #[test]
        fn prop_json_map_round_trip(
            entries in proptest::collection::btree_map("[a-zA-Z0-9-]{1,8}", "[ -~]{0,16}", 0..4)
        ) {
            let map: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();

            let encoded = expand_json_map(&map).unwrap();
            let decoded = flatten_json_map(if encoded.is_empty() { None } else { Some(&encoded) });
            prop_assert_eq!(Value::Object(map), decoded);
        }
    }
}
