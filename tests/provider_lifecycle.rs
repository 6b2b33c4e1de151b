//! Provider lifecycle tests against a mocked StatusCake API.
//!
//! These tests drive the full resource lifecycle through the provider
//! registry, verifying request payloads and state handling against mocked
//! endpoints.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hemmer_provider_statuscake::Provider;

fn provider_for(server: &MockServer) -> Provider {
    let provider = Provider::new();
    provider
        .configure(json!({
            "api_token": "abcdefghij0123456789",
            "rps": 1000,
            "retries": 0,
            "custom_endpoint": server.uri(),
        }))
        .expect("provider configuration should succeed");
    provider
}

fn uptime_check_config() -> serde_json::Value {
    json!({
        "name": "example",
        "check_interval": 300,
        "monitored_resource": [{"address": "https://example.com"}],
        "http_check": [{}],
    })
}

fn uptime_test_payload() -> serde_json::Value {
    json!({
        "data": {
            "id": "497559",
            "name": "example",
            "test_type": "HTTP",
            "check_rate": 300,
            "confirmation": 2,
            "trigger_rate": 0,
            "paused": false,
            "website_url": "https://example.com",
            "timeout": 15,
            "status_codes": ["500", "501", "502"],
            "contact_groups": [],
            "tags": [],
            "servers": [
                {
                    "description": "London, United Kingdom",
                    "ipv4": "178.62.78.199",
                    "region": "United Kingdom",
                    "region_code": "london",
                    "status": "up"
                }
            ]
        }
    })
}

#[tokio::test]
async fn test_create_then_read_uptime_check() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/uptime"))
        .and(body_partial_json(json!({
            "name": "example",
            "check_rate": 300,
            "website_url": "https://example.com",
            "test_type": "HTTP",
            "confirmation": 2,
            "trigger_rate": 0,
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": {"new_id": "497559"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/uptime/497559"))
        .respond_with(ResponseTemplate::new(200).set_body_json(uptime_test_payload()))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider
        .create("statuscake_uptime_check", uptime_check_config())
        .await
        .expect("create should succeed");

    assert_eq!(state["id"], "497559");
    assert_eq!(state["name"], "example");
    assert_eq!(state["check_interval"], 300);
    assert_eq!(
        state["monitored_resource"][0]["address"],
        "https://example.com"
    );
    // Computed attributes come back from the server.
    assert_eq!(state["locations"][0]["region_code"], "london");
    assert_eq!(state["http_check"][0]["status_codes"], json!(["500", "501", "502"]));
}

#[tokio::test]
async fn test_read_not_found_clears_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/uptime/42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "No results found"})),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider
        .read("statuscake_uptime_check", json!({"id": "42"}))
        .await
        .expect("read of a missing resource is not an error");

    assert!(state.is_none());
}

#[tokio::test]
async fn test_update_with_no_changes_skips_write() {
    let server = MockServer::start().await;

    // The refresh read is the only expected call.
    Mock::given(method("PUT"))
        .and(path("/contact-groups/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact-groups/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "1",
                "name": "operations",
                "email_addresses": ["ops@example.com"],
                "integrations": [],
                "mobile_numbers": []
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let config = json!({
        "name": "operations",
        "email_addresses": ["ops@example.com"]
    });
    let state = json!({
        "id": "1",
        "name": "operations",
        "email_addresses": ["ops@example.com"]
    });

    let refreshed = provider
        .update("statuscake_contact_group", state, config)
        .await
        .expect("no-op update should succeed");

    assert_eq!(refreshed["name"], "operations");
}

#[tokio::test]
async fn test_partial_update_sends_only_changed_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/uptime/42"))
        .and(body_partial_json(json!({"tags": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/uptime/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(uptime_test_payload()))
        .mount(&server)
        .await;

    let provider = provider_for(&server);

    let mut config = uptime_check_config();
    config["paused"] = json!(false);
    config["tags"] = json!(["a", "b"]);

    // Prior state as a read would have persisted it, defaults included.
    let mut state = uptime_check_config();
    state["id"] = json!("42");
    state["paused"] = json!(false);
    state["tags"] = json!(["a"]);
    state["confirmation"] = json!(2);
    state["trigger_rate"] = json!(0);
    state["http_check"] = json!([{"request_method": "HTTP", "timeout": 15}]);

    provider
        .update("statuscake_uptime_check", state, config)
        .await
        .expect("update should succeed");

    // The mock asserts the body contained only the changed tags field; a
    // paused key present in the request would not fail body_partial_json,
    // so verify against the recorded request directly.
    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.to_string() == "PUT")
        .expect("a PUT request was made");
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1, "expected only tags in the body, got {:?}", object);
}

#[tokio::test]
async fn test_upstream_validation_errors_fan_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/uptime"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "The request could not be processed",
            "errors": {
                "check_rate": ["is not a valid check rate"],
                "website_url": ["is required"]
            }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .create("statuscake_uptime_check", uptime_check_config())
        .await
        .unwrap_err();

    // One diagnostic per violated field.
    assert_eq!(err.len(), 2);
    assert!(err.iter().any(|d| d.summary.contains("check_rate")));
    assert!(err.iter().any(|d| d.summary.contains("website_url")));
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contact-groups/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact-groups/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "1", "name": "operations"}
        })))
        .mount(&server)
        .await;

    let provider = Provider::new();
    provider
        .configure(json!({
            "api_token": "abcdefghij0123456789",
            "rps": 1000,
            "retries": 3,
            "min_backoff": 0,
            "max_backoff": 1,
            "custom_endpoint": server.uri(),
        }))
        .unwrap();

    let state = provider
        .read("statuscake_contact_group", json!({"id": "1"}))
        .await
        .expect("retried read should succeed")
        .expect("resource exists");

    assert_eq!(state["name"], "operations");
}

#[tokio::test]
async fn test_delete_missing_resource_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/uptime/42"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "No results found"})),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .delete("statuscake_uptime_check", json!({"id": "42"}))
        .await
        .unwrap_err();

    assert!(err[0].summary.contains("failed to delete uptime check"));
}

#[tokio::test]
async fn test_delete_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/uptime/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider
        .delete("statuscake_uptime_check", json!({"id": "42"}))
        .await
        .expect("delete should succeed");
}

#[tokio::test]
async fn test_import_populates_state_from_read() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/uptime/497559"))
        .respond_with(ResponseTemplate::new(200).set_body_json(uptime_test_payload()))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider
        .import_resource("statuscake_uptime_check", "497559")
        .await
        .expect("import should succeed")
        .expect("resource exists");

    assert_eq!(state["id"], "497559");
    assert_eq!(state["name"], "example");
    assert_eq!(state["http_check"][0]["request_method"], "HTTP");
}

#[tokio::test]
async fn test_validation_happens_before_any_network_call() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);

    // No check-type block configured.
    let err = provider
        .create(
            "statuscake_uptime_check",
            json!({
                "name": "example",
                "check_interval": 300,
                "monitored_resource": [{"address": "https://example.com"}]
            }),
        )
        .await
        .unwrap_err();

    assert!(err[0].summary.contains("Exactly one"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_monitoring_locations_data_source() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/uptime-locations"))
        .and(query_param("location", "london"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "description": "London, United Kingdom",
                    "ipv4": "178.62.78.199",
                    "ipv6": "2a03:b0c0:1:d0::5e:7001",
                    "region": "United Kingdom",
                    "region_code": "london",
                    "status": "up"
                }
            ]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider
        .read_data_source(
            "statuscake_uptime_monitoring_locations",
            json!({"region_code": "london"}),
        )
        .await
        .expect("data source read should succeed")
        .expect("data source always produces state");

    assert_eq!(state["locations"][0]["region_code"], "london");
    assert_eq!(state["locations"][0]["ipv6"], "2a03:b0c0:1:d0::5e:7001");
    assert!(!state["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_ssl_check_lifecycle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ssl"))
        .and(body_partial_json(json!({
            "website_url": "https://example.com",
            "check_rate": 1800,
            "alert_at": [7, 14, 30],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"new_id": "88"}})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ssl/88"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "88",
                "website_url": "https://example.com",
                "check_rate": 1800,
                "paused": false,
                "follow_redirects": false,
                "contact_groups": [],
                "alert_at": [7, 14, 30],
                "alert_broken": true,
                "alert_expiry": false,
                "alert_mixed": false,
                "alert_reminder": false
            }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let state = provider
        .create(
            "statuscake_ssl_check",
            json!({
                "check_interval": 1800,
                "alert_config": [{"alert_at": [7, 14, 30], "on_broken": true}],
                "monitored_resource": [{"address": "https://example.com"}]
            }),
        )
        .await
        .expect("create should succeed");

    assert_eq!(state["id"], "88");
    assert_eq!(state["alert_config"][0]["on_broken"], true);
    assert_eq!(state["check_interval"], 1800);
}
