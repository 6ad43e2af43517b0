//! Integration tests for the OpenStack connector using wiremock
//!
//! A MockServer plays both Keystone and Placement so the whole collection
//! path (authentication, catalog lookup, the four Placement calls, the join)
//! runs against real HTTP.

use placement_explorer::config::CollectorConfig;
use placement_explorer::openstack::auth::CloudsFile;
use placement_explorer::openstack::http::format_api_error;
use placement_explorer::openstack::OpenStackConnector;
use placement_explorer::resource::collect;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "gAAAAABtest-token";

fn clouds_yaml(server: &MockServer) -> CloudsFile {
    CloudsFile::from_yaml(&format!(
        r#"
clouds:
  devstack:
    auth:
      auth_url: {uri}/identity/v3
      username: admin
      password: secret
      project_name: admin
      user_domain_name: Default
      project_domain_name: Default
    region_name: RegionOne
  pinned:
    auth:
      token: {token}
    placement_endpoint_override: {uri}/placement
    placement_api_version: "1.39"
"#,
        uri = server.uri(),
        token = TOKEN
    ))
    .expect("clouds.yaml should parse")
}

fn config(cloud: &str) -> CollectorConfig {
    CollectorConfig {
        clouds: vec![cloud.to_string()],
        ..Default::default()
    }
}

async fn mount_keystone(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .and(body_partial_json(json!({
            "auth": {"identity": {"methods": ["password"]}}
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", TOKEN)
                .set_body_json(json!({
                    "token": {
                        "catalog": [
                            {
                                "type": "placement",
                                "endpoints": [
                                    {
                                        "interface": "public",
                                        "region": "RegionOne",
                                        "url": format!("{}/placement", server.uri())
                                    },
                                    {
                                        "interface": "internal",
                                        "region": "RegionOne",
                                        "url": "http://10.0.0.1/placement"
                                    }
                                ]
                            }
                        ]
                    }
                })),
        )
        .mount(server)
        .await;
}

async fn mount_placement_get(server: &MockServer, url_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .and(header("X-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_provider(server: &MockServer, uuid: &str, inventories: Value, usages: Value, allocations: Value) {
    mount_placement_get(
        server,
        &format!("/placement/resource_providers/{}/inventories", uuid),
        json!({"inventories": inventories, "resource_provider_generation": 3}),
    )
    .await;
    mount_placement_get(
        server,
        &format!("/placement/resource_providers/{}/usages", uuid),
        json!({"usages": usages, "resource_provider_generation": 3}),
    )
    .await;
    mount_placement_get(
        server,
        &format!("/placement/resource_providers/{}/allocations", uuid),
        json!({"allocations": allocations, "resource_provider_generation": 3}),
    )
    .await;
}

/// Test full collection through Keystone and Placement
#[tokio::test]
async fn test_collect_end_to_end() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;

    Mock::given(method("GET"))
        .and(path("/placement/resource_providers"))
        .and(header("X-Auth-Token", TOKEN))
        .and(header("OpenStack-API-Version", "placement 1.10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resource_providers": [
                {"uuid": "rp-1", "name": "compute-0", "generation": 3},
                {"uuid": "rp-2", "name": "compute-1", "generation": 3}
            ]
        })))
        .mount(&server)
        .await;

    mount_provider(
        &server,
        "rp-1",
        json!({
            "DISK_GB": {"total": 10, "reserved": 0, "allocation_ratio": 1.0},
            "VCPU": {"total": 4, "reserved": 0, "allocation_ratio": 16.0}
        }),
        json!({"DISK_GB": 2, "VCPU": 1}),
        json!({"instance-a": {"resources": {"VCPU": 1, "DISK_GB": 2}}}),
    )
    .await;
    mount_provider(
        &server,
        "rp-2",
        json!({"MEMORY_MB": {"total": 8192}, "CUSTOM_GPU": {"total": 2}}),
        json!({}),
        json!({}),
    )
    .await;

    let connector = OpenStackConnector::from_clouds(clouds_yaml(&server));
    let result = collect(&config("devstack"), &connector).await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "devstack": {
                "nodes": {
                    "compute-0": {
                        "uuid": "rp-1",
                        "resources": {
                            "disk": {"total": 10240, "used": 2048},
                            "cpu": {"total": 4, "used": 1}
                        },
                        "instances": {
                            "instance-a": {"cpu": 1, "disk": 2048}
                        }
                    },
                    "compute-1": {
                        "uuid": "rp-2",
                        "resources": {
                            "memory": {"total": 8192, "used": 0},
                            "custom_gpu": {"total": 2, "used": 0}
                        },
                        "instances": {}
                    }
                }
            }
        })
    );
}

/// Test provider listing failure turns into the error shape
#[tokio::test]
async fn test_provider_list_failure_returns_error() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;

    Mock::given(method("GET"))
        .and(path("/placement/resource_providers"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let connector = OpenStackConnector::from_clouds(clouds_yaml(&server));
    let result = collect(&config("devstack"), &connector).await;

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 1);

    let error = result.error().expect("should be the error shape");
    assert!(error.contains("Failed to list resource providers"));
    assert!(error.contains("503"));
    assert!(format_api_error(error).is_some());
}

/// Test a malformed per-provider response fails the whole collection
#[tokio::test]
async fn test_malformed_usages_fail_collection() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;

    mount_placement_get(
        &server,
        "/placement/resource_providers",
        json!({"resource_providers": [{"uuid": "rp-1", "name": "compute-0"}]}),
    )
    .await;
    mount_placement_get(
        &server,
        "/placement/resource_providers/rp-1/inventories",
        json!({"inventories": {"VCPU": {"total": 4}}}),
    )
    .await;
    mount_placement_get(
        &server,
        "/placement/resource_providers/rp-1/usages",
        json!({"usage": {"VCPU": 1}}),
    )
    .await;
    mount_placement_get(
        &server,
        "/placement/resource_providers/rp-1/allocations",
        json!({"allocations": {}}),
    )
    .await;

    let connector = OpenStackConnector::from_clouds(clouds_yaml(&server));
    let result = collect(&config("devstack"), &connector).await;

    let error = result.error().expect("should be the error shape");
    assert!(error.starts_with("transport error"));
    assert!(error.contains("Malformed usages of provider rp-1 response"));
}

/// Test rejected credentials surface as an authentication error
#[tokio::test]
async fn test_keystone_401_returns_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "The request you have made requires authentication."}
        })))
        .mount(&server)
        .await;

    let connector = OpenStackConnector::from_clouds(clouds_yaml(&server));
    let result = collect(&config("devstack"), &connector).await;

    let error = result.error().expect("should be the error shape");
    assert!(error.contains("Keystone authentication failed"));
    assert_eq!(
        format_api_error(error),
        Some("Authentication failed. Check the credentials in clouds.yaml.")
    );
}

/// Test a catalog without placement is a configuration error
#[tokio::test]
async fn test_missing_placement_endpoint_returns_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", TOKEN)
                .set_body_json(json!({"token": {"catalog": [
                    {"type": "compute", "endpoints": [{"interface": "public", "url": "http://nova"}]}
                ]}})),
        )
        .mount(&server)
        .await;

    let connector = OpenStackConnector::from_clouds(clouds_yaml(&server));
    let result = collect(&config("devstack"), &connector).await;

    assert_eq!(
        result.error(),
        Some("configuration error: no public placement endpoint in the catalog of cloud devstack")
    );
}

/// Test a pre-issued token with an endpoint override never calls Keystone
#[tokio::test]
async fn test_pinned_endpoint_skips_keystone() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/placement/resource_providers"))
        .and(header("OpenStack-API-Version", "placement 1.39"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resource_providers": []})))
        .mount(&server)
        .await;

    let connector = OpenStackConnector::from_clouds(clouds_yaml(&server));
    let result = collect(&config("pinned"), &connector).await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"pinned": {"nodes": {}}})
    );
}
