//! End-to-end service root tests: connect, pick the versioned interface,
//! and navigate down to a resource over wiremock.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rsd_client::{Connector, Error, RsdLib, RsdService};

fn root_body(api_version: &str) -> serde_json::Value {
    json!({
        "Id": "RootService",
        "Name": "RSD Pod",
        "RedfishVersion": "1.1.0",
        "Systems": {"@odata.id": "/redfish/v1/Systems"},
        "Nodes": {"@odata.id": "/redfish/v1/Nodes"},
        "Services": {"@odata.id": "/redfish/v1/Services"},
        "Fabrics": {"@odata.id": "/redfish/v1/Fabrics"},
        "StorageServices": {"@odata.id": "/redfish/v1/StorageServices"},
        "TelemetryService": {"@odata.id": "/redfish/v1/TelemetryService"},
        "Oem": {
            "Intel_RackScale": {
                "ApiVersion": api_version,
                "Nodes": {"@odata.id": "/redfish/v1/Nodes"},
                "Services": {"@odata.id": "/redfish/v1/Services"}
            }
        }
    })
}

async fn connect(server: &MockServer, api_version: &str) -> RsdLib {
    Mock::given(method("GET"))
        .and(path("/redfish/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(root_body(api_version)))
        .mount(server)
        .await;

    let conn = Arc::new(Connector::new(&server.uri()).unwrap());
    RsdLib::connect(conn, "/redfish/v1/").await.unwrap()
}

#[tokio::test]
async fn test_connect_reads_versions() {
    let server = MockServer::start().await;
    let rsd = connect(&server, "2.1.0").await;
    assert_eq!(rsd.redfish_version().unwrap(), "1.1.0");
    assert_eq!(rsd.rsd_api_version().unwrap(), "2.1.0");
}

#[tokio::test]
async fn test_factory_v2_1_navigates_to_nodes() {
    let server = MockServer::start().await;
    let rsd = connect(&server, "2.1.0").await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Members": [{"@odata.id": "/redfish/v1/Nodes/Node1"}]
        })))
        .mount(&server)
        .await;

    let RsdService::V2_1(service) = rsd.factory().unwrap() else {
        panic!("expected the 2.1 interface for API version 2.1.0");
    };
    let nodes = service.get_node_collection().await.unwrap();
    assert_eq!(
        nodes.members_identities(),
        &["/redfish/v1/Nodes/Node1".to_string()]
    );
}

#[tokio::test]
async fn test_factory_v2_2_reaches_telemetry() {
    let server = MockServer::start().await;
    let rsd = connect(&server, "2.2.0").await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/TelemetryService"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": {"State": "Enabled", "Health": "OK"},
            "MetricDefinitions": {
                "@odata.id": "/redfish/v1/TelemetryService/MetricDefinitions"
            }
        })))
        .mount(&server)
        .await;

    let RsdService::V2_2(service) = rsd.factory().unwrap() else {
        panic!("expected the 2.2 interface for API version 2.2.0");
    };
    let telemetry = service.get_telemetry_service().await.unwrap();
    assert_eq!(telemetry.status().unwrap().health.as_deref(), Some("OK"));
}

#[tokio::test]
async fn test_factory_v2_3_uses_swordfish_storage() {
    let server = MockServer::start().await;
    let rsd = connect(&server, "2.3.0").await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/StorageServices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Members": [{"@odata.id": "/redfish/v1/StorageServices/NVMeoE1"}]
        })))
        .mount(&server)
        .await;

    let RsdService::V2_3(service) = rsd.factory().unwrap() else {
        panic!("expected the 2.3 interface for API version 2.3.0");
    };
    let services = service.get_storage_service_collection().await.unwrap();
    assert_eq!(
        services.members_identities(),
        &["/redfish/v1/StorageServices/NVMeoE1".to_string()]
    );
}

#[tokio::test]
async fn test_factory_rejects_unknown_version() {
    let server = MockServer::start().await;
    let rsd = connect(&server, "2.4.0").await;
    match rsd.factory().unwrap_err() {
        Error::NotSupported(detail) => assert!(detail.contains("2.4.0")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_basic_auth_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/"))
        .and(wiremock::matchers::header(
            "Authorization",
            // "admin:secret" base64-encoded
            "Basic YWRtaW46c2VjcmV0",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(root_body("2.1.0")))
        .expect(1)
        .mount(&server)
        .await;

    let conn = Arc::new(
        Connector::builder(&server.uri())
            .unwrap()
            .basic_auth("admin", "secret")
            .build()
            .unwrap(),
    );
    RsdLib::connect(conn, "/redfish/v1/").await.unwrap();
}
