//! Route behavior over in-memory upstreams.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use zonesync_api::{build_router, ApiState};
use zonesync_common::{ProvisioningConfig, RecordKey, Zone, ZoneRegistry};
use zonesync_upstream::{
    DirectoryEntry, InMemorySubscriberSource, InMemoryZoneBackend, ProvisionStep, Table,
};

fn registry() -> ZoneRegistry {
    ZoneRegistry::from_zones(vec![
        Zone::new("GTRE01", "memory://gtre01")
            .with_credentials("gt", "gt-pass")
            .with_city_code(40),
        Zone::new("BRMNORTE1", "memory://brmnorte1"),
    ])
}

fn backend() -> InMemoryZoneBackend {
    InMemoryZoneBackend::new()
        .with_connections(
            "GTRE01",
            serde_json::from_value(json!([
                {"pk": 101, "fields": {"conector": 1, "ciudad": 40, "extra_1": "0911"}},
                {"pk": 102, "fields": {"conector": 7}}
            ]))
            .unwrap(),
        )
        .with_table(
            "GTRE01",
            Table::Cities,
            serde_json::from_value(json!([{"pk": 40, "fields": {"nombre": "Guayaquil"}}])).unwrap(),
        )
        .with_table(
            "GTRE01",
            Table::Plans,
            serde_json::from_value(json!([
                {"pk": 1, "fields": {"nombre": "Plan 20M"}},
                {"pk": 2, "fields": {}}
            ]))
            .unwrap(),
        )
        .with_table(
            "GTRE01",
            Table::IpAddresses,
            serde_json::from_value(json!([
                {"pk": 77, "fields": {"direccion": "10.20.0.15"}},
                {"pk": 78, "fields": {"ip": "10.20.0.16"}}
            ]))
            .unwrap(),
        )
        .with_devices(
            "GTRE01",
            vec![DirectoryEntry::new("1A2B3C4D5E6F<br>(SKYW-99887766)")],
        )
        .with_diagnostic("GTRE01", RecordKey::numeric(101), json!({"estado": "online"}))
}

fn server_with(backend: InMemoryZoneBackend) -> TestServer {
    let subscribers = InMemorySubscriberSource::new(
        serde_json::from_value(json!([
            {"id_servicio": 1, "cedula": "0911", "nombre": "Ana", "zona": {"nombre": "GTRE01"}}
        ]))
        .unwrap(),
    );
    let provisioning = ProvisioningConfig {
        base_delay_ms: 1,
        ..Default::default()
    };
    let state = ApiState::new(registry(), Arc::new(subscribers), Arc::new(backend), &provisioning);
    TestServer::new(build_router(state)).unwrap()
}

fn server() -> TestServer {
    server_with(backend())
}

#[tokio::test]
async fn test_health() {
    let response = server().get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["zones"], json!(2));
}

#[tokio::test]
async fn test_list_zones() {
    let body = server().get("/api/v1/zones").await.json::<Value>();
    assert_eq!(body["data"], json!([
        {"id": "GTRE01", "city": 40},
        {"id": "BRMNORTE1", "city": null}
    ]));
}

#[tokio::test]
async fn test_zone_clients_are_joined_and_enriched() {
    let response = server().get("/api/v1/zones/GTRE01/clients").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    let clients = body["data"].as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["nombre"], json!("Ana"));
    assert_eq!(clients[0]["city_name"], json!("Guayaquil"));
}

#[tokio::test]
async fn test_unknown_zone_is_404() {
    let response = server().get("/api/v1/zones/NOPE/clients").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], json!("zone_not_found"));
}

#[tokio::test]
async fn test_zone_without_credentials_is_500() {
    let response = server().get("/api/v1/zones/BRMNORTE1/clients").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"]["code"], json!("credentials_missing"));
}

#[tokio::test]
async fn test_reference_failure_is_502() {
    let server = server_with(backend().with_failing_table("GTRE01", Table::Nodes));
    let response = server.get("/api/v1/zones/GTRE01/clients").await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["error"]["details"]["status"], json!(500));
}

#[tokio::test]
async fn test_national_id_lookup() {
    let response = server().get("/api/v1/clients/national-id/0911").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["data"][0]["diagnostic"], json!({"estado": "online"}));
    assert_eq!(body["data"][0]["client"]["pk"], json!(101));

    let missing = server().get("/api/v1/clients/national-id/0000").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_projection() {
    let body = server()
        .get("/api/v1/zones/GTRE01/catalogs/plans")
        .await
        .json::<Value>();
    assert_eq!(body["data"], json!([
        {"pk": 1, "name": "Plan 20M"},
        {"pk": 2, "name": "Sin nombre"}
    ]));
}

#[tokio::test]
async fn test_ip_address_catalog() {
    let body = server()
        .get("/api/v1/zones/GTRE01/catalogs/ip-addresses")
        .await
        .json::<Value>();
    assert_eq!(body["data"], json!([
        {"pk": 77, "name": "10.20.0.15"},
        {"pk": 78, "name": "10.20.0.16"}
    ]));
}

#[tokio::test]
async fn test_node_devices() {
    let body = server()
        .get("/api/v1/zones/GTRE01/nodes/3/devices")
        .await
        .json::<Value>();
    assert_eq!(body["data"][0]["text"], json!("1A2B3C4D5E6F<br>(SKYW-99887766)"));
}

#[tokio::test]
async fn test_create_connection_requires_zone_and_ip() {
    let server = server();

    let no_zone = server
        .post("/api/v1/connections")
        .json(&json!({"form": {"nombre": "Ana"}, "ip_pk": 77}))
        .await;
    assert_eq!(no_zone.status_code(), StatusCode::BAD_REQUEST);

    let no_ip = server
        .post("/api/v1/connections")
        .json(&json!({"zone": "GTRE01", "form": {"nombre": "Ana"}}))
        .await;
    assert_eq!(no_ip.status_code(), StatusCode::BAD_REQUEST);

    let created = server
        .post("/api/v1/connections")
        .json(&json!({"zone": "GTRE01", "form": {"nombre": "Ana"}, "ip_pk": 77}))
        .await;
    created.assert_status_ok();
}

#[tokio::test]
async fn test_provisioning_routes() {
    let server = server_with(backend().with_provision_script(vec![
        ProvisionStep::Reply(json!({"mensaje": "No existe conexión válida"})),
        ProvisionStep::Reply(json!({"mensaje": "ONU asignada"})),
    ]));

    let response = server
        .post("/api/v1/provisioning")
        .json(&json!({
            "zone": "GTRE01", "connection": 101, "serial": "99887766",
            "node": 3, "profile": "12"
        }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["data"]["status"], json!("provisioned"));
    assert_eq!(body["data"]["result"]["attempts"], json!(2));
    assert_eq!(body["data"]["result"]["recovered"], json!(false));

    let unavailable = server
        .post("/api/v1/provisioning")
        .json(&json!({"zone": "GTRE01", "connection": 101, "serial": "00000000", "profile": "12"}))
        .await;
    assert_eq!(unavailable.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_provisioning_exhaustion_is_504() {
    let marker = ProvisionStep::Reply(json!({"mensaje": "No existe conexión válida"}));
    let server = server_with(backend().with_provision_script(vec![marker; 5]));

    let response = server
        .post("/api/v1/provisioning")
        .json(&json!({"zone": "GTRE01", "connection": 101, "serial": "1A2B3C4D5E6F", "profile": "12"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::GATEWAY_TIMEOUT);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["details"]["attempts"], json!(5));
    assert_eq!(body["error"]["details"]["history"].as_array().unwrap().len(), 5);
}
