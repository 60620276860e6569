//! End-to-end provisioning against a mock zone backend.

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zonesync_common::{BackendRoutes, HttpConfig, ProvisioningConfig, RecordKey, SyncError, Zone, ZoneRegistry};
use zonesync_provision::{ProvisionOutcome, ProvisionRequest, ProvisioningService, MISSING_CONNECTION_MARKER};
use zonesync_upstream::ZoneBackendClient;

const DEVICES: &str = "/gateway/integracion/hardware/onu/disponibles";
const PROVISION: &str = "/gateway/integracion/clientes/cuentasimple/aprovisionar";

async fn mount_directory(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(DEVICES))
        .and(query_param("nodo_de_red", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "text": "1A2B3C4D5E6F<br>(SKYW-99887766)"}
        ])))
        .mount(server)
        .await;
}

fn service(server: &MockServer) -> ProvisioningService {
    let registry = ZoneRegistry::from_zones(vec![Zone::new("GTRE01", &server.uri())
        .with_credentials("gt", "gt-pass")]);
    let backend = ZoneBackendClient::new(&HttpConfig::default(), BackendRoutes::default()).unwrap();
    let config = ProvisioningConfig {
        base_delay_ms: 5,
        ..Default::default()
    };
    ProvisioningService::from_config(registry, Arc::new(backend), &config)
}

fn request() -> ProvisionRequest {
    ProvisionRequest {
        zone: "GTRE01".into(),
        connection: RecordKey::numeric(9),
        serial: "99887766".into(),
        node: Some(RecordKey::numeric(3)),
        profile: Some("12".into()),
    }
}

#[tokio::test]
async fn test_retries_until_backend_sees_connection() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    Mock::given(method("POST"))
        .and(path(PROVISION))
        .and(body_json(json!({"cuenta": 9, "onu": "1A2B3C4D5E6F", "perfil": "12"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mensaje": MISSING_CONNECTION_MARKER})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PROVISION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mensaje": "ONU asignada"})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service(&server).provision(request()).await.unwrap();

    match outcome {
        ProvisionOutcome::Provisioned { result, .. } => {
            assert_eq!(result.attempts, 3);
            assert!(result.recovered);
            assert_eq!(result.response["mensaje"], json!("ONU asignada"));
        }
        other => panic!("expected provisioned, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_exhaust_budget() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    Mock::given(method("POST"))
        .and(path(PROVISION))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(5)
        .mount(&server)
        .await;

    let err = service(&server).provision(request()).await.unwrap_err();

    match err {
        SyncError::ProvisioningExhausted(failure) => {
            assert_eq!(failure.attempts, 5);
            assert_eq!(failure.last_response, None);
            assert!(failure.history[0].detail.as_deref().unwrap_or_default().contains("maintenance"));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_serial_not_in_directory() {
    let server = MockServer::start().await;
    mount_directory(&server).await;

    let mut req = request();
    req.serial = "00000000".into();
    let outcome = service(&server).provision(req).await.unwrap();

    assert!(matches!(outcome, ProvisionOutcome::SerialNotAvailable { .. }));
}
