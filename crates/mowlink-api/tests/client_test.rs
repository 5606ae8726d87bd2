// Integration tests for `EchoClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secrecy::SecretString;

use mowlink_api::{Credentials, EchoClient, Error, Mode, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, EchoClient) {
    let server = MockServer::start().await;
    let client = EchoClient::from_reqwest(&server.uri(), reqwest::Client::new())
        .unwrap()
        .with_confirm_policy(Duration::from_millis(10), 3);
    (server, client)
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_last_statuses_posts_robot_ids() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/RobotData/LastStatuses"))
        .and(body_json(json!(["R1"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryDate": "2024-05-01T10:00:00",
            "StatusesInfo": [{
                "Robot": "R1",
                "Status": "Work",
                "EstimatedBatteryLevel": 77.0,
                "Position": { "Longitude": 6.15, "Latitude": 46.2 },
                "IsOnline": true
            }]
        })))
        .mount(&server)
        .await;

    let statuses = client.last_statuses(&["R1".to_owned()]).await.unwrap();

    let si = statuses.for_robot("R1").unwrap();
    assert_eq!(si.status, "Work");
    assert_eq!(si.estimated_battery_level, Some(77.0));
    assert!((si.position.unwrap().latitude - 46.2).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/RobotData/LastStatuses"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.last_statuses(&["R1".to_owned()]).await.unwrap_err();

    assert!(matches!(err, Error::Authentication { .. }));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/RobotData/LastStatuses"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.last_statuses(&["R1".to_owned()]).await.unwrap_err();

    match &err {
        Error::Http { status, body } => {
            assert_eq!(*status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/RobotData/LastStatuses"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.last_statuses(&["R1".to_owned()]).await.unwrap_err();

    assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "<html>"));
}

// ── Config ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_config_passes_reload_flag() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/RobotConfig/GetConfig/R1"))
        .and(query_param("reload", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ConfigValidated": true,
            "Data": { "BrainVersion": "4.2.1", "Zones": 3 }
        })))
        .mount(&server)
        .await;

    let cfg = client.get_config("R1", false).await.unwrap();

    assert!(cfg.config_validated);
    assert_eq!(cfg.data.brain_version.as_deref(), Some("4.2.1"));
    assert_eq!(cfg.data.extra.get("Zones"), Some(&json!(3)));
}

// ── Mode ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_mode_waits_for_read_back() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/RobotAction/SetMode"))
        .and(body_json(json!({ "Mode": "work", "RobotId": "R1" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // First read-back still reports the old mode.
    Mock::given(method("GET"))
        .and(path("/api/RobotData/Current/R1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "Mode": "chargeAndStay" })),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/RobotData/Current/R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Mode": "work" })))
        .with_priority(2)
        .mount(&server)
        .await;

    client.set_mode("R1", Mode::Work, true).await.unwrap();
}

#[tokio::test]
async fn test_set_mode_without_read_back_returns_after_ack() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/RobotAction/SetMode"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/RobotData/Current/R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    client
        .set_mode("R1", Mode::ChargeAndStay, false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_mode_gives_up_when_never_confirmed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/RobotAction/SetMode"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/RobotData/Current/R1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "Mode": "chargeAndStay" })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = client.set_mode("R1", Mode::Work, true).await.unwrap_err();

    assert!(matches!(err, Error::ModeNotConfirmed { attempts: 3, .. }));
}

// ── Timeouts ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_slow_backend_reports_configured_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/RobotData/Current/R1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Mode": "work" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let credentials = Credentials {
        user_id: "7".into(),
        user_token: SecretString::from("token"),
    };
    let transport = TransportConfig {
        timeout: Duration::from_secs(1),
        ..TransportConfig::default()
    };
    let client = EchoClient::new(server.uri().parse().unwrap(), &credentials, &transport).unwrap();

    let err = client.current("R1").await.unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_secs: 1 }));
    assert_eq!(err.to_string(), "Request timed out after 1s");
}
