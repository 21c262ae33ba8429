//! Integration tests for doctor diagnostics with network checks enabled.

mod common;

use wiremock::MockServer;

use tracking_day::core::carrier::Carrier;
use tracking_day::core::doctor::{CheckStatus, DiagnoseRequest, diagnose};
use tracking_day::core::tracker::{TrackerOptions, UnifiedTracker};
use tracking_day::error::ExitCode;
use tracking_day::storage::RawCredentials;
use tracking_day::{assert_not_contains, make_fedex_error_body, make_fedex_in_transit_payload};

use common::fixtures::{TEST_SECRET, TOKEN_PATH, TRACK_PATH, credentials_for, mount_json, mount_token};
use common::logger::TestLogger;

const TN: &str = "123456789012";

fn tracker(credentials: RawCredentials) -> UnifiedTracker {
    UnifiedTracker::new(
        TrackerOptions::default()
            .with_environment("test")
            .with_fedex_credentials(credentials),
    )
}

fn network_request(tracking_number: Option<&str>) -> DiagnoseRequest {
    DiagnoseRequest {
        selection: Carrier::Fedex.into(),
        tracking_number: tracking_number.map(str::to_string),
        allow_network: true,
    }
}

#[tokio::test]
async fn network_check_passes_with_token_only() {
    let log = TestLogger::new("network_check_passes_with_token_only");
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    mount_json(&server, TRACK_PATH, 200, make_fedex_in_transit_payload(TN), 0).await;

    let report = diagnose(&tracker(credentials_for(&server)), &network_request(None)).await;

    assert!(report.ok, "{report:?}");
    assert_eq!(report.exit(), ExitCode::Success);
    assert!(report.network.checked);
    assert_eq!(report.network.reachable, Some(true));
    assert!(matches!(report.network.auth, CheckStatus::Pass { .. }));
    assert!(matches!(report.network.tracking, CheckStatus::Skipped { .. }));
    assert!(report.network.duration_ms.is_some());
    log.finish_ok();
}

#[tokio::test]
async fn network_check_tracks_given_number() {
    let log = TestLogger::new("network_check_tracks_given_number");
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    mount_json(&server, TRACK_PATH, 200, make_fedex_in_transit_payload(TN), 1).await;

    let report = diagnose(&tracker(credentials_for(&server)), &network_request(Some(TN))).await;

    assert!(report.ok);
    match &report.network.tracking {
        CheckStatus::Pass { details } => {
            assert_eq!(details.as_deref(), Some("answered by track endpoint"));
        }
        other => panic!("expected pass, got {other:?}"),
    }
    log.finish_ok();
}

#[tokio::test]
async fn rejected_credentials_exit_1_but_endpoint_is_reachable() {
    let log = TestLogger::new("rejected_credentials_exit_1_but_endpoint_is_reachable");
    let server = MockServer::start().await;
    mount_json(
        &server,
        TOKEN_PATH,
        401,
        make_fedex_error_body("NOT.AUTHORIZED.ERROR", "The given client credentials were not valid."),
        1,
    )
    .await;

    let report = diagnose(&tracker(credentials_for(&server)), &network_request(Some(TN))).await;

    assert!(!report.ok);
    assert_eq!(report.exit_code, 1);
    assert_eq!(report.network.reachable, Some(true));
    assert!(report.network.auth.is_fail());
    assert!(matches!(report.network.tracking, CheckStatus::Skipped { .. }));

    let json = serde_json::to_string(&report).unwrap();
    assert_not_contains!(json.as_str(), TEST_SECRET);
    log.finish_ok();
}

#[tokio::test]
async fn unreachable_host_is_reported_not_thrown() {
    let log = TestLogger::new("unreachable_host_is_reported_not_thrown");
    // Nothing listens on the discard port in the test environment.
    let credentials = RawCredentials::new("http://127.0.0.1:9", "client-id", TEST_SECRET);

    let report = diagnose(&tracker(credentials), &network_request(None)).await;

    assert!(!report.ok);
    assert_eq!(report.exit(), ExitCode::GeneralError);
    assert_eq!(report.network.reachable, Some(false));
    assert!(report.error.is_some());
    log.finish_ok();
}

#[tokio::test]
async fn tracking_failure_exits_1() {
    let log = TestLogger::new("tracking_failure_exits_1");
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 1).await;
    mount_json(
        &server,
        TRACK_PATH,
        503,
        make_fedex_error_body("SERVICE.UNAVAILABLE.ERROR", "try later"),
        1,
    )
    .await;

    let report = diagnose(&tracker(credentials_for(&server)), &network_request(Some(TN))).await;

    assert_eq!(report.exit_code, 1);
    assert!(matches!(report.network.auth, CheckStatus::Pass { .. }));
    assert!(report.network.tracking.is_fail());
    assert!(report.error.unwrap().contains("SERVICE.UNAVAILABLE.ERROR"));
    log.finish_ok();
}

#[tokio::test]
async fn without_network_flag_nothing_is_sent() {
    let log = TestLogger::new("without_network_flag_nothing_is_sent");
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 3600, 0).await;

    let request = DiagnoseRequest {
        allow_network: false,
        ..network_request(Some(TN))
    };
    let report = diagnose(&tracker(credentials_for(&server)), &request).await;

    assert!(report.ok);
    assert!(!report.network.checked);
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["network"]["reachable"], serde_json::Value::Null);
    assert_eq!(json["network"]["auth"]["status"], "skipped");
    assert_eq!(json["config"]["valid"], true);
    assert_eq!(json["carrier"]["effective"], "fedex");
    log.finish_ok();
}
