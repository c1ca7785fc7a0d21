//! Integration tests for the peripheral session lifecycle
//!
//! Drives the controller through the host command surface against a
//! simulated adapter and checks what the adapter observed.

use qrio_peripheral::{
    handle_method_call, AdapterError, GatewayCall, MethodCall, PeripheralConfig,
    PeripheralController, PeripheralResponse, SessionId, SessionState, SimulatedGateway,
};
use serde_json::json;

fn start_call(session_id: Option<&str>) -> MethodCall {
    match session_id {
        Some(id) => MethodCall::new("startPeripheral", json!({ "sessionId": id })),
        None => MethodCall::new("startPeripheral", json!({})),
    }
}

fn stop_call() -> MethodCall {
    MethodCall::new("stopPeripheral", json!(null))
}

#[tokio::test]
async fn test_host_session_round() {
    let gateway = SimulatedGateway::new();
    let adapter = gateway.adapter();
    let mut controller = PeripheralController::new(gateway);

    let response = handle_method_call(&mut controller, &start_call(Some("table-7"))).await;
    assert_eq!(response, PeripheralResponse::Ok(true));

    let payload = adapter.current_payload().expect("advertisement should be live");
    assert_eq!(payload.local_name, "QRio_table-7");
    assert_eq!(payload.session_id, SessionId::new("table-7"));

    let response = handle_method_call(&mut controller, &stop_call()).await;
    assert_eq!(response, PeripheralResponse::Ok(true));
    assert!(adapter.current_payload().is_none());
    assert_eq!(controller.state(), &SessionState::Idle);

    controller.teardown().await;
    assert_eq!(adapter.end_count(), 1);
}

#[tokio::test]
async fn test_missing_session_id_matches_default() {
    let with_default = SimulatedGateway::new();
    let default_adapter = with_default.adapter();
    let mut controller = PeripheralController::new(with_default);
    handle_method_call(&mut controller, &start_call(None)).await;

    let explicit = SimulatedGateway::new();
    let explicit_adapter = explicit.adapter();
    let mut other = PeripheralController::new(explicit);
    handle_method_call(&mut other, &start_call(Some("session"))).await;

    assert_eq!(controller.state(), other.state());
    assert_eq!(default_adapter.calls(), explicit_adapter.calls());

    controller.teardown().await;
    other.teardown().await;
}

#[tokio::test]
async fn test_replacing_sessions_never_overlaps() {
    let gateway = SimulatedGateway::new();
    let adapter = gateway.adapter();
    let mut controller = PeripheralController::new(gateway);

    for id in ["a", "b", "c", "d"] {
        let response = handle_method_call(&mut controller, &start_call(Some(id))).await;
        assert_eq!(response, PeripheralResponse::Ok(true));
    }

    assert_eq!(controller.active_session(), Some(&SessionId::new("d")));
    assert_eq!(adapter.begin_count(), 4);
    assert_eq!(adapter.end_count(), 3);
    assert_eq!(adapter.max_concurrent_advertisements(), 1);

    controller.teardown().await;
    assert!(adapter.current_payload().is_none());
}

#[tokio::test]
async fn test_failed_start_then_recovery() {
    let gateway = SimulatedGateway::new();
    let adapter = gateway.adapter();
    let mut controller = PeripheralController::new(gateway);

    adapter.fail_begin_with(Some(AdapterError::PermissionDenied(
        "BLUETOOTH_ADVERTISE not granted".to_string(),
    )));
    let response = handle_method_call(&mut controller, &start_call(Some("s1"))).await;
    assert_eq!(response, PeripheralResponse::Ok(false));
    assert_eq!(controller.state(), &SessionState::Idle);

    adapter.fail_begin_with(None);
    let response = handle_method_call(&mut controller, &start_call(Some("s1"))).await;
    assert_eq!(response, PeripheralResponse::Ok(true));

    controller.teardown().await;
}

#[tokio::test]
async fn test_replace_with_failing_begin_ends_idle() {
    let gateway = SimulatedGateway::new();
    let adapter = gateway.adapter();
    let mut controller = PeripheralController::new(gateway);

    assert!(controller.start(Some("a")).await);
    adapter.fail_begin_with(Some(AdapterError::PlatformRejected(
        "ADVERTISE_FAILED_TOO_MANY_ADVERTISERS".to_string(),
    )));

    assert!(!controller.start(Some("b")).await);
    assert_eq!(controller.state(), &SessionState::Idle);
    assert!(adapter.current_payload().is_none());

    let last = adapter.calls().pop();
    assert!(matches!(last, Some(GatewayCall::Begin { accepted: false, .. })));
}

#[tokio::test]
async fn test_bluetooth_disabled_mid_session() {
    let gateway = SimulatedGateway::new();
    let adapter = gateway.adapter();
    let mut controller = PeripheralController::new(gateway);
    assert!(controller.start(Some("s1")).await);

    adapter.set_powered(false);

    // The stop command still succeeds even though nothing was on the air
    let response = handle_method_call(&mut controller, &stop_call()).await;
    assert_eq!(response, PeripheralResponse::Ok(true));
    assert_eq!(controller.state(), &SessionState::Idle);

    let response = handle_method_call(&mut controller, &start_call(Some("s2"))).await;
    assert_eq!(response, PeripheralResponse::Ok(false));

    adapter.set_powered(true);
    let response = handle_method_call(&mut controller, &start_call(Some("s2"))).await;
    assert_eq!(response, PeripheralResponse::Ok(true));

    controller.teardown().await;
}

#[tokio::test]
async fn test_teardown_on_failing_gateway_completes() {
    let gateway = SimulatedGateway::new();
    let adapter = gateway.adapter();
    let mut controller =
        PeripheralController::with_config(gateway, PeripheralConfig::new().with_device_name_prefix("T_"))
            .unwrap();
    assert!(controller.start(Some("s1")).await);

    adapter.fail_end_with(Some(AdapterError::PlatformRejected("binder died".to_string())));
    controller.teardown().await;

    assert_eq!(adapter.end_count(), 1);
    assert!(matches!(
        adapter.calls().last(),
        Some(GatewayCall::End { accepted: false })
    ));
}
