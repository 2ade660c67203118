//! End-to-end dispatch through real child processes.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::tools::jyotish_catalog;
use crate::worker::test_support::{ECHO_WORKER, FakeCalculations};
use super::{Dispatcher, InvocationRequest};

fn dispatcher(calcs: &FakeCalculations) -> Dispatcher {
    Dispatcher::new(Arc::new(jyotish_catalog().unwrap()), Arc::new(calcs.invoker()))
}

fn request(tool: &str, args: Value) -> InvocationRequest {
    InvocationRequest::new(tool, args.as_object().cloned().unwrap())
}

#[tokio::test]
async fn test_chart_read_echo_round_trip() {
    let calcs = FakeCalculations::new();
    calcs.script("chart_calculator", ECHO_WORKER);
    let id = uuid::Uuid::new_v4().to_string();

    let envelope = dispatcher(&calcs)
        .dispatch(request("chart_read", json!({"chart_id": id})))
        .await;

    assert!(!envelope.is_error());
    let echoed: Value = serde_json::from_str(envelope.text().unwrap()).unwrap();
    assert_eq!(echoed, json!({"action": "read", "chart_id": id}));
}

#[tokio::test]
async fn test_chart_list_sends_action_only() {
    let calcs = FakeCalculations::new();
    calcs.script("chart_calculator", ECHO_WORKER);

    let envelope = dispatcher(&calcs).dispatch(request("chart_list", json!({}))).await;

    assert!(!envelope.is_error());
    assert_eq!(envelope.text(), Some("{\n  \"action\": \"list\"\n}"));
}

#[tokio::test]
async fn test_worker_stderr_becomes_error_text() {
    let calcs = FakeCalculations::new();
    calcs.script("yoga_identifier", "echo boom >&2\nexit 2\n");

    let envelope = dispatcher(&calcs)
        .dispatch(request(
            "yogas_identify",
            json!({"chart_id": uuid::Uuid::new_v4().to_string()}),
        ))
        .await;

    assert!(envelope.is_error());
    assert_eq!(envelope.text(), Some("Error: boom\n"));
}

#[tokio::test]
async fn test_non_json_stdout_is_malformed() {
    let calcs = FakeCalculations::new();
    calcs.script("compatibility_calculator", "echo 'not json'\n");

    let envelope = dispatcher(&calcs)
        .dispatch(request(
            "compatibility_analyze",
            json!({
                "chart_id_1": uuid::Uuid::new_v4().to_string(),
                "chart_id_2": uuid::Uuid::new_v4().to_string(),
            }),
        ))
        .await;

    assert!(envelope.is_error());
    let text = envelope.text().unwrap();
    assert!(text.starts_with("Error: Failed to parse worker output as JSON:\nnot json"));
}

#[tokio::test]
async fn test_missing_worker_script_reported() {
    let calcs = FakeCalculations::new();

    let envelope = dispatcher(&calcs)
        .dispatch(request(
            "divisional_read",
            json!({"chart_id": uuid::Uuid::new_v4().to_string(), "varga": "D10"}),
        ))
        .await;

    assert!(envelope.is_error());
    assert!(envelope.text().unwrap().contains("varga_calculator.sh"));
}

#[tokio::test]
async fn test_concurrent_dispatches_do_not_cross_talk() {
    let calcs = FakeCalculations::new();
    calcs
        .script("dasha_calculator", &format!("sleep 0.4\n{ECHO_WORKER}"))
        .script("transit_calculator", &format!("sleep 0.05\n{ECHO_WORKER}"));
    let dispatcher = dispatcher(&calcs);
    let slow_id = uuid::Uuid::new_v4().to_string();
    let fast_id = uuid::Uuid::new_v4().to_string();

    let (slow, fast) = tokio::join!(
        dispatcher.dispatch(request("dasha_current", json!({"chart_id": slow_id}))),
        dispatcher.dispatch(request(
            "transit_now",
            json!({"chart_id": fast_id, "date": "2026-10-16T12:00:00Z"})
        )),
    );

    let slow: Value = serde_json::from_str(slow.text().unwrap()).unwrap();
    let fast: Value = serde_json::from_str(fast.text().unwrap()).unwrap();
    assert_eq!(slow, json!({"action": "current", "chart_id": slow_id}));
    assert_eq!(
        fast,
        json!({"action": "current", "chart_id": fast_id, "date": "2026-10-16T12:00:00Z"})
    );
}
