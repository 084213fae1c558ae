use serde_json::json;

use wield::history::{unresolved_calls, History};
use wield::model::{CallId, FailureKind, ToolCall, ToolFailure, ToolOutcome, ToolResult, Turn};

fn call(id: &str, name: &str) -> ToolCall {
    ToolCall {
        id: CallId::from(id),
        name: name.to_string(),
        arguments: json!({}),
    }
}

fn result(id: &str, name: &str, outcome: ToolOutcome) -> ToolResult {
    ToolResult {
        id: CallId::from(id),
        name: name.to_string(),
        outcome,
    }
}

#[test]
fn test_append_keeps_insertion_order() {
    let mut history = History::new();
    assert!(history.is_empty());

    history.append(Turn::user("first"));
    history.append(Turn::assistant("second"));
    history.append(Turn::user("third"));

    assert_eq!(history.len(), 3);
    assert!(matches!(&history.turns()[0], Turn::User { content } if content == "first"));
    assert!(matches!(&history.turns()[1], Turn::Assistant { content, .. } if content == "second"));
    assert!(matches!(&history.turns()[2], Turn::User { content } if content == "third"));
}

#[test]
fn test_snapshot_is_detached_from_later_appends() {
    let mut history = History::new();
    history.append(Turn::user("kept"));

    let snapshot = history.snapshot();
    history.append(Turn::assistant("after the snapshot"));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(history.len(), 2);
}

#[test]
fn test_replace_restores_a_snapshot() {
    let mut history = History::new();
    history.append(Turn::user("one"));
    history.append(Turn::assistant("two"));
    let snapshot = history.snapshot();

    history.append(Turn::user("three"));
    assert_eq!(history.len(), 3);

    history.replace(snapshot);
    assert_eq!(history.len(), 2);
    assert!(matches!(&history.turns()[1], Turn::Assistant { content, .. } if content == "two"));
}

#[test]
fn test_unresolved_calls_flags_missing_results() {
    let turns = vec![
        Turn::user("go"),
        Turn::Assistant {
            content: String::new(),
            calls: vec![call("a", "lookup"), call("b", "lookup")],
        },
        Turn::ToolCall(call("a", "lookup")),
        Turn::ToolCall(call("b", "lookup")),
        Turn::ToolResult(result("a", "lookup", ToolOutcome::Success(json!({})))),
    ];

    let open = unresolved_calls(&turns);
    assert_eq!(open, vec![CallId::from("b")]);
}

#[test]
fn test_unresolved_calls_counts_failures_as_resolved() {
    let turns = vec![
        Turn::Assistant {
            content: String::new(),
            calls: vec![call("a", "lookup")],
        },
        Turn::ToolCall(call("a", "lookup")),
        Turn::ToolResult(result(
            "a",
            "lookup",
            ToolOutcome::Failure(ToolFailure::new(FailureKind::Timeout, "too slow")),
        )),
    ];

    assert!(unresolved_calls(&turns).is_empty());
}

#[test]
fn test_turn_serialization_is_tagged_and_lean() {
    let turn = Turn::Assistant {
        content: "picking a tool".to_string(),
        calls: vec![call("c1", "lookup")],
    };
    let value = serde_json::to_value(&turn).unwrap();
    assert_eq!(value["turn"], "assistant");
    assert_eq!(value["calls"][0]["id"], "c1");

    // Plain answers serialize without an empty calls array.
    let value = serde_json::to_value(Turn::assistant("done")).unwrap();
    assert_eq!(value["turn"], "assistant");
    assert!(value.get("calls").is_none());

    let round_trip: Turn = serde_json::from_value(value).unwrap();
    assert!(matches!(round_trip, Turn::Assistant { calls, .. } if calls.is_empty()));
}

#[test]
fn test_failure_payload_shape_for_the_model() {
    let outcome = ToolOutcome::Failure(ToolFailure::new(
        FailureKind::InvalidArguments,
        "missing required argument 'key'",
    ));
    let payload = outcome.as_model_payload();
    assert_eq!(payload["error"]["kind"], "invalid_arguments");
    assert_eq!(payload["error"]["message"], "missing required argument 'key'");
}
