//! Integration tests for folding Codex event streams.

use codex_cli_runner::{is_reconnecting, EventRecord, SessionAggregator, SessionResult};

fn fold(lines: &[&str]) -> SessionResult {
    SessionAggregator::new(false).consume(lines.iter().copied())
}

const THREAD: &str = r#"{"type":"thread.started","thread_id":"s1"}"#;
const HELLO: &str = r#"{"type":"item.completed","item":{"type":"agent_message","text":"Hello"}}"#;
const TURN_FAILED: &str = r#"{"type":"turn.failed","error":{"message":"boom"}}"#;

#[test]
fn test_scenario_success() {
    let result = fold(&[
        r#"{"type":"other","thread_id":"s1"}"#,
        r#"{"item":{"type":"agent_message","text":"Hello"}}"#,
        r#"{"type":"turn.completed"}"#,
    ]);
    assert!(result.is_success());
    assert_eq!(result.session_id(), Some("s1"));
    assert_eq!(result.agent_text(), Some("Hello"));
    assert_eq!(result.error_message(), None);
    assert!(result.all_events().is_none());
}

#[test]
fn test_scenario_turn_failed() {
    let result = fold(&[TURN_FAILED]);
    assert!(!result.is_success());
    let message = result.error_message().unwrap_or_default();
    assert!(message.contains("[codex error] boom"), "{message}");
    assert_eq!(result.session_id(), None);
}

#[test]
fn test_scenario_malformed_line_is_not_fatal() {
    let mut aggregator = SessionAggregator::new(false);
    for line in ["warning: something odd", THREAD, HELLO, r#"{"type":"turn.completed"}"#] {
        assert!(aggregator.push_line(line).is_continue());
    }
    assert_eq!(aggregator.diagnostics().len(), 1);
    assert!(aggregator.diagnostics()[0].contains("warning: something odd"));
    assert!(!aggregator.has_failed());
    let result = aggregator.finish();
    assert!(result.is_success());
    assert_eq!(result.agent_text(), Some("Hello"));
}

#[test]
fn test_last_thread_id_wins() {
    let result = fold(&[
        r#"{"type":"thread.started","thread_id":"first"}"#,
        HELLO,
        r#"{"type":"thread.updated","thread_id":"second"}"#,
        r#"{"type":"noise","thread_id":null}"#,
    ]);
    assert_eq!(result.session_id(), Some("second"));
}

#[test]
fn test_agent_text_is_concatenated_in_order() {
    let result = fold(&[
        THREAD,
        r#"{"item":{"type":"agent_message","text":"one "}}"#,
        r#"{"item":{"type":"reasoning","text":"hidden"}}"#,
        r#"{"item":{"type":"agent_message"}}"#,
        r#"{"item":{"type":"agent_message","text":"two"}}"#,
    ]);
    assert_eq!(result.agent_text(), Some("one two"));
}

#[test]
fn test_failure_before_output_fails_session() {
    let result = fold(&[THREAD, TURN_FAILED, HELLO]);
    assert!(!result.is_success());
    assert!(result.error_message().unwrap_or_default().contains("boom"));
}

#[test]
fn test_failure_after_output_keeps_success() {
    let result = fold(&[THREAD, HELLO, TURN_FAILED]);
    assert!(result.is_success());
    assert_eq!(result.agent_text(), Some("Hello"));
}

#[test]
fn test_error_event_before_output_fails_session() {
    let result = fold(&[THREAD, r#"{"type":"error","message":"stream disconnected"}"#, HELLO]);
    assert!(!result.is_success());
    assert!(result
        .error_message()
        .unwrap_or_default()
        .contains("[codex error] stream disconnected"));
}

#[test]
fn test_reconnect_notice_is_ignored() {
    let mut aggregator = SessionAggregator::new(false);
    let _ = aggregator.push_line(THREAD);
    let _ = aggregator.push_line(r#"{"type":"error","message":"Reconnecting... 3/10"}"#);
    assert!(!aggregator.has_failed());
    assert!(aggregator.diagnostics().is_empty());
    let _ = aggregator.push_line(HELLO);
    assert!(aggregator.finish().is_success());
}

#[test]
fn test_reconnect_pattern() {
    assert!(is_reconnecting("Reconnecting... 3/10"));
    assert!(is_reconnecting("Reconnecting...  1/5"));
    assert!(!is_reconnecting("Reconnecting... failed"));
    assert!(!is_reconnecting("error: Reconnecting... 3/10"));
    assert!(!is_reconnecting("Reconnecting... 3/10 giving up"));
}

#[test]
fn test_missing_thread_id_fails_even_with_text() {
    let result = fold(&[HELLO]);
    assert!(!result.is_success());
    assert!(result.error_message().unwrap_or_default().contains("session id"));
    assert_eq!(result.agent_text(), None);
}

#[test]
fn test_empty_thread_id_counts_as_missing() {
    let result = fold(&[r#"{"type":"thread.started","thread_id":""}"#, HELLO]);
    assert!(!result.is_success());
}

#[test]
fn test_missing_agent_text_message_comes_first() {
    let result = fold(&[THREAD, "garbage"]);
    let message = result.error_message().unwrap_or_default();
    assert!(message.starts_with("Failed to get agent messages"), "{message}");
    assert!(message.contains("[json decode error] garbage"));
}

#[test]
fn test_empty_stream_fails_with_both_explanations() {
    let result = fold(&[]);
    assert!(!result.is_success());
    let message = result.error_message().unwrap_or_default();
    assert!(message.contains("agent messages"));
    assert!(message.contains("session id"));
}

#[test]
fn test_unexpected_shape_halts_consumption() {
    let mut aggregator = SessionAggregator::new(false);
    let _ = aggregator.push_line(THREAD);
    let _ = aggregator.push_line(HELLO);
    assert!(aggregator.push_line(r#"{"type":42}"#).is_break());
    assert!(aggregator.push_line(HELLO).is_break());
    assert_eq!(aggregator.agent_text(), "Hello");
    let result = aggregator.finish();
    assert!(!result.is_success());
    let message = result.error_message().unwrap_or_default();
    assert!(message.contains("[unexpected error]"), "{message}");
    assert!(message.contains(r#"{\"type\":42}"#), "{message}");
}

#[test]
fn test_consume_stops_at_first_fatal_line() {
    let lines = vec![THREAD, "[1, 2, 3]", HELLO];
    let result = SessionAggregator::new(true).consume(lines);
    assert!(!result.is_success());
    assert_eq!(result.all_events().map(<[EventRecord]>::len), Some(2));
}

#[test]
fn test_all_events_are_kept_in_order_when_requested() {
    let result = SessionAggregator::new(true).consume([THREAD, "not json", HELLO]);
    assert!(result.is_success());
    let events = result.all_events().unwrap_or_default();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0].as_json().and_then(|v| v.get("thread_id")),
        Some(&serde_json::json!("s1"))
    );
    assert_eq!(events[1], EventRecord::Raw("not json".to_string()));
}

#[test]
fn test_failure_result_can_carry_events() {
    let result = SessionAggregator::new(true).consume([TURN_FAILED]);
    assert!(!result.is_success());
    assert_eq!(result.all_events().map(<[EventRecord]>::len), Some(1));
}

#[test]
fn test_result_json_shape() {
    let ok = fold(&[THREAD, HELLO]).to_json();
    assert_eq!(
        ok,
        serde_json::json!({"success": true, "session_id": "s1", "agent_text": "Hello"})
    );
    let failed = fold(&[TURN_FAILED]).to_json();
    assert_eq!(failed["success"], serde_json::json!(false));
    assert!(failed.get("error_message").is_some());
    assert!(failed.get("session_id").is_none());
    assert!(failed.get("agent_text").is_none());
}
