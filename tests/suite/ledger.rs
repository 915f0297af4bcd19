//! `vaultmesh ledger` end to end.

use serde_json::{Value, json};

use crate::common::{Workspace, stderr, stdout};

const SHARD: &str = "ledger/events-2025-03-04.jsonl";

fn event(id: &str) -> String {
    json!({
        "event_id": id,
        "ts": "2025-03-04T10:00:00Z",
        "keyword": "forge",
        "prompt": "a long prompt body",
        "model": "m-1"
    })
    .to_string()
}

fn append(ws: &Workspace, raw: &str, envs: &[(&str, &str)]) -> std::process::Output {
    ws.run_with_stdin(&["ledger", "append", "--root", "ledger"], raw, envs)
}

fn shard_lines(ws: &Workspace) -> Vec<Value> {
    ws.read(SHARD)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[test]
fn appends_to_the_shard_of_the_event_day() {
    let ws = Workspace::empty();

    let output = append(&ws, &event("evt-1"), &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("[ledger] appended to"));

    let lines = shard_lines(&ws);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["event_id"], "evt-1");
    assert_eq!(lines[0]["prompt"], "a long prompt body");
    assert!(ws.path().join("ledger/events-2025-03-04.idx").exists());
}

#[test]
fn duplicate_event_id_is_skipped() {
    let ws = Workspace::empty();

    assert!(append(&ws, &event("evt-1"), &[]).status.success());
    let output = append(&ws, &event("evt-1"), &[]);

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("duplicate"), "stderr: {err}");
    assert!(err.contains("events-2025-03-04.jsonl"), "stderr: {err}");
    assert_eq!(shard_lines(&ws).len(), 1);
}

#[test]
fn duplicate_detected_after_sidecar_index_is_lost() {
    let ws = Workspace::empty();

    assert!(append(&ws, &event("evt-1"), &[]).status.success());
    std::fs::remove_file(ws.path().join("ledger/events-2025-03-04.idx")).expect("remove idx");

    let output = append(&ws, &event("evt-1"), &[]);
    assert!(stderr(&output).contains("duplicate"));
    assert_eq!(shard_lines(&ws).len(), 1);
}

#[test]
fn compact_mode_from_environment_keeps_allow_listed_fields() {
    let ws = Workspace::empty();

    let output = append(&ws, &event("evt-1"), &[("VAULTMESH_LEDGER_COMPACT", "1")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let lines = shard_lines(&ws);
    let keys: Vec<&str> = lines[0]
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["event_id", "ts", "keyword", "model"]);
}

#[test]
fn events_without_id_are_never_deduplicated() {
    let ws = Workspace::empty();
    let raw = json!({"ts": "2025-03-04T10:00:00Z", "keyword": "x"}).to_string();

    assert!(append(&ws, &raw, &[]).status.success());
    assert!(append(&ws, &raw, &[]).status.success());
    assert_eq!(shard_lines(&ws).len(), 2);
}

#[test]
fn missing_ts_is_filled_with_current_time() {
    let ws = Workspace::empty();

    let output = append(&ws, &json!({"event_id": "evt-now"}).to_string(), &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let day = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let shard = ws.path().join(format!("ledger/events-{day}.jsonl"));
    let line = std::fs::read_to_string(&shard).expect("shard for today");
    let value: Value = serde_json::from_str(line.trim()).expect("json");
    assert!(value["ts"].as_str().is_some_and(|ts| ts.ends_with('Z')));
}

#[test]
fn malformed_input_writes_nothing() {
    let ws = Workspace::empty();

    let output = append(&ws, "{not json", &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!ws.path().join("ledger").exists());

    let output = append(&ws, "[1, 2]", &[]);
    assert_eq!(output.status.code(), Some(2));

    let bad_ts = json!({"event_id": "e", "ts": "yesterday-ish"}).to_string();
    let output = append(&ws, &bad_ts, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!ws.path().join(SHARD).exists());
}

#[test]
fn tail_prints_recent_events_of_a_day() {
    let ws = Workspace::empty();
    for id in ["evt-1", "evt-2", "evt-3"] {
        assert!(append(&ws, &event(id), &[]).status.success());
    }

    let output = ws.run(&[
        "ledger", "tail", "--root", "ledger", "--day", "2025-03-04", "--limit", "2",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let ids: Vec<String> = stdout(&output)
        .lines()
        .map(|line| {
            let value: Value = serde_json::from_str(line).expect("json line");
            value["event_id"].as_str().unwrap_or_default().to_owned()
        })
        .collect();
    assert_eq!(ids, vec!["evt-2", "evt-3"]);
}

#[test]
fn tail_of_empty_day_prints_nothing() {
    let ws = Workspace::empty();

    let output = ws.run(&["ledger", "tail", "--root", "ledger", "--day", "2024-01-01"]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn numeric_and_multiline_ids_dedup_independently() {
    let ws = Workspace::empty();
    let numeric = json!({"event_id": 7, "ts": "2025-03-04T10:00:00Z"}).to_string();
    let multiline = json!({"event_id": "x\ny", "ts": "2025-03-04T10:00:00Z"}).to_string();
    let piece = json!({"event_id": "y", "ts": "2025-03-04T10:00:00Z"}).to_string();

    assert!(append(&ws, &numeric, &[]).status.success());
    assert!(stderr(&append(&ws, &numeric, &[])).contains("duplicate"));
    assert!(append(&ws, &multiline, &[]).status.success());
    let output = append(&ws, &piece, &[]);
    assert!(stderr(&output).contains("appended"), "stderr: {}", stderr(&output));

    assert_eq!(shard_lines(&ws).len(), 3);
}
