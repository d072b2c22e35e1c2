// crates/adaptive-gate-core/tests/audit.rs
// ============================================================================
// Module: Audit Sink Tests
// Description: JSON-line audit output and context hashing.
// ============================================================================
//! ## Overview
//! Ensures file audit sinks append one JSON object per event and that decision
//! events carry a context hash instead of the raw context.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;

use adaptive_gate_core::DecisionAuditEvent;
use adaptive_gate_core::DecisionContext;
use adaptive_gate_core::DecisionEngine;
use adaptive_gate_core::EngineConfig;
use adaptive_gate_core::FileAuditSink;
use adaptive_gate_core::HashAlgorithm;
use adaptive_gate_core::NamespaceId;
use adaptive_gate_core::RuntimeMode;
use adaptive_gate_core::hashing::HashError;
use adaptive_gate_core::hashing::hash_canonical_json;
use serde_json::Value;
use serde_json::json;

fn read_lines(path: &std::path::Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn file_sink_appends_resolution_and_decision_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let sink = Arc::new(FileAuditSink::new(&path).unwrap());
    let engine = DecisionEngine::builder(EngineConfig {
        mode: RuntimeMode::Development,
        ..EngineConfig::default()
    })
    .audit_sink(sink)
    .build()
    .unwrap();

    let context = DecisionContext::from_value(json!({
        "submission_id": "sub-secret",
        "action_type": "deploy",
    }))
    .unwrap();
    let decision = engine.make_decision(&context).unwrap();

    let events = read_lines(&path);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "model_resolution");
    assert_eq!(events[0]["outcome"], "absent");
    assert_eq!(events[1]["event"], "decision");
    assert_eq!(events[1]["decision_id"], decision.decision_id.as_str());
    assert_eq!(events[1]["can_proceed"], true);

    let expected = hash_canonical_json(HashAlgorithm::Sha256, &context).unwrap();
    assert_eq!(events[1]["context_hash"]["value"], expected.value.as_str());
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("sub-secret"));
}

#[test]
fn file_sink_appends_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    for _ in 0 .. 2 {
        let sink = Arc::new(FileAuditSink::new(&path).unwrap());
        let engine = DecisionEngine::builder(EngineConfig {
            mode: RuntimeMode::Development,
            ..EngineConfig::default()
        })
        .audit_sink(sink)
        .build()
        .unwrap();
        engine.make_decision(&DecisionContext::new()).unwrap();
    }
    assert_eq!(read_lines(&path).len(), 4);
}

#[test]
fn context_hash_ignores_key_order() {
    let left = DecisionContext::from_value(json!({"a": 1, "b": [1, 2]})).unwrap();
    let right = DecisionContext::from_value(json!({"b": [1, 2], "a": 1})).unwrap();
    assert_eq!(
        hash_canonical_json(HashAlgorithm::Sha256, &left).unwrap(),
        hash_canonical_json(HashAlgorithm::Sha256, &right).unwrap()
    );
}

#[test]
fn hashing_failure_is_recorded_on_decision_event() {
    let engine = DecisionEngine::builder(EngineConfig {
        mode: RuntimeMode::Development,
        ..EngineConfig::default()
    })
    .build()
    .unwrap();
    let decision = engine.make_decision(&DecisionContext::new()).unwrap();

    let event = DecisionAuditEvent::new(
        NamespaceId::new("default"),
        &decision,
        Err(HashError::Canonicalization("unsupported value".to_string())),
    );
    assert!(event.context_hash.is_none());
    let error = event.context_hash_error.as_deref().unwrap();
    assert!(error.contains("unsupported value"));

    let payload = serde_json::to_value(&event).unwrap();
    assert!(payload["context_hash"].is_null());
    assert!(payload["context_hash_error"].as_str().unwrap().contains("unsupported value"));
}

#[test]
fn hashed_decision_event_omits_error_marker() {
    let engine = DecisionEngine::builder(EngineConfig {
        mode: RuntimeMode::Development,
        ..EngineConfig::default()
    })
    .build()
    .unwrap();
    let context = DecisionContext::new().with("action_type", "read");
    let decision = engine.make_decision(&context).unwrap();
    let digest = hash_canonical_json(HashAlgorithm::Sha256, &context);
    let event = DecisionAuditEvent::new(NamespaceId::new("default"), &decision, digest);
    assert!(event.context_hash.is_some());
    let payload = serde_json::to_value(&event).unwrap();
    assert!(payload.get("context_hash_error").is_none());
}
