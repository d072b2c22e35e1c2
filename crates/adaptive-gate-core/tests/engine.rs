// crates/adaptive-gate-core/tests/engine.rs
// ============================================================================
// Module: Decision Engine Tests
// Description: End-to-end gating, model resolution, and audit emission.
// ============================================================================
//! ## Overview
//! Validates hard-constraint dominance, risk gating, model round-trips,
//! production fail-closed behavior, development degradation, and
//! single-flight model resolution.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
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

mod common;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use adaptive_gate_core::DecisionContext;
use adaptive_gate_core::DecisionEngine;
use adaptive_gate_core::DecisionError;
use adaptive_gate_core::EngineConfig;
use adaptive_gate_core::ExperimentSettings;
use adaptive_gate_core::ModelHandle;
use adaptive_gate_core::ModelResolutionOutcome;
use adaptive_gate_core::ModelSource;
use adaptive_gate_core::ModelVersion;
use adaptive_gate_core::RejectionReason;
use adaptive_gate_core::RuleKind;
use adaptive_gate_core::RuntimeMode;
use adaptive_gate_core::runtime::confidence::ConfidenceInputs;
use adaptive_gate_core::runtime::confidence::ConfidencePolicy;
use common::FixedModel;
use common::Outcome;
use common::RecordingAuditSink;
use common::ScriptedSource;
use common::config;
use common::engine_with_source;
use common::fixed_handle;
use common::rule_only_engine;
use serde_json::json;

fn ctx(value: serde_json::Value) -> DecisionContext {
    DecisionContext::from_value(value).unwrap()
}

// ============================================================================
// SECTION: Gating
// ============================================================================

#[test]
fn hard_violation_rejects_despite_perfect_score() {
    let source = ScriptedSource::new("static", Outcome::Model(fixed_handle("v1", 1.0)));
    let engine = engine_with_source(RuntimeMode::Production, source);
    let id = engine
        .constraints()
        .add_constraint("resources", "cpu cap", json!({"max_cpu": 2}), true)
        .unwrap();

    let decision =
        engine.make_decision(&ctx(json!({"required_resources": {"cpu": 8}}))).unwrap();
    assert!(!decision.can_proceed);
    assert_eq!(decision.score, Some(1.0));
    assert_eq!(decision.hard_violation_count(), 1);
    assert!(decision.rejection_reasons.contains(&RejectionReason::HardConstraint {
        id,
    }));
}

#[test]
fn soft_violations_lower_confidence_but_do_not_block() {
    let engine = rule_only_engine();
    engine
        .constraints()
        .add_constraint("quality", "review depth", json!({"min_reviews": 2}), false)
        .unwrap();
    let clean = engine.make_decision(&ctx(json!({"reviews": 3}))).unwrap();
    let soft = engine.make_decision(&ctx(json!({"reviews": 1}))).unwrap();

    assert!(soft.can_proceed);
    assert_eq!(soft.soft_violation_count(), 1);
    assert!(soft.confidence_score < clean.confidence_score);
    assert!((clean.confidence_score - 1.0).abs() < 1e-9);
    assert!((soft.confidence_score - 0.9).abs() < 1e-9);
}

#[test]
fn risk_above_threshold_rejects() {
    let engine = rule_only_engine();
    engine.risks().add_risk_factor("deploy", "outage", 0.9, 0.9, vec!["canary".into()]).unwrap();

    let decision = engine.make_decision(&ctx(json!({"action_type": "deploy"}))).unwrap();
    assert!(!decision.can_proceed);
    assert!(decision.risk_summary.exceeded);
    assert!((decision.risk_summary.aggregate_risk - 0.81).abs() < 1e-9);
    assert_eq!(decision.risk_summary.mitigations, vec!["canary".to_string()]);
    assert!(matches!(decision.rejection_reasons[0], RejectionReason::RiskThreshold { .. }));

    let other = engine.make_decision(&ctx(json!({"action_type": "read"}))).unwrap();
    assert!(other.can_proceed);
}

#[test]
fn risk_equal_to_threshold_proceeds() {
    let engine = rule_only_engine();
    engine.risks().add_risk_factor("deploy", "edge", 1.0, 0.7, vec![]).unwrap();
    let decision = engine.make_decision(&ctx(json!({"action_type": "deploy"}))).unwrap();
    assert!(!decision.risk_summary.exceeded);
    assert!(decision.can_proceed);
}

#[test]
fn low_score_rejects() {
    let source = ScriptedSource::new("static", Outcome::Model(fixed_handle("v1", 0.2)));
    let engine = engine_with_source(RuntimeMode::Production, source);
    let decision = engine.make_decision(&DecisionContext::new()).unwrap();
    assert!(!decision.can_proceed);
    assert_eq!(
        decision.rejection_reasons,
        vec![RejectionReason::LowScore {
            score: 0.2,
            min_score: 0.5
        }]
    );
}

#[test]
fn active_goals_are_reported() {
    let engine = rule_only_engine();
    let keep = engine.goals().create_goal("throughput", BTreeMap::new()).unwrap();
    let done = engine.goals().create_goal("launch", BTreeMap::new()).unwrap();
    engine.goals().complete_goal(&done).unwrap();
    let decision = engine.make_decision(&DecisionContext::new()).unwrap();
    assert_eq!(decision.active_goals, vec![keep]);
}

// ============================================================================
// SECTION: Model Resolution
// ============================================================================

#[test]
fn model_score_and_version_round_trip() {
    let source = ScriptedSource::new("static", Outcome::Model(fixed_handle("2024-06-01", 0.73)));
    let engine = engine_with_source(RuntimeMode::Production, source);
    let decision = engine.make_decision(&DecisionContext::new()).unwrap();
    assert_eq!(decision.score, Some(0.73));
    assert_eq!(decision.model_version.as_ref().map(ModelVersion::as_str), Some("2024-06-01"));
    assert!((decision.confidence_score - 0.73).abs() < 1e-9);
}

#[test]
fn production_without_model_fails_every_call() {
    let engine = DecisionEngine::builder(config(RuntimeMode::Production)).build().unwrap();
    for _ in 0 .. 2 {
        let err = engine.make_decision(&DecisionContext::new()).unwrap_err();
        assert!(matches!(err, DecisionError::ModelUnavailable(_)));
    }
    assert_eq!(engine.models().resolution_count(), 2);
}

#[test]
fn development_without_model_runs_rule_only() {
    let engine = rule_only_engine();
    let decision = engine.make_decision(&DecisionContext::new()).unwrap();
    assert_eq!(decision.score, None);
    assert_eq!(decision.model_version, None);
    assert!(["control", "variant"].contains(&decision.variant.as_str()));
    assert!(decision.can_proceed);
}

#[test]
fn development_absence_is_cached() {
    let source = ScriptedSource::new("empty", Outcome::Nothing);
    let engine = engine_with_source(RuntimeMode::Development, source.clone());
    engine.make_decision(&DecisionContext::new()).unwrap();
    engine.make_decision(&DecisionContext::new()).unwrap();
    assert_eq!(source.calls(), 1);
}

#[test]
fn transient_source_falls_through_to_next() {
    let remote = ScriptedSource::new("remote", Outcome::Transient);
    let local = ScriptedSource::new("local", Outcome::Model(fixed_handle("local-v1", 0.9)));
    let audit = Arc::new(RecordingAuditSink::default());
    let engine = DecisionEngine::builder(config(RuntimeMode::Production))
        .model_source(remote.clone())
        .model_source(local)
        .audit_sink(audit.clone())
        .build()
        .unwrap();

    let decision = engine.make_decision(&DecisionContext::new()).unwrap();
    assert_eq!(decision.model_version.unwrap().as_str(), "local-v1");
    let outcomes: Vec<_> =
        audit.resolutions.lock().unwrap().iter().map(|event| event.outcome).collect();
    assert_eq!(
        outcomes,
        vec![ModelResolutionOutcome::SourceUnavailable, ModelResolutionOutcome::Loaded]
    );
}

#[test]
fn broken_artifact_is_fatal_even_in_development() {
    let broken = ScriptedSource::new("local", Outcome::Broken);
    let fallback = ScriptedSource::new("later", Outcome::Model(fixed_handle("v1", 0.9)));
    let engine = DecisionEngine::builder(config(RuntimeMode::Development))
        .model_source(broken)
        .model_source(fallback.clone())
        .build()
        .unwrap();
    let err = engine.make_decision(&DecisionContext::new()).unwrap_err();
    assert!(matches!(err, DecisionError::ModelLoad(_)));
    assert_eq!(fallback.calls(), 0);
}

#[test]
fn concurrent_first_calls_resolve_once() {
    let source = ScriptedSource::slow(
        "slow",
        Outcome::Model(fixed_handle("v1", 0.8)),
        Duration::from_millis(50),
    );
    let engine = Arc::new(engine_with_source(RuntimeMode::Production, source.clone()));
    let workers: Vec<_> = (0 .. 8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.make_decision(&DecisionContext::new()).unwrap())
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap().score, Some(0.8));
    }
    assert_eq!(source.calls(), 1);
    assert_eq!(engine.models().resolution_count(), 1);
}

#[test]
fn reload_picks_up_a_new_version() {
    let source = ScriptedSource::new("static", Outcome::Model(fixed_handle("v1", 0.6)));
    let engine = engine_with_source(RuntimeMode::Production, source.clone());
    assert_eq!(engine.make_decision(&DecisionContext::new()).unwrap().score, Some(0.6));

    source.set(Outcome::Model(fixed_handle("v2", 0.7)));
    assert_eq!(engine.make_decision(&DecisionContext::new()).unwrap().score, Some(0.6));

    let handle = engine.reload_model().unwrap().unwrap();
    assert_eq!(handle.version().as_str(), "v2");
    assert_eq!(engine.make_decision(&DecisionContext::new()).unwrap().score, Some(0.7));
}

#[test]
fn replace_sources_swaps_the_model() {
    let engine = rule_only_engine();
    assert_eq!(engine.make_decision(&DecisionContext::new()).unwrap().score, None);
    let source = ScriptedSource::new("new", Outcome::Model(fixed_handle("v9", 0.95)));
    engine.models().replace_sources(vec![source as Arc<dyn ModelSource>]).unwrap();
    assert_eq!(engine.make_decision(&DecisionContext::new()).unwrap().score, Some(0.95));
}

// ============================================================================
// SECTION: Features and Scoring
// ============================================================================

#[test]
fn features_follow_model_order_and_coerce_values() {
    let model = Arc::new(FixedModel::new(&["priority", "flagged", "missing", "label"], 0.9));
    let handle = ModelHandle::new(ModelVersion::new("v1").unwrap(), "static", model.clone());
    let source = ScriptedSource::new("static", Outcome::Model(handle));
    let engine = engine_with_source(RuntimeMode::Production, source);

    let decision = engine
        .make_decision(&ctx(json!({"priority": 3, "flagged": true, "label": "urgent"})))
        .unwrap();
    let seen = model.seen.lock().unwrap();
    assert_eq!(seen[0].values(), &[3.0, 1.0, 0.0, 0.0]);
    assert_eq!(decision.warnings.len(), 1);
    assert_eq!(decision.warnings[0].rule_kind, RuleKind::Feature);
    assert_eq!(decision.warnings[0].rule_id, "label");
}

#[test]
fn out_of_range_model_output_is_a_scoring_error() {
    let source = ScriptedSource::new("static", Outcome::Model(fixed_handle("v1", 1.5)));
    let engine = engine_with_source(RuntimeMode::Production, source);
    let err = engine.make_decision(&DecisionContext::new()).unwrap_err();
    assert!(matches!(err, DecisionError::Scoring(_)));
}

struct Pessimist;

impl ConfidencePolicy for Pessimist {
    fn confidence(&self, inputs: &ConfidenceInputs) -> f64 {
        inputs.score.unwrap_or(0.0) - 2.0
    }
}

#[test]
fn custom_confidence_policy_is_clamped() {
    let engine = DecisionEngine::builder(config(RuntimeMode::Development))
        .confidence_policy(Box::new(Pessimist))
        .build()
        .unwrap();
    let decision = engine.make_decision(&DecisionContext::new()).unwrap();
    assert!(decision.confidence_score.abs() < f64::EPSILON);
}

// ============================================================================
// SECTION: Experiments
// ============================================================================

#[test]
fn sticky_submission_gets_identical_variants() {
    let engine = rule_only_engine();
    let context = ctx(json!({"submission_id": "sub-123"}));
    let first = engine.make_decision(&context).unwrap();
    let second = engine.make_decision(&context).unwrap();
    assert_eq!(first.variant, second.variant);
    assert_ne!(first.decision_id, second.decision_id);
}

#[test]
fn cleared_sticky_field_still_assigns_declared_variants() {
    let engine = rule_only_engine();
    engine
        .set_experiment(ExperimentSettings {
            split: "control:50,variant:50".to_string(),
            sticky_field: None,
        })
        .unwrap();
    let mut seen = BTreeSet::new();
    for _ in 0 .. 16 {
        seen.insert(engine.make_decision(&DecisionContext::new()).unwrap().variant);
    }
    assert!(seen.iter().all(|variant| variant == "control" || variant == "variant"));
}

#[test]
fn invalid_experiment_updates_are_rejected() {
    let engine = rule_only_engine();
    let err = engine
        .set_experiment(ExperimentSettings {
            split: "control".to_string(),
            sticky_field: None,
        })
        .unwrap_err();
    assert!(matches!(err, DecisionError::Configuration(_)));
    assert_eq!(engine.experiment().unwrap(), ExperimentSettings::default());
}

#[test]
fn invalid_engine_config_is_rejected() {
    let config = EngineConfig {
        min_score: 1.5,
        ..EngineConfig::default()
    };
    assert!(matches!(
        DecisionEngine::builder(config).build(),
        Err(DecisionError::Configuration(_))
    ));
}

// ============================================================================
// SECTION: Audit
// ============================================================================

#[test]
fn decisions_are_audited_with_context_hash() {
    let audit = Arc::new(RecordingAuditSink::default());
    let engine = DecisionEngine::builder(config(RuntimeMode::Development))
        .audit_sink(audit.clone())
        .build()
        .unwrap();
    let decision = engine.make_decision(&ctx(json!({"submission_id": "sub-1"}))).unwrap();

    let events = audit.decisions.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].decision_id, decision.decision_id);
    assert_eq!(events[0].variant, decision.variant);
    assert!(events[0].context_hash.is_some());
    let resolutions = audit.resolutions.lock().unwrap();
    assert_eq!(resolutions[0].outcome, ModelResolutionOutcome::Absent);
}
