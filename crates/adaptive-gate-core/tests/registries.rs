// crates/adaptive-gate-core/tests/registries.rs
// ============================================================================
// Module: Registry Tests
// Description: Goal, constraint, and risk registry behavior.
// ============================================================================
//! ## Overview
//! Exercises registration validation, status transitions, threshold
//! evaluation, and risk aggregation.

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

use std::collections::BTreeMap;

use adaptive_gate_core::ConstraintHandler;
use adaptive_gate_core::DecisionContext;
use adaptive_gate_core::GoalId;
use adaptive_gate_core::GoalManager;
use adaptive_gate_core::GoalStatus;
use adaptive_gate_core::RegistryError;
use adaptive_gate_core::RiskAssessor;
use adaptive_gate_core::RiskId;
use adaptive_gate_core::RuleKind;
use serde_json::json;

fn ctx(value: serde_json::Value) -> DecisionContext {
    DecisionContext::from_value(value).unwrap()
}

// ============================================================================
// SECTION: Goals
// ============================================================================

#[test]
fn goals_clamp_weights_and_issue_unique_ids() {
    let goals = GoalManager::new();
    let criteria = BTreeMap::from([("accuracy".to_string(), 1.7), ("latency".to_string(), -0.3)]);
    let first = goals.create_goal("ship reliably", criteria).unwrap();
    let second = goals.create_goal("keep costs low", BTreeMap::new()).unwrap();
    assert_ne!(first, second);

    let goal = goals.get(&first).unwrap().unwrap();
    assert!((goal.criteria["accuracy"] - 1.0).abs() < f64::EPSILON);
    assert!(goal.criteria["latency"].abs() < f64::EPSILON);
    assert_eq!(goal.status, GoalStatus::Active);
}

#[test]
fn goals_reject_non_finite_weights() {
    let goals = GoalManager::new();
    let criteria = BTreeMap::from([("accuracy".to_string(), f64::NAN)]);
    assert!(matches!(goals.create_goal("bad", criteria), Err(RegistryError::Invalid(_))));
    assert!(goals.list_goals().unwrap().is_empty());
}

#[test]
fn completed_goals_leave_the_active_list() {
    let goals = GoalManager::new();
    let keep = goals.create_goal("keep", BTreeMap::new()).unwrap();
    let done = goals.create_goal("done", BTreeMap::new()).unwrap();
    goals.complete_goal(&done).unwrap();

    let active: Vec<GoalId> = goals.list_active_goals().unwrap().into_iter().map(|g| g.id).collect();
    assert_eq!(active, vec![keep]);
    assert_eq!(goals.list_goals().unwrap().len(), 2);
}

#[test]
fn goal_transitions_only_leave_active() {
    let goals = GoalManager::new();
    let id = goals.create_goal("retire me", BTreeMap::new()).unwrap();
    goals.retire_goal(&id).unwrap();
    let err = goals.complete_goal(&id).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidTransition {
            from: "retired",
            to: "completed",
            ..
        }
    ));
    let missing = goals.complete_goal(&GoalId::new("goal-999")).unwrap_err();
    assert!(matches!(missing, RegistryError::NotFound(_)));
}

// ============================================================================
// SECTION: Constraints
// ============================================================================

#[test]
fn max_threshold_is_strictly_greater() {
    let constraints = ConstraintHandler::new();
    constraints.add_constraint("resources", "cpu cap", json!({"max_cpu": 4}), true).unwrap();

    let at_limit = constraints.evaluate(&ctx(json!({"required_resources": {"cpu": 4}}))).unwrap();
    assert!(at_limit.violations.is_empty());

    let over = constraints.evaluate(&ctx(json!({"required_resources": {"cpu": 5}}))).unwrap();
    assert_eq!(over.violations.len(), 1);
    assert!(over.violations[0].is_hard);
    assert_eq!(over.violations[0].category, "resources");
}

#[test]
fn min_threshold_is_strictly_lower() {
    let constraints = ConstraintHandler::new();
    constraints.add_constraint("quality", "coverage floor", json!({"min_coverage": 0.8}), false).unwrap();

    let under = constraints.evaluate(&ctx(json!({"coverage": 0.5}))).unwrap();
    assert_eq!(under.soft().count(), 1);
    let at = constraints.evaluate(&ctx(json!({"coverage": 0.8}))).unwrap();
    assert!(at.violations.is_empty());
}

#[test]
fn required_resources_take_precedence_over_top_level_fields() {
    let constraints = ConstraintHandler::new();
    constraints.add_constraint("resources", "memory", json!({"max_memory": 10}), true).unwrap();
    let evaluation = constraints
        .evaluate(&ctx(json!({"memory": 50, "required_resources": {"memory": 5}})))
        .unwrap();
    assert!(evaluation.violations.is_empty());

    let fallback = constraints.evaluate(&ctx(json!({"memory": 50}))).unwrap();
    assert_eq!(fallback.violations.len(), 1);
}

#[test]
fn resource_demands_are_read_through_the_context_accessor() {
    let context = ctx(json!({"cpu": 1, "required_resources": {"cpu": 8, "disk": null}}));
    assert_eq!(context.required_resource("cpu"), Some(&json!(8)));
    assert_eq!(context.required_resource("gpu"), None);

    let constraints = ConstraintHandler::new();
    constraints.add_constraint("resources", "cpu", json!({"max_cpu": 2}), true).unwrap();
    constraints.add_constraint("resources", "disk", json!({"max_disk": 1}), false).unwrap();
    let evaluation = constraints
        .evaluate(&ctx(json!({"disk": 4, "required_resources": {"cpu": 8, "disk": null}})))
        .unwrap();
    assert_eq!(evaluation.violations.len(), 2);
    assert!(evaluation.violations[0].reason.starts_with("required_resources.cpu = 8"));
    assert!(evaluation.violations[1].reason.starts_with("disk = 4"));
}

#[test]
fn absent_fields_do_not_apply() {
    let constraints = ConstraintHandler::new();
    constraints.add_constraint("resources", "cpu", json!({"max_cpu": 1, "owner": "ops"}), true).unwrap();
    let evaluation = constraints.evaluate(&ctx(json!({"priority": 3}))).unwrap();
    assert!(evaluation.violations.is_empty());
    assert!(evaluation.warnings.is_empty());
}

#[test]
fn non_numeric_context_value_is_skipped_with_warning() {
    let constraints = ConstraintHandler::new();
    let broken =
        constraints.add_constraint("resources", "cpu", json!({"max_cpu": 1}), true).unwrap();
    constraints.add_constraint("resources", "gpu", json!({"max_gpu": 1}), true).unwrap();
    let evaluation = constraints
        .evaluate(&ctx(json!({"required_resources": {"cpu": "lots", "gpu": 2}})))
        .unwrap();
    assert_eq!(evaluation.violations.len(), 1);
    assert_eq!(evaluation.warnings.len(), 1);
    assert_eq!(evaluation.warnings[0].rule_kind, RuleKind::Constraint);
    assert_eq!(evaluation.warnings[0].rule_id, broken.to_string());
}

#[test]
fn constraint_registration_validates_parameters() {
    let constraints = ConstraintHandler::new();
    assert!(matches!(
        constraints.add_constraint("resources", "", json!([1, 2]), true),
        Err(RegistryError::Invalid(_))
    ));
    assert!(matches!(
        constraints.add_constraint("resources", "", json!({"max_cpu": "four"}), true),
        Err(RegistryError::Invalid(_))
    ));
    assert!(matches!(
        constraints.add_constraint("resources", "", json!({"max_": 4}), true),
        Err(RegistryError::Invalid(_))
    ));
    assert!(matches!(
        constraints.add_constraint("  ", "", json!({}), true),
        Err(RegistryError::Invalid(_))
    ));
}

#[test]
fn removed_constraints_stop_applying() {
    let constraints = ConstraintHandler::new();
    let id = constraints.add_constraint("resources", "cpu", json!({"max_cpu": 1}), true).unwrap();
    let context = ctx(json!({"cpu": 3}));
    assert_eq!(constraints.evaluate(&context).unwrap().violations.len(), 1);
    constraints.remove_constraint(&id).unwrap();
    assert!(constraints.evaluate(&context).unwrap().violations.is_empty());
    assert!(matches!(constraints.remove_constraint(&id), Err(RegistryError::NotFound(_))));
}

// ============================================================================
// SECTION: Risk
// ============================================================================

#[test]
fn aggregate_risk_is_the_maximum_score() {
    let risks = RiskAssessor::new();
    risks.add_risk_factor("deploy", "rollback", 0.5, 0.4, vec!["canary".into()]).unwrap();
    risks
        .add_risk_factor("deploy", "outage", 0.9, 0.5, vec!["canary".into(), "page".into()])
        .unwrap();
    risks.add_risk_factor("*", "baseline", 0.1, 0.1, vec![]).unwrap();

    let assessment = risks.assess(&ctx(json!({"action_type": "deploy"}))).unwrap();
    assert_eq!(assessment.triggered.len(), 3);
    assert!((assessment.aggregate_risk - 0.45).abs() < 1e-9);
    assert_eq!(assessment.mitigations, vec!["canary".to_string(), "page".to_string()]);
}

#[test]
fn wildcard_and_prefix_categories_match() {
    let risks = RiskAssessor::new();
    risks.add_risk_factor("deploy.*", "prod", 1.0, 0.5, vec![]).unwrap();
    risks.add_risk_factor("*", "all", 0.2, 0.5, vec![]).unwrap();

    let prod = risks.assess(&ctx(json!({"action_type": "deploy.prod"}))).unwrap();
    assert_eq!(prod.triggered.len(), 2);

    let missing = risks.assess(&DecisionContext::new()).unwrap();
    assert_eq!(missing.triggered.len(), 1);
    assert!((missing.aggregate_risk - 0.1).abs() < 1e-9);
}

#[test]
fn non_string_action_type_warns_and_matches_only_wildcards() {
    let risks = RiskAssessor::new();
    risks.add_risk_factor("deploy", "specific", 1.0, 1.0, vec![]).unwrap();
    let assessment = risks.assess(&ctx(json!({"action_type": 7}))).unwrap();
    assert!(assessment.triggered.is_empty());
    assert!(assessment.aggregate_risk.abs() < f64::EPSILON);
    assert_eq!(assessment.warnings.len(), 1);
    assert_eq!(assessment.warnings[0].rule_kind, RuleKind::RiskFactor);
}

#[test]
fn risk_factor_inputs_are_validated() {
    let risks = RiskAssessor::new();
    assert!(matches!(
        risks.add_risk_factor("deploy", "", 1.5, 0.5, vec![]),
        Err(RegistryError::Invalid(_))
    ));
    assert!(matches!(
        risks.add_risk_factor("deploy", "", 0.5, f64::NAN, vec![]),
        Err(RegistryError::Invalid(_))
    ));
    assert!(matches!(
        risks.add_risk_factor("", "", 0.5, 0.5, vec![]),
        Err(RegistryError::Invalid(_))
    ));
}

#[test]
fn re_registration_replaces_in_place() {
    let risks = RiskAssessor::new();
    let id = RiskId::new("outage");
    risks.register_risk_factor(id.clone(), "deploy", "v1", 0.5, 0.5, vec![]).unwrap();
    risks.add_risk_factor("deploy", "other", 0.1, 0.1, vec![]).unwrap();
    risks.register_risk_factor(id.clone(), "deploy", "v2", 1.0, 1.0, vec![]).unwrap();

    let factors = risks.list().unwrap();
    assert_eq!(factors.len(), 2);
    assert_eq!(factors[0].id, id);
    assert_eq!(factors[0].description, "v2");

    risks.remove_risk_factor(&id).unwrap();
    assert_eq!(risks.list().unwrap().len(), 1);
}
