//! Registry seed tests for adaptive-gate-config.
// crates/adaptive-gate-config/tests/seed_validation.rs
// =============================================================================
// Module: Seed Validation Tests
// Description: Registry seeding from configuration.
// Purpose: Ensure seeds register in order and bad seeds fail at load time.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test-only diagnostics are permitted.")]

use adaptive_gate_config::ConstraintSeed;
use adaptive_gate_config::GoalSeed;
use adaptive_gate_config::RiskFactorSeed;
use adaptive_gate_config::seed_engine;
use adaptive_gate_core::DecisionContext;
use adaptive_gate_core::DecisionEngine;
use adaptive_gate_core::RiskId;
use common::TestResult;
use common::assert_invalid;
use serde_json::json;

mod common;

const SEEDED: &str = r#"
[engine]
mode = "development"

[[goals]]
description = "Keep latency low"
criteria = { latency = 1.7 }

[[goals]]
description = "Stay accurate"

[[constraints]]
category = "resources"
parameters = { max_cpu = 4 }
is_hard = true

[[constraints]]
category = "priority"
parameters = { min_priority = 2 }

[[risk_factors]]
id = "deploy"
category = "deploy"
probability = 0.9
impact = 0.9
mitigations = ["canary"]

[[risk_factors]]
category = "*"
probability = 0.1
impact = 0.1
"#;

fn risk_seed(probability: f64) -> RiskFactorSeed {
    RiskFactorSeed {
        id: None,
        category: "deploy".to_string(),
        description: String::new(),
        probability,
        impact: 0.5,
        mitigations: Vec::new(),
    }
}

#[test]
fn seeds_register_in_order() -> TestResult {
    let config = common::config_from_toml(SEEDED).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    let engine = DecisionEngine::builder(config.engine_config())
        .build()
        .map_err(|err| err.to_string())?;
    let report = seed_engine(&config, &engine).map_err(|err| err.to_string())?;
    if report.goals.len() != 2 || report.constraints.len() != 2 || report.risk_factors.len() != 2 {
        return Err(format!("unexpected seed counts: {report:?}"));
    }
    if report.risk_factors.first() != Some(&RiskId::new("deploy")) {
        return Err("explicit risk id should be kept".to_string());
    }
    let goals = engine.goals().list_active_goals().map_err(|err| err.to_string())?;
    let weight = goals.first().and_then(|goal| goal.criteria.get("latency").copied());
    if weight != Some(1.0) {
        return Err(format!("goal weight should clamp to 1.0, got {weight:?}"));
    }
    Ok(())
}

#[test]
fn seeded_engine_applies_policy() -> TestResult {
    let config = common::config_from_toml(SEEDED).map_err(|err| err.to_string())?;
    let engine = DecisionEngine::builder(config.engine_config())
        .build()
        .map_err(|err| err.to_string())?;
    seed_engine(&config, &engine).map_err(|err| err.to_string())?;

    let context = DecisionContext::from_value(json!({
        "submission_id": "sub-1",
        "action_type": "deploy",
        "priority": 1,
        "required_resources": {"cpu": 8}
    }))
    .ok_or_else(|| "context must be an object".to_string())?;
    let decision = engine.make_decision(&context).map_err(|err| err.to_string())?;
    if decision.can_proceed {
        return Err("hard cpu violation and deploy risk should reject".to_string());
    }
    if decision.constraint_violations.len() != 2 {
        return Err(format!("expected two violations, got {:?}", decision.constraint_violations));
    }
    if decision.risk_summary.mitigations != vec!["canary".to_string()] {
        return Err(format!("unexpected mitigations {:?}", decision.risk_summary.mitigations));
    }
    Ok(())
}

#[test]
fn blank_goal_description_fails_validation() -> TestResult {
    let mut config = common::dev_config().map_err(|err| err.to_string())?;
    config.goals.push(GoalSeed {
        description: "  ".to_string(),
        criteria: std::collections::BTreeMap::new(),
    });
    assert_invalid(config.validate(), "goals[0]")
}

#[test]
fn non_numeric_threshold_fails_validation() -> TestResult {
    let mut config = common::dev_config().map_err(|err| err.to_string())?;
    let parameters = json!({"max_cpu": "four"});
    let Some(parameters) = parameters.as_object().cloned() else {
        return Err("fixture must be an object".to_string());
    };
    config.constraints.push(ConstraintSeed {
        category: "resources".to_string(),
        description: String::new(),
        parameters,
        is_hard: false,
    });
    assert_invalid(config.validate(), "constraints[0]")
}

#[test]
fn out_of_range_risk_fails_validation() -> TestResult {
    let mut config = common::dev_config().map_err(|err| err.to_string())?;
    config.risk_factors.push(risk_seed(0.5));
    config.risk_factors.push(risk_seed(1.5));
    assert_invalid(config.validate(), "risk_factors[1]")
}

#[test]
fn validation_does_not_touch_engine_registries() -> TestResult {
    let config = common::config_from_toml(SEEDED).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    let engine = DecisionEngine::builder(config.engine_config())
        .build()
        .map_err(|err| err.to_string())?;
    let goals = engine.goals().list_goals().map_err(|err| err.to_string())?;
    if !goals.is_empty() {
        return Err("validation must not register seeds".to_string());
    }
    Ok(())
}
