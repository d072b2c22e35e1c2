// crates/adaptive-gate-config/src/seed.rs
// ============================================================================
// Module: Registry Seeding
// Description: Registers configured goals, constraints, and risk factors.
// Purpose: Populate engine registries from validated configuration.
// Dependencies: adaptive-gate-core, crate::config
// ============================================================================

//! ## Overview
//! Seeds are registered through the public registry APIs so the same
//! validation applies to configured and programmatic registrations. Errors
//! name the offending list entry, e.g. `constraints[2]`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use adaptive_gate_core::ConstraintHandler;
use adaptive_gate_core::ConstraintId;
use adaptive_gate_core::DecisionEngine;
use adaptive_gate_core::GoalId;
use adaptive_gate_core::GoalManager;
use adaptive_gate_core::RegistryError;
use adaptive_gate_core::RiskAssessor;
use adaptive_gate_core::RiskId;
use serde::Serialize;
use serde_json::Value;

use crate::config::AdaptiveGateConfig;
use crate::config::ConfigError;

// ============================================================================
// SECTION: Report
// ============================================================================

/// Identifiers issued while seeding an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Registered goals in configuration order.
    pub goals: Vec<GoalId>,
    /// Registered constraints in configuration order.
    pub constraints: Vec<ConstraintId>,
    /// Registered risk factors in configuration order.
    pub risk_factors: Vec<RiskId>,
}

// ============================================================================
// SECTION: Seeding
// ============================================================================

/// Registers every configured seed on the engine.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first seed the registries
/// reject.
pub fn seed_engine(
    config: &AdaptiveGateConfig,
    engine: &DecisionEngine,
) -> Result<SeedReport, ConfigError> {
    seed_registries(config, engine.goals(), engine.constraints(), engine.risks())
}

/// Registers seeds against scratch registries to surface errors early.
pub(crate) fn dry_run_seeds(config: &AdaptiveGateConfig) -> Result<(), ConfigError> {
    seed_registries(config, &GoalManager::new(), &ConstraintHandler::new(), &RiskAssessor::new())
        .map(|_| ())
}

/// Registers seeds on the given registries in configuration order.
fn seed_registries(
    config: &AdaptiveGateConfig,
    goals: &GoalManager,
    constraints: &ConstraintHandler,
    risks: &RiskAssessor,
) -> Result<SeedReport, ConfigError> {
    let mut report = SeedReport::default();
    for (index, goal) in config.goals.iter().enumerate() {
        let id = goals
            .create_goal(&goal.description, goal.criteria.clone())
            .map_err(|err| seed_error("goals", index, &err))?;
        report.goals.push(id);
    }
    for (index, constraint) in config.constraints.iter().enumerate() {
        let id = constraints
            .add_constraint(
                &constraint.category,
                &constraint.description,
                Value::Object(constraint.parameters.clone()),
                constraint.is_hard,
            )
            .map_err(|err| seed_error("constraints", index, &err))?;
        report.constraints.push(id);
    }
    for (index, factor) in config.risk_factors.iter().enumerate() {
        let result = match &factor.id {
            Some(id) => risks.register_risk_factor(
                RiskId::new(id.trim()),
                &factor.category,
                &factor.description,
                factor.probability,
                factor.impact,
                factor.mitigations.clone(),
            ),
            None => risks.add_risk_factor(
                &factor.category,
                &factor.description,
                factor.probability,
                factor.impact,
                factor.mitigations.clone(),
            ),
        };
        report.risk_factors.push(result.map_err(|err| seed_error("risk_factors", index, &err))?);
    }
    Ok(report)
}

/// Wraps a registry rejection with the seed location.
fn seed_error(list: &str, index: usize, err: &RegistryError) -> ConfigError {
    ConfigError::Invalid(format!("{list}[{index}]: {err}"))
}
