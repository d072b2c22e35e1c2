// crates/adaptive-gate-core/src/runtime/risk.rs
// ============================================================================
// Module: Risk Assessor
// Description: Registry and aggregator for probability x impact risk factors.
// Purpose: Compute the aggregate risk and mitigations for a context.
// Dependencies: crate::core, crate::runtime::registry
// ============================================================================

//! ## Overview
//! A risk factor is triggered when its category matches the context
//! `action_type`. The aggregate risk is the maximum triggered score, never
//! the sum, so registering many unrelated factors cannot inflate it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::RwLock;

use serde_json::Value;

use crate::core::DecisionContext;
use crate::core::EvaluationWarning;
use crate::core::RiskFactor;
use crate::core::RiskId;
use crate::core::RuleKind;
use crate::core::TriggeredRisk;
use crate::core::context::ACTION_TYPE_FIELD;
use crate::runtime::registry::IdSequence;
use crate::runtime::registry::RegistryError;
use crate::runtime::registry::validate_label;
use crate::runtime::registry::validate_unit_interval;

// ============================================================================
// SECTION: Assessment
// ============================================================================

/// Risk assessment for a single context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskAssessment {
    /// Maximum risk score over triggered factors, 0 when none triggered.
    pub aggregate_risk: f64,
    /// Triggered factors in registration order.
    pub triggered: Vec<TriggeredRisk>,
    /// Union of mitigations in first-seen order.
    pub mitigations: Vec<String>,
    /// Problems reading the context.
    pub warnings: Vec<EvaluationWarning>,
}

// ============================================================================
// SECTION: Risk Assessor
// ============================================================================

/// Thread-safe risk factor registry.
#[derive(Debug)]
pub struct RiskAssessor {
    /// Risk factors in registration order.
    factors: RwLock<Vec<RiskFactor>>,
    /// Identifier sequence.
    ids: IdSequence,
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskAssessor {
    /// Creates an empty risk assessor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            factors: RwLock::new(Vec::new()),
            ids: IdSequence::new("risk"),
        }
    }

    /// Registers a new risk factor under a generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Invalid`] when the category is blank or the
    /// probability or impact falls outside `[0, 1]`.
    pub fn add_risk_factor(
        &self,
        category: &str,
        description: &str,
        probability: f64,
        impact: f64,
        mitigations: Vec<String>,
    ) -> Result<RiskId, RegistryError> {
        let mut factor = build_factor(
            RiskId::new(String::new()),
            category,
            description,
            probability,
            impact,
            mitigations,
        )?;
        let mut factors = self.factors.write().map_err(|_| RegistryError::Poisoned("risk"))?;
        let id = loop {
            let candidate = RiskId::new(self.ids.issue());
            if !factors.iter().any(|existing| existing.id == candidate) {
                break candidate;
            }
        };
        factor.id = id.clone();
        factors.push(factor);
        Ok(id)
    }

    /// Registers a risk factor under an explicit identifier.
    ///
    /// Re-registering an existing identifier replaces the factor in place.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Invalid`] when the identifier or category is
    /// blank or the probability or impact falls outside `[0, 1]`.
    pub fn register_risk_factor(
        &self,
        id: RiskId,
        category: &str,
        description: &str,
        probability: f64,
        impact: f64,
        mitigations: Vec<String>,
    ) -> Result<RiskId, RegistryError> {
        validate_label("risk factor id", id.as_str())?;
        let factor = build_factor(id, category, description, probability, impact, mitigations)?;
        let mut factors = self.factors.write().map_err(|_| RegistryError::Poisoned("risk"))?;
        let id = factor.id.clone();
        match factors.iter_mut().find(|existing| existing.id == factor.id) {
            Some(existing) => *existing = factor,
            None => factors.push(factor),
        }
        Ok(id)
    }

    /// Removes a risk factor and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the factor does not exist.
    pub fn remove_risk_factor(&self, id: &RiskId) -> Result<RiskFactor, RegistryError> {
        let mut factors = self.factors.write().map_err(|_| RegistryError::Poisoned("risk"))?;
        let index = factors
            .iter()
            .position(|factor| &factor.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(factors.remove(index))
    }

    /// Returns every registered risk factor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn list(&self) -> Result<Vec<RiskFactor>, RegistryError> {
        let factors = self.factors.read().map_err(|_| RegistryError::Poisoned("risk"))?;
        Ok(factors.clone())
    }

    /// Assesses the context against every registered factor.
    ///
    /// A non-string `action_type` is reported as a warning and only wildcard
    /// factors apply.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn assess(&self, context: &DecisionContext) -> Result<RiskAssessment, RegistryError> {
        let mut assessment = RiskAssessment::default();
        let action_type = match context.get(ACTION_TYPE_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(action_type)) => Some(action_type.as_str()),
            Some(other) => {
                assessment.warnings.push(EvaluationWarning {
                    rule_kind: RuleKind::RiskFactor,
                    rule_id: ACTION_TYPE_FIELD.to_string(),
                    message: format!("{ACTION_TYPE_FIELD} must be a string, got {other}"),
                });
                None
            }
        };
        let factors = self.factors.read().map_err(|_| RegistryError::Poisoned("risk"))?;
        for factor in factors.iter().filter(|factor| factor.matches(action_type)) {
            let triggered = TriggeredRisk::from(factor);
            assessment.aggregate_risk = assessment.aggregate_risk.max(triggered.risk_score);
            for mitigation in &triggered.mitigations {
                if !assessment.mitigations.contains(mitigation) {
                    assessment.mitigations.push(mitigation.clone());
                }
            }
            assessment.triggered.push(triggered);
        }
        Ok(assessment)
    }
}

/// Validates inputs and builds a risk factor.
fn build_factor(
    id: RiskId,
    category: &str,
    description: &str,
    probability: f64,
    impact: f64,
    mitigations: Vec<String>,
) -> Result<RiskFactor, RegistryError> {
    let category = validate_label("risk factor category", category)?;
    let probability = validate_unit_interval("risk factor probability", probability)?;
    let impact = validate_unit_interval("risk factor impact", impact)?;
    let mut ordered: Vec<String> = Vec::with_capacity(mitigations.len());
    for mitigation in mitigations {
        let mitigation = validate_label("risk factor mitigation", &mitigation)?;
        if !ordered.contains(&mitigation) {
            ordered.push(mitigation);
        }
    }
    Ok(RiskFactor {
        id,
        category,
        description: description.trim().to_string(),
        probability,
        impact,
        mitigations: ordered,
    })
}
