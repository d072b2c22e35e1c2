// crates/adaptive-gate-core/src/runtime/constraints.rs
// ============================================================================
// Module: Constraint Handler
// Description: Registry and evaluator for hard and soft policy constraints.
// Purpose: Detect threshold violations in decision contexts.
// Dependencies: crate::core, crate::runtime::registry, serde_json
// ============================================================================

//! ## Overview
//! Each `max_<field>` parameter is violated when the context value is strictly
//! greater than the threshold; each `min_<field>` parameter when it is
//! strictly lower. `<field>` is read from `required_resources.<field>` first
//! and from the top-level `<field>` otherwise (dotted paths are allowed).
//! Absent or `null` fields do not apply. A non-numeric context value makes the
//! whole constraint unevaluable: it is skipped and reported as a warning while
//! the remaining constraints are still evaluated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::RwLock;

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::core::Constraint;
use crate::core::ConstraintId;
use crate::core::ConstraintViolation;
use crate::core::DecisionContext;
use crate::core::EvaluationWarning;
use crate::core::RuleKind;
use crate::core::constraint::MAX_PREFIX;
use crate::core::constraint::MIN_PREFIX;
use crate::core::context::REQUIRED_RESOURCES_FIELD;
use crate::runtime::registry::IdSequence;
use crate::runtime::registry::RegistryError;
use crate::runtime::registry::validate_label;

// ============================================================================
// SECTION: Evaluation Result
// ============================================================================

/// Result of evaluating every registered constraint against a context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintEvaluation {
    /// Violations in registration order.
    pub violations: Vec<ConstraintViolation>,
    /// Constraints skipped because the context was malformed.
    pub warnings: Vec<EvaluationWarning>,
}

impl ConstraintEvaluation {
    /// Returns hard violations.
    pub fn hard(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.violations.iter().filter(|violation| violation.is_hard)
    }

    /// Returns soft violations.
    pub fn soft(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.violations.iter().filter(|violation| !violation.is_hard)
    }
}

// ============================================================================
// SECTION: Threshold Rules
// ============================================================================

/// Direction of a threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// Violated above the threshold.
    Max,
    /// Violated below the threshold.
    Min,
}

/// Threshold parsed from a constraint parameter.
#[derive(Debug, Clone)]
struct Threshold<'a> {
    /// Parameter key, e.g. `max_cpu`.
    key: &'a str,
    /// Field name after the prefix.
    field: &'a str,
    /// Comparison direction.
    bound: Bound,
    /// Threshold value.
    limit: &'a Number,
}

/// Extracts threshold rules from constraint parameters.
///
/// Registration guarantees every prefixed key carries a numeric threshold.
fn thresholds(parameters: &Map<String, Value>) -> impl Iterator<Item = Threshold<'_>> {
    parameters.iter().filter_map(|(key, value)| {
        let (field, bound) = split_threshold_key(key)?;
        let Value::Number(limit) = value else {
            return None;
        };
        Some(Threshold {
            key,
            field,
            bound,
            limit,
        })
    })
}

/// Splits a `max_`/`min_` key into its field and bound.
fn split_threshold_key(key: &str) -> Option<(&str, Bound)> {
    key.strip_prefix(MAX_PREFIX)
        .map(|field| (field, Bound::Max))
        .or_else(|| key.strip_prefix(MIN_PREFIX).map(|field| (field, Bound::Min)))
}

/// Resolves the context value a threshold applies to.
fn resolve_field<'a>(context: &'a DecisionContext, field: &str) -> Option<(String, &'a Value)> {
    if let Some(value) = context.required_resource(field).filter(|value| !value.is_null()) {
        return Some((format!("{REQUIRED_RESOURCES_FIELD}.{field}"), value));
    }
    context
        .lookup(field)
        .filter(|value| !value.is_null())
        .map(|value| (field.to_string(), value))
}

// ============================================================================
// SECTION: Constraint Handler
// ============================================================================

/// Thread-safe constraint registry.
#[derive(Debug)]
pub struct ConstraintHandler {
    /// Constraints in registration order.
    constraints: RwLock<Vec<Constraint>>,
    /// Identifier sequence.
    ids: IdSequence,
}

impl Default for ConstraintHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintHandler {
    /// Creates an empty constraint handler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            constraints: RwLock::new(Vec::new()),
            ids: IdSequence::new("constraint"),
        }
    }

    /// Registers a constraint.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Invalid`] when the category is blank, the
    /// parameters are not a JSON object, or a `max_`/`min_` parameter has an
    /// empty field name or a non-numeric threshold.
    pub fn add_constraint(
        &self,
        category: &str,
        description: &str,
        parameters: Value,
        is_hard: bool,
    ) -> Result<ConstraintId, RegistryError> {
        let category = validate_label("constraint category", category)?;
        let Value::Object(parameters) = parameters else {
            return Err(RegistryError::Invalid(
                "constraint parameters must be a json object".to_string(),
            ));
        };
        for (key, value) in &parameters {
            let Some((field, _)) = split_threshold_key(key) else {
                continue;
            };
            if field.is_empty() {
                return Err(RegistryError::Invalid(format!(
                    "constraint parameter {key} has no field name"
                )));
            }
            if !value.is_number() {
                return Err(RegistryError::Invalid(format!(
                    "constraint parameter {key} must be numeric"
                )));
            }
        }
        let mut constraints =
            self.constraints.write().map_err(|_| RegistryError::Poisoned("constraint"))?;
        let id = loop {
            let candidate = ConstraintId::new(self.ids.issue());
            if !constraints.iter().any(|constraint| constraint.id == candidate) {
                break candidate;
            }
        };
        constraints.push(Constraint {
            id: id.clone(),
            category,
            description: description.trim().to_string(),
            parameters,
            is_hard,
        });
        Ok(id)
    }

    /// Removes a constraint and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the constraint does not exist.
    pub fn remove_constraint(&self, id: &ConstraintId) -> Result<Constraint, RegistryError> {
        let mut constraints =
            self.constraints.write().map_err(|_| RegistryError::Poisoned("constraint"))?;
        let index = constraints
            .iter()
            .position(|constraint| &constraint.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(constraints.remove(index))
    }

    /// Returns a constraint by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn get(&self, id: &ConstraintId) -> Result<Option<Constraint>, RegistryError> {
        let constraints =
            self.constraints.read().map_err(|_| RegistryError::Poisoned("constraint"))?;
        Ok(constraints.iter().find(|constraint| &constraint.id == id).cloned())
    }

    /// Returns every registered constraint.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn list(&self) -> Result<Vec<Constraint>, RegistryError> {
        let constraints =
            self.constraints.read().map_err(|_| RegistryError::Poisoned("constraint"))?;
        Ok(constraints.clone())
    }

    /// Evaluates every constraint against the context.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn evaluate(
        &self,
        context: &DecisionContext,
    ) -> Result<ConstraintEvaluation, RegistryError> {
        let constraints =
            self.constraints.read().map_err(|_| RegistryError::Poisoned("constraint"))?;
        let mut evaluation = ConstraintEvaluation::default();
        for constraint in constraints.iter() {
            match evaluate_constraint(constraint, context) {
                Ok(Some(violation)) => evaluation.violations.push(violation),
                Ok(None) => {}
                Err(warning) => evaluation.warnings.push(warning),
            }
        }
        Ok(evaluation)
    }
}

/// Evaluates a single constraint.
fn evaluate_constraint(
    constraint: &Constraint,
    context: &DecisionContext,
) -> Result<Option<ConstraintViolation>, EvaluationWarning> {
    let mut reasons = Vec::new();
    for threshold in thresholds(&constraint.parameters) {
        let Some((path, value)) = resolve_field(context, threshold.field) else {
            continue;
        };
        let observed = value.as_f64().ok_or_else(|| EvaluationWarning {
            rule_kind: RuleKind::Constraint,
            rule_id: constraint.id.to_string(),
            message: format!("context field {path} must be numeric for {}", threshold.key),
        })?;
        let Some(limit) = threshold.limit.as_f64() else {
            continue;
        };
        let violated = match threshold.bound {
            Bound::Max => observed > limit,
            Bound::Min => observed < limit,
        };
        if violated {
            let relation = match threshold.bound {
                Bound::Max => "exceeds",
                Bound::Min => "is below",
            };
            reasons.push(format!("{path} = {value} {relation} {} = {}", threshold.key, threshold.limit));
        }
    }
    if reasons.is_empty() {
        return Ok(None);
    }
    Ok(Some(ConstraintViolation {
        id: constraint.id.clone(),
        category: constraint.category.clone(),
        reason: reasons.join("; "),
        is_hard: constraint.is_hard,
    }))
}
