// crates/adaptive-gate-core/src/core/decision.rs
// ============================================================================
// Module: Decision Records
// Description: Gating decisions returned by the decision engine.
// Purpose: Capture outcome, confidence, attribution, and rule diagnostics.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! A [`Decision`] is produced fresh for every call and never mutated after it
//! is returned. `score` and `model_version` serialize as `null` when no model
//! was used so consumers can tell "low score" apart from "no model".

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::constraint::ConstraintViolation;
use crate::core::identifiers::ConstraintId;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::GoalId;
use crate::core::identifiers::ModelVersion;
use crate::core::risk::TriggeredRisk;

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Kind of rule that produced an evaluation warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Constraint threshold rule.
    Constraint,
    /// Risk factor category rule.
    RiskFactor,
    /// Model feature extraction.
    Feature,
}

/// Non-fatal evaluation problem; the offending rule was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWarning {
    /// Rule kind that was skipped.
    pub rule_kind: RuleKind,
    /// Rule identifier (constraint id, risk id, or feature name).
    pub rule_id: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Reason a decision was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A hard constraint was violated.
    HardConstraint {
        /// Violated constraint identifier.
        id: ConstraintId,
    },
    /// Aggregate risk exceeded the configured threshold.
    RiskThreshold {
        /// Observed aggregate risk.
        aggregate_risk: f64,
        /// Configured threshold.
        threshold: f64,
    },
    /// Model score fell below the configured minimum.
    LowScore {
        /// Observed model score.
        score: f64,
        /// Configured minimum score.
        min_score: f64,
    },
}

/// Risk assessment summary attached to a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Maximum risk score over triggered factors.
    pub aggregate_risk: f64,
    /// Configured risk threshold.
    pub threshold: f64,
    /// True when `aggregate_risk` strictly exceeds `threshold`.
    pub exceeded: bool,
    /// Triggered risk factors.
    pub triggered: Vec<TriggeredRisk>,
    /// Union of triggered mitigations in first-seen order.
    pub mitigations: Vec<String>,
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Gating decision for a single context.
///
/// # Invariants
/// - `confidence_score` is within `[0, 1]`.
/// - `can_proceed` is false whenever a hard violation or risk breach exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Decision identifier.
    pub decision_id: DecisionId,
    /// Whether the action may proceed.
    pub can_proceed: bool,
    /// Confidence in `[0, 1]`.
    pub confidence_score: f64,
    /// Model probability, `None` when no model was used.
    pub score: Option<f64>,
    /// Assigned experiment variant.
    pub variant: String,
    /// Version of the model used, `None` when no model was used.
    pub model_version: Option<ModelVersion>,
    /// Goals active at evaluation time.
    pub active_goals: Vec<GoalId>,
    /// Hard and soft constraint violations.
    pub constraint_violations: Vec<ConstraintViolation>,
    /// Risk assessment summary.
    pub risk_summary: RiskSummary,
    /// Reasons for rejection (empty when `can_proceed`).
    pub rejection_reasons: Vec<RejectionReason>,
    /// Rules skipped during evaluation.
    pub warnings: Vec<EvaluationWarning>,
}

impl Decision {
    /// Returns the number of hard constraint violations.
    #[must_use]
    pub fn hard_violation_count(&self) -> usize {
        self.constraint_violations.iter().filter(|violation| violation.is_hard).count()
    }

    /// Returns the number of soft constraint violations.
    #[must_use]
    pub fn soft_violation_count(&self) -> usize {
        self.constraint_violations.iter().filter(|violation| !violation.is_hard).count()
    }
}
