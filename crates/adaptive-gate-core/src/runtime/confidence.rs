// crates/adaptive-gate-core/src/runtime/confidence.rs
// ============================================================================
// Module: Confidence Policy
// Description: Pluggable blending of score, risk, and soft violations.
// Purpose: Produce a bounded confidence score for each decision.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The engine delegates the confidence formula to a [`ConfidencePolicy`].
//! [`PenalizedConfidence`] is the default: it starts from the model score (or
//! `1 - aggregate_risk` without a model) and subtracts a fixed penalty per
//! soft violation. Results are always clamped to `[0, 1]`.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default penalty applied per soft constraint violation.
pub const DEFAULT_SOFT_VIOLATION_PENALTY: f64 = 0.1;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Signals available to a confidence policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    /// Model probability when a model was used.
    pub score: Option<f64>,
    /// Aggregate risk in `[0, 1]`.
    pub aggregate_risk: f64,
    /// Number of soft constraint violations.
    pub soft_violations: usize,
    /// Number of hard constraint violations.
    pub hard_violations: usize,
}

/// Strategy computing a decision's confidence score.
pub trait ConfidencePolicy: Send + Sync {
    /// Returns the confidence for the inputs; the engine clamps it to `[0, 1]`.
    fn confidence(&self, inputs: &ConfidenceInputs) -> f64;
}

/// Default policy: base signal minus a per-soft-violation penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenalizedConfidence {
    /// Penalty subtracted per soft violation.
    pub soft_violation_penalty: f64,
}

impl Default for PenalizedConfidence {
    fn default() -> Self {
        Self {
            soft_violation_penalty: DEFAULT_SOFT_VIOLATION_PENALTY,
        }
    }
}

impl ConfidencePolicy for PenalizedConfidence {
    fn confidence(&self, inputs: &ConfidenceInputs) -> f64 {
        let base = inputs.score.unwrap_or(1.0 - inputs.aggregate_risk);
        let violations = u32::try_from(inputs.soft_violations).unwrap_or(u32::MAX);
        let penalty = self.soft_violation_penalty.max(0.0) * f64::from(violations);
        clamp_unit(base - penalty)
    }
}

/// Clamps a value into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
