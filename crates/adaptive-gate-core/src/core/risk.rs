// crates/adaptive-gate-core/src/core/risk.rs
// ============================================================================
// Module: Risk Types
// Description: Probability and impact risk factors with mitigations.
// Purpose: Define risk factor records and category matching.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A risk factor pairs a probability and an impact, both in `[0, 1]`. Its
//! score is always derived on read so it can never go stale. Categories match
//! an action type exactly, through `*`, or through a trailing wildcard prefix
//! such as `deploy.*`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RiskId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Category matching every action type, including contexts without one.
pub const WILDCARD_CATEGORY: &str = "*";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Registered risk factor.
///
/// # Invariants
/// - `probability` and `impact` are finite and within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Risk factor identifier.
    pub id: RiskId,
    /// Category matched against the context action type.
    pub category: String,
    /// Human-readable description.
    pub description: String,
    /// Likelihood in `[0, 1]`.
    pub probability: f64,
    /// Severity in `[0, 1]`.
    pub impact: f64,
    /// Ordered mitigation action identifiers.
    pub mitigations: Vec<String>,
}

impl RiskFactor {
    /// Returns `probability × impact`.
    #[must_use]
    pub fn risk_score(&self) -> f64 {
        self.probability * self.impact
    }

    /// Returns true when the factor's category applies to the action type.
    #[must_use]
    pub fn matches(&self, action_type: Option<&str>) -> bool {
        category_matches(&self.category, action_type)
    }
}

/// Risk factor triggered by a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredRisk {
    /// Risk factor identifier.
    pub id: RiskId,
    /// Risk factor category.
    pub category: String,
    /// Derived risk score.
    pub risk_score: f64,
    /// Mitigation actions of the factor.
    pub mitigations: Vec<String>,
}

impl From<&RiskFactor> for TriggeredRisk {
    fn from(factor: &RiskFactor) -> Self {
        Self {
            id: factor.id.clone(),
            category: factor.category.clone(),
            risk_score: factor.risk_score(),
            mitigations: factor.mitigations.clone(),
        }
    }
}

// ============================================================================
// SECTION: Category Matching
// ============================================================================

/// Matches a risk category against an optional action type.
#[must_use]
pub fn category_matches(category: &str, action_type: Option<&str>) -> bool {
    if category == WILDCARD_CATEGORY {
        return true;
    }
    let Some(action_type) = action_type else {
        return false;
    };
    if let Some(prefix) = category.strip_suffix('*') {
        return action_type.starts_with(prefix);
    }
    category == action_type
}
