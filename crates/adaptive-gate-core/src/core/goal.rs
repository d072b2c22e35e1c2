// crates/adaptive-gate-core/src/core/goal.rs
// ============================================================================
// Module: Goal Types
// Description: Weighted objectives tracked by the goal manager.
// Purpose: Define goal records and their status lifecycle.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Goals are weighted objectives. Criteria weights live in `[0, 1]` but need
//! not sum to 1, and goals are not reconciled against each other.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::GoalId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Goal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Goal is reported on decisions.
    Active,
    /// Goal was achieved.
    Completed,
    /// Goal was withdrawn.
    Retired,
}

impl GoalStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Retired => "retired",
        }
    }
}

/// Registered goal.
///
/// # Invariants
/// - Criterion weights are finite and within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Goal identifier.
    pub id: GoalId,
    /// Human-readable description.
    pub description: String,
    /// Criterion name to target weight.
    pub criteria: BTreeMap<String, f64>,
    /// Current lifecycle status.
    pub status: GoalStatus,
}

impl Goal {
    /// Returns true when the goal is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }
}
