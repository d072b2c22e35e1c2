// crates/adaptive-gate-core/src/core/constraint.rs
// ============================================================================
// Module: Constraint Types
// Description: Hard and soft policy constraints and their violations.
// Purpose: Define constraint records and threshold parameter conventions.
// Dependencies: crate::core::identifiers, serde, serde_json
// ============================================================================

//! ## Overview
//! Constraint parameters are an opaque JSON object. Keys prefixed with
//! [`MAX_PREFIX`] or [`MIN_PREFIX`] are numeric thresholds over the named
//! context field; every other key is carried as metadata.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::ConstraintId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Parameter prefix for upper-bound thresholds.
pub const MAX_PREFIX: &str = "max_";
/// Parameter prefix for lower-bound thresholds.
pub const MIN_PREFIX: &str = "min_";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Registered policy constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint identifier.
    pub id: ConstraintId,
    /// Constraint category label.
    pub category: String,
    /// Human-readable description.
    pub description: String,
    /// Threshold parameters and metadata.
    pub parameters: Map<String, Value>,
    /// Hard constraints force rejection when violated.
    pub is_hard: bool,
}

/// Constraint violation surfaced on a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Violated constraint identifier.
    pub id: ConstraintId,
    /// Violated constraint category.
    pub category: String,
    /// Human-readable violation reason.
    pub reason: String,
    /// Whether the violated constraint is hard.
    pub is_hard: bool,
}
