// crates/adaptive-gate-core/src/core/context.rs
// ============================================================================
// Module: Decision Context
// Description: Sparse key/value description of a candidate action.
// Purpose: Give rules a typed view over caller-supplied context fields.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`DecisionContext`] is an immutable JSON object supplied per decision.
//! Every field is optional; rules declare which paths they read and treat
//! absence as "does not apply". Well-known fields:
//!
//! - `submission_id`: stable entity identifier, typically the sticky field.
//! - `action_type`: category of the candidate action, matched by risk factors.
//! - `required_resources`: object of numeric resource demands (e.g. `cpu`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Well-Known Fields
// ============================================================================

/// Field holding the submission identifier.
pub const SUBMISSION_ID_FIELD: &str = "submission_id";
/// Field holding the action type matched against risk categories.
pub const ACTION_TYPE_FIELD: &str = "action_type";
/// Field holding the numeric resource demands object.
pub const REQUIRED_RESOURCES_FIELD: &str = "required_resources";

// ============================================================================
// SECTION: Context
// ============================================================================

/// Caller-supplied decision context.
///
/// # Invariants
/// - The context is never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionContext {
    /// Raw context fields.
    fields: Map<String, Value>,
}

impl DecisionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from a JSON object.
    #[must_use]
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self {
            fields,
        }
    }

    /// Creates a context from a JSON value, returning `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::from_map(fields)),
            _ => None,
        }
    }

    /// Returns a copy of the context with an additional field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the raw field map.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns true when the context has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Resolves a dotted path (`required_resources.cpu`) into a value.
    ///
    /// Returns `None` when any segment is missing or traverses a non-object.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Returns the submission identifier when it is a string.
    #[must_use]
    pub fn submission_id(&self) -> Option<&str> {
        self.get(SUBMISSION_ID_FIELD).and_then(Value::as_str)
    }

    /// Returns the action type when it is a string.
    #[must_use]
    pub fn action_type(&self) -> Option<&str> {
        self.get(ACTION_TYPE_FIELD).and_then(Value::as_str)
    }

    /// Returns a numeric resource demand from `required_resources`.
    #[must_use]
    pub fn required_resource(&self, name: &str) -> Option<&Value> {
        self.get(REQUIRED_RESOURCES_FIELD).and_then(Value::as_object).and_then(|map| map.get(name))
    }
}

impl From<Map<String, Value>> for DecisionContext {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}
