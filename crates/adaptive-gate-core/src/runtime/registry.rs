// crates/adaptive-gate-core/src/runtime/registry.rs
// ============================================================================
// Module: Registry Support
// Description: Shared errors and id sequencing for policy registries.
// Purpose: Keep goal, constraint, and risk registries consistent.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Registries are read on every decision and written rarely. Each one keeps
//! its entries behind a [`std::sync::RwLock`] and issues identifiers from an
//! [`IdSequence`]. Lock poisoning is reported as [`RegistryError::Poisoned`]
//! rather than panicking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registration input is invalid.
    #[error("invalid registration: {0}")]
    Invalid(String),
    /// Entry does not exist.
    #[error("registry entry not found: {0}")]
    NotFound(String),
    /// Status transition is not allowed.
    #[error("invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition {
        /// Entry identifier.
        id: String,
        /// Current status label.
        from: &'static str,
        /// Requested status label.
        to: &'static str,
    },
    /// Registry lock was poisoned by a panicking writer.
    #[error("{0} registry lock poisoned")]
    Poisoned(&'static str),
}

// ============================================================================
// SECTION: Id Sequence
// ============================================================================

/// Monotonic identifier sequence with a fixed prefix.
///
/// # Invariants
/// - Issued identifiers are unique for the lifetime of the sequence.
#[derive(Debug)]
pub struct IdSequence {
    /// Prefix included in every identifier.
    prefix: &'static str,
    /// Next sequence number.
    next: AtomicU64,
}

impl IdSequence {
    /// Creates a sequence starting at 1.
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }

    /// Issues the next identifier.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{seq}", self.prefix)
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Validates that a probability-like value is finite and within `[0, 1]`.
pub(crate) fn validate_unit_interval(field: &str, value: f64) -> Result<f64, RegistryError> {
    if !value.is_finite() || !(0.0 ..= 1.0).contains(&value) {
        return Err(RegistryError::Invalid(format!("{field} must be within [0, 1], got {value}")));
    }
    Ok(value)
}

/// Validates that a label is non-empty after trimming.
pub(crate) fn validate_label(field: &str, value: &str) -> Result<String, RegistryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(trimmed.to_string())
}
