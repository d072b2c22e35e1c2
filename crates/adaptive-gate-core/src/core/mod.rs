// crates/adaptive-gate-core/src/core/mod.rs
// ============================================================================
// Module: Adaptive Gate Core Types
// Description: Canonical context, policy, and decision structures.
// Purpose: Provide stable, serializable types shared by every engine component.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types describe decision contexts, registered policy entities (goals,
//! constraints, risk factors), and the decision records returned to callers.
//! These types are the canonical source of truth for any surface that wraps
//! the engine (HTTP, CLI, persistence).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod constraint;
pub mod context;
pub mod decision;
pub mod goal;
pub mod hashing;
pub mod identifiers;
pub mod risk;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use constraint::Constraint;
pub use constraint::ConstraintViolation;
pub use context::DecisionContext;
pub use decision::Decision;
pub use decision::EvaluationWarning;
pub use decision::RejectionReason;
pub use decision::RiskSummary;
pub use decision::RuleKind;
pub use goal::Goal;
pub use goal::GoalStatus;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::ConstraintId;
pub use identifiers::DecisionId;
pub use identifiers::DecisionIdGenerator;
pub use identifiers::GoalId;
pub use identifiers::IdentifierError;
pub use identifiers::ModelVersion;
pub use identifiers::NamespaceId;
pub use identifiers::RiskId;
pub use risk::RiskFactor;
pub use risk::TriggeredRisk;
