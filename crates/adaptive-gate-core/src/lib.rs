// crates/adaptive-gate-core/src/lib.rs
// ============================================================================
// Module: Adaptive Gate Core Library
// Description: Public API surface for the Adaptive Gate decision engine.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Adaptive Gate core gates autonomous actions by combining rule-based policy
//! (goals, constraints, risk factors) with an optional model probability score
//! under deterministic experiment assignment. It is transport-agnostic and
//! integrates with model stores and audit pipelines through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::FeatureVector;
pub use interfaces::ModelError;
pub use interfaces::ModelHandle;
pub use interfaces::ModelHint;
pub use interfaces::ModelSource;
pub use interfaces::ModelSourceError;
pub use interfaces::ScoringModel;
pub use runtime::AuditSink;
pub use runtime::BucketRange;
pub use runtime::BucketTable;
pub use runtime::ConfidenceInputs;
pub use runtime::ConfidencePolicy;
pub use runtime::ConstraintEvaluation;
pub use runtime::ConstraintHandler;
pub use runtime::DecisionAuditEvent;
pub use runtime::DecisionEngine;
pub use runtime::DecisionEngineBuilder;
pub use runtime::DecisionError;
pub use runtime::EngineConfig;
pub use runtime::ExperimentSettings;
pub use runtime::FileAuditSink;
pub use runtime::GoalManager;
pub use runtime::ModelRegistry;
pub use runtime::ModelRegistryError;
pub use runtime::ModelResolutionEvent;
pub use runtime::ModelResolutionOutcome;
pub use runtime::NoopAuditSink;
pub use runtime::PenalizedConfidence;
pub use runtime::RegistryError;
pub use runtime::RiskAssessment;
pub use runtime::RiskAssessor;
pub use runtime::RuntimeMode;
pub use runtime::StderrAuditSink;
pub use runtime::VariantAssignment;
pub use runtime::VariantSpec;
pub use runtime::VariantSpecError;
pub use runtime::assign_variant;
