// crates/adaptive-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Adaptive Gate Runtime
// Description: Registries, assignment, model resolution, and orchestration.
// Purpose: Execute deterministic gating decisions over shared registries.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime holds the mutable registries and the decision engine that
//! composes them. Every component is `Send + Sync` so a single engine can be
//! shared across worker threads behind an [`std::sync::Arc`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod confidence;
pub mod constraints;
pub mod engine;
pub mod goals;
pub mod model_registry;
pub mod registry;
pub mod risk;
pub mod variant;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::DecisionAuditEvent;
pub use audit::FileAuditSink;
pub use audit::ModelResolutionEvent;
pub use audit::ModelResolutionOutcome;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use confidence::ConfidenceInputs;
pub use confidence::ConfidencePolicy;
pub use confidence::PenalizedConfidence;
pub use constraints::ConstraintEvaluation;
pub use constraints::ConstraintHandler;
pub use engine::DecisionEngine;
pub use engine::DecisionEngineBuilder;
pub use engine::DecisionError;
pub use engine::EngineConfig;
pub use goals::GoalManager;
pub use model_registry::ModelRegistry;
pub use model_registry::ModelRegistryError;
pub use model_registry::RuntimeMode;
pub use registry::RegistryError;
pub use risk::RiskAssessment;
pub use risk::RiskAssessor;
pub use variant::BucketRange;
pub use variant::BucketTable;
pub use variant::ExperimentSettings;
pub use variant::VariantAssignment;
pub use variant::VariantSpec;
pub use variant::VariantSpecError;
pub use variant::assign_variant;
