// crates/adaptive-gate-models/src/lib.rs
// ============================================================================
// Module: Adaptive Gate Models
// Description: Built-in model artifact format and model sources.
// Purpose: Supply scoring models to the decision engine from disk or a server.
// Dependencies: adaptive-gate-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! This crate ships the `logistic_v1` artifact format and two
//! [`adaptive_gate_core::ModelSource`] implementations: a local artifact file
//! and a remote tracking server. Both enforce size limits and classify
//! failures so the engine can fall through transient outages while failing
//! closed on corrupt artifacts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod local;
pub mod logistic;
pub mod tracking;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use local::LocalArtifactSource;
pub use logistic::ArtifactError;
pub use logistic::LOGISTIC_FORMAT;
pub use logistic::LogisticArtifact;
pub use logistic::LogisticModel;
pub use tracking::TrackingConfig;
pub use tracking::TrackingServerSource;
pub use tracking::TrackingSetupError;
