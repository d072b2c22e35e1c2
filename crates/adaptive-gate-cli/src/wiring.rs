// crates/adaptive-gate-cli/src/wiring.rs
// ============================================================================
// Module: Engine Wiring
// Description: Builds model sources, audit sinks, and engines from config.
// Purpose: Turn a validated configuration into a ready decision engine.
// Dependencies: adaptive-gate-config, adaptive-gate-core, adaptive-gate-models
// ============================================================================

//! ## Overview
//! Model sources are ordered tracking server first, then the local artifact,
//! so a transient tracking outage falls through to the file on disk. The
//! engine is seeded from the configured goals, constraints, and risk factors
//! before it is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use adaptive_gate_config::AdaptiveGateConfig;
use adaptive_gate_config::AuditSection;
use adaptive_gate_config::AuditSinkKind;
use adaptive_gate_config::ConfigError;
use adaptive_gate_config::ModelSection;
use adaptive_gate_config::SeedReport;
use adaptive_gate_config::seed_engine;
use adaptive_gate_core::AuditSink;
use adaptive_gate_core::DecisionEngine;
use adaptive_gate_core::DecisionError;
use adaptive_gate_core::FileAuditSink;
use adaptive_gate_core::ModelSource;
use adaptive_gate_core::NoopAuditSink;
use adaptive_gate_core::StderrAuditSink;
use adaptive_gate_models::LocalArtifactSource;
use adaptive_gate_models::TrackingConfig;
use adaptive_gate_models::TrackingServerSource;
use adaptive_gate_models::TrackingSetupError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while wiring an engine from configuration.
#[derive(Debug, Error)]
pub enum WiringError {
    /// Tracking source could not be created.
    #[error(transparent)]
    Tracking(#[from] TrackingSetupError),
    /// Audit sink could not be opened.
    #[error("audit sink unavailable: {0}")]
    Audit(String),
    /// Engine rejected its configuration.
    #[error(transparent)]
    Engine(#[from] DecisionError),
    /// Registry seeding failed.
    #[error(transparent)]
    Seed(#[from] ConfigError),
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Engine built from configuration with the identifiers it was seeded with.
pub struct WiredEngine {
    /// Ready decision engine.
    pub engine: DecisionEngine,
    /// Seeded registry identifiers.
    pub seeds: SeedReport,
}

/// Builds and seeds a decision engine from validated configuration.
///
/// # Errors
///
/// Returns [`WiringError`] when a model source, the audit sink, or the
/// engine cannot be created, or when seeding fails.
pub fn build_engine(config: &AdaptiveGateConfig) -> Result<WiredEngine, WiringError> {
    let mut builder = DecisionEngine::builder(config.engine_config())
        .audit_sink(audit_sink(&config.audit)?)
        .confidence_policy(config.confidence_policy());
    for source in model_sources(&config.model)? {
        builder = builder.model_source(source);
    }
    let engine = builder.build()?;
    let seeds = seed_engine(config, &engine)?;
    Ok(WiredEngine {
        engine,
        seeds,
    })
}

/// Builds model sources in resolution order.
///
/// # Errors
///
/// Returns [`WiringError::Tracking`] when the tracking endpoint is unusable.
pub fn model_sources(model: &ModelSection) -> Result<Vec<Arc<dyn ModelSource>>, WiringError> {
    let mut sources: Vec<Arc<dyn ModelSource>> = Vec::new();
    if let Some(endpoint) = &model.tracking_endpoint {
        let tracking = TrackingServerSource::new(TrackingConfig {
            timeout_ms: model.tracking_timeout_ms,
            retry_backoff_ms: model.retry_backoff_ms,
            allow_http: model.allow_http,
            max_response_bytes: model.max_artifact_bytes,
            ..TrackingConfig::new(endpoint.trim())
        })?;
        sources.push(Arc::new(tracking));
    }
    if let Some(path) = &model.artifact_path {
        let mut local =
            LocalArtifactSource::new(path.trim()).with_max_bytes(model.max_artifact_bytes);
        if let Some(version) = model.pinned_version() {
            local = local.with_version(version);
        }
        sources.push(Arc::new(local));
    }
    Ok(sources)
}

/// Builds the configured audit sink.
///
/// # Errors
///
/// Returns [`WiringError::Audit`] when the audit file cannot be opened.
pub fn audit_sink(audit: &AuditSection) -> Result<Arc<dyn AuditSink>, WiringError> {
    match audit.sink {
        AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
        AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
        AuditSinkKind::File => {
            let path = audit
                .path
                .as_deref()
                .ok_or_else(|| WiringError::Audit("audit.path is required".to_string()))?;
            let sink = FileAuditSink::new(Path::new(path.trim()))
                .map_err(|err| WiringError::Audit(format!("{path}: {err}")))?;
            Ok(Arc::new(sink))
        }
    }
}
