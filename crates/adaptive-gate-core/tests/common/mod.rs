// crates/adaptive-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for adaptive-gate-core tests.
// Purpose: Provide fixed models, scripted sources, and recording audit sinks.
// Dependencies: adaptive-gate-core
// ============================================================================

//! ## Overview
//! Provides in-memory model and source doubles plus an audit sink that
//! records every event for later assertions.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use adaptive_gate_core::AuditSink;
use adaptive_gate_core::DecisionAuditEvent;
use adaptive_gate_core::DecisionEngine;
use adaptive_gate_core::EngineConfig;
use adaptive_gate_core::FeatureVector;
use adaptive_gate_core::ModelError;
use adaptive_gate_core::ModelHandle;
use adaptive_gate_core::ModelHint;
use adaptive_gate_core::ModelResolutionEvent;
use adaptive_gate_core::ModelSource;
use adaptive_gate_core::ModelSourceError;
use adaptive_gate_core::ModelVersion;
use adaptive_gate_core::RuntimeMode;
use adaptive_gate_core::ScoringModel;

// ============================================================================
// SECTION: Models
// ============================================================================

/// Model that returns a fixed probability for every row.
pub struct FixedModel {
    /// Declared feature names.
    pub features: Vec<String>,
    /// Probability returned for every row.
    pub probability: f64,
    /// Rows observed on the last call.
    pub seen: Mutex<Vec<FeatureVector>>,
}

impl FixedModel {
    /// Creates a fixed model over the given features.
    pub fn new(features: &[&str], probability: f64) -> Self {
        Self {
            features: features.iter().map(ToString::to_string).collect(),
            probability,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ScoringModel for FixedModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        *self.seen.lock().unwrap() = batch.to_vec();
        Ok(batch.iter().map(|_| self.probability).collect())
    }
}

/// Builds a handle around a fixed model.
pub fn fixed_handle(version: &str, probability: f64) -> ModelHandle {
    ModelHandle::new(
        ModelVersion::new(version).unwrap(),
        "static",
        Arc::new(FixedModel::new(&[], probability)),
    )
}

// ============================================================================
// SECTION: Sources
// ============================================================================

/// Scripted source outcome.
#[derive(Clone)]
pub enum Outcome {
    /// Source offers the handle.
    Model(ModelHandle),
    /// Source has nothing to offer.
    Nothing,
    /// Source is unreachable.
    Transient,
    /// Source has an unreadable artifact.
    Broken,
}

/// Source returning a scripted outcome and counting calls.
pub struct ScriptedSource {
    /// Source label.
    pub label: String,
    /// Outcome returned on every call.
    pub outcome: Mutex<Outcome>,
    /// Number of resolve calls.
    pub calls: AtomicUsize,
    /// Artificial latency per call.
    pub delay: Duration,
}

impl ScriptedSource {
    /// Creates a scripted source.
    pub fn new(label: &str, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        })
    }

    /// Creates a scripted source that sleeps before answering.
    pub fn slow(label: &str, outcome: Outcome, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    /// Replaces the scripted outcome.
    pub fn set(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Returns how many times the source was consulted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelSource for ScriptedSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn resolve(&self, _hint: &ModelHint) -> Result<Option<ModelHandle>, ModelSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        match self.outcome.lock().unwrap().clone() {
            Outcome::Model(handle) => Ok(Some(handle)),
            Outcome::Nothing => Ok(None),
            Outcome::Transient => Err(ModelSourceError::Transient("connection refused".into())),
            Outcome::Broken => Err(ModelSourceError::Load("truncated artifact".into())),
        }
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink recording events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Decision events.
    pub decisions: Mutex<Vec<DecisionAuditEvent>>,
    /// Model resolution events.
    pub resolutions: Mutex<Vec<ModelResolutionEvent>>,
}

impl AuditSink for RecordingAuditSink {
    fn record_decision(&self, event: &DecisionAuditEvent) {
        self.decisions.lock().unwrap().push(event.clone());
    }

    fn record_model_resolution(&self, event: &ModelResolutionEvent) {
        self.resolutions.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Engine Helpers
// ============================================================================

/// Returns a config in the given mode with defaults elsewhere.
pub fn config(mode: RuntimeMode) -> EngineConfig {
    EngineConfig {
        mode,
        ..EngineConfig::default()
    }
}

/// Builds a development engine without model sources.
pub fn rule_only_engine() -> DecisionEngine {
    DecisionEngine::builder(config(RuntimeMode::Development)).build().unwrap()
}

/// Builds an engine backed by a single source.
pub fn engine_with_source(mode: RuntimeMode, source: Arc<dyn ModelSource>) -> DecisionEngine {
    DecisionEngine::builder(config(mode)).model_source(source).build().unwrap()
}
