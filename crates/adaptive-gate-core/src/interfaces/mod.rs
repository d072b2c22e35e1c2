// crates/adaptive-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Adaptive Gate Interfaces
// Description: Backend-agnostic interfaces for scoring models and model sources.
// Purpose: Define the contract surfaces used by the decision engine.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Adaptive Gate consumes trained models without
//! embedding a particular artifact store or ML runtime. A [`ModelSource`]
//! turns a [`ModelHint`] into a versioned [`ModelHandle`]; the handle wraps a
//! [`ScoringModel`] that maps feature batches to probabilities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::core::identifiers::ModelVersion;
use crate::core::identifiers::NamespaceId;

// ============================================================================
// SECTION: Scoring Model
// ============================================================================

/// Dense feature row in the order given by [`ScoringModel::feature_names`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// Feature values.
    values: Vec<f64>,
}

impl FeatureVector {
    /// Creates a feature vector from values.
    #[must_use]
    pub const fn new(values: Vec<f64>) -> Self {
        Self {
            values,
        }
    }

    /// Returns the feature values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the vector has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Model scoring errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Feature vector shape does not match the model.
    #[error("feature shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected feature count.
        expected: usize,
        /// Supplied feature count.
        actual: usize,
    },
    /// Model reported an error.
    #[error("model error: {0}")]
    Model(String),
}

/// Trained model exposing probability prediction over a feature batch.
pub trait ScoringModel: Send + Sync {
    /// Returns feature names in the order the model expects them.
    fn feature_names(&self) -> &[String];

    /// Predicts a probability for each row of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when a row cannot be scored.
    fn predict_proba(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ModelError>;
}

// ============================================================================
// SECTION: Model Handle
// ============================================================================

/// Loaded, versioned scoring model.
#[derive(Clone)]
pub struct ModelHandle {
    /// Model version label.
    version: ModelVersion,
    /// Label of the source that produced the model.
    source: String,
    /// Shared scoring model.
    model: Arc<dyn ScoringModel>,
}

impl ModelHandle {
    /// Creates a new model handle.
    #[must_use]
    pub fn new(
        version: ModelVersion,
        source: impl Into<String>,
        model: Arc<dyn ScoringModel>,
    ) -> Self {
        Self {
            version,
            source: source.into(),
            model,
        }
    }

    /// Returns the model version.
    #[must_use]
    pub const fn version(&self) -> &ModelVersion {
        &self.version
    }

    /// Returns the source label.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the scoring model.
    #[must_use]
    pub fn model(&self) -> &dyn ScoringModel {
        self.model.as_ref()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("version", &self.version)
            .field("source", &self.source)
            .field("features", &self.model.feature_names())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Model Source
// ============================================================================

/// Resolution hint passed to model sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHint {
    /// Namespace the engine decides for.
    pub namespace: NamespaceId,
}

/// Model source errors.
#[derive(Debug, Error)]
pub enum ModelSourceError {
    /// Source was unreachable after its retry budget; resolution falls through.
    #[error("model source unavailable: {0}")]
    Transient(String),
    /// Artifact exists but cannot be deserialized; resolution stops.
    #[error("model artifact load failed: {0}")]
    Load(String),
}

/// Loader capability resolving a model handle from a configured source.
pub trait ModelSource: Send + Sync {
    /// Returns a stable label for audit and diagnostics.
    fn label(&self) -> &str;

    /// Resolves the current model.
    ///
    /// Returns `Ok(None)` when this source has no model to offer.
    ///
    /// # Errors
    ///
    /// Returns [`ModelSourceError::Transient`] when the source is unreachable
    /// and [`ModelSourceError::Load`] when the artifact is undeserializable.
    fn resolve(&self, hint: &ModelHint) -> Result<Option<ModelHandle>, ModelSourceError>;
}
