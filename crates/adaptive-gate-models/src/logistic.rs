// crates/adaptive-gate-models/src/logistic.rs
// ============================================================================
// Module: Logistic Model Artifact
// Description: JSON logistic-regression artifacts and their scoring model.
// Purpose: Deserialize trained weights and score feature rows.
// Dependencies: adaptive-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A `logistic_v1` artifact declares ordered feature names, one weight per
//! feature, and a bias. Scoring applies the logistic function to
//! `bias + Σ wᵢxᵢ`. Artifacts are validated on load so a handle never wraps a
//! model that cannot score.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use adaptive_gate_core::FeatureVector;
use adaptive_gate_core::ModelError;
use adaptive_gate_core::ScoringModel;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Artifact format tag accepted by [`LogisticModel`].
pub const LOGISTIC_FORMAT: &str = "logistic_v1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Artifact validation errors.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact bytes are not valid JSON for the schema.
    #[error("artifact is not valid json: {0}")]
    Parse(String),
    /// Artifact declares an unsupported format.
    #[error("unsupported artifact format: {0}")]
    Format(String),
    /// Artifact content is inconsistent.
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// Serialized logistic-regression artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticArtifact {
    /// Format tag; must be [`LOGISTIC_FORMAT`].
    pub format: String,
    /// Version embedded by the training pipeline; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Ordered feature names.
    pub features: Vec<String>,
    /// Weights aligned with `features`.
    pub weights: Vec<f64>,
    /// Intercept term.
    pub bias: f64,
}

impl LogisticArtifact {
    /// Parses an artifact from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Parse`] when the bytes do not match the schema.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        serde_json::from_slice(bytes).map_err(|err| ArtifactError::Parse(err.to_string()))
    }

    /// Parses an artifact from an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Parse`] when the value does not match the schema.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ArtifactError> {
        serde_json::from_value(value).map_err(|err| ArtifactError::Parse(err.to_string()))
    }
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Validated logistic-regression scoring model.
///
/// # Invariants
/// - `features` and `weights` have equal length.
/// - Feature names are non-empty and unique.
/// - Weights and bias are finite.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    /// Ordered feature names.
    features: Vec<String>,
    /// Weights aligned with `features`.
    weights: Vec<f64>,
    /// Intercept term.
    bias: f64,
}

impl LogisticModel {
    /// Validates an artifact and builds the model.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when the format is unknown or the artifact is
    /// inconsistent.
    pub fn from_artifact(artifact: LogisticArtifact) -> Result<Self, ArtifactError> {
        if artifact.format != LOGISTIC_FORMAT {
            return Err(ArtifactError::Format(artifact.format));
        }
        if artifact.features.len() != artifact.weights.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} features but {} weights",
                artifact.features.len(),
                artifact.weights.len()
            )));
        }
        let mut seen = BTreeSet::new();
        for name in &artifact.features {
            if name.trim().is_empty() {
                return Err(ArtifactError::Invalid("feature names must be non-empty".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ArtifactError::Invalid(format!("duplicate feature {name}")));
            }
        }
        if !artifact.bias.is_finite() || artifact.weights.iter().any(|weight| !weight.is_finite())
        {
            return Err(ArtifactError::Invalid("weights and bias must be finite".to_string()));
        }
        Ok(Self {
            features: artifact.features,
            weights: artifact.weights,
            bias: artifact.bias,
        })
    }

    /// Returns the intercept term.
    #[must_use]
    pub const fn bias(&self) -> f64 {
        self.bias
    }

    /// Returns the weights in feature order.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Scores a single row.
    fn score_row(&self, row: &FeatureVector) -> Result<f64, ModelError> {
        if row.len() != self.weights.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.weights.len(),
                actual: row.len(),
            });
        }
        let logit = self
            .weights
            .iter()
            .zip(row.values())
            .fold(self.bias, |acc, (weight, value)| weight.mul_add(*value, acc));
        Ok(sigmoid(logit))
    }
}

impl ScoringModel for LogisticModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        batch.iter().map(|row| self.score_row(row)).collect()
    }
}

/// Numerically stable logistic function.
fn sigmoid(logit: f64) -> f64 {
    if logit >= 0.0 {
        1.0 / (1.0 + (-logit).exp())
    } else {
        let exp = logit.exp();
        exp / (1.0 + exp)
    }
}
