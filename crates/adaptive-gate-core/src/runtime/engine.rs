// crates/adaptive-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: Decision Engine
// Description: Orchestrates assignment, policy, risk, and scoring into decisions.
// Purpose: Provide the single `make_decision` entry point for callers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The decision engine composes the variant assigner, model registry, goal
//! manager, constraint handler, and risk assessor. Each call to
//! [`DecisionEngine::make_decision`] is an independent transaction over the
//! registries as they stand; the only state carried across calls is the
//! cached model handle.
//!
//! Gating rejects when any hard constraint is violated, when the aggregate
//! risk strictly exceeds the threshold, or when a model score falls below the
//! minimum. Confidence is delegated to a [`ConfidencePolicy`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::RwLock;

use serde_json::Value;
use thiserror::Error;

use crate::core::Decision;
use crate::core::DecisionContext;
use crate::core::DecisionIdGenerator;
use crate::core::EvaluationWarning;
use crate::core::NamespaceId;
use crate::core::RejectionReason;
use crate::core::RiskSummary;
use crate::core::RuleKind;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::hash_canonical_json;
use crate::interfaces::FeatureVector;
use crate::interfaces::ModelHandle;
use crate::interfaces::ModelHint;
use crate::interfaces::ModelSource;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::DecisionAuditEvent;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::confidence::ConfidenceInputs;
use crate::runtime::confidence::ConfidencePolicy;
use crate::runtime::confidence::PenalizedConfidence;
use crate::runtime::confidence::clamp_unit;
use crate::runtime::constraints::ConstraintHandler;
use crate::runtime::goals::GoalManager;
use crate::runtime::model_registry::ModelRegistry;
use crate::runtime::model_registry::ModelRegistryError;
use crate::runtime::model_registry::RuntimeMode;
use crate::runtime::registry::RegistryError;
use crate::runtime::risk::RiskAssessor;
use crate::runtime::variant::ExperimentSettings;
use crate::runtime::variant::VariantSpec;
use crate::runtime::variant::VariantSpecError;
use crate::runtime::variant::assign_variant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default minimum acceptable model score.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;
/// Default aggregate risk threshold.
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.7;
/// Default namespace for model tracking.
pub const DEFAULT_NAMESPACE: &str = "default";

// ============================================================================
// SECTION: Engine Configuration
// ============================================================================

/// Configuration for the decision engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Namespace the engine decides for.
    pub namespace: NamespaceId,
    /// Runtime mode.
    pub mode: RuntimeMode,
    /// Initial experiment settings.
    pub experiment: ExperimentSettings,
    /// Minimum acceptable model score.
    pub min_score: f64,
    /// Aggregate risk threshold.
    pub risk_threshold: f64,
    /// Hash algorithm used for audit context hashes.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: NamespaceId::new(DEFAULT_NAMESPACE),
            mode: RuntimeMode::default(),
            experiment: ExperimentSettings::default(),
            min_score: DEFAULT_MIN_SCORE,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }
}

impl EngineConfig {
    /// Validates thresholds and the experiment split.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Configuration`] when a value is out of range.
    pub fn validate(&self) -> Result<(), DecisionError> {
        if self.namespace.as_str().trim().is_empty() {
            return Err(DecisionError::Configuration("namespace must be non-empty".to_string()));
        }
        validate_threshold("min_score", self.min_score)?;
        validate_threshold("risk_threshold", self.risk_threshold)?;
        VariantSpec::parse(&self.experiment.split)?;
        Ok(())
    }
}

/// Validates a configured threshold lies within `[0, 1]`.
fn validate_threshold(field: &str, value: f64) -> Result<(), DecisionError> {
    if !value.is_finite() || !(0.0 ..= 1.0).contains(&value) {
        return Err(DecisionError::Configuration(format!("{field} must be within [0, 1]")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Decision engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    /// Configuration is malformed or incomplete.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// No scoring model is available in production mode.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// A model artifact exists but cannot be loaded.
    #[error("model load error: {0}")]
    ModelLoad(String),
    /// The model failed to score the context.
    #[error("scoring error: {0}")]
    Scoring(String),
    /// Internal engine failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<VariantSpecError> for DecisionError {
    fn from(error: VariantSpecError) -> Self {
        Self::Configuration(error.to_string())
    }
}

impl From<ModelRegistryError> for DecisionError {
    fn from(error: ModelRegistryError) -> Self {
        match error {
            ModelRegistryError::Unavailable(message) => Self::ModelUnavailable(message),
            ModelRegistryError::Load {
                ..
            } => Self::ModelLoad(error.to_string()),
            ModelRegistryError::Poisoned => Self::Internal(error.to_string()),
        }
    }
}

impl From<RegistryError> for DecisionError {
    fn from(error: RegistryError) -> Self {
        Self::Internal(error.to_string())
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`DecisionEngine`].
pub struct DecisionEngineBuilder {
    /// Engine configuration.
    config: EngineConfig,
    /// Ordered model sources.
    sources: Vec<Arc<dyn ModelSource>>,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Confidence policy.
    confidence: Box<dyn ConfidencePolicy>,
}

impl DecisionEngineBuilder {
    /// Appends a model source; sources are consulted in insertion order.
    #[must_use]
    pub fn model_source(mut self, source: Arc<dyn ModelSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Sets the audit sink.
    #[must_use]
    pub fn audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Sets the confidence policy.
    #[must_use]
    pub fn confidence_policy(mut self, policy: Box<dyn ConfidencePolicy>) -> Self {
        self.confidence = policy;
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Configuration`] when the configuration is invalid.
    pub fn build(self) -> Result<DecisionEngine, DecisionError> {
        self.config.validate()?;
        let hint = ModelHint {
            namespace: self.config.namespace.clone(),
        };
        let models =
            ModelRegistry::new(hint, self.config.mode, self.sources, Arc::clone(&self.audit));
        Ok(DecisionEngine {
            experiment: RwLock::new(self.config.experiment.clone()),
            config: self.config,
            goals: GoalManager::new(),
            constraints: ConstraintHandler::new(),
            risks: RiskAssessor::new(),
            models,
            confidence: self.confidence,
            audit: self.audit,
            ids: DecisionIdGenerator::new(),
        })
    }
}

// ============================================================================
// SECTION: Decision Engine
// ============================================================================

/// Decision orchestrator shared across worker threads.
pub struct DecisionEngine {
    /// Engine configuration.
    config: EngineConfig,
    /// Current experiment settings.
    experiment: RwLock<ExperimentSettings>,
    /// Goal registry.
    goals: GoalManager,
    /// Constraint registry.
    constraints: ConstraintHandler,
    /// Risk factor registry.
    risks: RiskAssessor,
    /// Cached model registry.
    models: ModelRegistry,
    /// Confidence policy.
    confidence: Box<dyn ConfidencePolicy>,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Decision identifier generator.
    ids: DecisionIdGenerator,
}

impl DecisionEngine {
    /// Starts building an engine.
    #[must_use]
    pub fn builder(config: EngineConfig) -> DecisionEngineBuilder {
        let confidence = Box::new(PenalizedConfidence::default());
        DecisionEngineBuilder {
            config,
            sources: Vec::new(),
            audit: Arc::new(NoopAuditSink),
            confidence,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the goal manager.
    #[must_use]
    pub const fn goals(&self) -> &GoalManager {
        &self.goals
    }

    /// Returns the constraint handler.
    #[must_use]
    pub const fn constraints(&self) -> &ConstraintHandler {
        &self.constraints
    }

    /// Returns the risk assessor.
    #[must_use]
    pub const fn risks(&self) -> &RiskAssessor {
        &self.risks
    }

    /// Returns the model registry.
    #[must_use]
    pub const fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Returns the current experiment settings.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Internal`] when the settings lock is poisoned.
    pub fn experiment(&self) -> Result<ExperimentSettings, DecisionError> {
        self.experiment
            .read()
            .map(|settings| settings.clone())
            .map_err(|_| DecisionError::Internal("experiment settings lock poisoned".to_string()))
    }

    /// Replaces the experiment settings for subsequent decisions.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Configuration`] when the split is invalid.
    pub fn set_experiment(&self, settings: ExperimentSettings) -> Result<(), DecisionError> {
        VariantSpec::parse(&settings.split)?;
        *self
            .experiment
            .write()
            .map_err(|_| DecisionError::Internal("experiment settings lock poisoned".to_string()))? =
            settings;
        Ok(())
    }

    /// Discards the cached model and resolves again.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::ModelUnavailable`] or [`DecisionError::ModelLoad`]
    /// when resolution fails.
    pub fn reload_model(&self) -> Result<Option<ModelHandle>, DecisionError> {
        Ok(self.models.reload()?)
    }

    /// Produces a gating decision for the context.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::Configuration`] for an invalid split,
    /// [`DecisionError::ModelUnavailable`] or [`DecisionError::ModelLoad`]
    /// when model resolution fails, and [`DecisionError::Scoring`] when the
    /// model output is not a probability.
    pub fn make_decision(&self, context: &DecisionContext) -> Result<Decision, DecisionError> {
        let experiment = self.experiment()?;
        let assignment =
            assign_variant(context, &experiment.split, experiment.sticky_field.as_deref())?;
        let model = self.models.load_model()?;
        let active_goals =
            self.goals.list_active_goals()?.into_iter().map(|goal| goal.id).collect();
        let constraints = self.constraints.evaluate(context)?;
        let risk = self.risks.assess(context)?;

        let mut warnings = constraints.warnings.clone();
        warnings.extend(risk.warnings.iter().cloned());
        let score = match &model {
            Some(handle) => Some(score_context(handle, context, &mut warnings)?),
            None => None,
        };

        let risk_exceeded = risk.aggregate_risk > self.config.risk_threshold;
        let mut rejection_reasons: Vec<RejectionReason> = constraints
            .hard()
            .map(|violation| RejectionReason::HardConstraint {
                id: violation.id.clone(),
            })
            .collect();
        if risk_exceeded {
            rejection_reasons.push(RejectionReason::RiskThreshold {
                aggregate_risk: risk.aggregate_risk,
                threshold: self.config.risk_threshold,
            });
        }
        if let Some(score) = score
            && score < self.config.min_score
        {
            rejection_reasons.push(RejectionReason::LowScore {
                score,
                min_score: self.config.min_score,
            });
        }

        let inputs = ConfidenceInputs {
            score,
            aggregate_risk: risk.aggregate_risk,
            soft_violations: constraints.soft().count(),
            hard_violations: constraints.hard().count(),
        };
        let confidence_score = clamp_unit(self.confidence.confidence(&inputs));

        let decision = Decision {
            decision_id: self.ids.issue(),
            can_proceed: rejection_reasons.is_empty(),
            confidence_score,
            score,
            variant: assignment.variant,
            model_version: model.as_ref().map(|handle| handle.version().clone()),
            active_goals,
            constraint_violations: constraints.violations,
            risk_summary: RiskSummary {
                aggregate_risk: risk.aggregate_risk,
                threshold: self.config.risk_threshold,
                exceeded: risk_exceeded,
                triggered: risk.triggered,
                mitigations: risk.mitigations,
            },
            rejection_reasons,
            warnings,
        };
        let context_hash = hash_canonical_json(self.config.hash_algorithm, context);
        self.audit.record_decision(&DecisionAuditEvent::new(
            self.config.namespace.clone(),
            &decision,
            context_hash,
        ));
        Ok(decision)
    }
}

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Builds the model's feature row from the context.
///
/// Numbers pass through, booleans map to 1/0, and absent or `null` fields
/// are 0. Any other value is 0 and produces a warning.
#[must_use]
pub fn extract_features(
    feature_names: &[String],
    context: &DecisionContext,
    warnings: &mut Vec<EvaluationWarning>,
) -> FeatureVector {
    let values = feature_names
        .iter()
        .map(|name| match context.lookup(name) {
            None | Some(Value::Null) => 0.0,
            Some(Value::Bool(flag)) => {
                if *flag {
                    1.0
                } else {
                    0.0
                }
            }
            Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
            Some(other) => {
                warnings.push(EvaluationWarning {
                    rule_kind: RuleKind::Feature,
                    rule_id: name.clone(),
                    message: format!("feature {name} must be numeric or boolean, got {other}"),
                });
                0.0
            }
        })
        .collect();
    FeatureVector::new(values)
}

/// Scores the context with the model and validates the probability.
fn score_context(
    handle: &ModelHandle,
    context: &DecisionContext,
    warnings: &mut Vec<EvaluationWarning>,
) -> Result<f64, DecisionError> {
    let features = extract_features(handle.model().feature_names(), context, warnings);
    let scores = handle
        .model()
        .predict_proba(std::slice::from_ref(&features))
        .map_err(|err| DecisionError::Scoring(err.to_string()))?;
    let Some(score) = scores.first().copied() else {
        return Err(DecisionError::Scoring("model returned no prediction".to_string()));
    };
    if !score.is_finite() || !(0.0 ..= 1.0).contains(&score) {
        return Err(DecisionError::Scoring(format!("model returned non-probability {score}")));
    }
    Ok(score)
}
