// crates/adaptive-gate-config/src/config.rs
// ============================================================================
// Module: Adaptive Gate Configuration
// Description: Configuration loading and validation for the decision engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: adaptive-gate-core, serde, serde_json, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: an engine is never built
//! from a file that did not validate end to end, including registry seeds.
//!
//! Only the config path may come from the environment
//! (`ADAPTIVE_GATE_CONFIG`); every other setting lives in the file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use adaptive_gate_core::ConfidencePolicy;
use adaptive_gate_core::EngineConfig;
use adaptive_gate_core::ExperimentSettings;
use adaptive_gate_core::ModelVersion;
use adaptive_gate_core::NamespaceId;
use adaptive_gate_core::PenalizedConfidence;
use adaptive_gate_core::RuntimeMode;
use adaptive_gate_core::VariantSpec;
use adaptive_gate_core::hashing::DEFAULT_HASH_ALGORITHM;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::seed::dry_run_seeds;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "adaptive-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "ADAPTIVE_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum tracking request timeout in milliseconds.
pub(crate) const MIN_TRACKING_TIMEOUT_MS: u64 = 100;
/// Maximum tracking request timeout in milliseconds.
pub(crate) const MAX_TRACKING_TIMEOUT_MS: u64 = 30_000;
/// Maximum retry backoff in milliseconds.
pub(crate) const MAX_RETRY_BACKOFF_MS: u64 = 10_000;
/// Maximum accepted model artifact size in bytes.
pub(crate) const MAX_ARTIFACT_BYTES_LIMIT: usize = 64 * 1024 * 1024;
/// Maximum number of entries in each registry seed list.
pub(crate) const MAX_SEED_ENTRIES: usize = 1024;
/// Maximum length of a namespace.
pub(crate) const MAX_NAMESPACE_LENGTH: usize = 128;

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Root configuration for the adaptive decision engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdaptiveGateConfig {
    /// Engine thresholds and runtime mode.
    #[serde(default)]
    pub engine: EngineSection,
    /// Experiment assignment settings.
    #[serde(default)]
    pub experiment: ExperimentSection,
    /// Model source settings.
    #[serde(default)]
    pub model: ModelSection,
    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditSection,
    /// Goals registered at startup.
    #[serde(default)]
    pub goals: Vec<GoalSeed>,
    /// Constraints registered at startup.
    #[serde(default)]
    pub constraints: Vec<ConstraintSeed>,
    /// Risk factors registered at startup.
    #[serde(default)]
    pub risk_factors: Vec<RiskFactorSeed>,
}

impl AdaptiveGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// Registry seeds are registered against scratch registries so seed
    /// errors surface here rather than after an engine is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.experiment.validate()?;
        self.model.validate(self.engine.mode)?;
        self.audit.validate()?;
        validate_seed_count("goals", self.goals.len())?;
        validate_seed_count("constraints", self.constraints.len())?;
        validate_seed_count("risk_factors", self.risk_factors.len())?;
        dry_run_seeds(self)?;
        Ok(())
    }

    /// Converts the configuration into engine settings.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            namespace: NamespaceId::new(self.engine.namespace.trim()),
            mode: self.engine.mode,
            experiment: self.experiment.settings(),
            min_score: self.engine.min_score,
            risk_threshold: self.engine.risk_threshold,
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }

    /// Returns the confidence policy configured for the engine.
    #[must_use]
    pub fn confidence_policy(&self) -> Box<dyn ConfidencePolicy> {
        Box::new(PenalizedConfidence {
            soft_violation_penalty: self.engine.soft_violation_penalty,
        })
    }
}

// ============================================================================
// SECTION: Engine Section
// ============================================================================

/// Engine thresholds and runtime mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Runtime mode controlling tolerance for a missing model.
    #[serde(default)]
    pub mode: RuntimeMode,
    /// Namespace used for model tracking.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Minimum acceptable model score.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Aggregate risk threshold.
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: f64,
    /// Confidence penalty per soft constraint violation.
    #[serde(default = "default_soft_violation_penalty")]
    pub soft_violation_penalty: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            mode: RuntimeMode::default(),
            namespace: default_namespace(),
            min_score: default_min_score(),
            risk_threshold: default_risk_threshold(),
            soft_violation_penalty: default_soft_violation_penalty(),
        }
    }
}

impl EngineSection {
    /// Validates engine thresholds and namespace.
    fn validate(&self) -> Result<(), ConfigError> {
        let namespace = self.namespace.trim();
        if namespace.is_empty() {
            return Err(ConfigError::Invalid("engine.namespace must be non-empty".to_string()));
        }
        if namespace.len() > MAX_NAMESPACE_LENGTH {
            return Err(ConfigError::Invalid("engine.namespace exceeds max length".to_string()));
        }
        if namespace.contains('/') {
            return Err(ConfigError::Invalid(
                "engine.namespace must not contain '/'".to_string(),
            ));
        }
        validate_unit_interval("engine.min_score", self.min_score)?;
        validate_unit_interval("engine.risk_threshold", self.risk_threshold)?;
        validate_unit_interval("engine.soft_violation_penalty", self.soft_violation_penalty)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Experiment Section
// ============================================================================

/// Experiment assignment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentSection {
    /// Split specification, e.g. `"control:50,variant:50"`.
    #[serde(default = "default_split")]
    pub split: String,
    /// Context field used for sticky assignment; blank disables stickiness.
    #[serde(default = "default_sticky_field")]
    pub sticky_field: String,
}

impl Default for ExperimentSection {
    fn default() -> Self {
        Self {
            split: default_split(),
            sticky_field: default_sticky_field(),
        }
    }
}

impl ExperimentSection {
    /// Pre-parses the split so a bad spec fails at load time.
    fn validate(&self) -> Result<(), ConfigError> {
        VariantSpec::parse(&self.split)
            .map_err(|err| ConfigError::Invalid(format!("experiment.split: {err}")))?;
        Ok(())
    }

    /// Converts the section into core experiment settings.
    #[must_use]
    pub fn settings(&self) -> ExperimentSettings {
        let sticky = self.sticky_field.trim();
        ExperimentSettings {
            split: self.split.clone(),
            sticky_field: (!sticky.is_empty()).then(|| sticky.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Model Section
// ============================================================================

/// Model source settings.
///
/// Sources are consulted tracking server first, then the local artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    /// Local `logistic_v1` artifact path.
    #[serde(default)]
    pub artifact_path: Option<String>,
    /// Version label pinned onto the local artifact.
    #[serde(default)]
    pub version: Option<String>,
    /// Tracking server base endpoint.
    #[serde(default)]
    pub tracking_endpoint: Option<String>,
    /// Tracking request timeout in milliseconds.
    #[serde(default = "default_tracking_timeout_ms")]
    pub tracking_timeout_ms: u64,
    /// Backoff before the single tracking retry, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Allow cleartext `http://` tracking endpoints.
    #[serde(default)]
    pub allow_http: bool,
    /// Maximum artifact or response size in bytes.
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: usize,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            artifact_path: None,
            version: None,
            tracking_endpoint: None,
            tracking_timeout_ms: default_tracking_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            allow_http: false,
            max_artifact_bytes: default_max_artifact_bytes(),
        }
    }
}

impl ModelSection {
    /// Validates model source settings against the runtime mode.
    fn validate(&self, mode: RuntimeMode) -> Result<(), ConfigError> {
        if let Some(path) = &self.artifact_path {
            validate_path_string("model.artifact_path", path)?;
        }
        if let Some(version) = &self.version {
            ModelVersion::new(version.trim())
                .map_err(|err| ConfigError::Invalid(format!("model.version: {err}")))?;
        }
        if let Some(endpoint) = &self.tracking_endpoint {
            validate_endpoint(endpoint.trim(), self.allow_http)?;
        }
        validate_timeout_range(
            "model.tracking_timeout_ms",
            self.tracking_timeout_ms,
            MIN_TRACKING_TIMEOUT_MS,
            MAX_TRACKING_TIMEOUT_MS,
        )?;
        if self.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(ConfigError::Invalid(format!(
                "model.retry_backoff_ms must be at most {MAX_RETRY_BACKOFF_MS} milliseconds"
            )));
        }
        if self.max_artifact_bytes == 0 || self.max_artifact_bytes > MAX_ARTIFACT_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "model.max_artifact_bytes must be between 1 and {MAX_ARTIFACT_BYTES_LIMIT}"
            )));
        }
        if mode == RuntimeMode::Production
            && self.artifact_path.is_none()
            && self.tracking_endpoint.is_none()
        {
            return Err(ConfigError::Invalid(
                "production mode requires model.artifact_path or model.tracking_endpoint"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the pinned local version, if configured.
    #[must_use]
    pub fn pinned_version(&self) -> Option<ModelVersion> {
        self.version.as_deref().and_then(|version| ModelVersion::new(version.trim()).ok())
    }
}

// ============================================================================
// SECTION: Audit Section
// ============================================================================

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    None,
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Audit sink settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path (JSON lines), required for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditSection {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        if self.sink == AuditSinkKind::File && self.path.is_none() {
            return Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Registry Seeds
// ============================================================================

/// Goal registered at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoalSeed {
    /// Goal description.
    pub description: String,
    /// Criterion name to weight.
    #[serde(default)]
    pub criteria: BTreeMap<String, f64>,
}

/// Constraint registered at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintSeed {
    /// Constraint category.
    pub category: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Threshold parameters (`max_<field>` / `min_<field>`) and metadata.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Hard constraints force rejection when violated.
    #[serde(default)]
    pub is_hard: bool,
}

/// Risk factor registered at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskFactorSeed {
    /// Explicit identifier; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Category matched against the context action type.
    pub category: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Likelihood in `[0, 1]`.
    pub probability: f64,
    /// Severity in `[0, 1]`.
    pub impact: f64,
    /// Ordered mitigation action identifiers.
    #[serde(default)]
    pub mitigations: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the tracking endpoint scheme.
///
/// Full URL validation happens when the tracking source is built.
fn validate_endpoint(endpoint: &str, allow_http: bool) -> Result<(), ConfigError> {
    if endpoint.is_empty() {
        return Err(ConfigError::Invalid("model.tracking_endpoint must be non-empty".to_string()));
    }
    if endpoint.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("model.tracking_endpoint exceeds max length".to_string()));
    }
    if endpoint.starts_with("https://") {
        return Ok(());
    }
    if endpoint.starts_with("http://") {
        if allow_http {
            return Ok(());
        }
        return Err(ConfigError::Invalid(
            "model.tracking_endpoint uses http without model.allow_http".to_string(),
        ));
    }
    Err(ConfigError::Invalid("model.tracking_endpoint must be an http(s) url".to_string()))
}

/// Validates that a timeout falls within the allowed range.
fn validate_timeout_range(
    field: &str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min_ms} and {max_ms} milliseconds",
        )));
    }
    Ok(())
}

/// Validates that a value is finite and within `[0, 1]`.
fn validate_unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0 ..= 1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!("{field} must be within [0, 1]")));
    }
    Ok(())
}

/// Validates a seed list length.
fn validate_seed_count(field: &str, count: usize) -> Result<(), ConfigError> {
    if count > MAX_SEED_ENTRIES {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds max entries ({MAX_SEED_ENTRIES})"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default namespace.
fn default_namespace() -> String {
    adaptive_gate_core::runtime::engine::DEFAULT_NAMESPACE.to_string()
}

/// Default minimum model score.
pub(crate) const fn default_min_score() -> f64 {
    adaptive_gate_core::runtime::engine::DEFAULT_MIN_SCORE
}

/// Default aggregate risk threshold.
pub(crate) const fn default_risk_threshold() -> f64 {
    adaptive_gate_core::runtime::engine::DEFAULT_RISK_THRESHOLD
}

/// Default soft violation penalty.
pub(crate) const fn default_soft_violation_penalty() -> f64 {
    adaptive_gate_core::runtime::confidence::DEFAULT_SOFT_VIOLATION_PENALTY
}

/// Default experiment split.
fn default_split() -> String {
    adaptive_gate_core::runtime::variant::DEFAULT_SPLIT.to_string()
}

/// Default sticky field.
fn default_sticky_field() -> String {
    adaptive_gate_core::runtime::variant::DEFAULT_STICKY_FIELD.to_string()
}

/// Default tracking timeout.
pub(crate) const fn default_tracking_timeout_ms() -> u64 {
    2_000
}

/// Default retry backoff.
pub(crate) const fn default_retry_backoff_ms() -> u64 {
    250
}

/// Default artifact size limit.
pub(crate) const fn default_max_artifact_bytes() -> usize {
    8 * 1024 * 1024
}

// ============================================================================
// SECTION: Tests
// ============================================================================
