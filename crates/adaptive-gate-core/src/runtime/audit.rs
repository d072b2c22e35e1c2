// crates/adaptive-gate-core/src/runtime/audit.rs
// ============================================================================
// Module: Decision Audit Logging
// Description: Structured audit events for decisions and model resolution.
// Purpose: Emit redacted JSON-line audit logs without hard dependencies.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for the decision
//! engine. Decision events carry a canonical hash of the context rather than
//! the context itself. Deployments route events to their logging pipeline by
//! implementing [`AuditSink`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::Decision;
use crate::core::DecisionId;
use crate::core::HashDigest;
use crate::core::hashing::HashError;
use crate::core::ModelVersion;
use crate::core::NamespaceId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label for model resolution events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelResolutionOutcome {
    /// A source produced a model.
    Loaded,
    /// No source produced a model and the mode tolerates it.
    Absent,
    /// A source was unreachable; resolution fell through.
    SourceUnavailable,
    /// Resolution failed fatally.
    Failed,
}

/// Decision audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Decision identifier.
    pub decision_id: DecisionId,
    /// Namespace the engine decides for.
    pub namespace: NamespaceId,
    /// Assigned variant.
    pub variant: String,
    /// Model version used, if any.
    pub model_version: Option<ModelVersion>,
    /// Whether the action may proceed.
    pub can_proceed: bool,
    /// Confidence score.
    pub confidence_score: f64,
    /// Model score, if any.
    pub score: Option<f64>,
    /// Aggregate risk.
    pub aggregate_risk: f64,
    /// Hard violation count.
    pub hard_violations: usize,
    /// Soft violation count.
    pub soft_violations: usize,
    /// Skipped rule count.
    pub warnings: usize,
    /// Canonical hash of the decision context.
    pub context_hash: Option<HashDigest>,
    /// Why the context could not be hashed; set only when `context_hash` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_hash_error: Option<String>,
}

impl DecisionAuditEvent {
    /// Creates a decision audit event with a consistent timestamp.
    ///
    /// A hashing failure is recorded on the event instead of dropped.
    #[must_use]
    pub fn new(
        namespace: NamespaceId,
        decision: &Decision,
        context_hash: Result<HashDigest, HashError>,
    ) -> Self {
        let (context_hash, context_hash_error) = match context_hash {
            Ok(digest) => (Some(digest), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            event: "decision",
            timestamp_ms: now_ms(),
            decision_id: decision.decision_id.clone(),
            namespace,
            variant: decision.variant.clone(),
            model_version: decision.model_version.clone(),
            can_proceed: decision.can_proceed,
            confidence_score: decision.confidence_score,
            score: decision.score,
            aggregate_risk: decision.risk_summary.aggregate_risk,
            hard_violations: decision.hard_violation_count(),
            soft_violations: decision.soft_violation_count(),
            warnings: decision.warnings.len(),
            context_hash,
            context_hash_error,
        }
    }
}

/// Model resolution audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResolutionEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Namespace the engine decides for.
    pub namespace: NamespaceId,
    /// Resolution outcome.
    pub outcome: ModelResolutionOutcome,
    /// Source label when a specific source is involved.
    pub source: Option<String>,
    /// Resolved version when loaded.
    pub version: Option<ModelVersion>,
    /// Optional diagnostic message.
    pub message: Option<String>,
}

impl ModelResolutionEvent {
    /// Creates a model resolution event with a consistent timestamp.
    #[must_use]
    pub fn new(
        namespace: NamespaceId,
        outcome: ModelResolutionOutcome,
        source: Option<String>,
        version: Option<ModelVersion>,
        message: Option<String>,
    ) -> Self {
        Self {
            event: "model_resolution",
            timestamp_ms: now_ms(),
            namespace,
            outcome,
            source,
            version,
            message,
        }
    }
}

/// Returns milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for decision engine events.
pub trait AuditSink: Send + Sync {
    /// Record a decision audit event.
    fn record_decision(&self, event: &DecisionAuditEvent);

    /// Record a model resolution audit event.
    fn record_model_resolution(&self, _event: &ModelResolutionEvent) {}
}

/// No-op audit sink.
///
/// # Invariants
/// - Events are intentionally discarded.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_decision(&self, _event: &DecisionAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record_decision(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_model_resolution(&self, event: &ModelResolutionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends a serialized payload as one line.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_decision(&self, event: &DecisionAuditEvent) {
        self.append(event);
    }

    fn record_model_resolution(&self, event: &ModelResolutionEvent) {
        self.append(event);
    }
}
