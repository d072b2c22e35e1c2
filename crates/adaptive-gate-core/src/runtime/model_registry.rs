// crates/adaptive-gate-core/src/runtime/model_registry.rs
// ============================================================================
// Module: Model Registry
// Description: Lazy, single-flight resolution of the active scoring model.
// Purpose: Resolve a model handle from ordered sources and cache it per engine.
// Dependencies: crate::core, crate::interfaces, crate::runtime::audit
// ============================================================================

//! ## Overview
//! The registry walks its sources in order; the first handle wins. A
//! transient source failure falls through to the next source, while an
//! undeserializable artifact stops resolution. When no source yields a model,
//! production mode fails and development mode caches the absence so
//! decisions run rule-only.
//!
//! Resolution is single-flight: concurrent first callers serialize on a load
//! mutex and re-check the cached slot, so at most one resolution runs. The
//! cached result lives until [`ModelRegistry::reload`] or
//! [`ModelRegistry::replace_sources`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::interfaces::ModelHandle;
use crate::interfaces::ModelHint;
use crate::interfaces::ModelSource;
use crate::interfaces::ModelSourceError;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::ModelResolutionEvent;
use crate::runtime::audit::ModelResolutionOutcome;

// ============================================================================
// SECTION: Runtime Mode
// ============================================================================

/// Runtime mode controlling tolerance for a missing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    /// Missing models degrade to rule-only decisions.
    Development,
    /// Missing models are fatal.
    #[default]
    Production,
}

impl RuntimeMode {
    /// Returns a stable label for the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Model registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelRegistryError {
    /// No source produced a model in production mode.
    #[error("no scoring model available: {0}")]
    Unavailable(String),
    /// An artifact was found but could not be loaded.
    #[error("scoring model failed to load from {source_label}: {message}")]
    Load {
        /// Source label.
        source_label: String,
        /// Loader message.
        message: String,
    },
    /// Registry lock was poisoned.
    #[error("model registry lock poisoned")]
    Poisoned,
}

// ============================================================================
// SECTION: Model Registry
// ============================================================================

/// Cached resolution state.
#[derive(Debug, Clone)]
enum ModelSlot {
    /// No resolution has completed.
    Unresolved,
    /// Resolution completed without a model.
    Absent,
    /// Resolution produced a model.
    Loaded(ModelHandle),
}

/// Engine-owned model registry.
pub struct ModelRegistry {
    /// Hint passed to every source.
    hint: ModelHint,
    /// Runtime mode.
    mode: RuntimeMode,
    /// Ordered model sources.
    sources: RwLock<Vec<Arc<dyn ModelSource>>>,
    /// Cached resolution.
    slot: RwLock<ModelSlot>,
    /// Serializes resolution so concurrent callers share one load.
    load_guard: Mutex<()>,
    /// Audit sink for resolution events.
    audit: Arc<dyn AuditSink>,
    /// Number of resolutions performed.
    resolutions: AtomicU64,
}

impl ModelRegistry {
    /// Creates a registry over ordered sources.
    #[must_use]
    pub fn new(
        hint: ModelHint,
        mode: RuntimeMode,
        sources: Vec<Arc<dyn ModelSource>>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            hint,
            mode,
            sources: RwLock::new(sources),
            slot: RwLock::new(ModelSlot::Unresolved),
            load_guard: Mutex::new(()),
            audit,
            resolutions: AtomicU64::new(0),
        }
    }

    /// Returns the runtime mode.
    #[must_use]
    pub const fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Returns the resolution hint.
    #[must_use]
    pub const fn hint(&self) -> &ModelHint {
        &self.hint
    }

    /// Returns how many resolutions have run.
    #[must_use]
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    /// Returns the cached handle without triggering resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ModelRegistryError::Poisoned`] when the slot lock is poisoned.
    pub fn current(&self) -> Result<Option<ModelHandle>, ModelRegistryError> {
        Ok(self.cached()?.flatten())
    }

    /// Returns the active model, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ModelRegistryError::Unavailable`] in production mode when no
    /// source yields a model and [`ModelRegistryError::Load`] when an artifact
    /// cannot be deserialized.
    pub fn load_model(&self) -> Result<Option<ModelHandle>, ModelRegistryError> {
        if let Some(cached) = self.cached()? {
            return Ok(cached);
        }
        let _guard = self.load_guard.lock().map_err(|_| ModelRegistryError::Poisoned)?;
        if let Some(cached) = self.cached()? {
            return Ok(cached);
        }
        self.resolve_and_store()
    }

    /// Discards the cached model and resolves again.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ModelRegistry::load_model`].
    pub fn reload(&self) -> Result<Option<ModelHandle>, ModelRegistryError> {
        let _guard = self.load_guard.lock().map_err(|_| ModelRegistryError::Poisoned)?;
        self.store(ModelSlot::Unresolved)?;
        self.resolve_and_store()
    }

    /// Installs new sources and resolves from them.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ModelRegistry::load_model`].
    pub fn replace_sources(
        &self,
        sources: Vec<Arc<dyn ModelSource>>,
    ) -> Result<Option<ModelHandle>, ModelRegistryError> {
        let _guard = self.load_guard.lock().map_err(|_| ModelRegistryError::Poisoned)?;
        *self.sources.write().map_err(|_| ModelRegistryError::Poisoned)? = sources;
        self.store(ModelSlot::Unresolved)?;
        self.resolve_and_store()
    }

    /// Reads the cached slot; `None` means unresolved.
    fn cached(&self) -> Result<Option<Option<ModelHandle>>, ModelRegistryError> {
        let slot = self.slot.read().map_err(|_| ModelRegistryError::Poisoned)?;
        Ok(match &*slot {
            ModelSlot::Unresolved => None,
            ModelSlot::Absent => Some(None),
            ModelSlot::Loaded(handle) => Some(Some(handle.clone())),
        })
    }

    /// Replaces the cached slot.
    fn store(&self, value: ModelSlot) -> Result<(), ModelRegistryError> {
        *self.slot.write().map_err(|_| ModelRegistryError::Poisoned)? = value;
        Ok(())
    }

    /// Resolves from sources and caches successful outcomes.
    ///
    /// Callers must hold the load guard.
    fn resolve_and_store(&self) -> Result<Option<ModelHandle>, ModelRegistryError> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        let resolved = self.resolve()?;
        let slot = match &resolved {
            Some(handle) => ModelSlot::Loaded(handle.clone()),
            None => ModelSlot::Absent,
        };
        self.store(slot)?;
        Ok(resolved)
    }

    /// Walks the sources in order.
    fn resolve(&self) -> Result<Option<ModelHandle>, ModelRegistryError> {
        let sources = self.sources.read().map_err(|_| ModelRegistryError::Poisoned)?.clone();
        let mut unavailable = Vec::new();
        for source in &sources {
            match source.resolve(&self.hint) {
                Ok(Some(handle)) => {
                    self.emit(
                        ModelResolutionOutcome::Loaded,
                        Some(handle.source().to_string()),
                        Some(&handle),
                        None,
                    );
                    return Ok(Some(handle));
                }
                Ok(None) => {}
                Err(ModelSourceError::Transient(message)) => {
                    self.emit(
                        ModelResolutionOutcome::SourceUnavailable,
                        Some(source.label().to_string()),
                        None,
                        Some(message.clone()),
                    );
                    unavailable.push(format!("{}: {message}", source.label()));
                }
                Err(ModelSourceError::Load(message)) => {
                    self.emit(
                        ModelResolutionOutcome::Failed,
                        Some(source.label().to_string()),
                        None,
                        Some(message.clone()),
                    );
                    return Err(ModelRegistryError::Load {
                        source_label: source.label().to_string(),
                        message,
                    });
                }
            }
        }
        match self.mode {
            RuntimeMode::Development => {
                self.emit(ModelResolutionOutcome::Absent, None, None, None);
                Ok(None)
            }
            RuntimeMode::Production => {
                let message = if sources.is_empty() {
                    "no model source configured".to_string()
                } else if unavailable.is_empty() {
                    "no configured source offered a model".to_string()
                } else {
                    unavailable.join("; ")
                };
                self.emit(ModelResolutionOutcome::Failed, None, None, Some(message.clone()));
                Err(ModelRegistryError::Unavailable(message))
            }
        }
    }

    /// Emits a model resolution audit event.
    fn emit(
        &self,
        outcome: ModelResolutionOutcome,
        source: Option<String>,
        handle: Option<&ModelHandle>,
        message: Option<String>,
    ) {
        self.audit.record_model_resolution(&ModelResolutionEvent::new(
            self.hint.namespace.clone(),
            outcome,
            source,
            handle.map(|handle| handle.version().clone()),
            message,
        ));
    }
}
