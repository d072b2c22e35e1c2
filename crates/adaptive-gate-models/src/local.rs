// crates/adaptive-gate-models/src/local.rs
// ============================================================================
// Module: Local Artifact Source
// Description: Model source reading a logistic artifact from disk.
// Purpose: Resolve a model handle from a configured artifact path.
// Dependencies: adaptive-gate-core, crate::logistic
// ============================================================================

//! ## Overview
//! [`LocalArtifactSource`] reads a bounded artifact file on every resolution.
//! A missing file offers no model; an oversized, unreadable, or invalid file
//! is a load failure. The version comes from explicit configuration, else a
//! short content hash of the artifact bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use adaptive_gate_core::ModelHandle;
use adaptive_gate_core::ModelHint;
use adaptive_gate_core::ModelSource;
use adaptive_gate_core::ModelSourceError;
use adaptive_gate_core::ModelVersion;
use adaptive_gate_core::hashing::DEFAULT_HASH_ALGORITHM;
use adaptive_gate_core::hashing::hash_bytes;

use crate::logistic::LogisticArtifact;
use crate::logistic::LogisticModel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum artifact size in bytes.
pub const DEFAULT_MAX_ARTIFACT_BYTES: usize = 8 * 1024 * 1024;
/// Hex characters kept in content-derived versions.
pub const CONTENT_VERSION_HEX_CHARS: usize = 12;

// ============================================================================
// SECTION: Source
// ============================================================================

/// Model source backed by a local artifact file.
#[derive(Debug, Clone)]
pub struct LocalArtifactSource {
    /// Artifact path.
    path: PathBuf,
    /// Explicit version override.
    version: Option<ModelVersion>,
    /// Maximum artifact size in bytes.
    max_bytes: usize,
    /// Source label.
    label: String,
}

impl LocalArtifactSource {
    /// Creates a source for the artifact path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = format!("local:{}", path.display());
        Self {
            path,
            version: None,
            max_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            label,
        }
    }

    /// Pins the version reported for this artifact.
    #[must_use]
    pub fn with_version(mut self, version: ModelVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Overrides the maximum artifact size.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Returns the artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves the version for the artifact bytes.
    ///
    /// A version embedded in the artifact is informational and never names
    /// the handle.
    fn resolve_version(&self, bytes: &[u8]) -> Result<ModelVersion, ModelSourceError> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, bytes);
        ModelVersion::new(digest.short_label(CONTENT_VERSION_HEX_CHARS))
            .map_err(|err| ModelSourceError::Load(err.to_string()))
    }
}

impl ModelSource for LocalArtifactSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn resolve(&self, _hint: &ModelHint) -> Result<Option<ModelHandle>, ModelSourceError> {
        let Some(bytes) = read_artifact(&self.path, self.max_bytes)? else {
            return Ok(None);
        };
        let artifact = LogisticArtifact::from_slice(&bytes)
            .map_err(|err| ModelSourceError::Load(err.to_string()))?;
        let version = self.resolve_version(&bytes)?;
        let model = LogisticModel::from_artifact(artifact)
            .map_err(|err| ModelSourceError::Load(err.to_string()))?;
        Ok(Some(ModelHandle::new(version, self.label.clone(), Arc::new(model))))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an artifact file with a size limit; `None` when the file is absent.
fn read_artifact(path: &Path, max_bytes: usize) -> Result<Option<Vec<u8>>, ModelSourceError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ModelSourceError::Load(format!(
                "failed to open {}: {err}",
                path.display()
            )));
        }
    };
    let limit = u64::try_from(max_bytes)
        .map_err(|_| ModelSourceError::Load("artifact size limit exceeds u64".to_string()))?;
    let metadata = file
        .metadata()
        .map_err(|err| ModelSourceError::Load(format!("failed to stat artifact: {err}")))?;
    if metadata.len() > limit {
        return Err(ModelSourceError::Load("artifact exceeds size limit".to_string()));
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| ModelSourceError::Load(format!("failed to read artifact: {err}")))?;
    if bytes.len() > max_bytes {
        return Err(ModelSourceError::Load("artifact exceeds size limit".to_string()));
    }
    Ok(Some(bytes))
}
