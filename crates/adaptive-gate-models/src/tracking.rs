// crates/adaptive-gate-models/src/tracking.rs
// ============================================================================
// Module: Tracking Server Source
// Description: Model source querying a remote tracking server.
// Purpose: Resolve the promoted model for a namespace over HTTP.
// Dependencies: adaptive-gate-core, crate::logistic, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`TrackingServerSource`] issues a bounded
//! `GET {endpoint}/api/v1/models/{namespace}/promoted` request. A `200`
//! response carries `{"version", "artifact"}`; `404` means no promoted model.
//! Connection failures and `5xx` responses are retried once after a backoff
//! and then reported as transient so resolution can fall through to the next
//! source. A malformed `200` body is a load failure.
//! Redirects are not followed and response bodies are size-capped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use adaptive_gate_core::ModelHandle;
use adaptive_gate_core::ModelHint;
use adaptive_gate_core::ModelSource;
use adaptive_gate_core::ModelSourceError;
use adaptive_gate_core::ModelVersion;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::local::DEFAULT_MAX_ARTIFACT_BYTES;
use crate::logistic::LogisticArtifact;
use crate::logistic::LogisticModel;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default request timeout in milliseconds.
pub const DEFAULT_TRACKING_TIMEOUT_MS: u64 = 2_000;
/// Default backoff before the single retry, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

/// Configuration for the tracking server source.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` endpoints.
/// - `max_response_bytes` is a hard upper bound on response bodies.
/// - `timeout_ms` applies to each request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Base endpoint URL.
    pub endpoint: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Backoff before the retry, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Maximum response size in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl TrackingConfig {
    /// Creates a configuration for the endpoint with default limits.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: DEFAULT_TRACKING_TIMEOUT_MS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            allow_http: false,
            max_response_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            user_agent: concat!("adaptive-gate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Errors raised while building a tracking source.
#[derive(Debug, Error)]
pub enum TrackingSetupError {
    /// Endpoint is not a usable URL.
    #[error("invalid tracking endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Promoted-model response body.
#[derive(Debug, Deserialize)]
struct PromotedModel {
    /// Promoted version label.
    version: String,
    /// Embedded artifact.
    artifact: Value,
}

/// Outcome of a single request attempt.
enum Attempt {
    /// Response received with a definitive status.
    Done(Response),
    /// Attempt failed in a way worth retrying.
    Retry(String),
}

/// Model source backed by a remote tracking server.
pub struct TrackingServerSource {
    /// Source configuration.
    config: TrackingConfig,
    /// Parsed base endpoint.
    endpoint: Url,
    /// HTTP client used for outbound requests.
    client: Client,
    /// Source label.
    label: String,
}

impl TrackingServerSource {
    /// Creates a tracking source.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingSetupError`] when the endpoint is invalid, uses a
    /// disallowed scheme, or the HTTP client cannot be created.
    pub fn new(config: TrackingConfig) -> Result<Self, TrackingSetupError> {
        let endpoint = Url::parse(config.endpoint.trim())
            .map_err(|err| TrackingSetupError::InvalidEndpoint(err.to_string()))?;
        match endpoint.scheme() {
            "https" => {}
            "http" if config.allow_http => {}
            "http" => {
                return Err(TrackingSetupError::InvalidEndpoint(
                    "http endpoints require allow_http".to_string(),
                ));
            }
            other => {
                return Err(TrackingSetupError::InvalidEndpoint(format!(
                    "unsupported scheme {other}"
                )));
            }
        }
        if !endpoint.username().is_empty() || endpoint.password().is_some() {
            return Err(TrackingSetupError::InvalidEndpoint(
                "endpoint credentials are not allowed".to_string(),
            ));
        }
        if endpoint.cannot_be_a_base() {
            return Err(TrackingSetupError::InvalidEndpoint(
                "endpoint cannot be a base url".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| TrackingSetupError::Client(err.to_string()))?;
        let label = format!("tracking:{endpoint}");
        Ok(Self {
            config,
            endpoint,
            client,
            label,
        })
    }

    /// Builds the promoted-model URL for a namespace.
    fn promoted_url(&self, hint: &ModelHint) -> Result<Url, ModelSourceError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| ModelSourceError::Load("endpoint cannot be a base url".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "models", hint.namespace.as_str(), "promoted"]);
        Ok(url)
    }

    /// Sends one request and classifies retryable failures.
    fn attempt(&self, url: &Url) -> Attempt {
        match self.client.get(url.as_str()).send() {
            Ok(response) if response.status().is_server_error() => {
                Attempt::Retry(format!("tracking server returned {}", response.status()))
            }
            Ok(response) => Attempt::Done(response),
            Err(err) if err.is_timeout() => Attempt::Retry("tracking request timed out".to_string()),
            Err(err) => Attempt::Retry(format!("tracking request failed: {err}")),
        }
    }

    /// Sends the request with a single retry.
    fn fetch(&self, url: &Url) -> Result<Response, ModelSourceError> {
        if let Attempt::Done(response) = self.attempt(url) {
            return Ok(response);
        }
        thread::sleep(Duration::from_millis(self.config.retry_backoff_ms));
        match self.attempt(url) {
            Attempt::Done(response) => Ok(response),
            Attempt::Retry(message) => Err(ModelSourceError::Transient(message)),
        }
    }
}

impl ModelSource for TrackingServerSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn resolve(&self, hint: &ModelHint) -> Result<Option<ModelHandle>, ModelSourceError> {
        let url = self.promoted_url(hint)?;
        let mut response = self.fetch(&url)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ModelSourceError::Transient(format!("tracking server returned {status}")));
        }
        let body = read_response_limited(&mut response, self.config.max_response_bytes)?;
        let promoted: PromotedModel = serde_json::from_slice(&body)
            .map_err(|err| ModelSourceError::Load(format!("malformed tracking response: {err}")))?;
        let version = ModelVersion::new(promoted.version)
            .map_err(|err| ModelSourceError::Load(err.to_string()))?;
        let artifact = LogisticArtifact::from_value(promoted.artifact)
            .map_err(|err| ModelSourceError::Load(err.to_string()))?;
        let model = LogisticModel::from_artifact(artifact)
            .map_err(|err| ModelSourceError::Load(err.to_string()))?;
        Ok(Some(ModelHandle::new(version, self.label.clone(), Arc::new(model))))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, ModelSourceError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ModelSourceError::Load("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(ModelSourceError::Load("tracking response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| ModelSourceError::Transient(format!("failed to read response: {err}")))?;
    if buf.len() > max_bytes {
        return Err(ModelSourceError::Load("tracking response exceeds size limit".to_string()));
    }
    Ok(buf)
}
