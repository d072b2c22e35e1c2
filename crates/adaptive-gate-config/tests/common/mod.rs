// crates/adaptive-gate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for adaptive-gate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io::Write;

use adaptive_gate_config::AdaptiveGateConfig;
use adaptive_gate_config::ConfigError;
use tempfile::NamedTempFile;

/// Result type for config tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into an `AdaptiveGateConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<AdaptiveGateConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a development-mode config with all other defaults applied.
pub fn dev_config() -> Result<AdaptiveGateConfig, toml::de::Error> {
    config_from_toml("[engine]\nmode = \"development\"\n")
}

/// Writes bytes to a temp file and loads it as configuration.
pub fn load_bytes(bytes: &[u8]) -> Result<Result<AdaptiveGateConfig, ConfigError>, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(bytes).map_err(|err| err.to_string())?;
    file.flush().map_err(|err| err.to_string())?;
    Ok(AdaptiveGateConfig::load(Some(file.path())))
}

/// Assert that a validation result is an error containing a specific substring.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
