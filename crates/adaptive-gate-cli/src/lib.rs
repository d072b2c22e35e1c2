// crates/adaptive-gate-cli/src/lib.rs
// ============================================================================
// Module: Adaptive Gate CLI Library
// Description: Shared helpers for the adaptive-gate command-line interface.
// Purpose: Provide the message catalog and engine wiring for the binary.
// Dependencies: adaptive-gate-config, adaptive-gate-core, adaptive-gate-models
// ============================================================================

//! ## Overview
//! This library houses the CLI message catalog and the wiring that turns a
//! validated configuration into a seeded [`adaptive_gate_core::DecisionEngine`].
//! The binary entry point (`src/main.rs`) imports these helpers so command
//! handlers stay thin.
//!
//! CLI inputs are untrusted; context documents are size-limited and must be
//! JSON objects.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Message catalog and formatting helpers.
pub mod i18n;
/// Engine construction from configuration.
pub mod wiring;
