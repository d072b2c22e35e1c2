// crates/adaptive-gate-config/src/lib.rs
// ============================================================================
// Module: Adaptive Gate Config Library
// Description: Canonical config model, validation, and registry seeding.
// Purpose: Single source of truth for adaptive-gate.toml semantics.
// Dependencies: adaptive-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `adaptive-gate-config` defines the configuration model for the adaptive
//! decision engine. Loading is strict and fail-closed: oversized, non-UTF-8,
//! or inconsistent files are rejected before an engine is built. Validated
//! configuration converts into [`adaptive_gate_core::EngineConfig`] and seeds
//! the goal, constraint, and risk registries.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod seed;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use seed::SeedReport;
pub use seed::seed_engine;
