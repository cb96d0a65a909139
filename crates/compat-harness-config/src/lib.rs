// crates/compat-harness-config/src/lib.rs
// ============================================================================
// Module: Compat Harness Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for compat-harness.toml semantics.
// Dependencies: compat-harness-core, serde, toml
// ============================================================================

//! ## Overview
//! `compat-harness-config` defines the canonical configuration model for the
//! harness. It provides strict, fail-closed validation, filter-file merging,
//! and a deterministic example generator.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
