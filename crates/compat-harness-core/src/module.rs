// crates/compat-harness-core/src/module.rs
// ============================================================================
// Module: Test Module Model
// Description: Descriptor content and per-ABI module instantiations.
// Purpose: Capture module metadata used for filtering, sharding, and runs.
// Dependencies: crate::identifiers, serde
// ============================================================================

//! ## Overview
//! A module descriptor declares a named group of tests together with the
//! metadata the harness needs to plan a run: target ABIs, a runtime hint for
//! shard balancing, device-token requirements, and options forwarded verbatim
//! to the runner. Descriptors are expanded into one [`TestModule`] per
//! effective ABI before filtering and sharding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::AbiName;
use crate::identifiers::ModuleId;
use crate::identifiers::ModuleName;
use crate::identifiers::TokenName;

// ============================================================================
// SECTION: Descriptor Model
// ============================================================================

/// Parsed content of a module descriptor file.
///
/// # Invariants
/// - `name`, when present, must match the descriptor file stem semantics
///   enforced by the repository loader (unique across the tests directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDef {
    /// Module name; defaults to the descriptor file stem when absent.
    #[serde(default)]
    pub name: Option<ModuleName>,
    /// Explicit target ABI list; defaults to every configured ABI.
    #[serde(default)]
    pub abis: Option<Vec<AbiName>>,
    /// Expected runtime in milliseconds used for shard balancing.
    #[serde(default)]
    pub runtime_hint_ms: Option<u64>,
    /// Restricts the module to a single ABI even when more are configured.
    #[serde(default)]
    pub not_multi_abi: bool,
    /// Device tokens the module requires (empty for plain modules).
    #[serde(default)]
    pub token_requirements: Vec<TokenName>,
    /// Runner options forwarded verbatim.
    #[serde(default)]
    pub options: Vec<ModuleOption>,
}

/// A single name/value runner option attached to a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOption {
    /// Option name.
    pub name: String,
    /// Option value.
    pub value: String,
}

impl ModuleOption {
    /// Creates a new runner option.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

// ============================================================================
// SECTION: Per-ABI Instantiation
// ============================================================================

/// A module instantiated for one target ABI.
///
/// # Invariants
/// - `runtime_hint_ms` is always resolved (descriptor value or configured
///   default); sharding never sees an absent hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestModule {
    /// Module name.
    pub name: ModuleName,
    /// Target ABI for this instantiation.
    pub abi: AbiName,
    /// Resolved runtime hint in milliseconds.
    pub runtime_hint_ms: u64,
    /// Device tokens the module requires.
    pub token_requirements: Vec<TokenName>,
    /// Runner options, including retained test-level filter entries.
    pub options: Vec<ModuleOption>,
}

impl TestModule {
    /// Returns the canonical `<abi> <module>` identifier.
    #[must_use]
    pub fn id(&self) -> ModuleId {
        ModuleId::new(self.abi.clone(), self.name.clone())
    }

    /// Returns whether the module carries device-token requirements.
    #[must_use]
    pub fn requires_tokens(&self) -> bool {
        !self.token_requirements.is_empty()
    }
}
