// crates/compat-harness-core/src/identifiers.rs
// ============================================================================
// Module: Compat Harness Identifiers
// Description: Canonical opaque identifiers for modules, ABIs, and devices.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! the harness. Identifiers are opaque and serialize as strings. Validation is
//! handled at descriptor or configuration boundaries rather than within these
//! simple wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Test-module name as declared by a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Creates a new module name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ModuleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModuleName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Target ABI name (for example `arm64-v8a`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbiName(String);

impl AbiName {
    /// Creates a new ABI name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the ABI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AbiName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AbiName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Device-token requirement name (for example `sim-card`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenName(String);

impl TokenName {
    /// Creates a new token name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TokenName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TokenName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Device serial identifying a slot during shard assignment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceSerial(String);

impl DeviceSerial {
    /// Creates a new device serial.
    #[must_use]
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    /// Returns the serial as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DeviceSerial {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DeviceSerial {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Composite Identifiers
// ============================================================================

/// Canonical per-ABI module identifier with the stable form `<abi> <module>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    /// ABI component of the identifier.
    pub abi: AbiName,
    /// Module-name component of the identifier.
    pub module: ModuleName,
}

impl ModuleId {
    /// Creates a new composite module identifier.
    #[must_use]
    pub fn new(abi: AbiName, module: ModuleName) -> Self {
        Self { abi, module }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.abi, self.module)
    }
}
