// crates/compat-harness-core/src/filter.rs
// ============================================================================
// Module: Test Filter Grammar
// Description: Parsing and matching for include/exclude filter entries.
// Purpose: Select or reject modules and retain test-level filters as options.
// Dependencies: crate::{identifiers, module}, serde, thiserror
// ============================================================================

//! ## Overview
//! Filter entries take the form `[abi] module [test]`. The ABI token is
//! recognized only when it names a known ABI, so a plain `module test` entry
//! never misparses its module name as an ABI. Module-level entries (no test
//! part) select or drop whole modules; test-level entries survive as
//! `include-filter` / `exclude-filter` runner options on the module they name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identifiers::AbiName;
use crate::identifiers::ModuleName;
use crate::module::ModuleOption;
use crate::module::TestModule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Runner option name carrying a retained test-level include entry.
pub const INCLUDE_FILTER_OPTION: &str = "include-filter";
/// Runner option name carrying a retained test-level exclude entry.
pub const EXCLUDE_FILTER_OPTION: &str = "exclude-filter";

// ============================================================================
// SECTION: Filter Entry
// ============================================================================

/// A single parsed filter entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFilter {
    /// Optional ABI restriction.
    pub abi: Option<AbiName>,
    /// Module the entry names.
    pub module: ModuleName,
    /// Optional test restriction (for example `android.sample.Cls#method`).
    pub test: Option<String>,
}

impl TestFilter {
    /// Parses a filter entry against the set of known ABIs.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] when the entry is blank or has trailing tokens.
    pub fn parse(entry: &str, known_abis: &[AbiName]) -> Result<Self, FilterError> {
        let mut tokens = entry.split_whitespace();
        let Some(first) = tokens.next() else {
            return Err(FilterError::Invalid("filter entry is blank".to_string()));
        };

        let (abi, module) = if known_abis.iter().any(|abi| abi.as_str() == first) {
            let Some(name) = tokens.next() else {
                return Err(FilterError::Invalid(format!(
                    "filter entry '{entry}' names an abi without a module"
                )));
            };
            (Some(AbiName::new(first)), ModuleName::new(name))
        } else {
            (None, ModuleName::new(first))
        };

        let test = tokens.next().map(str::to_string);
        if tokens.next().is_some() {
            return Err(FilterError::Invalid(format!(
                "filter entry '{entry}' has trailing tokens"
            )));
        }

        Ok(Self { abi, module, test })
    }

    /// Returns whether the entry selects a whole module rather than a test.
    #[must_use]
    pub fn is_module_level(&self) -> bool {
        self.test.is_none()
    }

    /// Returns whether the entry names the given module instantiation.
    #[must_use]
    pub fn names_module(&self, module: &TestModule) -> bool {
        if self.module != module.name {
            return false;
        }
        self.abi.as_ref().is_none_or(|abi| *abi == module.abi)
    }
}

impl fmt::Display for TestFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(abi) = &self.abi {
            write!(f, "{abi} ")?;
        }
        write!(f, "{}", self.module)?;
        if let Some(test) = &self.test {
            write!(f, " {test}")?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Filter Set
// ============================================================================

/// The combined include/exclude lists applied while loading a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Include entries; an empty list admits every module.
    includes: Vec<TestFilter>,
    /// Exclude entries; module-level exclusion wins over inclusion.
    excludes: Vec<TestFilter>,
}

impl FilterSet {
    /// Creates a filter set, dropping duplicate entries.
    #[must_use]
    pub fn new(includes: Vec<TestFilter>, excludes: Vec<TestFilter>) -> Self {
        Self { includes: dedupe(includes), excludes: dedupe(excludes) }
    }

    /// Parses raw include/exclude entries against the known ABI list.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] when any entry fails to parse.
    pub fn parse(
        includes: &[String],
        excludes: &[String],
        known_abis: &[AbiName],
    ) -> Result<Self, FilterError> {
        let includes = includes
            .iter()
            .map(|entry| TestFilter::parse(entry, known_abis))
            .collect::<Result<Vec<_>, _>>()?;
        let excludes = excludes
            .iter()
            .map(|entry| TestFilter::parse(entry, known_abis))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(includes, excludes))
    }

    /// Returns the deduplicated include entries.
    #[must_use]
    pub fn includes(&self) -> &[TestFilter] {
        &self.includes
    }

    /// Returns the deduplicated exclude entries.
    #[must_use]
    pub fn excludes(&self) -> &[TestFilter] {
        &self.excludes
    }

    /// Applies the set to one module instantiation.
    ///
    /// Returns `None` when the module is dropped. Otherwise test-level entries
    /// naming the module are retained as runner options on the returned value.
    #[must_use]
    pub fn apply(&self, mut module: TestModule) -> Option<TestModule> {
        let module_excluded = self
            .excludes
            .iter()
            .any(|entry| entry.is_module_level() && entry.names_module(&module));
        if module_excluded {
            return None;
        }

        if !self.includes.is_empty() {
            let named = self.includes.iter().any(|entry| entry.names_module(&module));
            if !named {
                return None;
            }
        }

        for entry in &self.includes {
            if let Some(test) = entry.test.as_ref().filter(|_| entry.names_module(&module)) {
                module.options.push(ModuleOption::new(INCLUDE_FILTER_OPTION, test.clone()));
            }
        }
        for entry in &self.excludes {
            if let Some(test) = entry.test.as_ref().filter(|_| entry.names_module(&module)) {
                module.options.push(ModuleOption::new(EXCLUDE_FILTER_OPTION, test.clone()));
            }
        }

        Some(module)
    }
}

/// Removes duplicate entries while preserving first-seen order.
fn dedupe(entries: Vec<TestFilter>) -> Vec<TestFilter> {
    let mut out: Vec<TestFilter> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !out.contains(&entry) {
            out.push(entry);
        }
    }
    out
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while parsing filter entries.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Malformed filter entry.
    #[error("invalid test filter: {0}")]
    Invalid(String),
}
