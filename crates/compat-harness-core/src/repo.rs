// crates/compat-harness-core/src/repo.rs
// ============================================================================
// Module: Module Repository
// Description: Descriptor loading, per-ABI expansion, and filter application.
// Purpose: Turn a tests directory into the filtered module set for a run.
// Dependencies: crate::{filter, identifiers, module}, thiserror, toml
// ============================================================================

//! ## Overview
//! The repository loader scans a tests directory (non-recursive) for `*.toml`
//! module descriptors, expands each across the configured ABI list, applies
//! the include/exclude filter set, and splits survivors into plain modules and
//! token modules. Loading is deterministic: descriptors are processed in file
//! name order and the output preserves that order.
//!
//! Descriptor inputs are untrusted; reads are size-limited and parsing fails
//! closed on any malformed file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::filter::FilterSet;
use crate::identifiers::AbiName;
use crate::identifiers::ModuleName;
use crate::module::ModuleDef;
use crate::module::TestModule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Descriptor file extension recognized by the loader.
const DESCRIPTOR_EXTENSION: &str = "toml";

// ============================================================================
// SECTION: Load Request
// ============================================================================

/// Inputs for one repository load.
///
/// # Invariants
/// - `abis` is non-empty and ordered; expansion preserves this order.
#[derive(Debug, Clone)]
pub struct RepoRequest {
    /// Directory scanned for module descriptors.
    pub tests_dir: PathBuf,
    /// Configured target ABIs, in priority order.
    pub abis: Vec<AbiName>,
    /// Runtime hint applied when a descriptor declares none.
    pub default_runtime_hint_ms: u64,
    /// Maximum accepted descriptor file size in bytes.
    pub max_descriptor_bytes: usize,
    /// Include/exclude filter set.
    pub filters: FilterSet,
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// The filtered, per-ABI module set for a run.
#[derive(Debug, Clone, Default)]
pub struct ModuleRepo {
    /// Modules without token requirements, in load order.
    modules: Vec<TestModule>,
    /// Modules with token requirements, in load order.
    token_modules: Vec<TestModule>,
}

impl ModuleRepo {
    /// Loads and filters the module repository described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] when the tests directory is unreadable, a
    /// descriptor is oversized or malformed, or two descriptors declare the
    /// same module name.
    pub fn load(request: &RepoRequest) -> Result<Self, RepoError> {
        if request.abis.is_empty() {
            return Err(RepoError::Invalid("abi list must be non-empty".to_string()));
        }

        let mut seen_names: BTreeSet<ModuleName> = BTreeSet::new();
        let mut modules = Vec::new();
        let mut token_modules = Vec::new();

        for path in descriptor_paths(&request.tests_dir)? {
            let def = read_descriptor(&path, request.max_descriptor_bytes)?;
            let name = resolve_name(&path, def.name.clone())?;
            if !seen_names.insert(name.clone()) {
                return Err(RepoError::Invalid(format!(
                    "duplicate module name '{name}' in {}",
                    path.display()
                )));
            }

            for module in expand(&def, name, request) {
                let Some(module) = request.filters.apply(module) else {
                    continue;
                };
                if module.requires_tokens() {
                    token_modules.push(module);
                } else {
                    modules.push(module);
                }
            }
        }

        Ok(Self { modules, token_modules })
    }

    /// Returns the plain (tokenless) modules in load order.
    #[must_use]
    pub fn modules(&self) -> &[TestModule] {
        &self.modules
    }

    /// Returns the token-requiring modules in load order.
    #[must_use]
    pub fn token_modules(&self) -> &[TestModule] {
        &self.token_modules
    }

    /// Returns the total number of surviving module instantiations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len() + self.token_modules.len()
    }

    /// Returns whether no module survived loading and filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.token_modules.is_empty()
    }
}

// ============================================================================
// SECTION: Loader Helpers
// ============================================================================

/// Collects descriptor paths from the tests directory in file name order.
fn descriptor_paths(tests_dir: &Path) -> Result<Vec<PathBuf>, RepoError> {
    let entries = fs::read_dir(tests_dir).map_err(|err| {
        RepoError::Io(format!("cannot read tests dir {}: {err}", tests_dir.display()))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|err| RepoError::Io(format!("cannot read dir entry: {err}")))?;
        let path = entry.path();
        let is_descriptor = path.is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(DESCRIPTOR_EXTENSION);
        if is_descriptor {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Reads and parses one descriptor with a size limit.
fn read_descriptor(path: &Path, max_bytes: usize) -> Result<ModuleDef, RepoError> {
    let bytes = fs::read(path)
        .map_err(|err| RepoError::Io(format!("cannot read {}: {err}", path.display())))?;
    if bytes.len() > max_bytes {
        return Err(RepoError::Invalid(format!(
            "descriptor {} exceeds size limit",
            path.display()
        )));
    }
    let content = std::str::from_utf8(&bytes).map_err(|_| {
        RepoError::Invalid(format!("descriptor {} must be utf-8", path.display()))
    })?;
    toml::from_str(content)
        .map_err(|err| RepoError::Parse(format!("descriptor {}: {err}", path.display())))
}

/// Resolves the module name from the descriptor or the file stem.
fn resolve_name(path: &Path, declared: Option<ModuleName>) -> Result<ModuleName, RepoError> {
    if let Some(name) = declared {
        if name.as_str().trim().is_empty() {
            return Err(RepoError::Invalid(format!(
                "descriptor {} declares a blank module name",
                path.display()
            )));
        }
        return Ok(name);
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ModuleName::new)
        .ok_or_else(|| {
            RepoError::Invalid(format!("descriptor {} has no utf-8 file stem", path.display()))
        })
}

/// Expands a descriptor into one module per effective ABI.
fn expand(def: &ModuleDef, name: ModuleName, request: &RepoRequest) -> Vec<TestModule> {
    let mut abis: Vec<AbiName> = match &def.abis {
        Some(declared) => request
            .abis
            .iter()
            .filter(|abi| declared.contains(abi))
            .cloned()
            .collect(),
        None => request.abis.clone(),
    };
    if def.not_multi_abi {
        abis.truncate(1);
    }

    abis.into_iter()
        .map(|abi| TestModule {
            name: name.clone(),
            abi,
            runtime_hint_ms: def.runtime_hint_ms.unwrap_or(request.default_runtime_hint_ms),
            token_requirements: def.token_requirements.clone(),
            options: def.options.clone(),
        })
        .collect()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while loading the module repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// I/O failure while scanning or reading descriptors.
    #[error("repo io error: {0}")]
    Io(String),
    /// Descriptor TOML parsing error.
    #[error("descriptor parse error: {0}")]
    Parse(String),
    /// Invalid repository content.
    #[error("invalid module repository: {0}")]
    Invalid(String),
}
