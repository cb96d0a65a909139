// crates/compat-harness-config/src/config.rs
// ============================================================================
// Module: Compat Harness Configuration
// Description: Configuration loading and validation for the harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: compat-harness-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed; every section is validated
//! before a [`HarnessConfig`] is handed to callers. Filter files referenced by
//! the config are merged into the inline lists when building a repository
//! request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use compat_harness_core::AbiName;
use compat_harness_core::DeviceSerial;
use compat_harness_core::DeviceSlot;
use compat_harness_core::FilterSet;
use compat_harness_core::RepoRequest;
use compat_harness_core::TokenName;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "compat-harness.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "COMPAT_HARNESS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// ABIs the harness recognizes in configs and filter entries.
pub const KNOWN_ABIS: &[&str] = &["armeabi-v7a", "arm64-v8a", "x86", "x86_64", "riscv64"];
/// Default runtime hint applied to descriptors that declare none.
pub(crate) const DEFAULT_RUNTIME_HINT_MS: u64 = 60_000;
/// Default maximum descriptor file size in bytes.
pub(crate) const DEFAULT_MAX_DESCRIPTOR_BYTES: usize = 64 * 1024;
/// Maximum allowed descriptor file size in bytes.
pub(crate) const MAX_DESCRIPTOR_BYTES_LIMIT: usize = 1024 * 1024;
/// Maximum allowed shard count.
pub(crate) const MAX_SHARD_COUNT: usize = 256;
/// Maximum number of filter entries after merging files.
pub(crate) const MAX_FILTER_ENTRIES: usize = 4096;
/// Maximum filter file size in bytes.
pub(crate) const MAX_FILTER_FILE_SIZE: usize = 1024 * 1024;
/// Maximum number of configured device slots.
pub(crate) const MAX_DEVICE_SLOTS: usize = 64;
/// Default maximum window-manager dump size in bytes.
pub(crate) const DEFAULT_WM_MAX_DUMP_BYTES: usize = 4 * 1024 * 1024;
/// Maximum allowed window-manager dump size in bytes.
pub(crate) const MAX_WM_DUMP_BYTES: usize = 64 * 1024 * 1024;
/// Default retry limit for transient window-manager dumps.
pub(crate) const DEFAULT_WM_RETRY_LIMIT: u32 = 5;
/// Maximum allowed retry limit for window-manager dumps.
pub(crate) const MAX_WM_RETRY_LIMIT: u32 = 100;
/// Default delay between dump retries in milliseconds.
pub(crate) const DEFAULT_WM_RETRY_DELAY_MS: u64 = 500;
/// Maximum allowed delay between dump retries in milliseconds.
pub(crate) const MAX_WM_RETRY_DELAY_MS: u64 = 10_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Compat harness configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarnessConfig {
    /// Module repository configuration.
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Shard planning configuration.
    #[serde(default)]
    pub sharding: ShardingConfig,
    /// Include/exclude filter configuration.
    #[serde(default)]
    pub filters: FiltersConfig,
    /// Device-token configuration for assignment.
    #[serde(default)]
    pub tokens: TokensConfig,
    /// Window-manager dump configuration.
    #[serde(default)]
    pub wm: WmConfig,
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.modules.validate()?;
        self.sharding.validate()?;
        self.filters.validate()?;
        self.tokens.validate()?;
        self.wm.validate()?;
        Ok(())
    }

    /// Builds the repository load request, merging filter files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a filter file is unreadable or an entry
    /// fails to parse.
    pub fn repo_request(&self) -> Result<RepoRequest, ConfigError> {
        let abis = self.modules.abi_names();
        let includes = self.filters.merged_includes()?;
        let excludes = self.filters.merged_excludes()?;
        let filters = FilterSet::parse(&includes, &excludes, &abis)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(RepoRequest {
            tests_dir: self.modules.tests_dir.clone(),
            abis,
            default_runtime_hint_ms: self.modules.default_runtime_hint_ms,
            max_descriptor_bytes: self.modules.max_descriptor_bytes,
            filters,
        })
    }

    /// Returns the configured device slots in declaration order.
    #[must_use]
    pub fn device_slots(&self) -> Vec<DeviceSlot> {
        self.tokens
            .devices
            .iter()
            .map(|device| DeviceSlot {
                serial: DeviceSerial::new(device.serial.clone()),
                tokens: device.tokens.iter().map(|token| TokenName::new(token.clone())).collect(),
            })
            .collect()
    }
}

/// Module repository section.
#[derive(Debug, Clone, Deserialize)]
pub struct ModulesConfig {
    /// Directory scanned for module descriptors.
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,
    /// Target ABIs in priority order.
    #[serde(default = "default_abis")]
    pub abis: Vec<String>,
    /// Runtime hint applied when a descriptor declares none.
    #[serde(default = "default_runtime_hint")]
    pub default_runtime_hint_ms: u64,
    /// Maximum accepted descriptor file size in bytes.
    #[serde(default = "default_max_descriptor_bytes")]
    pub max_descriptor_bytes: usize,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            tests_dir: default_tests_dir(),
            abis: default_abis(),
            default_runtime_hint_ms: default_runtime_hint(),
            max_descriptor_bytes: default_max_descriptor_bytes(),
        }
    }
}

impl ModulesConfig {
    /// Validates the module repository section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("modules.tests_dir", &self.tests_dir.to_string_lossy())?;
        if self.abis.is_empty() {
            return Err(ConfigError::Invalid("modules.abis must be non-empty".to_string()));
        }
        let mut seen = BTreeSet::new();
        for abi in &self.abis {
            if !KNOWN_ABIS.contains(&abi.as_str()) {
                return Err(ConfigError::Invalid(format!("modules.abis entry '{abi}' is unknown")));
            }
            if !seen.insert(abi.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "modules.abis entry '{abi}' is duplicated"
                )));
            }
        }
        if self.default_runtime_hint_ms == 0 {
            return Err(ConfigError::Invalid(
                "modules.default_runtime_hint_ms must be positive".to_string(),
            ));
        }
        if self.max_descriptor_bytes == 0 || self.max_descriptor_bytes > MAX_DESCRIPTOR_BYTES_LIMIT
        {
            return Err(ConfigError::Invalid(
                "modules.max_descriptor_bytes is out of range".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the configured ABIs as typed names.
    #[must_use]
    pub fn abi_names(&self) -> Vec<AbiName> {
        self.abis.iter().map(|abi| AbiName::new(abi.clone())).collect()
    }
}

/// Shard planning section.
#[derive(Debug, Clone, Deserialize)]
pub struct ShardingConfig {
    /// Number of shards to partition plain modules into.
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,
    /// Optional local shard index for single-shard execution.
    #[serde(default)]
    pub local_shard_index: Option<usize>,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self { shard_count: default_shard_count(), local_shard_index: None }
    }
}

impl ShardingConfig {
    /// Validates the shard planning section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 || self.shard_count > MAX_SHARD_COUNT {
            return Err(ConfigError::Invalid("sharding.shard_count is out of range".to_string()));
        }
        if let Some(index) = self.local_shard_index {
            if index >= self.shard_count {
                return Err(ConfigError::Invalid(
                    "sharding.local_shard_index must be below shard_count".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Include/exclude filter section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltersConfig {
    /// Inline include entries.
    #[serde(default)]
    pub include: Vec<String>,
    /// Inline exclude entries.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Files with one include entry per line (`#` starts a comment).
    #[serde(default)]
    pub include_files: Vec<PathBuf>,
    /// Files with one exclude entry per line (`#` starts a comment).
    #[serde(default)]
    pub exclude_files: Vec<PathBuf>,
}

impl FiltersConfig {
    /// Validates the filter section.
    fn validate(&self) -> Result<(), ConfigError> {
        for path in self.include_files.iter().chain(&self.exclude_files) {
            validate_path_string("filters file path", &path.to_string_lossy())?;
        }
        for entry in self.include.iter().chain(&self.exclude) {
            if entry.trim().is_empty() {
                return Err(ConfigError::Invalid("filter entries must be non-blank".to_string()));
            }
        }
        Ok(())
    }

    /// Merges inline include entries with file-provided entries.
    fn merged_includes(&self) -> Result<Vec<String>, ConfigError> {
        merge_entries(&self.include, &self.include_files)
    }

    /// Merges inline exclude entries with file-provided entries.
    fn merged_excludes(&self) -> Result<Vec<String>, ConfigError> {
        merge_entries(&self.exclude, &self.exclude_files)
    }
}

/// One configured device slot.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Device serial.
    pub serial: String,
    /// Tokens the device advertises.
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Device-token section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokensConfig {
    /// Device slots in assignment order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl TokensConfig {
    /// Validates the device-token section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.len() > MAX_DEVICE_SLOTS {
            return Err(ConfigError::Invalid("too many device slots".to_string()));
        }
        let mut seen = BTreeSet::new();
        for device in &self.devices {
            if device.serial.trim().is_empty() {
                return Err(ConfigError::Invalid("device serial must be non-blank".to_string()));
            }
            if !seen.insert(device.serial.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "device serial '{}' is duplicated",
                    device.serial
                )));
            }
            for token in &device.tokens {
                if token.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "device tokens must be non-blank".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Window-manager dump section.
#[derive(Debug, Clone, Deserialize)]
pub struct WmConfig {
    /// Maximum accepted dump size in bytes.
    #[serde(default = "default_wm_max_dump_bytes")]
    pub max_dump_bytes: usize,
    /// Number of dump attempts before giving up on a valid snapshot.
    #[serde(default = "default_wm_retry_limit")]
    pub retry_limit: u32,
    /// Delay between dump attempts in milliseconds.
    #[serde(default = "default_wm_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for WmConfig {
    fn default() -> Self {
        Self {
            max_dump_bytes: default_wm_max_dump_bytes(),
            retry_limit: default_wm_retry_limit(),
            retry_delay_ms: default_wm_retry_delay_ms(),
        }
    }
}

impl WmConfig {
    /// Validates the window-manager section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dump_bytes == 0 || self.max_dump_bytes > MAX_WM_DUMP_BYTES {
            return Err(ConfigError::Invalid("wm.max_dump_bytes is out of range".to_string()));
        }
        if self.retry_limit == 0 || self.retry_limit > MAX_WM_RETRY_LIMIT {
            return Err(ConfigError::Invalid("wm.retry_limit is out of range".to_string()));
        }
        if self.retry_delay_ms > MAX_WM_RETRY_DELAY_MS {
            return Err(ConfigError::Invalid("wm.retry_delay_ms is out of range".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Merges inline filter entries with file-provided entries.
fn merge_entries(inline: &[String], files: &[PathBuf]) -> Result<Vec<String>, ConfigError> {
    let mut entries: Vec<String> = inline.iter().map(|entry| entry.trim().to_string()).collect();
    for path in files {
        entries.extend(read_filter_file(path)?);
    }
    if entries.len() > MAX_FILTER_ENTRIES {
        return Err(ConfigError::Invalid("too many filter entries".to_string()));
    }
    Ok(entries)
}

/// Reads a filter file: one entry per line, `#` comments, blanks skipped.
fn read_filter_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let bytes = fs::read(path).map_err(|err| {
        ConfigError::Io(format!("cannot read filter file {}: {err}", path.display()))
    })?;
    if bytes.len() > MAX_FILTER_FILE_SIZE {
        return Err(ConfigError::Invalid(format!(
            "filter file {} exceeds size limit",
            path.display()
        )));
    }
    let content = std::str::from_utf8(&bytes).map_err(|_| {
        ConfigError::Invalid(format!("filter file {} must be utf-8", path.display()))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default tests directory.
fn default_tests_dir() -> PathBuf {
    PathBuf::from("testcases")
}

/// Default ABI list.
fn default_abis() -> Vec<String> {
    vec!["arm64-v8a".to_string()]
}

/// Default runtime hint.
const fn default_runtime_hint() -> u64 {
    DEFAULT_RUNTIME_HINT_MS
}

/// Default descriptor size limit.
const fn default_max_descriptor_bytes() -> usize {
    DEFAULT_MAX_DESCRIPTOR_BYTES
}

/// Default shard count.
const fn default_shard_count() -> usize {
    1
}

/// Default dump size limit.
const fn default_wm_max_dump_bytes() -> usize {
    DEFAULT_WM_MAX_DUMP_BYTES
}

/// Default dump retry limit.
const fn default_wm_retry_limit() -> u32 {
    DEFAULT_WM_RETRY_LIMIT
}

/// Default dump retry delay.
const fn default_wm_retry_delay_ms() -> u64 {
    DEFAULT_WM_RETRY_DELAY_MS
}
