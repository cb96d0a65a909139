// crates/compat-harness-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Loading and validation matrix for compat-harness.toml.
// ============================================================================
//! ## Overview
//! Exercises the fail-closed loader: defaults, section range checks, device
//! duplicate detection, and filter-file merging into the repository request.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::PathBuf;

use compat_harness_config::ConfigError;
use compat_harness_config::HarnessConfig;
use tempfile::TempDir;

/// Writes a config file and returns its path.
fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("compat-harness.toml");
    fs::write(&path, content).expect("write config");
    path
}

/// Loads a config from literal TOML content.
fn load(content: &str) -> Result<HarnessConfig, ConfigError> {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, content);
    HarnessConfig::load(Some(&path))
}

#[test]
fn empty_file_loads_defaults() {
    let config = load("").expect("load");
    assert_eq!(config.modules.abis, vec!["arm64-v8a".to_string()]);
    assert_eq!(config.modules.default_runtime_hint_ms, 60_000);
    assert_eq!(config.sharding.shard_count, 1);
    assert_eq!(config.wm.retry_limit, 5);
    assert!(config.tokens.devices.is_empty());
}

#[test]
fn missing_file_fails_closed() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let err = HarnessConfig::load(Some(&missing)).expect_err("missing");
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn malformed_toml_fails_closed() {
    let err = load("[modules\n").expect_err("parse");
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn unknown_abi_is_rejected() {
    let err = load("[modules]\nabis = [\"mips64\"]\n").expect_err("unknown abi");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn duplicate_abi_is_rejected() {
    let err =
        load("[modules]\nabis = [\"arm64-v8a\", \"arm64-v8a\"]\n").expect_err("dup abi");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn zero_runtime_hint_is_rejected() {
    let err = load("[modules]\ndefault_runtime_hint_ms = 0\n").expect_err("zero hint");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn shard_count_range_is_enforced() {
    assert!(matches!(
        load("[sharding]\nshard_count = 0\n").expect_err("zero"),
        ConfigError::Invalid(_)
    ));
    assert!(matches!(
        load("[sharding]\nshard_count = 1000\n").expect_err("too many"),
        ConfigError::Invalid(_)
    ));
}

#[test]
fn local_shard_index_must_be_below_count() {
    let err = load("[sharding]\nshard_count = 2\nlocal_shard_index = 2\n")
        .expect_err("index out of range");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn wm_ranges_are_enforced() {
    assert!(load("[wm]\nmax_dump_bytes = 0\n").is_err());
    assert!(load("[wm]\nretry_limit = 0\n").is_err());
    assert!(load("[wm]\nretry_delay_ms = 999999\n").is_err());
}

#[test]
fn duplicate_device_serials_are_rejected() {
    let content = r#"
[[tokens.devices]]
serial = "emulator-5554"

[[tokens.devices]]
serial = "emulator-5554"
tokens = ["sim-card"]
"#;
    let err = load(content).expect_err("dup serial");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn blank_device_serial_is_rejected() {
    let err = load("[[tokens.devices]]\nserial = \" \"\n").expect_err("blank serial");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn device_slots_preserve_declaration_order() {
    let content = r#"
[[tokens.devices]]
serial = "serial-a"

[[tokens.devices]]
serial = "serial-b"
tokens = ["sim-card"]
"#;
    let config = load(content).expect("load");
    let slots = config.device_slots();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].serial.as_str(), "serial-a");
    assert_eq!(slots[1].serial.as_str(), "serial-b");
    assert_eq!(slots[1].tokens.len(), 1);
}

#[test]
fn blank_inline_filter_entries_are_rejected() {
    let err = load("[filters]\ninclude = [\" \"]\n").expect_err("blank filter");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn repo_request_merges_filter_files() {
    let dir = TempDir::new().expect("tempdir");
    let filter_path = dir.path().join("excludes.txt");
    fs::write(&filter_path, "# legacy failures\n\nSampleLegacyModule\nx86_64 FlakyModule\n")
        .expect("write filters");
    let content = format!(
        "[modules]\nabis = [\"arm64-v8a\", \"x86_64\"]\n\n[filters]\nexclude = [\"InlineModule\"]\nexclude_files = [{:?}]\n",
        filter_path
    );
    let path = write_config(&dir, &content);

    let config = HarnessConfig::load(Some(&path)).expect("load");
    let request = config.repo_request().expect("request");
    let excludes: Vec<String> =
        request.filters.excludes().iter().map(ToString::to_string).collect();
    assert_eq!(
        excludes,
        vec![
            "InlineModule".to_string(),
            "SampleLegacyModule".to_string(),
            "x86_64 FlakyModule".to_string(),
        ]
    );
}

#[test]
fn repo_request_rejects_unreadable_filter_files() {
    let dir = TempDir::new().expect("tempdir");
    let content = "[filters]\nexclude_files = [\"/nonexistent/excludes.txt\"]\n";
    let path = write_config(&dir, content);

    let config = HarnessConfig::load(Some(&path)).expect("load");
    let err = config.repo_request().expect_err("unreadable filter file");
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn repo_request_carries_module_settings() {
    let content = r#"
[modules]
tests_dir = "my-tests"
abis = ["x86_64"]
default_runtime_hint_ms = 1234
max_descriptor_bytes = 4096
"#;
    let config = load(content).expect("load");
    let request = config.repo_request().expect("request");
    assert_eq!(request.tests_dir, PathBuf::from("my-tests"));
    assert_eq!(request.abis.len(), 1);
    assert_eq!(request.default_runtime_hint_ms, 1234);
    assert_eq!(request.max_descriptor_bytes, 4096);
}
