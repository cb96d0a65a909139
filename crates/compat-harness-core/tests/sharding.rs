// crates/compat-harness-core/tests/sharding.rs
// ============================================================================
// Module: Shard Planning Tests
// Description: Partition balance, determinism, and device assignment tests.
// ============================================================================
//! ## Overview
//! Exercises the LPT partition and the device assignment rules: runtime
//! balance, stable ordering, token routing, and fail-closed mismatches.

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

use compat_harness_core::AbiName;
use compat_harness_core::DeviceSerial;
use compat_harness_core::DeviceSlot;
use compat_harness_core::ModuleName;
use compat_harness_core::ShardError;
use compat_harness_core::ShardPlan;
use compat_harness_core::TestModule;
use compat_harness_core::TokenName;

/// Builds a module with the given name and runtime hint.
fn module(name: &str, hint: u64) -> TestModule {
    TestModule {
        name: ModuleName::new(name),
        abi: AbiName::new("arm64-v8a"),
        runtime_hint_ms: hint,
        token_requirements: Vec::new(),
        options: Vec::new(),
    }
}

/// Builds a token-requiring module.
fn token_module(name: &str, hint: u64, token: &str) -> TestModule {
    TestModule {
        name: ModuleName::new(name),
        abi: AbiName::new("arm64-v8a"),
        runtime_hint_ms: hint,
        token_requirements: vec![TokenName::new(token)],
        options: Vec::new(),
    }
}

/// Builds a device slot with the given tokens.
fn device(serial: &str, tokens: &[&str]) -> DeviceSlot {
    DeviceSlot {
        serial: DeviceSerial::new(serial),
        tokens: tokens.iter().map(|token| TokenName::new(*token)).collect(),
    }
}

#[test]
fn zero_shards_is_an_error() {
    let err = ShardPlan::partition(&[module("A", 1)], 0).expect_err("zero shards");
    assert!(matches!(err, ShardError::Invalid(_)));
}

#[test]
fn every_module_lands_in_exactly_one_shard() {
    let modules: Vec<TestModule> =
        (0u64 .. 10).map(|i| module(&format!("M{i}"), (i + 1) * 500)).collect();
    let plan = ShardPlan::partition(&modules, 3).expect("partition");

    assert_eq!(plan.module_count(), modules.len());
    let mut seen: Vec<String> = plan
        .shards
        .iter()
        .flat_map(|shard| &shard.modules)
        .map(|module| module.id().to_string())
        .collect();
    seen.sort();
    let mut expected: Vec<String> =
        modules.iter().map(|module| module.id().to_string()).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn heaviest_modules_spread_across_shards() {
    let modules =
        vec![module("Big", 10_000), module("AlsoBig", 10_000), module("Small", 100)];
    let plan = ShardPlan::partition(&modules, 2).expect("partition");

    let weights: Vec<u64> = plan.shards.iter().map(|shard| shard.weight_ms).collect();
    assert_eq!(weights, vec![10_100, 10_000]);
}

#[test]
fn spread_never_exceeds_the_largest_hint() {
    let modules: Vec<TestModule> =
        (0u64 .. 20).map(|i| module(&format!("M{i}"), 100 + (i * 37) % 5_000)).collect();
    let max_hint = modules.iter().map(|m| m.runtime_hint_ms).max().unwrap_or(0);
    let plan = ShardPlan::partition(&modules, 4).expect("partition");

    let max = plan.shards.iter().map(|shard| shard.weight_ms).max().unwrap_or(0);
    let min = plan.shards.iter().map(|shard| shard.weight_ms).min().unwrap_or(0);
    assert!(max - min <= max_hint);
}

#[test]
fn partition_is_deterministic() {
    let modules: Vec<TestModule> =
        (0u64 .. 16).map(|i| module(&format!("M{i}"), 1_000)).collect();
    let first = ShardPlan::partition(&modules, 5).expect("partition");
    let second = ShardPlan::partition(&modules, 5).expect("partition");
    assert_eq!(first, second);
}

#[test]
fn surplus_shards_stay_empty() {
    let plan = ShardPlan::partition(&[module("Only", 1_000)], 3).expect("partition");
    assert_eq!(plan.shard_count(), 3);
    assert_eq!(plan.shards[0].modules.len(), 1);
    assert!(plan.shards[1].modules.is_empty());
    assert!(plan.shards[2].modules.is_empty());
}

#[test]
fn equal_hints_tie_break_by_module_id() {
    let modules = vec![module("Beta", 1_000), module("Alpha", 1_000)];
    let plan = ShardPlan::partition(&modules, 2).expect("partition");
    assert_eq!(plan.shards[0].modules[0].name.as_str(), "Alpha");
    assert_eq!(plan.shards[1].modules[0].name.as_str(), "Beta");
}

#[test]
fn assignment_routes_token_modules_to_eligible_devices() {
    let modules = vec![module("Plain", 1_000)];
    let plan = ShardPlan::partition(&modules, 2).expect("partition");
    let tokens = vec![token_module("SimTests", 2_000, "sim-card")];
    let devices = vec![device("serial-a", &[]), device("serial-b", &["sim-card"])];

    let assignments = plan.assign(&tokens, &devices).expect("assign");
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0].modules.len(), 1);
    assert_eq!(assignments[1].modules.len(), 1);
    assert_eq!(assignments[1].modules[0].name.as_str(), "SimTests");
    assert_eq!(assignments[1].weight_ms, 2_000);
}

#[test]
fn token_module_with_no_eligible_device_fails_closed() {
    let plan = ShardPlan::partition(&[], 1).expect("partition");
    let tokens = vec![token_module("SimTests", 2_000, "sim-card")];
    let devices = vec![device("serial-a", &[])];

    let err = plan.assign(&tokens, &devices).expect_err("no eligible device");
    assert!(matches!(err, ShardError::Assignment(_)));
}

#[test]
fn device_count_must_match_shard_count() {
    let plan = ShardPlan::partition(&[module("A", 1)], 2).expect("partition");
    let err = plan.assign(&[], &[device("serial-a", &[])]).expect_err("mismatch");
    assert!(matches!(err, ShardError::Assignment(_)));
}

#[test]
fn multi_token_modules_need_a_device_with_all_tokens() {
    let plan = ShardPlan::partition(&[], 2).expect("partition");
    let mut needy = token_module("Needy", 1_000, "sim-card");
    needy.token_requirements.push(TokenName::new("uicc"));
    let devices =
        vec![device("serial-a", &["sim-card"]), device("serial-b", &["sim-card", "uicc"])];

    let assignments = plan.assign(&[needy], &devices).expect("assign");
    assert!(assignments[0].modules.is_empty());
    assert_eq!(assignments[1].modules.len(), 1);
}
