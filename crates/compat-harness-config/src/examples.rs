// crates/compat-harness-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for the compat-harness configuration. Output is
//! deterministic and asserted against the loader in tests.

/// Returns a canonical example `compat-harness.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[modules]
tests_dir = "testcases"
abis = ["arm64-v8a", "x86_64"]
default_runtime_hint_ms = 60000
max_descriptor_bytes = 65536

[sharding]
shard_count = 2
# local_shard_index = 0

[filters]
include = []
exclude = ["x86_64 SampleLegacyModule"]
# include_files = ["include-filters.txt"]
# exclude_files = ["exclude-filters.txt"]

[[tokens.devices]]
serial = "emulator-5554"
tokens = []

[[tokens.devices]]
serial = "emulator-5556"
tokens = ["sim-card"]

[wm]
max_dump_bytes = 4194304
retry_limit = 5
retry_delay_ms = 500
"#,
    )
}
