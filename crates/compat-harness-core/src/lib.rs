// crates/compat-harness-core/src/lib.rs
// ============================================================================
// Module: Compat Harness Core Library
// Description: Public API surface for the compat-harness core.
// Purpose: Expose the module model, filter grammar, repository, and sharding.
// Dependencies: crate::{filter, identifiers, module, repo, shard}
// ============================================================================

//! ## Overview
//! compat-harness-core turns a directory of module descriptors into a
//! deterministic run plan: descriptors are expanded per target ABI, filtered
//! through include/exclude lists, and partitioned into runtime-balanced shards
//! that map onto device slots. It is harness-agnostic and operates purely on
//! files and in-memory values.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod filter;
pub mod identifiers;
pub mod module;
pub mod repo;
pub mod shard;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use filter::EXCLUDE_FILTER_OPTION;
pub use filter::FilterError;
pub use filter::FilterSet;
pub use filter::INCLUDE_FILTER_OPTION;
pub use filter::TestFilter;
pub use identifiers::AbiName;
pub use identifiers::DeviceSerial;
pub use identifiers::ModuleId;
pub use identifiers::ModuleName;
pub use identifiers::TokenName;
pub use module::ModuleDef;
pub use module::ModuleOption;
pub use module::TestModule;
pub use repo::ModuleRepo;
pub use repo::RepoError;
pub use repo::RepoRequest;
pub use shard::DeviceAssignment;
pub use shard::DeviceSlot;
pub use shard::Shard;
pub use shard::ShardError;
pub use shard::ShardPlan;
