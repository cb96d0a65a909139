// crates/compat-harness-core/src/shard.rs
// ============================================================================
// Module: Shard Planning
// Description: Runtime-balanced module partitioning and device assignment.
// Purpose: Split a module set across shards and map shards to device slots.
// Dependencies: crate::{identifiers, module}, serde, thiserror
// ============================================================================

//! ## Overview
//! Partitioning uses the longest-processing-time greedy rule: modules are
//! sorted by runtime hint descending (ties broken by module id ascending) and
//! each is placed on the currently lightest shard. The plan is a pure function
//! of its inputs, so repeated runs over the same repository produce identical
//! shards. Token modules are kept out of the partition and routed directly to
//! an eligible device during assignment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identifiers::DeviceSerial;
use crate::identifiers::TokenName;
use crate::module::TestModule;

// ============================================================================
// SECTION: Shard Model
// ============================================================================

/// One shard of the partitioned module set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Zero-based shard index.
    pub index: usize,
    /// Modules assigned to this shard, in assignment order.
    pub modules: Vec<TestModule>,
    /// Sum of runtime hints for the assigned modules.
    pub weight_ms: u64,
}

/// A deterministic partition of plain modules into shards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardPlan {
    /// Shards in index order; some may be empty when modules are scarce.
    pub shards: Vec<Shard>,
}

impl ShardPlan {
    /// Partitions `modules` into `shard_count` runtime-balanced shards.
    ///
    /// # Errors
    ///
    /// Returns [`ShardError`] when `shard_count` is zero.
    pub fn partition(modules: &[TestModule], shard_count: usize) -> Result<Self, ShardError> {
        if shard_count == 0 {
            return Err(ShardError::Invalid("shard count must be at least 1".to_string()));
        }

        let mut ordered: Vec<TestModule> = modules.to_vec();
        ordered.sort_by(|a, b| {
            b.runtime_hint_ms
                .cmp(&a.runtime_hint_ms)
                .then_with(|| a.id().cmp(&b.id()))
        });

        let mut shards: Vec<Shard> = (0 .. shard_count)
            .map(|index| Shard { index, modules: Vec::new(), weight_ms: 0 })
            .collect();

        for module in ordered {
            let Some(target) = shards.iter_mut().min_by_key(|shard| (shard.weight_ms, shard.index))
            else {
                return Err(ShardError::Invalid("shard list is empty".to_string()));
            };
            target.weight_ms = target.weight_ms.saturating_add(module.runtime_hint_ms);
            target.modules.push(module);
        }

        Ok(Self { shards })
    }

    /// Returns the number of shards in the plan.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the total number of modules across all shards.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.shards.iter().map(|shard| shard.modules.len()).sum()
    }

    /// Maps shards onto device slots and routes token modules.
    ///
    /// Each shard goes to the device slot with the same index. Every token
    /// module goes to the first device advertising all of its required tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ShardError`] when the device count differs from the shard
    /// count or a token module has no eligible device.
    pub fn assign(
        &self,
        token_modules: &[TestModule],
        devices: &[DeviceSlot],
    ) -> Result<Vec<DeviceAssignment>, ShardError> {
        if devices.len() != self.shards.len() {
            return Err(ShardError::Assignment(format!(
                "{} device slots for {} shards",
                devices.len(),
                self.shards.len()
            )));
        }

        let mut assignments: Vec<DeviceAssignment> = devices
            .iter()
            .zip(&self.shards)
            .map(|(device, shard)| DeviceAssignment {
                serial: device.serial.clone(),
                modules: shard.modules.clone(),
                weight_ms: shard.weight_ms,
            })
            .collect();

        for module in token_modules {
            let position = devices
                .iter()
                .position(|device| device.holds_all(&module.token_requirements));
            let Some(position) = position else {
                return Err(ShardError::Assignment(format!(
                    "no device holds the tokens required by module '{}'",
                    module.id()
                )));
            };
            let assignment = &mut assignments[position];
            assignment.weight_ms = assignment.weight_ms.saturating_add(module.runtime_hint_ms);
            assignment.modules.push(module.clone());
        }

        Ok(assignments)
    }
}

// ============================================================================
// SECTION: Device Slots
// ============================================================================

/// A device slot available for assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSlot {
    /// Device serial.
    pub serial: DeviceSerial,
    /// Tokens the device advertises.
    pub tokens: Vec<TokenName>,
}

impl DeviceSlot {
    /// Returns whether the device advertises every required token.
    #[must_use]
    pub fn holds_all(&self, required: &[TokenName]) -> bool {
        required.iter().all(|token| self.tokens.contains(token))
    }
}

/// The module set destined for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAssignment {
    /// Device serial.
    pub serial: DeviceSerial,
    /// Modules routed to the device, shard modules first.
    pub modules: Vec<TestModule>,
    /// Sum of runtime hints for the routed modules.
    pub weight_ms: u64,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while planning shards or assigning devices.
#[derive(Debug, Error)]
pub enum ShardError {
    /// Invalid partition request.
    #[error("invalid shard request: {0}")]
    Invalid(String),
    /// Device assignment failure.
    #[error("device assignment failed: {0}")]
    Assignment(String),
}
