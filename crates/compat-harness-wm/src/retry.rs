// crates/compat-harness-wm/src/retry.rs
// ============================================================================
// Module: Dump Retry
// Description: Re-reads transient window-manager dumps until valid.
// Purpose: Bound retries on incomplete snapshots taken mid-transition.
// Dependencies: crate::state, thiserror via crate::state::WmError
// ============================================================================

//! ## Overview
//! A dump taken while the window manager is mid-transition decodes cleanly but
//! is incomplete (no focused window or app, or a frozen display).
//! [`compute_state`] re-reads the source until the snapshot is valid or the
//! retry budget is spent, returning the last snapshot either way so callers
//! can assert on whatever the device settled into.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::state::WindowManagerState;
use crate::state::WmError;

// ============================================================================
// SECTION: Dump Sources
// ============================================================================

/// Produces raw dump bytes on demand.
pub trait DumpSource {
    /// Fetches one dump.
    ///
    /// # Errors
    ///
    /// Returns [`WmError`] when the dump cannot be fetched.
    fn dump(&mut self) -> Result<Vec<u8>, WmError>;
}

/// Dump source backed by a file re-read on every attempt.
#[derive(Debug, Clone)]
pub struct FileDumpSource {
    /// Path of the dump file.
    path: PathBuf,
}

impl FileDumpSource {
    /// Creates a file-backed dump source.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the dump file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DumpSource for FileDumpSource {
    fn dump(&mut self) -> Result<Vec<u8>, WmError> {
        fs::read(&self.path)
            .map_err(|err| WmError::Io(format!("cannot read {}: {err}", self.path.display())))
    }
}

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Bounds for the dump retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of dump attempts (at least 1).
    pub retry_limit: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Maximum accepted dump size in bytes.
    pub max_dump_bytes: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: 5,
            retry_delay: Duration::from_millis(500),
            max_dump_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Outcome of a retry loop: the last snapshot and the attempts spent.
#[derive(Debug, Clone)]
pub struct ComputedState {
    /// The last snapshot decoded (valid or transient).
    pub state: WindowManagerState,
    /// Number of dump attempts performed.
    pub attempts: u32,
}

impl ComputedState {
    /// Returns whether the final snapshot is complete.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }
}

// ============================================================================
// SECTION: Retry Loop
// ============================================================================

/// Reads dumps until a valid snapshot appears or the budget is spent.
///
/// Returns the last decodable snapshot even when it never became valid;
/// callers decide whether a transient final state is acceptable.
///
/// # Errors
///
/// Returns [`WmError`] when the policy allows no attempts or every attempt
/// failed to fetch or decode.
pub fn compute_state(
    source: &mut dyn DumpSource,
    policy: &RetryPolicy,
) -> Result<ComputedState, WmError> {
    if policy.retry_limit == 0 {
        return Err(WmError::Invalid("retry limit must be at least 1".to_string()));
    }

    let mut last_state: Option<WindowManagerState> = None;
    let mut last_error: Option<WmError> = None;

    for attempt in 1 ..= policy.retry_limit {
        match source.dump().and_then(|bytes| {
            WindowManagerState::decode(&bytes, policy.max_dump_bytes)
        }) {
            Ok(state) => {
                if state.is_valid() {
                    return Ok(ComputedState { state, attempts: attempt });
                }
                last_state = Some(state);
            }
            Err(err) => {
                last_error = Some(err);
            }
        }
        if attempt < policy.retry_limit && !policy.retry_delay.is_zero() {
            thread::sleep(policy.retry_delay);
        }
    }

    match (last_state, last_error) {
        (Some(state), _) => Ok(ComputedState { state, attempts: policy.retry_limit }),
        (None, Some(err)) => Err(err),
        (None, None) => Err(WmError::Invalid("no dump attempts were made".to_string())),
    }
}
