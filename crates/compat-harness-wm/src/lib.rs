// crates/compat-harness-wm/src/lib.rs
// ============================================================================
// Module: Compat Harness WM Library
// Description: Public API surface for window-manager dump handling.
// Purpose: Expose the proto model, owned snapshot, and retry helpers.
// Dependencies: crate::{proto, retry, state}
// ============================================================================

//! ## Overview
//! compat-harness-wm decodes a protobuf window-manager dump into an owned
//! display/task/window hierarchy for host-side assertions, and re-reads
//! transient dumps under a bounded retry policy. It never talks to a device
//! itself; dump bytes arrive through the [`DumpSource`] seam.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod proto;
pub mod retry;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use retry::ComputedState;
pub use retry::DumpSource;
pub use retry::FileDumpSource;
pub use retry::RetryPolicy;
pub use retry::compute_state;
pub use state::ActivityState;
pub use state::ActivityType;
pub use state::DEFAULT_DISPLAY_ID;
pub use state::DisplayState;
pub use state::Rect;
pub use state::TaskState;
pub use state::WindowManagerState;
pub use state::WindowState;
pub use state::WmError;
