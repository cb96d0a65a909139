// crates/compat-harness-wm/src/proto.rs
// ============================================================================
// Module: Window Manager Dump Proto
// Description: Wire messages for the window-manager state dump.
// Purpose: Decode the protobuf dump subset the harness reads.
// Dependencies: prost
// ============================================================================

//! ## Overview
//! Hand-written `prost` messages for the slice of the window-manager dump the
//! harness consumes: the service root (focus, input method, freeze state,
//! rotation), the root container with its displays and z-ordered windows, the
//! per-display task tree, and window states. Unknown fields in a dump are
//! skipped by prost, so newer producers remain decodable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use prost::Message;

// ============================================================================
// SECTION: Geometry
// ============================================================================

/// Rectangle in display coordinates.
#[derive(Clone, PartialEq, Message)]
pub struct RectProto {
    /// Left edge.
    #[prost(int32, tag = "1")]
    pub left: i32,
    /// Top edge.
    #[prost(int32, tag = "2")]
    pub top: i32,
    /// Right edge.
    #[prost(int32, tag = "3")]
    pub right: i32,
    /// Bottom edge.
    #[prost(int32, tag = "4")]
    pub bottom: i32,
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Identity of a window-manager object.
#[derive(Clone, PartialEq, Message)]
pub struct IdentifierProto {
    /// Identity hash of the server-side object.
    #[prost(uint32, tag = "1")]
    pub hash_code: u32,
    /// Owning user id.
    #[prost(int32, tag = "2")]
    pub user_id: i32,
    /// Window or container title.
    #[prost(string, tag = "3")]
    pub title: String,
}

// ============================================================================
// SECTION: Windows
// ============================================================================

/// One window state entry in z-order.
#[derive(Clone, PartialEq, Message)]
pub struct WindowStateProto {
    /// Window identity.
    #[prost(message, optional, tag = "1")]
    pub identifier: Option<IdentifierProto>,
    /// Display the window belongs to.
    #[prost(int32, tag = "2")]
    pub display_id: i32,
    /// Whether the surface is shown.
    #[prost(bool, tag = "3")]
    pub shown: bool,
    /// Whether the window is visible by policy.
    #[prost(bool, tag = "4")]
    pub visible: bool,
    /// Window frame.
    #[prost(message, optional, tag = "5")]
    pub frame: Option<RectProto>,
    /// Surface layer.
    #[prost(int32, tag = "6")]
    pub layer: i32,
    /// Window type constant.
    #[prost(int32, tag = "7")]
    pub window_type: i32,
}

// ============================================================================
// SECTION: Tasks
// ============================================================================

/// One activity record inside a task.
#[derive(Clone, PartialEq, Message)]
pub struct ActivityRecordProto {
    /// Component name of the activity.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Whether the activity is visible.
    #[prost(bool, tag = "2")]
    pub visible: bool,
    /// Whether the activity is at the front of its task.
    #[prost(bool, tag = "3")]
    pub front_of_task: bool,
}

/// A task node; root tasks nest child tasks.
#[derive(Clone, PartialEq, Message)]
pub struct TaskProto {
    /// Task id.
    #[prost(int32, tag = "1")]
    pub id: i32,
    /// Activity type constant.
    #[prost(int32, tag = "2")]
    pub activity_type: i32,
    /// Whether the task is visible.
    #[prost(bool, tag = "3")]
    pub visible: bool,
    /// Task bounds.
    #[prost(message, optional, tag = "4")]
    pub bounds: Option<RectProto>,
    /// Nested child tasks, front first.
    #[prost(message, repeated, tag = "5")]
    pub tasks: Vec<TaskProto>,
    /// Activities in the task, front first.
    #[prost(message, repeated, tag = "6")]
    pub activities: Vec<ActivityRecordProto>,
    /// Component name of the task's real activity.
    #[prost(string, tag = "7")]
    pub real_activity: String,
}

// ============================================================================
// SECTION: Displays
// ============================================================================

/// One display with its root task tree.
#[derive(Clone, PartialEq, Message)]
pub struct DisplayContentProto {
    /// Display id.
    #[prost(int32, tag = "1")]
    pub id: i32,
    /// Display bounds.
    #[prost(message, optional, tag = "2")]
    pub bounds: Option<RectProto>,
    /// Display density in dpi.
    #[prost(int32, tag = "3")]
    pub dpi: i32,
    /// Root tasks on the display, front first.
    #[prost(message, repeated, tag = "4")]
    pub root_tasks: Vec<TaskProto>,
}

// ============================================================================
// SECTION: Service Root
// ============================================================================

/// Root container holding displays and the global window list.
#[derive(Clone, PartialEq, Message)]
pub struct RootWindowContainerProto {
    /// Displays known to the window manager.
    #[prost(message, repeated, tag = "1")]
    pub displays: Vec<DisplayContentProto>,
    /// Windows in z-order, top first.
    #[prost(message, repeated, tag = "2")]
    pub windows: Vec<WindowStateProto>,
}

/// Top-level window-manager service dump.
#[derive(Clone, PartialEq, Message)]
pub struct WindowManagerServiceDumpProto {
    /// Root window container.
    #[prost(message, optional, tag = "1")]
    pub root: Option<RootWindowContainerProto>,
    /// Identity of the focused window, absent mid-transition.
    #[prost(message, optional, tag = "2")]
    pub focused_window: Option<IdentifierProto>,
    /// Component name of the focused application, empty mid-transition.
    #[prost(string, tag = "3")]
    pub focused_app: String,
    /// Identity of the input-method window, when shown.
    #[prost(message, optional, tag = "4")]
    pub input_method_window: Option<IdentifierProto>,
    /// Whether displays are frozen for a pending rotation.
    #[prost(bool, tag = "5")]
    pub display_frozen: bool,
    /// Current rotation (0-3).
    #[prost(int32, tag = "6")]
    pub rotation: i32,
    /// Last requested orientation constant.
    #[prost(int32, tag = "7")]
    pub last_orientation: i32,
}
