// crates/compat-harness-wm/src/state.rs
// ============================================================================
// Module: Window Manager State
// Description: Owned snapshot model decoded from a window-manager dump.
// Purpose: Provide hierarchy queries and validity checks for assertions.
// Dependencies: crate::proto, prost, serde, thiserror
// ============================================================================

//! ## Overview
//! [`WindowManagerState`] is the owned, query-friendly form of one dump:
//! displays with their task trees plus the global z-ordered window list.
//! Decoding is size-limited and fails closed on malformed input. A snapshot
//! taken mid-transition is detectable through [`WindowManagerState::is_valid`]
//! (no focused window/app, no display, or a frozen display); the retry module
//! re-reads such snapshots.

// ============================================================================
// SECTION: Imports
// ============================================================================

use prost::Message;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::proto::ActivityRecordProto;
use crate::proto::DisplayContentProto;
use crate::proto::RectProto;
use crate::proto::TaskProto;
use crate::proto::WindowManagerServiceDumpProto;
use crate::proto::WindowStateProto;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Display id of the default (built-in) display.
pub const DEFAULT_DISPLAY_ID: i32 = 0;

// ============================================================================
// SECTION: Geometry
// ============================================================================

/// Rectangle in display coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl Rect {
    /// Returns the rectangle width (zero when inverted).
    #[must_use]
    pub const fn width(&self) -> i32 {
        let width = self.right.saturating_sub(self.left);
        if width < 0 { 0 } else { width }
    }

    /// Returns the rectangle height (zero when inverted).
    #[must_use]
    pub const fn height(&self) -> i32 {
        let height = self.bottom.saturating_sub(self.top);
        if height < 0 { 0 } else { height }
    }

    /// Returns whether the rectangle covers no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl From<&RectProto> for Rect {
    fn from(proto: &RectProto) -> Self {
        Self { left: proto.left, top: proto.top, right: proto.right, bottom: proto.bottom }
    }
}

// ============================================================================
// SECTION: Activity Types
// ============================================================================

/// Activity type attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// No declared type.
    Undefined,
    /// Ordinary application task.
    Standard,
    /// Launcher/home task.
    Home,
    /// Recents/overview task.
    Recents,
    /// Assistant task.
    Assistant,
    /// Dream (screensaver) task.
    Dream,
}

impl ActivityType {
    /// Maps the raw dump constant onto a typed value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Standard,
            2 => Self::Home,
            3 => Self::Recents,
            4 => Self::Assistant,
            5 => Self::Dream,
            _ => Self::Undefined,
        }
    }
}

// ============================================================================
// SECTION: Hierarchy Model
// ============================================================================

/// One activity inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityState {
    /// Component name of the activity.
    pub name: String,
    /// Whether the activity is visible.
    pub visible: bool,
    /// Whether the activity is at the front of its task.
    pub front_of_task: bool,
}

/// One task node; root tasks nest child tasks front-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    /// Task id.
    pub id: i32,
    /// Typed activity type.
    pub activity_type: ActivityType,
    /// Whether the task is visible.
    pub visible: bool,
    /// Task bounds, when reported.
    pub bounds: Option<Rect>,
    /// Nested child tasks, front first.
    pub tasks: Vec<TaskState>,
    /// Activities in the task, front first.
    pub activities: Vec<ActivityState>,
    /// Component name of the task's real activity, when reported.
    pub real_activity: Option<String>,
}

impl TaskState {
    /// Searches this task and its children for an activity by component name.
    #[must_use]
    pub fn find(&self, activity: &str) -> Option<&Self> {
        let named_here = self.real_activity.as_deref() == Some(activity)
            || self.activities.iter().any(|entry| entry.name == activity);
        if named_here {
            return Some(self);
        }
        self.tasks.iter().find_map(|task| task.find(activity))
    }

    /// Returns the number of task nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.tasks.iter().map(Self::node_count).sum::<usize>()
    }
}

/// One display with its root task tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Display id.
    pub id: i32,
    /// Display bounds, when reported.
    pub bounds: Option<Rect>,
    /// Display density in dpi.
    pub dpi: i32,
    /// Root tasks on the display, front first.
    pub root_tasks: Vec<TaskState>,
}

/// One window in the global z-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    /// Window title.
    pub title: String,
    /// Identity hash of the server-side object.
    pub hash_code: u32,
    /// Display the window belongs to.
    pub display_id: i32,
    /// Whether the surface is shown.
    pub shown: bool,
    /// Whether the window is visible by policy.
    pub visible: bool,
    /// Window frame, when reported.
    pub frame: Option<Rect>,
    /// Surface layer.
    pub layer: i32,
    /// Window type constant.
    pub window_type: i32,
}

impl WindowState {
    /// Returns whether the window is both shown and visible.
    #[must_use]
    pub const fn is_surface_visible(&self) -> bool {
        self.shown && self.visible
    }
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Owned snapshot of window-manager state decoded from one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowManagerState {
    /// Title of the focused window, absent mid-transition.
    pub focused_window: Option<String>,
    /// Component name of the focused application, absent mid-transition.
    pub focused_app: Option<String>,
    /// Title of the input-method window, when shown.
    pub input_method_window: Option<String>,
    /// Whether displays are frozen for a pending rotation.
    pub display_frozen: bool,
    /// Current rotation (0-3).
    pub rotation: i32,
    /// Last requested orientation constant.
    pub last_orientation: i32,
    /// Displays with their task trees.
    pub displays: Vec<DisplayState>,
    /// Windows in z-order, top first.
    pub windows: Vec<WindowState>,
}

impl WindowManagerState {
    /// Decodes a dump with a size limit.
    ///
    /// # Errors
    ///
    /// Returns [`WmError`] when the dump is oversized or fails to decode.
    pub fn decode(bytes: &[u8], max_bytes: usize) -> Result<Self, WmError> {
        if bytes.len() > max_bytes {
            return Err(WmError::TooLarge(bytes.len()));
        }
        let proto = WindowManagerServiceDumpProto::decode(bytes)
            .map_err(|err| WmError::Decode(err.to_string()))?;
        Ok(Self::from_proto(&proto))
    }

    /// Converts the wire form into the owned snapshot.
    fn from_proto(proto: &WindowManagerServiceDumpProto) -> Self {
        let (displays, windows) = proto.root.as_ref().map_or_else(
            || (Vec::new(), Vec::new()),
            |root| {
                (
                    root.displays.iter().map(convert_display).collect(),
                    root.windows.iter().map(convert_window).collect(),
                )
            },
        );

        Self {
            focused_window: proto.focused_window.as_ref().map(|id| id.title.clone()),
            focused_app: non_empty(&proto.focused_app),
            input_method_window: proto.input_method_window.as_ref().map(|id| id.title.clone()),
            display_frozen: proto.display_frozen,
            rotation: proto.rotation,
            last_orientation: proto.last_orientation,
            displays,
            windows,
        }
    }

    /// Returns whether the snapshot is complete enough for assertions.
    ///
    /// A transient dump (taken mid-transition) lacks a focused window or app,
    /// reports no display, or reports a frozen display.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.displays.is_empty()
            && self.focused_window.is_some()
            && self.focused_app.is_some()
            && !self.display_frozen
    }

    /// Returns the display with the given id.
    #[must_use]
    pub fn display(&self, display_id: i32) -> Option<&DisplayState> {
        self.displays.iter().find(|display| display.id == display_id)
    }

    /// Returns the default (built-in) display.
    #[must_use]
    pub fn default_display(&self) -> Option<&DisplayState> {
        self.display(DEFAULT_DISPLAY_ID)
    }

    /// Returns the title of the focused window.
    #[must_use]
    pub fn focused_window(&self) -> Option<&str> {
        self.focused_window.as_deref()
    }

    /// Returns the component name of the focused application.
    #[must_use]
    pub fn focused_app(&self) -> Option<&str> {
        self.focused_app.as_deref()
    }

    /// Returns the title of the input-method window.
    #[must_use]
    pub fn input_method_window(&self) -> Option<&str> {
        self.input_method_window.as_deref()
    }

    /// Returns the frontmost root task on the given display.
    #[must_use]
    pub fn front_task(&self, display_id: i32) -> Option<&TaskState> {
        self.display(display_id).and_then(|display| display.root_tasks.first())
    }

    /// Searches every display for a task hosting the given activity.
    #[must_use]
    pub fn find_task(&self, activity: &str) -> Option<&TaskState> {
        self.displays
            .iter()
            .flat_map(|display| &display.root_tasks)
            .find_map(|task| task.find(activity))
    }

    /// Returns the windows that are both shown and visible, in z-order.
    #[must_use]
    pub fn visible_windows(&self) -> Vec<&WindowState> {
        self.windows.iter().filter(|window| window.is_surface_visible()).collect()
    }

    /// Returns the topmost window with the given title.
    #[must_use]
    pub fn window_by_title(&self, title: &str) -> Option<&WindowState> {
        self.windows.iter().find(|window| window.title == title)
    }
}

// ============================================================================
// SECTION: Conversion Helpers
// ============================================================================

/// Converts a display proto into the owned form.
fn convert_display(proto: &DisplayContentProto) -> DisplayState {
    DisplayState {
        id: proto.id,
        bounds: proto.bounds.as_ref().map(Rect::from),
        dpi: proto.dpi,
        root_tasks: proto.root_tasks.iter().map(convert_task).collect(),
    }
}

/// Converts a task proto subtree into the owned form.
fn convert_task(proto: &TaskProto) -> TaskState {
    TaskState {
        id: proto.id,
        activity_type: ActivityType::from_raw(proto.activity_type),
        visible: proto.visible,
        bounds: proto.bounds.as_ref().map(Rect::from),
        tasks: proto.tasks.iter().map(convert_task).collect(),
        activities: proto.activities.iter().map(convert_activity).collect(),
        real_activity: non_empty(&proto.real_activity),
    }
}

/// Converts an activity proto into the owned form.
fn convert_activity(proto: &ActivityRecordProto) -> ActivityState {
    ActivityState {
        name: proto.name.clone(),
        visible: proto.visible,
        front_of_task: proto.front_of_task,
    }
}

/// Converts a window proto into the owned form.
fn convert_window(proto: &WindowStateProto) -> WindowState {
    let (title, hash_code) = proto
        .identifier
        .as_ref()
        .map_or_else(|| (String::new(), 0), |id| (id.title.clone(), id.hash_code));
    WindowState {
        title,
        hash_code,
        display_id: proto.display_id,
        shown: proto.shown,
        visible: proto.visible,
        frame: proto.frame.as_ref().map(Rect::from),
        layer: proto.layer,
        window_type: proto.window_type,
    }
}

/// Maps empty strings onto `None`.
fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors produced while decoding or fetching dumps.
#[derive(Debug, Error)]
pub enum WmError {
    /// Protobuf decoding failure.
    #[error("dump decode error: {0}")]
    Decode(String),
    /// Dump exceeded the configured size limit.
    #[error("dump exceeds size limit ({0} bytes)")]
    TooLarge(usize),
    /// I/O failure while fetching a dump.
    #[error("dump io error: {0}")]
    Io(String),
    /// Invalid dump request.
    #[error("invalid dump request: {0}")]
    Invalid(String),
}
