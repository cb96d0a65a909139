// crates/compat-harness-wm/tests/state_queries.rs
// ============================================================================
// Module: Window Manager State Tests
// Description: Decode and hierarchy query tests over encoded dumps.
// ============================================================================
//! ## Overview
//! Encodes dump fixtures with the wire model and asserts the owned snapshot:
//! focus fields, display/task/window queries, validity checks, and the
//! fail-closed size and decode paths.

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

use compat_harness_wm::ActivityType;
use compat_harness_wm::WindowManagerState;
use compat_harness_wm::WmError;
use compat_harness_wm::proto::ActivityRecordProto;
use compat_harness_wm::proto::DisplayContentProto;
use compat_harness_wm::proto::IdentifierProto;
use compat_harness_wm::proto::RectProto;
use compat_harness_wm::proto::RootWindowContainerProto;
use compat_harness_wm::proto::TaskProto;
use compat_harness_wm::proto::WindowManagerServiceDumpProto;
use compat_harness_wm::proto::WindowStateProto;
use prost::Message;

/// Default size limit for fixtures.
const MAX_BYTES: usize = 1024 * 1024;

/// Builds an identifier proto.
fn identifier(title: &str, hash_code: u32) -> IdentifierProto {
    IdentifierProto { hash_code, user_id: 0, title: title.to_string() }
}

/// Builds a window proto on display 0.
fn window(title: &str, shown: bool, visible: bool, layer: i32) -> WindowStateProto {
    WindowStateProto {
        identifier: Some(identifier(title, layer as u32)),
        display_id: 0,
        shown,
        visible,
        frame: Some(RectProto { left: 0, top: 0, right: 1080, bottom: 2400 }),
        layer,
        window_type: 1,
    }
}

/// Builds a complete dump fixture with nested tasks.
fn sample_dump() -> WindowManagerServiceDumpProto {
    let leaf_task = TaskProto {
        id: 11,
        activity_type: 1,
        visible: true,
        bounds: Some(RectProto { left: 0, top: 0, right: 540, bottom: 2400 }),
        tasks: Vec::new(),
        activities: vec![ActivityRecordProto {
            name: "com.example/.DetailActivity".to_string(),
            visible: true,
            front_of_task: true,
        }],
        real_activity: "com.example/.DetailActivity".to_string(),
    };
    let root_task = TaskProto {
        id: 10,
        activity_type: 1,
        visible: true,
        bounds: Some(RectProto { left: 0, top: 0, right: 1080, bottom: 2400 }),
        tasks: vec![leaf_task],
        activities: Vec::new(),
        real_activity: String::new(),
    };
    let home_task = TaskProto {
        id: 2,
        activity_type: 2,
        visible: false,
        bounds: None,
        tasks: Vec::new(),
        activities: vec![ActivityRecordProto {
            name: "com.android.launcher/.Launcher".to_string(),
            visible: false,
            front_of_task: true,
        }],
        real_activity: "com.android.launcher/.Launcher".to_string(),
    };
    let display = DisplayContentProto {
        id: 0,
        bounds: Some(RectProto { left: 0, top: 0, right: 1080, bottom: 2400 }),
        dpi: 420,
        root_tasks: vec![root_task, home_task],
    };

    WindowManagerServiceDumpProto {
        root: Some(RootWindowContainerProto {
            displays: vec![display],
            windows: vec![
                window("com.example/.DetailActivity", true, true, 3),
                window("InputMethod", true, false, 2),
                window("Wallpaper", true, true, 1),
            ],
        }),
        focused_window: Some(identifier("com.example/.DetailActivity", 3)),
        focused_app: "com.example/.DetailActivity".to_string(),
        input_method_window: Some(identifier("InputMethod", 2)),
        display_frozen: false,
        rotation: 0,
        last_orientation: 1,
    }
}

/// Decodes a fixture into a snapshot.
fn decode(proto: &WindowManagerServiceDumpProto) -> WindowManagerState {
    WindowManagerState::decode(&proto.encode_to_vec(), MAX_BYTES).expect("decode")
}

#[test]
fn decodes_focus_fields() {
    let state = decode(&sample_dump());
    assert_eq!(state.focused_window(), Some("com.example/.DetailActivity"));
    assert_eq!(state.focused_app(), Some("com.example/.DetailActivity"));
    assert_eq!(state.input_method_window(), Some("InputMethod"));
    assert_eq!(state.rotation, 0);
    assert!(state.is_valid());
}

#[test]
fn default_display_and_bounds_are_exposed() {
    let state = decode(&sample_dump());
    let display = state.default_display().expect("default display");
    assert_eq!(display.id, 0);
    assert_eq!(display.dpi, 420);
    let bounds = display.bounds.expect("bounds");
    assert_eq!(bounds.width(), 1080);
    assert_eq!(bounds.height(), 2400);
}

#[test]
fn front_task_is_the_first_root_task() {
    let state = decode(&sample_dump());
    let front = state.front_task(0).expect("front task");
    assert_eq!(front.id, 10);
    assert_eq!(front.activity_type, ActivityType::Standard);
    assert_eq!(front.node_count(), 2);
}

#[test]
fn find_task_searches_nested_tasks() {
    let state = decode(&sample_dump());
    let task = state.find_task("com.example/.DetailActivity").expect("nested task");
    assert_eq!(task.id, 11);
    let home = state.find_task("com.android.launcher/.Launcher").expect("home task");
    assert_eq!(home.id, 2);
    assert_eq!(home.activity_type, ActivityType::Home);
    assert!(state.find_task("com.missing/.Nowhere").is_none());
}

#[test]
fn visible_windows_preserve_z_order() {
    let state = decode(&sample_dump());
    let titles: Vec<&str> =
        state.visible_windows().iter().map(|window| window.title.as_str()).collect();
    assert_eq!(titles, vec!["com.example/.DetailActivity", "Wallpaper"]);
}

#[test]
fn window_by_title_returns_the_topmost_match() {
    let state = decode(&sample_dump());
    let window = state.window_by_title("Wallpaper").expect("window");
    assert_eq!(window.layer, 1);
    assert!(window.is_surface_visible());
    assert!(state.window_by_title("Nope").is_none());
}

#[test]
fn missing_focused_window_is_transient() {
    let mut dump = sample_dump();
    dump.focused_window = None;
    assert!(!decode(&dump).is_valid());
}

#[test]
fn empty_focused_app_is_transient() {
    let mut dump = sample_dump();
    dump.focused_app = String::new();
    let state = decode(&dump);
    assert_eq!(state.focused_app(), None);
    assert!(!state.is_valid());
}

#[test]
fn frozen_display_is_transient() {
    let mut dump = sample_dump();
    dump.display_frozen = true;
    assert!(!decode(&dump).is_valid());
}

#[test]
fn missing_root_yields_no_displays() {
    let mut dump = sample_dump();
    dump.root = None;
    let state = decode(&dump);
    assert!(state.displays.is_empty());
    assert!(state.windows.is_empty());
    assert!(!state.is_valid());
}

#[test]
fn oversized_dump_fails_closed() {
    let bytes = sample_dump().encode_to_vec();
    let err = WindowManagerState::decode(&bytes, bytes.len() - 1).expect_err("too large");
    assert!(matches!(err, WmError::TooLarge(_)));
}

#[test]
fn garbage_bytes_fail_closed() {
    let err = WindowManagerState::decode(&[0xff, 0xff, 0xff, 0xff], MAX_BYTES)
        .expect_err("garbage");
    assert!(matches!(err, WmError::Decode(_)));
}

#[test]
fn inverted_rect_has_zero_area() {
    let rect = compat_harness_wm::Rect { left: 100, top: 100, right: 0, bottom: 0 };
    assert_eq!(rect.width(), 0);
    assert_eq!(rect.height(), 0);
    assert!(rect.is_empty());
}
