// SPDX-License-Identifier: GPL-3.0-only

//! Centralized application settings and constants.

/// Environment variable that overrides the preference file location.
pub const CONFIG_PATH_ENV: &str = "KLAVYE_CONFIG";

/// Directory name under the user config dir.
pub const CONFIG_DIR_NAME: &str = "klavye";

/// Preference file name.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Maximum number of undo snapshots kept per field.
pub const HISTORY_LIMIT: usize = 20;

/// Maximum number of characters shown in the preview header.
pub const PREVIEW_MAX_LENGTH: usize = 100;

/// Placeholder shown in the preview instead of password content.
pub const PASSWORD_MASK: &str = "********";

/// Marker placed on a truncated side of the preview.
pub const PREVIEW_ELLIPSIS: &str = "…";

/// Text inserted by the Tab key outside of forms.
pub const TAB_INSERT: &str = "    ";

/// Panel width used when the panel cannot be measured.
pub const DEFAULT_PANEL_WIDTH: f32 = 900.0;

/// Panel height used when the panel cannot be measured.
pub const DEFAULT_PANEL_HEIGHT: f32 = 320.0;

/// Base scale applied to the panel.
pub const PANEL_BASE_SCALE: f32 = 0.85;

/// Smallest scale the panel is shrunk to on tiny viewports.
pub const PANEL_MIN_SCALE: f32 = 0.4;

/// Share of the viewport width the panel may occupy.
pub const PANEL_VIEWPORT_FRACTION: f32 = 0.9;

/// Distance between the panel and the viewport edge it docks to.
pub const PANEL_EDGE_MARGIN: f32 = 20.0;

/// Identical key tokens closer than this are one logical press.
pub const DOUBLE_FIRE_WINDOW_MS: u64 = 150;

/// Delay before a held Backspace starts repeating.
pub const REPEAT_DELAY_MS: u64 = 400;

/// Interval between Backspace repeats while held.
pub const REPEAT_INTERVAL_MS: u64 = 70;

/// Clicks this soon after opening never close the panel.
pub const OUTSIDE_CLICK_GRACE_MS: u64 = 300;

/// Listener-driven preview refreshes are suppressed this long after an arrow key.
pub const DIRECT_CONTROL_MS: u64 = 500;

/// Quiet period before a native input event resyncs the preview.
pub const PREVIEW_DEBOUNCE_MS: u64 = 50;

/// Minimum spacing of selection-driven preview refreshes.
pub const SELECTION_THROTTLE_MS: u64 = 100;
