// SPDX-License-Identifier: GPL-3.0-only

//! The page the keyboard is injected into.
//!
//! The engine never touches a document directly. Everything it needs from
//! the host page goes through the [`Page`] trait:
//!
//! - **Field access**: value, selection and kind of a form field
//! - **Events**: synthetic `input` dispatch and focus changes
//! - **Geometry**: field rectangles, the viewport and the measured panel size
//! - **Forms**: membership, focus order and submission
//! - **Native editing**: the browser's copy/cut/paste/undo/redo commands
//!
//! Selections are expressed in character (not byte) offsets.
//!
//! [`MemoryPage`] is a complete in-process implementation used by the demo
//! host and the tests.

pub mod clipboard;
pub mod memory;

pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard};
pub use memory::{MemoryField, MemoryPage, NativeCommands};

use std::fmt;

// ============================================================================
// Handles
// ============================================================================

/// Opaque handle to a field on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u64);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field#{}", self.0)
    }
}

/// Opaque handle to a form on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormId(pub u64);

// ============================================================================
// Field kinds
// ============================================================================

/// The kind of a field, derived from its tag and `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Search,
    Email,
    Password,
    Url,
    Tel,
    Textarea,
    Date,
    DateTime,
    DateTimeLocal,
    Month,
    Week,
    Time,
    Color,
    Range,
    File,
    Hidden,
    /// A `contenteditable` element
    Editable,
    /// Buttons, checkboxes, selects and other non-text controls
    Other,
}

impl FieldKind {
    /// Maps an `<input type>` attribute value to a kind.
    ///
    /// A missing or unrecognised type is a plain text input, as in HTML.
    #[must_use]
    pub fn from_type_attr(attr: Option<&str>) -> Self {
        let Some(attr) = attr else {
            return FieldKind::Text;
        };
        match attr.to_ascii_lowercase().as_str() {
            "text" | "" => FieldKind::Text,
            "search" => FieldKind::Search,
            "email" => FieldKind::Email,
            "password" => FieldKind::Password,
            "url" => FieldKind::Url,
            "tel" => FieldKind::Tel,
            "date" => FieldKind::Date,
            "datetime" => FieldKind::DateTime,
            "datetime-local" => FieldKind::DateTimeLocal,
            "month" => FieldKind::Month,
            "week" => FieldKind::Week,
            "time" => FieldKind::Time,
            "color" => FieldKind::Color,
            "range" => FieldKind::Range,
            "file" => FieldKind::File,
            "hidden" => FieldKind::Hidden,
            "checkbox" | "radio" | "button" | "submit" | "reset" | "image" | "number" => {
                FieldKind::Other
            }
            _ => FieldKind::Text,
        }
    }

    /// Returns `true` for fields the keyboard types into.
    #[must_use]
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Search
                | FieldKind::Email
                | FieldKind::Password
                | FieldKind::Url
                | FieldKind::Tel
                | FieldKind::Textarea
                | FieldKind::Editable
        )
    }

    /// Returns `true` for kinds that never expose a selection range.
    #[must_use]
    pub fn lacks_selection_api(self) -> bool {
        matches!(
            self,
            FieldKind::Date
                | FieldKind::DateTime
                | FieldKind::DateTimeLocal
                | FieldKind::Month
                | FieldKind::Week
                | FieldKind::Time
                | FieldKind::Color
                | FieldKind::Range
                | FieldKind::File
                | FieldKind::Hidden
                | FieldKind::Editable
                | FieldKind::Other
        )
    }

    #[must_use]
    pub fn is_multiline(self) -> bool {
        matches!(self, FieldKind::Textarea | FieldKind::Editable)
    }

    #[must_use]
    pub fn is_password(self) -> bool {
        matches!(self, FieldKind::Password)
    }
}

// ============================================================================
// Selection and geometry
// ============================================================================

/// A selection range in character offsets. A collapsed range is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Builds a selection, ordering the ends.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[must_use]
    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Clamps both ends to a text length.
    #[must_use]
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// A rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Visible area of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Measured size of the keyboard panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Native editing commands offered by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCommand {
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditCommand::Copy => "copy",
            EditCommand::Cut => "cut",
            EditCommand::Paste => "paste",
            EditCommand::Undo => "undo",
            EditCommand::Redo => "redo",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by field access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The handle no longer names a field on the page
    UnknownField(FieldId),
    /// The field does not expose a selection range
    SelectionUnsupported(FieldId),
    /// A native edit command threw
    CommandFailed(EditCommand),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::UnknownField(id) => write!(f, "unknown field {id}"),
            FieldError::SelectionUnsupported(id) => {
                write!(f, "{id} does not support selection")
            }
            FieldError::CommandFailed(cmd) => write!(f, "native {cmd} command failed"),
        }
    }
}

impl std::error::Error for FieldError {}

// ============================================================================
// Page trait
// ============================================================================

/// The document surface the engine consumes.
pub trait Page {
    /// The element's `id` attribute, if it has a non-empty one.
    fn element_id(&self, field: FieldId) -> Option<String>;

    fn kind(&self, field: FieldId) -> Option<FieldKind>;

    fn value(&self, field: FieldId) -> Result<String, FieldError>;

    /// Replaces the value. The page collapses the selection to the end.
    fn set_value(&mut self, field: FieldId, value: &str) -> Result<(), FieldError>;

    fn selection(&self, field: FieldId) -> Result<Selection, FieldError>;

    fn set_selection(&mut self, field: FieldId, selection: Selection) -> Result<(), FieldError>;

    /// Fires a bubbling `input` event on the field.
    fn dispatch_input(&mut self, field: FieldId);

    fn focus(&mut self, field: FieldId);

    fn bounding_rect(&self, field: FieldId) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// Size of the rendered panel, or `None` when it cannot be measured.
    fn panel_size(&self) -> Option<Size>;

    fn form_of(&self, field: FieldId) -> Option<FormId>;

    /// Focusable, visible elements of a form in document order.
    fn focusable_in_form(&self, form: FormId) -> Vec<FieldId>;

    fn has_submit_control(&self, form: FormId) -> bool;

    fn submit(&mut self, form: FormId);

    /// Runs a native editing command.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the page performed it, `Ok(false)` if it declined and
    /// `Err` if it threw.
    fn exec_command(&mut self, field: FieldId, command: EditCommand) -> Result<bool, FieldError>;

    /// Shows a blocking message to the user.
    fn alert(&mut self, message: &str);
}

/// Probes whether a field supports selection ranges.
///
/// Date, time, color, range, file and hidden inputs never do. Email inputs
/// are probed by reading the selection, since some browsers throw there.
pub fn supports_selection<P: Page + ?Sized>(page: &P, field: FieldId) -> bool {
    match page.kind(field) {
        None => false,
        Some(kind) if kind.lacks_selection_api() => false,
        Some(FieldKind::Email) => page.selection(field).is_ok(),
        Some(_) => true,
    }
}

/// Reads the selection, degrading to `{0, 0}` on failure.
pub fn safe_selection<P: Page + ?Sized>(page: &P, field: FieldId) -> Selection {
    match page.selection(field) {
        Ok(sel) => {
            let len = page.value(field).map(|v| v.chars().count()).unwrap_or(0);
            sel.clamp(len)
        }
        Err(e) => {
            tracing::debug!("Selection unavailable, using 0..0: {e}");
            Selection::default()
        }
    }
}
