// SPDX-License-Identifier: GPL-3.0-only

//! Preview header mirroring the focused field.
//!
//! The panel may cover the field it types into, so its header repeats the
//! field's text with the caret and selection marked. The preview is derived
//! state: every refresh recomputes it from the live field value, and the
//! revision counter only moves when the computed content actually changed.

use crate::app_settings;
use crate::editor::text;
use crate::page::{FieldId, Page, Selection, safe_selection, supports_selection};
use std::fmt;

/// What the header currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewContent {
    /// No field is focused
    Title(String),
    /// Password fields never reveal their content
    Masked,
    /// A window of the field's text
    Text {
        before: String,
        selected: String,
        after: String,
        /// Caret offset within the shown text (after the leading ellipsis)
        caret: usize,
        truncated_start: bool,
        truncated_end: bool,
    },
}

impl PreviewContent {
    /// Computes the window shown for `value` with the given selection.
    ///
    /// Text longer than `max_len` is cut to a window around the caret (the
    /// selection end), with each cut side marked.
    #[must_use]
    pub fn for_text(value: &str, selection: Selection, max_len: usize) -> Self {
        let len = text::char_len(value);
        let selection = selection.clamp(len);
        let caret = selection.end;

        let (start, end) = if len > max_len {
            let start = caret.saturating_sub(max_len / 2).min(len - max_len);
            (start, start + max_len)
        } else {
            (0, len)
        };

        let sel_start = selection.start.clamp(start, end);
        let sel_end = selection.end.clamp(start, end);

        PreviewContent::Text {
            before: text::slice(value, start, sel_start).to_string(),
            selected: text::slice(value, sel_start, sel_end).to_string(),
            after: text::slice(value, sel_end, end).to_string(),
            caret: sel_end - start,
            truncated_start: start > 0,
            truncated_end: end < len,
        }
    }
}

impl fmt::Display for PreviewContent {
    /// Plain-text rendering: `|` marks a caret, `[...]` a selection.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewContent::Title(title) => f.write_str(title),
            PreviewContent::Masked => f.write_str(app_settings::PASSWORD_MASK),
            PreviewContent::Text {
                before,
                selected,
                after,
                truncated_start,
                truncated_end,
                ..
            } => {
                if *truncated_start {
                    f.write_str(app_settings::PREVIEW_ELLIPSIS)?;
                }
                if selected.is_empty() {
                    write!(f, "{before}|{after}")?;
                } else {
                    write!(f, "{before}[{selected}]{after}")?;
                }
                if *truncated_end {
                    f.write_str(app_settings::PREVIEW_ELLIPSIS)?;
                }
                Ok(())
            }
        }
    }
}

/// Header state with change detection.
#[derive(Debug, Clone)]
pub struct PreviewPanel {
    max_len: usize,
    content: PreviewContent,
    revision: u64,
}

impl PreviewPanel {
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            content: PreviewContent::Title(crate::fl!("default-title")),
            revision: 0,
        }
    }

    #[must_use]
    pub fn content(&self) -> &PreviewContent {
        &self.content
    }

    /// Number of visible changes so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Recomputes the preview from the live field.
    ///
    /// # Returns
    ///
    /// `true` if the shown content changed.
    pub fn refresh<P: Page + ?Sized>(&mut self, page: &P, field: Option<FieldId>) -> bool {
        let content = match field {
            None => PreviewContent::Title(crate::fl!("default-title")),
            Some(field) => match page.kind(field) {
                None => {
                    tracing::warn!("Preview skipped, {field} is gone");
                    return false;
                }
                Some(kind) if kind.is_password() => PreviewContent::Masked,
                Some(_) => {
                    let value = match page.value(field) {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::warn!("Preview skipped: {e}");
                            return false;
                        }
                    };
                    let selection = if supports_selection(page, field) {
                        safe_selection(page, field)
                    } else {
                        Selection::caret(text::char_len(&value))
                    };
                    PreviewContent::for_text(&value, selection, self.max_len)
                }
            },
        };
        self.set(content)
    }

    /// Returns to the default title.
    pub fn reset(&mut self) -> bool {
        self.set(PreviewContent::Title(crate::fl!("default-title")))
    }

    fn set(&mut self, content: PreviewContent) -> bool {
        if content == self.content {
            return false;
        }
        self.content = content;
        self.revision += 1;
        true
    }
}
