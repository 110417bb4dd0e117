// SPDX-License-Identifier: GPL-3.0-only

//! Applies virtual key presses to the focused field.
//!
//! The editor mutates the field through the [`Page`] trait and reports what
//! happened as an [`EditOutcome`]. It never touches the clipboard or timers
//! itself: asynchronous follow-ups (clipboard writes, paste reads) are left to
//! the caller, which turns outcomes into effects.
//!
//! # Key handling
//!
//! | Token          | Behavior                                                     |
//! |----------------|--------------------------------------------------------------|
//! | character      | Resolve via AltGr > Shift > Caps, splice over the selection  |
//! | Control + char | `a c v x z y` combos, any other character is typed literally |
//! | `Sil`          | Delete the selection or the character before the caret       |
//! | arrows         | Move the caret, or extend the selection while Shift is primed|
//! | `Tab`          | Next/previous form element, else four spaces                 |
//! | `Enter`        | Submit the form, else a newline in multi-line fields         |
//! | `HepsiniSec`   | Select all                                                   |
//! | `Kapat`        | Close the keyboard                                           |

pub mod text;

use crate::app_settings;
use crate::history::HistoryStore;
use crate::input::{CharacterMap, Direction, KeyToken, Modifier, ModifierState};
use crate::page::{
    EditCommand, FieldError, FieldId, FormId, Page, Selection, safe_selection, supports_selection,
};

/// What a key press did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The field's text changed and an `input` event was dispatched
    Edited,
    /// Only the caret or selection changed
    CaretMoved,
    /// A modifier flipped to the given value
    ModifierToggled(Modifier, bool),
    /// Focus moved to another element of the form
    FocusMoved(FieldId),
    Submitted(FormId),
    /// The keyboard should close
    Close,
    /// Selection copied; `Some` carries text the async clipboard must receive
    Copied(Option<String>),
    /// Selection cut; `Some` carries text the async clipboard must receive
    Cut(Option<String>),
    /// The native paste failed; the clipboard must be read asynchronously
    PasteRequested,
    /// Nothing changed
    Nothing,
}

impl EditOutcome {
    /// Returns `true` if the field's text may have changed.
    #[must_use]
    pub fn changed_text(&self) -> bool {
        matches!(self, EditOutcome::Edited | EditOutcome::Cut(_))
    }
}

/// Direction of a Shift+arrow selection relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectDirection {
    Forward,
    Backward,
}

/// An in-progress Shift+arrow selection gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSelect {
    /// Fixed end, recorded when the gesture started
    pub anchor: usize,
    /// Moving end
    pub focus: usize,
}

impl ShiftSelect {
    #[must_use]
    pub fn direction(&self) -> SelectDirection {
        if self.focus < self.anchor {
            SelectDirection::Backward
        } else {
            SelectDirection::Forward
        }
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::new(self.anchor, self.focus)
    }
}

/// Turns key tokens into field edits.
#[derive(Debug, Clone, Default)]
pub struct FieldEditor {
    charmap: CharacterMap,
    shift_select: Option<ShiftSelect>,
}

impl FieldEditor {
    #[must_use]
    pub fn new(charmap: CharacterMap) -> Self {
        Self {
            charmap,
            shift_select: None,
        }
    }

    #[must_use]
    pub fn charmap(&self) -> &CharacterMap {
        &self.charmap
    }

    #[must_use]
    pub fn shift_select(&self) -> Option<ShiftSelect> {
        self.shift_select
    }

    /// Forgets the Shift+arrow anchor without touching the field.
    pub fn clear_shift_select(&mut self) {
        self.shift_select = None;
    }

    /// Applies one key press to `field`.
    ///
    /// Failures are logged and reported as [`EditOutcome::Nothing`] so the
    /// rest of the key's processing can continue.
    ///
    /// # Arguments
    ///
    /// * `page` - The page holding the field
    /// * `field` - The focused field
    /// * `token` - The key that was pressed
    /// * `modifiers` - Modifier state; one-shot modifiers are consumed here
    /// * `history` - Undo history used when the native undo declines
    pub fn apply<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        field: FieldId,
        token: &KeyToken,
        modifiers: &mut ModifierState,
        history: &mut HistoryStore,
    ) -> EditOutcome {
        let result = match token {
            KeyToken::Modifier(modifier) => Ok(self.toggle_modifier(page, field, *modifier, modifiers)),
            KeyToken::Arrow(direction) => self.arrow(page, field, *direction, modifiers),
            KeyToken::Close => Ok(EditOutcome::Close),
            other => {
                self.shift_select = None;
                match other {
                    KeyToken::Char(c) if modifiers.control() => {
                        self.control_combo(page, field, *c, modifiers, history)
                    }
                    KeyToken::Char(c) => {
                        let resolved = self.charmap.resolve(*c, modifiers);
                        self.insert(page, field, &resolved.to_string()).map(|outcome| {
                            modifiers.consume_one_shot();
                            outcome
                        })
                    }
                    KeyToken::Space => self.insert(page, field, " "),
                    KeyToken::Backspace => self.backspace(page, field),
                    KeyToken::Tab => self.tab(page, field, modifiers),
                    KeyToken::Enter => self.enter(page, field),
                    KeyToken::SelectAll => self.select_all(page, field),
                    KeyToken::Modifier(_) | KeyToken::Arrow(_) | KeyToken::Close => {
                        Ok(EditOutcome::Nothing)
                    }
                }
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!("Key {token} on {field} failed: {e}");
            EditOutcome::Nothing
        })
    }

    /// Splices asynchronously read clipboard text at the live selection.
    ///
    /// # Returns
    ///
    /// `Ok(false)` for empty clipboard text, which changes nothing.
    pub fn complete_paste<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        field: FieldId,
        clipboard_text: &str,
    ) -> Result<bool, FieldError> {
        if clipboard_text.is_empty() {
            return Ok(false);
        }
        self.shift_select = None;
        self.insert(page, field, clipboard_text)?;
        Ok(true)
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    fn toggle_modifier<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        field: FieldId,
        modifier: Modifier,
        modifiers: &mut ModifierState,
    ) -> EditOutcome {
        let active = modifiers.toggle(modifier);

        if !modifiers.shift() {
            if let Some(gesture) = self.shift_select.take() {
                if let Err(e) = page.set_selection(field, Selection::caret(gesture.anchor)) {
                    tracing::debug!("Cannot collapse selection to anchor: {e}");
                }
            }
        }

        tracing::debug!("{modifier} -> {active}");
        EditOutcome::ModifierToggled(modifier, active)
    }

    // ========================================================================
    // Text mutation
    // ========================================================================

    /// Inserts text over the selection, or at the end when the field has no
    /// selection API, then dispatches `input`.
    fn insert<P: Page + ?Sized>(
        &self,
        page: &mut P,
        field: FieldId,
        insert: &str,
    ) -> Result<EditOutcome, FieldError> {
        let value = page.value(field)?;

        if supports_selection(page, field) {
            let selection = safe_selection(page, field);
            let (new_value, caret) = text::splice(&value, selection, insert);
            page.set_value(field, &new_value)?;
            page.set_selection(field, Selection::caret(caret))?;
        } else {
            page.set_value(field, &format!("{value}{insert}"))?;
        }

        page.dispatch_input(field);
        Ok(EditOutcome::Edited)
    }

    fn backspace<P: Page + ?Sized>(
        &self,
        page: &mut P,
        field: FieldId,
    ) -> Result<EditOutcome, FieldError> {
        let value = page.value(field)?;

        if !supports_selection(page, field) {
            let mut chars = value.chars();
            if chars.next_back().is_none() {
                return Ok(EditOutcome::Nothing);
            }
            page.set_value(field, chars.as_str())?;
            page.dispatch_input(field);
            return Ok(EditOutcome::Edited);
        }

        let selection = safe_selection(page, field);
        let range = if selection.is_collapsed() {
            if selection.start == 0 {
                return Ok(EditOutcome::Nothing);
            }
            Selection::new(selection.start - 1, selection.start)
        } else {
            selection
        };

        let (new_value, caret) = text::splice(&value, range, "");
        page.set_value(field, &new_value)?;
        page.set_selection(field, Selection::caret(caret))?;
        page.dispatch_input(field);
        Ok(EditOutcome::Edited)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    fn arrow<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        field: FieldId,
        direction: Direction,
        modifiers: &ModifierState,
    ) -> Result<EditOutcome, FieldError> {
        if !supports_selection(page, field) {
            return Ok(EditOutcome::Nothing);
        }

        let value = page.value(field)?;
        let len = text::char_len(&value);
        let selection = safe_selection(page, field);

        if modifiers.shift() {
            let mut gesture = self.shift_select.unwrap_or(match direction {
                Direction::Left | Direction::Up => ShiftSelect {
                    anchor: selection.end,
                    focus: selection.start,
                },
                Direction::Right | Direction::Down => ShiftSelect {
                    anchor: selection.start,
                    focus: selection.end,
                },
            });
            gesture.focus = move_caret(&value, gesture.focus, direction).min(len);
            page.set_selection(field, gesture.selection())?;
            self.shift_select = Some(gesture);
            return Ok(EditOutcome::CaretMoved);
        }

        self.shift_select = None;
        let caret = match direction {
            Direction::Left if !selection.is_collapsed() => selection.start,
            Direction::Right if !selection.is_collapsed() => selection.end,
            Direction::Left | Direction::Up => move_caret(&value, selection.start, direction),
            Direction::Right | Direction::Down => move_caret(&value, selection.end, direction),
        };
        page.set_selection(field, Selection::caret(caret.min(len)))?;
        Ok(EditOutcome::CaretMoved)
    }

    fn tab<P: Page + ?Sized>(
        &mut self,
        page: &mut P,
        field: FieldId,
        modifiers: &mut ModifierState,
    ) -> Result<EditOutcome, FieldError> {
        let backwards = modifiers.shift();

        let targets = page
            .form_of(field)
            .map(|form| page.focusable_in_form(form))
            .unwrap_or_default();

        if targets.iter().any(|&t| t != field) {
            let count = targets.len();
            let next = match targets.iter().position(|&t| t == field) {
                Some(i) if backwards => targets[(i + count - 1) % count],
                Some(i) => targets[(i + 1) % count],
                None if backwards => targets[count - 1],
                None => targets[0],
            };

            if backwards {
                modifiers.toggle_shift();
            }

            page.focus(next);
            if supports_selection(page, next) {
                let len = text::char_len(&page.value(next)?);
                page.set_selection(next, Selection::new(0, len))?;
            }
            tracing::debug!("Tab moved focus {field} -> {next}");
            return Ok(EditOutcome::FocusMoved(next));
        }

        self.insert(page, field, app_settings::TAB_INSERT)
    }

    fn enter<P: Page + ?Sized>(
        &self,
        page: &mut P,
        field: FieldId,
    ) -> Result<EditOutcome, FieldError> {
        if let Some(form) = page.form_of(field) {
            if page.has_submit_control(form) {
                page.submit(form);
                return Ok(EditOutcome::Submitted(form));
            }
        }

        if page.kind(field).is_some_and(|k| k.is_multiline()) {
            return self.insert(page, field, "\n");
        }

        Ok(EditOutcome::Nothing)
    }

    fn select_all<P: Page + ?Sized>(
        &self,
        page: &mut P,
        field: FieldId,
    ) -> Result<EditOutcome, FieldError> {
        if !supports_selection(page, field) {
            return Ok(EditOutcome::Nothing);
        }
        let len = text::char_len(&page.value(field)?);
        page.set_selection(field, Selection::new(0, len))?;
        Ok(EditOutcome::CaretMoved)
    }

    // ========================================================================
    // Control combos
    // ========================================================================

    fn control_combo<P: Page + ?Sized>(
        &self,
        page: &mut P,
        field: FieldId,
        key: char,
        modifiers: &mut ModifierState,
        history: &mut HistoryStore,
    ) -> Result<EditOutcome, FieldError> {
        modifiers.consume_one_shot();

        match key {
            'a' => self.select_all(page, field),
            'c' => self.copy(page, field),
            'x' => self.cut(page, field),
            'v' => self.paste(page, field),
            'z' => Ok(self.history_step(page, field, EditCommand::Undo, history)),
            'y' => Ok(self.history_step(page, field, EditCommand::Redo, history)),
            other => self.insert(page, field, &other.to_string()),
        }
    }

    /// Runs a native command, treating a thrown error as a decline.
    fn native<P: Page + ?Sized>(page: &mut P, field: FieldId, command: EditCommand) -> bool {
        match page.exec_command(field, command) {
            Ok(done) => done,
            Err(e) => {
                tracing::debug!("Native {command} threw: {e}");
                false
            }
        }
    }

    fn selected_text<P: Page + ?Sized>(page: &P, field: FieldId) -> Result<String, FieldError> {
        let value = page.value(field)?;
        let selection = safe_selection(page, field);
        Ok(text::slice(&value, selection.start, selection.end).to_string())
    }

    fn copy<P: Page + ?Sized>(&self, page: &mut P, field: FieldId) -> Result<EditOutcome, FieldError> {
        if !supports_selection(page, field) {
            return Ok(EditOutcome::Nothing);
        }
        if Self::native(page, field, EditCommand::Copy) {
            return Ok(EditOutcome::Copied(None));
        }
        Ok(EditOutcome::Copied(Some(Self::selected_text(page, field)?)))
    }

    fn cut<P: Page + ?Sized>(&self, page: &mut P, field: FieldId) -> Result<EditOutcome, FieldError> {
        if !supports_selection(page, field) {
            return Ok(EditOutcome::Nothing);
        }
        if Self::native(page, field, EditCommand::Cut) {
            return Ok(EditOutcome::Cut(None));
        }

        let cut = Self::selected_text(page, field)?;
        let value = page.value(field)?;
        let (new_value, caret) = text::splice(&value, safe_selection(page, field), "");
        page.set_value(field, &new_value)?;
        page.set_selection(field, Selection::caret(caret))?;
        page.dispatch_input(field);
        Ok(EditOutcome::Cut(Some(cut)))
    }

    fn paste<P: Page + ?Sized>(&self, page: &mut P, field: FieldId) -> Result<EditOutcome, FieldError> {
        if !supports_selection(page, field) {
            return Ok(EditOutcome::Nothing);
        }
        if Self::native(page, field, EditCommand::Paste) {
            return Ok(EditOutcome::Edited);
        }
        Ok(EditOutcome::PasteRequested)
    }

    /// Undo or redo: native command first, manual history as the fallback.
    fn history_step<P: Page + ?Sized>(
        &self,
        page: &mut P,
        field: FieldId,
        command: EditCommand,
        history: &mut HistoryStore,
    ) -> EditOutcome {
        if Self::native(page, field, command) {
            return EditOutcome::Edited;
        }

        let stepped = match command {
            EditCommand::Redo => history.redo(page, field),
            _ => history.undo(page, field),
        };
        if stepped {
            page.dispatch_input(field);
            EditOutcome::Edited
        } else {
            tracing::debug!("No {command} step left for {field}");
            EditOutcome::Nothing
        }
    }
}

/// Moves a caret one step without selection semantics.
fn move_caret(value: &str, caret: usize, direction: Direction) -> usize {
    match direction {
        Direction::Left => caret.saturating_sub(1),
        Direction::Right => (caret + 1).min(text::char_len(value)),
        Direction::Up => text::line_up(value, caret),
        Direction::Down => text::line_down(value, caret),
    }
}
