// SPDX-License-Identifier: GPL-3.0-only

//! In-memory page used by the demo host and the tests.
//!
//! Fields and forms are registered through small builders. The page records
//! everything the engine does to it (dispatched input events, alerts, form
//! submissions) so callers can assert on it.

use super::{
    EditCommand, FieldError, FieldId, FieldKind, FormId, Page, Rect, Selection, Size, Viewport,
};
use std::collections::{BTreeMap, HashMap};

/// How the page answers native editing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeCommands {
    /// Every command reports failure
    #[default]
    Declined,
    /// Copy, cut and paste work against an internal clipboard; undo and redo decline
    Supported,
    /// Every command throws
    Throws,
}

/// A field registered on a [`MemoryPage`].
#[derive(Debug, Clone)]
pub struct MemoryField {
    element_id: Option<String>,
    kind: FieldKind,
    value: String,
    selection: Selection,
    rect: Option<Rect>,
    form: Option<FormId>,
    visible: bool,
    selection_throws: bool,
}

impl MemoryField {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            element_id: None,
            kind,
            value: String::new(),
            selection: Selection::default(),
            rect: None,
            form: None,
            visible: kind != FieldKind::Hidden,
            selection_throws: false,
        }
    }

    /// Sets the `id` attribute.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Sets the initial value with the caret at the end.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.selection = Selection::caret(self.value.chars().count());
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn in_form(mut self, form: FormId) -> Self {
        self.form = Some(form);
        self
    }

    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Makes every selection access throw, as some browsers do for email inputs.
    pub fn selection_throws(mut self) -> Self {
        self.selection_throws = true;
        self
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn selected_text(&self) -> String {
        self.value
            .chars()
            .skip(self.selection.start)
            .take(self.selection.end - self.selection.start)
            .collect()
    }

    fn replace_selection(&mut self, text: &str) {
        let before: String = self.value.chars().take(self.selection.start).collect();
        let after: String = self.value.chars().skip(self.selection.end).collect();
        let caret = self.selection.start + text.chars().count();
        self.value = format!("{before}{text}{after}");
        self.selection = Selection::caret(caret);
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryForm {
    has_submit: bool,
}

/// A page held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    fields: BTreeMap<FieldId, MemoryField>,
    forms: BTreeMap<FormId, MemoryForm>,
    next_id: u64,
    focused: Option<FieldId>,
    viewport: Viewport,
    panel_size: Option<Size>,
    native: NativeCommands,
    native_clipboard: String,
    input_events: HashMap<FieldId, usize>,
    alerts: Vec<String>,
    submissions: Vec<FormId>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// Creates an empty 1280×800 page with a measurable 900×320 panel.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            forms: BTreeMap::new(),
            next_id: 1,
            focused: None,
            viewport: Viewport {
                width: 1280.0,
                height: 800.0,
            },
            panel_size: Some(Size {
                width: 900.0,
                height: 320.0,
            }),
            native: NativeCommands::default(),
            native_clipboard: String::new(),
            input_events: HashMap::new(),
            alerts: Vec::new(),
            submissions: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: MemoryField) -> FieldId {
        let id = FieldId(self.next_id);
        self.next_id += 1;
        self.fields.insert(id, field);
        id
    }

    pub fn add_form(&mut self, has_submit: bool) -> FormId {
        let id = FormId(self.next_id);
        self.next_id += 1;
        self.forms.insert(id, MemoryForm { has_submit });
        id
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_panel_size(&mut self, size: Option<Size>) {
        self.panel_size = size;
    }

    pub fn set_native_commands(&mut self, native: NativeCommands) {
        self.native = native;
    }

    /// Looks a field up by its `id` attribute.
    pub fn field_by_element_id(&self, element_id: &str) -> Option<FieldId> {
        self.fields
            .iter()
            .find(|(_, f)| f.element_id.as_deref() == Some(element_id))
            .map(|(id, _)| *id)
    }

    pub fn focused(&self) -> Option<FieldId> {
        self.focused
    }

    /// Number of `input` events dispatched on a field.
    pub fn input_count(&self, field: FieldId) -> usize {
        self.input_events.get(&field).copied().unwrap_or(0)
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn submissions(&self) -> &[FormId] {
        &self.submissions
    }

    /// Simulates the user typing on a physical keyboard at the caret.
    ///
    /// The caller still delivers the resulting native input event.
    pub fn type_natively(&mut self, field: FieldId, text: &str) -> Result<(), FieldError> {
        let f = self.field_mut(field)?;
        f.replace_selection(text);
        Ok(())
    }

    fn field(&self, field: FieldId) -> Result<&MemoryField, FieldError> {
        self.fields.get(&field).ok_or(FieldError::UnknownField(field))
    }

    fn field_mut(&mut self, field: FieldId) -> Result<&mut MemoryField, FieldError> {
        self.fields
            .get_mut(&field)
            .ok_or(FieldError::UnknownField(field))
    }
}

impl Page for MemoryPage {
    fn element_id(&self, field: FieldId) -> Option<String> {
        self.fields
            .get(&field)
            .and_then(|f| f.element_id.clone())
            .filter(|id| !id.is_empty())
    }

    fn kind(&self, field: FieldId) -> Option<FieldKind> {
        self.fields.get(&field).map(|f| f.kind)
    }

    fn value(&self, field: FieldId) -> Result<String, FieldError> {
        Ok(self.field(field)?.value.clone())
    }

    fn set_value(&mut self, field: FieldId, value: &str) -> Result<(), FieldError> {
        let f = self.field_mut(field)?;
        f.value = value.to_string();
        f.selection = Selection::caret(f.char_len());
        Ok(())
    }

    fn selection(&self, field: FieldId) -> Result<Selection, FieldError> {
        let f = self.field(field)?;
        if f.selection_throws || f.kind.lacks_selection_api() {
            return Err(FieldError::SelectionUnsupported(field));
        }
        Ok(f.selection)
    }

    fn set_selection(&mut self, field: FieldId, selection: Selection) -> Result<(), FieldError> {
        let f = self.field_mut(field)?;
        if f.selection_throws || f.kind.lacks_selection_api() {
            return Err(FieldError::SelectionUnsupported(field));
        }
        f.selection = selection.clamp(f.char_len());
        Ok(())
    }

    fn dispatch_input(&mut self, field: FieldId) {
        *self.input_events.entry(field).or_insert(0) += 1;
    }

    fn focus(&mut self, field: FieldId) {
        if self.fields.contains_key(&field) {
            self.focused = Some(field);
        }
    }

    fn bounding_rect(&self, field: FieldId) -> Option<Rect> {
        self.fields.get(&field).and_then(|f| f.rect)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn panel_size(&self) -> Option<Size> {
        self.panel_size
    }

    fn form_of(&self, field: FieldId) -> Option<FormId> {
        self.fields.get(&field).and_then(|f| f.form)
    }

    fn focusable_in_form(&self, form: FormId) -> Vec<FieldId> {
        self.fields
            .iter()
            .filter(|(_, f)| f.form == Some(form) && f.visible)
            .map(|(id, _)| *id)
            .collect()
    }

    fn has_submit_control(&self, form: FormId) -> bool {
        self.forms.get(&form).is_some_and(|f| f.has_submit)
    }

    fn submit(&mut self, form: FormId) {
        self.submissions.push(form);
    }

    fn exec_command(&mut self, field: FieldId, command: EditCommand) -> Result<bool, FieldError> {
        match self.native {
            NativeCommands::Declined => return Ok(false),
            NativeCommands::Throws => return Err(FieldError::CommandFailed(command)),
            NativeCommands::Supported => {}
        }

        let clipboard = self.native_clipboard.clone();
        let f = self.field_mut(field)?;
        let done = match command {
            EditCommand::Copy => {
                let text = f.selected_text();
                self.native_clipboard = text;
                true
            }
            EditCommand::Cut => {
                let text = f.selected_text();
                f.replace_selection("");
                self.native_clipboard = text;
                true
            }
            EditCommand::Paste => {
                f.replace_selection(&clipboard);
                true
            }
            EditCommand::Undo | EditCommand::Redo => false,
        };
        Ok(done)
    }

    fn alert(&mut self, message: &str) {
        tracing::info!("alert: {message}");
        self.alerts.push(message.to_string());
    }
}
