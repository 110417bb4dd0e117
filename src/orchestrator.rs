// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard state machine.
//!
//! The [`Orchestrator`] owns every piece of engine state (modifiers, undo
//! history, key faces, the preview, panel placement) and reacts to page
//! events, timer ticks, clipboard completions and host messages. It never
//! awaits: anything asynchronous is returned as an [`Effect`] for the session
//! to carry out.
//!
//! # Panel lifecycle
//!
//! ```text
//!            focus on text field (enabled, showOnFocus) / showKeyboard
//!   Hidden ─────────────────────────────────────────────────────────▶ Visible
//!      ▲                                                                │
//!      └────────────────────────────────────────────────────────────────┘
//!        Kapat, outside click (autoHide), disableKeyboard,
//!        Tab onto a non-text control
//! ```
//!
//! Hiding resets the one-shot modifiers, drops the Shift+arrow anchor,
//! disarms the outside-click check, cancels timers and restores the preview
//! title. Caps survives.

use crate::config::Config;
use crate::editor::{EditOutcome, FieldEditor};
use crate::history::HistoryStore;
use crate::host::{HostMessage, HostResponse};
use crate::input::{CharacterMap, KeyGuard, KeyToken, Modifier, ModifierState};
use crate::layout::Layout;
use crate::page::{ClipboardError, FieldId, Page, Selection, safe_selection};
use crate::renderer::{KeyFace, KeyRenderer, Placement, Positioner, PreviewPanel};
use std::fmt;
use std::time::Instant;

// ============================================================================
// Events and effects
// ============================================================================

/// Where a document click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// Inside the keyboard panel
    Keyboard,
    /// On a text field
    Field(FieldId),
    /// On another form control (select, button, label)
    FormControl,
    /// Anywhere else
    Outside,
}

/// Events delivered by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// An element gained focus
    Focus(FieldId),
    /// An element lost focus
    Blur(FieldId),
    /// An `input` event fired on a field, native or synthetic
    Input(FieldId),
    /// The document selection changed inside a field
    SelectionChange(FieldId),
    /// A virtual key was activated (click or tap)
    KeyPress(KeyToken),
    /// A pointer went down on a virtual key
    KeyDown(KeyToken),
    /// The pointer was released
    KeyUp,
    /// A click anywhere in the document
    Click(ClickTarget),
    /// The user dragged the panel
    PanelMoved,
}

/// Ticks produced by the session's timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Debounced or throttled preview resync
    PreviewSync,
    /// Press-and-hold repeat of a key
    Repeat(KeyToken),
}

/// Work the session performs on behalf of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write text through the async clipboard, fire-and-forget
    WriteClipboard(String),
    /// Read the async clipboard and paste into the field
    ReadClipboard(FieldId),
    /// Start repeating a held key
    StartRepeat(KeyToken),
    StopRepeat,
    /// Resync the preview after the input debounce
    DebouncePreview,
    /// Resync the preview, throttled
    ThrottlePreview,
    /// Abort every pending timer
    CancelTimers,
    VisibilityChanged(bool),
    /// The enabled preference changed and must be persisted
    EnabledChanged(bool),
}

/// Panel visibility and geometry.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub visible: bool,
    pub placement: Option<Placement>,
    pub opened_at: Option<Instant>,
    /// Outside clicks may close the panel
    pub outside_click_armed: bool,
    /// The user moved the panel; automatic placement is frozen
    pub manually_positioned: bool,
}

/// Externally visible state after an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub visible: bool,
    pub enabled: bool,
    pub focused: Option<FieldId>,
    pub modifiers: Vec<Modifier>,
    pub preview: String,
    pub value: Option<String>,
    pub selection: Option<Selection>,
    pub placement: Option<Placement>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers: Vec<&str> = self.modifiers.iter().map(|m| m.as_str()).collect();
        write!(
            f,
            "[{}] {} mods={:?} preview=\"{}\"",
            if self.visible { "shown" } else { "hidden" },
            self.focused.map_or_else(|| "-".to_string(), |field| field.to_string()),
            modifiers,
            self.preview
        )?;
        if let (Some(value), Some(selection)) = (&self.value, self.selection) {
            write!(f, " value={:?} sel={}..{}", value, selection.start, selection.end)?;
        }
        Ok(())
    }
}

/// Everything the orchestrator is built from.
#[derive(Debug)]
pub struct Components<P> {
    pub page: P,
    pub config: Config,
    pub layout: Layout,
    pub charmap: CharacterMap,
}

impl<P: Page> Components<P> {
    /// Components with the built-in Turkish-Q layout and character map.
    #[must_use]
    pub fn new(page: P, config: Config) -> Self {
        Self {
            page,
            config,
            layout: Layout::turkish_q(),
            charmap: CharacterMap::turkish_q(),
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Coordinates modifiers, the field editor, history, key faces, the preview
/// and the panel.
#[derive(Debug)]
pub struct Orchestrator<P: Page> {
    page: P,
    config: Config,
    layout: Layout,
    modifiers: ModifierState,
    editor: FieldEditor,
    history: HistoryStore,
    keys: KeyRenderer,
    faces: Vec<Vec<KeyFace>>,
    preview: PreviewPanel,
    positioner: Positioner,
    guard: KeyGuard,
    panel: PanelState,
    /// Listener-driven preview refreshes are ignored until then
    direct_control_until: Option<Instant>,
    /// Key currently held down
    held: Option<KeyToken>,
    /// The held key produced at least one repeat
    repeated: bool,
    /// Click expected to close a hold gesture, and when the key was released
    swallow_press: Option<(KeyToken, Instant)>,
}

impl<P: Page> Orchestrator<P> {
    #[must_use]
    pub fn new(components: Components<P>) -> Self {
        let Components {
            page,
            config,
            layout,
            charmap,
        } = components;

        let keys = KeyRenderer::new(charmap.clone());
        let modifiers = ModifierState::new();
        let faces = keys.render(&layout, &modifiers);

        Self {
            page,
            history: HistoryStore::new(config.history_limit),
            preview: PreviewPanel::new(config.preview_max_length),
            guard: KeyGuard::new(config.timings.double_fire()),
            config,
            layout,
            modifiers,
            editor: FieldEditor::new(charmap),
            keys,
            faces,
            positioner: Positioner::new(),
            panel: PanelState::default(),
            direct_control_until: None,
            held: None,
            repeated: false,
            swallow_press: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn editor(&self) -> &FieldEditor {
        &self.editor
    }

    pub fn preview(&self) -> &PreviewPanel {
        &self.preview
    }

    /// Current key faces, row by row.
    pub fn faces(&self) -> &[Vec<KeyFace>] {
        &self.faces
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn is_visible(&self) -> bool {
        self.panel.visible
    }

    pub fn is_enabled(&self) -> bool {
        self.config.keyboard_enabled
    }

    pub fn focused(&self) -> Option<FieldId> {
        self.modifiers.focused()
    }

    /// Captures the state a host would display.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let focused = self.modifiers.focused();
        let masked = focused
            .and_then(|field| self.page.kind(field))
            .is_some_and(|kind| kind.is_password());
        let value = focused
            .filter(|_| !masked)
            .and_then(|field| self.page.value(field).ok());

        Snapshot {
            visible: self.panel.visible,
            enabled: self.config.keyboard_enabled,
            focused,
            modifiers: self.modifiers.get_active_modifiers(),
            preview: self.preview.content().to_string(),
            selection: value
                .as_ref()
                .and(focused)
                .map(|field| safe_selection(&self.page, field)),
            value,
            placement: self.panel.placement,
        }
    }

    // ------------------------------------------------------------------------
    // Page events
    // ------------------------------------------------------------------------

    /// Reacts to one page event.
    ///
    /// # Arguments
    ///
    /// * `event` - What happened on the page
    /// * `now` - When it happened
    ///
    /// # Returns
    ///
    /// Effects for the session to carry out, in order.
    pub fn handle_event(&mut self, event: PageEvent, now: Instant) -> Vec<Effect> {
        tracing::trace!("Page event {:?}", event);
        match event {
            PageEvent::Focus(field) => self.on_focus(field, now),
            PageEvent::Blur(field) => self.on_blur(field),
            PageEvent::Input(field) => {
                self.history.record(&self.page, field, now);
                if self.listener_refresh_allowed(field, now) {
                    vec![Effect::DebouncePreview]
                } else {
                    Vec::new()
                }
            }
            PageEvent::SelectionChange(field) => {
                if self.listener_refresh_allowed(field, now) {
                    vec![Effect::ThrottlePreview]
                } else {
                    Vec::new()
                }
            }
            PageEvent::KeyPress(token) => {
                if !self.panel.visible {
                    tracing::debug!("Ignoring {token} while hidden");
                    return Vec::new();
                }
                if self.ends_hold(&token, now) {
                    tracing::debug!("Swallowing the click that ends a hold on {token}");
                    return Vec::new();
                }
                if !self.guard.admit(&token, now) {
                    return Vec::new();
                }
                self.press(&token, now)
            }
            PageEvent::KeyDown(token) => {
                if !self.panel.visible || !token.repeats_on_hold() {
                    return Vec::new();
                }
                self.held = Some(token.clone());
                self.repeated = false;
                vec![Effect::StartRepeat(token)]
            }
            PageEvent::KeyUp => match self.held.take() {
                Some(token) => {
                    self.swallow_press = std::mem::take(&mut self.repeated).then_some((token, now));
                    vec![Effect::StopRepeat]
                }
                None => Vec::new(),
            },
            PageEvent::Click(target) => self.on_click(target, now),
            PageEvent::PanelMoved => {
                tracing::debug!("Panel moved by the user");
                self.panel.manually_positioned = true;
                Vec::new()
            }
        }
    }

    /// Reacts to a timer tick.
    pub fn handle_timer(&mut self, event: TimerEvent, now: Instant) -> Vec<Effect> {
        match event {
            TimerEvent::PreviewSync => {
                if self.panel.visible {
                    self.refresh_preview();
                }
                Vec::new()
            }
            TimerEvent::Repeat(token) => {
                if !self.panel.visible || self.held.as_ref() != Some(&token) {
                    return vec![Effect::StopRepeat];
                }
                self.repeated = true;
                // Repeats re-read the live field and bypass the double-fire guard
                self.press(&token, now)
            }
        }
    }

    /// Finishes an asynchronous paste.
    ///
    /// A failed clipboard read alerts the user and leaves the field alone.
    pub fn complete_paste(
        &mut self,
        field: FieldId,
        result: Result<String, ClipboardError>,
        now: Instant,
    ) -> Vec<Effect> {
        match result {
            Ok(text) => match self.editor.complete_paste(&mut self.page, field, &text) {
                Ok(true) => {
                    self.history.record(&self.page, field, now);
                    self.refresh_preview();
                }
                Ok(false) => tracing::debug!("Clipboard was empty"),
                Err(e) => tracing::warn!("Paste into {field} failed: {e}"),
            },
            Err(e) => {
                tracing::warn!("Clipboard read failed: {e}");
                self.page.alert(&crate::fl!("paste-failed"));
            }
        }
        Vec::new()
    }

    // ------------------------------------------------------------------------
    // Host messages
    // ------------------------------------------------------------------------

    /// Answers a host message.
    pub fn handle_host(&mut self, message: HostMessage, now: Instant) -> (HostResponse, Vec<Effect>) {
        match message {
            HostMessage::GetStatus => (HostResponse::status(self.is_enabled()), Vec::new()),
            HostMessage::EnableKeyboard => {
                tracing::info!("Keyboard enabled");
                self.config.keyboard_enabled = true;
                (HostResponse::success(true), vec![Effect::EnabledChanged(true)])
            }
            HostMessage::DisableKeyboard => {
                tracing::info!("Keyboard disabled");
                self.config.keyboard_enabled = false;
                let mut effects = self.hide();
                effects.push(Effect::EnabledChanged(false));
                (HostResponse::success(true), effects)
            }
            HostMessage::ShowKeyboard => {
                if !self.is_enabled() {
                    tracing::info!("showKeyboard refused, keyboard is disabled");
                    return (HostResponse::success(false), Vec::new());
                }
                let tracked = self
                    .modifiers
                    .focused()
                    .filter(|&field| self.page.kind(field).is_some_and(|k| k.is_text_like()));
                match tracked {
                    Some(_) => (HostResponse::success(true), self.show(now)),
                    None => {
                        tracing::info!("showKeyboard refused, no tracked field");
                        (HostResponse::success(false), Vec::new())
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn on_focus(&mut self, field: FieldId, now: Instant) -> Vec<Effect> {
        let Some(kind) = self.page.kind(field) else {
            tracing::warn!("Focus on unknown {field}");
            return Vec::new();
        };
        if !kind.is_text_like() {
            tracing::trace!("Focus on non-text {field} ({kind:?})");
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.modifiers.focused().is_some_and(|previous| previous != field) {
            effects.extend(self.leave_field());
        }

        self.modifiers.set_focused(Some(field));
        self.history.start_tracking(&self.page, field, now);

        if self.panel.visible {
            self.place();
            self.refresh_preview();
        } else if self.config.keyboard_enabled && self.config.show_on_focus {
            effects.extend(self.show(now));
        }
        effects
    }

    fn on_blur(&mut self, field: FieldId) -> Vec<Effect> {
        if self.modifiers.focused() != Some(field) {
            return Vec::new();
        }
        tracing::debug!("{field} lost focus");
        self.leave_field()
    }

    /// Cleanup when the focused field blurs or focus moves elsewhere.
    ///
    /// The field stays tracked so the host can reopen the panel for it.
    fn leave_field(&mut self) -> Vec<Effect> {
        self.modifiers.reset_modifiers();
        self.editor.clear_shift_select();
        self.held = None;
        self.repeated = false;
        self.direct_control_until = None;
        self.rerender_keys();
        vec![Effect::CancelTimers]
    }

    fn on_click(&mut self, target: ClickTarget, now: Instant) -> Vec<Effect> {
        if !self.panel.visible || !self.panel.outside_click_armed {
            return Vec::new();
        }
        if let Some(opened) = self.panel.opened_at {
            if now.saturating_duration_since(opened) < self.config.timings.outside_click_grace() {
                tracing::debug!("Ignoring click right after opening");
                return Vec::new();
            }
        }
        match target {
            ClickTarget::Outside => self.hide(),
            ClickTarget::Keyboard | ClickTarget::Field(_) | ClickTarget::FormControl => Vec::new(),
        }
    }

    /// Whether a press is the click a browser fires when a held key is
    /// released over it. Consumes the pending hold either way.
    fn ends_hold(&mut self, token: &KeyToken, now: Instant) -> bool {
        self.swallow_press.take().is_some_and(|(held, released)| {
            held == *token
                && now.saturating_duration_since(released) < self.config.timings.double_fire()
        })
    }

    fn listener_refresh_allowed(&self, field: FieldId, now: Instant) -> bool {
        self.panel.visible
            && self.modifiers.focused() == Some(field)
            && self.direct_control_until.is_none_or(|until| now >= until)
    }

    /// Handles one admitted key press.
    fn press(&mut self, token: &KeyToken, now: Instant) -> Vec<Effect> {
        if *token == KeyToken::Close {
            return self.hide();
        }

        let Some(field) = self.modifiers.focused() else {
            if let KeyToken::Modifier(modifier) = token {
                self.modifiers.toggle(*modifier);
                self.rerender_keys();
            }
            return Vec::new();
        };

        let outcome = self.editor.apply(
            &mut self.page,
            field,
            token,
            &mut self.modifiers,
            &mut self.history,
        );
        tracing::debug!("{token} on {field}: {outcome:?}");

        if token.is_arrow() {
            self.direct_control_until = Some(now + self.config.timings.direct_control());
        }

        let mut effects = Vec::new();
        if outcome.changed_text() {
            self.history.record(&self.page, field, now);
        }

        match outcome {
            EditOutcome::Copied(Some(text)) | EditOutcome::Cut(Some(text)) => {
                effects.push(Effect::WriteClipboard(text));
            }
            EditOutcome::PasteRequested => effects.push(Effect::ReadClipboard(field)),
            EditOutcome::FocusMoved(next) => return self.tab_to(next, now),
            EditOutcome::Close => return self.hide(),
            EditOutcome::Submitted(form) => tracing::info!("Submitted {form:?}"),
            _ => {}
        }

        self.rerender_keys();
        self.refresh_preview();
        effects
    }

    fn tab_to(&mut self, next: FieldId, now: Instant) -> Vec<Effect> {
        let mut effects = self.leave_field();

        if !self.page.kind(next).is_some_and(|k| k.is_text_like()) {
            tracing::debug!("Tab left the text fields, hiding");
            self.modifiers.set_focused(None);
            effects.extend(self.hide());
            return effects;
        }

        self.modifiers.set_focused(Some(next));
        self.history.start_tracking(&self.page, next, now);
        self.place();
        self.refresh_preview();
        effects
    }

    fn show(&mut self, now: Instant) -> Vec<Effect> {
        if self.panel.visible {
            return Vec::new();
        }
        tracing::info!("Showing keyboard");
        self.panel.visible = true;
        self.panel.opened_at = Some(now);
        self.panel.outside_click_armed = self.config.auto_hide;
        self.place();
        self.rerender_keys();
        self.refresh_preview();
        vec![Effect::VisibilityChanged(true)]
    }

    fn hide(&mut self) -> Vec<Effect> {
        if !self.panel.visible {
            return Vec::new();
        }
        tracing::info!("Hiding keyboard");
        self.panel.visible = false;
        self.panel.outside_click_armed = false;
        self.modifiers.reset_modifiers();
        self.editor.clear_shift_select();
        self.guard.reset();
        self.held = None;
        self.repeated = false;
        self.swallow_press = None;
        self.direct_control_until = None;
        self.preview.reset();
        self.rerender_keys();
        vec![Effect::CancelTimers, Effect::VisibilityChanged(false)]
    }

    fn place(&mut self) {
        let Some(field) = self.modifiers.focused() else {
            return;
        };
        let Some(rect) = self.page.bounding_rect(field) else {
            tracing::warn!("No bounding rect for {field}, keeping placement");
            return;
        };
        if let Some(placement) = self.positioner.place(
            rect,
            self.page.viewport(),
            self.page.panel_size(),
            self.panel.manually_positioned,
        ) {
            self.panel.placement = Some(placement);
        }
    }

    fn rerender_keys(&mut self) {
        self.faces = self.keys.render(&self.layout, &self.modifiers);
    }

    fn refresh_preview(&mut self) {
        if self.preview.refresh(&self.page, self.modifiers.focused()) {
            tracing::trace!("Preview: {}", self.preview.content());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{FieldKind, MemoryField, MemoryPage, NativeCommands, Rect};
    use crate::renderer::{Edge, PreviewContent};
    use std::time::Duration;

    struct Harness {
        orchestrator: Orchestrator<MemoryPage>,
        field: FieldId,
        clock: Instant,
    }

    impl Harness {
        fn new(field: MemoryField) -> Self {
            Self::with_config(field, Config::default())
        }

        fn with_config(field: MemoryField, config: Config) -> Self {
            let mut page = MemoryPage::new();
            let field = page.add_field(field);
            Self {
                orchestrator: Orchestrator::new(Components::new(page, config)),
                field,
                clock: Instant::now(),
            }
        }

        fn advance(&mut self, ms: u64) {
            self.clock += Duration::from_millis(ms);
        }

        fn event(&mut self, event: PageEvent) -> Vec<Effect> {
            self.orchestrator.handle_event(event, self.clock)
        }

        fn focus(&mut self) -> Vec<Effect> {
            self.event(PageEvent::Focus(self.field))
        }

        /// Presses a key 200 ms after the previous action.
        fn press(&mut self, token: &str) -> Vec<Effect> {
            self.advance(200);
            self.event(PageEvent::KeyPress(token.parse().unwrap()))
        }

        fn value(&self) -> String {
            self.orchestrator.page().value(self.field).unwrap()
        }

        fn selection(&self) -> Selection {
            self.orchestrator.page().selection(self.field).unwrap()
        }
    }

    /// Focusing a text field opens the panel and starts history
    #[test]
    fn test_focus_shows_panel() {
        let mut h = Harness::new(
            MemoryField::new(FieldKind::Text)
                .with_value("abc")
                .at(Rect::new(0.0, 50.0, 200.0, 30.0)),
        );
        let effects = h.focus();

        assert_eq!(effects, vec![Effect::VisibilityChanged(true)]);
        assert!(h.orchestrator.is_visible());
        assert!(h.orchestrator.history().is_tracking(h.field));
        assert_eq!(h.orchestrator.preview().content().to_string(), "abc|");
        let placement = h.orchestrator.panel().placement.unwrap();
        assert_eq!(placement.edge, Edge::Bottom);
    }

    #[test]
    fn test_focus_respects_preferences() {
        let config = Config {
            show_on_focus: false,
            ..Config::default()
        };
        let mut h = Harness::with_config(MemoryField::new(FieldKind::Text), config);
        assert!(h.focus().is_empty());
        assert!(!h.orchestrator.is_visible());

        let config = Config {
            keyboard_enabled: false,
            ..Config::default()
        };
        let mut h = Harness::with_config(MemoryField::new(FieldKind::Text), config);
        h.focus();
        assert!(!h.orchestrator.is_visible());
    }

    /// Non-text controls never open the panel
    #[test]
    fn test_focus_on_non_text() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Color));
        assert!(h.focus().is_empty());
        assert!(h.orchestrator.focused().is_none());
    }

    /// Typing a character consumes Shift and refreshes the preview once
    #[test]
    fn test_key_press_flow() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text));
        h.focus();
        let revision = h.orchestrator.preview().revision();

        h.press("Shift");
        assert!(h.orchestrator.modifiers().shift());
        assert_eq!(h.orchestrator.preview().revision(), revision);

        h.press("7");
        assert_eq!(h.value(), "/");
        assert!(!h.orchestrator.modifiers().shift());
        assert_eq!(h.orchestrator.preview().revision(), revision + 1);
        assert_eq!(h.orchestrator.history().texts(h.field), vec!["", "/"]);
    }

    /// 100 ms apart is one press, 300 ms apart is two
    #[test]
    fn test_double_fire_guard() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text));
        h.focus();

        h.event(PageEvent::KeyPress(KeyToken::Char('a')));
        h.advance(100);
        h.event(PageEvent::KeyPress(KeyToken::Char('a')));
        assert_eq!(h.value(), "a");

        h.advance(300);
        h.event(PageEvent::KeyPress(KeyToken::Char('a')));
        assert_eq!(h.value(), "aa");
    }

    /// Holding Sil repeats, and the click ending the hold is swallowed
    #[test]
    fn test_hold_repeat() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("abcdef"));
        h.focus();

        let effects = h.event(PageEvent::KeyDown(KeyToken::Backspace));
        assert_eq!(effects, vec![Effect::StartRepeat(KeyToken::Backspace)]);

        for _ in 0..3 {
            h.advance(70);
            h.orchestrator
                .handle_timer(TimerEvent::Repeat(KeyToken::Backspace), h.clock);
        }
        assert_eq!(h.value(), "abc");

        assert_eq!(h.event(PageEvent::KeyUp), vec![Effect::StopRepeat]);
        h.event(PageEvent::KeyPress(KeyToken::Backspace));
        assert_eq!(h.value(), "abc", "click after the hold is swallowed");

        // A plain tap still deletes
        h.event(PageEvent::KeyDown(KeyToken::Backspace));
        h.event(PageEvent::KeyUp);
        h.press("Sil");
        assert_eq!(h.value(), "ab");
    }

    /// Releasing a held key away from it leaves the next key alone
    #[test]
    fn test_hold_released_off_key() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("abcdef"));
        h.focus();

        h.event(PageEvent::KeyDown(KeyToken::Backspace));
        h.advance(400);
        h.orchestrator
            .handle_timer(TimerEvent::Repeat(KeyToken::Backspace), h.clock);
        h.event(PageEvent::KeyUp);
        assert_eq!(h.value(), "abcde");

        // No click lands on Sil; the next key is a different one
        h.event(PageEvent::KeyPress(KeyToken::Char('x')));
        assert_eq!(h.value(), "abcdex");
    }

    /// Only a click right after the release closes the hold
    #[test]
    fn test_hold_click_expires() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("abcdef"));
        h.focus();

        h.event(PageEvent::KeyDown(KeyToken::Backspace));
        h.advance(400);
        h.orchestrator
            .handle_timer(TimerEvent::Repeat(KeyToken::Backspace), h.clock);
        h.event(PageEvent::KeyUp);

        h.press("Sil");
        assert_eq!(h.value(), "abcd", "a later tap on Sil is a new press");
    }

    /// Stale repeat ticks stop the timer instead of editing
    #[test]
    fn test_stale_repeat() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("ab"));
        h.focus();
        let effects = h
            .orchestrator
            .handle_timer(TimerEvent::Repeat(KeyToken::Backspace), h.clock);
        assert_eq!(effects, vec![Effect::StopRepeat]);
        assert_eq!(h.value(), "ab");
    }

    /// Outside clicks close the panel after the grace period
    #[test]
    fn test_outside_click() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text));
        h.focus();

        h.advance(100);
        assert!(h.event(PageEvent::Click(ClickTarget::Outside)).is_empty());
        assert!(h.orchestrator.is_visible(), "within the grace period");

        h.advance(400);
        for target in [
            ClickTarget::Keyboard,
            ClickTarget::FormControl,
            ClickTarget::Field(h.field),
        ] {
            h.event(PageEvent::Click(target));
            assert!(h.orchestrator.is_visible(), "{target:?} keeps the panel");
        }

        let effects = h.event(PageEvent::Click(ClickTarget::Outside));
        assert_eq!(
            effects,
            vec![Effect::CancelTimers, Effect::VisibilityChanged(false)]
        );
        assert!(!h.orchestrator.panel().outside_click_armed);
    }

    #[test]
    fn test_auto_hide_off() {
        let config = Config {
            auto_hide: false,
            ..Config::default()
        };
        let mut h = Harness::with_config(MemoryField::new(FieldKind::Text), config);
        h.focus();
        h.advance(1000);
        h.event(PageEvent::Click(ClickTarget::Outside));
        assert!(h.orchestrator.is_visible());
    }

    /// Hiding resets one-shot modifiers and the preview, Caps survives
    #[test]
    fn test_hide_resets_state() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("xy"));
        h.focus();
        h.press("Caps");
        h.press("AltGr");

        let effects = h.press("Kapat");
        assert!(effects.contains(&Effect::VisibilityChanged(false)));
        assert!(!h.orchestrator.modifiers().alt_gr());
        assert!(h.orchestrator.modifiers().caps());
        assert_eq!(
            h.orchestrator.preview().content(),
            &PreviewContent::Title("Türkçe Klavye".to_string())
        );
        assert_eq!(h.value(), "xy");

        // Presses while hidden are ignored
        h.press("a");
        assert_eq!(h.value(), "xy");
    }

    /// Blur cancels timers and drops one-shot modifiers
    #[test]
    fn test_blur() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text));
        h.focus();
        h.press("Shift");

        let effects = h.event(PageEvent::Blur(h.field));
        assert_eq!(effects, vec![Effect::CancelTimers]);
        assert!(!h.orchestrator.modifiers().shift());
        assert_eq!(h.orchestrator.focused(), Some(h.field), "still tracked");
    }

    /// Arrow keys suppress listener refreshes for a while
    #[test]
    fn test_direct_control() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("abc"));
        h.focus();

        h.press("ArrowLeft");
        assert_eq!(h.orchestrator.preview().content().to_string(), "ab|c");
        assert!(h.event(PageEvent::SelectionChange(h.field)).is_empty());
        assert!(h.event(PageEvent::Input(h.field)).is_empty());

        h.advance(600);
        assert_eq!(
            h.event(PageEvent::SelectionChange(h.field)),
            vec![Effect::ThrottlePreview]
        );
        assert_eq!(h.event(PageEvent::Input(h.field)), vec![Effect::DebouncePreview]);
    }

    /// Native typing is recorded and resynced through the debounce
    #[test]
    fn test_native_input() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text));
        h.focus();

        h.orchestrator.page_mut().type_natively(h.field, "selam").unwrap();
        let effects = h.event(PageEvent::Input(h.field));
        assert_eq!(effects, vec![Effect::DebouncePreview]);
        assert_eq!(h.orchestrator.history().texts(h.field), vec!["", "selam"]);

        h.orchestrator.handle_timer(TimerEvent::PreviewSync, h.clock);
        assert_eq!(h.orchestrator.preview().content().to_string(), "selam|");
    }

    /// Copy with a declined native command goes through the async clipboard
    #[test]
    fn test_clipboard_effects() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("merhaba"));
        h.focus();
        h.press("HepsiniSec");

        h.press("Control");
        assert_eq!(
            h.press("c"),
            vec![Effect::WriteClipboard("merhaba".to_string())]
        );

        h.press("Control");
        assert_eq!(h.press("v"), vec![Effect::ReadClipboard(h.field)]);
        assert!(!h.orchestrator.modifiers().control());

        h.orchestrator
            .complete_paste(h.field, Ok("selam".to_string()), h.clock);
        assert_eq!(h.value(), "selam");
        assert_eq!(h.orchestrator.preview().content().to_string(), "selam|");
    }

    /// Native clipboard success needs no async follow-up
    #[test]
    fn test_native_copy() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("ab"));
        h.orchestrator
            .page_mut()
            .set_native_commands(NativeCommands::Supported);
        h.focus();
        h.press("HepsiniSec");
        h.press("Control");
        assert!(h.press("c").is_empty());
    }

    #[test]
    fn test_paste_failure_alerts() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("ab"));
        h.focus();
        h.orchestrator
            .complete_paste(h.field, Err(ClipboardError::Denied), h.clock);

        assert_eq!(h.value(), "ab");
        let alerts = h.orchestrator.page().alerts();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("Ctrl+V"));
    }

    /// Tab onto a non-text control hides the panel
    #[test]
    fn test_tab_to_non_text_hides() {
        let mut page = MemoryPage::new();
        let form = page.add_form(false);
        let first = page.add_field(MemoryField::new(FieldKind::Text).in_form(form));
        let second = page.add_field(MemoryField::new(FieldKind::Text).in_form(form));
        page.add_field(MemoryField::new(FieldKind::Color).in_form(form));
        let mut orchestrator = Orchestrator::new(Components::new(page, Config::default()));
        let mut now = Instant::now();

        orchestrator.handle_event(PageEvent::Focus(first), now);
        now += Duration::from_millis(200);
        orchestrator.handle_event(PageEvent::KeyPress(KeyToken::Tab), now);
        assert_eq!(orchestrator.focused(), Some(second));
        assert!(orchestrator.is_visible());
        assert!(orchestrator.history().is_tracking(second));

        now += Duration::from_millis(200);
        let effects = orchestrator.handle_event(PageEvent::KeyPress(KeyToken::Tab), now);
        assert!(effects.contains(&Effect::VisibilityChanged(false)));
        assert!(!orchestrator.is_visible());
    }

    /// Control+Z falls back to history when the native undo declines
    #[test]
    fn test_undo_through_keys() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text));
        h.focus();
        h.press("a");
        h.press("b");
        h.press("Control");
        h.press("z");
        assert_eq!(h.value(), "a");
        h.press("Control");
        h.press("y");
        assert_eq!(h.value(), "ab");
        assert_eq!(h.selection(), Selection::caret(2));
    }

    #[test]
    fn test_host_messages() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text));
        let now = h.clock;

        let (response, _) = h.orchestrator.handle_host(HostMessage::ShowKeyboard, now);
        assert!(!response.success, "no tracked field yet");

        h.focus();
        h.press("Kapat");
        let (response, effects) = h.orchestrator.handle_host(HostMessage::ShowKeyboard, now);
        assert!(response.success);
        assert_eq!(effects, vec![Effect::VisibilityChanged(true)]);

        let (response, effects) = h.orchestrator.handle_host(HostMessage::DisableKeyboard, now);
        assert!(response.success);
        assert_eq!(effects.last(), Some(&Effect::EnabledChanged(false)));
        assert!(!h.orchestrator.is_visible());

        let (response, _) = h.orchestrator.handle_host(HostMessage::GetStatus, now);
        assert_eq!(response.enabled, Some(false));

        let (response, _) = h.orchestrator.handle_host(HostMessage::ShowKeyboard, now);
        assert!(!response.success, "disabled");

        let (_, effects) = h.orchestrator.handle_host(HostMessage::EnableKeyboard, now);
        assert_eq!(effects, vec![Effect::EnabledChanged(true)]);
        assert!(h.orchestrator.is_enabled());
    }

    /// A moved panel keeps its position
    #[test]
    fn test_manual_position() {
        let mut page = MemoryPage::new();
        let top = page.add_field(MemoryField::new(FieldKind::Text).at(Rect::new(0.0, 10.0, 100.0, 20.0)));
        let bottom = page.add_field(MemoryField::new(FieldKind::Text).at(Rect::new(0.0, 700.0, 100.0, 20.0)));
        let mut orchestrator = Orchestrator::new(Components::new(page, Config::default()));
        let now = Instant::now();

        orchestrator.handle_event(PageEvent::Focus(top), now);
        assert_eq!(orchestrator.panel().placement.unwrap().edge, Edge::Bottom);

        orchestrator.handle_event(PageEvent::Focus(bottom), now);
        assert_eq!(orchestrator.panel().placement.unwrap().edge, Edge::Top);

        orchestrator.handle_event(PageEvent::PanelMoved, now);
        orchestrator.handle_event(PageEvent::Focus(top), now);
        assert_eq!(orchestrator.panel().placement.unwrap().edge, Edge::Top);
    }

    /// Snapshots never carry password text
    #[test]
    fn test_snapshot() {
        let mut h = Harness::new(MemoryField::new(FieldKind::Text).with_value("ab"));
        h.focus();
        h.press("Shift");
        let snapshot = h.orchestrator.snapshot();
        assert!(snapshot.visible);
        assert_eq!(snapshot.modifiers, vec![Modifier::Shift]);
        assert_eq!(snapshot.value.as_deref(), Some("ab"));
        assert_eq!(snapshot.selection, Some(Selection::caret(2)));
        assert!(snapshot.to_string().contains("preview=\"ab|\""));

        let mut h = Harness::new(MemoryField::new(FieldKind::Password).with_value("gizli"));
        h.focus();
        let snapshot = h.orchestrator.snapshot();
        assert_eq!(snapshot.value, None);
        assert!(!snapshot.to_string().contains("gizli"));
    }

    /// Modifier toggles without a field still repaint the keys
    #[test]
    fn test_modifier_without_field() {
        let page = MemoryPage::new();
        let mut orchestrator = Orchestrator::new(Components::new(page, Config::default()));
        orchestrator.panel.visible = true;

        orchestrator.handle_event(PageEvent::KeyPress(KeyToken::Modifier(Modifier::Caps)), Instant::now());
        assert!(orchestrator.modifiers().caps());
        let caps = orchestrator
            .faces()
            .iter()
            .flatten()
            .find(|f| f.token == KeyToken::Modifier(Modifier::Caps))
            .unwrap();
        assert_eq!(caps.label, "CAPS");
    }
}
