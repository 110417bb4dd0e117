// SPDX-License-Identifier: GPL-3.0-only

//! Per-field undo history.
//!
//! Each tracked field owns a bounded list of snapshots and a cursor into it.
//! Fields are keyed by their element id, or by a generated `anonymous-<n>`
//! key when they have none, so history survives the handle being looked up
//! again.
//!
//! Recording rules:
//! - a snapshot whose text equals the entry at the cursor is dropped
//! - recording after an undo discards the entries past the cursor
//! - when the list exceeds the limit the oldest entry is evicted and the
//!   cursor shifts with it

use crate::page::{FieldId, Page, Selection, safe_selection};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// One recorded state of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    pub selection_start: usize,
    pub selection_end: usize,
    pub timestamp: Instant,
}

impl HistoryEntry {
    fn capture<P: Page + ?Sized>(page: &P, field: FieldId, now: Instant) -> Option<Self> {
        let text = match page.value(field) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Cannot snapshot {field}: {e}");
                return None;
            }
        };
        let selection = safe_selection(page, field);
        Some(Self {
            text,
            selection_start: selection.start,
            selection_end: selection.end,
            timestamp: now,
        })
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::new(self.selection_start, self.selection_end)
    }
}

#[derive(Debug, Clone, Default)]
struct FieldHistory {
    entries: VecDeque<HistoryEntry>,
    index: usize,
}

/// Undo/redo snapshots for every tracked field.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    keys: HashMap<FieldId, String>,
    histories: HashMap<String, FieldHistory>,
    next_anonymous: u64,
    limit: usize,
}

impl HistoryStore {
    /// Creates a store keeping at most `limit` entries per field.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            keys: HashMap::new(),
            histories: HashMap::new(),
            next_anonymous: 0,
            limit: limit.max(1),
        }
    }

    /// Starts tracking a field with its current state as the first entry.
    ///
    /// Does nothing for a field that is already tracked.
    pub fn start_tracking<P: Page + ?Sized>(&mut self, page: &P, field: FieldId, now: Instant) {
        if self.keys.contains_key(&field) {
            return;
        }

        let key = page.element_id(field).unwrap_or_else(|| {
            self.next_anonymous += 1;
            format!("anonymous-{}", self.next_anonymous)
        });

        let Some(initial) = HistoryEntry::capture(page, field, now) else {
            return;
        };

        tracing::debug!("Tracking history of {field} as '{key}'");
        let mut entries = VecDeque::with_capacity(self.limit);
        entries.push_back(initial);
        self.histories
            .insert(key.clone(), FieldHistory { entries, index: 0 });
        self.keys.insert(field, key);
    }

    #[must_use]
    pub fn is_tracking(&self, field: FieldId) -> bool {
        self.keys.contains_key(&field)
    }

    /// The history key a field is stored under.
    #[must_use]
    pub fn key_of(&self, field: FieldId) -> Option<&str> {
        self.keys.get(&field).map(String::as_str)
    }

    /// Appends the field's current state.
    ///
    /// An untracked field starts being tracked instead.
    pub fn record<P: Page + ?Sized>(&mut self, page: &P, field: FieldId, now: Instant) {
        let Some(key) = self.keys.get(&field) else {
            self.start_tracking(page, field, now);
            return;
        };
        let Some(history) = self.histories.get_mut(key) else {
            return;
        };
        let Some(entry) = HistoryEntry::capture(page, field, now) else {
            return;
        };

        if history
            .entries
            .get(history.index)
            .is_some_and(|current| current.text == entry.text)
        {
            return;
        }

        history.entries.truncate(history.index + 1);
        history.entries.push_back(entry);
        history.index = history.entries.len() - 1;

        if history.entries.len() > self.limit {
            history.entries.pop_front();
            history.index -= 1;
        }
    }

    /// Steps back one entry and restores it into the field.
    ///
    /// # Returns
    ///
    /// `false` if there is no older entry; the field is left untouched.
    pub fn undo<P: Page + ?Sized>(&mut self, page: &mut P, field: FieldId) -> bool {
        self.step(page, field, Step::Back)
    }

    /// Steps forward one entry and restores it into the field.
    pub fn redo<P: Page + ?Sized>(&mut self, page: &mut P, field: FieldId) -> bool {
        self.step(page, field, Step::Forward)
    }

    fn step<P: Page + ?Sized>(&mut self, page: &mut P, field: FieldId, step: Step) -> bool {
        let Some(history) = self
            .keys
            .get(&field)
            .and_then(|key| self.histories.get_mut(key))
        else {
            return false;
        };

        let target = match step {
            Step::Back if history.index > 0 => history.index - 1,
            Step::Forward if history.index + 1 < history.entries.len() => history.index + 1,
            _ => return false,
        };
        let Some(entry) = history.entries.get(target) else {
            return false;
        };

        if let Err(e) = page.set_value(field, &entry.text) {
            tracing::warn!("Cannot restore history entry: {e}");
            return false;
        }
        if let Err(e) = page.set_selection(field, entry.selection()) {
            tracing::debug!("Selection not restored: {e}");
        }
        history.index = target;
        true
    }

    /// Number of entries kept for a field.
    #[must_use]
    pub fn len(&self, field: FieldId) -> usize {
        self.history(field).map_or(0, |h| h.entries.len())
    }

    /// Cursor position for a field.
    #[must_use]
    pub fn index(&self, field: FieldId) -> Option<usize> {
        self.history(field).map(|h| h.index)
    }

    /// Texts of all entries, oldest first.
    #[must_use]
    pub fn texts(&self, field: FieldId) -> Vec<String> {
        self.history(field)
            .map(|h| h.entries.iter().map(|e| e.text.clone()).collect())
            .unwrap_or_default()
    }

    fn history(&self, field: FieldId) -> Option<&FieldHistory> {
        self.keys.get(&field).and_then(|key| self.histories.get(key))
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Back,
    Forward,
}
