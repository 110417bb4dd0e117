// SPDX-License-Identifier: GPL-3.0-only

//! Modifier state management for the virtual keyboard.
//!
//! A click-driven keyboard has no keydown/keyup pairing for modifiers, so
//! Shift, AltGr and Control are modelled as one-shot ("primed") modifiers:
//!
//! - **One-shot**: Shift, AltGr and Control clear themselves after producing
//!   one character or one Ctrl-combo. Only one of them may be primed at a time;
//!   priming one releases the other two.
//! - **Lock**: Caps stays active until toggled again and combines with any
//!   one-shot modifier.
//!
//! The state also remembers which field currently owns keyboard input.
//!
//! # Example
//!
//! ```rust,ignore
//! use klavye::input::{Modifier, ModifierState};
//!
//! let mut state = ModifierState::new();
//! state.toggle(Modifier::Shift);
//! state.toggle(Modifier::AltGr); // Shift is released
//! assert!(!state.is_active(Modifier::Shift));
//! ```

use crate::page::FieldId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Virtual modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modifier {
    Shift,
    Caps,
    AltGr,
    Control,
}

impl Modifier {
    /// All modifiers, in display order.
    pub const ALL: [Modifier; 4] = [
        Modifier::Shift,
        Modifier::Caps,
        Modifier::AltGr,
        Modifier::Control,
    ];

    /// Returns `true` for modifiers that clear after one use.
    #[must_use]
    pub fn is_one_shot(self) -> bool {
        !matches!(self, Modifier::Caps)
    }

    /// Token string carried by the key's data attribute.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Shift => "Shift",
            Modifier::Caps => "Caps",
            Modifier::AltGr => "AltGr",
            Modifier::Control => "Control",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks active modifiers and the focused field.
#[derive(Debug, Clone, Default)]
pub struct ModifierState {
    /// Set of currently active modifiers
    active: HashSet<Modifier>,

    /// Field that receives virtual key presses
    focused: Option<FieldId>,
}

impl ModifierState {
    /// Creates a new `ModifierState` with no active modifiers and no field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips one modifier and returns its new value.
    ///
    /// Priming a one-shot modifier releases the other one-shot modifiers
    /// first. Caps never affects the others.
    pub fn toggle(&mut self, modifier: Modifier) -> bool {
        if self.active.remove(&modifier) {
            return false;
        }

        if modifier.is_one_shot() {
            self.active.retain(|m| !m.is_one_shot());
        }
        self.active.insert(modifier);
        true
    }

    pub fn toggle_shift(&mut self) -> bool {
        self.toggle(Modifier::Shift)
    }

    pub fn toggle_caps(&mut self) -> bool {
        self.toggle(Modifier::Caps)
    }

    pub fn toggle_alt_gr(&mut self) -> bool {
        self.toggle(Modifier::AltGr)
    }

    pub fn toggle_control(&mut self) -> bool {
        self.toggle(Modifier::Control)
    }

    /// Checks if a modifier is currently active.
    #[must_use]
    pub fn is_active(&self, modifier: Modifier) -> bool {
        self.active.contains(&modifier)
    }

    pub fn shift(&self) -> bool {
        self.is_active(Modifier::Shift)
    }

    pub fn caps(&self) -> bool {
        self.is_active(Modifier::Caps)
    }

    pub fn alt_gr(&self) -> bool {
        self.is_active(Modifier::AltGr)
    }

    pub fn control(&self) -> bool {
        self.is_active(Modifier::Control)
    }

    /// Returns all active modifiers in a consistent order.
    #[must_use]
    pub fn get_active_modifiers(&self) -> Vec<Modifier> {
        let mut modifiers: Vec<Modifier> = self.active.iter().copied().collect();
        modifiers.sort();
        modifiers
    }

    /// Consumes the primed one-shot modifier, if any.
    ///
    /// Called after a character or a Ctrl-combo has been produced. Returns
    /// the modifier that was cleared.
    pub fn consume_one_shot(&mut self) -> Option<Modifier> {
        let primed = self.active.iter().copied().find(|m| m.is_one_shot());
        if let Some(modifier) = primed {
            self.active.remove(&modifier);
        }
        primed
    }

    /// Clears Shift, AltGr and Control. Caps is kept.
    pub fn reset_modifiers(&mut self) {
        self.active.retain(|m| !m.is_one_shot());
    }

    /// Records the field that receives virtual key presses.
    pub fn set_focused(&mut self, field: Option<FieldId>) {
        self.focused = field;
    }

    #[must_use]
    pub fn focused(&self) -> Option<FieldId> {
        self.focused
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
