// SPDX-License-Identifier: GPL-3.0-only

//! Key face computation.
//!
//! Turns the layout plus the current modifier state into the glyph and
//! styling flags of every key. Faces are plain data; the host paints them.
//!
//! # Glyph rules
//!
//! - **Letters**: Turkish-aware case, uppercase when exactly one of Caps and
//!   Shift is active.
//! - **Digits/punctuation with a Shift glyph**: the Shift glyph replaces the
//!   base glyph while Shift is active.
//! - **AltGr**: the AltGr glyph where one exists, otherwise the lowercase base.
//! - **Hints**: Shift and AltGr alternates are always reported for the corners,
//!   computed from the character map regardless of state.

use crate::input::{CharacterMap, KeyToken, Modifier, ModifierState, to_turkish_lower, to_turkish_upper};
use crate::input::charmap::is_letter;
use crate::layout::{Key, Layout};

/// Keys that form a Ctrl-combo and are highlighted while Control is primed.
pub const CONTROL_COMBO_KEYS: &str = "acvxyz";

/// Which layer the main glyph comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphTier {
    Base,
    Shift,
    AltGr,
}

/// Everything the host needs to paint one key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFace {
    /// Token carried as the key's data attribute
    pub token: KeyToken,
    /// Main glyph
    pub label: String,
    /// Modifier key whose flag is set
    pub active: bool,
    pub tier: GlyphTier,
    /// Corner hint for the Shift layer
    pub shift_hint: Option<char>,
    /// Corner hint for the AltGr layer
    pub alt_gr_hint: Option<char>,
    /// Ctrl-combo key while Control is primed
    pub highlighted: bool,
    /// Relative width from the layout
    pub width: f32,
}

/// Computes key faces from modifier state.
#[derive(Debug, Clone, Default)]
pub struct KeyRenderer {
    charmap: CharacterMap,
}

impl KeyRenderer {
    #[must_use]
    pub fn new(charmap: CharacterMap) -> Self {
        Self { charmap }
    }

    /// Renders every key of the layout, row by row.
    #[must_use]
    pub fn render(&self, layout: &Layout, modifiers: &ModifierState) -> Vec<Vec<KeyFace>> {
        layout
            .rows
            .iter()
            .map(|row| row.keys.iter().map(|key| self.face(key, modifiers)).collect())
            .collect()
    }

    /// Renders a single key.
    #[must_use]
    pub fn face(&self, key: &Key, modifiers: &ModifierState) -> KeyFace {
        let mut face = KeyFace {
            token: key.token.clone(),
            label: String::new(),
            active: false,
            tier: GlyphTier::Base,
            shift_hint: None,
            alt_gr_hint: None,
            highlighted: false,
            width: key.width,
        };

        match &key.token {
            KeyToken::Char(base) => {
                let (label, tier) = self.glyph(*base, modifiers);
                face.label = label.to_string();
                face.tier = tier;
                face.shift_hint = self
                    .charmap
                    .has_shift_hint(*base)
                    .then(|| self.charmap.shift(*base))
                    .flatten();
                face.alt_gr_hint = self.charmap.alt_gr(*base);
                face.highlighted = modifiers.control() && CONTROL_COMBO_KEYS.contains(*base);
            }
            KeyToken::Modifier(modifier) => {
                face.active = modifiers.is_active(*modifier);
                face.label = modifier_label(*modifier, modifiers).to_string();
            }
            KeyToken::Arrow(direction) => face.label = direction.glyph().to_string(),
            KeyToken::SelectAll => face.label = crate::fl!("select-all"),
            other => face.label = other.to_string(),
        }

        face
    }

    /// Main glyph of a character key.
    fn glyph(&self, base: char, modifiers: &ModifierState) -> (char, GlyphTier) {
        if modifiers.alt_gr() {
            return match self.charmap.alt_gr(base) {
                Some(glyph) => (glyph, GlyphTier::AltGr),
                None => (to_turkish_lower(base), GlyphTier::Base),
            };
        }

        if modifiers.shift() && self.charmap.has_shift_hint(base) {
            if let Some(glyph) = self.charmap.shift(base) {
                return (glyph, GlyphTier::Shift);
            }
        }

        if is_letter(base) {
            let upper = modifiers.caps() != modifiers.shift();
            let glyph = if upper {
                to_turkish_upper(base)
            } else {
                to_turkish_lower(base)
            };
            return (glyph, GlyphTier::Base);
        }

        (base, GlyphTier::Base)
    }
}

fn modifier_label(modifier: Modifier, modifiers: &ModifierState) -> &'static str {
    match modifier {
        Modifier::Caps if modifiers.caps() => "CAPS",
        Modifier::Caps => "caps",
        Modifier::Control => "Ctrl",
        Modifier::Shift => "Shift",
        Modifier::AltGr => "AltGr",
    }
}
