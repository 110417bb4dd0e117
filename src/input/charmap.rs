// SPDX-License-Identifier: GPL-3.0-only

//! Turkish-Q character tables.
//!
//! Two static lookups back both the key renderer (corner hints and active
//! glyphs) and the field editor (the character actually inserted): the Shift
//! layer for digits and punctuation, and the AltGr layer. Letters follow
//! Turkish case rules, where dotted and dotless `i` are distinct letters.

use super::modifier::ModifierState;
use std::collections::HashMap;

/// Keys whose Shift glyph is shown as a corner hint and replaces the base glyph.
pub const SHIFT_HINT_KEYS: &str = "1234567890*-,.";

const SHIFT_LAYER: [(char, char); 15] = [
    ('1', '!'),
    ('2', '\''),
    ('3', '^'),
    ('4', '+'),
    ('5', '%'),
    ('6', '&'),
    ('7', '/'),
    ('8', '('),
    ('9', ')'),
    ('0', '='),
    ('*', '?'),
    ('-', '_'),
    (',', ';'),
    ('.', ':'),
    ('i', 'İ'),
];

const ALT_GR_LAYER: [(char, char); 15] = [
    ('3', '#'),
    ('4', '$'),
    ('7', '{'),
    ('8', '['),
    ('9', ']'),
    ('0', '}'),
    ('q', '@'),
    ('e', '€'),
    ('ü', '~'),
    ('ğ', '¨'),
    (',', '`'),
    ('z', '<'),
    ('x', '>'),
    ('-', '|'),
    ('*', '\\'),
];

/// Returns the Turkish uppercase form of a single character.
///
/// `i` maps to `İ` and `ı` to `I`; everything else uses the Unicode mapping
/// when it yields exactly one character.
#[must_use]
pub fn to_turkish_upper(c: char) -> char {
    match c {
        'i' => 'İ',
        'ı' => 'I',
        _ => single(c.to_uppercase()).unwrap_or(c),
    }
}

/// Returns the Turkish lowercase form of a single character.
#[must_use]
pub fn to_turkish_lower(c: char) -> char {
    match c {
        'İ' => 'i',
        'I' => 'ı',
        _ => single(c.to_lowercase()).unwrap_or(c),
    }
}

/// Returns `true` for characters that take part in case changes.
#[must_use]
pub fn is_letter(c: char) -> bool {
    c.is_alphabetic() && (to_turkish_upper(c) != c || to_turkish_lower(c) != c)
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

/// Shift and AltGr lookup tables.
#[derive(Debug, Clone)]
pub struct CharacterMap {
    shift: HashMap<char, char>,
    alt_gr: HashMap<char, char>,
}

impl Default for CharacterMap {
    fn default() -> Self {
        Self::turkish_q()
    }
}

impl CharacterMap {
    /// The standard Turkish-Q tables.
    #[must_use]
    pub fn turkish_q() -> Self {
        Self {
            shift: SHIFT_LAYER.into_iter().collect(),
            alt_gr: ALT_GR_LAYER.into_iter().collect(),
        }
    }

    /// Shift-layer glyph for a base key, if any.
    #[must_use]
    pub fn shift(&self, base: char) -> Option<char> {
        self.shift.get(&base).copied()
    }

    /// AltGr-layer glyph for a base key, if any.
    #[must_use]
    pub fn alt_gr(&self, base: char) -> Option<char> {
        self.alt_gr.get(&base).copied()
    }

    /// Returns `true` if the key shows its Shift glyph as a hint.
    #[must_use]
    pub fn has_shift_hint(&self, base: char) -> bool {
        SHIFT_HINT_KEYS.contains(base) && self.shift.contains_key(&base)
    }

    /// Resolves the character a base key produces under the given modifiers.
    ///
    /// Precedence is AltGr, then Shift, then Caps. AltGr without a mapping
    /// yields the base key. Shift on a letter inverts the Caps case; Shift on
    /// a key without a Shift glyph yields the base key. Control is not
    /// considered here.
    ///
    /// # Arguments
    ///
    /// * `base` - The lowercase glyph printed on the key
    /// * `modifiers` - Current modifier state
    #[must_use]
    pub fn resolve(&self, base: char, modifiers: &ModifierState) -> char {
        if modifiers.alt_gr() {
            return self.alt_gr(base).unwrap_or(base);
        }

        if modifiers.shift() {
            if self.has_shift_hint(base) {
                return self.shift(base).unwrap_or(base);
            }
            if is_letter(base) {
                return if modifiers.caps() {
                    to_turkish_lower(base)
                } else {
                    to_turkish_upper(base)
                };
            }
            return base;
        }

        if modifiers.caps() && is_letter(base) {
            return to_turkish_upper(base);
        }

        base
    }
}
