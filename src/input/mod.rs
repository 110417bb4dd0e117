// SPDX-License-Identifier: GPL-3.0-only

//! Input handling for the on-screen keyboard.
//!
//! This module turns key presses into something the editor can act on:
//!
//! - **Key tokens**: decode the token string a key carries (`"a"`, `"Sil"`,
//!   `"ArrowLeft"`, ...)
//! - **Modifier state**: one-shot Shift/AltGr/Control and the Caps lock
//! - **Character map**: Turkish-Q Shift and AltGr layers plus Turkish case rules
//! - **Double-fire guard**: merge two activations of one physical tap
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use klavye::input::{CharacterMap, KeyToken, ModifierState};
//!
//! let map = CharacterMap::turkish_q();
//! let mut state = ModifierState::new();
//! state.toggle_shift();
//!
//! let token: KeyToken = "1".parse()?;
//! assert_eq!(map.resolve(token.as_char().unwrap(), &state), '!');
//! ```

// Sub-modules
pub mod charmap;
pub mod guard;
pub mod modifier;
pub mod token;

// Re-export public API
pub use charmap::{CharacterMap, to_turkish_lower, to_turkish_upper};
pub use guard::KeyGuard;
pub use modifier::{Modifier, ModifierState};
pub use token::{Direction, KeyToken, TokenError};

// ============================================================================
// Module Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Decoded tokens feed straight into character resolution
    #[test]
    fn test_token_to_character() {
        let map = CharacterMap::turkish_q();
        let mut state = ModifierState::new();

        let token: KeyToken = "ı".parse().unwrap();
        state.toggle_caps();
        assert_eq!(map.resolve(token.as_char().unwrap(), &state), 'I');
    }

    /// Modifier tokens carry the modifier they toggle
    #[test]
    fn test_modifier_tokens() {
        for modifier in Modifier::ALL {
            let token: KeyToken = modifier.as_str().parse().unwrap();
            assert_eq!(token, KeyToken::Modifier(modifier));
        }
    }
}
