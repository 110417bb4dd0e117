// SPDX-License-Identifier: GPL-3.0-only

//! Logical key tokens.
//!
//! Every on-screen key carries a token string. Single characters stand for
//! themselves; everything else is a named key:
//!
//! | Token        | Key                         |
//! |--------------|-----------------------------|
//! | `Sil`        | Backspace                   |
//! | `Tab`        | Tab                         |
//! | `Enter`      | Enter                       |
//! | `Boşluk`     | Space                       |
//! | `Kapat`      | Close the keyboard          |
//! | `ArrowLeft`… | Caret movement              |
//! | `Shift`…     | Modifiers                   |
//! | `HepsiniSec` | Select all                  |

use super::modifier::Modifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caret movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Arrow glyph shown on the key.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Direction::Left => "◄",
            Direction::Down => "▼",
            Direction::Up => "▲",
            Direction::Right => "►",
        }
    }
}

/// A key press after decoding the key's token string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyToken {
    /// A literal character key
    Char(char),
    Backspace,
    Tab,
    Enter,
    Space,
    Close,
    Arrow(Direction),
    Modifier(Modifier),
    SelectAll,
}

impl KeyToken {
    /// Returns `true` for keys that repeat while held.
    #[must_use]
    pub fn repeats_on_hold(&self) -> bool {
        matches!(self, KeyToken::Backspace)
    }

    #[must_use]
    pub fn is_arrow(&self) -> bool {
        matches!(self, KeyToken::Arrow(_))
    }

    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            KeyToken::Char(c) => Some(*c),
            _ => None,
        }
    }
}

/// Error returned when a token string names no key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Empty,
    Unknown(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Empty => write!(f, "empty key token"),
            TokenError::Unknown(s) => write!(f, "unknown key token: {s:?}"),
        }
    }
}

impl std::error::Error for TokenError {}

impl FromStr for KeyToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = match s {
            "" => return Err(TokenError::Empty),
            "Sil" | "Backspace" => KeyToken::Backspace,
            "Tab" => KeyToken::Tab,
            "Enter" => KeyToken::Enter,
            "Boşluk" | " " => KeyToken::Space,
            "Kapat" => KeyToken::Close,
            "ArrowLeft" => KeyToken::Arrow(Direction::Left),
            "ArrowRight" => KeyToken::Arrow(Direction::Right),
            "ArrowUp" => KeyToken::Arrow(Direction::Up),
            "ArrowDown" => KeyToken::Arrow(Direction::Down),
            "Shift" => KeyToken::Modifier(Modifier::Shift),
            "Caps" | "CapsLock" => KeyToken::Modifier(Modifier::Caps),
            "AltGr" => KeyToken::Modifier(Modifier::AltGr),
            "Control" => KeyToken::Modifier(Modifier::Control),
            "HepsiniSec" => KeyToken::SelectAll,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyToken::Char(c),
                    _ => return Err(TokenError::Unknown(other.to_string())),
                }
            }
        };
        Ok(token)
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char(c) => write!(f, "{c}"),
            KeyToken::Backspace => f.write_str("Sil"),
            KeyToken::Tab => f.write_str("Tab"),
            KeyToken::Enter => f.write_str("Enter"),
            KeyToken::Space => f.write_str("Boşluk"),
            KeyToken::Close => f.write_str("Kapat"),
            KeyToken::Arrow(Direction::Left) => f.write_str("ArrowLeft"),
            KeyToken::Arrow(Direction::Right) => f.write_str("ArrowRight"),
            KeyToken::Arrow(Direction::Up) => f.write_str("ArrowUp"),
            KeyToken::Arrow(Direction::Down) => f.write_str("ArrowDown"),
            KeyToken::Modifier(m) => write!(f, "{m}"),
            KeyToken::SelectAll => f.write_str("HepsiniSec"),
        }
    }
}

impl TryFrom<String> for KeyToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyToken> for String {
    fn from(token: KeyToken) -> Self {
        token.to_string()
    }
}
