// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard layout: the rows of keys shown in the panel.
//!
//! The built-in Turkish-Q layout is always available. A custom layout can be
//! loaded from JSON where each key is its token string plus an optional
//! relative width:
//!
//! ```json
//! {
//!     "name": "Mini",
//!     "rows": [
//!         { "keys": [ { "token": "a" }, { "token": "Sil", "width": 2.0 } ] },
//!         { "keys": [ { "token": "Boşluk", "width": 6.0 }, { "token": "Kapat" } ] }
//!     ]
//! }
//! ```

use crate::input::{Direction, KeyToken, Modifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// Types
// ============================================================================

/// A single key in a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Token produced when the key is pressed
    pub token: KeyToken,

    /// Relative width (1.0 = standard key)
    #[serde(default = "default_width")]
    pub width: f32,
}

fn default_width() -> f32 {
    1.0
}

impl Key {
    pub fn new(token: KeyToken) -> Self {
        Self { token, width: 1.0 }
    }

    pub fn wide(token: KeyToken, width: f32) -> Self {
        Self { token, width }
    }
}

/// A horizontal row of keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub keys: Vec<Key>,
}

/// A complete keyboard layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::turkish_q()
    }
}

fn char_row(chars: &str) -> impl Iterator<Item = Key> + '_ {
    chars.chars().map(|c| Key::new(KeyToken::Char(c)))
}

impl Layout {
    /// The standard Turkish-Q layout.
    #[must_use]
    pub fn turkish_q() -> Self {
        let shift = || KeyToken::Modifier(Modifier::Shift);

        let mut first: Vec<Key> = char_row("1234567890*-").collect();
        first.push(Key::wide(KeyToken::Backspace, 2.0));

        let mut second = vec![Key::wide(KeyToken::Tab, 1.5)];
        second.extend(char_row("qwertyuıopğü"));

        let mut third = vec![Key::wide(KeyToken::Modifier(Modifier::Caps), 1.75)];
        third.extend(char_row("asdfghjklşi,"));
        third.push(Key::wide(KeyToken::Enter, 1.75));

        let mut fourth = vec![Key::wide(shift(), 2.25)];
        fourth.extend(char_row("zxcvbnmöç."));
        fourth.push(Key::wide(shift(), 2.25));

        let fifth = vec![
            Key::wide(KeyToken::Modifier(Modifier::Control), 1.5),
            Key::new(KeyToken::Arrow(Direction::Left)),
            Key::new(KeyToken::Arrow(Direction::Down)),
            Key::new(KeyToken::Arrow(Direction::Up)),
            Key::new(KeyToken::Arrow(Direction::Right)),
            Key::wide(KeyToken::Space, 5.0),
            Key::wide(KeyToken::Modifier(Modifier::AltGr), 1.5),
            Key::wide(KeyToken::SelectAll, 1.5),
            Key::wide(KeyToken::Close, 1.5),
        ];

        Self {
            name: "Türkçe Q".to_string(),
            rows: [first, second, third, fourth, fifth]
                .into_iter()
                .map(|keys| Row { keys })
                .collect(),
        }
    }

    /// Iterates over every key in row order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.rows.iter().flat_map(|row| row.keys.iter())
    }

    /// Returns `true` if any key produces the token.
    #[must_use]
    pub fn contains(&self, token: &KeyToken) -> bool {
        self.keys().any(|key| &key.token == token)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while loading a layout.
#[derive(Debug)]
pub enum LayoutError {
    /// I/O error occurred while reading the layout file
    Io {
        source: std::io::Error,
        file_path: Option<String>,
    },

    /// JSON parsing error, including unknown key tokens
    Json {
        source: serde_json::Error,
        file_path: Option<String>,
    },

    /// The layout parsed but cannot be shown
    Invalid { issues: Vec<String> },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Io { source, file_path } => {
                write!(f, "I/O error")?;
                if let Some(path) = file_path {
                    write!(f, " in '{path}'")?;
                }
                write!(f, ": {source}")
            }
            LayoutError::Json { source, file_path } => {
                write!(f, "JSON parse error")?;
                if let Some(path) = file_path {
                    write!(f, " in '{path}'")?;
                }
                write!(f, " at line {}: {}", source.line(), source)
            }
            LayoutError::Invalid { issues } => {
                write!(f, "invalid layout: {}", issues.join("; "))
            }
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayoutError::Io { source, .. } => Some(source),
            LayoutError::Json { source, .. } => Some(source),
            LayoutError::Invalid { .. } => None,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Parses and validates a layout from a JSON string.
pub fn parse_layout_from_string(json: &str) -> Result<Layout, LayoutError> {
    let layout: Layout = serde_json::from_str(json).map_err(|source| LayoutError::Json {
        source,
        file_path: None,
    })?;
    validate(&layout)?;
    Ok(layout)
}

/// Reads, parses and validates a layout file.
pub fn parse_layout_file(path: impl AsRef<Path>) -> Result<Layout, LayoutError> {
    let path = path.as_ref();
    let file_path = Some(path.display().to_string());

    let json = fs::read_to_string(path).map_err(|source| LayoutError::Io {
        source,
        file_path: file_path.clone(),
    })?;
    let layout: Layout = serde_json::from_str(&json).map_err(|source| LayoutError::Json {
        source,
        file_path,
    })?;
    validate(&layout)?;

    tracing::info!("Loaded layout '{}' from {}", layout.name, path.display());
    Ok(layout)
}

/// Checks that the layout can be rendered and closed.
fn validate(layout: &Layout) -> Result<(), LayoutError> {
    let mut issues = Vec::new();

    if layout.rows.is_empty() {
        issues.push("layout has no rows".to_string());
    }
    for (i, row) in layout.rows.iter().enumerate() {
        if row.keys.is_empty() {
            issues.push(format!("rows[{i}] has no keys"));
        }
        for (j, key) in row.keys.iter().enumerate() {
            if !(key.width > 0.0) {
                issues.push(format!("rows[{i}].keys[{j}] has non-positive width"));
            }
        }
    }
    if !layout.rows.is_empty() && !layout.contains(&KeyToken::Close) {
        issues.push("layout has no Kapat key".to_string());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(LayoutError::Invalid { issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The built-in layout matches the Turkish-Q rows
    #[test]
    fn test_turkish_q_rows() {
        let layout = Layout::turkish_q();
        assert_eq!(layout.rows.len(), 5);

        let third: String = layout.rows[2]
            .keys
            .iter()
            .filter_map(|k| k.token.as_char())
            .collect();
        assert_eq!(third, "asdfghjklşi,");

        let shifts = layout
            .keys()
            .filter(|k| k.token == KeyToken::Modifier(Modifier::Shift))
            .count();
        assert_eq!(shifts, 2, "left and right Shift");

        assert!(layout.contains(&KeyToken::SelectAll));
        assert!(validate(&layout).is_ok());
    }

    #[test]
    fn test_parse_from_string() {
        let json = r#"{
            "name": "Mini",
            "rows": [
                { "keys": [ { "token": "a" }, { "token": "Sil", "width": 2.0 } ] },
                { "keys": [ { "token": "Kapat" } ] }
            ]
        }"#;

        let layout = parse_layout_from_string(json).unwrap();
        assert_eq!(layout.rows[0].keys[1], Key::wide(KeyToken::Backspace, 2.0));
        assert_eq!(layout.rows[1].keys[0].width, 1.0);
    }

    /// Unknown tokens surface as JSON errors
    #[test]
    fn test_unknown_token() {
        let json = r#"{ "name": "Bad", "rows": [ { "keys": [ { "token": "Esc" } ] } ] }"#;
        let err = parse_layout_from_string(json).unwrap_err();
        assert!(matches!(err, LayoutError::Json { .. }));
    }

    #[test]
    fn test_validation_issues() {
        let json = r#"{ "name": "Empty", "rows": [ { "keys": [] } ] }"#;
        match parse_layout_from_string(json).unwrap_err() {
            LayoutError::Invalid { issues } => {
                assert_eq!(issues.len(), 2);
                assert!(issues[0].contains("rows[0]"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(&path, serde_json::to_string(&Layout::turkish_q()).unwrap()).unwrap();

        assert_eq!(parse_layout_file(&path).unwrap(), Layout::turkish_q());

        let err = parse_layout_file(dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
