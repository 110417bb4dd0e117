// SPDX-License-Identifier: GPL-3.0-only

//! Character-offset text helpers.
//!
//! Field selections count characters, not bytes, so every helper here takes
//! and returns character offsets. Offsets past the end are clamped.

use crate::page::Selection;

/// Number of characters in `text`.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the character at `pos`, or the text length past the end.
#[must_use]
pub fn byte_offset(text: &str, pos: usize) -> usize {
    text.char_indices()
        .nth(pos)
        .map_or(text.len(), |(offset, _)| offset)
}

/// Characters in `start..end`.
#[must_use]
pub fn slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(text, start);
    let to = byte_offset(text, end.max(start));
    &text[from..to]
}

/// Replaces the selected range with `insert`.
///
/// # Returns
///
/// The new text and the caret position right after the inserted text.
#[must_use]
pub fn splice(text: &str, selection: Selection, insert: &str) -> (String, usize) {
    let selection = selection.clamp(char_len(text));
    let from = byte_offset(text, selection.start);
    let to = byte_offset(text, selection.end);

    let mut result = String::with_capacity(text.len() + insert.len());
    result.push_str(&text[..from]);
    result.push_str(insert);
    result.push_str(&text[to..]);

    (result, selection.start + char_len(insert))
}

/// Offset of the first character of the line containing `pos`.
fn line_start(chars: &[char], pos: usize) -> usize {
    chars[..pos]
        .iter()
        .rposition(|&c| c == '\n')
        .map_or(0, |i| i + 1)
}

/// Offset of the newline ending the line containing `pos`, or the length.
fn line_end(chars: &[char], pos: usize) -> usize {
    chars[pos..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |i| pos + i)
}

/// Caret position one line up, keeping the column where the line allows.
///
/// On the first line the caret moves to the start of the text.
#[must_use]
pub fn line_up(text: &str, caret: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());

    let start = line_start(&chars, caret);
    if start == 0 {
        return 0;
    }

    let column = caret - start;
    let prev_start = line_start(&chars, start - 1);
    let prev_len = start - 1 - prev_start;
    prev_start + column.min(prev_len)
}

/// Caret position one line down, keeping the column where the line allows.
///
/// On the last line the caret moves to the end of the text.
#[must_use]
pub fn line_down(text: &str, caret: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());

    let end = line_end(&chars, caret);
    if end >= chars.len() {
        return chars.len();
    }

    let column = caret - line_start(&chars, caret);
    let next_start = end + 1;
    let next_len = line_end(&chars, next_start) - next_start;
    next_start + column.min(next_len)
}
