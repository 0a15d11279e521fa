//! Logical line index
//!
//! Rope-backed line access. All offsets are character offsets (Unicode scalar values); columns
//! are character offsets within a line, not counting the line break.

use ropey::{Rope, RopeSlice};
use std::ops::Range;

/// Logical line index - implemented using Rope data structure
///
/// Rope provides O(log N) line access, insertion, and deletion performance, suitable for large
/// file editing.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Create an empty line index (one empty line).
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Build line index from text
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Get total line count (an empty document has one line).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get total character count
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Line containing `char_offset` (offsets past the end map to the last line).
    pub fn char_to_line(&self, char_offset: usize) -> usize {
        self.rope.char_to_line(char_offset.min(self.rope.len_chars()))
    }

    /// Character offset of the first character of `line` (clamped to the document end).
    pub fn line_to_char(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    /// Character at `char_offset`, if inside the document.
    pub fn char_at(&self, char_offset: usize) -> Option<char> {
        self.rope.get_char(char_offset)
    }

    /// Number of characters in `line`, excluding its line break.
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        slice.len_chars() - line_break_len(slice)
    }

    /// Char range of `line` including its line break.
    pub fn line_full_range(&self, line: usize) -> Range<usize> {
        self.line_to_char(line)..self.line_to_char(line + 1)
    }

    /// Characters `[from, from + max_len)` of the content of `line`, clipped to the line.
    pub fn line_chars(&self, line: usize, from: usize, max_len: usize) -> Vec<char> {
        let len = self.line_len(line);
        let from = from.min(len);
        let to = from.saturating_add(max_len).min(len);
        if from == to {
            return Vec::new();
        }
        self.rope.line(line).slice(from..to).chars().collect()
    }

    /// Insert text at a character offset.
    pub fn insert(&mut self, char_offset: usize, text: &str) {
        let char_offset = char_offset.min(self.rope.len_chars());
        self.rope.insert(char_offset, text);
    }

    /// Delete a character range.
    pub fn delete(&mut self, range: Range<usize>) {
        let end = range.end.min(self.rope.len_chars());
        let start = range.start.min(end);
        if start < end {
            self.rope.remove(start..end);
        }
    }

    /// Get complete text
    pub fn get_text(&self) -> String {
        self.rope.to_string()
    }
}

/// Length in chars of the line break terminating `line` (0 for the last line).
fn line_break_len(line: RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    if len == 0 {
        return 0;
    }
    match line.char(len - 1) {
        '\n' if len >= 2 && line.char(len - 2) == '\r' => 2,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => 1,
        _ => 0,
    }
}
