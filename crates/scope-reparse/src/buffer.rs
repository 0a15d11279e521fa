//! Edit buffer.
//!
//! The buffer owns the document text and turns host edits into [`TextEdit`] records plus the
//! line splice every per-line structure has to mirror.

use crate::delta::TextEdit;
use crate::error::ReparseError;
use crate::intervals::DamageSpan;
use crate::line_index::LineIndex;
use std::ops::Range;

/// Result of applying one edit to an [`EditBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedEdit {
    /// The edit in character offsets.
    pub edit: TextEdit,
    /// First line touched by the edit (same index before and after).
    pub first_line: usize,
    /// Number of pre-edit lines replaced, starting at `first_line`.
    pub removed_lines: usize,
    /// Number of post-edit lines that replace them.
    pub inserted_lines: usize,
}

impl AppliedEdit {
    /// Post-edit lines whose content changed.
    ///
    /// When no line was inserted the edit merged its lines into the previous one, so that line is
    /// reported instead.
    pub fn dirty_lines(&self) -> Range<usize> {
        if self.inserted_lines == 0 {
            let line = self.first_line.saturating_sub(1);
            return line..line + 1;
        }
        self.first_line..self.first_line + self.inserted_lines
    }

    /// Signed change in line count.
    pub fn line_delta(&self) -> isize {
        self.inserted_lines as isize - self.removed_lines as isize
    }
}

/// Document text with a monotonically increasing edit version.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    lines: LineIndex,
    version: u64,
}

impl EditBuffer {
    /// Create a buffer holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            lines: LineIndex::from_text(text),
            version: 0,
        }
    }

    /// Replace the chars in `range` with `text`.
    ///
    /// Inverted or out-of-bounds ranges leave the buffer untouched.
    pub fn apply_edit(
        &mut self,
        range: Range<usize>,
        text: &str,
    ) -> Result<AppliedEdit, ReparseError> {
        let len = self.lines.char_count();
        if range.start > range.end || range.end > len {
            return Err(ReparseError::EditOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }

        let old_total = self.lines.line_count();
        let mut first_line = self.lines.char_to_line(range.start);
        // Text landing right after a lone `\r` can turn it into `\r\n`, which changes the line
        // above.
        if first_line > 0
            && range.start == self.lines.line_to_char(first_line)
            && self.lines.char_at(range.start - 1) == Some('\r')
        {
            first_line -= 1;
        }
        let removed_lines = self.lines.char_to_line(range.end) - first_line + 1;

        self.lines.delete(range.clone());
        self.lines.insert(range.start, text);
        self.version += 1;

        let new_total = self.lines.line_count();
        let inserted = removed_lines as isize + new_total as isize - old_total as isize;
        let (removed_lines, inserted_lines) = if inserted >= 0 {
            (removed_lines, inserted as usize)
        } else {
            // More lines vanished than the edit spanned. Widen the splice so the line counts
            // still add up.
            (removed_lines + inserted.unsigned_abs(), 0)
        };

        Ok(AppliedEdit {
            edit: TextEdit::new(range.start, range.end - range.start, text.chars().count()),
            first_line,
            removed_lines,
            inserted_lines,
        })
    }

    /// Edit counter, incremented by every successful edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Document length in chars.
    pub fn len_chars(&self) -> usize {
        self.lines.char_count()
    }

    /// Number of lines (an empty document has one).
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// Line containing `offset`.
    pub fn char_to_line(&self, offset: usize) -> usize {
        self.lines.char_to_line(offset)
    }

    /// First char offset of `line`.
    pub fn line_start(&self, line: usize) -> usize {
        self.lines.line_to_char(line)
    }

    /// Content length of `line` in chars.
    pub fn line_len(&self, line: usize) -> usize {
        self.lines.line_len(line)
    }

    /// Span of `line` including its line break.
    pub fn line_span(&self, line: usize) -> DamageSpan {
        let range = self.lines.line_full_range(line);
        DamageSpan::new(range.start, range.end)
    }

    /// Span covering `lines`, including the last line's break.
    pub fn lines_span(&self, lines: Range<usize>) -> DamageSpan {
        DamageSpan::new(self.line_start(lines.start), self.line_start(lines.end))
    }

    /// Span of the whole document.
    pub fn full_span(&self) -> DamageSpan {
        DamageSpan::new(0, self.len_chars())
    }

    /// Window of `line` content starting at column `from`.
    pub fn line_chars(&self, line: usize, from: usize, max_len: usize) -> Vec<char> {
        self.lines.line_chars(line, from, max_len)
    }

    /// Complete document text.
    pub fn text(&self) -> String {
        self.lines.get_text()
    }
}
