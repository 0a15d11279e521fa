//! Text edits and coordinate translation.
//!
//! Damage spans (queued work and pending highlight refreshes) move through an edit with
//! [`TextEdit::map_start`] and [`TextEdit::map_end`], which widen them over the edited text.

use crate::intervals::DamageSpan;

/// A single replacement expressed in character offsets.
///
/// Semantics:
/// - `start` is a character offset in the document **before** the edit.
/// - `old_len` characters starting at `start` were replaced by `new_len` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextEdit {
    /// Start character offset of the edit.
    pub start: usize,
    /// Number of characters removed.
    pub old_len: usize,
    /// Number of characters inserted.
    pub new_len: usize,
}

impl TextEdit {
    /// Create an edit record.
    pub fn new(start: usize, old_len: usize, new_len: usize) -> Self {
        Self {
            start,
            old_len,
            new_len,
        }
    }

    /// Exclusive end character offset in the pre-edit document.
    pub fn old_end(&self) -> usize {
        self.start + self.old_len
    }

    /// Exclusive end character offset in the post-edit document.
    pub fn new_end(&self) -> usize {
        self.start + self.new_len
    }

    /// Signed change in document length.
    pub fn len_delta(&self) -> isize {
        self.new_len as isize - self.old_len as isize
    }

    /// The damage this edit causes, in post-edit coordinates.
    pub fn damage(&self) -> DamageSpan {
        DamageSpan::new(self.start, self.new_end())
    }

    /// Map a position that opens a range.
    ///
    /// Positions inside the replaced text collapse to the start of the edit.
    pub fn map_start(&self, pos: usize) -> usize {
        if pos <= self.start {
            pos
        } else if pos >= self.old_end() {
            pos - self.old_len + self.new_len
        } else {
            self.start
        }
    }

    /// Map a position that closes a range.
    ///
    /// Positions inside the replaced text are pushed to the end of the inserted text.
    pub fn map_end(&self, pos: usize) -> usize {
        if pos <= self.start {
            pos
        } else if pos >= self.old_end() {
            pos - self.old_len + self.new_len
        } else {
            self.new_end()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_mapping() {
        // Insert 3 chars at 10.
        let edit = TextEdit::new(10, 0, 3);
        assert_eq!(edit.map_start(5), 5);
        assert_eq!(edit.map_start(10), 10);
        assert_eq!(edit.map_end(10), 10);
        assert_eq!(edit.map_start(11), 14);
        assert_eq!(edit.len_delta(), 3);
        assert_eq!(edit.damage(), DamageSpan::new(10, 13));
    }

    #[test]
    fn test_replacement_mapping_collapses_inner_positions() {
        // Replace 10..20 with 2 chars.
        let edit = TextEdit::new(10, 10, 2);
        assert_eq!(edit.map_start(15), 10);
        assert_eq!(edit.map_end(15), 12);
        assert_eq!(edit.map_start(20), 12);
        assert_eq!(edit.map_end(25), 17);
        assert_eq!(edit.len_delta(), -8);
    }

    #[test]
    fn test_deletion_damage_is_empty_span() {
        let edit = TextEdit::new(4, 6, 0);
        assert!(edit.damage().is_empty());
        assert_eq!(edit.damage().start, 4);
    }
}
