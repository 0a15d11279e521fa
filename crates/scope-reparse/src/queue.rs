//! Re-parse queue.
//!
//! Pending damage lives in a [`SpanSet`]; work is handed out one line (or one column window of a
//! long line) at a time, always starting from the lowest damaged offset.

use crate::buffer::EditBuffer;
use crate::delta::TextEdit;
use crate::intervals::{DamageSpan, SpanSet};
use std::ops::Range;
use std::time::Duration;

/// One bounded piece of parser work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// Line to lex.
    pub line: usize,
    /// Columns of the line content covered by this unit.
    pub columns: Range<usize>,
    /// The queued span that selected this line.
    pub span: DamageSpan,
}

/// Ordered, coalescing set of damage waiting to be re-parsed.
#[derive(Debug, Clone, Default)]
pub struct ReparseQueue {
    spans: SpanSet,
}

impl ReparseQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add damage, merging it with every overlapping or touching span.
    pub fn push(&mut self, span: DamageSpan) {
        self.spans.insert(span);
    }

    /// Next unit of work, or `None` when the queue is empty or no budget is left.
    ///
    /// `resume` is the `(line, column)` where the parser stopped inside a line; it is honoured
    /// only when that line is still the lowest damaged line.
    pub fn poll_one(
        &self,
        buffer: &EditBuffer,
        resume: Option<(usize, usize)>,
        max_unit_chars: usize,
        budget_remaining: Duration,
    ) -> Option<WorkUnit> {
        if budget_remaining.is_zero() {
            return None;
        }
        let span = *self.spans.first()?;
        let line = buffer.char_to_line(span.start);
        let line_len = buffer.line_len(line);

        let from = match resume {
            Some((resume_line, column)) if resume_line == line => column.min(line_len),
            _ => 0,
        };
        let to = from.saturating_add(max_unit_chars.max(1)).min(line_len);

        Some(WorkUnit {
            line,
            columns: from..to,
            span,
        })
    }

    /// Drop damage located before `offset`; called once a line is finished.
    pub fn retire_before(&mut self, offset: usize) {
        self.spans.retire_before(offset);
    }

    /// Translate queued damage through an edit and add the edit's own damage.
    pub fn apply_edit(&mut self, edit: &TextEdit) {
        self.spans.apply_edit(edit);
    }

    /// Drop every pending span.
    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Pending spans in ascending order.
    pub fn spans(&self) -> &[DamageSpan] {
        self.spans.as_slice()
    }

    /// Number of disjoint pending spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether no damage is pending.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
