//! Incremental parser.
//!
//! Keeps one [`LineState`] per buffer line and recomputes them one work unit at a time. A line is
//! lexed from the end state of the line above it; when a recomputed line ends in a different
//! state than the next line assumed, the next line is marked stale and queued. Damage thus
//! travels down the document one line per unit instead of forcing a full pass.

use crate::buffer::{AppliedEdit, EditBuffer};
use crate::error::LexError;
use crate::intervals::DamageSpan;
use crate::lexer::{LexState, LineLexer, ScopeSegment};
use crate::queue::ReparseQueue;
use std::time::Duration;

/// Parse result of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineState {
    /// State the line was lexed from.
    pub start: LexState,
    /// State the next line starts in.
    pub end: LexState,
    /// Painted runs of the line content.
    pub segments: Vec<ScopeSegment>,
    /// Set when the line was damaged after it was parsed.
    pub stale: bool,
}

/// How a [`ParseStep`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The unit covered part of the line; the scan resumes with the next unit.
    Partial,
    /// The line is finished.
    Completed,
    /// The lexer failed; the unit's damage was dropped and the line stays stale.
    Dropped(LexError),
}

/// Outcome of [`IncrementalParser::process_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStep {
    /// Line the unit belonged to.
    pub line: usize,
    /// How the unit ended.
    pub status: StepStatus,
    /// Characters scanned by this unit.
    pub consumed: usize,
    /// Damage pushed for the next line by forward propagation.
    pub new_damage: Option<DamageSpan>,
    /// Line whose highlight must be refreshed.
    pub updated_region: Option<usize>,
}

#[derive(Debug, Clone)]
struct PartialLine {
    line: usize,
    next_col: usize,
    start: LexState,
    state: LexState,
    segments: Vec<ScopeSegment>,
}

/// Per-line parse states plus the machinery to refresh them from queued damage.
pub struct IncrementalParser {
    lexer: Box<dyn LineLexer>,
    lines: Vec<Option<LineState>>,
    partial: Option<PartialLine>,
    max_unit_chars: usize,
}

impl IncrementalParser {
    /// Create a parser for a document of `line_count` lines, none of them parsed yet.
    pub fn new(lexer: Box<dyn LineLexer>, line_count: usize, max_unit_chars: usize) -> Self {
        Self {
            lexer,
            lines: vec![None; line_count],
            partial: None,
            max_unit_chars: max_unit_chars.max(1),
        }
    }

    /// Mirror a buffer edit: splice the line table and mark the changed lines stale.
    ///
    /// Any scan in progress is abandoned.
    pub fn apply_edit(&mut self, applied: &AppliedEdit) {
        self.partial = None;

        let first = applied.first_line.min(self.lines.len());
        let end = (first + applied.removed_lines).min(self.lines.len());
        self.lines
            .splice(first..end, std::iter::repeat_n(None, applied.inserted_lines));

        for line in applied.dirty_lines() {
            self.mark_stale(line);
        }
    }

    /// Mark a single line stale.
    pub fn mark_stale(&mut self, line: usize) {
        if let Some(Some(state)) = self.lines.get_mut(line) {
            state.stale = true;
        }
    }

    /// Mark every parsed line stale.
    pub fn mark_all_stale(&mut self) {
        self.partial = None;
        for state in self.lines.iter_mut().flatten() {
            state.stale = true;
        }
    }

    /// Parse state of `line`, stale or not.
    pub fn line(&self, line: usize) -> Option<&LineState> {
        self.lines.get(line)?.as_ref()
    }

    /// Whether `line` lacks an up-to-date parse state.
    pub fn is_stale(&self, line: usize) -> bool {
        self.line(line).is_none_or(|state| state.stale)
    }

    /// Number of lines without an up-to-date parse state.
    pub fn stale_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|state| state.as_ref().is_none_or(|state| state.stale))
            .count()
    }

    /// Number of lines tracked.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Take the next unit from `queue` and process it.
    ///
    /// Returns `None` when the queue is empty or the budget is exhausted.
    pub fn process_next(
        &mut self,
        queue: &mut ReparseQueue,
        buffer: &EditBuffer,
        budget_remaining: Duration,
    ) -> Option<ParseStep> {
        let resume = self.partial.as_ref().map(|p| (p.line, p.next_col));
        let unit = queue.poll_one(buffer, resume, self.max_unit_chars, budget_remaining)?;
        self.sync_line_count(buffer.line_count());

        let line = unit.line;
        let (start, state, mut segments) = match self.partial.take() {
            Some(partial) if partial.line == line && partial.next_col == unit.columns.start => {
                (partial.start, partial.state, partial.segments)
            }
            _ => {
                let start = self.start_state(line);
                (start, start, Vec::new())
            }
        };

        let from = unit.columns.start;
        let width = unit.columns.len();
        let chars = buffer.line_chars(line, from, width + self.lexer.lookahead());
        let next_line_start = if line + 1 < buffer.line_count() {
            buffer.line_start(line + 1)
        } else {
            usize::MAX
        };

        let (state, consumed) = match self
            .lexer
            .scan(state, &chars, width.min(chars.len()), from, &mut segments)
        {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(line, %err, "dropping scope parse unit");
                queue.retire_before(next_line_start);
                self.mark_stale(line);
                return Some(ParseStep {
                    line,
                    status: StepStatus::Dropped(err),
                    consumed: 0,
                    new_damage: None,
                    updated_region: None,
                });
            }
        };

        let next_col = from + consumed;
        if next_col < buffer.line_len(line) {
            self.partial = Some(PartialLine {
                line,
                next_col,
                start,
                state,
                segments,
            });
            return Some(ParseStep {
                line,
                status: StepStatus::Partial,
                consumed,
                new_damage: None,
                updated_region: None,
            });
        }

        let end = self.lexer.finish_line(state);
        let updated = match &self.lines[line] {
            Some(old) => old.stale || old.segments != segments,
            None => true,
        };
        self.lines[line] = Some(LineState {
            start,
            end,
            segments,
            stale: false,
        });
        queue.retire_before(next_line_start);

        let new_damage = self.propagate(line, end, buffer, queue);
        Some(ParseStep {
            line,
            status: StepStatus::Completed,
            consumed,
            new_damage,
            updated_region: updated.then_some(line),
        })
    }

    /// Queue the line after `line` if it does not start where `line` ended.
    fn propagate(
        &mut self,
        line: usize,
        end: LexState,
        buffer: &EditBuffer,
        queue: &mut ReparseQueue,
    ) -> Option<DamageSpan> {
        let next = self.lines.get_mut(line + 1)?;
        match next {
            Some(state) if !state.stale && state.start == end => return None,
            Some(state) => state.stale = true,
            None => {}
        }
        let span = buffer.line_span(line + 1);
        queue.push(span);
        Some(span)
    }

    fn start_state(&self, line: usize) -> LexState {
        match line.checked_sub(1).and_then(|prev| self.line(prev)) {
            Some(prev) => prev.end,
            None => LexState::default(),
        }
    }

    fn sync_line_count(&mut self, line_count: usize) {
        if self.lines.len() != line_count {
            tracing::warn!(
                tracked = self.lines.len(),
                line_count,
                "line table out of sync, resynchronizing"
            );
            self.partial = None;
            self.lines.resize(line_count, None);
        }
    }
}
