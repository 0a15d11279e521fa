//! Scope highlight cache.
//!
//! Holds the last committed set of scope regions the renderer paints from, plus the lines
//! whose regions must be refreshed at the next commit. Commits replace whole lines at once, so
//! the renderer only ever sees regions of fully parsed lines.

use crate::buffer::EditBuffer;
use crate::delta::TextEdit;
use crate::intervals::{DamageSpan, SpanSet};
use crate::lexer::{ScopeKind, ScopeSegment};
use crate::parser::IncrementalParser;
use std::ops::Range;
use std::sync::Arc;

/// Base of the style ids produced by [`HighlightDescriptor::style_id`].
pub const SCOPE_STYLE_ID_BASE: u32 = 0x0500_0000;

/// What the renderer needs to paint a scope region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightDescriptor {
    /// Scope nesting depth.
    pub depth: u16,
    /// Kind of text.
    pub kind: ScopeKind,
    /// Tint strength (0-100).
    pub strength: u8,
}

impl HighlightDescriptor {
    /// Style id for renderers that key styles by a single integer.
    ///
    /// The id encodes kind and depth, not strength.
    pub fn style_id(&self) -> u32 {
        SCOPE_STYLE_ID_BASE | (self.kind.code() << 16) | u32::from(self.depth)
    }
}

/// A painted range of the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeRegion {
    /// Char range (half-open).
    pub range: Range<usize>,
    /// How to paint it.
    pub descriptor: HighlightDescriptor,
}

/// A committed update, delivered to subscribers.
#[derive(Debug, Clone)]
pub struct ScopeBatch {
    /// Commit counter of the cache after this batch.
    pub generation: u64,
    /// Char ranges whose regions were replaced, ascending.
    pub refreshed: Vec<Range<usize>>,
    /// All committed regions after this batch.
    pub regions: Arc<[ScopeRegion]>,
    /// Set when the cache was emptied (highlighting switched off).
    pub cleared: bool,
}

/// Whether a segment is worth painting at all.
fn is_painted(segment: &ScopeSegment) -> bool {
    segment.depth > 0 || segment.kind != ScopeKind::Code
}

/// Committed scope regions plus pending refreshes.
#[derive(Debug, Clone, Default)]
pub struct ScopeHighlightCache {
    committed: Vec<ScopeRegion>,
    pending: SpanSet,
    strength: u8,
    generation: u64,
}

impl ScopeHighlightCache {
    /// Create an empty cache painting with `strength`.
    pub fn new(strength: u8) -> Self {
        Self {
            strength: strength.min(100),
            ..Self::default()
        }
    }

    /// Mark a span for refresh at the next commit.
    pub fn stage(&mut self, span: DamageSpan) {
        self.pending.insert(span);
    }

    /// Keep committed regions aligned with the text across an edit.
    ///
    /// Regions before the edit stay, regions after it shift, and the replaced or inserted text
    /// has no paint until the next commit. A region starting exactly where text is inserted
    /// moves past the insertion.
    pub fn apply_edit(&mut self, edit: &TextEdit) {
        self.pending.shift_for_edit(edit);

        let old_end = edit.old_end();
        let shift = |pos: usize| pos - edit.old_len + edit.new_len;
        let mut shifted = Vec::with_capacity(self.committed.len() + 1);
        for region in self.committed.drain(..) {
            if region.range.end <= edit.start {
                shifted.push(region);
            } else if region.range.start >= old_end {
                let range = shift(region.range.start)..shift(region.range.end);
                shifted.push(ScopeRegion { range, ..region });
            } else {
                if region.range.start < edit.start {
                    shifted.push(ScopeRegion {
                        range: region.range.start..edit.start,
                        descriptor: region.descriptor,
                    });
                }
                if region.range.end > old_end {
                    shifted.push(ScopeRegion {
                        range: edit.new_end()..shift(region.range.end),
                        descriptor: region.descriptor,
                    });
                }
            }
        }
        self.committed = shifted;
    }

    /// Replace the regions of every staged line with the parser's current segments.
    ///
    /// With `keep_stale`, lines the parser has not finished keep their current paint and stay
    /// staged; otherwise they are unpainted. Returns `None` when nothing was replaced.
    pub fn commit(
        &mut self,
        buffer: &EditBuffer,
        parser: &IncrementalParser,
        keep_stale: bool,
    ) -> Option<ScopeBatch> {
        if self.pending.is_empty() {
            return None;
        }

        let mut replacements: Vec<(Range<usize>, Vec<ScopeRegion>)> = Vec::new();
        let mut last_line = None;
        for span in self.pending.take() {
            let first = buffer.char_to_line(span.start);
            let last = if span.is_empty() {
                first
            } else {
                buffer.char_to_line(span.end - 1)
            };
            for line in first..=last {
                if last_line.is_some_and(|done| line <= done) {
                    continue;
                }
                last_line = Some(line);

                if keep_stale && parser.is_stale(line) {
                    self.pending.insert(buffer.line_span(line));
                    continue;
                }
                let span = buffer.line_span(line);
                replacements.push((span.start..span.end, self.line_regions(buffer, parser, line)));
            }
        }
        if replacements.is_empty() {
            return None;
        }

        let refreshed = merge_ranges(replacements.iter().map(|(range, _)| range.clone()));
        self.splice(replacements);
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            regions = self.committed.len(),
            "committed scope regions"
        );
        Some(self.batch(refreshed, false))
    }

    /// Drop every region and pending refresh.
    pub fn clear(&mut self) -> ScopeBatch {
        let refreshed = match (self.committed.first(), self.committed.last()) {
            (Some(first), Some(last)) => vec![first.range.start..last.range.end],
            _ => Vec::new(),
        };
        self.committed.clear();
        self.pending.clear();
        self.generation += 1;
        self.batch(refreshed, true)
    }

    /// Change the tint strength of every committed region.
    ///
    /// Returns `None` when the strength is unchanged.
    pub fn set_strength(&mut self, strength: u8) -> Option<ScopeBatch> {
        let strength = strength.min(100);
        if strength == self.strength {
            return None;
        }
        self.strength = strength;
        for region in &mut self.committed {
            region.descriptor.strength = strength;
        }
        self.generation += 1;
        let refreshed = merge_ranges(self.committed.iter().map(|region| region.range.clone()));
        Some(self.batch(refreshed, false))
    }

    /// Tint strength applied to new regions.
    pub fn strength(&self) -> u8 {
        self.strength
    }

    /// Committed regions, ordered by start.
    pub fn regions(&self) -> &[ScopeRegion] {
        &self.committed
    }

    /// Committed regions overlapping `range`.
    pub fn regions_in(&self, range: Range<usize>) -> &[ScopeRegion] {
        let lo = self
            .committed
            .partition_point(|region| region.range.end <= range.start);
        let hi = self
            .committed
            .partition_point(|region| region.range.start < range.end);
        &self.committed[lo..hi.max(lo)]
    }

    /// Number of commits so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether refreshes are staged.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn line_regions(
        &self,
        buffer: &EditBuffer,
        parser: &IncrementalParser,
        line: usize,
    ) -> Vec<ScopeRegion> {
        let Some(state) = parser.line(line).filter(|state| !state.stale) else {
            return Vec::new();
        };
        let base = buffer.line_start(line);
        state
            .segments
            .iter()
            .filter(|segment| is_painted(segment))
            .map(|segment| ScopeRegion {
                range: base + segment.columns.start..base + segment.columns.end,
                descriptor: HighlightDescriptor {
                    depth: segment.depth,
                    kind: segment.kind,
                    strength: self.strength,
                },
            })
            .collect()
    }

    /// Merge sorted, disjoint line replacements into the committed regions in one pass.
    fn splice(&mut self, replacements: Vec<(Range<usize>, Vec<ScopeRegion>)>) {
        let old = std::mem::take(&mut self.committed);
        let mut merged = Vec::with_capacity(old.len());
        let mut old = old.into_iter().peekable();

        for (range, regions) in replacements {
            while let Some(mut region) = old.next_if(|region| region.range.start < range.start) {
                region.range.end = region.range.end.min(range.start);
                merged.push(region);
            }
            while old
                .next_if(|region| region.range.start < range.end)
                .is_some()
            {}
            merged.extend(regions);
        }
        merged.extend(old);
        self.committed = merged;
    }

    fn batch(&self, refreshed: Vec<Range<usize>>, cleared: bool) -> ScopeBatch {
        ScopeBatch {
            generation: self.generation,
            refreshed,
            regions: Arc::from(self.committed.as_slice()),
            cleared,
        }
    }
}

/// Coalesce ascending ranges that overlap or touch.
fn merge_ranges(ranges: impl IntoIterator<Item = Range<usize>>) -> Vec<Range<usize>> {
    let mut merged: Vec<Range<usize>> = Vec::new();
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}
