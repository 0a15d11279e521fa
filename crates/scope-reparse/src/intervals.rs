//! Damage intervals
//!
//! Uses a sorted vector of merged intervals with binary search, so insertion is
//! O(log n + k) where k is the number of spans absorbed by the insert.

use crate::delta::TextEdit;

/// A buffer region whose derived state is known to be stale.
///
/// Half-open `[start, end)` in char offsets. An empty span still marks the line containing
/// `start` (e.g. the join point of a deletion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DamageSpan {
    /// Start offset
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl DamageSpan {
    /// Create a span; an inverted range is collapsed to an empty span at `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if span contains a specific position
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Closed-interval adjacency: overlapping or sharing a boundary.
    pub fn touches(&self, other: &DamageSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest span covering both.
    pub fn union(&self, other: &DamageSpan) -> DamageSpan {
        DamageSpan::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Move the span through an edit.
    pub fn map_through(&self, edit: &TextEdit) -> DamageSpan {
        DamageSpan::new(edit.map_start(self.start), edit.map_end(self.end))
    }
}

/// Ordered set of non-overlapping, non-touching spans.
///
/// Invariant: `spans[i].end < spans[i + 1].start` for every `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanSet {
    spans: Vec<DamageSpan>,
}

impl SpanSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Insert a span, coalescing with every span it touches.
    pub fn insert(&mut self, span: DamageSpan) {
        // First span that could touch `span` (its end reaches span.start).
        let lo = self.spans.partition_point(|s| s.end < span.start);
        // One past the last span that could touch `span` (its start is within span.end).
        let hi = self.spans.partition_point(|s| s.start <= span.end);

        if lo >= hi {
            self.spans.insert(lo, span);
            return;
        }

        let merged = span.union(&self.spans[lo]).union(&self.spans[hi - 1]);
        self.spans.splice(lo..hi, std::iter::once(merged));
    }

    /// Drop damage located strictly before `offset`.
    ///
    /// Spans ending at or before `offset` (and starting before it) are removed, a span
    /// straddling `offset` is trimmed to start there. An empty span exactly at `offset`
    /// belongs to whatever starts at `offset` and is kept.
    pub fn retire_before(&mut self, offset: usize) {
        let consumed = self
            .spans
            .partition_point(|s| s.start < offset && s.end <= offset);
        self.spans.drain(..consumed);
        if let Some(first) = self.spans.first_mut()
            && first.start < offset
        {
            first.start = offset;
        }
    }

    /// Move every span through an edit and add the edit's damage.
    ///
    /// Spans fully before the edit are untouched, spans after it shift by the length delta,
    /// and spans overlapping it are merged with the new damage.
    pub fn apply_edit(&mut self, edit: &TextEdit) {
        let mut mapped = Vec::with_capacity(self.spans.len() + 1);
        for span in self.spans.drain(..) {
            push_coalesced(&mut mapped, span.map_through(edit));
        }
        self.spans = mapped;
        self.insert(edit.damage());
    }

    /// Move every span through an edit without adding damage for it.
    pub fn shift_for_edit(&mut self, edit: &TextEdit) {
        let mut mapped = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            push_coalesced(&mut mapped, span.map_through(edit));
        }
        self.spans = mapped;
    }

    /// First (lowest) span.
    pub fn first(&self) -> Option<&DamageSpan> {
        self.spans.first()
    }

    /// Whether any span touches `span`.
    pub fn touches(&self, span: &DamageSpan) -> bool {
        let lo = self.spans.partition_point(|s| s.end < span.start);
        self.spans.get(lo).is_some_and(|s| s.touches(span))
    }

    /// Remove and return all spans.
    pub fn take(&mut self) -> Vec<DamageSpan> {
        std::mem::take(&mut self.spans)
    }

    /// Iterate spans in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &DamageSpan> {
        self.spans.iter()
    }

    /// All spans in ascending order.
    pub fn as_slice(&self) -> &[DamageSpan] {
        &self.spans
    }

    /// Remove all spans.
    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Get number of spans
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl FromIterator<DamageSpan> for SpanSet {
    fn from_iter<I: IntoIterator<Item = DamageSpan>>(iter: I) -> Self {
        let mut set = SpanSet::new();
        for span in iter {
            set.insert(span);
        }
        set
    }
}

/// Append to an ascending list, merging with the last span when they touch.
fn push_coalesced(spans: &mut Vec<DamageSpan>, span: DamageSpan) {
    match spans.last_mut() {
        Some(last) if last.touches(&span) => *last = last.union(&span),
        _ => spans.push(span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(set: &SpanSet) -> Vec<(usize, usize)> {
        set.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn test_span_contains_and_touches() {
        let a = DamageSpan::new(10, 20);
        assert!(a.contains(10));
        assert!(a.contains(19));
        assert!(!a.contains(20));

        assert!(a.touches(&DamageSpan::new(20, 25)));
        assert!(a.touches(&DamageSpan::new(5, 10)));
        assert!(!a.touches(&DamageSpan::new(21, 25)));
        assert!(a.touches(&DamageSpan::new(15, 15)));
    }

    #[test]
    fn test_insert_keeps_order_and_disjointness() {
        let mut set = SpanSet::new();
        set.insert(DamageSpan::new(30, 40));
        set.insert(DamageSpan::new(0, 5));
        set.insert(DamageSpan::new(10, 12));
        assert_eq!(spans(&set), vec![(0, 5), (10, 12), (30, 40)]);
    }

    #[test]
    fn test_insert_merges_touching_spans() {
        let mut set = SpanSet::new();
        set.insert(DamageSpan::new(0, 5));
        set.insert(DamageSpan::new(10, 12));
        set.insert(DamageSpan::new(30, 40));

        // Touches (0, 5) at 5 and (10, 12) at 10.
        set.insert(DamageSpan::new(5, 10));
        assert_eq!(spans(&set), vec![(0, 12), (30, 40)]);

        // Swallows everything.
        set.insert(DamageSpan::new(1, 45));
        assert_eq!(spans(&set), vec![(0, 45)]);
    }

    #[test]
    fn test_insert_empty_span() {
        let mut set = SpanSet::new();
        set.insert(DamageSpan::new(7, 7));
        set.insert(DamageSpan::new(3, 3));
        assert_eq!(spans(&set), vec![(3, 3), (7, 7)]);

        set.insert(DamageSpan::new(7, 9));
        assert_eq!(spans(&set), vec![(3, 3), (7, 9)]);
    }

    #[test]
    fn test_retire_before() {
        let mut set: SpanSet = [
            DamageSpan::new(0, 3),
            DamageSpan::new(5, 5),
            DamageSpan::new(8, 20),
            DamageSpan::new(30, 30),
        ]
        .into_iter()
        .collect();

        set.retire_before(10);
        assert_eq!(spans(&set), vec![(10, 20), (30, 30)]);

        set.retire_before(30);
        assert_eq!(spans(&set), vec![(30, 30)]);

        set.retire_before(31);
        assert!(set.is_empty());
    }

    #[test]
    fn test_apply_edit_shifts_and_merges() {
        let mut set: SpanSet = [
            DamageSpan::new(0, 2),
            DamageSpan::new(10, 14),
            DamageSpan::new(50, 60),
        ]
        .into_iter()
        .collect();

        // Replace 12..20 with 3 chars: (10, 14) overlaps, (50, 60) shifts by -5.
        set.apply_edit(&TextEdit::new(12, 8, 3));
        assert_eq!(spans(&set), vec![(0, 2), (10, 15), (45, 55)]);
    }

    #[test]
    fn test_apply_edit_collapses_spans_inside_deletion() {
        let mut set: SpanSet = [DamageSpan::new(4, 6), DamageSpan::new(8, 9)]
            .into_iter()
            .collect();

        set.apply_edit(&TextEdit::new(2, 10, 0));
        assert_eq!(spans(&set), vec![(2, 2)]);
    }

    #[test]
    fn test_shift_for_edit_does_not_add_damage() {
        let mut set: SpanSet = [DamageSpan::new(20, 25)].into_iter().collect();
        set.shift_for_edit(&TextEdit::new(0, 0, 5));
        assert_eq!(spans(&set), vec![(25, 30)]);
        assert!(!set.touches(&DamageSpan::new(0, 5)));
        assert!(set.touches(&DamageSpan::new(30, 31)));
    }
}
