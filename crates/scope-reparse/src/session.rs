//! Document session.
//!
//! `DocumentSession` wires the buffer, queue, parser, highlight cache and scheduler of one open
//! document together. It is single-threaded and never blocks: every call returns after a bounded
//! amount of work, and [`DocumentSession::run_cycle`] is what the host's posted task invokes.

use crate::buffer::EditBuffer;
use crate::config::{FlushPolicy, ReparseConfig};
use crate::delta::TextEdit;
use crate::error::ReparseError;
use crate::lexer::{ConfigLexer, LineLexer};
use crate::parser::{IncrementalParser, LineState, StepStatus};
use crate::queue::ReparseQueue;
use crate::scheduler::{Clock, CycleReport, ReparseScheduler, SchedulerState, SystemClock, Waker};
use crate::scope::{ScopeBatch, ScopeHighlightCache, ScopeRegion};
use std::ops::Range;
use std::time::Duration;

/// Renderer callback receiving every committed [`ScopeBatch`].
pub type ScopeCallback = Box<dyn FnMut(&ScopeBatch)>;

/// All re-parse state of one open document.
pub struct DocumentSession {
    config: ReparseConfig,
    buffer: EditBuffer,
    queue: ReparseQueue,
    parser: IncrementalParser,
    cache: ScopeHighlightCache,
    scheduler: ReparseScheduler,
    clock: Box<dyn Clock>,
    subscribers: Vec<ScopeCallback>,
    closed: bool,
}

impl DocumentSession {
    /// Open a document using the default (Java) lexer.
    pub fn new(text: &str, config: ReparseConfig) -> Self {
        Self::with_lexer(text, config, Box::new(ConfigLexer::default()))
    }

    /// Open a document with a custom lexer.
    ///
    /// The whole document is queued and a cycle is requested; the request reaches the host once
    /// a waker is installed.
    pub fn with_lexer(text: &str, config: ReparseConfig, lexer: Box<dyn LineLexer>) -> Self {
        let config = config.normalized();
        let buffer = EditBuffer::new(text);
        let parser = IncrementalParser::new(lexer, buffer.line_count(), config.max_unit_chars);
        let cache = ScopeHighlightCache::new(config.scope_strength);

        let mut session = Self {
            config,
            buffer,
            queue: ReparseQueue::new(),
            parser,
            cache,
            scheduler: ReparseScheduler::new(),
            clock: Box::new(SystemClock),
            subscribers: Vec::new(),
            closed: false,
        };
        session.queue.push(session.buffer.full_span());
        session.scheduler.request_schedule();
        tracing::debug!(
            chars = session.buffer.len_chars(),
            lines = session.buffer.line_count(),
            "opened document"
        );
        session
    }

    /// Replace the clock used to measure cycle budgets.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Install the callback that posts follow-up tasks to the host.
    pub fn set_waker(&mut self, waker: Waker) {
        self.scheduler.set_waker(waker);
    }

    /// Register a renderer callback.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&ScopeBatch) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Replace `range` with `text`, queue the damage and request a cycle.
    pub fn apply_edit(&mut self, range: Range<usize>, text: &str) -> Result<TextEdit, ReparseError> {
        if self.closed {
            return Err(ReparseError::DocumentClosed);
        }
        let applied = self.buffer.apply_edit(range, text)?;

        self.queue.apply_edit(&applied.edit);
        self.queue.push(self.buffer.lines_span(applied.dirty_lines()));
        self.parser.apply_edit(&applied);
        self.cache.apply_edit(&applied.edit);

        tracing::debug!(
            version = self.buffer.version(),
            start = applied.edit.start,
            old_len = applied.edit.old_len,
            new_len = applied.edit.new_len,
            queued = self.queue.len(),
            "applied edit"
        );
        self.scheduler.request_schedule();
        Ok(applied.edit)
    }

    /// Run one time-sliced cycle.
    ///
    /// Processes work units until the queue drains, the time budget is spent or the unit cap
    /// is reached. The first unit of a cycle always runs, so a zero budget still makes progress.
    pub fn run_cycle(&mut self) -> CycleReport {
        if !self.scheduler.begin_cycle() {
            tracing::trace!(state = ?self.scheduler.state(), "no cycle pending");
            return CycleReport::skipped();
        }

        let budget = self.config.time_budget();
        let cap = self.config.max_units_per_cycle;
        let started = self.clock.now();
        let mut now = started;
        let mut units = 0;
        let mut dropped_units = 0;

        while !self.queue.is_empty() {
            let elapsed = now.saturating_duration_since(started);
            if units > 0 && elapsed >= budget {
                break;
            }
            if cap.is_some_and(|cap| units >= cap) {
                break;
            }
            let remaining = if units == 0 {
                budget.saturating_sub(elapsed).max(Duration::from_nanos(1))
            } else {
                budget.saturating_sub(elapsed)
            };

            let Some(step) = self
                .parser
                .process_next(&mut self.queue, &self.buffer, remaining)
            else {
                break;
            };
            units += 1;
            if matches!(step.status, StepStatus::Dropped(_)) {
                dropped_units += 1;
            }
            if self.config.highlighting_enabled
                && let Some(line) = step.updated_region
            {
                self.cache.stage(self.buffer.line_span(line));
            }
            now = self.clock.now();
        }

        let queue_empty = self.queue.is_empty();
        let batch = if !self.config.highlighting_enabled {
            None
        } else if queue_empty {
            self.cache.commit(&self.buffer, &self.parser, false)
        } else if self.config.flush_policy == FlushPolicy::EveryCycle {
            self.cache.commit(&self.buffer, &self.parser, true)
        } else {
            None
        };
        let committed = batch.is_some();
        if let Some(batch) = batch {
            self.publish(&batch);
        }

        let outcome = self.scheduler.end_cycle(queue_empty);
        let elapsed = now.saturating_duration_since(started);
        tracing::trace!(
            units,
            dropped_units,
            elapsed_us = elapsed.as_micros() as u64,
            queued = self.queue.len(),
            ?outcome,
            "reparse cycle"
        );

        CycleReport {
            units,
            dropped_units,
            elapsed,
            outcome,
            committed,
        }
    }

    /// Run cycles until the scheduler goes idle or `max_cycles` ran.
    ///
    /// For hosts that drive the session directly instead of through posted tasks.
    pub fn run_until_idle(&mut self, max_cycles: usize) -> usize {
        let mut cycles = 0;
        while cycles < max_cycles && self.scheduler.state() == SchedulerState::ScheduledPending {
            self.run_cycle();
            cycles += 1;
        }
        cycles
    }

    /// Turn scope highlighting on or off.
    ///
    /// Any change re-evaluates the whole document once. Turning it off also clears the
    /// committed regions and tells subscribers so.
    pub fn set_highlighting_enabled(&mut self, enabled: bool) {
        if self.closed || self.config.highlighting_enabled == enabled {
            return;
        }
        self.config.highlighting_enabled = enabled;
        if !enabled {
            let batch = self.cache.clear();
            self.publish(&batch);
        }
        self.reevaluate_all();
    }

    /// Change the tint strength (0-100) of committed and future regions.
    ///
    /// Strength 0 is a plain tint: regions stay committed and published with zero strength.
    /// Use [`set_highlighting_enabled`](Self::set_highlighting_enabled) to stop painting.
    pub fn set_scope_strength(&mut self, strength: u8) {
        self.config.scope_strength = strength.min(100);
        if let Some(batch) = self.cache.set_strength(strength)
            && self.config.highlighting_enabled
        {
            self.publish(&batch);
        }
    }

    /// Change the per-cycle time budget.
    pub fn set_time_budget(&mut self, budget_ms: u64) {
        self.config.time_budget_ms = budget_ms;
    }

    /// Change when committed highlight updates are published.
    pub fn set_flush_policy(&mut self, policy: FlushPolicy) {
        self.config.flush_policy = policy;
    }

    /// Queue the whole document for re-parsing.
    pub fn request_full_reparse(&mut self) {
        if !self.closed {
            self.reevaluate_all();
        }
    }

    /// Stop all future work and drop subscribers.
    pub fn close(&mut self) {
        self.closed = true;
        self.scheduler.cancel();
        self.queue.clear();
        self.subscribers.clear();
        tracing::debug!(version = self.buffer.version(), "closed document");
    }

    /// Committed regions, ordered by start.
    pub fn scope_regions(&self) -> &[ScopeRegion] {
        self.cache.regions()
    }

    /// Owned copy of the committed regions.
    pub fn get_scope_regions(&self) -> Vec<ScopeRegion> {
        self.cache.regions().to_vec()
    }

    /// Whether a cycle is pending or running.
    pub fn is_reparse_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Current scheduler state.
    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Scheduler (for its counters).
    pub fn scheduler(&self) -> &ReparseScheduler {
        &self.scheduler
    }

    /// Parse state of `line`.
    pub fn line_state(&self, line: usize) -> Option<&LineState> {
        self.parser.line(line)
    }

    /// Parser.
    pub fn parser(&self) -> &IncrementalParser {
        &self.parser
    }

    /// Pending damage.
    pub fn queue(&self) -> &ReparseQueue {
        &self.queue
    }

    /// Highlight cache.
    pub fn cache(&self) -> &ScopeHighlightCache {
        &self.cache
    }

    /// Document buffer.
    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    /// Complete document text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Current configuration.
    pub fn config(&self) -> &ReparseConfig {
        &self.config
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn reevaluate_all(&mut self) {
        self.parser.mark_all_stale();
        self.queue.push(self.buffer.full_span());
        tracing::debug!(
            lines = self.buffer.line_count(),
            highlighting = self.config.highlighting_enabled,
            "full re-evaluation"
        );
        self.scheduler.request_schedule();
    }

    fn publish(&mut self, batch: &ScopeBatch) {
        for callback in &mut self.subscribers {
            callback(batch);
        }
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("config", &self.config)
            .field("version", &self.buffer.version())
            .field("queue", &self.queue)
            .field("scheduler", &self.scheduler)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::ScopeKind;
    use crate::scheduler::{CycleOutcome, StepClock};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(session: &mut DocumentSession) -> Rc<RefCell<Vec<ScopeBatch>>> {
        let batches = Rc::new(RefCell::new(Vec::new()));
        let sink = batches.clone();
        session.subscribe(move |batch| sink.borrow_mut().push(batch.clone()));
        batches
    }

    #[test]
    fn test_open_parses_whole_document() {
        let mut session = DocumentSession::new("class A {\n  int x;\n}", ReparseConfig::default());
        assert!(session.is_reparse_pending());

        let report = session.run_cycle();
        assert_eq!(report.outcome, CycleOutcome::Idle);
        assert_eq!(report.units, 3);
        assert!(report.committed);
        assert!(!session.is_reparse_pending());

        let regions = session.get_scope_regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].range, 10..18);
        assert_eq!(regions[0].descriptor.depth, 1);
    }

    #[test]
    fn test_stale_task_is_skipped() {
        let mut session = DocumentSession::new("x", ReparseConfig::default());
        session.run_cycle();
        assert_eq!(session.run_cycle().outcome, CycleOutcome::Skipped);
    }

    #[test]
    fn test_on_idle_publishes_one_batch() {
        let config = ReparseConfig::default().with_max_units_per_cycle(Some(2));
        let mut session = DocumentSession::new("{\n{\n{\n}\n}\n}", config);
        let batches = recorder(&mut session);

        assert_eq!(session.run_until_idle(100), 3);
        assert_eq!(batches.borrow().len(), 1);
        assert_eq!(batches.borrow()[0].regions.len(), 4);
    }

    #[test]
    fn test_every_cycle_publishes_progress() {
        let config = ReparseConfig::default()
            .with_max_units_per_cycle(Some(2))
            .with_flush_policy(FlushPolicy::EveryCycle);
        let mut session = DocumentSession::new("{\n{\n{\n}\n}\n}", config);
        let batches = recorder(&mut session);

        session.run_until_idle(100);
        assert_eq!(batches.borrow().len(), 3);
        let generations: Vec<u64> = batches.borrow().iter().map(|b| b.generation).collect();
        assert_eq!(generations, vec![1, 2, 3]);
    }

    #[test]
    fn test_zero_budget_still_progresses() {
        let config = ReparseConfig::default().with_time_budget_ms(0);
        let mut session = DocumentSession::new("a\nb\nc", config)
            .with_clock(StepClock::new(Duration::from_millis(1)));

        let report = session.run_cycle();
        assert_eq!(report.units, 1);
        assert_eq!(report.outcome, CycleOutcome::Rescheduled);
        assert_eq!(session.run_until_idle(10), 2);
    }

    #[test]
    fn test_edit_errors() {
        let mut session = DocumentSession::new("abc", ReparseConfig::default());
        assert!(matches!(
            session.apply_edit(1..10, "x"),
            Err(ReparseError::EditOutOfBounds { .. })
        ));
        assert_eq!(session.text(), "abc");

        session.close();
        assert!(matches!(
            session.apply_edit(0..0, "x"),
            Err(ReparseError::DocumentClosed)
        ));
        assert!(!session.is_reparse_pending());
    }

    #[test]
    fn test_disable_clears_and_enable_republishes() {
        let mut session = DocumentSession::new("{ /* c */ }", ReparseConfig::default());
        session.run_until_idle(10);
        assert!(!session.scope_regions().is_empty());
        let batches = recorder(&mut session);

        session.set_highlighting_enabled(false);
        assert!(session.scope_regions().is_empty());
        assert!(batches.borrow()[0].cleared);
        assert!(session.is_reparse_pending());
        session.run_until_idle(10);
        assert_eq!(batches.borrow().len(), 1);
        assert!(session.scope_regions().is_empty());

        session.set_highlighting_enabled(true);
        session.run_until_idle(10);
        assert_eq!(batches.borrow().len(), 2);
        let kinds: Vec<ScopeKind> = session
            .scope_regions()
            .iter()
            .map(|region| region.descriptor.kind)
            .collect();
        assert_eq!(kinds, vec![ScopeKind::Code, ScopeKind::Comment, ScopeKind::Code]);
    }

    #[test]
    fn test_strength_retints_without_reparse() {
        let mut session = DocumentSession::new("{x}", ReparseConfig::default());
        session.run_until_idle(10);
        let batches = recorder(&mut session);

        session.set_scope_strength(60);
        assert!(!session.is_reparse_pending());
        assert_eq!(batches.borrow().len(), 1);
        assert_eq!(session.scope_regions()[0].descriptor.strength, 60);
        assert_eq!(session.config().scope_strength, 60);
    }

    #[test]
    fn test_zero_strength_is_a_plain_tint() {
        let mut session = DocumentSession::new("{x}", ReparseConfig::default());
        session.run_until_idle(10);
        let batches = recorder(&mut session);

        session.set_scope_strength(0);
        assert!(session.config().highlighting_enabled);
        assert_eq!(batches.borrow().len(), 1);
        assert!(!batches.borrow()[0].cleared);
        assert_eq!(session.scope_regions().len(), 1);
        assert_eq!(session.scope_regions()[0].descriptor.strength, 0);
    }

    #[test]
    fn test_time_budget_applies_to_the_next_cycle() {
        let config = ReparseConfig::default().with_max_units_per_cycle(None);
        let mut session = DocumentSession::new("a\nb\nc\nd\ne", config)
            .with_clock(StepClock::new(Duration::from_millis(1)));

        session.set_time_budget(2);
        assert_eq!(session.config().time_budget(), Duration::from_millis(2));
        let report = session.run_cycle();
        assert_eq!(report.units, 2);
        assert_eq!(report.outcome, CycleOutcome::Rescheduled);

        session.set_time_budget(60_000);
        let report = session.run_cycle();
        assert_eq!(report.units, 3);
        assert_eq!(report.outcome, CycleOutcome::Idle);
    }

    #[test]
    fn test_flush_policy_switch_takes_effect_mid_drain() {
        let config = ReparseConfig::default().with_max_units_per_cycle(Some(2));
        let mut session = DocumentSession::new("{\n{\n{\n}\n}\n}", config);
        let batches = recorder(&mut session);

        assert!(!session.run_cycle().committed);
        session.set_flush_policy(FlushPolicy::EveryCycle);
        assert_eq!(session.config().flush_policy, FlushPolicy::EveryCycle);
        assert!(session.run_cycle().committed);
        assert_eq!(batches.borrow().len(), 1);

        session.run_until_idle(10);
        assert_eq!(batches.borrow().len(), 2);
        assert_eq!(session.scope_regions().len(), 4);
    }
}
