//! Cooperative re-parse scheduler.
//!
//! The scheduler is a small state machine. It never runs work by itself: it asks the host to
//! post a task (through the waker) and the host calls back into the document, which brackets
//! each cycle with [`ReparseScheduler::begin_cycle`] and [`ReparseScheduler::end_cycle`].
//!
//! ```text
//!   Idle ──request──▶ ScheduledPending ──begin──▶ Running
//!    ▲                        ▲                      │
//!    └──── queue empty ───────┼──────────────────────┤
//!                             └── queue not empty ───┘
//! ```

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Scheduler state of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Nothing to do, no task posted.
    #[default]
    Idle,
    /// A task is posted and will run a cycle.
    ScheduledPending,
    /// A cycle is executing.
    Running,
}

/// Callback that posts one follow-up task to the host.
pub type Waker = Box<dyn Fn()>;

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Work remains; a follow-up task was requested.
    Rescheduled,
    /// The queue drained.
    Idle,
    /// No cycle was pending (stale task, or the document was closed).
    Skipped,
}

/// Diagnostics for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Work units processed.
    pub units: usize,
    /// Units dropped after a lexer failure.
    pub dropped_units: usize,
    /// Time spent, as measured by the document clock.
    pub elapsed: Duration,
    /// How the cycle ended.
    pub outcome: CycleOutcome,
    /// Whether a batch was committed to the highlight cache.
    pub committed: bool,
}

impl CycleReport {
    /// Report for a cycle that did not run.
    pub fn skipped() -> Self {
        Self {
            units: 0,
            dropped_units: 0,
            elapsed: Duration::ZERO,
            outcome: CycleOutcome::Skipped,
            committed: false,
        }
    }
}

/// Source of time for cycle budgets.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock that advances by a fixed step on every reading.
#[derive(Debug, Clone)]
pub struct StepClock {
    origin: Instant,
    step: Duration,
    ticks: Cell<u32>,
}

impl StepClock {
    /// Clock advancing `step` per [`now`](Clock::now) call.
    pub fn new(step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            step,
            ticks: Cell::new(0),
        }
    }

    /// Number of readings so far.
    pub fn readings(&self) -> u32 {
        self.ticks.get()
    }
}

impl Clock for StepClock {
    fn now(&self) -> Instant {
        let ticks = self.ticks.get();
        self.ticks.set(ticks.saturating_add(1));
        self.origin + self.step * ticks
    }
}

/// Scheduling state machine of one document.
#[derive(Default)]
pub struct ReparseScheduler {
    state: SchedulerState,
    waker: Option<Waker>,
    tasks_posted: u64,
    cycles_run: u64,
}

impl ReparseScheduler {
    /// Create an idle scheduler without a waker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the callback that posts follow-up tasks.
    ///
    /// If a request is already pending it is delivered to the new waker right away.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
        if self.state == SchedulerState::ScheduledPending {
            self.wake();
        }
    }

    /// Ask for a cycle.
    ///
    /// Returns `true` when a task was requested, `false` when the request was absorbed by one
    /// already pending or by the running cycle (whose end checks the queue again).
    pub fn request_schedule(&mut self) -> bool {
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::ScheduledPending;
                self.wake();
                true
            }
            SchedulerState::ScheduledPending | SchedulerState::Running => false,
        }
    }

    /// Enter `Running`; returns `false` if no cycle is pending.
    pub fn begin_cycle(&mut self) -> bool {
        if self.state != SchedulerState::ScheduledPending {
            return false;
        }
        self.state = SchedulerState::Running;
        self.cycles_run += 1;
        true
    }

    /// Leave `Running`, rescheduling when work remains.
    pub fn end_cycle(&mut self, queue_empty: bool) -> CycleOutcome {
        if queue_empty {
            self.state = SchedulerState::Idle;
            CycleOutcome::Idle
        } else {
            self.state = SchedulerState::ScheduledPending;
            self.wake();
            CycleOutcome::Rescheduled
        }
    }

    /// Stop scheduling: back to `Idle` and drop the waker.
    pub fn cancel(&mut self) {
        self.state = SchedulerState::Idle;
        self.waker = None;
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether a cycle is pending or running.
    pub fn is_pending(&self) -> bool {
        self.state != SchedulerState::Idle
    }

    /// Tasks requested from the host so far.
    pub fn tasks_posted(&self) -> u64 {
        self.tasks_posted
    }

    /// Cycles started so far.
    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    fn wake(&mut self) {
        if let Some(waker) = &self.waker {
            self.tasks_posted += 1;
            waker();
        }
    }
}

impl std::fmt::Debug for ReparseScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReparseScheduler")
            .field("state", &self.state)
            .field("has_waker", &self.waker.is_some())
            .field("tasks_posted", &self.tasks_posted)
            .field("cycles_run", &self.cycles_run)
            .finish()
    }
}
