#![warn(missing_docs)]
//! Scope Reparse - Incremental, Time-Sliced Scope Highlighting Kernel
//!
//! # Overview
//!
//! `scope-reparse` keeps the syntax-scope highlighting of a live code editor consistent with a
//! document that is being edited, without ever blocking the UI thread for more than a small
//! slice. Edits record damage; damage is re-parsed line by line in time-bounded cycles that the
//! host runs from its own event loop; results reach the renderer in atomic batches.
//!
//! # Core Features
//!
//! - **Damage Coalescing**: ordered interval set, O(log n + k) insertion
//! - **Line-Local Parsing**: each line resumes from the previous line's end state
//! - **Forward Propagation**: state changes ripple down one line per work unit
//! - **Bounded Cycles**: time budget plus optional unit cap, long lines split into windows
//! - **Atomic Publishing**: renderers only ever see regions of fully parsed lines
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Host Glue (ReparseDocument, TaskPoster)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Document Session + Scheduler FSM           │  ← Time Slicing
//! ├─────────────────────────────────────────────┤
//! │  Scope Highlight Cache                      │  ← Rendering Data
//! ├─────────────────────────────────────────────┤
//! │  Incremental Parser + Line Lexer            │  ← Parse State
//! ├─────────────────────────────────────────────┤
//! │  Re-parse Queue (Damage Intervals)          │  ← Work List
//! ├─────────────────────────────────────────────┤
//! │  Edit Buffer (Rope-based Line Index)        │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use scope_reparse::{LocalTaskQueue, ReparseConfig, ReparseDocument};
//! use std::rc::Rc;
//!
//! let tasks = LocalTaskQueue::new();
//! let doc = ReparseDocument::on_open(
//!     "class A {\n  int x;\n}",
//!     ReparseConfig::default(),
//!     Rc::new(tasks.clone()),
//! );
//!
//! // The host loop runs the posted reparse cycles.
//! tasks.run_until_idle(100);
//! assert!(!doc.is_reparse_pending());
//! assert_eq!(doc.get_scope_regions()[0].descriptor.depth, 1);
//!
//! // Open a block comment; the damage propagates forward on the next cycles.
//! doc.on_edit(0..0, "/* ").unwrap();
//! assert!(doc.is_reparse_pending());
//! tasks.run_until_idle(100);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - edit buffer and line splices
//! - [`intervals`] - damage spans and the coalescing span set
//! - [`queue`] - re-parse work list
//! - [`lexer`] - line lexer trait and the configurable lexer
//! - [`parser`] - per-line parse states and forward propagation
//! - [`scope`] - committed scope regions
//! - [`scheduler`] - scheduling state machine and clocks
//! - [`session`] - one open document
//! - [`host`] - task posting and the collaborator-facing handle

pub mod buffer;
pub mod config;
pub mod delta;
pub mod error;
pub mod host;
pub mod intervals;
pub mod lexer;
pub mod line_index;
pub mod parser;
pub mod queue;
pub mod scheduler;
pub mod scope;
pub mod session;

pub use buffer::{AppliedEdit, EditBuffer};
pub use config::{FlushPolicy, ReparseConfig};
pub use delta::TextEdit;
pub use error::{LexError, ReparseError};
pub use host::{LocalTaskQueue, ReparseDocument, Task, TaskPoster};
pub use intervals::{DamageSpan, SpanSet};
pub use lexer::{
    ConfigLexer, LexMode, LexState, LineLexer, ScopeKind, ScopeSegment, push_segment,
};
pub use line_index::LineIndex;
pub use parser::{IncrementalParser, LineState, ParseStep, StepStatus};
pub use queue::{ReparseQueue, WorkUnit};
pub use scheduler::{
    Clock, CycleOutcome, CycleReport, ReparseScheduler, SchedulerState, StepClock, SystemClock,
    Waker,
};
pub use scope::{
    HighlightDescriptor, SCOPE_STYLE_ID_BASE, ScopeBatch, ScopeHighlightCache, ScopeRegion,
};
pub use scope_reparse_lang::{CommentConfig, LanguageConfig};
pub use session::{DocumentSession, ScopeCallback};
