//! Host integration.
//!
//! The host owns a single-threaded task queue (its UI event loop). A [`ReparseDocument`] posts
//! one task per pending cycle through a [`TaskPoster`]; the task holds only a weak reference to
//! the document, so tasks that outlive [`ReparseDocument::on_close`] do nothing.

use crate::config::ReparseConfig;
use crate::delta::TextEdit;
use crate::error::ReparseError;
use crate::scope::{ScopeBatch, ScopeRegion};
use crate::session::DocumentSession;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::Range;
use std::rc::{Rc, Weak};

/// A unit of deferred work run by the host loop.
pub type Task = Box<dyn FnOnce()>;

/// The host's cooperative scheduling primitive.
pub trait TaskPoster {
    /// Run `task` later, after currently queued events.
    fn post_task(&self, task: Task);
}

/// FIFO task queue for hosts without an event loop of their own (and for tests).
#[derive(Clone, Default)]
pub struct LocalTaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl LocalTaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether no task is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run the oldest task; returns `false` if there was none.
    pub fn run_next(&self) -> bool {
        // The borrow must end before the task runs, since it may post more tasks.
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty or `max_turns` ran. Returns the number run.
    pub fn run_until_idle(&self, max_turns: usize) -> usize {
        let mut turns = 0;
        while turns < max_turns && self.run_next() {
            turns += 1;
        }
        turns
    }
}

impl TaskPoster for LocalTaskQueue {
    fn post_task(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for LocalTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTaskQueue")
            .field("len", &self.len())
            .finish()
    }
}

/// Collaborator-facing handle of one open document.
pub struct ReparseDocument {
    session: Option<Rc<RefCell<DocumentSession>>>,
}

impl ReparseDocument {
    /// Open a document and schedule its initial parse on `poster`.
    pub fn on_open(initial_text: &str, config: ReparseConfig, poster: Rc<dyn TaskPoster>) -> Self {
        Self::on_open_with(DocumentSession::new(initial_text, config), poster)
    }

    /// Open a pre-built session (custom lexer or clock) and schedule its pending work.
    pub fn on_open_with(session: DocumentSession, poster: Rc<dyn TaskPoster>) -> Self {
        let session = Rc::new(RefCell::new(session));
        let weak = Rc::downgrade(&session);
        session
            .borrow_mut()
            .set_waker(Box::new(move || post_cycle(&poster, weak.clone())));
        Self {
            session: Some(session),
        }
    }

    /// Close the document; already posted tasks become no-ops.
    pub fn on_close(&mut self) {
        if let Some(session) = self.session.take() {
            session.borrow_mut().close();
        }
    }

    /// Apply an edit from the host.
    pub fn on_edit(&self, range: Range<usize>, new_text: &str) -> Result<TextEdit, ReparseError> {
        self.with_session_mut(|session| session.apply_edit(range, new_text))?
    }

    /// Toggle scope highlighting.
    pub fn set_highlighting_enabled(&self, enabled: bool) -> Result<(), ReparseError> {
        self.with_session_mut(|session| session.set_highlighting_enabled(enabled))
    }

    /// Change the tint strength.
    pub fn set_scope_strength(&self, strength: u8) -> Result<(), ReparseError> {
        self.with_session_mut(|session| session.set_scope_strength(strength))
    }

    /// Queue the whole document for re-parsing.
    pub fn request_reparse(&self) -> Result<(), ReparseError> {
        self.with_session_mut(|session| session.request_full_reparse())
    }

    /// Register a renderer callback.
    ///
    /// Callbacks run inside the document's cycle and must not call back into this handle.
    pub fn subscribe<F>(&self, callback: F) -> Result<(), ReparseError>
    where
        F: FnMut(&ScopeBatch) + 'static,
    {
        self.with_session_mut(|session| session.subscribe(callback))
    }

    /// Committed regions (empty once closed).
    pub fn get_scope_regions(&self) -> Vec<ScopeRegion> {
        self.with_session(|session| session.get_scope_regions())
            .unwrap_or_default()
    }

    /// Whether a cycle is pending or running.
    pub fn is_reparse_pending(&self) -> bool {
        self.with_session(|session| session.is_reparse_pending())
            .unwrap_or(false)
    }

    /// Whether [`on_close`](Self::on_close) was called.
    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Read access to the session.
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&DocumentSession) -> R,
    ) -> Result<R, ReparseError> {
        let session = self.session.as_ref().ok_or(ReparseError::DocumentClosed)?;
        Ok(f(&session.borrow()))
    }

    fn with_session_mut<R>(
        &self,
        f: impl FnOnce(&mut DocumentSession) -> R,
    ) -> Result<R, ReparseError> {
        let session = self.session.as_ref().ok_or(ReparseError::DocumentClosed)?;
        Ok(f(&mut session.borrow_mut()))
    }
}

impl Drop for ReparseDocument {
    fn drop(&mut self) {
        self.on_close();
    }
}

fn post_cycle(poster: &Rc<dyn TaskPoster>, session: Weak<RefCell<DocumentSession>>) {
    poster.post_task(Box::new(move || match session.upgrade() {
        Some(session) => {
            session.borrow_mut().run_cycle();
        }
        None => tracing::trace!("document closed before its reparse task ran"),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(text: &str) -> (ReparseDocument, LocalTaskQueue) {
        let tasks = LocalTaskQueue::new();
        let doc = ReparseDocument::on_open(text, ReparseConfig::default(), Rc::new(tasks.clone()));
        (doc, tasks)
    }

    #[test]
    fn test_open_posts_one_task() {
        let (doc, tasks) = open("{ x }");
        assert_eq!(tasks.len(), 1);
        assert!(doc.is_reparse_pending());

        assert_eq!(tasks.run_until_idle(10), 1);
        assert!(!doc.is_reparse_pending());
        assert_eq!(doc.get_scope_regions().len(), 1);
    }

    #[test]
    fn test_edits_coalesce_into_one_task() {
        let (doc, tasks) = open("");
        tasks.run_until_idle(10);

        for i in 0..20 {
            doc.on_edit(i..i, "{").unwrap();
        }
        assert_eq!(tasks.len(), 1);

        tasks.run_until_idle(10);
        assert!(!doc.is_reparse_pending());
        let depth = doc
            .with_session(|session| session.line_state(0).map(|s| s.end.depth))
            .unwrap();
        assert_eq!(depth, Some(20));
    }

    #[test]
    fn test_close_turns_posted_tasks_into_no_ops() {
        let (mut doc, tasks) = open("class A {}");
        doc.on_close();
        assert_eq!(tasks.len(), 1);
        assert!(tasks.run_next());
        assert!(tasks.is_empty());

        assert!(doc.is_closed());
        assert!(matches!(
            doc.on_edit(0..0, "x"),
            Err(ReparseError::DocumentClosed)
        ));
        assert!(doc.get_scope_regions().is_empty());
    }

    #[test]
    fn test_drop_closes_document() {
        let tasks = LocalTaskQueue::new();
        {
            let _doc = ReparseDocument::on_open("x", ReparseConfig::default(), Rc::new(tasks.clone()));
        }
        assert_eq!(tasks.run_until_idle(10), 1);
    }
}
