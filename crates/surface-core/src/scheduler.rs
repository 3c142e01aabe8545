//! Delayed callbacks on the dispatch thread
//!
//! Tasks are plain data; the controller interprets them when they fall due in
//! [`Scheduler::take_due`]. Nothing runs before its due time, and ordering
//! against events processed in the meantime is not guaranteed.

use crate::modes::ModeId;
use std::time::{Duration, Instant};

/// Delay before a page name is shown after a page change
pub const PAGE_NAME_DELAY: Duration = Duration::from_millis(200);

/// Work deferred to a later tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Notify the current page name of a mode's bank
    ShowPageName(ModeId),
}

/// Handle returned by [`Scheduler::schedule`], used to cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Pending {
    handle: TaskHandle,
    due: Instant,
    task: ScheduledTask,
}

/// Per-controller queue of delayed tasks
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
    next_handle: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task to run at `now + delay`
    pub fn schedule(&mut self, now: Instant, delay: Duration, task: ScheduledTask) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        log::trace!("scheduler: {:?} due in {:?}", task, delay);
        self.pending.push(Pending {
            handle,
            due: now + delay,
            task,
        });
        handle
    }

    /// Drop a pending task; returns false if it already ran or was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        before != self.pending.len()
    }

    /// Remove and return every task due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<ScheduledTask> {
        let mut due: Vec<Pending> = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            if pending.due <= now {
                due.push(pending);
            } else {
                remaining.push(pending);
            }
        }
        self.pending = remaining;
        due.sort_by_key(|p| (p.due, p.handle.0));
        due.into_iter().map(|p| p.task).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
