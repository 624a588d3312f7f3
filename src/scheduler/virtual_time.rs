//! Deterministic virtual-time scheduler for testing time-based operators.
//!
//! Virtual time only moves when the owner flushes or advances the scheduler.
//! Pending actions are ordered by `(due time, insertion index)`: due time is
//! primary and the insertion index breaks ties, so two actions due at the same
//! instant run in the order they were scheduled.
//!
//! ```rust
//! use std::time::Duration;
//! use rxcore::prelude::*;
//!
//! let scheduler = VirtualTimeScheduler::new();
//! let log = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
//! let c_log = log.clone();
//! scheduler.schedule_once(Duration::from_millis(100), move || c_log.borrow_mut().push(1));
//!
//! scheduler.advance_by(Duration::from_millis(99));
//! assert!(log.borrow().is_empty());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert_eq!(*log.borrow(), vec![1]);
//! ```
use std::{
  cell::RefCell,
  cmp::Ordering,
  collections::BinaryHeap,
  rc::{Rc, Weak},
  time::Duration,
};

use super::{BoxedTask, Scheduler, TaskHandle, TaskState};
use crate::subscription::Teardown;

// ==================== Internal State ====================

struct VirtualAction {
  due: Duration,
  index: u64,
  task: BoxedTask,
  handle: TaskHandle,
}

impl PartialEq for VirtualAction {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.index == other.index }
}

impl Eq for VirtualAction {}

impl PartialOrd for VirtualAction {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for VirtualAction {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier due first, then by insertion index
    other.due.cmp(&self.due).then_with(|| other.index.cmp(&self.index))
  }
}

#[derive(Default)]
struct VirtualState {
  now: Duration,
  queue: BinaryHeap<VirtualAction>,
  next_index: u64,
  flushing: bool,
}

impl VirtualState {
  fn push(&mut self, task: BoxedTask, handle: TaskHandle, delay: Duration) -> u64 {
    let index = self.next_index;
    self.next_index += 1;
    self.queue.push(VirtualAction { due: self.now + delay, index, task, handle });
    index
  }
}

// ==================== VirtualTimeScheduler ====================

/// A scheduler whose clock is driven explicitly. Clones share the same clock
/// and queue.
#[derive(Clone, Default)]
pub struct VirtualTimeScheduler {
  state: Rc<RefCell<VirtualState>>,
}

impl VirtualTimeScheduler {
  pub fn new() -> Self { Self::default() }

  /// Number of actions waiting to run.
  pub fn pending_count(&self) -> usize { self.state.borrow().queue.len() }

  /// Runs every pending action, including actions scheduled while flushing,
  /// until the queue is empty.
  pub fn flush(&self) { self.run_until(None) }

  /// Runs pending actions due at or before `limit`.
  pub fn flush_until(&self, limit: Duration) { self.run_until(Some(limit)) }

  /// Runs everything due up to `now() + by` and moves the clock there.
  pub fn advance_by(&self, by: Duration) {
    let target = self.now() + by;
    self.advance_to(target);
  }

  /// Runs everything due up to `time` and moves the clock there. The clock
  /// never goes backwards.
  pub fn advance_to(&self, time: Duration) {
    if self.state.borrow().flushing {
      return;
    }
    self.run_until(Some(time));
    let mut state = self.state.borrow_mut();
    state.now = state.now.max(time);
  }

  fn run_until(&self, limit: Option<Duration>) {
    struct Flushing<'a>(&'a RefCell<VirtualState>);
    impl Drop for Flushing<'_> {
      fn drop(&mut self) { self.0.borrow_mut().flushing = false; }
    }

    // A flush requested from inside a running action is served by the outer
    // loop.
    if self.state.borrow().flushing {
      return;
    }
    self.state.borrow_mut().flushing = true;
    let _flushing = Flushing(&self.state);
    tracing::trace!(?limit, "virtual time flush");

    loop {
      let next = {
        let mut state = self.state.borrow_mut();
        let due = state.queue.peek().map(|a| a.due);
        match due {
          Some(due) if limit.map_or(true, |limit| due <= limit) => {
            state.now = state.now.max(due);
            state.queue.pop()
          }
          _ => None,
        }
      };
      let Some(mut action) = next else { break };
      if action.handle.is_closed() {
        continue;
      }

      match (action.task)() {
        TaskState::Finished => action.handle.unsubscribe(),
        TaskState::Yield => self.requeue(action, Duration::ZERO),
        TaskState::Sleeping(d) => self.requeue(action, d),
      }
    }
  }

  fn requeue(&self, action: VirtualAction, delay: Duration) {
    if action.handle.is_closed() {
      return;
    }
    let VirtualAction { task, handle, .. } = action;
    self.state.borrow_mut().push(task, handle, delay);
  }
}

fn cancel(state: &Weak<RefCell<VirtualState>>, handle: &TaskHandle) {
  let Some(state) = state.upgrade() else { return };
  let removed = state.try_borrow_mut().ok().map(|mut state| {
    let actions = std::mem::take(&mut state.queue).into_vec();
    let (removed, kept): (Vec<_>, Vec<_>) =
      actions.into_iter().partition(|a| a.handle.ptr_eq(handle));
    state.queue = kept.into();
    removed
  });
  drop(removed);
}

impl Scheduler for VirtualTimeScheduler {
  #[inline]
  fn now(&self) -> Duration { self.state.borrow().now }

  fn schedule_task(&self, task: BoxedTask, delay: Duration) -> TaskHandle {
    let handle = TaskHandle::new();
    self.state.borrow_mut().push(task, handle.clone(), delay);

    let weak = Rc::downgrade(&self.state);
    let c_handle = handle.downgrade();
    handle.add(Teardown::from_fn(move || {
      if let Some(handle) = c_handle.upgrade() {
        cancel(&weak, &handle);
      }
    }));
    handle
  }
}
