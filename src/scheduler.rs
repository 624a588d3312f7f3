//! Scheduler abstraction: strategies for ordering and timing work.
//!
//! A unit of work is a [`Task`]. Instead of calling back into the scheduler to
//! run again, a task reports what should happen next through [`TaskState`];
//! every scheduler turns that into iteration, so heavy self-rescheduling never
//! grows the call stack.
//!
//! Scheduling returns a [`TaskHandle`], which is a plain [`Subscription`]:
//! unsubscribing it removes pending work from the scheduler's queue, and it can
//! be added to any teardown tree.
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use crate::subscription::Subscription;

mod immediate;
mod queue;
mod virtual_time;
pub use immediate::ImmediateScheduler;
pub use queue::QueueScheduler;
pub use virtual_time::VirtualTimeScheduler;

#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
mod local_pool;
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use local_pool::LocalPoolScheduler;

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// What a task wants after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  /// Done; the handle is closed.
  Finished,
  /// Run again as soon as the scheduler gets to it.
  Yield,
  /// Run again after the given delay.
  Sleeping(Duration),
}

/// Cancellation handle of scheduled work.
pub type TaskHandle = Subscription;

/// Type-erased task step, as stored in scheduler queues.
pub type BoxedTask = Box<dyn FnMut() -> TaskState>;

/// A work function together with the state it operates on.
pub struct Task<S> {
  state: S,
  handler: Box<dyn FnMut(&mut S) -> TaskState>,
}

impl<S> Task<S> {
  pub fn new(state: S, handler: impl FnMut(&mut S) -> TaskState + 'static) -> Self {
    Self { state, handler: Box::new(handler) }
  }

  #[inline]
  pub fn step(&mut self) -> TaskState { (self.handler)(&mut self.state) }
}

/// A strategy for ordering and timing the execution of work.
pub trait Scheduler: Clone + 'static {
  /// Time elapsed since this scheduler's origin.
  fn now(&self) -> Duration;

  /// Enqueues `task` to first run after `delay`.
  fn schedule_task(&self, task: BoxedTask, delay: Duration) -> TaskHandle;

  fn schedule<S: 'static>(&self, mut task: Task<S>, delay: Option<Duration>) -> TaskHandle {
    self.schedule_task(Box::new(move || task.step()), delay.unwrap_or_default())
  }

  /// Runs `f` once after `delay`.
  fn schedule_once(&self, delay: Duration, f: impl FnOnce() + 'static) -> TaskHandle {
    let mut f = Some(f);
    self.schedule_task(
      Box::new(move || {
        if let Some(f) = f.take() {
          f();
        }
        TaskState::Finished
      }),
      delay,
    )
  }
}

static TIME_ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Wall-clock time since the first time any real-time scheduler was asked.
pub(crate) fn elapsed() -> Duration { TIME_ORIGIN.elapsed() }

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[test]
  fn task_step_mutates_state() {
    let mut task = Task::new(0, |n| {
      *n += 1;
      if *n < 3 { TaskState::Yield } else { TaskState::Finished }
    });
    assert_eq!(task.step(), TaskState::Yield);
    assert_eq!(task.step(), TaskState::Yield);
    assert_eq!(task.step(), TaskState::Finished);
    assert_eq!(task.state, 3);
  }

  #[test]
  fn schedule_once_runs_exactly_once() {
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    let scheduler = VirtualTimeScheduler::new();
    scheduler.schedule_once(Duration::from_millis(5), move || c_log.borrow_mut().push(1));
    scheduler.flush();
    scheduler.flush();
    assert_eq!(*log.borrow(), vec![1]);
  }

  #[test]
  fn real_time_is_monotonic() {
    let a = elapsed();
    let b = elapsed();
    assert!(b >= a);
  }
}
