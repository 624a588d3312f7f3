use std::time::Duration;

use super::{elapsed, BoxedTask, Scheduler, TaskHandle, TaskState};
use crate::subscription::Subscription;

/// Runs work synchronously on the calling thread at schedule time.
///
/// Delays block the thread. A task that asks to run again is looped in place,
/// so the returned handle is always already closed.
#[derive(Clone, Copy, Default, Debug)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  #[inline]
  fn now(&self) -> Duration { elapsed() }

  fn schedule_task(&self, mut task: BoxedTask, delay: Duration) -> TaskHandle {
    let mut delay = delay;
    loop {
      if !delay.is_zero() {
        std::thread::sleep(delay);
      }
      match task() {
        TaskState::Finished => break,
        TaskState::Yield => delay = Duration::ZERO,
        TaskState::Sleeping(d) => delay = d,
      }
    }
    Subscription::closed()
  }
}
