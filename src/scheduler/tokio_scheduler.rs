use std::time::Duration;

use super::{elapsed, BoxedTask, Scheduler, TaskHandle, TaskState};
use crate::subscription::Teardown;

/// Macrotask scheduler running work as tokio local tasks.
///
/// Must be used from inside a [`tokio::task::LocalSet`]; unsubscribing the
/// handle aborts the spawned task.
#[derive(Clone, Copy, Default, Debug)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
  #[inline]
  fn now(&self) -> Duration { elapsed() }

  fn schedule_task(&self, mut task: BoxedTask, delay: Duration) -> TaskHandle {
    let handle = TaskHandle::new();
    let c_handle = handle.downgrade();
    let join = tokio::task::spawn_local(async move {
      let mut delay = delay;
      loop {
        if delay.is_zero() {
          tokio::task::yield_now().await;
        } else {
          tokio::time::sleep(delay).await;
        }
        match task() {
          TaskState::Finished => break,
          TaskState::Yield => delay = Duration::ZERO,
          TaskState::Sleeping(d) => delay = d,
        }
      }
      if let Some(handle) = c_handle.upgrade() {
        handle.unsubscribe();
      }
    });
    handle.add(Teardown::from_fn(move || join.abort()));
    handle
  }
}
