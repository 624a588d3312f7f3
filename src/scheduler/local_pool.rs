use std::time::Duration;

use futures::{
  executor::LocalSpawner,
  future::{AbortHandle, Abortable},
  task::LocalSpawnExt,
};

use super::{elapsed, BoxedTask, Scheduler, TaskHandle, TaskState};
use crate::subscription::Teardown;

/// Macrotask scheduler backed by a `futures` [`LocalPool`](futures::executor::LocalPool).
///
/// Work is spawned onto the pool and only runs when the pool is driven, never
/// synchronously inside `schedule`. Delays are `futures-time` timers, so
/// ordering between independently scheduled tasks follows their wall-clock
/// due times only.
#[derive(Clone)]
pub struct LocalPoolScheduler {
  spawner: LocalSpawner,
}

impl LocalPoolScheduler {
  pub fn new(spawner: LocalSpawner) -> Self { Self { spawner } }
}

impl From<LocalSpawner> for LocalPoolScheduler {
  fn from(spawner: LocalSpawner) -> Self { Self::new(spawner) }
}

impl Scheduler for LocalPoolScheduler {
  #[inline]
  fn now(&self) -> Duration { elapsed() }

  fn schedule_task(&self, mut task: BoxedTask, delay: Duration) -> TaskHandle {
    let handle = TaskHandle::new();
    let (abort, registration) = AbortHandle::new_pair();
    handle.add(Teardown::from_fn(move || abort.abort()));

    let c_handle = handle.downgrade();
    let work = async move {
      let mut delay = delay;
      loop {
        if !delay.is_zero() {
          futures_time::task::sleep(delay.into()).await;
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
    };

    if let Err(err) = self.spawner.spawn_local(async move {
      let _ = Abortable::new(work, registration).await;
    }) {
      tracing::warn!(%err, "failed to spawn scheduled task");
      handle.unsubscribe();
    }
    handle
  }
}
