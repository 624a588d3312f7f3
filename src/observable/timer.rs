use std::time::Duration;

use super::Observable;
use crate::{
  scheduler::{Scheduler, Task, TaskState},
  subscriber::Subscriber,
};

/// Returns an observable which emits `0` once after `delay` on `scheduler`,
/// then completes.
pub fn timer<E: 'static, S: Scheduler>(delay: Duration, scheduler: S) -> Observable<usize, E> {
  Observable::create(move |subscriber: Subscriber<usize, E>| {
    scheduler.schedule_once(delay, move || {
      subscriber.next(0);
      subscriber.complete();
    })
  })
}

/// Returns an observable which emits an increasing counter every `period` on
/// `scheduler`. It never completes; the periodic task stops once the
/// subscriber is closed.
pub fn interval<E: 'static, S: Scheduler>(period: Duration, scheduler: S) -> Observable<usize, E> {
  Observable::create(move |subscriber: Subscriber<usize, E>| {
    let task = Task::new(0usize, move |count| {
      if subscriber.is_closed() {
        return TaskState::Finished;
      }
      subscriber.next(*count);
      *count += 1;
      TaskState::Sleeping(period)
    });
    scheduler.schedule(task, Some(period))
  })
}
