use std::time::Duration;

use crate::{observable::Observable, scheduler::Scheduler};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Subscribes to the source from a task on `scheduler` instead of during
  /// the call to `subscribe`.
  pub fn subscribe_on(self, scheduler: impl Scheduler) -> Observable<T, E> {
    self.subscribe_on_after(Duration::ZERO, scheduler)
  }

  /// Like [`subscribe_on`](Observable::subscribe_on), with the subscription
  /// postponed by `delay`.
  pub fn subscribe_on_after(self, delay: Duration, scheduler: impl Scheduler) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      let source = source.clone();
      let c_downstream = downstream.clone();
      let handle = scheduler.schedule_once(delay, move || {
        source.subscribe_with(c_downstream);
      });
      downstream.add(&handle);
    })
  }
}
