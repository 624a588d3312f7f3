use std::time::Duration;

use crate::{observable::Observable, observer::Observer, scheduler::Scheduler, subscriber::Subscriber};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Re-emits every notification of the source from a task on `scheduler`.
  ///
  /// Pending deliveries are children of the downstream subscription, so
  /// unsubscribing drops them along with the source.
  ///
  /// ```
  /// use rxcore::prelude::*;
  ///
  /// let scheduler = VirtualTimeScheduler::new();
  /// let seen = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
  /// let c_seen = seen.clone();
  /// observable::of::<_, RxError>(1)
  ///   .observe_on(scheduler.clone())
  ///   .subscribe(move |v: i32| c_seen.borrow_mut().push(v));
  ///
  /// assert!(seen.borrow().is_empty());
  /// scheduler.flush();
  /// assert_eq!(*seen.borrow(), vec![1]);
  /// ```
  pub fn observe_on(self, scheduler: impl Scheduler) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      let observer = ObserveOnObserver { scheduler: scheduler.clone(), downstream: downstream.clone() };
      source.subscribe_stage(&downstream, observer)
    })
  }
}

struct ObserveOnObserver<S, T, E> {
  scheduler: S,
  downstream: Subscriber<T, E>,
}

impl<S: Scheduler, T: 'static, E: 'static> ObserveOnObserver<S, T, E> {
  fn deliver(&self, f: impl FnOnce(&Subscriber<T, E>) + 'static) {
    if self.downstream.is_closed() {
      return;
    }
    let downstream = self.downstream.clone();
    let handle = self.scheduler.schedule_once(Duration::ZERO, move || f(&downstream));
    self.downstream.add(&handle);
  }
}

impl<S: Scheduler, T: 'static, E: 'static> Observer<T, E> for ObserveOnObserver<S, T, E> {
  fn next(&mut self, value: T) { self.deliver(move |d| d.next(value)) }

  fn error(&mut self, err: E) { self.deliver(move |d| d.error(err)) }

  fn complete(&mut self) { self.deliver(|d| d.complete()) }
}

#[cfg(test)]
mod tests {
  use crate::{
    notification::Notification::*,
    observable,
    ops::test_util::Recorder,
    scheduler::{QueueScheduler, Scheduler, VirtualTimeScheduler},
  };
  use std::{cell::RefCell, rc::Rc, time::Duration};

  #[test]
  fn delivery_waits_for_the_scheduler() {
    let scheduler = VirtualTimeScheduler::new();
    let recorder = Recorder::<i32, ()>::new();
    observable::from_iter(1..=3)
      .observe_on(scheduler.clone())
      .subscribe_observer(recorder.clone());

    assert_eq!(recorder.len(), 0);
    assert_eq!(scheduler.pending_count(), 4);
    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next(1), Next(2), Next(3), Complete]);
  }

  #[test]
  fn unsubscribe_drops_pending_deliveries() {
    let scheduler = VirtualTimeScheduler::new();
    let recorder = Recorder::<i32, ()>::new();
    let subscription = observable::from_iter(1..=3)
      .observe_on(scheduler.clone())
      .subscribe_observer(recorder.clone());

    subscription.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.flush();
    assert_eq!(recorder.len(), 0);
  }

  #[test]
  fn queue_scheduler_defers_nested_emissions() {
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    let inner_log = log.clone();
    QueueScheduler.schedule_once(Duration::ZERO, move || {
      observable::from_iter::<_, ()>(1..=2)
        .observe_on(QueueScheduler)
        .subscribe(move |v: i32| inner_log.borrow_mut().push(v));
      c_log.borrow_mut().push(0);
    });
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
  }
}
