use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use super::Subject;
use crate::{
  error::RxError, observable::Observable, observer::Observer, scheduler::Scheduler,
  subscriber::Subscriber, subscription::Subscription,
};

type Clock = Rc<dyn Fn() -> Duration>;

struct ReplayBuffer<T> {
  // value plus the time it stops being replayed
  values: VecDeque<(T, Duration)>,
  size: usize,
  window: Option<Duration>,
}

impl<T> ReplayBuffer<T> {
  fn trim(&mut self, now: Duration) {
    while self.values.len() > self.size {
      self.values.pop_front();
    }
    if self.window.is_some() {
      while self.values.front().is_some_and(|(_, expires)| *expires <= now) {
        self.values.pop_front();
      }
    }
  }
}

/// A subject that records past values and replays them to every new
/// subscriber before it joins the live fan-out.
///
/// The buffer is bounded by a count and optionally by age; age is measured on
/// the scheduler given to [`ReplaySubject::with_window`].
pub struct ReplaySubject<T, E = RxError> {
  subject: Subject<T, E>,
  buffer: Rc<RefCell<ReplayBuffer<T>>>,
  clock: Option<Clock>,
}

impl<T, E> Clone for ReplaySubject<T, E> {
  fn clone(&self) -> Self {
    Self { subject: self.subject.clone(), buffer: self.buffer.clone(), clock: self.clock.clone() }
  }
}

impl<T: Clone + 'static, E: Clone + 'static> ReplaySubject<T, E> {
  /// Replays at most `buffer_size` of the latest values. A size of zero
  /// still keeps the latest one.
  pub fn new(buffer_size: usize) -> Self {
    let buffer = ReplayBuffer { values: VecDeque::new(), size: buffer_size.max(1), window: None };
    Self { subject: Subject::new(), buffer: Rc::new(RefCell::new(buffer)), clock: None }
  }

  /// Replays at most `buffer_size` values, each for no longer than `window`
  /// after it was pushed.
  pub fn with_window(buffer_size: usize, window: Duration, scheduler: impl Scheduler) -> Self {
    let buffer =
      ReplayBuffer { values: VecDeque::new(), size: buffer_size.max(1), window: Some(window) };
    let clock: Clock = Rc::new(move || scheduler.now());
    Self { subject: Subject::new(), buffer: Rc::new(RefCell::new(buffer)), clock: Some(clock) }
  }

  fn now(&self) -> Duration { self.clock.as_ref().map_or(Duration::ZERO, |now| now()) }

  pub fn try_next(&self, value: T) -> Result<(), RxError> {
    if self.subject.is_closed() {
      return Err(RxError::ObjectUnsubscribed);
    }
    let now = self.now();
    {
      let mut buffer = self.buffer.borrow_mut();
      if !self.subject.is_stopped() {
        let expires = buffer.window.map_or(Duration::MAX, |w| now + w);
        buffer.values.push_back((value.clone(), expires));
      }
      buffer.trim(now);
    }
    self.subject.try_next(value)
  }

  pub fn next(&self, value: T) {
    if let Err(err) = self.try_next(value) {
      tracing::warn!(%err, "next called on a disposed subject");
    }
  }

  #[inline]
  pub fn error(&self, err: E) { self.subject.error(err) }

  #[inline]
  pub fn complete(&self) { self.subject.complete() }

  #[inline]
  pub fn unsubscribe(&self) { self.subject.unsubscribe() }

  #[inline]
  pub fn observer_count(&self) -> usize { self.subject.observer_count() }

  #[inline]
  pub fn is_stopped(&self) -> bool { self.subject.is_stopped() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.subject.is_closed() }

  pub fn subscribe_with(&self, subscriber: Subscriber<T, E>) -> Subscription {
    if self.subject.admit(&subscriber) {
      let replay: Vec<T> = {
        let mut buffer = self.buffer.borrow_mut();
        buffer.trim(self.now());
        buffer.values.iter().map(|(v, _)| v.clone()).collect()
      };
      self.subject.inner_subscribe(&subscriber);
      for value in replay {
        if subscriber.is_closed() {
          break;
        }
        subscriber.next(value);
      }
      self.subject.check_finalized(&subscriber);
    }
    subscriber.subscription().clone()
  }

  pub fn as_observable(&self) -> Observable<T, E> {
    let subject = self.clone();
    Observable::create(move |subscriber| subject.subscribe_with(subscriber))
  }
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for ReplaySubject<T, E> {
  #[inline]
  fn next(&mut self, value: T) { ReplaySubject::next(self, value) }

  #[inline]
  fn error(&mut self, err: E) { ReplaySubject::error(self, err) }

  #[inline]
  fn complete(&mut self) { ReplaySubject::complete(self) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    scheduler::VirtualTimeScheduler,
    subject::tests::{record, Log},
  };

  #[test]
  fn replays_latest_values_to_late_subscriber() {
    let log = Log::default();
    let subject = ReplaySubject::<i32, &'static str>::new(2);
    subject.next(1);
    subject.next(2);
    subject.next(3);
    record(&subject.as_observable(), &log, "late");
    subject.next(4);
    assert_eq!(*log.borrow(), vec!["late 2", "late 3", "late 4"]);
  }

  #[test]
  fn zero_buffer_size_keeps_the_latest_value() {
    let log = Log::default();
    let subject = ReplaySubject::<i32, &'static str>::new(0);
    subject.next(1);
    subject.next(2);
    record(&subject.as_observable(), &log, "late");
    assert_eq!(*log.borrow(), vec!["late 2"]);

    let scheduler = VirtualTimeScheduler::new();
    let windowed = ReplaySubject::<i32, &'static str>::with_window(
      0,
      Duration::from_millis(100),
      scheduler.clone(),
    );
    windowed.next(1);
    windowed.next(2);
    record(&windowed.as_observable(), &log, "windowed");
    assert_eq!(*log.borrow(), vec!["late 2", "windowed 2"]);
  }

  #[test]
  fn replays_before_terminal_notification() {
    let log = Log::default();
    let subject = ReplaySubject::<i32, &'static str>::new(usize::MAX);
    subject.next(1);
    subject.next(2);
    subject.complete();
    subject.next(3);
    record(&subject.as_observable(), &log, "late");
    assert_eq!(*log.borrow(), vec!["late 1", "late 2", "late complete"]);
  }

  #[test]
  fn expired_values_are_not_replayed() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = ReplaySubject::<&'static str, &'static str>::with_window(
      10,
      Duration::from_millis(100),
      scheduler.clone(),
    );
    subject.next("old");
    scheduler.advance_by(Duration::from_millis(60));
    subject.next("fresh");
    scheduler.advance_by(Duration::from_millis(50));

    let log = Log::default();
    record(&subject.as_observable(), &log, "late");
    assert_eq!(*log.borrow(), vec!["late \"fresh\""]);
  }
}
