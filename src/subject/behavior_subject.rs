use std::{cell::RefCell, rc::Rc};

use super::Subject;
use crate::{
  error::RxError, observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::Subscription,
};

/// A subject holding a current value. Every new subscriber immediately
/// receives that value, then every later `next`.
pub struct BehaviorSubject<T, E = RxError> {
  subject: Subject<T, E>,
  value: Rc<RefCell<T>>,
}

impl<T, E> Clone for BehaviorSubject<T, E> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), value: self.value.clone() } }
}

impl<T: Clone + 'static, E: Clone + 'static> BehaviorSubject<T, E> {
  #[inline]
  pub fn new(value: T) -> Self { Self { subject: Subject::new(), value: Rc::new(RefCell::new(value)) } }

  /// The latest value passed to `next`, or the seed.
  pub fn value(&self) -> T { self.value.borrow().clone() }

  pub fn try_next(&self, value: T) -> Result<(), RxError> {
    if self.subject.is_closed() {
      return Err(RxError::ObjectUnsubscribed);
    }
    *self.value.borrow_mut() = value.clone();
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
    let subject = &self.subject;
    if subject.admit(&subscriber)
      && !subject.check_finalized(&subscriber)
      && subject.inner_subscribe(&subscriber)
      && !subscriber.is_closed()
    {
      subscriber.next(self.value());
    }
    subscriber.subscription().clone()
  }

  pub fn as_observable(&self) -> Observable<T, E> {
    let subject = self.clone();
    Observable::create(move |subscriber| subject.subscribe_with(subscriber))
  }
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for BehaviorSubject<T, E> {
  #[inline]
  fn next(&mut self, value: T) { BehaviorSubject::next(self, value) }

  #[inline]
  fn error(&mut self, err: E) { BehaviorSubject::error(self, err) }

  #[inline]
  fn complete(&mut self) { BehaviorSubject::complete(self) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subject::tests::{record, Log};

  #[test]
  fn new_subscriber_gets_current_value_first() {
    let log = Log::default();
    let subject = BehaviorSubject::<i32, &'static str>::new(0);
    record(&subject.as_observable(), &log, "a");
    subject.next(1);
    record(&subject.as_observable(), &log, "b");
    subject.next(2);

    assert_eq!(*log.borrow(), vec!["a 0", "a 1", "b 1", "a 2", "b 2"]);
    assert_eq!(subject.value(), 2);
  }

  #[test]
  fn completed_subject_only_completes_late_subscribers() {
    let log = Log::default();
    let subject = BehaviorSubject::<i32, &'static str>::new(5);
    subject.complete();
    record(&subject.as_observable(), &log, "late");
    assert_eq!(*log.borrow(), vec!["late complete"]);
  }

  #[test]
  fn disposed_subject_fails_next() {
    let subject = BehaviorSubject::<i32, ()>::new(1);
    subject.unsubscribe();
    assert_eq!(subject.try_next(2), Err(RxError::ObjectUnsubscribed));
    assert_eq!(subject.value(), 1);
  }
}
