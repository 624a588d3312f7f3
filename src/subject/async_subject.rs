use std::{cell::RefCell, rc::Rc};

use super::Subject;
use crate::{
  error::RxError, observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::Subscription,
};

struct Latch<T> {
  value: Option<T>,
  completed: bool,
}

/// A subject that withholds values and, on completion, emits only the last
/// one followed by `complete`, to current and future subscribers alike. An
/// error discards the held value.
pub struct AsyncSubject<T, E = RxError> {
  subject: Subject<T, E>,
  latch: Rc<RefCell<Latch<T>>>,
}

impl<T, E> Clone for AsyncSubject<T, E> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), latch: self.latch.clone() } }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for AsyncSubject<T, E> {
  fn default() -> Self { Self::new() }
}

impl<T: Clone + 'static, E: Clone + 'static> AsyncSubject<T, E> {
  pub fn new() -> Self {
    Self { subject: Subject::new(), latch: Rc::new(RefCell::new(Latch { value: None, completed: false })) }
  }

  pub fn try_next(&self, value: T) -> Result<(), RxError> {
    if self.subject.is_closed() {
      return Err(RxError::ObjectUnsubscribed);
    }
    if !self.subject.is_stopped() {
      self.latch.borrow_mut().value = Some(value);
    }
    Ok(())
  }

  pub fn next(&self, value: T) {
    if let Err(err) = self.try_next(value) {
      tracing::warn!(%err, "next called on a disposed subject");
    }
  }

  pub fn error(&self, err: E) {
    if !self.subject.is_stopped() {
      self.latch.borrow_mut().value = None;
    }
    self.subject.error(err)
  }

  pub fn complete(&self) {
    let value = {
      let mut latch = self.latch.borrow_mut();
      if latch.completed || self.subject.is_stopped() || self.subject.is_closed() {
        return;
      }
      latch.completed = true;
      latch.value.clone()
    };
    if let Some(value) = value {
      // Delivered through the core so current observers see value then
      // complete.
      let _ = self.subject.try_next(value);
    }
    self.subject.complete();
  }

  #[inline]
  pub fn unsubscribe(&self) { self.subject.unsubscribe() }

  #[inline]
  pub fn observer_count(&self) -> usize { self.subject.observer_count() }

  #[inline]
  pub fn is_stopped(&self) -> bool { self.subject.is_stopped() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.subject.is_closed() }

  pub fn subscribe_with(&self, subscriber: Subscriber<T, E>) -> Subscription {
    if self.subject.admit(&subscriber) && !self.subject.inner_subscribe(&subscriber) {
      let value = {
        let latch = self.latch.borrow();
        if latch.completed { latch.value.clone() } else { None }
      };
      if let Some(value) = value {
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

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for AsyncSubject<T, E> {
  #[inline]
  fn next(&mut self, value: T) { AsyncSubject::next(self, value) }

  #[inline]
  fn error(&mut self, err: E) { AsyncSubject::error(self, err) }

  #[inline]
  fn complete(&mut self) { AsyncSubject::complete(self) }
}
