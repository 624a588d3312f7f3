//! Hot multicast hubs that are both an observable and an observer.
//!
//! Every variant shares the [`Subject`] core: an insertion-ordered observer
//! list and a status that moves from active to errored or completed exactly
//! once. Once terminal, `next` is a no-op and late subscribers immediately
//! receive the terminal notification instead of joining the list.
use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use crate::{
  error::RxError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  subscription::{Subscription, Teardown},
};

mod subscribers;
use subscribers::{broadcast_complete, broadcast_error, broadcast_value, Subscribers};

mod async_subject;
mod behavior_subject;
mod replay_subject;
pub use async_subject::AsyncSubject;
pub use behavior_subject::BehaviorSubject;
pub use replay_subject::ReplaySubject;

enum Status<E> {
  Active,
  Errored(E),
  Completed,
}

struct SubjectState<T, E> {
  observers: Subscribers<T, E>,
  status: Status<E>,
  disposed: bool,
}

/// A plain multicast subject: values pushed with `next` reach every observer
/// subscribed at that moment. Late subscribers see no past values.
///
/// ```
/// use rxcore::prelude::*;
///
/// let subject = Subject::<i32, ()>::new();
/// subject.next(1);
/// subject.as_observable().subscribe(|v| println!("{v}"));
/// subject.next(2);
/// // prints: 2
/// ```
pub struct Subject<T, E = RxError> {
  state: Rc<RefCell<SubjectState<T, E>>>,
}

impl<T, E> Clone for Subject<T, E> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

impl<T: Clone + 'static, E: Clone + 'static> Default for Subject<T, E> {
  fn default() -> Self { Self::new() }
}

impl<T: Clone + 'static, E: Clone + 'static> Subject<T, E> {
  pub fn new() -> Self {
    let state = SubjectState { observers: Subscribers::default(), status: Status::Active, disposed: false };
    Self { state: Rc::new(RefCell::new(state)) }
  }

  /// Pushes `value` to every current observer. Ignored once the subject is
  /// stopped; fails with [`RxError::ObjectUnsubscribed`] once it is disposed.
  pub fn try_next(&self, value: T) -> Result<(), RxError> {
    let observers = {
      let state = self.state.borrow();
      if state.disposed {
        return Err(RxError::ObjectUnsubscribed);
      }
      if !matches!(state.status, Status::Active) {
        return Ok(());
      }
      state.observers.snapshot()
    };
    broadcast_value(observers, value);
    Ok(())
  }

  /// Like [`Subject::try_next`], logging instead of failing on a disposed
  /// subject.
  pub fn next(&self, value: T) {
    if let Err(err) = self.try_next(value) {
      tracing::warn!(%err, "next called on a disposed subject");
    }
  }

  pub fn error(&self, err: E) {
    let observers = {
      let mut state = self.state.borrow_mut();
      if state.disposed || !matches!(state.status, Status::Active) {
        return;
      }
      state.status = Status::Errored(err.clone());
      state.observers.drain()
    };
    tracing::debug!(observers = observers.len(), "subject errored");
    broadcast_error(observers, err);
  }

  pub fn complete(&self) {
    let observers = {
      let mut state = self.state.borrow_mut();
      if state.disposed || !matches!(state.status, Status::Active) {
        return;
      }
      state.status = Status::Completed;
      state.observers.drain()
    };
    tracing::debug!(observers = observers.len(), "subject completed");
    broadcast_complete(observers);
  }

  /// Disposes the subject: observers are dropped without any notification
  /// and further use fails with [`RxError::ObjectUnsubscribed`].
  pub fn unsubscribe(&self) {
    let dropped = {
      let mut state = self.state.borrow_mut();
      state.disposed = true;
      state.observers.drain()
    };
    tracing::debug!(observers = dropped.len(), "subject disposed");
  }

  pub fn observer_count(&self) -> usize { self.state.borrow().observers.len() }

  /// `true` once the subject errored or completed.
  pub fn is_stopped(&self) -> bool { !matches!(self.state.borrow().status, Status::Active) }

  /// `true` once the subject was disposed with [`Subject::unsubscribe`].
  pub fn is_closed(&self) -> bool { self.state.borrow().disposed }

  pub fn subscribe_with(&self, subscriber: Subscriber<T, E>) -> Subscription {
    if self.admit(&subscriber) && !self.check_finalized(&subscriber) {
      self.inner_subscribe(&subscriber);
    }
    subscriber.subscription().clone()
  }

  /// A cold-looking view of this subject; subscribing to it joins the
  /// subject's observer list.
  pub fn as_observable(&self) -> Observable<T, E> {
    let subject = self.clone();
    Observable::create(move |subscriber| subject.subscribe_with(subscriber))
  }

  /// Closes `subscriber` and returns `false` if the subject is disposed.
  pub(crate) fn admit(&self, subscriber: &Subscriber<T, E>) -> bool {
    if self.is_closed() {
      tracing::warn!("subscribe called on a disposed subject");
      subscriber.unsubscribe();
      return false;
    }
    true
  }

  /// Delivers the terminal notification to `subscriber` if the subject has
  /// stopped. Returns whether it had.
  pub(crate) fn check_finalized(&self, subscriber: &Subscriber<T, E>) -> bool {
    let terminal = match &self.state.borrow().status {
      Status::Active => return false,
      Status::Errored(err) => Some(err.clone()),
      Status::Completed => None,
    };
    match terminal {
      Some(err) => subscriber.error(err),
      None => subscriber.complete(),
    }
    true
  }

  /// Adds `subscriber` to the observer list while the subject is active.
  /// Returns whether it was added.
  pub(crate) fn inner_subscribe(&self, subscriber: &Subscriber<T, E>) -> bool {
    let id = {
      let mut state = self.state.borrow_mut();
      if state.disposed || !matches!(state.status, Status::Active) || subscriber.is_closed() {
        return false;
      }
      state.observers.add(subscriber.clone())
    };
    let weak: Weak<RefCell<SubjectState<T, E>>> = Rc::downgrade(&self.state);
    subscriber.add(Teardown::from_fn(move || {
      if let Some(state) = weak.upgrade() {
        let removed = state.borrow_mut().observers.remove(id);
        drop(removed);
      }
    }));
    true
  }
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for Subject<T, E> {
  #[inline]
  fn next(&mut self, value: T) { Subject::next(self, value) }

  #[inline]
  fn error(&mut self, err: E) { Subject::error(self, err) }

  #[inline]
  fn complete(&mut self) { Subject::complete(self) }
}
