use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use crate::{
  config,
  notification::{Notification, NotificationKind},
  observer::{BoxedObserver, Observer},
  subscription::{Subscription, Teardown, TeardownId},
};

/// An observer bound to its own [`Subscription`]. Every observer handed to
/// `subscribe` is wrapped in one.
///
/// Once `error` or `complete` has been delivered the subscriber is closed and
/// every further call is dropped. Closing releases the wrapped observer so
/// callback captures do not outlive the subscription.
///
/// A call that arrives while the wrapped observer is still running an earlier
/// callback (for example a subject emitting into itself) is queued and
/// delivered, in order, as soon as that callback returns.
pub struct Subscriber<T, E> {
  inner: Rc<SubscriberInner<T, E>>,
}

struct SubscriberInner<T, E> {
  subscription: Subscription,
  stopped: Cell<bool>,
  destination: RefCell<Option<BoxedObserver<T, E>>>,
  backlog: RefCell<VecDeque<Notification<T, E>>>,
}

impl<T, E> SubscriberInner<T, E> {
  fn release(&self) {
    self.stopped.set(true);
    if let Ok(mut destination) = self.destination.try_borrow_mut() {
      destination.take();
    }
    if let Ok(mut backlog) = self.backlog.try_borrow_mut() {
      backlog.clear();
    }
  }
}

impl<T, E> Clone for Subscriber<T, E> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<T: 'static, E: 'static> Subscriber<T, E> {
  pub fn new(observer: impl Observer<T, E> + 'static) -> Self {
    let inner = Rc::new(SubscriberInner {
      subscription: Subscription::new(),
      stopped: Cell::new(false),
      destination: RefCell::new(Some(Box::new(observer))),
      backlog: RefCell::new(VecDeque::new()),
    });
    let weak = Rc::downgrade(&inner);
    inner.subscription.add(Teardown::from_fn(move || {
      if let Some(inner) = weak.upgrade() {
        inner.release();
      }
    }));
    Subscriber { inner }
  }

  /// Creates a subscriber registered as a child of `parent`, so cancelling
  /// `parent` also cancels it.
  pub fn with_parent(observer: impl Observer<T, E> + 'static, parent: &Subscription) -> Self {
    let subscriber = Self::new(observer);
    parent.add(subscriber.subscription());
    subscriber
  }

  pub fn next(&self, value: T) {
    if self.inner.stopped.get() {
      config::report_stopped_notification(NotificationKind::Next);
    } else {
      self.deliver(Notification::Next(value));
    }
  }

  pub fn error(&self, err: E) {
    if self.inner.stopped.replace(true) {
      config::report_stopped_notification(NotificationKind::Error);
    } else {
      self.deliver(Notification::Error(err));
    }
  }

  pub fn complete(&self) {
    if self.inner.stopped.replace(true) {
      config::report_stopped_notification(NotificationKind::Complete);
    } else {
      self.deliver(Notification::Complete);
    }
  }

  fn deliver(&self, notification: Notification<T, E>) {
    let inner = &*self.inner;
    let Ok(mut destination) = inner.destination.try_borrow_mut() else {
      inner.backlog.borrow_mut().push_back(notification);
      return;
    };

    let mut terminated = false;
    let mut pending = Some(notification);
    while let Some(notification) = pending.take() {
      terminated |= notification.is_terminal();
      if let Some(observer) = destination.as_mut() {
        notification.observe(observer);
      }
      if terminated || inner.subscription.is_closed() {
        *destination = None;
      }
      pending = inner.backlog.borrow_mut().pop_front();
    }
    drop(destination);

    if terminated {
      inner.subscription.unsubscribe();
    }
  }
}

impl<T, E> Subscriber<T, E> {
  /// `true` once a terminal notification was received or the subscription
  /// was cancelled.
  #[inline]
  pub fn is_closed(&self) -> bool { self.inner.stopped.get() || self.inner.subscription.is_closed() }

  #[inline]
  pub fn subscription(&self) -> &Subscription { &self.inner.subscription }

  #[inline]
  pub fn add(&self, teardown: impl Into<Teardown>) -> TeardownId {
    self.inner.subscription.add(teardown)
  }

  #[inline]
  pub fn unsubscribe(&self) { self.inner.subscription.unsubscribe() }
}

impl<T: 'static, E: 'static> Observer<T, E> for Subscriber<T, E> {
  #[inline]
  fn next(&mut self, value: T) { Subscriber::next(self, value) }

  #[inline]
  fn error(&mut self, err: E) { Subscriber::error(self, err) }

  #[inline]
  fn complete(&mut self) { Subscriber::complete(self) }
}
