use std::{
  cell::RefCell,
  future::Future,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll, Waker},
};

use super::Observable;
use crate::{
  error::RxError, observer::Observer, subscriber::Subscriber, subscription::Subscription,
};

struct Shared<T, E> {
  latest: Option<T>,
  outcome: Option<Result<T, E>>,
  waker: Option<Waker>,
}

impl<T, E> Shared<T, E> {
  fn settle(&mut self, outcome: Result<T, E>) {
    if self.outcome.is_none() {
      self.outcome = Some(outcome);
      if let Some(waker) = self.waker.take() {
        waker.wake();
      }
    }
  }
}

struct ValueObserver<T, E> {
  shared: Rc<RefCell<Shared<T, E>>>,
  first: bool,
  subscription: Subscription,
}

impl<T, E: From<RxError>> Observer<T, E> for ValueObserver<T, E> {
  fn next(&mut self, value: T) {
    if self.first {
      self.shared.borrow_mut().settle(Ok(value));
      self.subscription.unsubscribe();
    } else {
      self.shared.borrow_mut().latest = Some(value);
    }
  }

  fn error(&mut self, err: E) { self.shared.borrow_mut().settle(Err(err)); }

  fn complete(&mut self) {
    let mut shared = self.shared.borrow_mut();
    let outcome = shared.latest.take().ok_or_else(|| RxError::Empty.into());
    shared.settle(outcome);
  }
}

/// Future resolving to a value taken from an observable; see
/// [`first_value_from`] and [`last_value_from`].
///
/// The source is subscribed when the future is created, not when it is first
/// polled. Dropping the future unsubscribes.
#[must_use = "futures do nothing unless polled"]
pub struct ValueFuture<T, E> {
  shared: Rc<RefCell<Shared<T, E>>>,
  subscription: Subscription,
}

impl<T, E> Future for ValueFuture<T, E> {
  type Output = Result<T, E>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut shared = self.shared.borrow_mut();
    match shared.outcome.take() {
      Some(outcome) => Poll::Ready(outcome),
      None => {
        shared.waker = Some(cx.waker().clone());
        Poll::Pending
      }
    }
  }
}

impl<T, E> Drop for ValueFuture<T, E> {
  fn drop(&mut self) { self.subscription.unsubscribe(); }
}

fn value_future<T, E>(source: &Observable<T, E>, first: bool) -> ValueFuture<T, E>
where
  T: 'static,
  E: From<RxError> + 'static,
{
  let shared = Rc::new(RefCell::new(Shared { latest: None, outcome: None, waker: None }));
  let subscription = Subscription::new();
  let observer =
    ValueObserver { shared: shared.clone(), first, subscription: subscription.clone() };
  source.subscribe_with(Subscriber::with_parent(observer, &subscription));
  ValueFuture { shared, subscription }
}

/// Resolves with the first value of `source` and unsubscribes, or with
/// `RxError::Empty` if the source completes without emitting.
///
/// ```
/// use rxcore::prelude::*;
///
/// let value = futures::executor::block_on(first_value_from(&observable::from_iter::<_, RxError>(5..9)));
/// assert_eq!(value, Ok(5));
/// ```
pub fn first_value_from<T, E>(source: &Observable<T, E>) -> ValueFuture<T, E>
where
  T: 'static,
  E: From<RxError> + 'static,
{
  value_future(source, true)
}

/// Resolves with the last value of `source` once it completes, or with
/// `RxError::Empty` if it completes without emitting.
pub fn last_value_from<T, E>(source: &Observable<T, E>) -> ValueFuture<T, E>
where
  T: 'static,
  E: From<RxError> + 'static,
{
  value_future(source, false)
}
