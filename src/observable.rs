//! Lazy, reusable producers of push-based value sequences.
use std::rc::Rc;

use crate::{
  error::RxError,
  observer::{FnObserver, Observer},
  subscriber::Subscriber,
  subscription::{Subscription, Teardown},
};

mod create;
pub use create::*;
mod timer;
pub use timer::*;
mod to_future;
pub use to_future::*;
#[cfg(feature = "futures-scheduler")]
mod from_stream;
#[cfg(feature = "futures-scheduler")]
pub use from_stream::*;

type Producer<T, E> = dyn Fn(Subscriber<T, E>) -> Result<Teardown, E>;

/// A representation of any set of values over any amount of time.
///
/// An observable is only a description: nothing runs until it is subscribed,
/// and every subscription runs the producer again with a fresh
/// [`Subscriber`]. Cloning is cheap and shares the producer.
pub struct Observable<T, E = RxError> {
  producer: Rc<Producer<T, E>>,
}

impl<T, E> Clone for Observable<T, E> {
  fn clone(&self) -> Self { Self { producer: self.producer.clone() } }
}

impl<T: 'static, E: 'static> Observable<T, E> {
  /// param `producer`: the function that is called when the Observable is
  /// subscribed to. It is given a Subscriber, to which new values can be
  /// `next`ed, or an `error` method can be called to raise an error, or
  /// `complete` can be called to notify of a successful completion. The
  /// returned teardown runs when the subscription ends.
  pub fn create<R>(producer: impl Fn(Subscriber<T, E>) -> R + 'static) -> Self
  where
    R: Into<Teardown>,
  {
    Self { producer: Rc::new(move |subscriber| Ok(producer(subscriber).into())) }
  }

  /// Like [`Observable::create`], but a producer returning `Err` has that
  /// error delivered to the subscriber.
  pub fn try_create<R>(producer: impl Fn(Subscriber<T, E>) -> Result<R, E> + 'static) -> Self
  where
    R: Into<Teardown>,
  {
    Self { producer: Rc::new(move |subscriber| producer(subscriber).map(Into::into)) }
  }

  /// Runs the producer against `subscriber` and returns its subscription.
  pub fn subscribe_with(&self, subscriber: Subscriber<T, E>) -> Subscription {
    match (self.producer)(subscriber.clone()) {
      Ok(teardown) => {
        subscriber.add(teardown);
      }
      Err(err) => subscriber.error(err),
    }
    subscriber.subscription().clone()
  }

  pub fn subscribe_observer(&self, observer: impl Observer<T, E> + 'static) -> Subscription {
    self.subscribe_with(Subscriber::new(observer))
  }

  /// Subscribes with a `next` callback only; errors go to the unhandled-error
  /// sink.
  pub fn subscribe(&self, next: impl FnMut(T) + 'static) -> Subscription {
    self.subscribe_observer(FnObserver::new().on_next(next))
  }

  pub fn subscribe_err(
    &self, next: impl FnMut(T) + 'static, error: impl FnOnce(E) + 'static,
  ) -> Subscription {
    self.subscribe_observer(FnObserver::new().on_next(next).on_error(error))
  }

  pub fn subscribe_complete(
    &self, next: impl FnMut(T) + 'static, complete: impl FnOnce() + 'static,
  ) -> Subscription {
    self.subscribe_observer(FnObserver::new().on_next(next).on_complete(complete))
  }

  pub fn subscribe_all(
    &self, next: impl FnMut(T) + 'static, error: impl FnOnce(E) + 'static,
    complete: impl FnOnce() + 'static,
  ) -> Subscription {
    self.subscribe_observer(
      FnObserver::new()
        .on_next(next)
        .on_error(error)
        .on_complete(complete),
    )
  }

  /// Creates a new observable whose subscribers are handed to `operator`
  /// together with this source. The operator subscribes to the source with
  /// its own subscriber and forwards transformed notifications downstream.
  pub fn lift<R: 'static, E2: 'static, D>(
    self, operator: impl Fn(&Observable<T, E>, Subscriber<R, E2>) -> D + 'static,
  ) -> Observable<R, E2>
  where
    D: Into<Teardown>,
  {
    Observable::create(move |subscriber| operator(&self, subscriber))
  }

  /// Applies `f` to this observable. Chaining `pipe` calls composes operator
  /// functions left to right.
  #[inline]
  pub fn pipe<R>(self, f: impl FnOnce(Self) -> R) -> R { f(self) }

  /// Subscribes `observer` to this source as an operator stage feeding
  /// `downstream`: cancelling `downstream` cancels the stage.
  pub(crate) fn subscribe_stage<R: 'static, E2: 'static>(
    &self, downstream: &Subscriber<R, E2>, observer: impl Observer<T, E> + 'static,
  ) -> Subscription {
    self.subscribe_with(Subscriber::with_parent(observer, downstream.subscription()))
  }
}

/// Composes operator functions left to right:
/// `pipe!(source, f, g)` is `g(f(source))`.
///
/// ```rust
/// use rxcore::{pipe, prelude::*};
///
/// let doubled = |o: Observable<i32>| o.map(|v| v * 2);
/// let odd = |o: Observable<i32>| o.filter(|v| v % 2 == 1);
/// let log = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
/// let c_log = log.clone();
/// pipe!(observable::from_iter(1..=3), odd, doubled).subscribe(move |v| c_log.borrow_mut().push(v));
/// assert_eq!(*log.borrow(), vec![2, 6]);
/// ```
#[macro_export]
macro_rules! pipe {
  ($source:expr $(,)?) => { $source };
  ($source:expr, $op:expr $(, $rest:expr)* $(,)?) => {
    $crate::pipe!(($op)($source) $(, $rest)*)
  };
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  #[test]
  fn each_subscription_runs_the_producer() {
    let runs = Rc::new(RefCell::new(0));
    let c_runs = runs.clone();
    let source = Observable::<i32, ()>::create(move |subscriber| {
      *c_runs.borrow_mut() += 1;
      subscriber.next(1);
      subscriber.complete();
    });

    source.subscribe(|_| {});
    source.clone().subscribe(|_| {});
    assert_eq!(*runs.borrow(), 2);
  }

  #[test]
  fn producer_teardown_runs_on_unsubscribe() {
    let torn_down = Rc::new(RefCell::new(false));
    let c_torn_down = torn_down.clone();
    let source = Observable::<i32, ()>::create(move |_| {
      let flag = c_torn_down.clone();
      Teardown::from_fn(move || *flag.borrow_mut() = true)
    });

    let subscription = source.subscribe(|_| {});
    assert!(!*torn_down.borrow());
    subscription.unsubscribe();
    assert!(*torn_down.borrow());
  }

  #[test]
  fn teardown_runs_after_synchronous_completion() {
    let torn_down = Rc::new(RefCell::new(false));
    let c_torn_down = torn_down.clone();
    let source = Observable::<i32, ()>::create(move |subscriber| {
      subscriber.complete();
      let flag = c_torn_down.clone();
      Teardown::from_fn(move || *flag.borrow_mut() = true)
    });

    let subscription = source.subscribe(|_| {});
    assert!(subscription.is_closed());
    assert!(*torn_down.borrow());
  }

  #[test]
  fn producer_failure_becomes_error_notification() {
    let errors = Rc::new(RefCell::new(vec![]));
    let c_errors = errors.clone();
    let source = Observable::<i32, &str>::try_create(|subscriber| {
      subscriber.next(1);
      Err::<(), _>("producer failed")
    });

    source.subscribe_err(|_| {}, move |e| c_errors.borrow_mut().push(e));
    assert_eq!(*errors.borrow(), vec!["producer failed"]);
  }

  #[test]
  fn producer_failure_after_completion_is_dropped() {
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (log.clone(), log.clone());
    let source = Observable::<i32, &str>::try_create(|subscriber| {
      subscriber.complete();
      Err::<(), _>("late")
    });

    source.subscribe_all(
      |_| {},
      move |e| c1.borrow_mut().push(e),
      move || c2.borrow_mut().push("complete"),
    );
    assert_eq!(*log.borrow(), vec!["complete"]);
  }

  #[test]
  fn lift_and_pipe_compose_left_to_right() {
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    let add_one = |o: Observable<i32, ()>| {
      o.lift(|source, downstream: Subscriber<i32, ()>| {
        let c_down = downstream.clone();
        let c_complete = downstream.clone();
        source.subscribe_stage(
          &downstream,
          FnObserver::new()
            .on_next(move |v: i32| c_down.next(v + 1))
            .on_complete(move || c_complete.complete()),
        )
      })
    };
    let times_ten = |o: Observable<i32, ()>| {
      Observable::create(move |downstream: Subscriber<i32, ()>| {
        let c_down = downstream.clone();
        o.subscribe_stage(&downstream, FnObserver::new().on_next(move |v: i32| c_down.next(v * 10)))
      })
    };

    crate::pipe!(of(1), add_one, times_ten).subscribe(move |v| c_log.borrow_mut().push(v));
    of(1).pipe(times_ten).pipe(add_one).subscribe({
      let log = log.clone();
      move |v| log.borrow_mut().push(v)
    });
    assert_eq!(*log.borrow(), vec![20, 11]);
  }

  #[test]
  fn downstream_cancellation_reaches_source() {
    let torn_down = Rc::new(RefCell::new(false));
    let c_torn_down = torn_down.clone();
    let source = Observable::<i32, ()>::create(move |_| {
      let flag = c_torn_down.clone();
      Teardown::from_fn(move || *flag.borrow_mut() = true)
    });
    let lifted = source.lift(|source, downstream: Subscriber<i32, ()>| {
      let c_down = downstream.clone();
      source.subscribe_stage(&downstream, FnObserver::new().on_next(move |v| c_down.next(v)))
    });

    let subscription = lifted.subscribe(|_| {});
    subscription.unsubscribe();
    assert!(*torn_down.borrow());
  }
}
