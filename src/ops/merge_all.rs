//! Concurrency-limited flattening shared by `merge_all`, `merge_map`,
//! `concat_all` and `concat_map`.
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber, subscription::Subscription,
};

impl<T: 'static, E: 'static> Observable<Observable<T, E>, E> {
  /// Flattens a higher-order observable, subscribing to at most `concurrent`
  /// inner observables at a time. Inner observables arriving while the limit
  /// is reached wait in arrival order. Pass `usize::MAX` for no limit.
  ///
  /// Completes once the outer source and every inner observable completed;
  /// any error ends the whole stream immediately.
  pub fn merge_all(self, concurrent: usize) -> Observable<T, E> {
    self.lift(move |source, downstream| merge_internals(source, downstream, |inner| inner, concurrent))
  }

  /// Flattens one inner observable at a time, in order.
  #[inline]
  pub fn concat_all(self) -> Observable<T, E> { self.merge_all(1) }
}

struct ObserverData<S, F> {
  project: F,
  concurrent: usize,
  // Outer values waiting for a free slot.
  subscribe_tasks: VecDeque<S>,
  subscribed: usize,
  outside_completed: bool,
  draining: bool,
}

type Shared<S, F> = Rc<RefCell<ObserverData<S, F>>>;

/// Subscribes `downstream` to `source`, projecting every outer value to an
/// inner observable and merging at most `concurrent` of them at once.
pub(super) fn merge_internals<S, T, E, F>(
  source: &Observable<S, E>, downstream: Subscriber<T, E>, project: F, concurrent: usize,
) -> Subscription
where
  S: 'static,
  T: 'static,
  E: 'static,
  F: FnMut(S) -> Observable<T, E> + 'static,
{
  let data = Rc::new(RefCell::new(ObserverData {
    project,
    concurrent: concurrent.max(1),
    subscribe_tasks: VecDeque::new(),
    subscribed: 0,
    outside_completed: false,
    draining: false,
  }));
  source.subscribe_stage(&downstream, OuterObserver { data, downstream: downstream.clone() })
}

struct OuterObserver<S, T, E, F> {
  data: Shared<S, F>,
  downstream: Subscriber<T, E>,
}

impl<S, T, E, F> Observer<S, E> for OuterObserver<S, T, E, F>
where
  S: 'static,
  T: 'static,
  E: 'static,
  F: FnMut(S) -> Observable<T, E> + 'static,
{
  fn next(&mut self, value: S) {
    let inner = {
      let mut data = self.data.borrow_mut();
      if data.subscribed < data.concurrent {
        data.subscribed += 1;
        Some((data.project)(value))
      } else {
        data.subscribe_tasks.push_back(value);
        None
      }
    };
    if let Some(inner) = inner {
      subscribe_inner(&self.data, &self.downstream, inner);
    }
  }

  fn error(&mut self, err: E) { self.downstream.error(err) }

  fn complete(&mut self) {
    let draining = {
      let mut data = self.data.borrow_mut();
      data.outside_completed = true;
      data.draining
    };
    if !draining {
      check_complete(&self.data, &self.downstream);
    }
  }
}

struct InnerObserver<S, T, E, F> {
  data: Shared<S, F>,
  downstream: Subscriber<T, E>,
}

impl<S, T, E, F> Observer<T, E> for InnerObserver<S, T, E, F>
where
  S: 'static,
  T: 'static,
  E: 'static,
  F: FnMut(S) -> Observable<T, E> + 'static,
{
  #[inline]
  fn next(&mut self, value: T) { self.downstream.next(value) }

  fn error(&mut self, err: E) { self.downstream.error(err) }

  fn complete(&mut self) {
    self.data.borrow_mut().subscribed -= 1;
    drain(&self.data, &self.downstream);
  }
}

fn subscribe_inner<S, T, E, F>(data: &Shared<S, F>, downstream: &Subscriber<T, E>, inner: Observable<T, E>)
where
  S: 'static,
  T: 'static,
  E: 'static,
  F: FnMut(S) -> Observable<T, E> + 'static,
{
  let observer = InnerObserver { data: data.clone(), downstream: downstream.clone() };
  inner.subscribe_stage(downstream, observer);
}

/// Starts buffered outer values while slots are free. Inner observables
/// completing synchronously during the loop are picked up by the same loop
/// instead of recursing.
fn drain<S, T, E, F>(data: &Shared<S, F>, downstream: &Subscriber<T, E>)
where
  S: 'static,
  T: 'static,
  E: 'static,
  F: FnMut(S) -> Observable<T, E> + 'static,
{
  if data.borrow().draining {
    return;
  }
  data.borrow_mut().draining = true;
  loop {
    if downstream.is_closed() {
      break;
    }
    let inner = {
      let mut data = data.borrow_mut();
      if data.subscribed < data.concurrent {
        let value = data.subscribe_tasks.pop_front();
        value.map(|value| {
          data.subscribed += 1;
          (data.project)(value)
        })
      } else {
        None
      }
    };
    match inner {
      Some(inner) => subscribe_inner(data, downstream, inner),
      None => break,
    }
  }
  data.borrow_mut().draining = false;
  check_complete(data, downstream);
}

fn check_complete<S, F, T: 'static, E: 'static>(data: &Shared<S, F>, downstream: &Subscriber<T, E>) {
  let done = {
    let data = data.borrow();
    data.outside_completed && data.subscribe_tasks.is_empty() && data.subscribed == 0
  };
  if done {
    downstream.complete();
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use crate::{
    notification::Notification::*,
    observable::{self, Observable},
    ops::test_util::Recorder,
    scheduler::VirtualTimeScheduler,
    subject::Subject,
  };

  #[test]
  fn one_at_a_time_keeps_order() {
    let recorder = Recorder::<i32, ()>::new();
    let x = observable::from_iter(vec![1, 2]);
    let y = observable::from_iter(vec![3, 4]);
    observable::from_iter(vec![x, y]).merge_all(1).subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(1), Next(2), Next(3), Next(4), Complete]);
  }

  #[test]
  fn second_inner_waits_for_a_free_slot() {
    let (a, b) = (Subject::<&str, ()>::new(), Subject::<&str, ()>::new());
    let outer = Subject::<Observable<&str, ()>, ()>::new();
    let recorder = Recorder::new();
    outer.as_observable().concat_all().subscribe_observer(recorder.clone());

    outer.next(a.as_observable());
    outer.next(b.as_observable());
    b.next("b lost");
    a.next("a1");
    assert_eq!(b.observer_count(), 0);

    a.complete();
    assert_eq!(b.observer_count(), 1);
    b.next("b1");
    outer.complete();
    assert_eq!(recorder.len(), 2);
    b.complete();
    assert_eq!(recorder.take(), vec![Next("a1"), Next("b1"), Complete]);
  }

  #[test]
  fn unlimited_interleaves_by_time() {
    let scheduler = VirtualTimeScheduler::new();
    let recorder = Recorder::<usize, ()>::new();
    let ms = Duration::from_millis;
    observable::from_iter(vec![
      observable::interval(ms(10), scheduler.clone()).take(2),
      observable::interval(ms(15), scheduler.clone()).take(2).map(|v| v + 10),
    ])
    .merge_all(usize::MAX)
    .subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next(0), Next(10), Next(1), Next(11), Complete]);
  }

  #[test]
  fn inner_error_cancels_everything() {
    let outer = Subject::<Observable<i32, &str>, &str>::new();
    let healthy = Subject::<i32, &str>::new();
    let recorder = Recorder::new();
    outer.as_observable().merge_all(usize::MAX).subscribe_observer(recorder.clone());

    outer.next(healthy.as_observable());
    outer.next(observable::throw_err("boom"));
    healthy.next(1);
    assert_eq!(recorder.take(), vec![Error("boom")]);
    assert_eq!(healthy.observer_count(), 0);
    assert_eq!(outer.observer_count(), 0);
  }

  #[test]
  fn many_synchronous_inners_do_not_grow_the_stack() {
    let recorder = Recorder::<usize, ()>::new();
    observable::from_iter(0..100_000)
      .map(observable::of)
      .concat_all()
      .subscribe_observer(recorder.clone());
    assert_eq!(recorder.len(), 100_001);
  }
}
