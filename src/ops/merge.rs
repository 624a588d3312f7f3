use super::merge_all::merge_internals;
use crate::observable::{self, Observable};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Emits the values of this observable and `other` as they arrive, and
  /// completes once both have completed.
  ///
  /// ```
  /// use rxcore::prelude::*;
  ///
  /// let even = Subject::<i32, ()>::new();
  /// let odd = Subject::<i32, ()>::new();
  /// let numbers = even.as_observable().merge(odd.as_observable());
  /// numbers.subscribe(|v| print!("{v} "));
  ///
  /// even.next(2);
  /// odd.next(1);
  /// even.next(4);
  /// // print: 2 1 4
  /// ```
  pub fn merge(self, other: Observable<T, E>) -> Observable<T, E> {
    observable::from_iter([self, other]).merge_all(usize::MAX)
  }

  /// Projects each value to an inner observable and merges their outputs,
  /// keeping at most `concurrent` inner subscriptions alive. Values arriving
  /// while the limit is reached are projected later, in arrival order.
  pub fn merge_map<R: 'static>(
    self, project: impl FnMut(T) -> Observable<R, E> + Clone + 'static, concurrent: usize,
  ) -> Observable<R, E> {
    self.lift(move |source, downstream| {
      merge_internals(source, downstream, project.clone(), concurrent)
    })
  }

  /// Projects each value to an inner observable and subscribes to them one
  /// after another, never overlapping.
  #[inline]
  pub fn concat_map<R: 'static>(
    self, project: impl FnMut(T) -> Observable<R, E> + Clone + 'static,
  ) -> Observable<R, E> {
    self.merge_map(project, 1)
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc, time::Duration};

  use crate::{
    notification::Notification::*,
    observable,
    ops::test_util::Recorder,
    scheduler::{Scheduler, VirtualTimeScheduler},
    subject::Subject,
  };

  #[test]
  fn completes_after_both_sources() {
    let (a, b) = (Subject::<&str, ()>::new(), Subject::<&str, ()>::new());
    let recorder = Recorder::new();
    a.as_observable().merge(b.as_observable()).subscribe_observer(recorder.clone());

    a.next("a1");
    b.next("b1");
    a.next("a2");
    a.complete();
    assert_eq!(recorder.len(), 3);
    b.complete();
    assert_eq!(recorder.take(), vec![Next("a1"), Next("b1"), Next("a2"), Complete]);
  }

  #[test]
  fn merge_map_respects_the_limit() {
    let scheduler = VirtualTimeScheduler::new();
    let recorder = Recorder::<(u64, u64), ()>::new();
    let c_scheduler = scheduler.clone();
    observable::from_iter([30, 10, 20])
      .merge_map(
        move |delay: u64| {
          let c_scheduler = c_scheduler.clone();
          observable::timer(Duration::from_millis(delay), c_scheduler.clone())
            .map(move |_| (delay, c_scheduler.now().as_millis() as u64))
        },
        2,
      )
      .subscribe_observer(recorder.clone());

    scheduler.flush();
    // `20` only starts once `10` finished at t=10
    assert_eq!(recorder.take(), vec![Next((10, 10)), Next((30, 30)), Next((20, 30)), Complete]);
  }

  #[test]
  fn concat_map_runs_projections_in_sequence() {
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    let recorder = Recorder::<String, ()>::new();
    let scheduler = VirtualTimeScheduler::new();
    let c_scheduler = scheduler.clone();
    observable::from_iter(["x", "y"])
      .concat_map(move |name| {
        c_log.borrow_mut().push(name);
        observable::interval(Duration::from_millis(5), c_scheduler.clone())
          .take(2)
          .map(move |i| format!("{name}{i}"))
      })
      .subscribe_observer(recorder.clone());

    assert_eq!(*log.borrow(), vec!["x"]);
    scheduler.flush();
    assert_eq!(*log.borrow(), vec!["x", "y"]);
    assert_eq!(recorder.values(), vec!["x0", "x1", "y0", "y1"]);
  }
}
