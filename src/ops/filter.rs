use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Emit only those items from an Observable that pass a predicate test.
  ///
  /// ```
  /// use std::{cell::RefCell, rc::Rc};
  ///
  /// use rxcore::prelude::*;
  ///
  /// let coll = Rc::new(RefCell::new(vec![]));
  /// let c_coll = coll.clone();
  /// observable::from_iter::<_, ()>(0..10)
  ///   .filter(|v| *v % 2 == 0)
  ///   .subscribe(move |v| c_coll.borrow_mut().push(v));
  ///
  /// // only even numbers received.
  /// assert_eq!(*coll.borrow(), vec![0, 2, 4, 6, 8]);
  /// ```
  pub fn filter(self, predicate: impl FnMut(&T) -> bool + Clone + 'static) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      source.subscribe_stage(
        &downstream,
        FilterObserver { predicate: predicate.clone(), downstream: downstream.clone() },
      )
    })
  }

  /// Like [`filter`](Observable::filter), but the predicate may fail; its
  /// error ends the stream.
  pub fn try_filter(
    self, predicate: impl FnMut(&T) -> Result<bool, E> + Clone + 'static,
  ) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      source.subscribe_stage(
        &downstream,
        TryFilterObserver { predicate: predicate.clone(), downstream: downstream.clone() },
      )
    })
  }
}

struct FilterObserver<F, T, E> {
  predicate: F,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: 'static, F: FnMut(&T) -> bool> Observer<T, E> for FilterObserver<F, T, E> {
  fn next(&mut self, value: T) {
    if (self.predicate)(&value) {
      self.downstream.next(value)
    }
  }

  forward_terminals!(downstream);
}

struct TryFilterObserver<F, T, E> {
  predicate: F,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: 'static, F> Observer<T, E> for TryFilterObserver<F, T, E>
where
  F: FnMut(&T) -> Result<bool, E>,
{
  fn next(&mut self, value: T) {
    match (self.predicate)(&value) {
      Ok(true) => self.downstream.next(value),
      Ok(false) => {}
      Err(err) => self.downstream.error(err),
    }
  }

  forward_terminals!(downstream);
}

#[cfg(test)]
mod tests {
  use crate::{notification::Notification::*, observable, ops::test_util::Recorder};

  #[test]
  fn fork_and_shared() {
    let source = observable::from_iter::<_, ()>(0..10).filter(|v| v % 3 == 0);
    let (a, b) = (Recorder::new(), Recorder::new());
    source.clone().subscribe_observer(a.clone());
    source.subscribe_observer(b.clone());
    assert_eq!(a.values(), vec![0, 3, 6, 9]);
    assert_eq!(a.values(), b.values());
  }

  #[test]
  fn predicate_failure_is_an_error() {
    let recorder = Recorder::new();
    observable::from_iter(1..5)
      .try_filter(|v| if *v == 3 { Err("odd one") } else { Ok(v % 2 == 0) })
      .subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(2), Error("odd one")]);
  }
}
