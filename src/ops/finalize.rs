use std::{cell::RefCell, rc::Rc};

use crate::{observable::Observable, subscription::Teardown};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Calls `f` once the subscription ends, whether by completion, error or
  /// unsubscription.
  ///
  /// ```
  /// use rxcore::prelude::*;
  ///
  /// let subject = Subject::<i32, ()>::new();
  /// let subscription = subject
  ///   .as_observable()
  ///   .finalize(|| println!("finalized"))
  ///   .subscribe(|_| {});
  /// subscription.unsubscribe();
  /// // prints: finalized
  /// ```
  pub fn finalize(self, f: impl FnOnce() + Clone + 'static) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      // Registered after the source so it runs once the source is torn down.
      let stage = source.subscribe_stage(&downstream, downstream.clone());
      let f = Rc::new(RefCell::new(Some(f.clone())));
      downstream.add(Teardown::from_fn(move || {
        if let Some(f) = f.borrow_mut().take() {
          f();
        }
      }));
      stage
    })
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::{observable, subject::Subject};

  fn tracked() -> (Rc<RefCell<Vec<&'static str>>>, impl FnOnce() + Clone + 'static) {
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    (log, move || c_log.borrow_mut().push("finalized"))
  }

  #[test]
  fn runs_after_completion() {
    let (log, f) = tracked();
    let c_log = log.clone();
    observable::of::<_, ()>(1)
      .finalize(f)
      .subscribe_complete(|_| {}, move || c_log.borrow_mut().push("complete"));
    assert_eq!(*log.borrow(), vec!["complete", "finalized"]);
  }

  #[test]
  fn runs_after_error() {
    let (log, f) = tracked();
    let c_log = log.clone();
    observable::throw_err::<i32, _>("boom")
      .finalize(f)
      .subscribe_err(|_| {}, move |_| c_log.borrow_mut().push("error"));
    assert_eq!(*log.borrow(), vec!["error", "finalized"]);
  }

  #[test]
  fn runs_once_on_unsubscribe() {
    let (log, f) = tracked();
    let subject = Subject::<i32, ()>::new();
    let subscription = subject.as_observable().finalize(f).subscribe(|_| {});
    subscription.unsubscribe();
    subscription.unsubscribe();
    subject.complete();
    assert_eq!(*log.borrow(), vec!["finalized"]);
    assert_eq!(subject.observer_count(), 0);
  }
}
