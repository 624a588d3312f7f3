use crate::{error::RxError, observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T: 'static, E: From<RxError> + 'static> Observable<T, E> {
  /// Emits only the first value, then completes. A source completing without
  /// any value errors with [`RxError::Empty`].
  pub fn first(self) -> Observable<T, E> {
    self.lift(|source, downstream| {
      let observer = ElementAtObserver { index: 0, seen: 0, empty: RxError::Empty, downstream: downstream.clone() };
      source.subscribe_stage(&downstream, observer)
    })
  }

  /// Emits only the value at zero-based `index`, then completes. A source
  /// completing before reaching it errors with
  /// [`RxError::ArgumentOutOfRange`].
  pub fn element_at(self, index: usize) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      let observer = ElementAtObserver {
        index,
        seen: 0,
        empty: RxError::ArgumentOutOfRange { index },
        downstream: downstream.clone(),
      };
      source.subscribe_stage(&downstream, observer)
    })
  }
}

struct ElementAtObserver<T, E> {
  index: usize,
  seen: usize,
  empty: RxError,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: From<RxError> + 'static> Observer<T, E> for ElementAtObserver<T, E> {
  fn next(&mut self, value: T) {
    let position = self.seen;
    self.seen += 1;
    if position == self.index {
      self.downstream.next(value);
      self.downstream.complete();
    }
  }

  fn error(&mut self, err: E) { self.downstream.error(err) }

  fn complete(&mut self) {
    if self.seen <= self.index {
      self.downstream.error(self.empty.clone().into());
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::{error::RxError, notification::Notification::*, observable, ops::test_util::Recorder};

  #[test]
  fn first_value_then_complete() {
    let recorder = Recorder::<i32, RxError>::new();
    observable::from_iter(5..9).first().subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(5), Complete]);
  }

  #[test]
  fn first_of_empty_source_is_empty_error() {
    let recorder = Recorder::<i32, RxError>::new();
    observable::empty().first().subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Error(RxError::Empty)]);
  }

  #[test]
  fn element_at_index() {
    let recorder = Recorder::<char, RxError>::new();
    observable::from_iter("abcd".chars().collect::<Vec<_>>())
      .element_at(2)
      .subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next('c'), Complete]);
  }

  #[test]
  fn element_at_past_the_end() {
    let recorder = Recorder::<i32, RxError>::new();
    observable::from_iter(0..3).element_at(3).subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Error(RxError::ArgumentOutOfRange { index: 3 })]);
  }

  #[test]
  fn upstream_error_wins_over_empty() {
    let recorder = Recorder::<i32, RxError>::new();
    observable::throw_err(RxError::ObjectUnsubscribed).first().subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Error(RxError::ObjectUnsubscribed)]);
  }
}
