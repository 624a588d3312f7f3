use crate::{error::RxError, observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T: 'static, E: From<RxError> + 'static> Observable<T, E> {
  /// Emits only the last value once the source completes. A source completing
  /// without any value errors with [`RxError::Empty`].
  ///
  /// ```
  /// use rxcore::prelude::*;
  ///
  /// observable::from_iter::<_, RxError>(0..100)
  ///   .last()
  ///   .subscribe(|v| println!("{v}"));
  /// // print log:
  /// // 99
  /// ```
  pub fn last(self) -> Observable<T, E> {
    self.lift(|source, downstream| {
      source.subscribe_stage(&downstream, LastObserver { last: None, downstream: downstream.clone() })
    })
  }
}

struct LastObserver<T, E> {
  last: Option<T>,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: From<RxError> + 'static> Observer<T, E> for LastObserver<T, E> {
  fn next(&mut self, value: T) { self.last = Some(value) }

  fn error(&mut self, err: E) { self.downstream.error(err) }

  fn complete(&mut self) {
    match self.last.take() {
      Some(value) => {
        self.downstream.next(value);
        self.downstream.complete();
      }
      None => self.downstream.error(RxError::Empty.into()),
    }
  }
}
