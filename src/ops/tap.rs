use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Invokes `f` with a reference to each value before passing it on.
  pub fn tap(self, f: impl FnMut(&T) + Clone + 'static) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      source.subscribe_stage(&downstream, TapObserver { f: f.clone(), downstream: downstream.clone() })
    })
  }
}

struct TapObserver<F, T, E> {
  f: F,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: 'static, F: FnMut(&T)> Observer<T, E> for TapObserver<F, T, E> {
  fn next(&mut self, value: T) {
    (self.f)(&value);
    self.downstream.next(value)
  }

  forward_terminals!(downstream);
}
