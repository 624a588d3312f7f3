use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber, subscription::Subscription,
};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Emits only the first `count` values emitted by the source, then
  /// completes and unsubscribes from it. If the source emits fewer than
  /// `count` values then all of its values are emitted.
  ///
  /// ```
  /// use rxcore::prelude::*;
  ///
  /// observable::from_iter::<_, ()>(0..10).take(5).subscribe(|v| println!("{v}"));
  /// // print logs:
  /// // 0
  /// // 1
  /// // 2
  /// // 3
  /// // 4
  /// ```
  pub fn take(self, count: usize) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      if count == 0 {
        downstream.complete();
        return Subscription::closed();
      }
      source.subscribe_stage(&downstream, TakeObserver { remaining: count, downstream: downstream.clone() })
    })
  }
}

struct TakeObserver<T, E> {
  remaining: usize,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: 'static> Observer<T, E> for TakeObserver<T, E> {
  fn next(&mut self, value: T) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.downstream.next(value);
    if self.remaining == 0 {
      self.downstream.complete();
    }
  }

  forward_terminals!(downstream);
}
