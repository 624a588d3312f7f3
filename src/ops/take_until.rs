use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber, subscription::Subscription,
};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Emits the values emitted by the source until `notifier` emits its first
  /// value, then completes. A notifier error is forwarded; a notifier that
  /// completes without emitting has no effect.
  pub fn take_until<N: 'static>(self, notifier: Observable<N, E>) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      notifier.subscribe_stage(&downstream, NotifierObserver { downstream: downstream.clone() });
      if downstream.is_closed() {
        return Subscription::closed();
      }
      source.subscribe_stage(&downstream, downstream.clone())
    })
  }
}

struct NotifierObserver<T, E> {
  downstream: Subscriber<T, E>,
}

impl<N, T: 'static, E: 'static> Observer<N, E> for NotifierObserver<T, E> {
  fn next(&mut self, _: N) { self.downstream.complete() }

  fn error(&mut self, err: E) { self.downstream.error(err) }

  fn complete(&mut self) {}
}
