use crate::{
  notification::Notification, observable::Observable, observer::Observer, subscriber::Subscriber,
};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Represents every notification of the source as a [`Notification`]
  /// value. The terminal notification is emitted as a value and followed by
  /// `complete`, so the result never errors.
  pub fn materialize(self) -> Observable<Notification<T, E>, E> {
    self.lift(|source, downstream| {
      source.subscribe_stage(&downstream, MaterializeObserver { downstream: downstream.clone() })
    })
  }
}

impl<T: 'static, E: 'static> Observable<Notification<T, E>, E> {
  /// Turns [`Notification`] values back into the notifications they
  /// describe.
  pub fn dematerialize(self) -> Observable<T, E> {
    self.lift(|source, downstream| {
      source.subscribe_stage(&downstream, DematerializeObserver { downstream: downstream.clone() })
    })
  }
}

struct MaterializeObserver<T, E> {
  downstream: Subscriber<Notification<T, E>, E>,
}

impl<T: 'static, E: 'static> Observer<T, E> for MaterializeObserver<T, E> {
  fn next(&mut self, value: T) { self.downstream.next(Notification::Next(value)) }

  fn error(&mut self, err: E) {
    self.downstream.next(Notification::Error(err));
    self.downstream.complete();
  }

  fn complete(&mut self) {
    self.downstream.next(Notification::Complete);
    self.downstream.complete();
  }
}

struct DematerializeObserver<T, E> {
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: 'static> Observer<Notification<T, E>, E> for DematerializeObserver<T, E> {
  fn next(&mut self, notification: Notification<T, E>) { notification.observe(&mut self.downstream) }

  forward_terminals!(downstream);
}

#[cfg(test)]
mod tests {
  use crate::{
    notification::Notification::{self, *},
    observable,
    ops::test_util::Recorder,
  };

  #[test]
  fn error_becomes_a_value() {
    let recorder = Recorder::<Notification<i32, &str>, &str>::new();
    observable::of(1)
      .merge(observable::throw_err("boom"))
      .materialize()
      .subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(Next(1)), Next(Error("boom")), Complete]);
  }

  #[test]
  fn notifications_replay_until_terminal() {
    let recorder = Recorder::<i32, ()>::new();
    observable::from_iter(vec![Next(1), Next(2), Complete, Next(3)])
      .dematerialize()
      .subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(1), Next(2), Complete]);
  }
}
