use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  ///
  /// Every subscription works on its own clone of `f`.
  pub fn map<R: 'static>(self, f: impl FnMut(T) -> R + Clone + 'static) -> Observable<R, E> {
    self.lift(move |source, downstream| {
      source.subscribe_stage(&downstream, MapObserver { f: f.clone(), downstream: downstream.clone() })
    })
  }

  /// Like [`map`](Observable::map) with a fallible projection: an `Err`
  /// is sent downstream as the error and ends the stream.
  pub fn try_map<R: 'static>(
    self, f: impl FnMut(T) -> Result<R, E> + Clone + 'static,
  ) -> Observable<R, E> {
    self.lift(move |source, downstream| {
      source.subscribe_stage(&downstream, TryMapObserver { f: f.clone(), downstream: downstream.clone() })
    })
  }
}

struct MapObserver<F, R, E> {
  f: F,
  downstream: Subscriber<R, E>,
}

impl<T, R: 'static, E: 'static, F: FnMut(T) -> R> Observer<T, E> for MapObserver<F, R, E> {
  fn next(&mut self, value: T) { self.downstream.next((self.f)(value)) }

  forward_terminals!(downstream);
}

struct TryMapObserver<F, R, E> {
  f: F,
  downstream: Subscriber<R, E>,
}

impl<T, R: 'static, E: 'static, F> Observer<T, E> for TryMapObserver<F, R, E>
where
  F: FnMut(T) -> Result<R, E>,
{
  fn next(&mut self, value: T) {
    match (self.f)(value) {
      Ok(v) => self.downstream.next(v),
      Err(err) => self.downstream.error(err),
    }
  }

  forward_terminals!(downstream);
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use crate::{notification::Notification::*, observable, ops::test_util::Recorder};

  #[test]
  fn primitive_type() {
    let recorder = Recorder::<i32, ()>::new();
    observable::from_iter(100..103).map(|v| v * 2).subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(200), Next(202), Next(204), Complete]);
  }

  #[test]
  fn each_subscription_owns_its_closure() {
    let source = observable::from_iter::<_, ()>(vec!['a', 'b']).map({
      let mut count = 0;
      move |c| {
        count += 1;
        format!("{c}{count}")
      }
    });
    let (first, second) = (Recorder::new(), Recorder::new());
    source.subscribe_observer(first.clone());
    source.subscribe_observer(second.clone());
    assert_eq!(first.values(), vec!["a1", "b2"]);
    assert_eq!(second.values(), vec!["a1", "b2"]);
  }

  #[test]
  fn failed_projection_errors_and_unsubscribes_source() {
    let emitted = Rc::new(Cell::new(0));
    let c_emitted = emitted.clone();
    let recorder = Recorder::new();
    observable::from_iter(1..10)
      .map(move |v| {
        c_emitted.set(c_emitted.get() + 1);
        v
      })
      .try_map(|v| if v < 3 { Ok(v) } else { Err("too big") })
      .subscribe_observer(recorder.clone());

    assert_eq!(recorder.take(), vec![Next(1), Next(2), Error("too big")]);
    assert_eq!(emitted.get(), 3);
  }
}
