use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
  observable::{self, Observable},
  observer::Observer,
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::Subscription,
};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Emits a value only after `duration` has passed without another source
  /// value, measured on `scheduler`.
  ///
  /// Each value cancels the timer of the previous one and starts its own.
  /// When the source completes, a pending value is emitted right away before
  /// completing; when it errors, a pending value is dropped.
  pub fn debounce_time(self, duration: Duration, scheduler: impl Scheduler) -> Observable<T, E> {
    self.debounce(move |_| observable::timer(duration, scheduler.clone()))
  }

  /// Like [`debounce_time`](Observable::debounce_time), but the silence
  /// period of each value lasts until the observable returned by `selector`
  /// for it emits. A selector observable that completes without emitting
  /// leaves the value pending until the next value or source completion.
  pub fn debounce<N: 'static>(
    self, selector: impl FnMut(&T) -> Observable<N, E> + Clone + 'static,
  ) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      let core = Rc::new(DebounceCore { state: RefCell::new(DebounceState::default()), downstream });
      let observer = DebounceObserver { selector: selector.clone(), core: core.clone() };
      source.subscribe_stage(&core.downstream, observer)
    })
  }
}

struct DebounceState<T> {
  pending: Option<T>,
  gate: Option<Subscription>,
}

impl<T> Default for DebounceState<T> {
  fn default() -> Self { Self { pending: None, gate: None } }
}

struct DebounceCore<T, E> {
  state: RefCell<DebounceState<T>>,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: 'static> DebounceCore<T, E> {
  /// Closes the current gate and emits the pending value, if any.
  fn emit(&self) {
    let (value, gate) = {
      let mut state = self.state.borrow_mut();
      (state.pending.take(), state.gate.take())
    };
    if let Some(gate) = gate {
      gate.unsubscribe();
    }
    if let Some(value) = value {
      self.downstream.next(value);
    }
  }
}

struct DebounceObserver<F, T, E> {
  selector: F,
  core: Rc<DebounceCore<T, E>>,
}

impl<F, N, T, E> Observer<T, E> for DebounceObserver<F, T, E>
where
  F: FnMut(&T) -> Observable<N, E>,
  N: 'static,
  T: 'static,
  E: 'static,
{
  fn next(&mut self, value: T) {
    let gate = (self.selector)(&value);
    let previous = {
      let mut state = self.core.state.borrow_mut();
      state.pending = Some(value);
      state.gate.take()
    };
    if let Some(previous) = previous {
      previous.unsubscribe();
    }

    let core = &self.core;
    let subscriber = Subscriber::with_parent(DebounceGate { core: core.clone() }, core.downstream.subscription());
    // Stored before subscribing so a synchronous gate finds itself.
    core.state.borrow_mut().gate = Some(subscriber.subscription().clone());
    gate.subscribe_with(subscriber);
  }

  fn error(&mut self, err: E) {
    self.core.state.borrow_mut().pending = None;
    self.core.downstream.error(err)
  }

  fn complete(&mut self) {
    self.core.emit();
    self.core.downstream.complete()
  }
}

struct DebounceGate<T, E> {
  core: Rc<DebounceCore<T, E>>,
}

impl<N, T: 'static, E: 'static> Observer<N, E> for DebounceGate<T, E> {
  fn next(&mut self, _: N) { self.core.emit() }

  fn error(&mut self, err: E) { self.core.downstream.error(err) }

  fn complete(&mut self) {}
}

#[cfg(test)]
mod tests {
  use crate::{
    notification::Notification::*,
    observable::{self, Observable},
    ops::test_util::{hot, ms, stamped, Recorder},
    scheduler::VirtualTimeScheduler,
  };

  #[test]
  fn only_values_followed_by_silence_survive() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot::<_, ()>(
      &scheduler,
      vec![(0, Next('a')), (5, Next('b')), (20, Next('c')), (40, Complete)],
    );
    let recorder = Recorder::new();
    stamped(source.as_observable().debounce_time(ms(10), scheduler.clone()), &scheduler)
      .subscribe_observer(recorder.clone());

    scheduler.advance_to(ms(25));
    assert_eq!(recorder.values(), vec![('b', 15)]);
    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next(('b', 15)), Next(('c', 30)), Complete]);
  }

  #[test]
  fn completion_flushes_pending_value() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot::<_, ()>(&scheduler, vec![(0, Next(1)), (3, Complete)]);
    let recorder = Recorder::new();
    stamped(source.as_observable().debounce_time(ms(10), scheduler.clone()), &scheduler)
      .subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next((1, 3)), Complete]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn error_drops_pending_value() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot(&scheduler, vec![(0, Next(1)), (3, Error("boom"))]);
    let recorder = Recorder::new();
    source
      .as_observable()
      .debounce_time(ms(10), scheduler.clone())
      .subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(recorder.take(), vec![Error("boom")]);
  }

  #[test]
  fn selector_decides_each_silence_period() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot::<u64, ()>(&scheduler, vec![(0, Next(30)), (10, Next(5)), (40, Complete)]);
    let recorder = Recorder::new();
    let c_scheduler = scheduler.clone();
    let debounced = source
      .as_observable()
      .debounce(move |v: &u64| observable::timer(ms(*v), c_scheduler.clone()));
    stamped(debounced, &scheduler).subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next((5, 15)), Complete]);
  }

  #[test]
  fn synchronous_gate_emits_immediately() {
    let recorder = Recorder::<i32, ()>::new();
    observable::from_iter(1..=3)
      .debounce(|_| observable::of(()))
      .subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(1), Next(2), Next(3), Complete]);
  }

  #[test]
  fn silent_gate_keeps_value_until_completion() {
    let recorder = Recorder::<i32, ()>::new();
    observable::from_iter(1..=3)
      .debounce(|_| Observable::<(), ()>::create(|s| s.complete()))
      .subscribe_observer(recorder.clone());
    assert_eq!(recorder.take(), vec![Next(3), Complete]);
  }
}
