use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
  error::{RxError, TimeoutError},
  observable::Observable,
  observer::Observer,
  scheduler::{Scheduler, TaskHandle},
  subscriber::Subscriber,
  subscription::Subscription,
};

/// Deadlines of a timeout operator, relative to subscription and to each
/// value. `None` disables the respective check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutConfig {
  /// Time allowed for the first value. Falls back to `each` when unset.
  pub first: Option<Duration>,
  /// Time allowed between consecutive values.
  pub each: Option<Duration>,
}

impl<T: 'static, E: From<RxError> + 'static> Observable<T, E> {
  /// Errors with [`RxError::Timeout`] if the source does not emit a value
  /// within `each` of subscription or of the previous value.
  pub fn timeout(self, each: Duration, scheduler: impl Scheduler) -> Observable<T, E> {
    self.timeout_with(TimeoutConfig { first: None, each: Some(each) }, None, scheduler)
  }

  /// Races the source against timers configured by `config`. When a timer
  /// wins, the source subscription is torn down and the output switches to
  /// `fallback`, or errors with a [`TimeoutError`] counting the values seen so
  /// far when there is none.
  pub fn timeout_with(
    self, config: TimeoutConfig, fallback: Option<Observable<T, E>>, scheduler: impl Scheduler,
  ) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      let core = Rc::new(TimeoutCore {
        state: RefCell::new(TimeoutState { timer: None, seen: 0, source: None }),
        each: config.each,
        fallback: fallback.clone(),
        scheduler: scheduler.clone(),
        downstream,
      });

      let stage = Subscriber::with_parent(TimeoutObserver { core: core.clone() }, core.downstream.subscription());
      core.state.borrow_mut().source = Some(stage.subscription().clone());
      source.subscribe_with(stage);

      let seen = core.state.borrow().seen;
      if let (0, Some(first)) = (seen, config.first.or(config.each)) {
        core.start_timer(first);
      }
    })
  }
}

struct TimeoutState {
  timer: Option<TaskHandle>,
  seen: usize,
  source: Option<Subscription>,
}

struct TimeoutCore<T, E, S> {
  state: RefCell<TimeoutState>,
  each: Option<Duration>,
  fallback: Option<Observable<T, E>>,
  scheduler: S,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: From<RxError> + 'static, S: Scheduler> TimeoutCore<T, E, S> {
  fn cancel_timer(&self) {
    let timer = self.state.borrow_mut().timer.take();
    if let Some(timer) = timer {
      timer.unsubscribe();
    }
  }

  fn start_timer(self: &Rc<Self>, delay: Duration) {
    self.cancel_timer();
    if self.downstream.is_closed() {
      return;
    }
    let core = self.clone();
    let timer = self.scheduler.schedule_once(delay, move || core.fire());
    self.downstream.add(&timer);
    self.state.borrow_mut().timer = Some(timer);
  }

  fn fire(&self) {
    let (source, seen) = {
      let mut state = self.state.borrow_mut();
      state.timer = None;
      (state.source.take(), state.seen)
    };
    if let Some(source) = source {
      source.unsubscribe();
    }
    tracing::debug!(seen, "timeout fired");
    match &self.fallback {
      Some(fallback) => {
        fallback.subscribe_with(self.downstream.clone());
      }
      None => self.downstream.error(RxError::from(TimeoutError { seen }).into()),
    }
  }
}

struct TimeoutObserver<T, E, S> {
  core: Rc<TimeoutCore<T, E, S>>,
}

impl<T: 'static, E: From<RxError> + 'static, S: Scheduler> Observer<T, E> for TimeoutObserver<T, E, S> {
  fn next(&mut self, value: T) {
    self.core.cancel_timer();
    self.core.state.borrow_mut().seen += 1;
    self.core.downstream.next(value);
    if let Some(each) = self.core.each {
      self.core.start_timer(each);
    }
  }

  fn error(&mut self, err: E) {
    self.core.cancel_timer();
    self.core.downstream.error(err)
  }

  fn complete(&mut self) {
    self.core.cancel_timer();
    self.core.downstream.complete()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    notification::Notification::*,
    observable,
    ops::test_util::{hot, ms, stamped, Recorder},
    scheduler::VirtualTimeScheduler,
  };

  #[test]
  fn silence_between_values_times_out() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot(&scheduler, vec![(5, Next(1)), (12, Next(2)), (40, Next(3))]);
    let recorder = Recorder::new();
    let timed = source.as_observable().timeout(ms(10), scheduler.clone());
    stamped(timed, &scheduler).subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(
      recorder.take(),
      vec![Next((1, 5)), Next((2, 12)), Error(RxError::Timeout(TimeoutError { seen: 2 }))]
    );
    assert_eq!(source.observer_count(), 0);
  }

  #[test]
  fn first_deadline_differs_from_each() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot::<_, RxError>(&scheduler, vec![(30, Next(1)), (35, Next(2)), (38, Complete)]);
    let recorder = Recorder::new();
    let config = TimeoutConfig { first: Some(ms(50)), each: Some(ms(10)) };
    source
      .as_observable()
      .timeout_with(config, None, scheduler.clone())
      .subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next(1), Next(2), Complete]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn switches_to_fallback() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot::<_, RxError>(&scheduler, vec![(5, Next(1)), (50, Next(2))]);
    let recorder = Recorder::new();
    let config = TimeoutConfig { first: None, each: Some(ms(10)) };
    source
      .as_observable()
      .timeout_with(config, Some(observable::from_iter(vec![98, 99])), scheduler.clone())
      .subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next(1), Next(98), Next(99), Complete]);
    assert_eq!(source.observer_count(), 0);
  }

  #[test]
  fn first_only_deadline() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot::<_, RxError>(&scheduler, vec![(5, Next(1)), (100, Next(2))]);
    let recorder = Recorder::new();
    let config = TimeoutConfig { first: Some(ms(10)), each: None };
    source
      .as_observable()
      .timeout_with(config, None, scheduler.clone())
      .subscribe_observer(recorder.clone());

    scheduler.flush();
    assert_eq!(recorder.take(), vec![Next(1), Next(2)]);
  }
}
