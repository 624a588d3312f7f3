use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
  observable::{self, Observable},
  observer::Observer,
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::Subscription,
};

/// Which values of a throttle window are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
  /// Emit the value that opens a window.
  pub leading: bool,
  /// Emit the latest value held back when a window closes.
  pub trailing: bool,
}

impl ThrottleConfig {
  pub const LEADING: Self = Self { leading: true, trailing: false };
  pub const TRAILING: Self = Self { leading: false, trailing: true };
  pub const ALL: Self = Self { leading: true, trailing: true };
}

impl Default for ThrottleConfig {
  #[inline]
  fn default() -> Self { Self::LEADING }
}

impl<T: 'static, E: 'static> Observable<T, E> {
  /// Emits a value, then ignores subsequent source values for `duration`,
  /// then repeats this process.
  ///
  /// ```
  /// use std::time::Duration;
  ///
  /// use rxcore::prelude::*;
  ///
  /// let scheduler = VirtualTimeScheduler::new();
  /// observable::interval::<RxError, _>(Duration::from_millis(1), scheduler.clone())
  ///   .throttle_time(Duration::from_millis(9), scheduler.clone(), ThrottleConfig::LEADING)
  ///   .take(3)
  ///   .subscribe(move |v| println!("{v}"));
  /// scheduler.flush();
  /// // print: 0 9 18
  /// ```
  pub fn throttle_time(
    self, duration: Duration, scheduler: impl Scheduler, config: ThrottleConfig,
  ) -> Observable<T, E> {
    self.throttle(move |_| observable::timer(duration, scheduler.clone()), config)
  }

  /// Like [`throttle_time`](Observable::throttle_time), but each window
  /// lasts until the observable returned by `selector` for the value that
  /// opened it emits or completes.
  ///
  /// With `trailing` set, the held-back value is emitted when the window
  /// closes and opens the next window itself. A source completing while such
  /// a value waits completes only after that emission.
  pub fn throttle<N: 'static>(
    self, selector: impl FnMut(&T) -> Observable<N, E> + Clone + 'static, config: ThrottleConfig,
  ) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      let core = Rc::new(ThrottleCore {
        selector: RefCell::new(selector.clone()),
        state: RefCell::new(ThrottleState { pending: None, throttled: None, complete: false }),
        config,
        downstream,
      });
      source.subscribe_stage(&core.downstream, ThrottleObserver { core: core.clone() })
    })
  }
}

struct ThrottleState<T> {
  pending: Option<T>,
  throttled: Option<Subscription>,
  complete: bool,
}

struct ThrottleCore<F, T, E> {
  selector: RefCell<F>,
  state: RefCell<ThrottleState<T>>,
  config: ThrottleConfig,
  downstream: Subscriber<T, E>,
}

impl<F, N, T, E> ThrottleCore<F, T, E>
where
  F: FnMut(&T) -> Observable<N, E> + 'static,
  N: 'static,
  T: 'static,
  E: 'static,
{
  fn is_throttled(&self) -> bool {
    self.state.borrow().throttled.as_ref().is_some_and(|s| !s.is_closed())
  }

  fn window_for(&self, value: &T) -> Observable<N, E> { (self.selector.borrow_mut())(value) }

  fn start_throttle(self: &Rc<Self>, window: Observable<N, E>) {
    let subscriber = Subscriber::with_parent(ThrottleGate { core: self.clone() }, self.downstream.subscription());
    // Stored before subscribing so a synchronous window finds itself.
    self.state.borrow_mut().throttled = Some(subscriber.subscription().clone());
    window.subscribe_with(subscriber);
  }

  /// Emits the held-back value and, unless the source is done, opens a new
  /// window from it.
  fn send(self: &Rc<Self>) {
    let (value, complete) = {
      let mut state = self.state.borrow_mut();
      (state.pending.take(), state.complete)
    };
    let Some(value) = value else { return };
    let window = (!complete).then(|| self.window_for(&value));
    self.downstream.next(value);
    if let Some(window) = window {
      self.start_throttle(window);
    }
  }

  fn end_throttling(self: &Rc<Self>) {
    let throttled = self.state.borrow_mut().throttled.take();
    if let Some(throttled) = throttled {
      throttled.unsubscribe();
    }
    if self.config.trailing {
      self.send();
      if self.state.borrow().complete {
        self.downstream.complete();
      }
    }
  }

  fn cleanup_throttling(&self) {
    let complete = {
      let mut state = self.state.borrow_mut();
      state.throttled = None;
      state.complete
    };
    if complete {
      self.downstream.complete();
    }
  }
}

struct ThrottleObserver<F, T, E> {
  core: Rc<ThrottleCore<F, T, E>>,
}

impl<F, N, T, E> Observer<T, E> for ThrottleObserver<F, T, E>
where
  F: FnMut(&T) -> Observable<N, E> + 'static,
  N: 'static,
  T: 'static,
  E: 'static,
{
  fn next(&mut self, value: T) {
    let core = &self.core;
    let throttled = core.is_throttled();
    let window = (!throttled && !core.config.leading).then(|| core.window_for(&value));
    core.state.borrow_mut().pending = Some(value);
    if throttled {
      return;
    }
    match window {
      Some(window) => core.start_throttle(window),
      None => core.send(),
    }
  }

  fn error(&mut self, err: E) { self.core.downstream.error(err) }

  fn complete(&mut self) {
    let core = &self.core;
    let waiting = {
      let mut state = core.state.borrow_mut();
      state.complete = true;
      state.pending.is_some()
    };
    if !(core.config.trailing && waiting && core.is_throttled()) {
      core.downstream.complete();
    }
  }
}

struct ThrottleGate<F, T, E> {
  core: Rc<ThrottleCore<F, T, E>>,
}

impl<F, N, W, T, E> Observer<W, E> for ThrottleGate<F, T, E>
where
  F: FnMut(&T) -> Observable<N, E> + 'static,
  N: 'static,
  T: 'static,
  E: 'static,
{
  fn next(&mut self, _: W) { self.core.end_throttling() }

  fn error(&mut self, err: E) { self.core.downstream.error(err) }

  fn complete(&mut self) { self.core.cleanup_throttling() }
}
