use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
  observable::{self, Observable},
  observer::Observer,
  scheduler::Scheduler,
  subscriber::Subscriber,
  subscription::Subscription,
};

impl<T: 'static, E: 'static> Observable<T, E> {
  /// When a value arrives while no timer runs, starts one for `duration`;
  /// when it fires, emits the most recent source value.
  pub fn audit_time(self, duration: Duration, scheduler: impl Scheduler) -> Observable<T, E> {
    self.audit(move |_| observable::timer(duration, scheduler.clone()))
  }

  /// Like [`audit_time`](Observable::audit_time), but the silence period is
  /// ended by the first emission of the observable `selector` returns for
  /// the value that started it.
  ///
  /// A source completing while a value waits completes once the period
  /// ends and the value is emitted.
  pub fn audit<N: 'static>(
    self, selector: impl FnMut(&T) -> Observable<N, E> + Clone + 'static,
  ) -> Observable<T, E> {
    self.lift(move |source, downstream| {
      let core = Rc::new(AuditCore {
        state: RefCell::new(AuditState { latest: None, duration: None, complete: false }),
        downstream,
      });
      let observer = AuditObserver { selector: selector.clone(), core: core.clone() };
      source.subscribe_stage(&core.downstream, observer)
    })
  }
}

struct AuditState<T> {
  latest: Option<T>,
  duration: Option<Subscription>,
  complete: bool,
}

struct AuditCore<T, E> {
  state: RefCell<AuditState<T>>,
  downstream: Subscriber<T, E>,
}

impl<T: 'static, E: 'static> AuditCore<T, E> {
  fn end_duration(&self) {
    let (duration, latest, complete) = {
      let mut state = self.state.borrow_mut();
      (state.duration.take(), state.latest.take(), state.complete)
    };
    if let Some(duration) = duration {
      duration.unsubscribe();
    }
    if let Some(value) = latest {
      self.downstream.next(value);
    }
    if complete {
      self.downstream.complete();
    }
  }

  fn cleanup_duration(&self) {
    let complete = {
      let mut state = self.state.borrow_mut();
      state.duration = None;
      state.complete
    };
    if complete {
      self.downstream.complete();
    }
  }
}

struct AuditObserver<F, T, E> {
  selector: F,
  core: Rc<AuditCore<T, E>>,
}

impl<F, N, T, E> Observer<T, E> for AuditObserver<F, T, E>
where
  F: FnMut(&T) -> Observable<N, E>,
  N: 'static,
  T: 'static,
  E: 'static,
{
  fn next(&mut self, value: T) {
    let idle = self.core.state.borrow().duration.is_none();
    let duration = idle.then(|| (self.selector)(&value));
    self.core.state.borrow_mut().latest = Some(value);
    if let Some(duration) = duration {
      let core = &self.core;
      let subscriber = Subscriber::with_parent(AuditGate { core: core.clone() }, core.downstream.subscription());
      core.state.borrow_mut().duration = Some(subscriber.subscription().clone());
      duration.subscribe_with(subscriber);
    }
  }

  fn error(&mut self, err: E) { self.core.downstream.error(err) }

  fn complete(&mut self) {
    let waiting = {
      let mut state = self.core.state.borrow_mut();
      state.complete = true;
      state.latest.is_some() && state.duration.as_ref().is_some_and(|d| !d.is_closed())
    };
    if !waiting {
      self.core.downstream.complete();
    }
  }
}

struct AuditGate<T, E> {
  core: Rc<AuditCore<T, E>>,
}

impl<N, T: 'static, E: 'static> Observer<N, E> for AuditGate<T, E> {
  fn next(&mut self, _: N) { self.core.end_duration() }

  fn error(&mut self, err: E) { self.core.downstream.error(err) }

  fn complete(&mut self) { self.core.cleanup_duration() }
}
