//! Operators. Each module adds methods to [`Observable`](crate::observable::Observable).
//!
//! An operator subscribes to its source with its own stage subscriber,
//! registered as a child of the downstream subscriber: cancelling downstream
//! cancels the stage, and a terminal notification sent downstream tears the
//! stage down with it.

/// Forwards `error` and `complete` unchanged to the subscriber in `$field`.
macro_rules! forward_terminals {
  ($field:ident) => {
    #[inline]
    fn error(&mut self, err: E) { self.$field.error(err) }

    #[inline]
    fn complete(&mut self) { self.$field.complete() }
  };
}

mod audit;
mod debounce;
mod filter;
mod finalize;
mod first;
mod last;
mod map;
mod materialize;
mod merge;
mod merge_all;
mod observe_on;
mod subscribe_on;
mod take;
mod take_until;
mod tap;
mod throttle;
mod timeout;
mod window;
mod window_time;
mod window_toggle;

pub use throttle::ThrottleConfig;
pub use timeout::TimeoutConfig;

#[cfg(test)]
pub(crate) mod test_util {
  use std::{cell::RefCell, rc::Rc, time::Duration};

  use crate::{
    notification::Notification,
    observable::Observable,
    observer::Observer,
    scheduler::{Scheduler, VirtualTimeScheduler},
    subject::Subject,
  };

  /// Observer recording every notification it receives.
  pub(crate) struct Recorder<T, E>(Rc<RefCell<Vec<Notification<T, E>>>>);

  impl<T, E> Clone for Recorder<T, E> {
    fn clone(&self) -> Self { Recorder(self.0.clone()) }
  }

  impl<T, E> Recorder<T, E> {
    pub fn new() -> Self { Recorder(Rc::default()) }

    /// Everything recorded so far, leaving the log empty.
    pub fn take(&self) -> Vec<Notification<T, E>> { std::mem::take(&mut *self.0.borrow_mut()) }

    pub fn len(&self) -> usize { self.0.borrow().len() }
  }

  impl<T: Clone, E> Recorder<T, E> {
    pub fn values(&self) -> Vec<T> {
      self
        .0
        .borrow()
        .iter()
        .filter_map(|n| match n {
          Notification::Next(v) => Some(v.clone()),
          _ => None,
        })
        .collect()
    }
  }

  impl<T, E> Observer<T, E> for Recorder<T, E> {
    fn next(&mut self, value: T) { self.0.borrow_mut().push(Notification::Next(value)) }

    fn error(&mut self, err: E) { self.0.borrow_mut().push(Notification::Error(err)) }

    fn complete(&mut self) { self.0.borrow_mut().push(Notification::Complete) }
  }

  /// Subscribes a fresh [`Recorder`] to every window it receives.
  pub(crate) struct WindowRecorder<T, E> {
    windows: Rc<RefCell<Vec<Recorder<T, E>>>>,
    outer: Recorder<(), E>,
  }

  impl<T, E> Clone for WindowRecorder<T, E> {
    fn clone(&self) -> Self { Self { windows: self.windows.clone(), outer: self.outer.clone() } }
  }

  impl<T, E> WindowRecorder<T, E> {
    pub fn new() -> Self { Self { windows: Rc::default(), outer: Recorder::new() } }

    pub fn count(&self) -> usize { self.windows.borrow().len() }

    /// Everything each window recorded so far, in window order.
    pub fn windows(&self) -> Vec<Vec<Notification<T, E>>> {
      self.windows.borrow().iter().map(Recorder::take).collect()
    }

    /// Terminal notification of the window stream itself.
    pub fn outer(&self) -> Vec<Notification<(), E>> { self.outer.take() }
  }

  impl<T: 'static, E: 'static> Observer<Observable<T, E>, E> for WindowRecorder<T, E> {
    fn next(&mut self, window: Observable<T, E>) {
      let recorder = Recorder::new();
      window.subscribe_observer(recorder.clone());
      self.windows.borrow_mut().push(recorder);
    }

    fn error(&mut self, err: E) { self.outer.error(err) }

    fn complete(&mut self) { self.outer.complete() }
  }

  pub(crate) fn ms(n: u64) -> Duration { Duration::from_millis(n) }

  /// A subject replaying `events` at the given virtual milliseconds.
  pub(crate) fn hot<T: Clone + 'static, E: Clone + 'static>(
    scheduler: &VirtualTimeScheduler, events: Vec<(u64, Notification<T, E>)>,
  ) -> Subject<T, E> {
    let subject = Subject::new();
    for (at, notification) in events {
      let mut target = subject.clone();
      scheduler.schedule_once(ms(at), move || notification.observe(&mut target));
    }
    subject
  }

  /// Pairs every value with the virtual millisecond it was emitted at.
  pub(crate) fn stamped<T: 'static, E: 'static>(
    source: Observable<T, E>, scheduler: &VirtualTimeScheduler,
  ) -> Observable<(T, u64), E> {
    let scheduler = scheduler.clone();
    source.map(move |v| (v, scheduler.now().as_millis() as u64))
  }
}
