//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use crate::config;

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. Observers are usually wrapped in a
/// [`Subscriber`](crate::subscriber::Subscriber), which guarantees that no
/// call arrives after `error` or `complete`.
pub trait Observer<T, E> {
  /// Receive the next value from the observable
  fn next(&mut self, value: T);

  /// Handle an error from the observable
  fn error(&mut self, err: E);

  /// Handle completion of the observable
  fn complete(&mut self);
}

impl<T, E, O> Observer<T, E> for Box<O>
where
  O: Observer<T, E> + ?Sized,
{
  #[inline]
  fn next(&mut self, value: T) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: E) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }
}

pub type BoxedObserver<T, E> = Box<dyn Observer<T, E>>;

type NextFn<T> = Box<dyn FnMut(T)>;
type ErrorFn<E> = Box<dyn FnOnce(E)>;
type CompleteFn = Box<dyn FnOnce()>;

/// Observer assembled from optional callbacks.
///
/// A missing `next` or `complete` callback ignores the notification. A
/// missing `error` callback hands the error to the unhandled-error sink of
/// the active [`Config`](crate::config::Config).
pub struct FnObserver<T, E> {
  next: Option<NextFn<T>>,
  error: Option<ErrorFn<E>>,
  complete: Option<CompleteFn>,
}

impl<T, E> Default for FnObserver<T, E> {
  fn default() -> Self { Self { next: None, error: None, complete: None } }
}

impl<T, E> FnObserver<T, E> {
  pub fn new() -> Self { Self::default() }

  pub fn on_next(mut self, f: impl FnMut(T) + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  pub fn on_error(mut self, f: impl FnOnce(E) + 'static) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
    self.complete = Some(Box::new(f));
    self
  }
}

impl<T, E: 'static> Observer<T, E> for FnObserver<T, E> {
  #[inline]
  fn next(&mut self, value: T) {
    if let Some(next) = self.next.as_mut() {
      next(value);
    }
  }

  fn error(&mut self, err: E) {
    self.next = None;
    self.complete = None;
    match self.error.take() {
      Some(error) => error(err),
      None => config::report_unhandled_error(err),
    }
  }

  fn complete(&mut self) {
    self.next = None;
    self.error = None;
    if let Some(complete) = self.complete.take() {
      complete();
    }
  }
}
