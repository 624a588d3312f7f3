//! Named error types raised by the engine itself.
//!
//! Errors coming from user code travel through the stream's own `E` type.
//! Operators that can fail on their own (`first`, `element_at`, `timeout`, ...)
//! require `E: From<RxError>` so an application error enum can embed
//! [`RxError`] as one of its variants.
use std::{any::Any, fmt};

/// Domain errors produced by operators and subjects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RxError {
  /// An operator expected at least one value but the source completed empty.
  #[error("no elements in sequence")]
  Empty,

  /// A timeout operator's timer fired before the source produced a value.
  #[error(transparent)]
  Timeout(#[from] TimeoutError),

  /// The requested element index lies beyond the end of the source.
  #[error("argument out of range: index {index}")]
  ArgumentOutOfRange { index: usize },

  /// A subject was used after it had been disposed with `unsubscribe`.
  #[error("object unsubscribed")]
  ObjectUnsubscribed,
}

/// Raised by `timeout` when the source stays silent for too long.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timeout has occurred after {seen} values")]
pub struct TimeoutError {
  /// Number of values the source delivered before the timer won the race.
  pub seen: usize,
}

/// One or more teardown finalizers panicked during a single `unsubscribe`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} errors occurred during unsubscription: {}", .errors.len(), .errors.join("; "))]
pub struct UnsubscriptionError {
  pub errors: Vec<String>,
}

impl UnsubscriptionError {
  pub(crate) fn from_panics(payloads: &[Box<dyn Any + Send>]) -> Self {
    let errors = payloads.iter().map(|p| panic_message(p.as_ref())).collect();
    Self { errors }
  }
}

/// An error that reached a subscriber without an error callback.
///
/// The original value is kept boxed so a custom sink can downcast it.
pub struct UnhandledError {
  type_name: &'static str,
  error: Box<dyn Any>,
}

impl UnhandledError {
  pub(crate) fn new<E: 'static>(error: E) -> Self {
    Self { type_name: std::any::type_name::<E>(), error: Box::new(error) }
  }

  /// Name of the stream's error type.
  pub fn type_name(&self) -> &'static str { self.type_name }

  pub fn downcast_ref<E: 'static>(&self) -> Option<&E> { self.error.downcast_ref() }

  pub fn into_inner(self) -> Box<dyn Any> { self.error }
}

impl fmt::Debug for UnhandledError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("UnhandledError")
      .field("type_name", &self.type_name)
      .finish_non_exhaustive()
  }
}

impl fmt::Display for UnhandledError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.describe() {
      Some(msg) => write!(f, "unhandled error of type `{}`: {msg}", self.type_name),
      None => write!(f, "unhandled error of type `{}`", self.type_name),
    }
  }
}

impl UnhandledError {
  fn describe(&self) -> Option<String> {
    if let Some(e) = self.error.downcast_ref::<RxError>() {
      return Some(e.to_string());
    }
    if let Some(s) = self.error.downcast_ref::<String>() {
      return Some(s.clone());
    }
    self.error.downcast_ref::<&'static str>().map(|s| s.to_string())
  }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&'static str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else if let Some(e) = payload.downcast_ref::<UnsubscriptionError>() {
    e.to_string()
  } else {
    "non-string panic payload".to_string()
  }
}
