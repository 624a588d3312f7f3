use crate::observer::Observer;

/// A reified observer call: the tagged union behind the `next`/`error`/
/// `complete` protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T, E> {
  Next(T),
  Error(E),
  Complete,
}

/// The kind of a [`Notification`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
  Next,
  Error,
  Complete,
}

impl<T, E> Notification<T, E> {
  pub fn kind(&self) -> NotificationKind {
    match self {
      Notification::Next(_) => NotificationKind::Next,
      Notification::Error(_) => NotificationKind::Error,
      Notification::Complete => NotificationKind::Complete,
    }
  }

  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  /// Replays this notification on `observer`.
  pub fn observe(self, observer: &mut (impl Observer<T, E> + ?Sized)) {
    match self {
      Notification::Next(v) => observer.next(v),
      Notification::Error(e) => observer.error(e),
      Notification::Complete => observer.complete(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Log(Vec<String>);

  impl Observer<i32, &'static str> for Log {
    fn next(&mut self, value: i32) { self.0.push(format!("next {value}")) }
    fn error(&mut self, err: &'static str) { self.0.push(format!("error {err}")) }
    fn complete(&mut self) { self.0.push("complete".into()) }
  }

  #[test]
  fn observe_dispatches_by_kind() {
    let mut log = Log::default();
    Notification::Next(1).observe(&mut log);
    Notification::<i32, _>::Error("boom").observe(&mut log);
    Notification::<i32, &str>::Complete.observe(&mut log);
    assert_eq!(log.0, vec!["next 1", "error boom", "complete"]);
  }

  #[test]
  fn terminal_kinds() {
    assert!(!Notification::<_, ()>::Next(1).is_terminal());
    assert!(Notification::<i32, _>::Error(()).is_terminal());
    assert_eq!(Notification::<i32, ()>::Complete.kind(), NotificationKind::Complete);
  }
}
