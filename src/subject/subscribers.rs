use smallvec::SmallVec;

use crate::subscriber::Subscriber;

/// Insertion-ordered list of the subscribers currently attached to a subject.
///
/// Broadcasting never iterates the live list: callers take a [`snapshot`]
/// first and release the subject's state before delivering, so an observer
/// that subscribes or unsubscribes from inside its own callback cannot
/// disturb the ongoing fan-out.
///
/// [`snapshot`]: Subscribers::snapshot
pub(crate) struct Subscribers<T, E> {
  entries: Vec<(usize, Subscriber<T, E>)>,
  next_id: usize,
}

pub(crate) type Snapshot<T, E> = SmallVec<[Subscriber<T, E>; 2]>;

impl<T, E> Default for Subscribers<T, E> {
  fn default() -> Self { Self { entries: Vec::new(), next_id: 0 } }
}

impl<T, E> Subscribers<T, E> {
  /// Add a subscriber and return its unique ID.
  pub fn add(&mut self, subscriber: Subscriber<T, E>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, subscriber));
    id
  }

  /// Remove a subscriber by ID.
  pub fn remove(&mut self, id: usize) -> Option<Subscriber<T, E>> {
    let idx = self.entries.iter().position(|(i, _)| *i == id)?;
    Some(self.entries.remove(idx).1)
  }

  #[inline]
  pub fn len(&self) -> usize { self.entries.len() }

  pub fn snapshot(&self) -> Snapshot<T, E> { self.entries.iter().map(|(_, s)| s.clone()).collect() }

  /// Empties the list, handing back what was in it.
  pub fn drain(&mut self) -> Snapshot<T, E> { self.entries.drain(..).map(|(_, s)| s).collect() }
}

/// Broadcast value to all observers with optimal cloning.
///
/// The value is cloned for every observer except the last one, which receives
/// the moved value. Observers that closed after the snapshot was taken are
/// skipped.
pub(crate) fn broadcast_value<T: Clone + 'static, E: 'static>(observers: Snapshot<T, E>, value: T) {
  let mut iter = observers.into_iter().filter(|o| !o.is_closed()).peekable();
  while let Some(observer) = iter.next() {
    if iter.peek().is_some() {
      observer.next(value.clone());
    } else {
      observer.next(value);
      break;
    }
  }
}

/// Broadcast error to all observers, cloning for all but the last one.
pub(crate) fn broadcast_error<T: 'static, E: Clone + 'static>(observers: Snapshot<T, E>, err: E) {
  let mut iter = observers.into_iter().peekable();
  while let Some(observer) = iter.next() {
    if iter.peek().is_some() {
      observer.error(err.clone());
    } else {
      observer.error(err);
      break;
    }
  }
}

pub(crate) fn broadcast_complete<T: 'static, E: 'static>(observers: Snapshot<T, E>) {
  for observer in observers {
    observer.complete();
  }
}
