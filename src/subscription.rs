//! Teardown tree.
//!
//! A [`Subscription`] is a node holding an ordered list of finalizers. Nodes
//! are shared through cheap clones of an `Rc` handle; a child node keeps weak
//! links to its parents so it can detach itself once it closes. Every
//! traversal checks the `closed` flag first, which is what makes cyclic
//! parent/child links terminate.
use std::{
  cell::{Cell, RefCell},
  fmt::{Debug, Formatter},
  panic::{self, AssertUnwindSafe},
  rc::{Rc, Weak},
};

use smallvec::SmallVec;

use crate::error::UnsubscriptionError;

/// Anything exposing an unsubscribe contract that can join a teardown tree.
pub trait SubscriptionLike {
  /// This allows deregistering a stream before it has finished receiving all
  /// events (i.e. before `complete` is called).
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

/// A finalizer registered with [`Subscription::add`].
pub enum Teardown {
  Empty,
  Fn(Box<dyn FnOnce()>),
  Subscription(Subscription),
  Unsubscribable(Box<dyn SubscriptionLike>),
}

impl Teardown {
  pub fn from_fn(f: impl FnOnce() + 'static) -> Self { Teardown::Fn(Box::new(f)) }

  pub fn unsubscribable(s: impl SubscriptionLike + 'static) -> Self {
    Teardown::Unsubscribable(Box::new(s))
  }

  fn execute(self) {
    match self {
      Teardown::Empty => {}
      Teardown::Fn(f) => f(),
      Teardown::Subscription(s) => s.unsubscribe(),
      Teardown::Unsubscribable(mut s) => s.unsubscribe(),
    }
  }
}

impl From<()> for Teardown {
  #[inline]
  fn from(_: ()) -> Self { Teardown::Empty }
}

impl From<Subscription> for Teardown {
  #[inline]
  fn from(s: Subscription) -> Self { Teardown::Subscription(s) }
}

impl From<&Subscription> for Teardown {
  #[inline]
  fn from(s: &Subscription) -> Self { Teardown::Subscription(s.clone()) }
}

impl From<Box<dyn FnOnce()>> for Teardown {
  #[inline]
  fn from(f: Box<dyn FnOnce()>) -> Self { Teardown::Fn(f) }
}

impl<T: Into<Teardown>> From<Option<T>> for Teardown {
  fn from(t: Option<T>) -> Self { t.map_or(Teardown::Empty, Into::into) }
}

/// Identifies a finalizer so it can be deregistered with
/// [`Subscription::remove`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TeardownId(u64);

struct Finalizer {
  id: TeardownId,
  teardown: Teardown,
}

#[derive(Default)]
struct Inner {
  closed: Cell<bool>,
  next_id: Cell<u64>,
  finalizers: RefCell<SmallVec<[Finalizer; 1]>>,
  parents: RefCell<SmallVec<[Weak<Inner>; 1]>>,
}

/// A cancellable node of the teardown tree.
///
/// Unsubscribing is idempotent and irreversible: each finalizer runs exactly
/// once, in the order it was added, and anything added after closure is torn
/// down on the spot.
#[derive(Clone, Default)]
pub struct Subscription(Rc<Inner>);

impl Subscription {
  pub fn new() -> Self { Self::default() }

  /// An already closed subscription.
  pub fn closed() -> Self {
    let s = Self::default();
    s.0.closed.set(true);
    s
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.closed.get() }

  /// Number of finalizers still registered.
  pub fn teardown_size(&self) -> usize { self.0.finalizers.borrow().len() }

  #[inline]
  pub fn ptr_eq(&self, other: &Subscription) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  /// A handle that does not keep this node alive, for finalizers that need
  /// to refer back to their own node.
  pub fn downgrade(&self) -> WeakSubscription { WeakSubscription(Rc::downgrade(&self.0)) }

  /// Registers a finalizer. If this node is already closed the finalizer is
  /// executed immediately instead.
  pub fn add(&self, teardown: impl Into<Teardown>) -> TeardownId {
    let id = TeardownId(self.0.next_id.get());
    self.0.next_id.set(id.0 + 1);

    let teardown = teardown.into();
    match &teardown {
      Teardown::Empty => return id,
      Teardown::Subscription(child) if child.ptr_eq(self) => return id,
      _ => {}
    }
    if self.is_closed() {
      teardown.execute();
      return id;
    }
    if let Teardown::Subscription(child) = &teardown {
      if child.is_closed() || child.has_parent(self) {
        return id;
      }
      child.0.parents.borrow_mut().push(Rc::downgrade(&self.0));
    }
    self.0.finalizers.borrow_mut().push(Finalizer { id, teardown });
    id
  }

  /// Deregisters a finalizer without running it.
  ///
  /// Finalizers already collected by a running `unsubscribe` still run.
  pub fn remove(&self, id: TeardownId) {
    let removed = {
      let mut finalizers = self.0.finalizers.borrow_mut();
      let idx = finalizers.iter().position(|f| f.id == id);
      idx.map(|idx| finalizers.remove(idx))
    };
    if let Some(Finalizer { teardown: Teardown::Subscription(child), .. }) = removed {
      child.unlink_parent(&self.0);
    }
  }

  /// Deregisters a child node without unsubscribing it.
  pub fn remove_child(&self, child: &Subscription) {
    self.detach(&child.0);
    child.unlink_parent(&self.0);
  }

  /// Closes this node and runs every finalizer once, in insertion order.
  ///
  /// A panicking finalizer does not stop the remaining ones. Once all have
  /// run, a single panic is resumed as is; several are re-raised together
  /// as an [`UnsubscriptionError`].
  pub fn unsubscribe(&self) {
    if self.0.closed.replace(true) {
      return;
    }

    let parents = std::mem::take(&mut *self.0.parents.borrow_mut());
    for parent in parents.iter().filter_map(Weak::upgrade) {
      Subscription(parent).detach(&self.0);
    }

    let finalizers = std::mem::take(&mut *self.0.finalizers.borrow_mut());
    let mut panics = Vec::new();
    for Finalizer { teardown, .. } in finalizers {
      if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| teardown.execute())) {
        panics.push(payload);
      }
    }

    if panics.len() > 1 {
      tracing::trace!(count = panics.len(), "finalizers panicked during unsubscribe");
      panic::panic_any(UnsubscriptionError::from_panics(&panics));
    } else if let Some(payload) = panics.pop() {
      panic::resume_unwind(payload);
    }
  }

  /// Activates "RAII" behavior for this subscription: `unsubscribe()` is
  /// called as soon as the returned guard goes out of scope.
  ///
  /// **Attention:** if you don't bind the guard to a variable it is dropped,
  /// and the subscription cancelled, immediately.
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard(self) }

  fn has_parent(&self, parent: &Subscription) -> bool {
    self
      .0
      .parents
      .borrow()
      .iter()
      .any(|p| p.as_ptr() == Rc::as_ptr(&parent.0))
  }

  fn unlink_parent(&self, parent: &Rc<Inner>) {
    self
      .0
      .parents
      .borrow_mut()
      .retain(|p| p.as_ptr() != Rc::as_ptr(parent));
  }

  fn detach(&self, child: &Rc<Inner>) {
    self.0.finalizers.borrow_mut().retain(
      |f| !matches!(&f.teardown, Teardown::Subscription(s) if Rc::ptr_eq(&s.0, child)),
    );
  }
}

impl SubscriptionLike for Subscription {
  #[inline]
  fn unsubscribe(&mut self) { Subscription::unsubscribe(self) }

  #[inline]
  fn is_closed(&self) -> bool { Subscription::is_closed(self) }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("closed", &self.is_closed())
      .field("teardown_count", &self.teardown_size())
      .finish()
  }
}

/// Non-owning counterpart of [`Subscription`].
#[derive(Clone)]
pub struct WeakSubscription(Weak<Inner>);

impl WeakSubscription {
  pub fn upgrade(&self) -> Option<Subscription> { self.0.upgrade().map(Subscription) }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
  pub fn new(subscription: Subscription) -> Self { SubscriptionGuard(subscription) }

  pub fn subscription(&self) -> &Subscription { &self.0 }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}
