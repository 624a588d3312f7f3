use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  observable::Observable,
  observer::Observer,
  subject::Subject,
  subscriber::Subscriber,
  subscription::{Subscription, Teardown},
};

impl<T: Clone + 'static, E: Clone + 'static> Observable<T, E> {
  /// Branches out the source values into windows that open on each emission
  /// of `openings` and close on the first emission of the observable that
  /// `closing_selector` returns for that opening value.
  ///
  /// Windows may overlap: every value reaches each window open at that
  /// moment. A closing notifier that completes without emitting leaves its
  /// window open until the source terminates.
  pub fn window_toggle<O: 'static, C: 'static>(
    self, openings: Observable<O, E>, closing_selector: impl FnMut(&O) -> Observable<C, E> + Clone + 'static,
  ) -> Observable<Observable<T, E>, E> {
    self.lift(move |source, downstream| {
      let core = Rc::new(ToggleCore {
        windows: RefCell::new(Vec::new()),
        next_id: Cell::new(0),
        downstream,
      });
      let weak = Rc::downgrade(&core);
      core.downstream.add(Teardown::from_fn(move || {
        if let Some(core) = weak.upgrade() {
          for window in core.take_windows() {
            window.unsubscribe();
          }
        }
      }));

      let opener = OpeningObserver { selector: closing_selector.clone(), core: core.clone() };
      openings.subscribe_stage(&core.downstream, opener);
      source.subscribe_stage(&core.downstream, ToggleObserver { core: core.clone() })
    })
  }
}

struct ToggleWindow<T, E> {
  id: usize,
  window: Subject<T, E>,
  closing: Subscription,
}

struct ToggleCore<T, E> {
  windows: RefCell<Vec<ToggleWindow<T, E>>>,
  next_id: Cell<usize>,
  downstream: Subscriber<Observable<T, E>, E>,
}

impl<T: Clone + 'static, E: Clone + 'static> ToggleCore<T, E> {
  fn take_windows(&self) -> Vec<Subject<T, E>> {
    let windows = std::mem::take(&mut *self.windows.borrow_mut());
    windows
      .into_iter()
      .map(|w| {
        w.closing.unsubscribe();
        w.window
      })
      .collect()
  }

  fn close_window(&self, id: usize) {
    let record = {
      let mut windows = self.windows.borrow_mut();
      let idx = windows.iter().position(|w| w.id == id);
      idx.map(|idx| windows.remove(idx))
    };
    if let Some(record) = record {
      record.window.complete();
      record.closing.unsubscribe();
    }
  }

  fn fail(&self, err: E) {
    for window in self.take_windows() {
      window.error(err.clone());
    }
    self.downstream.error(err);
  }
}

struct OpeningObserver<F, T, E> {
  selector: F,
  core: Rc<ToggleCore<T, E>>,
}

impl<F, O, C, T, E> Observer<O, E> for OpeningObserver<F, T, E>
where
  F: FnMut(&O) -> Observable<C, E>,
  C: 'static,
  T: Clone + 'static,
  E: Clone + 'static,
{
  fn next(&mut self, open: O) {
    let closing_notifier = (self.selector)(&open);
    let core = &self.core;
    let id = core.next_id.get();
    core.next_id.set(id + 1);
    let window = Subject::new();
    let closer = Subscriber::with_parent(ClosingObserver { id, core: core.clone() }, core.downstream.subscription());
    core.windows.borrow_mut().push(ToggleWindow {
      id,
      window: window.clone(),
      closing: closer.subscription().clone(),
    });

    core.downstream.next(window.as_observable());
    closing_notifier.subscribe_with(closer);
  }

  fn error(&mut self, err: E) { self.core.fail(err) }

  fn complete(&mut self) {}
}

struct ClosingObserver<T, E> {
  id: usize,
  core: Rc<ToggleCore<T, E>>,
}

impl<C, T: Clone + 'static, E: Clone + 'static> Observer<C, E> for ClosingObserver<T, E> {
  fn next(&mut self, _: C) { self.core.close_window(self.id) }

  fn error(&mut self, err: E) { self.core.fail(err) }

  fn complete(&mut self) {}
}

struct ToggleObserver<T, E> {
  core: Rc<ToggleCore<T, E>>,
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for ToggleObserver<T, E> {
  fn next(&mut self, value: T) {
    let windows: Vec<_> = self.core.windows.borrow().iter().map(|w| w.window.clone()).collect();
    for window in windows {
      window.next(value.clone());
    }
  }

  fn error(&mut self, err: E) { self.core.fail(err) }

  fn complete(&mut self) {
    for window in self.core.take_windows() {
      window.complete();
    }
    self.core.downstream.complete();
  }
}
