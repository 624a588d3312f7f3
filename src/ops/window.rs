use std::{cell::RefCell, rc::Rc};

use crate::{
  observable::Observable, observer::Observer, subject::Subject, subscriber::Subscriber,
  subscription::Teardown,
};

impl<T: Clone + 'static, E: Clone + 'static> Observable<T, E> {
  /// Branches out the source values as nested observables ("windows"). A
  /// window is open from subscription on; every emission of `boundaries`
  /// completes the current window and opens the next one.
  /// `boundaries` is subscribed before the source.
  ///
  /// Each window is emitted before it receives any value. Errors from the
  /// source or `boundaries` reach the open window and the output alike.
  pub fn window<N: 'static>(self, boundaries: Observable<N, E>) -> Observable<Observable<T, E>, E> {
    self.lift(move |source, downstream| {
      let core = Rc::new(WindowCore { window: RefCell::new(Subject::new()), downstream });
      let weak = Rc::downgrade(&core);
      core.downstream.add(Teardown::from_fn(move || {
        if let Some(core) = weak.upgrade() {
          core.current().unsubscribe();
        }
      }));

      core.downstream.next(core.current().as_observable());
      boundaries.subscribe_stage(&core.downstream, BoundaryObserver { core: core.clone() });
      let stage = core.clone();
      source.subscribe_stage(&stage.downstream, WindowObserver { core })
    })
  }
}

struct WindowCore<T, E> {
  window: RefCell<Subject<T, E>>,
  downstream: Subscriber<Observable<T, E>, E>,
}

impl<T: Clone + 'static, E: Clone + 'static> WindowCore<T, E> {
  fn current(&self) -> Subject<T, E> { self.window.borrow().clone() }

  fn fail(&self, err: E) {
    self.current().error(err.clone());
    self.downstream.error(err);
  }
}

struct WindowObserver<T, E> {
  core: Rc<WindowCore<T, E>>,
}

impl<T: Clone + 'static, E: Clone + 'static> Observer<T, E> for WindowObserver<T, E> {
  fn next(&mut self, value: T) { self.core.current().next(value) }

  fn error(&mut self, err: E) { self.core.fail(err) }

  fn complete(&mut self) {
    self.core.current().complete();
    self.core.downstream.complete();
  }
}

struct BoundaryObserver<T, E> {
  core: Rc<WindowCore<T, E>>,
}

impl<N, T: Clone + 'static, E: Clone + 'static> Observer<N, E> for BoundaryObserver<T, E> {
  fn next(&mut self, _: N) {
    let next = Subject::new();
    let previous = self.core.window.replace(next.clone());
    previous.complete();
    self.core.downstream.next(next.as_observable());
  }

  fn error(&mut self, err: E) { self.core.fail(err) }

  fn complete(&mut self) {}
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::{
    notification::Notification::*,
    observable,
    ops::test_util::{hot, WindowRecorder},
    scheduler::VirtualTimeScheduler,
    subject::Subject,
  };

  #[test]
  fn boundaries_split_the_source() {
    let scheduler = VirtualTimeScheduler::new();
    let source = hot::<_, ()>(&scheduler, vec![(1, Next('a')), (2, Next('b')), (4, Next('c')), (6, Complete)]);
    let boundaries = hot::<(), ()>(&scheduler, vec![(3, Next(())), (5, Next(()))]);
    let recorder = WindowRecorder::new();
    source.as_observable().window(boundaries.as_observable()).subscribe_observer(recorder.clone());

    assert_eq!(recorder.count(), 1);
    scheduler.flush();
    assert_eq!(
      recorder.windows(),
      vec![vec![Next('a'), Next('b'), Complete], vec![Next('c'), Complete], vec![Complete]]
    );
    assert_eq!(recorder.outer(), vec![Complete]);
    assert_eq!(boundaries.observer_count(), 0);
  }

  #[test]
  fn synchronous_boundary_opens_a_window_before_the_source_emits() {
    let recorder = WindowRecorder::new();
    observable::from_iter::<_, ()>(['a', 'b'])
      .window(observable::of(()))
      .subscribe_observer(recorder.clone());

    assert_eq!(recorder.windows(), vec![vec![Complete], vec![Next('a'), Next('b'), Complete]]);
    assert_eq!(recorder.outer(), vec![Complete]);
  }

  #[test]
  fn error_reaches_open_window() {
    let source = Subject::<char, &'static str>::new();
    let recorder = WindowRecorder::new();
    source.as_observable().window(observable::never::<(), _>()).subscribe_observer(recorder.clone());
    source.next('a');
    source.error("boom");
    assert_eq!(recorder.windows(), vec![vec![Next('a'), Error("boom")]]);
    assert_eq!(recorder.outer(), vec![Error("boom")]);
  }

  #[test]
  fn unsubscribe_disposes_current_window() {
    let source = Subject::<char, ()>::new();
    let windows = Rc::new(RefCell::new(vec![]));
    let c_windows = windows.clone();
    let subscription = source
      .as_observable()
      .window(observable::never::<(), _>())
      .subscribe(move |w| c_windows.borrow_mut().push(w));
    subscription.unsubscribe();
    assert_eq!(source.observer_count(), 0);
    assert!(windows.borrow()[0].subscribe(|_| {}).is_closed());
  }
}
