use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::{Scheduler, Task, TaskHandle, TaskState},
  subject::Subject,
  subscriber::Subscriber,
  subscription::Teardown,
};

impl<T: Clone + 'static, E: Clone + 'static> Observable<T, E> {
  /// Branches out the source values into windows of `span` each. A window
  /// opens on subscription and a new one opens whenever the previous one
  /// closes.
  pub fn window_time(self, span: Duration, scheduler: impl Scheduler) -> Observable<Observable<T, E>, E> {
    self.window_time_with(span, None, usize::MAX, scheduler)
  }

  /// Windows of `span` each, at most `max_window_size` values long.
  ///
  /// With a `creation_interval`, a new window additionally opens every
  /// interval, so windows may overlap or leave gaps. Without it, a window
  /// closing (by time or by size) opens the next one.
  pub fn window_time_with(
    self, span: Duration, creation_interval: Option<Duration>, max_window_size: usize,
    scheduler: impl Scheduler,
  ) -> Observable<Observable<T, E>, E> {
    self.lift(move |source, downstream| {
      let core = Rc::new(WindowTimeCore {
        state: RefCell::new(WindowTimeState { records: Vec::new(), next_id: 0, terminated: false }),
        span,
        max_window_size: max_window_size.max(1),
        restart_on_close: creation_interval.is_none(),
        scheduler: scheduler.clone(),
        downstream,
      });

      let weak = Rc::downgrade(&core);
      core.downstream.add(Teardown::from_fn(move || {
        if let Some(core) = weak.upgrade() {
          let mut state = core.state.borrow_mut();
          state.terminated = true;
          state.records.clear();
        }
      }));

      if let Some(interval) = creation_interval {
        let c_core = core.clone();
        let task = Task::new((), move |_| {
          if c_core.state.borrow().terminated {
            return TaskState::Finished;
          }
          c_core.start_window();
          TaskState::Sleeping(interval)
        });
        let handle = core.scheduler.schedule(task, Some(interval));
        core.downstream.add(handle);
      }
      core.start_window();

      source.subscribe_stage(&core.downstream, WindowTimeObserver { core: core.clone() })
    })
  }
}

struct WindowRecord<T, E> {
  id: usize,
  window: Subject<T, E>,
  seen: usize,
  closing: Option<TaskHandle>,
}

struct WindowTimeState<T, E> {
  records: Vec<WindowRecord<T, E>>,
  next_id: usize,
  terminated: bool,
}

struct WindowTimeCore<T, E, S> {
  state: RefCell<WindowTimeState<T, E>>,
  span: Duration,
  max_window_size: usize,
  restart_on_close: bool,
  scheduler: S,
  downstream: Subscriber<Observable<T, E>, E>,
}

impl<T: Clone + 'static, E: Clone + 'static, S: Scheduler> WindowTimeCore<T, E, S> {
  fn start_window(self: &Rc<Self>) {
    let (id, window) = {
      let mut state = self.state.borrow_mut();
      if state.terminated {
        return;
      }
      let id = state.next_id;
      state.next_id += 1;
      let window = Subject::new();
      state.records.push(WindowRecord { id, window: window.clone(), seen: 0, closing: None });
      (id, window)
    };
    self.downstream.next(window.as_observable());

    let core = self.clone();
    let closing = self.scheduler.schedule_once(self.span, move || core.close_window(id));
    self.downstream.add(&closing);
    let mut state = self.state.borrow_mut();
    match state.records.iter_mut().find(|r| r.id == id) {
      Some(record) => record.closing = Some(closing),
      None => {
        drop(state);
        closing.unsubscribe();
      }
    }
  }

  fn close_window(self: &Rc<Self>, id: usize) {
    let record = {
      let mut state = self.state.borrow_mut();
      let idx = state.records.iter().position(|r| r.id == id);
      idx.map(|idx| state.records.remove(idx))
    };
    let Some(record) = record else { return };
    record.window.complete();
    if let Some(closing) = record.closing {
      closing.unsubscribe();
    }
    if self.restart_on_close {
      self.start_window();
    }
  }

  /// Stops opening windows and takes the open ones out, cancelling their
  /// timers.
  fn drain(&self) -> Vec<Subject<T, E>> {
    let records = {
      let mut state = self.state.borrow_mut();
      state.terminated = true;
      std::mem::take(&mut state.records)
    };
    records
      .into_iter()
      .map(|record| {
        if let Some(closing) = record.closing {
          closing.unsubscribe();
        }
        record.window
      })
      .collect()
  }
}

struct WindowTimeObserver<T, E, S> {
  core: Rc<WindowTimeCore<T, E, S>>,
}

impl<T: Clone + 'static, E: Clone + 'static, S: Scheduler> Observer<T, E> for WindowTimeObserver<T, E, S> {
  fn next(&mut self, value: T) {
    let core = &self.core;
    let targets: Vec<_> = {
      let mut state = core.state.borrow_mut();
      state
        .records
        .iter_mut()
        .map(|record| {
          record.seen += 1;
          (record.id, record.window.clone(), record.seen >= core.max_window_size)
        })
        .collect()
    };
    for (id, window, full) in targets {
      window.next(value.clone());
      if full {
        core.close_window(id);
      }
    }
  }

  fn error(&mut self, err: E) {
    for window in self.core.drain() {
      window.error(err.clone());
    }
    self.core.downstream.error(err);
  }

  fn complete(&mut self) {
    for window in self.core.drain() {
      window.complete();
    }
    self.core.downstream.complete();
  }
}
