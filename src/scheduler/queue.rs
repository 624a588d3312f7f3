use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap, time::Duration};

use super::{elapsed, BoxedTask, Scheduler, TaskHandle, TaskState};
use crate::subscription::Teardown;

/// Trampolining scheduler.
///
/// Outside of any scheduled work it behaves like the immediate scheduler and
/// runs the task before returning. Work scheduled while a task is already
/// running on this thread is queued and runs after the current task returns,
/// in due-time order with FIFO tie-breaking.
#[derive(Clone, Copy, Default, Debug)]
pub struct QueueScheduler;

struct Entry {
  due: Duration,
  id: u64,
  task: BoxedTask,
  handle: TaskHandle,
}

impl PartialEq for Entry {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.id == other.id }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Entry {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier due first, then FIFO by id
    other.due.cmp(&self.due).then_with(|| other.id.cmp(&self.id))
  }
}

#[derive(Default)]
struct QueueState {
  queue: BinaryHeap<Entry>,
  next_id: u64,
  running: bool,
}

thread_local! {
  static QUEUE: RefCell<QueueState> = RefCell::new(QueueState::default());
}

impl QueueScheduler {
  /// `true` while this thread is draining the queue.
  pub fn is_running() -> bool { QUEUE.with(|q| q.borrow().running) }

  fn enqueue(task: BoxedTask, handle: TaskHandle, delay: Duration) {
    QUEUE.with(|q| {
      let mut q = q.borrow_mut();
      let id = q.next_id;
      q.next_id += 1;
      q.queue.push(Entry { due: elapsed() + delay, id, task, handle: handle.clone() });
    });
    // Matched by handle: a requeued entry carries a fresh id.
    let c_handle = handle.downgrade();
    handle.add(Teardown::from_fn(move || {
      if let Some(handle) = c_handle.upgrade() {
        cancel(&handle);
      }
    }));
  }

  fn drain() {
    struct Running;
    impl Drop for Running {
      fn drop(&mut self) { QUEUE.with(|q| q.borrow_mut().running = false) }
    }

    QUEUE.with(|q| q.borrow_mut().running = true);
    let _running = Running;
    while let Some(mut entry) = QUEUE.with(|q| q.borrow_mut().queue.pop()) {
      if entry.handle.is_closed() {
        continue;
      }
      let now = elapsed();
      if entry.due > now {
        std::thread::sleep(entry.due - now);
      }
      tracing::trace!(id = entry.id, "queue scheduler dispatch");
      match (entry.task)() {
        TaskState::Finished => entry.handle.unsubscribe(),
        TaskState::Yield => Self::requeue(entry, Duration::ZERO),
        TaskState::Sleeping(d) => Self::requeue(entry, d),
      }
    }
  }

  fn requeue(entry: Entry, delay: Duration) {
    if entry.handle.is_closed() {
      return;
    }
    QUEUE.with(|q| {
      let mut q = q.borrow_mut();
      let id = q.next_id;
      q.next_id += 1;
      q.queue.push(Entry { due: elapsed() + delay, id, ..entry });
    });
  }
}

fn cancel(handle: &TaskHandle) {
  let removed = QUEUE.with(|q| {
    let mut q = q.try_borrow_mut().ok()?;
    let entries = std::mem::take(&mut q.queue).into_vec();
    let (removed, kept): (Vec<_>, Vec<_>) =
      entries.into_iter().partition(|e| e.handle.ptr_eq(handle));
    q.queue = kept.into();
    Some(removed)
  });
  // Dropped outside the borrow: task captures may run arbitrary drop code.
  drop(removed);
}

impl Scheduler for QueueScheduler {
  #[inline]
  fn now(&self) -> Duration { elapsed() }

  fn schedule_task(&self, task: BoxedTask, delay: Duration) -> TaskHandle {
    let handle = TaskHandle::new();
    Self::enqueue(task, handle.clone(), delay);
    if !Self::is_running() {
      Self::drain();
    }
    handle
  }
}
