//! Example: a custom scheduler
//!
//! A game loop owns time in frames. `FrameScheduler` implements the
//! `Scheduler` trait on top of such a loop: delays are rounded up to whole
//! frames and work only runs when the loop calls `run_frame`. Any
//! time-based operator can then be driven by the loop.

use std::{cell::RefCell, rc::Rc, time::Duration};

use rxcore::{
  prelude::*,
  scheduler::{BoxedTask, Scheduler, TaskHandle, TaskState},
};

const FRAME: Duration = Duration::from_millis(16);

struct Pending {
  frame: u64,
  task: BoxedTask,
  handle: TaskHandle,
}

#[derive(Default)]
struct FrameState {
  frame: u64,
  pending: Vec<Pending>,
}

#[derive(Clone, Default)]
pub struct FrameScheduler {
  state: Rc<RefCell<FrameState>>,
}

impl FrameScheduler {
  fn frames(delay: Duration) -> u64 {
    let frame = FRAME.as_nanos();
    ((delay.as_nanos() + frame - 1) / frame) as u64
  }

  /// Advances one frame and runs the work due in it.
  pub fn run_frame(&self) {
    let due = {
      let mut state = self.state.borrow_mut();
      state.frame += 1;
      let frame = state.frame;
      let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pending)
        .into_iter()
        .partition(|p| p.frame <= frame);
      state.pending = later;
      due
    };
    println!("[frame {}] running {} task(s)", self.state.borrow().frame, due.len());

    for Pending { mut task, handle, .. } in due {
      if handle.is_closed() {
        continue;
      }
      match task() {
        TaskState::Finished => handle.unsubscribe(),
        TaskState::Yield => self.push(task, handle, Duration::ZERO),
        TaskState::Sleeping(d) => self.push(task, handle, d),
      }
    }
  }

  fn push(&self, task: BoxedTask, handle: TaskHandle, delay: Duration) {
    let mut state = self.state.borrow_mut();
    let frame = state.frame + Self::frames(delay).max(1);
    state.pending.push(Pending { frame, task, handle });
  }
}

impl Scheduler for FrameScheduler {
  fn now(&self) -> Duration { FRAME * self.state.borrow().frame as u32 }

  fn schedule_task(&self, task: BoxedTask, delay: Duration) -> TaskHandle {
    let handle = TaskHandle::new();
    self.push(task, handle.clone(), delay);
    handle
  }
}

fn main() {
  let frames = FrameScheduler::default();
  let clicks = Subject::<&str, RxError>::new();

  let c_frames = frames.clone();
  clicks
    .as_observable()
    .throttle_time(Duration::from_millis(40), frames.clone(), ThrottleConfig::ALL)
    .subscribe(move |v| println!("  handled {v} at {:?}", c_frames.now()));

  clicks.next("click #1");
  for i in 2..=8 {
    frames.run_frame();
    clicks.next(if i % 2 == 0 { "double click" } else { "click" });
  }
  for _ in 0..4 {
    frames.run_frame();
  }
}
