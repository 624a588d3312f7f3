//! Commonly used types, re-exported for a single glob import.

#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use crate::scheduler::LocalPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::{
  config::{self, Config},
  error::{RxError, TimeoutError, UnhandledError, UnsubscriptionError},
  notification::{Notification, NotificationKind},
  observable::{self, first_value_from, last_value_from, Observable},
  observer::{FnObserver, Observer},
  ops::{ThrottleConfig, TimeoutConfig},
  pipe,
  scheduler::{
    ImmediateScheduler, QueueScheduler, Scheduler, Task, TaskHandle, TaskState, VirtualTimeScheduler,
  },
  subject::{AsyncSubject, BehaviorSubject, ReplaySubject, Subject},
  subscriber::Subscriber,
  subscription::{Subscription, SubscriptionGuard, SubscriptionLike, Teardown},
};
