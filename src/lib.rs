//! # rxcore: a push-based reactive stream engine
//!
//! Observables are lazy producers of values over time. Subscribing runs the
//! producer against a [`Subscriber`], and every piece of work started for that
//! subscription hangs off one [`Subscription`] tree, so a single
//! `unsubscribe()` cancels all of it.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcore::prelude::*;
//!
//! let log = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
//! let c_log = log.clone();
//! observable::from_iter::<_, RxError>(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| c_log.borrow_mut().push(v));
//! assert_eq!(*log.borrow(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A reusable description of a value sequence |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Teardown tree; cancels everything below it |
//! | [`Scheduler`] | Orders and times work: immediate, queue, macrotask, virtual time |
//! | [`Subject`] | Observable and observer at once, multicasting to its subscribers |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `LocalPool` based macrotask scheduler
//!   and stream interop
//! - **`timer`** (default): real timers for the macrotask scheduler
//! - **`tokio-scheduler`**: macrotask scheduler on a tokio `LocalSet`
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Subscriber`]: subscriber::Subscriber
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject

pub mod config;
pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;
